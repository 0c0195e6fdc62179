use serde::Serialize;
use thiserror::Error;

/// A diagnostic produced while parsing an expression document.
///
/// `key` is a JSON-pointer-like index path into the source document, built by
/// appending `[i]` for each array index descended into (e.g. `[1][3]`). Keys
/// are for display only and are never parsed back.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub struct ParsingError {
    pub message: String,
    pub key: String,
}

impl std::fmt::Display for ParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.key.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.key, self.message)
        }
    }
}

impl ParsingError {
    pub fn new(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            key: key.into(),
        }
    }
}

/// A runtime failure raised while evaluating an expression.
///
/// The message text is part of the engine's contract: hosts surface it
/// verbatim, so builtins and nodes use fixed phrasings.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct EvalError {
    pub message: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for EvalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for EvalError {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
