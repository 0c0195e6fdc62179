//! The process-wide table of compound expressions.
//!
//! The table maps an operator name to an ordered list of typed signatures
//! and is built exactly once, before any parse; afterwards it is read-only,
//! so parsing and evaluation from many threads need no locks. It is the
//! single source of truth for operator definitions: parse code reaches it
//! only through `Registry::global`.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::builtins;
use crate::error::{EvalError, ParsingError};
use crate::expr::{EvaluationContext, EvaluationResult, Expression};
use crate::parse::ParsingContext;
use crate::types::{check_subtype, Type};
use crate::value::Value;

/// The parameter specification of one signature: a fixed list of types, or
/// a homogeneous varargs item type.
#[derive(Debug, Clone)]
pub enum Params {
    Fixed(Vec<Type>),
    Varargs(Type),
}

pub type EvalFn = fn(&EvaluationContext, &[Value]) -> Result<Value, EvalError>;

/// One overload of a compound expression: its result type, parameters, and
/// the host function applied to the evaluated arguments.
pub struct Signature {
    pub result: Type,
    pub params: Params,
    pub eval: EvalFn,
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signature")
            .field("result", &self.result)
            .field("params", &self.params)
            .finish()
    }
}

/// A fixed-arity signature.
pub fn sig(result: Type, params: Vec<Type>, eval: EvalFn) -> Signature {
    Signature {
        result,
        params: Params::Fixed(params),
        eval,
    }
}

/// A varargs signature accepting any number of `item`-typed arguments.
pub fn varargs(result: Type, item: Type, eval: EvalFn) -> Signature {
    Signature {
        result,
        params: Params::Varargs(item),
        eval,
    }
}

pub type Definition = Vec<Signature>;

pub struct Registry {
    definitions: HashMap<&'static str, Definition>,
}

static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let mut registry = Registry {
        definitions: HashMap::new(),
    };
    builtins::register_all(&mut registry);
    registry
});

impl Registry {
    /// The global definitions table, built on first use.
    pub fn global() -> &'static Registry {
        &REGISTRY
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.definitions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn register(&mut self, name: &'static str, definition: Definition) {
        self.definitions.insert(name, definition);
    }
}

/// A call to a registered compound expression, bound to the signature that
/// won overload resolution.
#[derive(Debug)]
pub struct Compound {
    name: String,
    signature: &'static Signature,
    args: Vec<Expression>,
}

impl Compound {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Expression] {
        &self.args
    }

    pub fn ty(&self) -> Type {
        self.signature.result.clone()
    }

    /// Whether this operator reads the feature dimension of the context.
    /// `get`/`has` only do so in their single-argument (feature) overloads.
    pub(crate) fn reads_feature(&self) -> bool {
        matches!(
            (self.name.as_str(), self.args.len()),
            ("get", 1) | ("has", 1) | ("properties", _) | ("geometry_type", _) | ("id", _)
        )
    }

    pub(crate) fn evaluate(&self, ctx: &EvaluationContext) -> EvaluationResult {
        let mut evaluated = Vec::with_capacity(self.args.len());
        for arg in &self.args {
            evaluated.push(arg.evaluate(ctx)?);
        }
        (self.signature.eval)(ctx, &evaluated)
    }
}

/// Resolves a call against a definition's signatures, in registration
/// order. The first signature whose parameter checks all pass wins. When
/// none matches, a single-signature definition surfaces its own errors
/// verbatim; otherwise one summary error is emitted.
pub(crate) fn create(
    name: &str,
    definition: &'static [Signature],
    args: Vec<Expression>,
    ctx: &ParsingContext,
) -> Option<Expression> {
    let mut scratch: Vec<ParsingError> = Vec::new();

    for signature in definition {
        scratch.clear();

        match &signature.params {
            Params::Fixed(params) => {
                if params.len() != args.len() {
                    scratch.push(ParsingError::new(
                        format!(
                            "Expected {} arguments, but found {} instead.",
                            params.len(),
                            args.len()
                        ),
                        ctx.key(),
                    ));
                    continue;
                }
                for (i, arg) in args.iter().enumerate() {
                    if let Some(message) = check_subtype(&params[i], &arg.ty()) {
                        scratch.push(ParsingError::new(
                            message,
                            format!("{}[{}]", ctx.key(), i + 1),
                        ));
                    }
                }
            }
            Params::Varargs(item) => {
                for (i, arg) in args.iter().enumerate() {
                    if let Some(message) = check_subtype(item, &arg.ty()) {
                        scratch.push(ParsingError::new(
                            message,
                            format!("{}[{}]", ctx.key(), i + 1),
                        ));
                    }
                }
            }
        }

        if scratch.is_empty() {
            return Some(Expression::Compound(Compound {
                name: name.to_string(),
                signature,
                args,
            }));
        }
    }

    if definition.len() == 1 {
        ctx.extend_errors(scratch);
    } else {
        let signatures = definition
            .iter()
            .map(|signature| match &signature.params {
                Params::Varargs(item) => format!("({})", item),
                Params::Fixed(params) => format!(
                    "({})",
                    params
                        .iter()
                        .map(Type::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
            .collect::<Vec<_>>()
            .join(" | ");
        let actual_types = args
            .iter()
            .map(|arg| arg.ty().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        ctx.error(format!(
            "Expected arguments of type {}, but found ({}) instead.",
            signatures, actual_types
        ));
    }

    None
}
