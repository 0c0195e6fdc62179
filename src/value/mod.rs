pub mod convert;

use crate::color::Color;
use crate::types::Type;

pub use convert::{
    to_expression_value, value_type_to_expression_type, FromExpressionValue, LineCap, Position,
    TextAnchor, ToExpressionValue,
};

/// Javascript's `Number.MAX_SAFE_INTEGER`: the largest integer exactly
/// representable as an `f64`.
pub const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub type ObjectMap = im::HashMap<String, Value>;

/// A runtime expression value, mirroring the type lattice.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Color(Color),
    Array(Vec<Value>),
    Object(ObjectMap),
}

impl Value {
    /// Whether a number's magnitude is within the integer safety bound.
    pub fn is_safe_numeric(x: f64) -> bool {
        x.abs() <= MAX_SAFE_INTEGER
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

/// Computes the expression type of a runtime value.
///
/// An array's item type is the fold of its elements' types; two disagreeing
/// elements widen the item type to `Value`. The array's length is always
/// recorded.
pub fn type_of(value: &Value) -> Type {
    match value {
        Value::Null => Type::Null,
        Value::Bool(_) => Type::Boolean,
        Value::Number(_) => Type::Number,
        Value::String(_) => Type::String,
        Value::Color(_) => Type::Color,
        Value::Object(_) => Type::Object,
        Value::Array(items) => {
            let mut item_type: Option<Type> = None;
            for item in items {
                let t = type_of(item);
                match &item_type {
                    None => item_type = Some(t),
                    Some(previous) if *previous == t => {}
                    Some(_) => {
                        item_type = Some(Type::Value);
                        break;
                    }
                }
            }
            Type::Array(Box::new(item_type.unwrap_or(Type::Value)), Some(items.len()))
        }
    }
}

/// Renders a value as a JSON-like string.
///
/// Strings are quoted, arrays and objects comma-joined, and colors render as
/// their four channel doubles `r,g,b,a`.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("\"{}\"", s),
        Value::Color(c) => format!("{},{},{},{}", c.r, c.g, c.b, c.a),
        Value::Array(items) => {
            let mut result = String::from("[");
            for item in items {
                if result.len() > 1 {
                    result.push(',');
                }
                result.push_str(&stringify(item));
            }
            result.push(']');
            result
        }
        Value::Object(map) => {
            let mut result = String::from("{");
            for (key, item) in map {
                if result.len() > 1 {
                    result.push(',');
                }
                result.push_str(&format!("\"{}\":{}", key, stringify(item)));
            }
            result.push('}');
            result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_of_scalars() {
        assert_eq!(type_of(&Value::Null), Type::Null);
        assert_eq!(type_of(&Value::Bool(true)), Type::Boolean);
        assert_eq!(type_of(&Value::Number(1.5)), Type::Number);
        assert_eq!(type_of(&Value::String("x".into())), Type::String);
        assert_eq!(type_of(&Value::Color(Color::black())), Type::Color);
        assert_eq!(type_of(&Value::Object(ObjectMap::new())), Type::Object);
    }

    #[test]
    fn type_of_homogeneous_array() {
        let v = Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]);
        assert_eq!(type_of(&v), Type::array_n(Type::Number, 2));
    }

    #[test]
    fn type_of_heterogeneous_array_widens_to_value() {
        let v = Value::Array(vec![Value::Number(1.0), Value::String("a".into())]);
        assert_eq!(type_of(&v), Type::array_n(Type::Value, 2));
    }

    #[test]
    fn type_of_empty_array() {
        assert_eq!(type_of(&Value::Array(vec![])), Type::array_n(Type::Value, 0));
    }

    #[test]
    fn stringify_forms() {
        assert_eq!(stringify(&Value::Null), "null");
        assert_eq!(stringify(&Value::Bool(false)), "false");
        assert_eq!(stringify(&Value::Number(1.0)), "1");
        assert_eq!(stringify(&Value::Number(2.5)), "2.5");
        assert_eq!(stringify(&Value::String("hi".into())), "\"hi\"");
        assert_eq!(
            stringify(&Value::Array(vec![Value::Number(1.0), Value::Bool(true)])),
            "[1,true]"
        );
        assert_eq!(
            stringify(&Value::Color(Color::new(1.0, 0.0, 0.0, 1.0))),
            "1,0,0,1"
        );
        let mut map = ObjectMap::new();
        map.insert("k".to_string(), Value::Number(3.0));
        assert_eq!(stringify(&Value::Object(map)), "{\"k\":3}");
    }

    #[test]
    fn safe_numeric_bound_is_exact() {
        assert!(Value::is_safe_numeric(MAX_SAFE_INTEGER));
        assert!(Value::is_safe_numeric(-MAX_SAFE_INTEGER));
        assert!(!Value::is_safe_numeric(MAX_SAFE_INTEGER + 1.0));
        assert!(!Value::is_safe_numeric(f64::INFINITY));
        assert!(!Value::is_safe_numeric(f64::NAN));
    }
}
