// String builtins, plus the array/string `length` overloads.

use crate::expr::downcast;
use crate::registry::{sig, varargs, EvalFn, Registry};
use crate::types::Type;
use crate::value::Value;

/// Number of elements in an array.
///
/// Usage: ["length", <array>]
///   - <array>: Array
///
///   Returns: Number (element count)
///
/// Example:
///   ["length", ["literal", [1, 2, 3]]] ; => 3
pub const LENGTH_ARRAY: EvalFn = |_, args| {
    let array: Vec<Value> = downcast(&args[0])?;
    Ok(Value::Number(array.len() as f64))
};

/// Length of a string, in bytes.
///
/// Usage: ["length", <string>]
///   - <string>: String
///
///   Returns: Number (byte count)
///
/// Example:
///   ["length", "abcd"] ; => 4
pub const LENGTH_STRING: EvalFn = |_, args| {
    let s: String = downcast(&args[0])?;
    Ok(Value::Number(s.len() as f64))
};

/// Uppercases a string.
///
/// Usage: ["upcase", <string>]
///   - <string>: String
///
///   Returns: String
///
/// Example:
///   ["upcase", "abc"] ; => "ABC"
pub const UPCASE: EvalFn = |_, args| {
    let s: String = downcast(&args[0])?;
    Ok(Value::String(s.to_uppercase()))
};

/// Lowercases a string.
///
/// Usage: ["downcase", <string>]
///   - <string>: String
///
///   Returns: String
///
/// Example:
///   ["downcase", "AbC"] ; => "abc"
pub const DOWNCASE: EvalFn = |_, args| {
    let s: String = downcast(&args[0])?;
    Ok(Value::String(s.to_lowercase()))
};

/// Concatenates strings.
///
/// Usage: ["concat", <a>, <b>, ...]
///   - <a>, <b>, ...: Strings
///
///   Returns: String
///
/// Example:
///   ["concat", "a", "b", "c"] ; => "abc"
pub const CONCAT: EvalFn = |_, args| {
    let mut result = String::new();
    for arg in args {
        result.push_str(&downcast::<String>(arg)?);
    }
    Ok(Value::String(result))
};

/// Registers all string builtins with the given registry.
pub fn register_string(registry: &mut Registry) {
    registry.register(
        "length",
        vec![
            sig(Type::Number, vec![Type::array(Type::Value)], LENGTH_ARRAY),
            sig(Type::Number, vec![Type::String], LENGTH_STRING),
        ],
    );

    registry.register("upcase", vec![sig(Type::String, vec![Type::String], UPCASE)]);
    registry.register("downcase", vec![sig(Type::String, vec![Type::String], DOWNCASE)]);
    registry.register("concat", vec![varargs(Type::String, Type::String, CONCAT)]);
}
