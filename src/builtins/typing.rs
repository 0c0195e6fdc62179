// Type inspection, type assertions, and value conversions.
//
// The assertion operators (`number`, `string`, `boolean`, `object`) narrow
// a `Value`-typed expression at runtime: they fail with the standard
// type-mismatch message when the runtime value has a different type.

use crate::error::EvalError;
use crate::expr::downcast;
use crate::registry::{sig, EvalFn, Registry};
use crate::types::Type;
use crate::value::{stringify, type_of, FromExpressionValue, ObjectMap, ToExpressionValue, Value};

/// Name of a value's runtime type.
///
/// Usage: ["typeof", <value>]
///   - <value>: any value
///
///   Returns: String (the type name)
///
/// Example:
///   ["typeof", "x"] ; => "String"
pub const TYPEOF: EvalFn = |_, args| Ok(Value::String(type_of(&args[0]).to_string()));

/// Asserts that a value has the host type `T`, passing it through.
///
/// Usage: ["number", <value>] (and "string", "boolean", "object")
///   - <value>: any value
///
///   Returns: the value, now statically typed
///
/// Example:
///   ["number", ["get", "n"]] ; => 4
///
/// Note: Errors if the runtime value has any other type.
fn assertion<T: FromExpressionValue + ToExpressionValue>(
    _: &crate::expr::EvaluationContext,
    args: &[Value],
) -> Result<Value, EvalError> {
    let value: T = downcast(&args[0])?;
    Ok(value.to_value())
}

/// Renders any value as its display string.
///
/// Usage: ["to_string", <value>]
///   - <value>: any value
///
///   Returns: String
///
/// Example:
///   ["to_string", ["literal", [1, true]]] ; => "[1,true]"
pub const TO_STRING: EvalFn = |_, args| Ok(Value::String(stringify(&args[0])));

/// Converts a number or numeric string to a number.
///
/// Usage: ["to_number", <value>]
///   - <value>: Number or String
///
///   Returns: Number
///
/// Example:
///   ["to_number", "3.5"] ; => 3.5
///
/// Note: Errors when the value cannot be converted.
pub const TO_NUMBER: EvalFn = |_, args| {
    let converted = match &args[0] {
        Value::Number(n) => Some(*n),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    converted.map(Value::Number).ok_or_else(|| {
        EvalError::new(format!(
            "Could not convert {} to number.",
            stringify(&args[0])
        ))
    })
};

/// Converts any value to a boolean: zero, the empty string, and null are
/// false; everything else is true.
///
/// Usage: ["to_boolean", <value>]
///   - <value>: any value
///
///   Returns: Boolean
///
/// Example:
///   ["to_boolean", ""] ; => false
pub const TO_BOOLEAN: EvalFn = |_, args| {
    let b = match &args[0] {
        Value::Number(n) => *n != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Bool(b) => *b,
        Value::Null => false,
        _ => true,
    };
    Ok(Value::Bool(b))
};

/// Registers the type inspection, assertion, and conversion builtins with
/// the given registry.
pub fn register_typing(registry: &mut Registry) {
    registry.register("typeof", vec![sig(Type::String, vec![Type::Value], TYPEOF)]);

    registry.register("number", vec![sig(Type::Number, vec![Type::Value], assertion::<f64>)]);
    registry.register(
        "string",
        vec![sig(Type::String, vec![Type::Value], assertion::<String>)],
    );
    registry.register(
        "boolean",
        vec![sig(Type::Boolean, vec![Type::Value], assertion::<bool>)],
    );
    registry.register(
        "object",
        vec![sig(Type::Object, vec![Type::Value], assertion::<ObjectMap>)],
    );

    registry.register("to_string", vec![sig(Type::String, vec![Type::Value], TO_STRING)]);
    registry.register("to_number", vec![sig(Type::Number, vec![Type::Value], TO_NUMBER)]);
    registry.register("to_boolean", vec![sig(Type::Boolean, vec![Type::Value], TO_BOOLEAN)]);
}
