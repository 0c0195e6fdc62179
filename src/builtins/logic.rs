// Logic and comparison builtins.
//
// Equality is registered once per scalar type (number, boolean, string,
// null); comparing across types is therefore a parse error, not a runtime
// false. Ordered comparisons are defined for numbers only.

use crate::expr::downcast;
use crate::registry::{sig, varargs, Definition, EvalFn, Registry};
use crate::types::Type;
use crate::value::Value;

/// Tests two same-typed scalars for equality.
///
/// Usage: ["==", <a>, <b>]
///   - <a>, <b>: both Number, Boolean, String, or Null
///
///   Returns: Boolean
///
/// Example:
///   ["==", 1, 1] ; => true
pub const EQUAL: EvalFn = |_, args| Ok(Value::Bool(args[0] == args[1]));

/// Tests two same-typed scalars for inequality.
///
/// Usage: ["!=", <a>, <b>]
///   - <a>, <b>: both Number, Boolean, String, or Null
///
///   Returns: Boolean
///
/// Example:
///   ["!=", "a", "b"] ; => true
pub const NOT_EQUAL: EvalFn = |_, args| Ok(Value::Bool(args[0] != args[1]));

/// Strictly-greater comparison.
///
/// Usage: [">", <a>, <b>]
///   - <a>, <b>: Numbers
///
///   Returns: Boolean (a > b)
pub const GREATER: EvalFn =
    |_, args| Ok(Value::Bool(downcast::<f64>(&args[0])? > downcast::<f64>(&args[1])?));

/// Greater-or-equal comparison.
///
/// Usage: [">=", <a>, <b>]
///   - <a>, <b>: Numbers
///
///   Returns: Boolean (a >= b)
pub const GREATER_EQUAL: EvalFn =
    |_, args| Ok(Value::Bool(downcast::<f64>(&args[0])? >= downcast::<f64>(&args[1])?));

/// Strictly-less comparison.
///
/// Usage: ["<", <a>, <b>]
///   - <a>, <b>: Numbers
///
///   Returns: Boolean (a < b)
pub const LESS: EvalFn =
    |_, args| Ok(Value::Bool(downcast::<f64>(&args[0])? < downcast::<f64>(&args[1])?));

/// Less-or-equal comparison.
///
/// Usage: ["<=", <a>, <b>]
///   - <a>, <b>: Numbers
///
///   Returns: Boolean (a <= b)
pub const LESS_EQUAL: EvalFn =
    |_, args| Ok(Value::Bool(downcast::<f64>(&args[0])? <= downcast::<f64>(&args[1])?));

/// Boolean disjunction over the arguments.
///
/// Usage: ["||", <a>, <b>, ...]
///   - <a>, <b>, ...: Booleans
///
///   Returns: Boolean (true iff any argument is true)
///
/// Example:
///   ["||", false, false, true] ; => true
pub const ANY: EvalFn = |_, args| {
    let mut result = false;
    for arg in args {
        result = result || downcast::<bool>(arg)?;
    }
    Ok(Value::Bool(result))
};

/// Boolean conjunction over the arguments.
///
/// Usage: ["&&", <a>, <b>, ...]
///   - <a>, <b>, ...: Booleans
///
///   Returns: Boolean (true iff every argument is true)
///
/// Example:
///   ["&&", true, false] ; => false
pub const ALL: EvalFn = |_, args| {
    let mut result = true;
    for arg in args {
        result = result && downcast::<bool>(arg)?;
    }
    Ok(Value::Bool(result))
};

/// Boolean negation.
///
/// Usage: ["!", <a>]
///   - <a>: Boolean
///
///   Returns: Boolean (not a)
///
/// Example:
///   ["!", false] ; => true
pub const NOT: EvalFn = |_, args| Ok(Value::Bool(!downcast::<bool>(&args[0])?));

fn equality_overloads(eval: EvalFn) -> Definition {
    vec![
        sig(Type::Boolean, vec![Type::Number, Type::Number], eval),
        sig(Type::Boolean, vec![Type::Boolean, Type::Boolean], eval),
        sig(Type::Boolean, vec![Type::String, Type::String], eval),
        sig(Type::Boolean, vec![Type::Null, Type::Null], eval),
    ]
}

/// Registers all logic and comparison builtins with the given registry.
pub fn register_logic(registry: &mut Registry) {
    registry.register("==", equality_overloads(EQUAL));
    registry.register("!=", equality_overloads(NOT_EQUAL));

    registry.register(">", vec![sig(Type::Boolean, vec![Type::Number, Type::Number], GREATER)]);
    registry.register(
        ">=",
        vec![sig(Type::Boolean, vec![Type::Number, Type::Number], GREATER_EQUAL)],
    );
    registry.register("<", vec![sig(Type::Boolean, vec![Type::Number, Type::Number], LESS)]);
    registry.register(
        "<=",
        vec![sig(Type::Boolean, vec![Type::Number, Type::Number], LESS_EQUAL)],
    );

    registry.register("||", vec![varargs(Type::Boolean, Type::Boolean, ANY)]);
    registry.register("&&", vec![varargs(Type::Boolean, Type::Boolean, ALL)]);
    registry.register("!", vec![sig(Type::Boolean, vec![Type::Boolean], NOT)]);
}
