// This module provides the mathematical builtins: constants, arithmetic,
// transcendentals, and the varargs min/max folds. All are pure functions of
// their arguments.

use crate::expr::downcast;
use crate::registry::{sig, varargs, EvalFn, Registry};
use crate::types::Type;
use crate::value::Value;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Euler's number.
///
/// Usage: ["e"]
///
///   Returns: Number
pub const E: EvalFn = |_, _| Ok(Value::Number(std::f64::consts::E));

/// The ratio of a circle's circumference to its diameter.
///
/// Usage: ["pi"]
///
///   Returns: Number
pub const PI: EvalFn = |_, _| Ok(Value::Number(std::f64::consts::PI));

/// The natural logarithm of 2.
///
/// Usage: ["ln2"]
///
///   Returns: Number
pub const LN2: EvalFn = |_, _| Ok(Value::Number(std::f64::consts::LN_2));

// ============================================================================
// ARITHMETIC OPERATIONS
// ============================================================================

/// Adds numbers.
///
/// Usage: ["+", <a>, <b>, ...]
///   - <a>, <b>, ...: Numbers
///
///   Returns: Number (sum)
///
/// Example:
///   ["+", 2, 3, 4] ; => 9
pub const ADD: EvalFn = |_, args| {
    let mut sum = 0.0;
    for arg in args {
        sum += downcast::<f64>(arg)?;
    }
    Ok(Value::Number(sum))
};

/// Subtracts two numbers.
///
/// Usage: ["-", <a>, <b>]
///   - <a>, <b>: Numbers
///
///   Returns: Number (a - b)
///
/// Example:
///   ["-", 5, 2] ; => 3
pub const SUB: EvalFn =
    |_, args| Ok(Value::Number(downcast::<f64>(&args[0])? - downcast::<f64>(&args[1])?));

/// Multiplies numbers.
///
/// Usage: ["*", <a>, <b>, ...]
///   - <a>, <b>, ...: Numbers
///
///   Returns: Number (product)
///
/// Example:
///   ["*", 2, 3, 4] ; => 24
pub const MUL: EvalFn = |_, args| {
    let mut product = 1.0;
    for arg in args {
        product *= downcast::<f64>(arg)?;
    }
    Ok(Value::Number(product))
};

/// Divides two numbers.
///
/// Usage: ["/", <a>, <b>]
///   - <a>, <b>: Numbers
///
///   Returns: Number (a / b)
///
/// Example:
///   ["/", 7, 2] ; => 3.5
pub const DIV: EvalFn =
    |_, args| Ok(Value::Number(downcast::<f64>(&args[0])? / downcast::<f64>(&args[1])?));

/// Floating-point remainder.
///
/// Usage: ["%", <a>, <b>]
///   - <a>, <b>: Numbers
///
///   Returns: Number (a mod b)
///
/// Example:
///   ["%", 7, 4] ; => 3
pub const MOD: EvalFn =
    |_, args| Ok(Value::Number(downcast::<f64>(&args[0])? % downcast::<f64>(&args[1])?));

/// Raises a number to a power.
///
/// Usage: ["^", <base>, <exponent>]
///   - <base>, <exponent>: Numbers
///
///   Returns: Number (base ^ exponent)
///
/// Example:
///   ["^", 2, 10] ; => 1024
pub const POW: EvalFn = |_, args| {
    Ok(Value::Number(
        downcast::<f64>(&args[0])?.powf(downcast::<f64>(&args[1])?),
    ))
};

// ============================================================================
// TRANSCENDENTALS
// ============================================================================

/// Base-10 logarithm.
pub const LOG10: EvalFn = |_, args| Ok(Value::Number(downcast::<f64>(&args[0])?.log10()));

/// Natural logarithm.
pub const LN: EvalFn = |_, args| Ok(Value::Number(downcast::<f64>(&args[0])?.ln()));

/// Base-2 logarithm.
pub const LOG2: EvalFn = |_, args| Ok(Value::Number(downcast::<f64>(&args[0])?.log2()));

/// Sine, in radians.
pub const SIN: EvalFn = |_, args| Ok(Value::Number(downcast::<f64>(&args[0])?.sin()));

/// Cosine, in radians.
pub const COS: EvalFn = |_, args| Ok(Value::Number(downcast::<f64>(&args[0])?.cos()));

/// Tangent, in radians.
pub const TAN: EvalFn = |_, args| Ok(Value::Number(downcast::<f64>(&args[0])?.tan()));

/// Arcsine, in radians.
pub const ASIN: EvalFn = |_, args| Ok(Value::Number(downcast::<f64>(&args[0])?.asin()));

/// Arccosine, in radians.
pub const ACOS: EvalFn = |_, args| Ok(Value::Number(downcast::<f64>(&args[0])?.acos()));

/// Arctangent, in radians.
pub const ATAN: EvalFn = |_, args| Ok(Value::Number(downcast::<f64>(&args[0])?.atan()));

// ============================================================================
// FOLDS
// ============================================================================

/// Minimum of the arguments.
///
/// Usage: ["min", <a>, <b>, ...]
///   - <a>, <b>, ...: Numbers
///
///   Returns: Number (minimum value)
///
/// Example:
///   ["min", 3, 1, 4] ; => 1
pub const MIN: EvalFn = |_, args| {
    let mut result = f64::INFINITY;
    for arg in args {
        result = result.min(downcast::<f64>(arg)?);
    }
    Ok(Value::Number(result))
};

/// Maximum of the arguments.
///
/// Usage: ["max", <a>, <b>, ...]
///   - <a>, <b>, ...: Numbers
///
///   Returns: Number (maximum value)
///
/// Example:
///   ["max", 3, 1, 4] ; => 4
pub const MAX: EvalFn = |_, args| {
    let mut result = f64::NEG_INFINITY;
    for arg in args {
        result = result.max(downcast::<f64>(arg)?);
    }
    Ok(Value::Number(result))
};

// ============================================================================
// REGISTRATION FUNCTION
// ============================================================================

/// Registers all mathematical builtins with the given registry.
pub fn register_math(registry: &mut Registry) {
    registry.register("e", vec![sig(Type::Number, vec![], E)]);
    registry.register("pi", vec![sig(Type::Number, vec![], PI)]);
    registry.register("ln2", vec![sig(Type::Number, vec![], LN2)]);

    registry.register("+", vec![varargs(Type::Number, Type::Number, ADD)]);
    registry.register("-", vec![sig(Type::Number, vec![Type::Number, Type::Number], SUB)]);
    registry.register("*", vec![varargs(Type::Number, Type::Number, MUL)]);
    registry.register("/", vec![sig(Type::Number, vec![Type::Number, Type::Number], DIV)]);
    registry.register("%", vec![sig(Type::Number, vec![Type::Number, Type::Number], MOD)]);
    registry.register("^", vec![sig(Type::Number, vec![Type::Number, Type::Number], POW)]);

    registry.register("log10", vec![sig(Type::Number, vec![Type::Number], LOG10)]);
    registry.register("ln", vec![sig(Type::Number, vec![Type::Number], LN)]);
    registry.register("log2", vec![sig(Type::Number, vec![Type::Number], LOG2)]);
    registry.register("sin", vec![sig(Type::Number, vec![Type::Number], SIN)]);
    registry.register("cos", vec![sig(Type::Number, vec![Type::Number], COS)]);
    registry.register("tan", vec![sig(Type::Number, vec![Type::Number], TAN)]);
    registry.register("asin", vec![sig(Type::Number, vec![Type::Number], ASIN)]);
    registry.register("acos", vec![sig(Type::Number, vec![Type::Number], ACOS)]);
    registry.register("atan", vec![sig(Type::Number, vec![Type::Number], ATAN)]);

    registry.register("min", vec![varargs(Type::Number, Type::Number, MIN)]);
    registry.register("max", vec![varargs(Type::Number, Type::Number, MAX)]);
}
