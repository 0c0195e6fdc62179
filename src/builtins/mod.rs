//! The built-in compound expression library.
//!
//! Each domain module registers its signatures with the registry; the
//! registry builder calls `register_all` exactly once. All builtins receive
//! their arguments already evaluated, in call order, and unwrap them to the
//! host types their signature declares.

pub mod color;
pub mod feature;
pub mod logic;
pub mod math;
pub mod string;
pub mod typing;

use crate::error::EvalError;
use crate::registry::Registry;

pub fn register_all(registry: &mut Registry) {
    math::register_math(registry);
    logic::register_logic(registry);
    string::register_string(registry);
    typing::register_typing(registry);
    feature::register_feature(registry);
    color::register_color(registry);
}

pub(crate) fn missing_feature() -> EvalError {
    EvalError::new("Feature data is unavailable in the current evaluation context.")
}
