// Color constructors and conversions. The `rgba`/`rgb` builders take RGB
// channels in 0-255 and alpha in 0-1, normalizing the result into the
// four-channel-double representation.

use crate::color::Color;
use crate::error::EvalError;
use crate::expr::downcast;
use crate::registry::{sig, EvalFn, Registry};
use crate::types::Type;
use crate::value::{ToExpressionValue, Value};

fn stringify_channels(r: f64, g: f64, b: f64, a: f64) -> String {
    format!("{}, {}, {}, {}", r, g, b, a)
}

fn build_rgba(r: f64, g: f64, b: f64, a: f64) -> Result<Value, EvalError> {
    if r < 0.0 || r > 255.0 || g < 0.0 || g > 255.0 || b < 0.0 || b > 255.0 {
        return Err(EvalError::new(format!(
            "Invalid rgba value [{}]: 'r', 'g', and 'b' must be between 0 and 255.",
            stringify_channels(r, g, b, a)
        )));
    }
    if a < 0.0 || a > 1.0 {
        return Err(EvalError::new(format!(
            "Invalid rgba value [{}]: 'a' must be between 0 and 1.",
            stringify_channels(r, g, b, a)
        )));
    }
    Ok(Value::Color(Color::new(r / 255.0, g / 255.0, b / 255.0, a)))
}

/// Builds a color from channels.
///
/// Usage: ["rgba", <r>, <g>, <b>, <a>]
///   - <r>, <g>, <b>: Numbers in 0-255
///   - <a>: Number in 0-1
///
///   Returns: Color
///
/// Example:
///   ["rgba", 255, 0, 0, 0.5] ; => half-transparent red
///
/// Note: Errors when a channel is out of range.
pub const RGBA: EvalFn = |_, args| {
    build_rgba(
        downcast(&args[0])?,
        downcast(&args[1])?,
        downcast(&args[2])?,
        downcast(&args[3])?,
    )
};

/// Builds an opaque color from RGB channels.
///
/// Usage: ["rgb", <r>, <g>, <b>]
///   - <r>, <g>, <b>: Numbers in 0-255
///
///   Returns: Color (alpha 1)
///
/// Example:
///   ["rgb", 0, 255, 0] ; => green
pub const RGB: EvalFn = |_, args| {
    build_rgba(
        downcast(&args[0])?,
        downcast(&args[1])?,
        downcast(&args[2])?,
        1.0,
    )
};

/// Decomposes a color into its channel doubles.
///
/// Usage: ["to_rgba", <color>]
///   - <color>: Color
///
///   Returns: Array<Number, 4> of r, g, b, a in 0-1
///
/// Example:
///   ["to_rgba", ["rgb", 255, 0, 0]] ; => [1, 0, 0, 1]
pub const TO_RGBA: EvalFn = |_, args| {
    let color: Color = downcast(&args[0])?;
    Ok([color.r, color.g, color.b, color.a].to_value())
};

/// Parses a CSS color string.
///
/// Usage: ["parse_color", <string>]
///   - <string>: String (hex, rgb()/rgba(), hsl()/hsla(), or a named color)
///
///   Returns: Color
///
/// Example:
///   ["parse_color", "#ff0000"] ; => red
///
/// Note: Errors when the string is not a recognized color.
pub const PARSE_COLOR: EvalFn = |_, args| {
    let input: String = downcast(&args[0])?;
    Color::parse(&input)
        .map(Value::Color)
        .ok_or_else(|| EvalError::new(format!("Could not parse color from value '{}'", input)))
};

/// Registers the color builtins with the given registry.
pub fn register_color(registry: &mut Registry) {
    registry.register(
        "rgba",
        vec![sig(
            Type::Color,
            vec![Type::Number, Type::Number, Type::Number, Type::Number],
            RGBA,
        )],
    );
    registry.register(
        "rgb",
        vec![sig(Type::Color, vec![Type::Number, Type::Number, Type::Number], RGB)],
    );

    registry.register(
        "to_rgba",
        vec![sig(Type::array_n(Type::Number, 4), vec![Type::Color], TO_RGBA)],
    );
    registry.register("parse_color", vec![sig(Type::Color, vec![Type::String], PARSE_COLOR)]);
}
