//! Conversion between the dynamically-typed expression domain and
//! strongly-typed host values.
//!
//! The host side of the boundary is `serde_json::Value`, whose `Number`
//! representation keeps the u64/i64/f64 tagging needed for integer safety
//! checks. All fallible conversions return `None` rather than panicking.

use serde_json::Value as Json;

use crate::color::Color;
use crate::types::Type;
use crate::value::{ObjectMap, Value, MAX_SAFE_INTEGER};

/// Converts a host JSON value into an expression value.
///
/// Integer magnitudes above the safety bound are clamped to it; doubles pass
/// through unchanged (literal parsing applies the strict check instead).
pub fn to_expression_value(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(u) = n.as_u64() {
                Value::Number((u as f64).min(MAX_SAFE_INTEGER))
            } else if let Some(i) = n.as_i64() {
                Value::Number((i as f64).clamp(-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER))
            } else {
                Value::Number(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(items.iter().map(to_expression_value).collect()),
        Json::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_expression_value(v)))
                .collect(),
        ),
    }
}

/// Total conversion from an expression value to a concrete host type.
///
/// Implemented for primitive scalars, fixed-length and variable arrays,
/// positions, enumeration types, and colors. `expression_type` is the
/// expression type corresponding to the host type, used to seed builtin
/// signatures and to phrase conversion errors.
pub trait FromExpressionValue: Sized {
    fn expression_type() -> Type;
    fn from_expression_value(value: &Value) -> Option<Self>;
}

/// The inverse direction: a host value rendered into the expression domain.
pub trait ToExpressionValue {
    fn to_value(&self) -> Value;
}

/// The expression type corresponding to a host type; used to seed builtin
/// signatures.
pub fn value_type_to_expression_type<T: FromExpressionValue>() -> Type {
    T::expression_type()
}

impl FromExpressionValue for Value {
    fn expression_type() -> Type {
        Type::Value
    }
    fn from_expression_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl ToExpressionValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromExpressionValue for bool {
    fn expression_type() -> Type {
        Type::Boolean
    }
    fn from_expression_value(value: &Value) -> Option<Self> {
        value.as_bool()
    }
}

impl ToExpressionValue for bool {
    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl FromExpressionValue for f64 {
    fn expression_type() -> Type {
        Type::Number
    }
    fn from_expression_value(value: &Value) -> Option<Self> {
        value.as_number()
    }
}

impl ToExpressionValue for f64 {
    fn to_value(&self) -> Value {
        Value::Number(*self)
    }
}

impl FromExpressionValue for String {
    fn expression_type() -> Type {
        Type::String
    }
    fn from_expression_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_string)
    }
}

impl ToExpressionValue for String {
    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl FromExpressionValue for Color {
    fn expression_type() -> Type {
        Type::Color
    }
    fn from_expression_value(value: &Value) -> Option<Self> {
        match value {
            Value::Color(c) => Some(*c),
            _ => None,
        }
    }
}

impl ToExpressionValue for Color {
    fn to_value(&self) -> Value {
        Value::Color(*self)
    }
}

impl FromExpressionValue for ObjectMap {
    fn expression_type() -> Type {
        Type::Object
    }
    fn from_expression_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(map.clone()),
            _ => None,
        }
    }
}

impl ToExpressionValue for ObjectMap {
    fn to_value(&self) -> Value {
        Value::Object(self.clone())
    }
}

impl<T: FromExpressionValue> FromExpressionValue for Vec<T> {
    fn expression_type() -> Type {
        Type::array(T::expression_type())
    }
    fn from_expression_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) => items.iter().map(T::from_expression_value).collect(),
            _ => None,
        }
    }
}

impl<T: ToExpressionValue> ToExpressionValue for Vec<T> {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToExpressionValue::to_value).collect())
    }
}

impl<T: FromExpressionValue, const N: usize> FromExpressionValue for [T; N] {
    fn expression_type() -> Type {
        Type::array_n(T::expression_type(), N)
    }
    fn from_expression_value(value: &Value) -> Option<Self> {
        match value {
            Value::Array(items) if items.len() == N => {
                let converted: Option<Vec<T>> =
                    items.iter().map(T::from_expression_value).collect();
                converted.and_then(|v| v.try_into().ok())
            }
            _ => None,
        }
    }
}

impl<T: ToExpressionValue, const N: usize> ToExpressionValue for [T; N] {
    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(ToExpressionValue::to_value).collect())
    }
}

/// A spherical position (radial, azimuthal, polar), carried through the
/// expression domain as `Array<Number, 3>`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub radial: f64,
    pub azimuthal: f64,
    pub polar: f64,
}

impl Position {
    pub fn from_spherical([radial, azimuthal, polar]: [f64; 3]) -> Self {
        Self {
            radial,
            azimuthal,
            polar,
        }
    }

    pub fn to_spherical(self) -> [f64; 3] {
        [self.radial, self.azimuthal, self.polar]
    }
}

impl FromExpressionValue for Position {
    fn expression_type() -> Type {
        Type::array_n(Type::Number, 3)
    }
    fn from_expression_value(value: &Value) -> Option<Self> {
        <[f64; 3]>::from_expression_value(value).map(Position::from_spherical)
    }
}

impl ToExpressionValue for Position {
    fn to_value(&self) -> Value {
        self.to_spherical().to_value()
    }
}

/// Declares an enumeration type with an explicit name table, wired into the
/// conversion layer as a `String`-typed expression value.
macro_rules! style_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_str(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl FromExpressionValue for $name {
            fn expression_type() -> Type {
                Type::String
            }
            fn from_expression_value(value: &Value) -> Option<Self> {
                value.as_str().and_then(Self::from_str)
            }
        }

        impl ToExpressionValue for $name {
            fn to_value(&self) -> Value {
                Value::String(self.as_str().to_string())
            }
        }
    };
}

style_enum!(
    /// Line endcap style.
    LineCap {
        Butt => "butt",
        Round => "round",
        Square => "square",
    }
);

style_enum!(
    /// Anchor placement for text relative to its position.
    TextAnchor {
        Center => "center",
        Left => "left",
        Right => "right",
        Top => "top",
        Bottom => "bottom",
        TopLeft => "top-left",
        TopRight => "top-right",
        BottomLeft => "bottom-left",
        BottomRight => "bottom-right",
    }
);
