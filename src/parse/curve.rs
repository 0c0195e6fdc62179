//! The `curve` parser: interpolator selection, stop validation, and
//! output-type interpolatability checks.

use serde_json::Value as Json;

use crate::curve::{Curve, Interpolator, UnitBezier};
use crate::expr::Expression;
use crate::parse::{json_number, parse, ParsingContext};
use crate::types::Type;
use crate::value::Value;

pub(crate) fn parse_curve(items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    let length = items.len();
    if length < 5 {
        ctx.error(format!(
            "Expected at least 4 arguments, but found only {}.",
            length - 1
        ));
        return None;
    }

    // [curve, interp, input, 2 * (n stop pairs)...]
    if length % 2 != 1 {
        ctx.error("Expected an even number of arguments.");
        return None;
    }

    let Some(interp_items) = items[1].as_array().filter(|a| !a.is_empty()) else {
        ctx.error("Expected an interpolation type expression.");
        return None;
    };

    let interp_name = interp_items[0].as_str().unwrap_or("");
    let interp_ctx = ctx.child(1, None);
    let interpolator = match interp_name {
        "step" => Interpolator::Step,
        "linear" => Interpolator::Exponential { base: 1.0 },
        "exponential" => {
            let base = if interp_items.len() == 2 {
                interp_items[1].as_f64()
            } else {
                None
            };
            let Some(base) = base else {
                interp_ctx.error_at("Exponential interpolation requires a numeric base.", 1);
                return None;
            };
            Interpolator::Exponential { base }
        }
        "cubic-bezier" => {
            let points: Option<Vec<f64>> = if interp_items.len() == 5 {
                interp_items[1..].iter().map(Json::as_f64).collect()
            } else {
                None
            };
            match points {
                Some(p) if p.iter().all(|x| (0.0..=1.0).contains(x)) => {
                    Interpolator::CubicBezier(UnitBezier::new(p[0], p[1], p[2], p[3]))
                }
                _ => {
                    interp_ctx.error(
                        "Cubic bezier interpolation requires four numeric arguments with values between 0 and 1.",
                    );
                    return None;
                }
            }
        }
        _ => {
            interp_ctx.error_at(format!("Unknown interpolation type {}", interp_name), 0);
            return None;
        }
    };

    let input = parse(&items[2], &ctx.child(2, Some(Type::Number)))?;

    let mut output_type = ctx.expected().cloned();
    let mut stops: Vec<(f64, Expression)> = Vec::new();
    let mut previous = f64::NEG_INFINITY;

    let mut i = 3;
    while i + 1 < length {
        let label = match &items[i] {
            Json::Number(n) => json_number(n),
            _ => {
                ctx.error_at(
                    r#"Input/output pairs for "curve" expressions must be defined using literal numeric values (not computed expressions) for the input values."#,
                    i,
                );
                return None;
            }
        };

        if !Value::is_safe_numeric(label) {
            ctx.error_at("Numeric values must be no larger than 9007199254740991.", i);
            return None;
        }

        if label <= previous {
            ctx.error_at(
                r#"Input/output pairs for "curve" expressions must be arranged with input values in strictly ascending order."#,
                i,
            );
            return None;
        }
        previous = label;

        let output = parse(&items[i + 1], &ctx.child(i + 1, output_type.clone()))?;
        if output_type.is_none() {
            output_type = Some(output.ty());
        }

        stops.push((label, output));
        i += 2;
    }

    let output_type = output_type?;

    let interpolatable = matches!(output_type, Type::Number | Type::Color)
        || matches!(&output_type, Type::Array(item, _) if **item == Type::Number);
    if !matches!(interpolator, Interpolator::Step) && !interpolatable {
        ctx.error(format!(
            "Type {} is not interpolatable, and thus cannot be used as a {} curve's output type.",
            output_type, interp_name
        ));
        return None;
    }

    Some(Expression::Curve(Curve::new(
        output_type,
        interpolator,
        input,
        stops,
    )))
}
