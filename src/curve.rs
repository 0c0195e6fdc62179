//! Piecewise interpolation over sorted numeric stops.
//!
//! A curve evaluates its input to a number, brackets it between two stops,
//! and blends the stop outputs with a pluggable interpolator. Interpolation
//! is defined for numbers, colors, and numeric arrays; every other output
//! type is restricted to step interpolation by the parser.

use crate::color::Color;
use crate::error::EvalError;
use crate::expr::{downcast, EvaluationContext, EvaluationResult, Expression};
use crate::types::Type;
use crate::value::Value;

/// A unit cubic bézier curve with endpoints (0,0) and (1,1), solved for `y`
/// at a given `x` by Newton iteration with a bisection fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitBezier {
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}

impl UnitBezier {
    pub fn new(p1x: f64, p1y: f64, p2x: f64, p2y: f64) -> Self {
        // Polynomial coefficients, expanded from the control points.
        let cx = 3.0 * p1x;
        let bx = 3.0 * (p2x - p1x) - cx;
        let ax = 1.0 - cx - bx;
        let cy = 3.0 * p1y;
        let by = 3.0 * (p2y - p1y) - cy;
        let ay = 1.0 - cy - by;
        Self {
            ax,
            bx,
            cx,
            ay,
            by,
            cy,
        }
    }

    fn sample_curve_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_curve_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_curve_derivative_x(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    fn solve_curve_x(&self, x: f64, epsilon: f64) -> f64 {
        // Newton's method first.
        let mut t2 = x;
        for _ in 0..8 {
            let x2 = self.sample_curve_x(t2) - x;
            if x2.abs() < epsilon {
                return t2;
            }
            let d2 = self.sample_curve_derivative_x(t2);
            if d2.abs() < 1e-6 {
                break;
            }
            t2 -= x2 / d2;
        }

        // Fall back to bisection.
        let mut t0 = 0.0;
        let mut t1 = 1.0;
        t2 = x.clamp(t0, t1);
        while t0 < t1 {
            let x2 = self.sample_curve_x(t2);
            if (x2 - x).abs() < epsilon {
                return t2;
            }
            if x > x2 {
                t0 = t2;
            } else {
                t1 = t2;
            }
            t2 = (t1 - t0) * 0.5 + t0;
        }
        t2
    }

    pub fn solve(&self, x: f64, epsilon: f64) -> f64 {
        self.sample_curve_y(self.solve_curve_x(x, epsilon))
    }
}

/// The interpolation factor `t ∈ [0, 1]` between two stop keys, given an
/// exponential base: linear when the base is 1, otherwise weighted by
/// `(base^p − 1) / (base^d − 1)`.
pub fn exponential_factor(base: f64, range: (f64, f64), x: f64) -> f64 {
    let difference = range.1 - range.0;
    let progress = x - range.0;
    if difference == 0.0 {
        0.0
    } else if base == 1.0 {
        progress / difference
    } else {
        (base.powf(progress) - 1.0) / (base.powf(difference) - 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Interpolator {
    /// Always resolves to the lower stop. The only interpolator legal for
    /// non-interpolatable output types.
    Step,
    Exponential { base: f64 },
    CubicBezier(UnitBezier),
}

impl Interpolator {
    pub fn factor(&self, range: (f64, f64), x: f64) -> f64 {
        match self {
            Interpolator::Step => 0.0,
            Interpolator::Exponential { base } => exponential_factor(*base, range, x),
            Interpolator::CubicBezier(bezier) => {
                let difference = range.1 - range.0;
                if difference == 0.0 {
                    0.0
                } else {
                    bezier.solve((x - range.0) / difference, 1e-6)
                }
            }
        }
    }
}

/// How stop outputs are blended once a factor is known. Chosen from the
/// output type at parse time; evaluation dispatches on the tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputKind {
    Number,
    Color,
    NumberArray,
    StepOnly,
}

#[derive(Debug)]
pub struct Curve {
    ty: Type,
    kind: OutputKind,
    interpolator: Interpolator,
    input: Box<Expression>,
    stops: Vec<(f64, Expression)>,
}

impl Curve {
    /// `stops` must hold strictly ascending, finite keys; the parser
    /// enforces this before construction.
    pub fn new(
        ty: Type,
        interpolator: Interpolator,
        input: Expression,
        stops: Vec<(f64, Expression)>,
    ) -> Self {
        let kind = match &ty {
            Type::Number => OutputKind::Number,
            Type::Color => OutputKind::Color,
            Type::Array(item, _) if **item == Type::Number => OutputKind::NumberArray,
            _ => OutputKind::StepOnly,
        };
        Self {
            ty,
            kind,
            interpolator,
            input: Box::new(input),
            stops,
        }
    }

    pub fn ty(&self) -> Type {
        self.ty.clone()
    }

    pub fn input(&self) -> &Expression {
        &self.input
    }

    pub fn stops(&self) -> impl Iterator<Item = (f64, &Expression)> + '_ {
        self.stops.iter().map(|(key, output)| (*key, output))
    }

    pub fn interpolation_factor(&self, range: (f64, f64), x: f64) -> f64 {
        self.interpolator.factor(range, x)
    }

    pub(crate) fn evaluate(&self, ctx: &EvaluationContext) -> EvaluationResult {
        let x: f64 = self.input.evaluate_as(ctx)?;

        if self.stops.is_empty() {
            return Err(EvalError::new("No stops in exponential curve."));
        }

        // The smallest stop key strictly greater than x.
        let idx = self.stops.partition_point(|(key, _)| *key <= x);
        if idx == self.stops.len() {
            return self.stops[self.stops.len() - 1].1.evaluate(ctx);
        }
        if idx == 0 {
            return self.stops[0].1.evaluate(ctx);
        }

        let (a, lower_expr) = &self.stops[idx - 1];
        let (b, upper_expr) = &self.stops[idx];
        let t = self.interpolation_factor((*a, *b), x);

        // Short-circuit the endpoints so non-interpolatable outputs never
        // reach the blend.
        if t == 0.0 {
            return lower_expr.evaluate(ctx);
        }
        if t == 1.0 {
            return upper_expr.evaluate(ctx);
        }

        let lower = lower_expr.evaluate(ctx)?;
        let upper = upper_expr.evaluate(ctx)?;
        self.interpolate(&lower, &upper, t)
    }

    fn interpolate(&self, lower: &Value, upper: &Value, t: f64) -> EvaluationResult {
        fn lerp(a: f64, b: f64, t: f64) -> f64 {
            a + (b - a) * t
        }

        match self.kind {
            OutputKind::Number => {
                let a: f64 = downcast(lower)?;
                let b: f64 = downcast(upper)?;
                Ok(Value::Number(lerp(a, b, t)))
            }
            OutputKind::Color => {
                let a: Color = downcast(lower)?;
                let b: Color = downcast(upper)?;
                Ok(Value::Color(Color::new(
                    lerp(a.r, b.r, t),
                    lerp(a.g, b.g, t),
                    lerp(a.b, b.b, t),
                    lerp(a.a, b.a, t),
                )))
            }
            OutputKind::NumberArray => {
                let a: Vec<f64> = downcast(lower)?;
                let b: Vec<f64> = downcast(upper)?;
                if a.len() != b.len() {
                    return Err(EvalError::new(format!(
                        "Expected value to be of type {}, but found {} instead.",
                        self.ty,
                        crate::value::type_of(upper)
                    )));
                }
                Ok(Value::Array(
                    a.iter()
                        .zip(&b)
                        .map(|(a, b)| Value::Number(lerp(*a, *b, t)))
                        .collect(),
                ))
            }
            // The step interpolator's factor is identically zero, so the
            // endpoint short-circuits always fire before reaching here.
            OutputKind::StepOnly => Ok(Value::Null),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_factor_is_zero_everywhere() {
        let interp = Interpolator::Step;
        assert_eq!(interp.factor((0.0, 10.0), 7.3), 0.0);
    }

    #[test]
    fn linear_factor_is_proportional() {
        let interp = Interpolator::Exponential { base: 1.0 };
        assert_eq!(interp.factor((0.0, 10.0), 5.0), 0.5);
        assert_eq!(interp.factor((0.0, 10.0), 0.0), 0.0);
        assert_eq!(interp.factor((4.0, 4.0), 4.0), 0.0);
    }

    #[test]
    fn exponential_factor_weights_by_base() {
        let t = exponential_factor(2.0, (0.0, 2.0), 1.0);
        // (2^1 - 1) / (2^2 - 1)
        assert!((t - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn corner_bezier_is_linear() {
        let bezier = UnitBezier::new(0.0, 0.0, 1.0, 1.0);
        for i in 0..=10 {
            let x = f64::from(i) / 10.0;
            assert!((bezier.solve(x, 1e-6) - x).abs() < 1e-5);
        }
    }

    #[test]
    fn bezier_solution_is_monotonic() {
        let bezier = UnitBezier::new(0.42, 0.0, 0.58, 1.0);
        let mut previous = 0.0;
        for i in 1..=10 {
            let y = bezier.solve(f64::from(i) / 10.0, 1e-6);
            assert!(y >= previous);
            previous = y;
        }
    }
}
