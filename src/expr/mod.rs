//! The expression tree and its evaluator.
//!
//! Expressions are immutable after parsing. Every node carries the output
//! type decided at parse time, and evaluation must produce either an error
//! or a value whose runtime type is a subtype of that declared type.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::curve::Curve;
use crate::error::EvalError;
use crate::feature::Feature;
use crate::registry::Compound;
use crate::types::{check_subtype, Type};
use crate::value::{stringify, type_of, FromExpressionValue, Value};

/// The per-call inputs of an evaluation: an optional zoom level and an
/// optional feature. Expressions that read a missing dimension fail with a
/// fixed message.
#[derive(Default, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub zoom: Option<f64>,
    pub feature: Option<&'a dyn Feature>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom = Some(zoom);
        self
    }

    pub fn with_feature(mut self, feature: &'a dyn Feature) -> Self {
        self.feature = Some(feature);
        self
    }
}

pub type EvaluationResult = Result<Value, EvalError>;

/// Unwraps an evaluated value into the host type a builtin or node
/// statically expects.
pub(crate) fn downcast<T: FromExpressionValue>(value: &Value) -> Result<T, EvalError> {
    T::from_expression_value(value).ok_or_else(|| {
        EvalError::new(format!(
            "Expected value to be of type {}, but found {} instead.",
            T::expression_type(),
            type_of(value)
        ))
    })
}

/// An expression tree node.
///
/// A single sum type rather than a trait object per node kind: shared
/// behavior (`ty`, constancy, traversal) is a pure function over the tag,
/// and evaluation dispatches through one `match`.
#[derive(Debug)]
pub enum Expression {
    Literal(Literal),
    Var(Var),
    Let(Let),
    At(At),
    In(In),
    Coalesce(Coalesce),
    Case(Case),
    Match(Match),
    ArrayAssertion(ArrayAssertion),
    Curve(Curve),
    Compound(Compound),
}

#[derive(Debug)]
pub struct Literal {
    ty: Type,
    value: Value,
}

impl Literal {
    pub fn new(value: Value) -> Self {
        Self {
            ty: type_of(&value),
            value,
        }
    }

    /// A literal with an externally supplied type; used to give an empty
    /// array literal the item type the context expects.
    pub fn typed(ty: Type, value: Value) -> Self {
        Self { ty, value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(Debug)]
pub struct Var {
    name: String,
    value: Arc<Expression>,
}

impl Var {
    pub fn new(name: impl Into<String>, value: Arc<Expression>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Debug)]
pub struct Let {
    bindings: BTreeMap<String, Arc<Expression>>,
    result: Box<Expression>,
}

impl Let {
    pub fn new(bindings: BTreeMap<String, Arc<Expression>>, result: Expression) -> Self {
        Self {
            bindings,
            result: Box::new(result),
        }
    }
}

#[derive(Debug)]
pub struct At {
    ty: Type,
    index: Box<Expression>,
    input: Box<Expression>,
}

impl At {
    pub fn new(index: Expression, input: Expression) -> Self {
        let ty = match input.ty() {
            Type::Array(item, _) => *item,
            _ => Type::Value,
        };
        Self {
            ty,
            index: Box::new(index),
            input: Box::new(input),
        }
    }
}

#[derive(Debug)]
pub struct In {
    needle: Box<Expression>,
    haystack: Box<Expression>,
}

impl In {
    pub fn new(needle: Expression, haystack: Expression) -> Self {
        Self {
            needle: Box::new(needle),
            haystack: Box::new(haystack),
        }
    }
}

#[derive(Debug)]
pub struct Coalesce {
    ty: Type,
    args: Vec<Expression>,
}

impl Coalesce {
    pub fn new(ty: Type, args: Vec<Expression>) -> Self {
        Self { ty, args }
    }
}

#[derive(Debug)]
pub struct Case {
    ty: Type,
    branches: Vec<(Expression, Expression)>,
    otherwise: Box<Expression>,
}

impl Case {
    pub fn new(ty: Type, branches: Vec<(Expression, Expression)>, otherwise: Expression) -> Self {
        Self {
            ty,
            branches,
            otherwise: Box::new(otherwise),
        }
    }
}

/// The case table of a `match`. The key domain is homogeneous: either all
/// integers or all strings, fixed at parse time.
#[derive(Debug)]
pub enum MatchCases {
    Int(HashMap<i64, Expression>),
    Str(HashMap<String, Expression>),
}

#[derive(Debug)]
pub struct Match {
    ty: Type,
    input: Box<Expression>,
    cases: MatchCases,
    otherwise: Box<Expression>,
}

impl Match {
    pub fn new(ty: Type, input: Expression, cases: MatchCases, otherwise: Expression) -> Self {
        Self {
            ty,
            input: Box::new(input),
            cases,
            otherwise: Box::new(otherwise),
        }
    }
}

#[derive(Debug)]
pub struct ArrayAssertion {
    ty: Type,
    input: Box<Expression>,
}

impl ArrayAssertion {
    pub fn new(ty: Type, input: Expression) -> Self {
        Self {
            ty,
            input: Box::new(input),
        }
    }
}

impl Expression {
    /// The declared output type, decided at parse time.
    pub fn ty(&self) -> Type {
        match self {
            Expression::Literal(node) => node.ty.clone(),
            Expression::Var(node) => node.value.ty(),
            Expression::Let(node) => node.result.ty(),
            Expression::At(node) => node.ty.clone(),
            Expression::In(_) => Type::Boolean,
            Expression::Coalesce(node) => node.ty.clone(),
            Expression::Case(node) => node.ty.clone(),
            Expression::Match(node) => node.ty.clone(),
            Expression::ArrayAssertion(node) => node.ty.clone(),
            Expression::Curve(node) => node.ty(),
            Expression::Compound(node) => node.ty(),
        }
    }

    pub fn evaluate(&self, ctx: &EvaluationContext) -> EvaluationResult {
        match self {
            Expression::Literal(node) => Ok(node.value.clone()),
            Expression::Var(node) => node.value.evaluate(ctx),
            Expression::Let(node) => node.result.evaluate(ctx),
            Expression::At(node) => evaluate_at(node, ctx),
            Expression::In(node) => evaluate_in(node, ctx),
            Expression::Coalesce(node) => evaluate_coalesce(node, ctx),
            Expression::Case(node) => evaluate_case(node, ctx),
            Expression::Match(node) => evaluate_match(node, ctx),
            Expression::ArrayAssertion(node) => evaluate_array_assertion(node, ctx),
            Expression::Curve(node) => node.evaluate(ctx),
            Expression::Compound(node) => node.evaluate(ctx),
        }
    }

    /// Evaluates and converts the result to the statically expected host
    /// type, failing with the standard type-mismatch message.
    pub fn evaluate_as<T: FromExpressionValue>(
        &self,
        ctx: &EvaluationContext,
    ) -> Result<T, EvalError> {
        let value = self.evaluate(ctx)?;
        downcast(&value)
    }

    /// Pre-order traversal over this node and its descendants. A `var`
    /// reference does not descend into its binding; the owning `let` visits
    /// each binding once.
    pub fn visit(&self, f: &mut dyn FnMut(&Expression)) {
        f(self);
        match self {
            Expression::Literal(_) | Expression::Var(_) => {}
            Expression::Let(node) => {
                for binding in node.bindings.values() {
                    binding.visit(f);
                }
                node.result.visit(f);
            }
            Expression::At(node) => {
                node.index.visit(f);
                node.input.visit(f);
            }
            Expression::In(node) => {
                node.needle.visit(f);
                node.haystack.visit(f);
            }
            Expression::Coalesce(node) => {
                for arg in &node.args {
                    arg.visit(f);
                }
            }
            Expression::Case(node) => {
                for (condition, result) in &node.branches {
                    condition.visit(f);
                    result.visit(f);
                }
                node.otherwise.visit(f);
            }
            Expression::Match(node) => {
                node.input.visit(f);
                match &node.cases {
                    MatchCases::Int(cases) => {
                        for output in cases.values() {
                            output.visit(f);
                        }
                    }
                    MatchCases::Str(cases) => {
                        for output in cases.values() {
                            output.visit(f);
                        }
                    }
                }
                node.otherwise.visit(f);
            }
            Expression::ArrayAssertion(node) => node.input.visit(f),
            Expression::Curve(node) => {
                node.input().visit(f);
                for (_, output) in node.stops() {
                    output.visit(f);
                }
            }
            Expression::Compound(node) => {
                for arg in node.args() {
                    arg.visit(f);
                }
            }
        }
    }

    /// True iff no descendant reads the feature dimension of the context.
    pub fn is_feature_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Var(node) => node.value.is_feature_constant(),
            Expression::Let(node) => node.result.is_feature_constant(),
            Expression::At(node) => {
                node.index.is_feature_constant() && node.input.is_feature_constant()
            }
            Expression::In(node) => {
                node.needle.is_feature_constant() && node.haystack.is_feature_constant()
            }
            Expression::Coalesce(node) => node.args.iter().all(Expression::is_feature_constant),
            Expression::Case(node) => {
                node.branches
                    .iter()
                    .all(|(c, r)| c.is_feature_constant() && r.is_feature_constant())
                    && node.otherwise.is_feature_constant()
            }
            Expression::Match(node) => {
                node.input.is_feature_constant()
                    && node.otherwise.is_feature_constant()
                    && match &node.cases {
                        MatchCases::Int(cases) => {
                            cases.values().all(Expression::is_feature_constant)
                        }
                        MatchCases::Str(cases) => {
                            cases.values().all(Expression::is_feature_constant)
                        }
                    }
            }
            Expression::ArrayAssertion(node) => node.input.is_feature_constant(),
            Expression::Curve(node) => {
                node.input().is_feature_constant()
                    && node.stops().all(|(_, output)| output.is_feature_constant())
            }
            Expression::Compound(node) => {
                !node.reads_feature() && node.args().iter().all(Expression::is_feature_constant)
            }
        }
    }

    /// True iff no descendant reads the zoom dimension of the context.
    pub fn is_zoom_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Var(node) => node.value.is_zoom_constant(),
            Expression::Let(node) => node.result.is_zoom_constant(),
            Expression::At(node) => node.index.is_zoom_constant() && node.input.is_zoom_constant(),
            Expression::In(node) => {
                node.needle.is_zoom_constant() && node.haystack.is_zoom_constant()
            }
            Expression::Coalesce(node) => node.args.iter().all(Expression::is_zoom_constant),
            Expression::Case(node) => {
                node.branches
                    .iter()
                    .all(|(c, r)| c.is_zoom_constant() && r.is_zoom_constant())
                    && node.otherwise.is_zoom_constant()
            }
            Expression::Match(node) => {
                node.input.is_zoom_constant()
                    && node.otherwise.is_zoom_constant()
                    && match &node.cases {
                        MatchCases::Int(cases) => cases.values().all(Expression::is_zoom_constant),
                        MatchCases::Str(cases) => cases.values().all(Expression::is_zoom_constant),
                    }
            }
            Expression::ArrayAssertion(node) => node.input.is_zoom_constant(),
            Expression::Curve(node) => {
                node.input().is_zoom_constant()
                    && node.stops().all(|(_, output)| output.is_zoom_constant())
            }
            Expression::Compound(node) => {
                node.name() != "zoom" && node.args().iter().all(Expression::is_zoom_constant)
            }
        }
    }

    /// True iff this is a curve whose input is the `zoom` expression. The
    /// renderer uses this to hoist zoom dependence out of per-feature work.
    pub fn is_zoom_curve(&self) -> bool {
        match self {
            Expression::Curve(node) => match node.input() {
                Expression::Compound(compound) => compound.name() == "zoom",
                _ => false,
            },
            _ => false,
        }
    }
}

fn evaluate_at(node: &At, ctx: &EvaluationContext) -> EvaluationResult {
    let index_value = node.index.evaluate(ctx)?;
    let input_value = node.input.evaluate(ctx)?;

    let index: f64 = downcast(&index_value)?;
    let array: Vec<Value> = downcast(&input_value)?;

    if index < 0.0 || index >= array.len() as f64 {
        return Err(EvalError::new(format!(
            "Array index out of bounds: {} > {}.",
            stringify(&Value::Number(index)),
            array.len()
        )));
    }
    if index != index.floor() {
        return Err(EvalError::new(format!(
            "Array index must be an integer, but found {} instead.",
            stringify(&Value::Number(index))
        )));
    }
    Ok(array[index as usize].clone())
}

fn evaluate_in(node: &In, ctx: &EvaluationContext) -> EvaluationResult {
    let needle = node.needle.evaluate(ctx)?;
    let haystack: Vec<Value> = node.haystack.evaluate_as(ctx)?;

    let needle_type = type_of(&needle);
    if matches!(
        needle_type,
        Type::Object | Type::Color | Type::Array(_, _)
    ) {
        return Err(EvalError::new(format!(
            "\"contains\" does not support searching for values of type {}.",
            needle_type
        )));
    }

    Ok(Value::Bool(haystack.iter().any(|item| *item == needle)))
}

fn evaluate_coalesce(node: &Coalesce, ctx: &EvaluationContext) -> EvaluationResult {
    for (i, arg) in node.args.iter().enumerate() {
        let result = arg.evaluate(ctx);
        if result.is_err() && i + 1 != node.args.len() {
            continue;
        }
        return result;
    }
    Ok(Value::Null)
}

fn evaluate_case(node: &Case, ctx: &EvaluationContext) -> EvaluationResult {
    for (condition, result) in &node.branches {
        if condition.evaluate_as::<bool>(ctx)? {
            return result.evaluate(ctx);
        }
    }
    node.otherwise.evaluate(ctx)
}

fn evaluate_match(node: &Match, ctx: &EvaluationContext) -> EvaluationResult {
    match &node.cases {
        MatchCases::Str(cases) => {
            let input: String = node.input.evaluate_as(ctx)?;
            match cases.get(&input) {
                Some(output) => output.evaluate(ctx),
                None => node.otherwise.evaluate(ctx),
            }
        }
        MatchCases::Int(cases) => {
            let input: f64 = node.input.evaluate_as(ctx)?;
            // Only inputs equal to their floor can match an integer label.
            if input == input.floor() && input.abs() <= i64::MAX as f64 {
                if let Some(output) = cases.get(&(input as i64)) {
                    return output.evaluate(ctx);
                }
            }
            node.otherwise.evaluate(ctx)
        }
    }
}

fn evaluate_array_assertion(node: &ArrayAssertion, ctx: &EvaluationContext) -> EvaluationResult {
    let result = node.input.evaluate(ctx)?;
    let actual = type_of(&result);
    if check_subtype(&node.ty, &actual).is_some() {
        return Err(EvalError::new(format!(
            "Expected value to be of type {}, but found {} instead.",
            node.ty, actual
        )));
    }
    Ok(result)
}
