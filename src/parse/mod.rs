//! Parsing: JSON value trees into typed expression trees.
//!
//! The driver dispatches on the head symbol of each array form; everything
//! else is a literal. Each parser threads a `ParsingContext` carrying the
//! structural key path, the shared error buffer, the expected output type,
//! and the lexical scope chain for `let`/`var`. Parsing never panics:
//! failure is an empty result with a non-empty error buffer.

mod curve;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::error::ParsingError;
use crate::expr::{
    ArrayAssertion, At, Case, Coalesce, Expression, In, Let, Literal, Match, MatchCases, Var,
};
use crate::registry::{self, Params, Registry};
use crate::types::{check_subtype, Type};
use crate::value::{ObjectMap, Value};

/// One frame of the lexical scope chain used to resolve `var` references at
/// parse time. Frames are immutable and shared by reference; the chain does
/// not outlive the parse.
struct Scope {
    bindings: BTreeMap<String, Arc<Expression>>,
    parent: Option<Rc<Scope>>,
}

impl Scope {
    fn get(&self, name: &str) -> Option<Arc<Expression>> {
        self.bindings.get(name).cloned().or_else(|| {
            self.parent.as_ref().and_then(|parent| parent.get(name))
        })
    }
}

pub struct ParsingContext<'a> {
    key: String,
    expected: Option<Type>,
    scope: Option<Rc<Scope>>,
    errors: &'a RefCell<Vec<ParsingError>>,
}

impl<'a> ParsingContext<'a> {
    fn root(errors: &'a RefCell<Vec<ParsingError>>, expected: Option<Type>) -> Self {
        Self {
            key: String::new(),
            expected,
            scope: None,
            errors,
        }
    }

    pub(crate) fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn expected(&self) -> Option<&Type> {
        self.expected.as_ref()
    }

    pub(crate) fn error(&self, message: impl Into<String>) {
        self.errors
            .borrow_mut()
            .push(ParsingError::new(message, self.key.clone()));
    }

    pub(crate) fn error_at(&self, message: impl Into<String>, child: usize) {
        self.errors
            .borrow_mut()
            .push(ParsingError::new(message, format!("{}[{}]", self.key, child)));
    }

    pub(crate) fn extend_errors(&self, errors: Vec<ParsingError>) {
        self.errors.borrow_mut().extend(errors);
    }

    /// A context for child index `index`, appending `[index]` to the key.
    pub(crate) fn child(&self, index: usize, expected: Option<Type>) -> ParsingContext<'a> {
        ParsingContext {
            key: format!("{}[{}]", self.key, index),
            expected,
            scope: self.scope.clone(),
            errors: self.errors,
        }
    }

    /// A child context that additionally opens a new scope frame.
    fn child_with_bindings(
        &self,
        index: usize,
        expected: Option<Type>,
        bindings: BTreeMap<String, Arc<Expression>>,
    ) -> ParsingContext<'a> {
        ParsingContext {
            key: format!("{}[{}]", self.key, index),
            expected,
            scope: Some(Rc::new(Scope {
                bindings,
                parent: self.scope.clone(),
            })),
            errors: self.errors,
        }
    }

    fn get_binding(&self, name: &str) -> Option<Arc<Expression>> {
        self.scope.as_ref().and_then(|scope| scope.get(name))
    }
}

/// Parses a complete expression document.
pub fn parse_expression(value: &Json) -> Result<Expression, Vec<ParsingError>> {
    parse_root(value, None)
}

/// Parses a complete expression document that must produce `expected`.
pub fn parse_expression_expecting(
    value: &Json,
    expected: Type,
) -> Result<Expression, Vec<ParsingError>> {
    parse_root(value, Some(expected))
}

fn parse_root(value: &Json, expected: Option<Type>) -> Result<Expression, Vec<ParsingError>> {
    let errors = RefCell::new(Vec::new());
    let ctx = ParsingContext::root(&errors, expected);
    let parsed = parse(value, &ctx);
    let errors = errors.into_inner();
    match parsed {
        Some(expression) if errors.is_empty() => Ok(expression),
        _ => Err(errors),
    }
}

pub(crate) fn parse(value: &Json, ctx: &ParsingContext) -> Option<Expression> {
    let parsed = parse_untyped(value, ctx)?;

    if let Some(expected) = ctx.expected() {
        if let Some(message) = check_subtype(expected, &parsed.ty()) {
            ctx.error(message);
            return None;
        }
    }

    Some(parsed)
}

fn parse_untyped(value: &Json, ctx: &ParsingContext) -> Option<Expression> {
    match value {
        Json::Array(items) => {
            if items.is_empty() {
                ctx.error(
                    r#"Expected an array with at least one element. If you wanted a literal array, use ["literal", []]."#,
                );
                return None;
            }
            let Some(op) = items[0].as_str() else {
                ctx.error_at(
                    format!(
                        r#"Expression name must be a string, but found {} instead. If you wanted a literal array, use ["literal", [...]]."#,
                        json_type(&items[0])
                    ),
                    0,
                );
                return None;
            };
            match op {
                "literal" => {
                    if items.len() != 2 {
                        ctx.error(format!(
                            "'literal' expression requires exactly one argument, but found {} instead.",
                            items.len() - 1
                        ));
                        return None;
                    }
                    parse_literal(&items[1], ctx)
                }
                "match" => parse_match(items, ctx),
                "curve" => curve::parse_curve(items, ctx),
                "coalesce" => parse_coalesce(items, ctx),
                "case" => parse_case(items, ctx),
                "array" => parse_array_assertion(items, ctx),
                "let" => parse_let(items, ctx),
                "var" => parse_var(items, ctx),
                "at" => parse_at(items, ctx),
                "contains" => parse_contains(items, ctx),
                _ => parse_compound(op, items, ctx),
            }
        }
        Json::Object(_) => {
            ctx.error(r#"Bare objects invalid. Use ["literal", {...}] instead."#);
            None
        }
        _ => parse_literal(value, ctx),
    }
}

/// The JSON type name of a value, for diagnostics.
fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
        Json::String(_) => "string",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
    }
}

/// A JSON number as an `f64`, preserving the exactness of u64/i64 inputs up
/// to the conversion itself.
pub(crate) fn json_number(n: &serde_json::Number) -> f64 {
    if let Some(u) = n.as_u64() {
        u as f64
    } else if let Some(i) = n.as_i64() {
        i as f64
    } else {
        n.as_f64().unwrap_or(f64::NAN)
    }
}

fn parse_literal(value: &Json, ctx: &ParsingContext) -> Option<Expression> {
    let parsed = parse_literal_value(value, ctx)?;

    // Special case: a zero-length array literal takes the item type the
    // context expects, since its own item type is unknowable.
    if let Some(expected @ Type::Array(_, expected_n)) = ctx.expected() {
        if let Value::Array(items) = &parsed {
            if items.is_empty() && expected_n.map_or(true, |n| n == 0) {
                return Some(Expression::Literal(Literal::typed(expected.clone(), parsed)));
            }
        }
    }

    Some(Expression::Literal(Literal::new(parsed)))
}

fn parse_literal_value(value: &Json, ctx: &ParsingContext) -> Option<Value> {
    match value {
        Json::Null => Some(Value::Null),
        Json::Bool(b) => Some(Value::Bool(*b)),
        Json::String(s) => Some(Value::String(s.clone())),
        Json::Number(n) => {
            let x = json_number(n);
            if !Value::is_safe_numeric(x) {
                ctx.error("Numeric values must be no larger than 9007199254740991.");
                None
            } else {
                Some(Value::Number(x))
            }
        }
        Json::Array(items) => items
            .iter()
            .map(|item| parse_literal_value(item, ctx))
            .collect::<Option<Vec<Value>>>()
            .map(Value::Array),
        Json::Object(map) => {
            let mut result = ObjectMap::new();
            for (key, member) in map {
                result.insert(key.clone(), parse_literal_value(member, ctx)?);
            }
            Some(Value::Object(result))
        }
    }
}

fn parse_let(items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    let length = items.len();
    if length < 4 {
        ctx.error(format!(
            "Expected at least 3 arguments, but found {} instead.",
            length - 1
        ));
        return None;
    }

    let mut bindings: BTreeMap<String, Arc<Expression>> = BTreeMap::new();
    let mut i = 1;
    while i < length - 1 {
        let Some(name) = items[i].as_str() else {
            ctx.error_at(
                format!("Expected string, but found {} instead.", json_type(&items[i])),
                i,
            );
            return None;
        };

        let binding_value = parse(&items[i + 1], &ctx.child(i + 1, None))?;
        bindings
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(binding_value));
        i += 2;
    }

    let result_ctx =
        ctx.child_with_bindings(length - 1, ctx.expected.clone(), bindings.clone());
    let result = parse(&items[length - 1], &result_ctx)?;

    Some(Expression::Let(Let::new(bindings, result)))
}

fn parse_var(items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    let name = match items {
        [_, Json::String(name)] => name,
        _ => {
            ctx.error("'var' expression requires exactly one string literal argument.");
            return None;
        }
    };

    let Some(binding) = ctx.get_binding(name) else {
        ctx.error_at(
            format!(
                "Unknown variable \"{name}\". Make sure \"{name}\" has been bound in an enclosing \"let\" expression before using it."
            ),
            1,
        );
        return None;
    };

    Some(Expression::Var(Var::new(name.clone(), binding)))
}

fn parse_at(items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    if items.len() != 3 {
        ctx.error(format!(
            "Expected 2 arguments, but found {} instead.",
            items.len() - 1
        ));
        return None;
    }

    let index = parse(&items[1], &ctx.child(1, Some(Type::Number)));
    let item_type = ctx.expected.clone().unwrap_or(Type::Value);
    let input = parse(&items[2], &ctx.child(2, Some(Type::array(item_type))));

    match (index, input) {
        (Some(index), Some(input)) => Some(Expression::At(At::new(index, input))),
        _ => None,
    }
}

fn parse_contains(items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    if items.len() != 3 {
        ctx.error(format!(
            "Expected 2 arguments, but found {} instead.",
            items.len() - 1
        ));
        return None;
    }

    let haystack = parse(&items[2], &ctx.child(2, Some(Type::array(Type::Value))))?;

    let item_type = match haystack.ty() {
        Type::Array(item, _) => *item,
        _ => Type::Value,
    };
    let needle = parse(&items[1], &ctx.child(1, Some(item_type)))?;

    let needle_type = needle.ty();
    if matches!(needle_type, Type::Object | Type::Color | Type::Array(_, _)) {
        ctx.error(format!(
            "\"contains\" does not support searching for values of type {}.",
            needle_type
        ));
        return None;
    }

    Some(Expression::In(In::new(needle, haystack)))
}

fn parse_coalesce(items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    let length = items.len();
    if length < 2 {
        ctx.error("Expected at least one argument.");
        return None;
    }

    let mut output_type = ctx.expected.clone();
    let mut args = Vec::with_capacity(length - 1);
    for (i, item) in items.iter().enumerate().skip(1) {
        let parsed = parse(item, &ctx.child(i, output_type.clone()))?;
        if output_type.is_none() {
            output_type = Some(parsed.ty());
        }
        args.push(parsed);
    }

    let output_type = output_type?;
    Some(Expression::Coalesce(Coalesce::new(output_type, args)))
}

fn parse_case(items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    let length = items.len();
    if length < 4 {
        ctx.error(format!(
            "Expected at least 3 arguments, but found only {}.",
            length - 1
        ));
        return None;
    }
    if length % 2 != 0 {
        ctx.error("Expected an odd number of arguments.");
        return None;
    }

    let mut output_type = ctx.expected.clone();
    let mut branches = Vec::new();
    let mut i = 1;
    while i < length - 1 {
        let condition = parse(&items[i], &ctx.child(i, Some(Type::Boolean)))?;
        let result = parse(&items[i + 1], &ctx.child(i + 1, output_type.clone()))?;
        if output_type.is_none() {
            output_type = Some(result.ty());
        }
        branches.push((condition, result));
        i += 2;
    }

    let otherwise = parse(&items[length - 1], &ctx.child(length - 1, output_type.clone()))?;

    let output_type = output_type?;
    Some(Expression::Case(Case::new(output_type, branches, otherwise)))
}

enum MatchLabel {
    Int(i64),
    Str(String),
}

fn parse_match(items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    let length = items.len();
    if length < 5 {
        ctx.error(format!(
            "Expected at least 4 arguments, but found only {}.",
            length - 1
        ));
        return None;
    }
    if length % 2 != 1 {
        ctx.error("Expected an even number of arguments.");
        return None;
    }

    let mut label_type: Option<Type> = None;
    let mut output_type = ctx.expected.clone();
    let mut int_cases: std::collections::HashMap<i64, Expression> = Default::default();
    let mut str_cases: std::collections::HashMap<String, Expression> = Default::default();

    let mut i = 2;
    while i < length - 1 {
        let label = match &items[i] {
            Json::String(s) => MatchLabel::Str(s.clone()),
            Json::Number(n) => {
                let x = json_number(n);
                if x != x.floor() || !Value::is_safe_numeric(x) {
                    ctx.error_at("Numeric branch labels must be integer values.", i);
                    return None;
                }
                MatchLabel::Int(x as i64)
            }
            _ => {
                ctx.error_at("Branch labels must be numbers or strings.", i);
                return None;
            }
        };

        // The label domain must be homogeneous; the first label fixes it.
        let this_type = match &label {
            MatchLabel::Int(_) => Type::Number,
            MatchLabel::Str(_) => Type::String,
        };
        match &label_type {
            None => label_type = Some(this_type),
            Some(previous) if *previous == this_type => {}
            Some(previous) => {
                ctx.error_at(
                    format!("Expected {} but found {} instead.", previous, this_type),
                    i,
                );
                return None;
            }
        }

        let output = parse(&items[i + 1], &ctx.child(i + 1, output_type.clone()))?;
        if output_type.is_none() {
            output_type = Some(output.ty());
        }

        let duplicate = match label {
            MatchLabel::Int(key) => int_cases.insert(key, output).is_some(),
            MatchLabel::Str(key) => str_cases.insert(key, output).is_some(),
        };
        if duplicate {
            ctx.error_at("Branch labels must be unique.", i);
            return None;
        }

        i += 2;
    }

    let label_type = label_type?;

    // The input may also be `Value`-typed (e.g. a bare `get`); the typed
    // evaluation at runtime enforces the label type then.
    let input = parse(&items[1], &ctx.child(1, None))?;
    let input_type = input.ty();
    if input_type != Type::Value && check_subtype(&label_type, &input_type).is_some() {
        ctx.error_at(
            format!("Expected {} but found {} instead.", label_type, input_type),
            1,
        );
        return None;
    }

    let otherwise = parse(&items[length - 1], &ctx.child(length - 1, output_type.clone()))?;

    let cases = match label_type {
        Type::Number => MatchCases::Int(int_cases),
        _ => MatchCases::Str(str_cases),
    };

    let output_type = output_type?;
    Some(Expression::Match(Match::new(
        output_type,
        input,
        cases,
        otherwise,
    )))
}

fn parse_array_assertion(items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    let length = items.len();
    if !(2..=4).contains(&length) {
        ctx.error(format!(
            "Expected 1, 2, or 3 arguments, but found {} instead.",
            length - 1
        ));
        return None;
    }

    let mut item_type = Type::Value;
    let mut item_count = None;

    if length > 2 {
        item_type = match items[1].as_str() {
            Some("string") => Type::String,
            Some("number") => Type::Number,
            Some("boolean") => Type::Boolean,
            _ => {
                ctx.error_at(
                    "The item type argument of \"array\" must be one of string, number, boolean",
                    1,
                );
                return None;
            }
        };
    }

    if length > 3 {
        match items[2].as_u64() {
            Some(n) => item_count = Some(n as usize),
            None => {
                ctx.error_at(
                    "The length argument to \"array\" must be a positive integer literal",
                    2,
                );
                return None;
            }
        }
    }

    let input = parse(&items[length - 1], &ctx.child(length - 1, Some(Type::Value)))?;

    Some(Expression::ArrayAssertion(ArrayAssertion::new(
        Type::Array(Box::new(item_type), item_count),
        input,
    )))
}

fn parse_compound(name: &str, items: &[Json], ctx: &ParsingContext) -> Option<Expression> {
    let registry: &'static Registry = Registry::global();
    let Some(definition) = registry.get(name) else {
        ctx.error_at(
            format!(
                r#"Unknown expression "{}". If you wanted a literal array, use ["literal", [...]]."#,
                name
            ),
            0,
        );
        return None;
    };

    // Sub-expressions get an expected type hint only when the definition is
    // unambiguous.
    let mut args = Vec::with_capacity(items.len() - 1);
    for (i, item) in items.iter().enumerate().skip(1) {
        let expected = if definition.len() == 1 {
            match &definition[0].params {
                Params::Varargs(item_type) => Some(item_type.clone()),
                Params::Fixed(params) => params.get(i - 1).cloned(),
            }
        } else {
            None
        };
        let parsed = parse(item, &ctx.child(i, expected))?;
        args.push(parsed);
    }

    registry::create(name, definition, args, ctx)
}
