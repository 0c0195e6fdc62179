//! End-to-end evaluation: parse a JSON document, evaluate it against a
//! context, and check the typed result or the exact error message.

use serde_json::{json, Value as Json};

use mapexpr::{
    check_subtype, parse_expression, stringify, type_of, Color, EvaluationContext, Expression,
    JsonFeature, Value,
};

fn parse(doc: Json) -> Expression {
    match parse_expression(&doc) {
        Ok(expression) => expression,
        Err(errors) => panic!("expression should parse, got {:?}", errors),
    }
}

fn eval(doc: Json) -> Result<Value, mapexpr::EvalError> {
    parse(doc).evaluate(&EvaluationContext::new())
}

fn eval_with_zoom(doc: Json, zoom: f64) -> Result<Value, mapexpr::EvalError> {
    parse(doc).evaluate(&EvaluationContext::new().with_zoom(zoom))
}

fn eval_with_feature(doc: Json, feature: &JsonFeature) -> Result<Value, mapexpr::EvalError> {
    parse(doc).evaluate(&EvaluationContext::new().with_feature(feature))
}

#[test]
fn varargs_addition() {
    assert_eq!(eval(json!(["+", 2, 3, 4])), Ok(Value::Number(9.0)));
}

#[test]
fn linear_zoom_curve() {
    let doc = json!(["curve", ["linear"], ["zoom"], 0, 10, 10, 30]);
    assert_eq!(eval_with_zoom(doc, 5.0), Ok(Value::Number(20.0)));
}

#[test]
fn match_on_feature_property() {
    let doc = json!(["match", ["get", "kind"], "a", 1, "b", 2, 0]);
    let b = JsonFeature::new(json!({"properties": {"kind": "b"}}));
    assert_eq!(eval_with_feature(doc.clone(), &b), Ok(Value::Number(2.0)));
    let c = JsonFeature::new(json!({"properties": {"kind": "c"}}));
    assert_eq!(eval_with_feature(doc, &c), Ok(Value::Number(0.0)));
}

#[test]
fn let_binds_and_var_references() {
    let doc = json!(["let", "x", 2, ["*", ["var", "x"], ["var", "x"]]]);
    assert_eq!(eval(doc), Ok(Value::Number(4.0)));
}

#[test]
fn coalesce_recovers_from_missing_property() {
    let doc = json!(["coalesce", ["get", "missing"], "fallback"]);
    let feature = JsonFeature::new(json!({"properties": {}}));
    assert_eq!(
        eval_with_feature(doc, &feature),
        Ok(Value::String("fallback".into()))
    );
}

#[test]
fn rgba_range_error_is_verbatim() {
    let err = eval(json!(["rgba", 300, 0, 0, 1])).unwrap_err();
    assert_eq!(
        err.message,
        "Invalid rgba value [300, 0, 0, 1]: 'r', 'g', and 'b' must be between 0 and 255."
    );
}

#[test]
fn rgba_normalizes_channels() {
    assert_eq!(
        eval(json!(["rgba", 255, 0, 0, 0.5])),
        Ok(Value::Color(Color::new(1.0, 0.0, 0.0, 0.5)))
    );
    assert_eq!(
        eval(json!(["rgb", 0, 255, 0])),
        Ok(Value::Color(Color::new(0.0, 1.0, 0.0, 1.0)))
    );
    let err = eval(json!(["rgba", 0, 0, 0, 2])).unwrap_err();
    assert_eq!(
        err.message,
        "Invalid rgba value [0, 0, 0, 2]: 'a' must be between 0 and 1."
    );
}

#[test]
fn type_soundness_holds_for_ok_results() {
    let feature = JsonFeature::new(json!({"properties": {"kind": "b", "n": 3}}));
    let docs = [
        json!(["+", 1, 2]),
        json!(["concat", "a", "b"]),
        json!(["curve", ["exponential", 2], ["zoom"], 0, 0, 10, 100]),
        json!(["match", ["get", "kind"], "a", 1, "b", 2, 0]),
        json!(["case", [">", ["number", ["get", "n"]], 2], "big", "small"]),
        json!(["rgba", 10, 20, 30, 1]),
        json!(["literal", [1, 2, 3]]),
        json!(["to_rgba", ["rgb", 0, 0, 0]]),
    ];
    for doc in docs {
        let expression = parse(doc);
        let ctx = EvaluationContext::new().with_zoom(3.0).with_feature(&feature);
        let value = expression.evaluate(&ctx).expect("should evaluate");
        assert_eq!(
            check_subtype(&expression.ty(), &type_of(&value)),
            None,
            "{:?} not a subtype of {:?}",
            type_of(&value),
            expression.ty()
        );
    }
}

#[test]
fn curve_clamps_outside_the_stop_range() {
    let doc = json!(["curve", ["linear"], ["zoom"], 2, 10, 6, 30]);
    assert_eq!(eval_with_zoom(doc.clone(), 0.0), Ok(Value::Number(10.0)));
    assert_eq!(eval_with_zoom(doc.clone(), 100.0), Ok(Value::Number(30.0)));
    // Exactly at a stop returns that stop's value.
    assert_eq!(eval_with_zoom(doc.clone(), 2.0), Ok(Value::Number(10.0)));
    assert_eq!(eval_with_zoom(doc, 6.0), Ok(Value::Number(30.0)));
}

#[test]
fn curve_with_one_stop_is_constant() {
    let doc = json!(["curve", ["linear"], ["zoom"], 5, 42]);
    assert_eq!(eval_with_zoom(doc.clone(), 0.0), Ok(Value::Number(42.0)));
    assert_eq!(eval_with_zoom(doc.clone(), 5.0), Ok(Value::Number(42.0)));
    assert_eq!(eval_with_zoom(doc, 22.0), Ok(Value::Number(42.0)));
}

#[test]
fn corner_cubic_bezier_curve_matches_linear() {
    let bezier = json!(["curve", ["cubic-bezier", 0, 0, 1, 1], ["zoom"], 0, 0, 10, 100]);
    let linear = json!(["curve", ["linear"], ["zoom"], 0, 0, 10, 100]);
    for zoom in [1.0, 2.5, 5.0, 7.75, 9.0] {
        let a = eval_with_zoom(bezier.clone(), zoom).unwrap().as_number().unwrap();
        let b = eval_with_zoom(linear.clone(), zoom).unwrap().as_number().unwrap();
        assert!((a - b).abs() < 1e-3, "zoom {}: {} vs {}", zoom, a, b);
    }
}

#[test]
fn step_curve_over_strings() {
    let doc = json!(["curve", ["step"], ["zoom"], 0, "low", 10, "high"]);
    assert_eq!(eval_with_zoom(doc.clone(), 5.0), Ok(Value::String("low".into())));
    assert_eq!(eval_with_zoom(doc, 15.0), Ok(Value::String("high".into())));
}

#[test]
fn color_curve_interpolates_componentwise() {
    let doc = json!([
        "curve", ["linear"], ["zoom"],
        0, ["rgba", 0, 0, 0, 0],
        10, ["rgba", 255, 0, 0, 1]
    ]);
    assert_eq!(
        eval_with_zoom(doc, 5.0),
        Ok(Value::Color(Color::new(0.5, 0.0, 0.0, 0.5)))
    );
}

#[test]
fn numeric_array_curve_interpolates_componentwise() {
    let doc = json!([
        "curve", ["linear"], ["zoom"],
        0, ["literal", [0, 10]],
        10, ["literal", [10, 30]]
    ]);
    assert_eq!(
        eval_with_zoom(doc, 5.0),
        Ok(Value::Array(vec![Value::Number(5.0), Value::Number(20.0)]))
    );
}

#[test]
fn zoom_errors_without_a_zoom_dimension() {
    let err = eval(json!(["zoom"])).unwrap_err();
    assert_eq!(
        err.message,
        "The 'zoom' expression is unavailable in the current evaluation context."
    );
}

#[test]
fn feature_accessors_error_without_a_feature() {
    for doc in [
        json!(["get", "x"]),
        json!(["has", "x"]),
        json!(["properties"]),
        json!(["geometry_type"]),
        json!(["id"]),
    ] {
        let err = eval(doc).unwrap_err();
        assert_eq!(
            err.message,
            "Feature data is unavailable in the current evaluation context."
        );
    }
}

#[test]
fn feature_accessors_read_the_feature() {
    let feature = JsonFeature::new(json!({
        "geometry": {"type": "Polygon"},
        "properties": {"name": "lake", "depth": 12},
        "id": "f-1"
    }));
    assert_eq!(
        eval_with_feature(json!(["get", "name"]), &feature),
        Ok(Value::String("lake".into()))
    );
    assert_eq!(
        eval_with_feature(json!(["has", "depth"]), &feature),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        eval_with_feature(json!(["has", "height"]), &feature),
        Ok(Value::Bool(false))
    );
    assert_eq!(
        eval_with_feature(json!(["geometry_type"]), &feature),
        Ok(Value::String("Polygon".into()))
    );
    assert_eq!(
        eval_with_feature(json!(["id"]), &feature),
        Ok(Value::String("f-1".into()))
    );
    let err = eval_with_feature(json!(["get", "nope"]), &feature).unwrap_err();
    assert_eq!(err.message, "Property 'nope' not found in feature.properties");
}

#[test]
fn get_and_has_read_explicit_objects() {
    let obj = json!(["literal", {"k": 7}]);
    assert_eq!(eval(json!(["get", "k", obj])), Ok(Value::Number(7.0)));
    let obj = json!(["literal", {"k": 7}]);
    assert_eq!(eval(json!(["has", "other", obj])), Ok(Value::Bool(false)));
    let obj = json!(["literal", {}]);
    let err = eval(json!(["get", "k", obj])).unwrap_err();
    assert_eq!(err.message, "Property 'k' not found in object");
}

#[test]
fn at_indexes_arrays() {
    let arr = json!(["literal", [10, 20, 30]]);
    assert_eq!(eval(json!(["at", 1, arr])), Ok(Value::Number(20.0)));

    // floor(-0.0) == -0.0 == 0, so negative zero indexes the first element.
    let arr = json!(["literal", [10, 20]]);
    assert_eq!(eval(json!(["at", -0.0, arr])), Ok(Value::Number(10.0)));

    let arr = json!(["literal", [10, 20]]);
    let err = eval(json!(["at", 1.5, arr])).unwrap_err();
    assert_eq!(
        err.message,
        "Array index must be an integer, but found 1.5 instead."
    );

    let arr = json!(["literal", [10, 20]]);
    let err = eval(json!(["at", 3, arr])).unwrap_err();
    assert_eq!(err.message, "Array index out of bounds: 3 > 2.");
}

#[test]
fn contains_compares_by_equality() {
    let haystack = json!(["literal", ["a", "b"]]);
    assert_eq!(eval(json!(["contains", "a", haystack])), Ok(Value::Bool(true)));
    let haystack = json!(["literal", ["a", "b"]]);
    assert_eq!(eval(json!(["contains", "z", haystack])), Ok(Value::Bool(false)));
}

#[test]
fn coalesce_absorption() {
    // A single argument is the identity.
    assert_eq!(eval(json!(["coalesce", 7])), Ok(Value::Number(7.0)));
    // A leading ok value short-circuits.
    assert_eq!(
        eval(json!(["coalesce", "first", "second"])),
        Ok(Value::String("first".into()))
    );
    // Errors in non-terminal arms are swallowed; the terminal arm's result
    // is returned as-is, error included.
    let err = eval(json!(["coalesce", ["zoom"], ["zoom"]])).unwrap_err();
    assert_eq!(
        err.message,
        "The 'zoom' expression is unavailable in the current evaluation context."
    );
}

#[test]
fn case_picks_the_first_true_branch() {
    let doc = json!(["case", false, "a", true, "b", "z"]);
    assert_eq!(eval(doc), Ok(Value::String("b".into())));
    let doc = json!(["case", false, "a", false, "b", "z"]);
    assert_eq!(eval(doc), Ok(Value::String("z".into())));
}

#[test]
fn integer_match_requires_floor_equality() {
    let feature = JsonFeature::new(json!({"properties": {"n": 1.5}}));
    let doc = json!(["match", ["number", ["get", "n"]], 1, "one", 2, "two", "other"]);
    assert_eq!(
        eval_with_feature(doc, &feature),
        Ok(Value::String("other".into()))
    );

    let feature = JsonFeature::new(json!({"properties": {"n": 2.0}}));
    let doc = json!(["match", ["number", ["get", "n"]], 1, "one", 2, "two", "other"]);
    assert_eq!(
        eval_with_feature(doc, &feature),
        Ok(Value::String("two".into()))
    );
}

#[test]
fn array_assertion_checks_at_runtime() {
    let doc = json!(["array", "number", 2, ["literal", [1, 2]]]);
    assert_eq!(
        eval(doc),
        Ok(Value::Array(vec![Value::Number(1.0), Value::Number(2.0)]))
    );

    let doc = json!(["array", "number", ["literal", ["a"]]]);
    let err = eval(doc).unwrap_err();
    assert_eq!(
        err.message,
        "Expected value to be of type Array<Number>, but found Array<String, 1> instead."
    );
}

#[test]
fn assertions_narrow_or_fail() {
    let feature = JsonFeature::new(json!({"properties": {"s": "x", "n": 4}}));
    assert_eq!(
        eval_with_feature(json!(["number", ["get", "n"]]), &feature),
        Ok(Value::Number(4.0))
    );
    let err = eval_with_feature(json!(["number", ["get", "s"]]), &feature).unwrap_err();
    assert_eq!(
        err.message,
        "Expected value to be of type Number, but found String instead."
    );
}

#[test]
fn conversions() {
    assert_eq!(eval(json!(["to_string", 1])), Ok(Value::String("1".into())));
    assert_eq!(
        eval(json!(["to_string", ["literal", [1, true]]])),
        Ok(Value::String("[1,true]".into()))
    );
    assert_eq!(eval(json!(["to_number", "3.5"])), Ok(Value::Number(3.5)));
    let err = eval(json!(["to_number", "abc"])).unwrap_err();
    assert_eq!(err.message, "Could not convert \"abc\" to number.");
    assert_eq!(eval(json!(["to_boolean", 0])), Ok(Value::Bool(false)));
    assert_eq!(eval(json!(["to_boolean", ""])), Ok(Value::Bool(false)));
    assert_eq!(eval(json!(["to_boolean", "x"])), Ok(Value::Bool(true)));
    assert_eq!(eval(json!(["to_boolean", null])), Ok(Value::Bool(false)));
    assert_eq!(
        eval(json!(["to_rgba", ["rgb", 255, 0, 0]])),
        Ok(Value::Array(vec![
            Value::Number(1.0),
            Value::Number(0.0),
            Value::Number(0.0),
            Value::Number(1.0)
        ]))
    );
    assert_eq!(
        eval(json!(["parse_color", "#ff0000"])),
        Ok(Value::Color(Color::new(1.0, 0.0, 0.0, 1.0)))
    );
    let err = eval(json!(["parse_color", "nope"])).unwrap_err();
    assert_eq!(err.message, "Could not parse color from value 'nope'");
}

#[test]
fn string_operations() {
    assert_eq!(eval(json!(["upcase", "abc"])), Ok(Value::String("ABC".into())));
    assert_eq!(eval(json!(["downcase", "AbC"])), Ok(Value::String("abc".into())));
    assert_eq!(
        eval(json!(["concat", "a", "b", "c"])),
        Ok(Value::String("abc".into()))
    );
    assert_eq!(eval(json!(["length", "abcd"])), Ok(Value::Number(4.0)));
    assert_eq!(
        eval(json!(["length", ["literal", [1, 2, 3]]])),
        Ok(Value::Number(3.0))
    );
}

#[test]
fn comparisons_and_logic() {
    assert_eq!(eval(json!(["==", 1, 1])), Ok(Value::Bool(true)));
    assert_eq!(eval(json!(["!=", "a", "b"])), Ok(Value::Bool(true)));
    assert_eq!(eval(json!(["==", null, null])), Ok(Value::Bool(true)));
    assert_eq!(eval(json!(["<", 1, 2])), Ok(Value::Bool(true)));
    assert_eq!(eval(json!([">=", 2, 2])), Ok(Value::Bool(true)));
    assert_eq!(eval(json!(["||", false, false, true])), Ok(Value::Bool(true)));
    assert_eq!(eval(json!(["&&", true, false])), Ok(Value::Bool(false)));
    assert_eq!(eval(json!(["!", false])), Ok(Value::Bool(true)));
}

#[test]
fn typeof_reports_the_runtime_type() {
    assert_eq!(eval(json!(["typeof", "x"])), Ok(Value::String("String".into())));
    assert_eq!(
        eval(json!(["typeof", ["literal", [1, 2]]])),
        Ok(Value::String("Array<Number, 2>".into()))
    );
}

#[test]
fn arithmetic_builtins() {
    assert_eq!(eval(json!(["-", 5, 2])), Ok(Value::Number(3.0)));
    assert_eq!(eval(json!(["*", 2, 3, 4])), Ok(Value::Number(24.0)));
    assert_eq!(eval(json!(["/", 7, 2])), Ok(Value::Number(3.5)));
    assert_eq!(eval(json!(["%", 7, 4])), Ok(Value::Number(3.0)));
    assert_eq!(eval(json!(["^", 2, 10])), Ok(Value::Number(1024.0)));
    assert_eq!(eval(json!(["min", 3, 1, 4])), Ok(Value::Number(1.0)));
    assert_eq!(eval(json!(["max", 3, 1, 4])), Ok(Value::Number(4.0)));
    assert_eq!(eval(json!(["log2", 8])), Ok(Value::Number(3.0)));
}

#[test]
fn constancy_flags() {
    assert!(parse(json!(["+", 1, 2])).is_feature_constant());
    assert!(parse(json!(["+", 1, 2])).is_zoom_constant());

    let zoomful = parse(json!(["curve", ["linear"], ["zoom"], 0, 0, 10, 10]));
    assert!(!zoomful.is_zoom_constant());
    assert!(zoomful.is_feature_constant());

    let featureful = parse(json!(["get", "x"]));
    assert!(!featureful.is_feature_constant());
    assert!(featureful.is_zoom_constant());

    // The object overload of get reads no feature data.
    let object_get = parse(json!(["get", "x", ["literal", {"x": 1}]]));
    assert!(object_get.is_feature_constant());

    // Constancy propagates through let bindings referenced by var.
    let let_doc = parse(json!(["let", "z", ["zoom"], ["var", "z"]]));
    assert!(!let_doc.is_zoom_constant());
}

#[test]
fn zoom_curve_detection() {
    assert!(parse(json!(["curve", ["linear"], ["zoom"], 0, 0, 10, 10])).is_zoom_curve());
    assert!(!parse(json!(["curve", ["linear"], ["number", ["get", "n"]], 0, 0, 10, 10]))
        .is_zoom_curve());
    assert!(!parse(json!(["zoom"])).is_zoom_curve());
}

#[test]
fn visit_is_preorder_over_all_descendants() {
    let expression = parse(json!(["case", true, ["+", 1, 2], 9]));
    let mut count = 0;
    expression.visit(&mut |_| count += 1);
    // case, condition, +, two literal args, otherwise.
    assert_eq!(count, 6);
}

#[test]
fn literal_round_trip() {
    for doc in [
        json!(17),
        json!(-2.5),
        json!("text"),
        json!(true),
        json!(null),
        json!(["literal", [1, 2, 3]]),
        json!(["literal", {"a": [false, "b"]}]),
    ] {
        let value = eval(doc).expect("literal should evaluate");
        let round_tripped: Json =
            serde_json::from_str(&stringify(&value)).expect("stringified form is JSON");
        let doc = if round_tripped.is_array() || round_tripped.is_object() {
            json!(["literal", round_tripped])
        } else {
            round_tripped
        };
        assert_eq!(eval(doc), Ok(value));
    }
}

#[test]
fn max_safe_integer_boundary() {
    assert_eq!(
        eval(json!(9007199254740991i64)),
        Ok(Value::Number(9007199254740991.0))
    );
    let errors = parse_expression(&json!(9007199254740992i64)).unwrap_err();
    assert_eq!(
        errors[0].message,
        "Numeric values must be no larger than 9007199254740991."
    );
}

#[test]
fn constant_builtins() {
    assert_eq!(eval(json!(["pi"])), Ok(Value::Number(std::f64::consts::PI)));
    assert_eq!(eval(json!(["e"])), Ok(Value::Number(std::f64::consts::E)));
    assert_eq!(eval(json!(["ln2"])), Ok(Value::Number(std::f64::consts::LN_2)));
}

#[test]
fn nested_let_scopes_shadow_outer_bindings() {
    let doc = json!([
        "let", "x", 1,
        ["let", "x", 2, ["var", "x"]]
    ]);
    assert_eq!(eval(doc), Ok(Value::Number(2.0)));

    let doc = json!([
        "let", "x", 1, "y", 10,
        ["let", "x", 2, ["+", ["var", "x"], ["var", "y"]]]
    ]);
    assert_eq!(eval(doc), Ok(Value::Number(12.0)));
}
