// Accessors for the evaluation context: zoom, feature properties, feature
// id, and geometry classification. `has` and `get` each carry a second
// overload that reads from an explicit object argument instead of the
// feature.

use crate::builtins::missing_feature;
use crate::error::EvalError;
use crate::expr::downcast;
use crate::registry::{sig, EvalFn, Registry};
use crate::types::Type;
use crate::value::{to_expression_value, ObjectMap, Value};

/// The current zoom level.
///
/// Usage: ["zoom"]
///
///   Returns: Number
///
/// Note: Errors when the evaluation context carries no zoom.
pub const ZOOM: EvalFn = |ctx, _| {
    ctx.zoom.map(Value::Number).ok_or_else(|| {
        EvalError::new("The 'zoom' expression is unavailable in the current evaluation context.")
    })
};

/// Whether the feature has a property.
///
/// Usage: ["has", <key>]
///   - <key>: String
///
///   Returns: Boolean
///
/// Example:
///   ["has", "depth"] ; => true
pub const HAS_FEATURE: EvalFn = |ctx, args| {
    let key: String = downcast(&args[0])?;
    let feature = ctx.feature.ok_or_else(missing_feature)?;
    Ok(Value::Bool(feature.get(&key).is_some()))
};

/// Whether an object has a key.
///
/// Usage: ["has", <key>, <object>]
///   - <key>: String
///   - <object>: Object
///
///   Returns: Boolean
pub const HAS_OBJECT: EvalFn = |_, args| {
    let key: String = downcast(&args[0])?;
    let object: ObjectMap = downcast(&args[1])?;
    Ok(Value::Bool(object.contains_key(&key)))
};

/// A property of the feature.
///
/// Usage: ["get", <key>]
///   - <key>: String
///
///   Returns: the property value
///
/// Example:
///   ["get", "name"] ; => "lake"
///
/// Note: Errors when the feature has no such property.
pub const GET_FEATURE: EvalFn = |ctx, args| {
    let key: String = downcast(&args[0])?;
    let feature = ctx.feature.ok_or_else(missing_feature)?;
    let property = feature.get(&key).ok_or_else(|| {
        EvalError::new(format!("Property '{}' not found in feature.properties", key))
    })?;
    Ok(to_expression_value(&property))
};

/// A member of an explicit object.
///
/// Usage: ["get", <key>, <object>]
///   - <key>: String
///   - <object>: Object
///
///   Returns: the member value
///
/// Note: Errors when the object has no such key.
pub const GET_OBJECT: EvalFn = |_, args| {
    let key: String = downcast(&args[0])?;
    let object: ObjectMap = downcast(&args[1])?;
    object
        .get(&key)
        .cloned()
        .ok_or_else(|| EvalError::new(format!("Property '{}' not found in object", key)))
};

/// The feature's full property map.
///
/// Usage: ["properties"]
///
///   Returns: Object
pub const PROPERTIES: EvalFn = |ctx, _| {
    let feature = ctx.feature.ok_or_else(missing_feature)?;
    let result: ObjectMap = feature
        .properties()
        .iter()
        .map(|(key, value)| (key.clone(), to_expression_value(value)))
        .collect();
    Ok(Value::Object(result))
};

/// The feature's geometry classification.
///
/// Usage: ["geometry_type"]
///
///   Returns: String ("Point", "LineString", "Polygon", or "Unknown")
pub const GEOMETRY_TYPE: EvalFn = |ctx, _| {
    let feature = ctx.feature.ok_or_else(missing_feature)?;
    Ok(Value::String(feature.kind().as_str().to_string()))
};

/// The feature's id.
///
/// Usage: ["id"]
///
///   Returns: the id value (string or number)
///
/// Note: Errors when the feature carries no id.
pub const ID: EvalFn = |ctx, _| {
    let feature = ctx.feature.ok_or_else(missing_feature)?;
    let id = feature
        .id()
        .ok_or_else(|| EvalError::new("Property 'id' not found in feature"))?;
    Ok(to_expression_value(&id))
};

/// Registers the context accessor builtins with the given registry.
pub fn register_feature(registry: &mut Registry) {
    registry.register("zoom", vec![sig(Type::Number, vec![], ZOOM)]);

    registry.register(
        "has",
        vec![
            sig(Type::Boolean, vec![Type::String], HAS_FEATURE),
            sig(Type::Boolean, vec![Type::String, Type::Object], HAS_OBJECT),
        ],
    );
    registry.register(
        "get",
        vec![
            sig(Type::Value, vec![Type::String], GET_FEATURE),
            sig(Type::Value, vec![Type::String, Type::Object], GET_OBJECT),
        ],
    );

    registry.register("properties", vec![sig(Type::Object, vec![], PROPERTIES)]);
    registry.register("geometry_type", vec![sig(Type::String, vec![], GEOMETRY_TYPE)]);
    registry.register("id", vec![sig(Type::Value, vec![], ID)]);
}
