//! The narrow accessor interface through which expressions read feature
//! data, plus a JSON-backed implementation for hosts and tests.

use serde_json::{Map, Value as Json};

/// Geometry classification of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
    Point,
    LineString,
    Polygon,
    Unknown,
}

impl FeatureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FeatureKind::Point => "Point",
            FeatureKind::LineString => "LineString",
            FeatureKind::Polygon => "Polygon",
            FeatureKind::Unknown => "Unknown",
        }
    }
}

/// Read-only access to one feature during evaluation.
///
/// Property values and ids are host JSON values; they cross into the
/// expression domain through `to_expression_value`.
pub trait Feature {
    fn get(&self, key: &str) -> Option<Json>;
    fn id(&self) -> Option<Json>;
    fn properties(&self) -> Map<String, Json>;
    fn kind(&self) -> FeatureKind;
}

/// A feature backed by a GeoJSON-like document:
/// `{"geometry": {"type": ...}, "properties": {...}, "id": ...}`.
#[derive(Debug, Clone)]
pub struct JsonFeature {
    doc: Json,
}

impl JsonFeature {
    pub fn new(doc: Json) -> Self {
        Self { doc }
    }

    fn property_map(&self) -> Option<&Map<String, Json>> {
        self.doc.get("properties").and_then(Json::as_object)
    }
}

impl Feature for JsonFeature {
    fn get(&self, key: &str) -> Option<Json> {
        self.property_map().and_then(|map| map.get(key)).cloned()
    }

    fn id(&self) -> Option<Json> {
        self.doc.get("id").filter(|id| !id.is_null()).cloned()
    }

    fn properties(&self) -> Map<String, Json> {
        self.property_map().cloned().unwrap_or_default()
    }

    fn kind(&self) -> FeatureKind {
        let geometry_type = self
            .doc
            .get("geometry")
            .and_then(|g| g.get("type"))
            .and_then(Json::as_str);
        match geometry_type {
            Some("Point") => FeatureKind::Point,
            Some("LineString") => FeatureKind::LineString,
            Some("Polygon") => FeatureKind::Polygon,
            _ => FeatureKind::Unknown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_properties_id_and_kind() {
        let feature = JsonFeature::new(json!({
            "geometry": {"type": "LineString"},
            "properties": {"name": "river", "width": 3},
            "id": 7
        }));
        assert_eq!(feature.get("name"), Some(json!("river")));
        assert_eq!(feature.get("missing"), None);
        assert_eq!(feature.id(), Some(json!(7)));
        assert_eq!(feature.kind(), FeatureKind::LineString);
        assert_eq!(feature.properties().len(), 2);
    }

    #[test]
    fn missing_sections_read_as_empty() {
        let feature = JsonFeature::new(json!({}));
        assert_eq!(feature.get("x"), None);
        assert_eq!(feature.id(), None);
        assert_eq!(feature.kind(), FeatureKind::Unknown);
        assert!(feature.properties().is_empty());
    }
}
