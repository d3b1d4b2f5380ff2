use crate::TemplateError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use stencil_types::{Position, Rect};

fn default_opacity() -> f64 {
    1.0
}

fn is_zero(v: &f64) -> bool {
    *v == 0.0
}

fn is_one(v: &f64) -> bool {
    *v == 1.0
}

fn is_false(v: &bool) -> bool {
    !*v
}

/// Which data rows a table instance renders. `end` is exclusive; `None` means
/// "to the last row".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BodyRange {
    #[serde(default)]
    pub start: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
}

impl BodyRange {
    pub fn new(start: usize, end: Option<usize>) -> Self {
        Self { start, end }
    }

    /// Clamps the range against a row count and returns it as a slice range.
    pub fn resolve(&self, len: usize) -> std::ops::Range<usize> {
        let end = self.end.unwrap_or(len).min(len);
        let start = self.start.min(end);
        start..end
    }
}

/// One placed field on one template page.
///
/// Geometry is in millimetres with a top-left origin. Everything that is not a
/// common field lands in `props` and is read by the owning plugin through
/// [`Schema::props_as`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub rotate: f64,
    #[serde(default = "default_opacity", skip_serializing_if = "is_one")]
    pub opacity: f64,
    /// Explicit override; when absent the plugin's default schema decides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub read_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, alias = "__bodyRange", skip_serializing_if = "Option::is_none")]
    pub body_range: Option<BodyRange>,
    /// Set on the continuation instances of a split table.
    #[serde(default, alias = "__isSplit", skip_serializing_if = "is_false")]
    pub is_split: bool,
    #[serde(flatten)]
    pub props: Map<String, Value>,
}

impl Schema {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            position: Position::default(),
            width: 0.0,
            height: 0.0,
            rotate: 0.0,
            opacity: 1.0,
            required: None,
            read_only: false,
            content: None,
            body_range: None,
            is_split: false,
            props: Map::new(),
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_prop(mut self, key: &str, value: Value) -> Self {
        self.props.insert(key.to_string(), value);
        self
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.position.x, self.position.y, self.width, self.height)
    }

    /// Deserializes the type-specific properties into a plugin's typed struct.
    pub fn props_as<T: DeserializeOwned>(&self) -> Result<T, TemplateError> {
        serde_json::from_value(Value::Object(self.props.clone())).map_err(|e| {
            TemplateError::InvalidProps {
                name: self.name.clone(),
                message: e.to_string(),
            }
        })
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    pub fn prop_bool(&self, key: &str) -> Option<bool> {
        self.props.get(key).and_then(Value::as_bool)
    }

    /// Fills every property missing from `self` with the value from `defaults`.
    /// Common fields are never touched.
    pub fn merged_with_defaults(&self, defaults: &Schema) -> Schema {
        let mut merged = self.clone();
        for (key, value) in &defaults.props {
            merged
                .props
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        if merged.required.is_none() {
            merged.required = defaults.required;
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_common_fields_and_props() {
        let schema: Schema = serde_json::from_value(json!({
            "name": "items",
            "type": "table",
            "position": { "x": 10, "y": 20.5 },
            "width": 150,
            "height": 40,
            "showHead": true,
            "__bodyRange": { "start": 2, "end": 5 },
            "headStyles": { "fontSize": 12 }
        }))
        .unwrap();

        assert_eq!(schema.kind, "table");
        assert_eq!(schema.position, Position::new(10.0, 20.5));
        assert_eq!(schema.opacity, 1.0);
        assert_eq!(schema.body_range, Some(BodyRange::new(2, Some(5))));
        assert_eq!(schema.prop_bool("showHead"), Some(true));
        assert!(schema.props.contains_key("headStyles"));
        assert!(!schema.props.contains_key("name"));
    }

    #[test]
    fn body_range_clamps() {
        assert_eq!(BodyRange::new(1, Some(3)).resolve(10), 1..3);
        assert_eq!(BodyRange::new(4, None).resolve(6), 4..6);
        assert_eq!(BodyRange::new(8, Some(12)).resolve(5), 5..5);
    }

    #[test]
    fn defaults_fill_only_missing_props() {
        let schema = Schema::new("a", "text").with_prop("fontSize", json!(20));
        let defaults = Schema::new("", "text")
            .with_prop("fontSize", json!(13))
            .with_prop("alignment", json!("left"));
        let merged = schema.merged_with_defaults(&defaults);
        assert_eq!(merged.props["fontSize"], json!(20));
        assert_eq!(merged.props["alignment"], json!("left"));
    }
}
