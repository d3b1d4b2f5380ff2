use crate::TemplateError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// The data for one generated document, keyed by schema name.
pub type InputRecord = BTreeMap<String, FieldValue>;

/// A raw value supplied by an input record.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Number(f64),
    /// Table data: rows of stringified cells.
    Rows(Vec<Vec<String>>),
}

impl Default for FieldValue {
    fn default() -> Self {
        FieldValue::Text(String::new())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Flag(b)
    }
}

impl From<Vec<Vec<String>>> for FieldValue {
    fn from(rows: Vec<Vec<String>>) -> Self {
        FieldValue::Rows(rows)
    }
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl FieldValue {
    pub fn from_json(value: &Value) -> FieldValue {
        match value {
            Value::Null => FieldValue::Text(String::new()),
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Bool(b) => FieldValue::Flag(*b),
            Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or_default()),
            Value::Array(rows) => FieldValue::Rows(
                rows.iter()
                    .map(|row| match row {
                        Value::Array(cells) => cells.iter().map(cell_to_string).collect(),
                        single => vec![cell_to_string(single)],
                    })
                    .collect(),
            ),
            Value::Object(_) => FieldValue::Text(value.to_string()),
        }
    }

    /// Textual form used by text-like renderers and placeholder substitution.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            FieldValue::Text(s) => Cow::Borrowed(s),
            FieldValue::Flag(b) => Cow::Owned(b.to_string()),
            FieldValue::Number(n) => Cow::Owned(format_number(*n)),
            FieldValue::Rows(rows) => {
                Cow::Owned(serde_json::to_string(rows).unwrap_or_default())
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::Flag(_) | FieldValue::Number(_) => false,
            FieldValue::Rows(rows) => rows.is_empty(),
        }
    }

    /// Booleans, `"true"`/`"false"` strings and non-zero numbers.
    pub fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Flag(b) => *b,
            FieldValue::Number(n) => *n != 0.0,
            FieldValue::Text(s) => s.trim().eq_ignore_ascii_case("true"),
            FieldValue::Rows(rows) => !rows.is_empty(),
        }
    }

    /// Table rows. Text values are accepted when they hold a JSON-encoded
    /// array of arrays; an empty string is an empty table.
    pub fn rows(&self, schema_name: &str) -> Result<Cow<'_, [Vec<String>]>, TemplateError> {
        match self {
            FieldValue::Rows(rows) => Ok(Cow::Borrowed(rows.as_slice())),
            FieldValue::Text(s) if s.trim().is_empty() => Ok(Cow::Owned(Vec::new())),
            FieldValue::Text(s) => {
                let parsed: Value = serde_json::from_str(s).map_err(|e| {
                    TemplateError::InvalidTableValue {
                        name: schema_name.to_string(),
                        message: e.to_string(),
                    }
                })?;
                match FieldValue::from_json(&parsed) {
                    FieldValue::Rows(rows) => Ok(Cow::Owned(rows)),
                    _ => Err(TemplateError::InvalidTableValue {
                        name: schema_name.to_string(),
                        message: "expected an array of rows".into(),
                    }),
                }
            }
            other => Err(TemplateError::InvalidTableValue {
                name: schema_name.to_string(),
                message: format!("expected an array of rows, got {}", other.as_text()),
            }),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(FieldValue::from_json(&value))
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Flag(b) => serializer.serialize_bool(*b),
            FieldValue::Number(n) => serializer.serialize_f64(*n),
            FieldValue::Rows(rows) => rows.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_from_json() {
        let record: InputRecord = serde_json::from_value(json!({
            "name": "Ada",
            "agree": true,
            "qty": 3,
            "items": [["a", 1], ["b", null]],
            "vars": { "x": "1" }
        }))
        .unwrap();

        assert_eq!(record["name"], FieldValue::from("Ada"));
        assert!(record["agree"].is_truthy());
        assert_eq!(record["qty"].as_text(), "3");
        assert_eq!(
            record["items"],
            FieldValue::Rows(vec![
                vec!["a".into(), "1".into()],
                vec!["b".into(), "".into()]
            ])
        );
        assert_eq!(record["vars"].as_text(), r#"{"x":"1"}"#);
    }

    #[test]
    fn rows_accept_json_strings() {
        let value = FieldValue::from(r#"[["1","2"],["3","4"]]"#);
        let rows = value.rows("t").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], "3");
        assert!(FieldValue::from("").rows("t").unwrap().is_empty());
        assert!(FieldValue::from("nope").rows("t").is_err());
        assert!(FieldValue::Flag(true).rows("t").is_err());
    }

    #[test]
    fn emptiness() {
        assert!(FieldValue::from("  ").is_empty());
        assert!(!FieldValue::Flag(false).is_empty());
        assert!(FieldValue::Rows(vec![]).is_empty());
        assert!(FieldValue::from("TRUE").is_truthy());
        assert!(!FieldValue::from("false").is_truthy());
    }
}
