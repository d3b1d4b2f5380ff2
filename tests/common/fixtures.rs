use serde_json::{Value, json};
use stencil::{FieldValue, InputRecord, Template};

/// A4 with 10mm padding on every side.
pub fn blank_base() -> Value {
    json!({ "width": 210, "height": 297, "padding": [10, 10, 10, 10] })
}

/// A text field at (`x`, `y`) in millimetres.
pub fn text_schema(name: &str, x: f64, y: f64) -> Value {
    json!({
        "name": name,
        "type": "text",
        "position": { "x": x, "y": y },
        "width": 80,
        "height": 10
    })
}

/// A read-only text field whose content is a placeholder template.
pub fn static_text(name: &str, content: &str, y: f64) -> Value {
    json!({
        "name": name,
        "type": "text",
        "position": { "x": 10, "y": y },
        "width": 120,
        "height": 10,
        "readOnly": true,
        "content": content
    })
}

/// A three column table with the given extra properties merged in.
pub fn table_schema(name: &str, y: f64, extra: Value) -> Value {
    let mut schema = json!({
        "name": name,
        "type": "table",
        "position": { "x": 10, "y": y },
        "width": 150,
        "height": 20,
        "head": ["Name", "City", "Description"],
        "headWidthPercentages": [30, 30, 40]
    });
    if let (Some(target), Value::Object(extra)) = (schema.as_object_mut(), extra) {
        target.extend(extra);
    }
    schema
}

/// A template on a blank A4 base, one inner array per page.
pub fn template(pages: Vec<Vec<Value>>) -> Result<Template, serde_json::Error> {
    serde_json::from_value(json!({ "basePdf": blank_base(), "schemas": pages }))
}

pub fn record(fields: &[(&str, &str)]) -> InputRecord {
    fields
        .iter()
        .map(|(name, value)| (name.to_string(), FieldValue::from(*value)))
        .collect()
}

/// `n` body rows: `item {i}`, a city and a short description.
pub fn rows(n: usize) -> Vec<Vec<String>> {
    (0..n)
        .map(|i| vec![format!("item {i}"), "Oslo".to_string(), format!("row number {i}")])
        .collect()
}

pub fn table_record(name: &str, rows: Vec<Vec<String>>) -> InputRecord {
    let mut record = InputRecord::new();
    record.insert(name.to_string(), FieldValue::from(rows));
    record
}
