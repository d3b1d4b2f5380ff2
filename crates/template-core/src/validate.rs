//! Structural template checks and required-field input checks.
//!
//! Both checks collect every violation instead of stopping at the first one,
//! so callers can report a complete list.

use crate::input::InputRecord;
use crate::schema::Schema;
use crate::template::Template;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use stencil_types::Color;

/// Property keys holding colours, checked at any nesting depth.
const COLOR_KEYS: &[&str] = &[
    "fontColor",
    "backgroundColor",
    "borderColor",
    "color",
    "barColor",
    "lineColor",
    "alternateBackgroundColor",
];

/// What the validator needs to know about field types.
pub trait SchemaCatalog {
    fn contains_type(&self, kind: &str) -> bool;
    /// Whether fields of this type are required when the template is silent.
    fn required_by_default(&self, kind: &str) -> bool;
}

pub trait FontCatalog {
    fn contains_font(&self, name: &str) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    UnknownType,
    InvalidGeometry,
    InvalidColor,
    InvalidBodyRange,
    UnknownFont,
    DuplicateName,
    PageOutOfRange,
    MissingRequired,
}

impl ViolationKind {
    pub fn severity(self) -> Severity {
        match self {
            ViolationKind::UnknownType
            | ViolationKind::DuplicateName
            | ViolationKind::PageOutOfRange
            | ViolationKind::MissingRequired => Severity::Error,
            ViolationKind::InvalidGeometry
            | ViolationKind::InvalidColor
            | ViolationKind::InvalidBodyRange
            | ViolationKind::UnknownFont => Severity::Warning,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub severity: Severity,
    /// Template page index.
    pub page: Option<usize>,
    pub schema: Option<String>,
    /// Input record index, for input checks.
    pub record: Option<usize>,
    pub message: String,
}

impl Violation {
    fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            page: None,
            schema: None,
            record: None,
            message: message.into(),
        }
    }

    fn on_page(mut self, page: usize) -> Self {
        self.page = Some(page);
        self
    }

    fn for_schema(mut self, name: &str) -> Self {
        self.schema = Some(name.to_string());
        self
    }

    fn in_record(mut self, record: usize) -> Self {
        self.record = Some(record);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{level}")?;
        if let Some(record) = self.record {
            write!(f, " [record {record}]")?;
        }
        if let Some(page) = self.page {
            write!(f, " [page {page}]")?;
        }
        if let Some(schema) = &self.schema {
            write!(f, " '{schema}'")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Every violation found by one or more checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Warning)
    }

    pub fn of_kind(&self, kind: ViolationKind) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(move |v| v.kind == kind)
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

pub struct Validator<'a> {
    types: &'a dyn SchemaCatalog,
    fonts: Option<&'a dyn FontCatalog>,
}

impl<'a> Validator<'a> {
    pub fn new(types: &'a dyn SchemaCatalog) -> Self {
        Self { types, fonts: None }
    }

    /// Also flag `fontName` properties missing from the given font set.
    pub fn with_fonts(mut self, fonts: &'a dyn FontCatalog) -> Self {
        self.fonts = Some(fonts);
        self
    }

    pub fn check_template(&self, template: &Template) -> ValidationReport {
        let mut report = ValidationReport::default();

        if let Some(limit) = template.base_pdf.page_limit() {
            if template.page_count() > limit {
                report.violations.push(Violation::new(
                    ViolationKind::PageOutOfRange,
                    format!(
                        "template has {} pages but the base document only has {}",
                        template.page_count(),
                        limit
                    ),
                ));
            }
        }

        for (page, schemas) in template.schemas.iter().enumerate() {
            let mut seen = BTreeSet::new();
            for schema in schemas {
                if !seen.insert(schema.name.as_str()) {
                    report.violations.push(
                        Violation::new(ViolationKind::DuplicateName, "name is not unique on its page")
                            .on_page(page)
                            .for_schema(&schema.name),
                    );
                }
                self.check_schema(page, schema, &mut report);
            }
        }
        report
    }

    fn check_schema(&self, page: usize, schema: &Schema, report: &mut ValidationReport) {
        let mut push = |kind, message: String| {
            report.violations.push(
                Violation::new(kind, message)
                    .on_page(page)
                    .for_schema(&schema.name),
            );
        };

        if !self.types.contains_type(&schema.kind) {
            push(
                ViolationKind::UnknownType,
                format!("unknown schema type '{}'", schema.kind),
            );
        }

        for (field, value) in [
            ("width", schema.width),
            ("height", schema.height),
            ("position.x", schema.position.x),
            ("position.y", schema.position.y),
        ] {
            if !value.is_finite() || value < 0.0 {
                push(
                    ViolationKind::InvalidGeometry,
                    format!("{field} must be a finite, non-negative number (got {value})"),
                );
            }
        }

        let mut colors = Vec::new();
        collect_colors("", &schema.props, &mut colors);
        for (path, value) in colors {
            if !value.is_empty() && !Color::is_hex_notation(&value) {
                push(
                    ViolationKind::InvalidColor,
                    format!("{path} '{value}' is not a #RGB or #RRGGBB colour"),
                );
            }
        }

        if let Some(range) = schema.body_range {
            if let Some(end) = range.end {
                if range.start > end {
                    push(
                        ViolationKind::InvalidBodyRange,
                        format!("bodyRange start {} is after end {}", range.start, end),
                    );
                }
            }
        }

        if let Some(fonts) = self.fonts {
            let mut names = Vec::new();
            collect_font_names(&schema.props, &mut names);
            for name in names {
                if !fonts.contains_font(&name) {
                    push(
                        ViolationKind::UnknownFont,
                        format!("font '{name}' is not in the font set"),
                    );
                }
            }
        }
    }

    /// Required fields that are not read-only must be non-empty in every record.
    pub fn check_inputs(&self, template: &Template, inputs: &[InputRecord]) -> ValidationReport {
        let mut report = ValidationReport::default();
        let mut checked = BTreeSet::new();

        for (page, schema) in template.all_schemas() {
            if schema.read_only || !checked.insert(schema.name.as_str()) {
                continue;
            }
            let required = schema
                .required
                .unwrap_or_else(|| self.types.required_by_default(&schema.kind));
            if !required {
                continue;
            }
            for (index, record) in inputs.iter().enumerate() {
                let missing = record.get(&schema.name).is_none_or(|v| v.is_empty());
                if missing {
                    report.violations.push(
                        Violation::new(ViolationKind::MissingRequired, "required value is missing")
                            .on_page(page)
                            .for_schema(&schema.name)
                            .in_record(index),
                    );
                }
            }
        }
        report
    }
}

fn collect_colors(prefix: &str, map: &serde_json::Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::String(s) if COLOR_KEYS.contains(&key.as_str()) => {
                out.push((path, s.clone()));
            }
            Value::Object(nested) => collect_colors(&path, nested, out),
            _ => {}
        }
    }
}

fn collect_font_names(map: &serde_json::Map<String, Value>, out: &mut Vec<String>) {
    for (key, value) in map {
        match value {
            Value::String(s) if key == "fontName" && !s.is_empty() => out.push(s.clone()),
            Value::Object(nested) => collect_font_names(nested, out),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::FieldValue;
    use serde_json::json;

    struct Types;

    impl SchemaCatalog for Types {
        fn contains_type(&self, kind: &str) -> bool {
            matches!(kind, "text" | "table" | "signature")
        }

        fn required_by_default(&self, _kind: &str) -> bool {
            false
        }
    }

    struct Fonts;

    impl FontCatalog for Fonts {
        fn contains_font(&self, name: &str) -> bool {
            name == "Helvetica"
        }
    }

    fn template(schemas: serde_json::Value) -> Template {
        serde_json::from_value(json!({ "schemas": schemas })).unwrap()
    }

    #[test]
    fn reports_every_template_problem() {
        let t = template(json!([[
            { "name": "a", "type": "text", "width": -1, "height": 10, "fontColor": "red" },
            { "name": "a", "type": "barcode" },
            { "name": "t", "type": "table", "__bodyRange": { "start": 4, "end": 2 },
              "headStyles": { "backgroundColor": "#12" }, "fontName": "Comic" }
        ]]));
        let report = Validator::new(&Types).with_fonts(&Fonts).check_template(&t);

        let kinds: Vec<_> = report.violations.iter().map(|v| v.kind).collect();
        assert!(kinds.contains(&ViolationKind::InvalidGeometry));
        assert!(kinds.contains(&ViolationKind::DuplicateName));
        assert!(kinds.contains(&ViolationKind::UnknownType));
        assert!(kinds.contains(&ViolationKind::InvalidBodyRange));
        assert!(kinds.contains(&ViolationKind::UnknownFont));
        assert_eq!(report.of_kind(ViolationKind::InvalidColor).count(), 2);
        assert!(report.has_errors());
    }

    #[test]
    fn empty_colours_are_allowed() {
        let t = template(json!([[
            { "name": "a", "type": "text", "backgroundColor": "", "fontColor": "#000" }
        ]]));
        assert!(Validator::new(&Types).check_template(&t).is_empty());
    }

    #[test]
    fn colours_need_the_leading_hash() {
        let t = template(json!([[
            { "name": "a", "type": "text", "fontColor": "ff0000", "backgroundColor": "abc" }
        ]]));
        let report = Validator::new(&Types).check_template(&t);
        assert_eq!(report.of_kind(ViolationKind::InvalidColor).count(), 2);
        assert!(!report.has_errors());
    }

    #[test]
    fn too_many_pages_for_custom_base() {
        let t: Template = serde_json::from_value(json!({
            "basePdf": { "pageSizes": [{ "width": 100, "height": 100 }] },
            "schemas": [[], []]
        }))
        .unwrap();
        let report = Validator::new(&Types).check_template(&t);
        assert_eq!(report.of_kind(ViolationKind::PageOutOfRange).count(), 1);
    }

    #[test]
    fn missing_required_value_names_schema() {
        let t = template(json!([[
            { "name": "customer", "type": "text", "required": true },
            { "name": "footer", "type": "text", "required": true, "readOnly": true }
        ]]));
        let mut present = InputRecord::new();
        present.insert("customer".into(), FieldValue::from("Ada"));
        let inputs = vec![present, InputRecord::new()];

        let report = Validator::new(&Types).check_inputs(&t, &inputs);
        assert_eq!(report.violations.len(), 1);
        let violation = &report.violations[0];
        assert_eq!(violation.schema.as_deref(), Some("customer"));
        assert_eq!(violation.record, Some(1));
        assert!(report.to_string().contains("'customer'"));
    }

    #[test]
    fn repeated_names_across_pages_are_checked_once() {
        let t = template(json!([
            [{ "name": "id", "type": "text", "required": true }],
            [{ "name": "id", "type": "text", "required": true }]
        ]));
        let report = Validator::new(&Types).check_inputs(&t, &[InputRecord::new()]);
        assert_eq!(report.violations.len(), 1);
    }
}
