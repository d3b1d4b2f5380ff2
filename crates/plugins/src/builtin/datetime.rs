//! `date`, `time` and `dateTime`: ISO values reformatted for display.

use super::text::{render_text, text_heights, text_schema};
use crate::{Plugin, PluginError, RenderContext};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use std::fmt::Write;
use stencil_render_core::DrawOp;
use stencil_template_core::Schema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateKind {
    Date,
    Time,
    DateTime,
}

impl DateKind {
    fn type_name(self) -> &'static str {
        match self {
            DateKind::Date => "date",
            DateKind::Time => "time",
            DateKind::DateTime => "dateTime",
        }
    }

    fn default_format(self) -> &'static str {
        match self {
            DateKind::Date => "YYYY/MM/DD",
            DateKind::Time => "HH:mm",
            DateKind::DateTime => "YYYY/MM/DD HH:mm",
        }
    }
}

const DATE_INPUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const TIME_INPUTS: &[&str] = &["%H:%M:%S", "%H:%M"];
const DATE_TIME_INPUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// Checked in order; `YYYY` must precede `YY`.
const TOKENS: &[(&str, &str)] = &[
    ("YYYY", "%Y"),
    ("YY", "%y"),
    ("MM", "%m"),
    ("DD", "%d"),
    ("HH", "%H"),
    ("mm", "%M"),
    ("ss", "%S"),
];

/// Translates a `YYYY/MM/DD HH:mm:ss` style pattern into a chrono format string.
pub fn to_chrono_format(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut rest = pattern;
    'outer: while let Some(ch) = rest.chars().next() {
        for (token, spec) in TOKENS {
            if let Some(after) = rest.strip_prefix(token) {
                out.push_str(spec);
                rest = after;
                continue 'outer;
            }
        }
        if ch == '%' {
            out.push_str("%%");
        } else {
            out.push(ch);
        }
        rest = &rest[ch.len_utf8()..];
    }
    out
}

fn parse_first<T>(value: &str, formats: &[&str], parse: impl Fn(&str, &str) -> chrono::ParseResult<T>) -> Option<T> {
    formats.iter().find_map(|f| parse(value, f).ok())
}

// A pattern asking a time for its year fails at display time.
fn display(formatted: impl std::fmt::Display) -> Option<String> {
    let mut out = String::new();
    write!(out, "{formatted}").ok().map(|_| out)
}

/// `value` in `pattern`, or the value itself when it does not parse.
pub fn format_value(kind: DateKind, value: &str, pattern: &str) -> String {
    let value = value.trim();
    let format = to_chrono_format(pattern);
    let formatted = match kind {
        DateKind::Date => parse_first(value, DATE_INPUTS, NaiveDate::parse_from_str)
            .and_then(|d| display(d.format(&format))),
        DateKind::Time => parse_first(value, TIME_INPUTS, NaiveTime::parse_from_str)
            .and_then(|t| display(t.format(&format))),
        DateKind::DateTime => parse_first(value, DATE_TIME_INPUTS, NaiveDateTime::parse_from_str)
            .and_then(|dt| display(dt.format(&format))),
    };
    formatted.unwrap_or_else(|| value.to_string())
}

pub struct DateTimePlugin {
    kind: DateKind,
}

impl DateTimePlugin {
    pub fn new(kind: DateKind) -> Self {
        Self { kind }
    }

    fn display(&self, ctx: &RenderContext) -> String {
        let value = ctx.value.as_text();
        if value.trim().is_empty() {
            return String::new();
        }
        let pattern = ctx
            .schema
            .prop_str("format")
            .unwrap_or(self.kind.default_format());
        format_value(self.kind, &value, pattern)
    }
}

impl Plugin for DateTimePlugin {
    fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    fn default_schema(&self) -> Schema {
        text_schema(
            self.type_name(),
            &[("format", json!(self.kind.default_format()))],
        )
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        render_text(ctx, &self.display(ctx))
    }

    fn dynamic_heights(&self, ctx: &RenderContext) -> Result<Option<Vec<f64>>, PluginError> {
        text_heights(ctx, &self.display(ctx))
    }
}
