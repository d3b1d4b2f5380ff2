//! `multiVariableText`: a text template filled from a JSON object value.

use super::text::{render_text, text_heights, text_schema};
use crate::{Plugin, PluginError, RenderContext};
use serde_json::{Value, json};
use stencil_render_core::DrawOp;
use stencil_template_core::{PlaceholderVars, Schema, replace_placeholders};

pub struct MultiVariableTextPlugin;

impl MultiVariableTextPlugin {
    /// The template text with every `{variable}` substituted. Variables the
    /// value does not provide are dropped.
    fn resolve(&self, ctx: &RenderContext) -> String {
        let template = ctx
            .schema
            .prop_str("text")
            .or(ctx.schema.content.as_deref())
            .unwrap_or_default();

        let mut vars = PlaceholderVars::default();
        let raw = ctx.value.as_text();
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => {
                for (key, value) in map {
                    let text = match value {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    vars.insert(key, text);
                }
            }
            _ if raw.trim().is_empty() => {}
            _ => log::debug!(
                "Value of '{}' is not a JSON object, rendering the bare template",
                ctx.schema.name
            ),
        }

        strip_unresolved(&replace_placeholders(template, &vars))
    }
}

/// Removes every balanced `{...}` that survived substitution.
fn strip_unresolved(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        match after.find(['{', '}']) {
            Some(close) if after.as_bytes()[close] == b'}' => {
                out.push_str(&rest[..open]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push_str(&rest[..=open]);
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

impl Plugin for MultiVariableTextPlugin {
    fn type_name(&self) -> &'static str {
        "multiVariableText"
    }

    fn default_schema(&self) -> Schema {
        text_schema(
            self.type_name(),
            &[("text", json!("")), ("variables", json!([]))],
        )
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        render_text(ctx, &self.resolve(ctx))
    }

    fn dynamic_heights(&self, ctx: &RenderContext) -> Result<Option<Vec<f64>>, PluginError> {
        text_heights(ctx, &self.resolve(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::Fixture;

    #[test]
    fn fills_variables_from_the_value() {
        let schema = MultiVariableTextPlugin
            .default_schema()
            .with_prop("text", json!("Dear {name}, you owe {amount}."));
        let fixture = Fixture::new(schema, r#"{"name":"Ada","amount":12.5}"#);
        assert_eq!(
            MultiVariableTextPlugin.resolve(&fixture.ctx()),
            "Dear Ada, you owe 12.5."
        );
    }

    #[test]
    fn missing_variables_disappear() {
        let schema = MultiVariableTextPlugin
            .default_schema()
            .with_prop("text", json!("Hi {first} {last}"));
        let fixture = Fixture::new(schema, r#"{"first":"Bo"}"#);
        assert_eq!(MultiVariableTextPlugin.resolve(&fixture.ctx()), "Hi Bo ");
    }

    #[test]
    fn unbalanced_braces_survive() {
        assert_eq!(strip_unresolved("a { b {c} d"), "a { b  d");
        assert_eq!(strip_unresolved("{x}y}"), "y}");
    }
}
