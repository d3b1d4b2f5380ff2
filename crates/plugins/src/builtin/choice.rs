//! `select`, `checkbox` and `radioGroup`.

use super::text::{render_text, text_heights, text_schema};
use super::{finish, parse_color};
use crate::{Plugin, PluginError, RenderContext};
use serde::{Deserialize, Serialize};
use serde_json::json;
use stencil_render_core::{DrawOp, Primitive, ShapeStyle};
use stencil_template_core::Schema;
use stencil_types::{Color, Position, Rect, Size};

pub struct SelectPlugin;

impl Plugin for SelectPlugin {
    fn type_name(&self) -> &'static str {
        "select"
    }

    fn default_schema(&self) -> Schema {
        text_schema(self.type_name(), &[("options", json!(["option1", "option2"]))])
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let value = ctx.value.as_text();
        let known = ctx
            .schema
            .props
            .get("options")
            .and_then(|o| o.as_array())
            .is_some_and(|options| options.iter().any(|o| o.as_str() == Some(&*value)));
        if !known && !value.is_empty() {
            log::debug!("'{}' is not an option of '{}'", value, ctx.schema.name);
        }
        render_text(ctx, &value)
    }

    fn dynamic_heights(&self, ctx: &RenderContext) -> Result<Option<Vec<f64>>, PluginError> {
        text_heights(ctx, &ctx.value.as_text())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MarkProps {
    color: String,
}

impl Default for MarkProps {
    fn default() -> Self {
        Self {
            color: "#000000".into(),
        }
    }
}

fn mark_schema(kind: &str) -> Schema {
    super::props_schema(kind, 8.0, 8.0, &MarkProps::default())
}

/// The largest square centred in the schema box.
fn square(schema: &Schema) -> Rect {
    schema.rect().fit_contain(Size::new(1.0, 1.0))
}

pub struct CheckboxPlugin;

impl Plugin for CheckboxPlugin {
    fn type_name(&self) -> &'static str {
        "checkbox"
    }

    fn default_schema(&self) -> Schema {
        mark_schema(self.type_name())
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let props: MarkProps = ctx.schema.props_as()?;
        let color = parse_color(&props.color).unwrap_or(Color::BLACK);
        let frame = square(ctx.schema);
        let side = frame.width;
        let stroke = side * 0.08;

        let mut primitives = vec![Primitive::Rectangle {
            rect: frame.inset(stroke / 2.0),
            style: ShapeStyle::stroked(color, stroke),
            radius: 0.0,
        }];

        if ctx.value.is_truthy() {
            let at = |fx: f64, fy: f64| Position::new(frame.x + side * fx, frame.y + side * fy);
            let (start, corner, end) = (at(0.22, 0.52), at(0.42, 0.74), at(0.80, 0.26));
            for (from, to) in [(start, corner), (corner, end)] {
                primitives.push(Primitive::Line {
                    from,
                    to,
                    width: side * 0.1,
                    color,
                });
            }
        }
        Ok(finish(ctx.schema, primitives))
    }
}

pub struct RadioGroupPlugin;

impl Plugin for RadioGroupPlugin {
    fn type_name(&self) -> &'static str {
        "radioGroup"
    }

    fn default_schema(&self) -> Schema {
        mark_schema(self.type_name())
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let props: MarkProps = ctx.schema.props_as()?;
        let color = parse_color(&props.color).unwrap_or(Color::BLACK);
        let frame = square(ctx.schema);
        let stroke = frame.width * 0.08;

        let mut primitives = vec![Primitive::Ellipse {
            rect: frame.inset(stroke / 2.0),
            style: ShapeStyle::stroked(color, stroke),
        }];
        if ctx.value.is_truthy() {
            primitives.push(Primitive::Ellipse {
                rect: frame.inset(frame.width * 0.25),
                style: ShapeStyle::filled(color),
            });
        }
        Ok(finish(ctx.schema, primitives))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::Fixture;

    #[test]
    fn checkbox_draws_a_mark_only_when_checked() {
        let schema = CheckboxPlugin.default_schema().at(5.0, 5.0);
        let unchecked = Fixture::new(schema.clone(), "false");
        assert_eq!(CheckboxPlugin.render(&unchecked.ctx()).unwrap().len(), 1);

        let checked = Fixture::new(schema, true);
        let ops = CheckboxPlugin.render(&checked.ctx()).unwrap();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[1].primitive, Primitive::Line { .. }));
    }

    #[test]
    fn radio_dot_sits_inside_the_frame() {
        let schema = RadioGroupPlugin.default_schema().at(0.0, 0.0).sized(10.0, 6.0);
        let fixture = Fixture::new(schema, "true");
        let ops = RadioGroupPlugin.render(&fixture.ctx()).unwrap();
        match &ops[1].primitive {
            Primitive::Ellipse { rect, style } => {
                assert_eq!(rect.width, 3.0);
                assert_eq!((rect.x, rect.y), (3.5, 1.5));
                assert!(style.fill.is_some());
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn select_renders_the_chosen_option() {
        let schema = SelectPlugin.default_schema().sized(40.0, 10.0);
        let fixture = Fixture::new(schema, "option2");
        let ops = SelectPlugin.render(&fixture.ctx()).unwrap();
        assert!(matches!(&ops[0].primitive, Primitive::Text(run) if run.text == "option2"));
    }
}
