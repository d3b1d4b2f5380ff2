//! Decorations that render regardless of input: `line`, `rectangle`, `ellipse`.

use super::{finish, parse_color, props_schema};
use crate::{Plugin, PluginError, RenderContext};
use serde::{Deserialize, Serialize};
use stencil_render_core::{DrawOp, Primitive, ShapeStyle};
use stencil_template_core::Schema;
use stencil_types::{Color, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LineProps {
    color: String,
}

impl Default for LineProps {
    fn default() -> Self {
        Self {
            color: "#000000".into(),
        }
    }
}

pub struct LinePlugin;

impl Plugin for LinePlugin {
    fn type_name(&self) -> &'static str {
        "line"
    }

    fn default_schema(&self) -> Schema {
        let mut schema = props_schema(self.type_name(), 50.0, 1.0, &LineProps::default());
        schema.read_only = true;
        schema
    }

    /// A stroke through the vertical centre of the box, as thick as the box.
    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let props: LineProps = ctx.schema.props_as()?;
        let rect = ctx.schema.rect();
        let y = rect.y + rect.height / 2.0;
        let line = Primitive::Line {
            from: Position::new(rect.x, y),
            to: Position::new(rect.right(), y),
            width: rect.height,
            color: parse_color(&props.color).unwrap_or(Color::BLACK),
        };
        Ok(finish(ctx.schema, vec![line]))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ShapeProps {
    /// Millimetres.
    border_width: f64,
    border_color: String,
    /// Fill colour, empty for none.
    color: String,
    /// Corner radius in millimetres, rectangles only.
    radius: f64,
}

impl Default for ShapeProps {
    fn default() -> Self {
        Self {
            border_width: 1.0,
            border_color: "#000000".into(),
            color: String::new(),
            radius: 0.0,
        }
    }
}

impl ShapeProps {
    fn style(&self) -> ShapeStyle {
        let stroke = parse_color(&self.border_color).filter(|_| self.border_width > 0.0);
        ShapeStyle {
            fill: parse_color(&self.color),
            stroke_width: if stroke.is_some() { self.border_width } else { 0.0 },
            stroke,
        }
    }
}

fn shape_schema(kind: &str) -> Schema {
    let mut schema = props_schema(kind, 40.0, 20.0, &ShapeProps::default());
    schema.read_only = true;
    schema
}

pub struct RectanglePlugin;

impl Plugin for RectanglePlugin {
    fn type_name(&self) -> &'static str {
        "rectangle"
    }

    fn default_schema(&self) -> Schema {
        shape_schema(self.type_name())
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let props: ShapeProps = ctx.schema.props_as()?;
        let style = props.style();
        if !style.is_visible() {
            return Ok(Vec::new());
        }
        // The stroke stays inside the box.
        let rect = ctx.schema.rect().inset(style.stroke_width / 2.0);
        let radius = props.radius.min(rect.width / 2.0).min(rect.height / 2.0).max(0.0);
        Ok(finish(
            ctx.schema,
            vec![Primitive::Rectangle {
                rect,
                style,
                radius,
            }],
        ))
    }
}

pub struct EllipsePlugin;

impl Plugin for EllipsePlugin {
    fn type_name(&self) -> &'static str {
        "ellipse"
    }

    fn default_schema(&self) -> Schema {
        shape_schema(self.type_name())
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let props: ShapeProps = ctx.schema.props_as()?;
        let style = props.style();
        if !style.is_visible() {
            return Ok(Vec::new());
        }
        let rect = ctx.schema.rect().inset(style.stroke_width / 2.0);
        Ok(finish(ctx.schema, vec![Primitive::Ellipse { rect, style }]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::Fixture;
    use serde_json::json;

    #[test]
    fn line_runs_through_the_centre() {
        let schema = LinePlugin.default_schema().at(10.0, 20.0).sized(30.0, 2.0);
        let fixture = Fixture::new(schema, "");
        let ops = LinePlugin.render(&fixture.ctx()).unwrap();
        match &ops[0].primitive {
            Primitive::Line { from, to, width, .. } => {
                assert_eq!((from.x, from.y), (10.0, 21.0));
                assert_eq!((to.x, to.y), (40.0, 21.0));
                assert_eq!(*width, 2.0);
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn rectangle_keeps_its_stroke_inside() {
        let schema = RectanglePlugin
            .default_schema()
            .with_prop("borderWidth", json!(2))
            .with_prop("radius", json!(50))
            .at(0.0, 0.0)
            .sized(20.0, 10.0);
        let fixture = Fixture::new(schema, "");
        let ops = RectanglePlugin.render(&fixture.ctx()).unwrap();
        match &ops[0].primitive {
            Primitive::Rectangle { rect, radius, .. } => {
                assert_eq!((rect.x, rect.width, rect.height), (1.0, 18.0, 8.0));
                assert_eq!(*radius, 4.0);
            }
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn invisible_shapes_emit_nothing() {
        let schema = EllipsePlugin
            .default_schema()
            .with_prop("borderWidth", json!(0))
            .sized(10.0, 10.0);
        let fixture = Fixture::new(schema, "");
        assert!(EllipsePlugin.render(&fixture.ctx()).unwrap().is_empty());
    }

    #[test]
    fn shapes_are_read_only() {
        assert!(RectanglePlugin.default_schema().read_only);
        assert!(LinePlugin.default_schema().read_only);
    }
}
