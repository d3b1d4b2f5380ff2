//! `text` and the shared machinery of every text-like type.

use super::{finish, parse_color, props_schema};
use crate::{Plugin, PluginError, RenderContext};
use serde::{Deserialize, Serialize};
use std::rc::Rc;
use stencil_layout::cache::{cache_key, domain};
use stencil_layout::{Alignment, FitMode, FontFace, TextMetrics, VerticalAlignment, fit_font_size, wrap_text};
use stencil_render_core::{DrawOp, Primitive, ShapeStyle, TextRun};
use stencil_template_core::Schema;
use stencil_types::units::{mm2pt, pt2mm};
use stencil_types::{Color, Rect};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicFontSize {
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub fit: FitMode,
}

/// Properties shared by `text`, `multiVariableText`, `date`/`time`/`dateTime`
/// and `select`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextProps {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    /// Points.
    pub font_size: f64,
    pub font_color: String,
    pub background_color: String,
    pub alignment: Alignment,
    pub vertical_alignment: VerticalAlignment,
    pub line_height: f64,
    /// Points between characters.
    pub character_spacing: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamic_font_size: Option<DynamicFontSize>,
    /// Grow the box to fit the wrapped text. Ignores `dynamicFontSize`.
    pub dynamic_height: bool,
}

impl Default for TextProps {
    fn default() -> Self {
        Self {
            font_name: None,
            font_size: 13.0,
            font_color: "#000000".into(),
            background_color: String::new(),
            alignment: Alignment::Left,
            vertical_alignment: VerticalAlignment::Top,
            line_height: 1.0,
            character_spacing: 0.0,
            dynamic_font_size: None,
            dynamic_height: false,
        }
    }
}

/// Wrapped text at its final font size.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextBlock {
    pub size: f64,
    pub lines: Vec<String>,
}

/// How a block of lines is placed inside a box.
pub(crate) struct LineStyle<'a> {
    pub font: &'a FontFace,
    pub size: f64,
    pub color: Color,
    pub char_spacing: f64,
    pub line_height: f64,
    pub alignment: Alignment,
    pub vertical_alignment: VerticalAlignment,
}

impl LineStyle<'_> {
    fn metrics(&self) -> TextMetrics<'_> {
        TextMetrics {
            font: self.font,
            size: self.size,
            char_spacing: self.char_spacing,
            line_height: self.line_height,
        }
    }
}

/// Emits one run per line (one per word for justified lines) inside `area`.
pub(crate) fn draw_lines(out: &mut Vec<Primitive>, lines: &[String], area: Rect, style: &LineStyle) {
    let metrics = style.metrics();
    let line_box = metrics.line_box_mm();
    let block = lines.len() as f64 * line_box;
    let top = match style.vertical_alignment {
        VerticalAlignment::Top => area.y,
        VerticalAlignment::Middle => area.y + (area.height - block) / 2.0,
        VerticalAlignment::Bottom => area.bottom() - block,
    };
    let glyph_box = pt2mm(style.font.ascent(style.size) - style.font.descent(style.size));
    let ascent = pt2mm(style.font.ascent(style.size));

    let run = |text: &str, x: f64, baseline: f64| {
        Primitive::Text(TextRun {
            text: text.to_string(),
            font: style.font.name.clone(),
            size: style.size,
            color: style.color,
            x,
            baseline,
            char_spacing: style.char_spacing,
        })
    };

    for (i, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let baseline = top + i as f64 * line_box + (line_box - glyph_box) / 2.0 + ascent;
        let width = pt2mm(metrics.width(line));
        let is_last = i + 1 == lines.len();

        match style.alignment {
            Alignment::Left => out.push(run(line, area.x, baseline)),
            Alignment::Center => out.push(run(line, area.x + (area.width - width) / 2.0, baseline)),
            Alignment::Right => out.push(run(line, area.right() - width, baseline)),
            Alignment::Justify => {
                let words: Vec<&str> = line.split(' ').filter(|w| !w.is_empty()).collect();
                if is_last || words.len() < 2 {
                    out.push(run(line, area.x, baseline));
                    continue;
                }
                let words_width: f64 = words.iter().map(|w| pt2mm(metrics.width(w))).sum();
                let gap = (area.width - words_width) / (words.len() - 1) as f64;
                let mut x = area.x;
                for word in words {
                    out.push(run(word, x, baseline));
                    x += pt2mm(metrics.width(word)) + gap;
                }
            }
        }
    }
}

/// Wraps `text` for the instance, choosing the font size first when
/// `dynamicFontSize` is set. Memoised per schema, props and text.
pub(crate) fn layout_text(
    ctx: &RenderContext,
    props: &TextProps,
    text: &str,
) -> Result<Rc<TextBlock>, PluginError> {
    let fitting = props.dynamic_font_size.filter(|_| !props.dynamic_height);
    let props_key = serde_json::to_string(props).unwrap_or_default();
    let key = cache_key(
        domain::TEXT,
        &(
            &ctx.schema.name,
            ctx.schema.width.to_bits(),
            fitting.map(|_| ctx.schema.height.to_bits()),
            props_key,
            text,
        ),
    );

    Ok(ctx.cache.get_or_try_insert_with::<_, PluginError>(key, || {
        let font = ctx.fonts.resolve(props.font_name.as_deref());
        let base = TextMetrics {
            font,
            size: props.font_size,
            char_spacing: props.character_spacing,
            line_height: props.line_height,
        };
        let width_pt = mm2pt(ctx.schema.width);
        let size = match fitting {
            Some(dynamic) => fit_font_size(
                text,
                width_pt,
                mm2pt(ctx.schema.height),
                &base,
                dynamic.min,
                dynamic.max,
                dynamic.fit,
            ),
            None => props.font_size,
        };
        let metrics = TextMetrics { size, ..base };
        Ok(TextBlock {
            size,
            lines: wrap_text(text, width_pt, &metrics),
        })
    })?)
}

/// Draws `text` into the instance box with the common text properties.
pub(crate) fn render_text(ctx: &RenderContext, text: &str) -> Result<Vec<DrawOp>, PluginError> {
    let props: TextProps = ctx.schema.props_as()?;
    let rect = ctx.schema.rect();
    let mut primitives = Vec::new();

    if let Some(background) = parse_color(&props.background_color) {
        primitives.push(Primitive::Rectangle {
            rect,
            style: ShapeStyle::filled(background),
            radius: 0.0,
        });
    }

    if !text.is_empty() {
        let block = layout_text(ctx, &props, text)?;
        let style = LineStyle {
            font: ctx.fonts.resolve(props.font_name.as_deref()),
            size: block.size,
            color: parse_color(&props.font_color).unwrap_or(Color::BLACK),
            char_spacing: props.character_spacing,
            line_height: props.line_height,
            alignment: props.alignment,
            vertical_alignment: props.vertical_alignment,
        };
        draw_lines(&mut primitives, &block.lines, rect, &style);
    }

    Ok(finish(ctx.schema, primitives))
}

/// Height of the wrapped text when `dynamicHeight` is on. Never shrinks below
/// the template height.
pub(crate) fn text_heights(ctx: &RenderContext, text: &str) -> Result<Option<Vec<f64>>, PluginError> {
    let props: TextProps = ctx.schema.props_as()?;
    if !props.dynamic_height {
        return Ok(None);
    }
    let block = layout_text(ctx, &props, text)?;
    let metrics = TextMetrics {
        font: ctx.fonts.resolve(props.font_name.as_deref()),
        size: block.size,
        char_spacing: props.character_spacing,
        line_height: props.line_height,
    };
    let needed = block.lines.len() as f64 * metrics.line_box_mm();
    Ok(Some(vec![needed.max(ctx.schema.height)]))
}

pub(crate) fn text_schema(kind: &str, extra: &[(&str, serde_json::Value)]) -> Schema {
    let mut schema = props_schema(kind, 45.0, 10.0, &TextProps::default());
    for (key, value) in extra {
        schema.props.insert((*key).to_string(), value.clone());
    }
    schema
}

pub struct TextPlugin;

impl Plugin for TextPlugin {
    fn type_name(&self) -> &'static str {
        "text"
    }

    fn default_schema(&self) -> Schema {
        text_schema(self.type_name(), &[])
    }

    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        render_text(ctx, &ctx.value.as_text())
    }

    fn dynamic_heights(&self, ctx: &RenderContext) -> Result<Option<Vec<f64>>, PluginError> {
        text_heights(ctx, &ctx.value.as_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtin::test_support::Fixture;
    use serde_json::json;

    fn texts(ops: &[DrawOp]) -> Vec<(String, f64, f64)> {
        ops.iter()
            .filter_map(|op| match &op.primitive {
                Primitive::Text(run) => Some((run.text.clone(), run.x, run.baseline)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn wraps_into_lines_top_down() {
        let mut schema = TextPlugin.default_schema().at(10.0, 20.0).sized(30.0, 40.0);
        schema.name = "body".into();
        let fixture = Fixture::new(schema, "alpha beta gamma delta epsilon zeta");

        let ops = TextPlugin.render(&fixture.ctx()).unwrap();
        let runs = texts(&ops);
        assert!(runs.len() > 1);
        assert!(runs.iter().all(|(_, x, _)| *x == 10.0));
        assert!(runs.windows(2).all(|w| w[0].2 < w[1].2));
        assert!(runs[0].2 > 20.0);
    }

    #[test]
    fn right_alignment_ends_at_the_box_edge() {
        let schema = TextPlugin
            .default_schema()
            .with_prop("alignment", json!("right"))
            .at(0.0, 0.0)
            .sized(50.0, 10.0);
        let fixture = Fixture::new(schema, "ab");
        let ops = TextPlugin.render(&fixture.ctx()).unwrap();
        let runs = texts(&ops);
        assert_eq!(runs.len(), 1);
        let width = pt2mm(fixture.fonts.resolve(None).text_width("ab", 13.0, 0.0));
        assert!((runs[0].1 + width - 50.0).abs() < 1e-9);
    }

    #[test]
    fn background_is_drawn_first() {
        let schema = TextPlugin
            .default_schema()
            .with_prop("backgroundColor", json!("#ff0000"))
            .sized(20.0, 10.0);
        let fixture = Fixture::new(schema, "x");
        let ops = TextPlugin.render(&fixture.ctx()).unwrap();
        assert!(matches!(ops[0].primitive, Primitive::Rectangle { .. }));
        assert!(matches!(ops[1].primitive, Primitive::Text(_)));
    }

    #[test]
    fn dynamic_height_grows_but_never_shrinks() {
        let schema = TextPlugin
            .default_schema()
            .with_prop("dynamicHeight", json!(true))
            .sized(20.0, 8.0);

        let short = Fixture::new(schema.clone(), "a");
        assert_eq!(TextPlugin.dynamic_heights(&short.ctx()).unwrap(), Some(vec![8.0]));

        let long = Fixture::new(schema, "one two three four five six seven eight nine ten");
        let heights = TextPlugin.dynamic_heights(&long.ctx()).unwrap().unwrap();
        assert!(heights[0] > 8.0);
    }

    #[test]
    fn fixed_height_without_the_flag() {
        let fixture = Fixture::new(TextPlugin.default_schema(), "anything");
        assert_eq!(TextPlugin.dynamic_heights(&fixture.ctx()).unwrap(), None);
    }

    #[test]
    fn dynamic_font_size_shrinks_long_text() {
        let schema = TextPlugin
            .default_schema()
            .with_prop("dynamicFontSize", json!({ "min": 4, "max": 20, "fit": "horizontal" }))
            .sized(20.0, 10.0);
        let fixture = Fixture::new(schema, "a fairly long single line of text");
        let ops = TextPlugin.render(&fixture.ctx()).unwrap();
        match &ops[0].primitive {
            Primitive::Text(run) => assert!(run.size < 13.0),
            other => panic!("unexpected primitive {other:?}"),
        }
    }

    #[test]
    fn opacity_and_rotation_are_applied() {
        let mut schema = TextPlugin.default_schema().at(10.0, 10.0).sized(20.0, 10.0);
        schema.rotate = 90.0;
        schema.opacity = 0.5;
        let fixture = Fixture::new(schema, "x");
        let ops = TextPlugin.render(&fixture.ctx()).unwrap();
        assert_eq!(ops[0].opacity, 0.5);
        let rotation = ops[0].rotation.unwrap();
        assert_eq!(rotation.degrees, 90.0);
        assert_eq!((rotation.pivot.x, rotation.pivot.y), (20.0, 15.0));
    }
}
