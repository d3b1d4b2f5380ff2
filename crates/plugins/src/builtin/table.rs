//! `table`: measured by the layout engine, split across pages by `bodyRange`.

use super::text::{LineStyle, draw_lines};
use super::{finish, parse_color, props_schema};
use crate::{Plugin, PluginError, RenderContext};
use stencil_layout::table::Sides;
use stencil_layout::{
    Alignment, CellStyle, FontSet, RowLayout, RowSplit, TableProps, dynamic_table_heights, table_layout,
};
use stencil_render_core::{DrawOp, Primitive, ShapeStyle};
use stencil_template_core::Schema;
use stencil_types::{Color, Position, Rect};

pub struct TablePlugin;

/// Where one row goes and how it looks.
struct RowPlacement<'a> {
    x: f64,
    y: f64,
    col_widths: &'a [f64],
    style: &'a CellStyle,
    background: Option<Color>,
}

fn draw_row(
    out: &mut Vec<Primitive>,
    row: &RowLayout,
    at: &RowPlacement,
    fonts: &FontSet,
    alignment: impl Fn(usize) -> Alignment,
) {
    let total_width: f64 = at.col_widths.iter().sum();
    if let Some(background) = at.background {
        out.push(Primitive::Rectangle {
            rect: Rect::new(at.x, at.y, total_width, row.height),
            style: ShapeStyle::filled(background),
            radius: 0.0,
        });
    }

    let style = at.style;
    let pad = style.padding;
    let font = fonts.resolve(style.font_name.as_deref());
    let color = parse_color(&style.font_color).unwrap_or(Color::BLACK);

    let cells = || {
        at.col_widths.iter().scan(at.x, |x, width| {
            let cell = Rect::new(*x, at.y, *width, row.height);
            *x += width;
            Some(cell)
        })
    };

    for (column, (cell, layout)) in cells().zip(&row.cells).enumerate() {
        let inner = Rect::new(
            cell.x + pad.left,
            cell.y + pad.top,
            (cell.width - pad.left - pad.right).max(0.0),
            (cell.height - pad.top - pad.bottom).max(0.0),
        );
        let line_style = LineStyle {
            font,
            size: style.font_size,
            color,
            char_spacing: style.character_spacing,
            line_height: style.line_height,
            alignment: alignment(column),
            vertical_alignment: style.vertical_alignment,
        };
        draw_lines(out, &layout.lines, inner, &line_style);
    }

    if let Some(border) = parse_color(&style.border_color) {
        for cell in cells() {
            cell_borders(out, cell, style.border_width, border);
        }
    }
}

fn cell_borders(out: &mut Vec<Primitive>, cell: Rect, widths: Sides, color: Color) {
    let (left, top, right, bottom) = (cell.x, cell.y, cell.right(), cell.bottom());
    let edges = [
        (widths.top, (left, top), (right, top)),
        (widths.right, (right, top), (right, bottom)),
        (widths.bottom, (left, bottom), (right, bottom)),
        (widths.left, (left, top), (left, bottom)),
    ];
    for (width, from, to) in edges {
        if width > 0.0 {
            out.push(Primitive::Line {
                from: Position::new(from.0, from.1),
                to: Position::new(to.0, to.1),
                width,
                color,
            });
        }
    }
}

impl Plugin for TablePlugin {
    fn type_name(&self) -> &'static str {
        "table"
    }

    fn default_schema(&self) -> Schema {
        let props = TableProps {
            head: vec!["Name".into(), "City".into(), "Description".into()],
            head_width_percentages: vec![30.0, 30.0, 40.0],
            ..TableProps::default()
        };
        props_schema(self.type_name(), 150.0, 20.0, &props)
    }

    /// Header (when shown) and the rows of `bodyRange`, each drawn as
    /// backgrounds, then text, then borders, inside the outer frame.
    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError> {
        let schema = ctx.schema;
        let rows = ctx.value.rows(&schema.name)?;
        let props = TableProps::from_schema(schema)?;
        let layout = table_layout(ctx.cache, schema, &props, &rows, ctx.fonts)?;
        let range = schema.body_range.unwrap_or_default().resolve(layout.body.len());

        let top = schema.position.y;
        let mut y = top;
        let mut primitives = Vec::new();

        if props.show_head {
            if let Some(head) = &layout.head {
                let at = RowPlacement {
                    x: schema.position.x,
                    y,
                    col_widths: &layout.col_widths,
                    style: &props.head_styles,
                    background: parse_color(&props.head_styles.background_color),
                };
                draw_row(&mut primitives, head, &at, ctx.fonts, |_| props.head_styles.alignment);
                y += head.height;
            }
        }

        let body = &props.body_styles;
        for index in range {
            let row = &layout.body[index];
            let background = if index % 2 == 1 {
                parse_color(&body.alternate_background_color)
                    .or_else(|| parse_color(&body.background_color))
            } else {
                parse_color(&body.background_color)
            };
            let at = RowPlacement {
                x: schema.position.x,
                y,
                col_widths: &layout.col_widths,
                style: body,
                background,
            };
            draw_row(&mut primitives, row, &at, ctx.fonts, |column| props.body_alignment(column));
            y += row.height;
        }

        let frame = &props.table_styles;
        if let Some(color) = parse_color(&frame.border_color) {
            if frame.border_width > 0.0 && y > top {
                primitives.push(Primitive::Rectangle {
                    rect: Rect::new(schema.position.x, top, layout.total_width(), y - top),
                    style: ShapeStyle::stroked(color, frame.border_width),
                    radius: 0.0,
                });
            }
        }

        Ok(finish(schema, primitives))
    }

    fn dynamic_heights(&self, ctx: &RenderContext) -> Result<Option<Vec<f64>>, PluginError> {
        let rows = ctx.value.rows(&ctx.schema.name)?;
        let heights = dynamic_table_heights(ctx.cache, ctx.schema, &rows, ctx.page, ctx.fonts)?;
        Ok(Some(heights))
    }

    fn row_split(&self, schema: &Schema) -> Result<Option<RowSplit>, PluginError> {
        let props = TableProps::from_schema(schema)?;
        Ok(Some(RowSplit {
            first_row: schema.body_range.map_or(0, |range| range.start),
            show_head: props.show_head,
            repeat_head: props.repeat_head,
        }))
    }
}
