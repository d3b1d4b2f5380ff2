//! Table measurement: column widths, wrapped cell text and row heights.
//!
//! A table's layout depends only on its width, head, styles and rows. The
//! instance's position, height and `bodyRange` are not part of the cache key,
//! so the planning pass, every split continuation and the draw pass all share
//! one computation.

use crate::LayoutError;
use crate::cache::{LayoutCache, cache_key, domain};
use crate::fonts::FontSet;
use crate::text::{Alignment, TextMetrics, VerticalAlignment, wrap_text};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;
use stencil_template_core::{PageGeometry, Schema};
use stencil_types::units::mm2pt;

/// Per-side values in millimetres. Accepts a single number for all sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "SidesDef")]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SidesDef {
    Uniform(f64),
    Each {
        #[serde(default)]
        top: f64,
        #[serde(default)]
        right: f64,
        #[serde(default)]
        bottom: f64,
        #[serde(default)]
        left: f64,
    },
}

impl From<SidesDef> for Sides {
    fn from(def: SidesDef) -> Self {
        match def {
            SidesDef::Uniform(v) => Sides::uniform(v),
            SidesDef::Each {
                top,
                right,
                bottom,
                left,
            } => Sides {
                top,
                right,
                bottom,
                left,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CellStyle {
    pub font_name: Option<String>,
    /// Points.
    pub font_size: f64,
    pub character_spacing: f64,
    pub alignment: Alignment,
    pub vertical_alignment: VerticalAlignment,
    pub font_color: String,
    pub background_color: String,
    /// Body rows only: fill for every second row.
    pub alternate_background_color: String,
    pub line_height: f64,
    pub border_color: String,
    pub border_width: Sides,
    pub padding: Sides,
}

impl Default for CellStyle {
    fn default() -> Self {
        Self {
            font_name: None,
            font_size: 13.0,
            character_spacing: 0.0,
            alignment: Alignment::Left,
            vertical_alignment: VerticalAlignment::Middle,
            font_color: "#000000".into(),
            background_color: String::new(),
            alternate_background_color: String::new(),
            line_height: 1.0,
            border_color: "#888888".into(),
            border_width: Sides::uniform(0.1),
            padding: Sides::uniform(5.0),
        }
    }
}

impl CellStyle {
    pub fn head_default() -> Self {
        Self {
            font_color: "#ffffff".into(),
            background_color: "#2980ba".into(),
            border_color: String::new(),
            border_width: Sides::default(),
            ..Self::default()
        }
    }

    pub fn body_default() -> Self {
        Self {
            alternate_background_color: "#f5f5f5".into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableStyles {
    pub border_color: String,
    /// Outer frame width in millimetres.
    pub border_width: f64,
}

impl Default for TableStyles {
    fn default() -> Self {
        Self {
            border_color: "#000000".into(),
            border_width: 0.3,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnStyles {
    /// Column index (as a string key) to alignment override.
    pub alignment: BTreeMap<String, Alignment>,
}

impl ColumnStyles {
    pub fn alignment_for(&self, column: usize) -> Option<Alignment> {
        self.alignment.get(&column.to_string()).copied()
    }
}

fn default_true() -> bool {
    true
}

fn default_head_styles() -> CellStyle {
    CellStyle::head_default()
}

fn default_body_styles() -> CellStyle {
    CellStyle::body_default()
}

/// Type-specific properties of a `table` schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProps {
    #[serde(default = "default_true")]
    pub show_head: bool,
    /// Repeat the header row on every continuation page.
    #[serde(default)]
    pub repeat_head: bool,
    #[serde(default)]
    pub head: Vec<String>,
    #[serde(default)]
    pub head_width_percentages: Vec<f64>,
    #[serde(default)]
    pub table_styles: TableStyles,
    #[serde(default = "default_head_styles")]
    pub head_styles: CellStyle,
    #[serde(default = "default_body_styles")]
    pub body_styles: CellStyle,
    #[serde(default)]
    pub column_styles: ColumnStyles,
}

impl Default for TableProps {
    fn default() -> Self {
        Self {
            show_head: true,
            repeat_head: false,
            head: Vec::new(),
            head_width_percentages: Vec::new(),
            table_styles: TableStyles::default(),
            head_styles: CellStyle::head_default(),
            body_styles: CellStyle::body_default(),
            column_styles: ColumnStyles::default(),
        }
    }
}

impl TableProps {
    pub fn from_schema(schema: &Schema) -> Result<Self, LayoutError> {
        Ok(schema.props_as()?)
    }

    /// Alignment for a body cell: column override, then the body style.
    pub fn body_alignment(&self, column: usize) -> Alignment {
        self.column_styles
            .alignment_for(column)
            .unwrap_or(self.body_styles.alignment)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CellLayout {
    pub lines: Vec<String>,
    /// Millimetres, padding included.
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout {
    pub cells: Vec<CellLayout>,
    /// Tallest cell of the row, in millimetres.
    pub height: f64,
}

/// Full measurement of one table value. Independent of `bodyRange`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub col_widths: Vec<f64>,
    pub head: Option<RowLayout>,
    pub body: Vec<RowLayout>,
}

impl TableLayout {
    pub fn head_height(&self) -> f64 {
        self.head.as_ref().map_or(0.0, |h| h.height)
    }

    pub fn total_width(&self) -> f64 {
        self.col_widths.iter().sum()
    }
}

/// Splits `width` between columns by `headWidthPercentages`. Columns without
/// a percentage share whatever is left equally.
pub fn resolve_column_widths(width: f64, percentages: &[f64], columns: usize) -> Vec<f64> {
    let columns = columns.max(1);
    let given: Vec<f64> = percentages.iter().take(columns).copied().collect();
    let given_total: f64 = given.iter().sum();
    let missing = columns - given.len();
    let share = if missing > 0 {
        (100.0 - given_total).max(0.0) / missing as f64
    } else {
        0.0
    };

    (0..columns)
        .map(|i| width * given.get(i).copied().unwrap_or(share) / 100.0)
        .collect()
}

fn measure_row(
    cells: &[String],
    col_widths: &[f64],
    style: &CellStyle,
    fonts: &FontSet,
) -> RowLayout {
    let font = fonts.resolve(style.font_name.as_deref());
    let metrics = TextMetrics {
        font,
        size: style.font_size,
        char_spacing: style.character_spacing,
        line_height: style.line_height,
    };
    let vertical_padding = style.padding.top + style.padding.bottom;

    let cells: Vec<CellLayout> = col_widths
        .iter()
        .enumerate()
        .map(|(column, col_width)| {
            let text = cells.get(column).map(String::as_str).unwrap_or("");
            let inner = (col_width - style.padding.left - style.padding.right).max(0.0);
            let lines = wrap_text(text, mm2pt(inner), &metrics);
            let height = lines.len() as f64 * metrics.line_box_mm() + vertical_padding;
            CellLayout { lines, height }
        })
        .collect();

    let height = cells.iter().map(|c| c.height).fold(0.0, f64::max);
    RowLayout { cells, height }
}

/// Measures every row of a table, ignoring `bodyRange`.
pub fn compute_table_layout(
    width: f64,
    props: &TableProps,
    rows: &[Vec<String>],
    fonts: &FontSet,
) -> TableLayout {
    let columns = rows
        .iter()
        .map(Vec::len)
        .chain([props.head.len(), props.head_width_percentages.len()])
        .max()
        .unwrap_or(0);
    let col_widths = resolve_column_widths(width, &props.head_width_percentages, columns);

    let head = (!props.head.is_empty())
        .then(|| measure_row(&props.head, &col_widths, &props.head_styles, fonts));
    let body = rows
        .iter()
        .map(|row| measure_row(row, &col_widths, &props.body_styles, fonts))
        .collect();

    TableLayout {
        col_widths,
        head,
        body,
    }
}

fn layout_key(schema: &Schema, props: &TableProps, rows: &[Vec<String>]) -> Result<u64, LayoutError> {
    let styles = serde_json::to_string(&(
        &props.head,
        &props.head_width_percentages,
        &props.head_styles,
        &props.body_styles,
    ))
    .map_err(|e| LayoutError::Generic(e.to_string()))?;
    Ok(cache_key(
        domain::TABLE,
        &(&schema.name, schema.width.to_bits(), styles, rows),
    ))
}

/// Memoised [`compute_table_layout`] for one schema and value.
pub fn table_layout(
    cache: &LayoutCache,
    schema: &Schema,
    props: &TableProps,
    rows: &[Vec<String>],
    fonts: &FontSet,
) -> Result<Rc<TableLayout>, LayoutError> {
    let key = layout_key(schema, props, rows)?;
    cache.get_or_try_insert_with(key, || {
        log::debug!(
            "Measuring table '{}' ({} rows)",
            schema.name,
            rows.len()
        );
        Ok(compute_table_layout(schema.width, props, rows, fonts))
    })
}

/// Heights of the rows this table instance renders.
///
/// With `showHead` the first element is the header height; without it the
/// first element is a `0` placeholder so positions line up either way. An
/// instance with no data rows yields just the header height, or nothing when
/// the header is hidden.
pub fn dynamic_table_heights(
    cache: &LayoutCache,
    schema: &Schema,
    rows: &[Vec<String>],
    page: &PageGeometry,
    fonts: &FontSet,
) -> Result<Vec<f64>, LayoutError> {
    let props = TableProps::from_schema(schema)?;
    let layout = table_layout(cache, schema, &props, rows, fonts)?;
    let range = schema
        .body_range
        .unwrap_or_default()
        .resolve(layout.body.len());

    let body = layout.body[range.clone()].iter().map(|row| row.height);
    let heights: Vec<f64> = match (props.show_head, range.is_empty()) {
        (true, _) => std::iter::once(layout.head_height()).chain(body).collect(),
        (false, true) => Vec::new(),
        (false, false) => std::iter::once(0.0).chain(body).collect(),
    };

    let content_height = page.content_height();
    if let Some(tallest) = heights.iter().copied().reduce(f64::max) {
        if tallest > content_height {
            log::warn!(
                "Table '{}' has a row of {:.2}mm, taller than the page content area of {:.2}mm",
                schema.name,
                tallest,
                content_height
            );
        }
    }

    let heights_key = cache_key(
        domain::TABLE_HEIGHTS,
        &(layout_key(schema, &props, rows)?, range.start, range.end, props.show_head),
    );
    cache.record_heights(heights_key, &heights)?;
    Ok(heights)
}
