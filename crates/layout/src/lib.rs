use stencil_template_core::TemplateError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Cache inconsistency for key {key:#018x}: previously {previous:?}, now {current:?}.")]
    CacheInconsistency {
        key: u64,
        previous: Vec<f64>,
        current: Vec<f64>,
    },
    #[error("Font '{0}' could not be parsed: {1}")]
    InvalidFont(String, String),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Generic layout error: {0}")]
    Generic(String),
}

pub mod cache;
pub mod fonts;
pub mod pagination;
pub mod table;
pub mod text;

pub use self::cache::{CacheStats, LayoutCache};
pub use self::fonts::{DEFAULT_FONT, FontFace, FontSet};
pub use self::pagination::{PlannedSchema, RowSplit, paginate};
pub use self::table::{
    CellLayout, CellStyle, RowLayout, TableLayout, TableProps, dynamic_table_heights, table_layout,
};
pub use self::text::{Alignment, FitMode, TextMetrics, VerticalAlignment, fit_font_size, wrap_text};
