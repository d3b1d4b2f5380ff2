//! Line breaking and font-size fitting for plain text boxes.

use serde::{Deserialize, Serialize};

pub mod fit;
pub mod wrapper;

pub use fit::{FitMode, fit_font_size};
pub use wrapper::{TextMetrics, wrap_text};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}
