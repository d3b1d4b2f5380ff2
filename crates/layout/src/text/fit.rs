use super::wrapper::{TextMetrics, wrap_text};
use serde::{Deserialize, Serialize};

const STEP: f64 = 0.25;

/// Which box dimension a dynamically sized font must respect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Lines may not wrap; the longest line must fit the box width.
    #[default]
    Horizontal,
    /// Lines wrap; the wrapped block must fit the box height.
    Vertical,
}

/// Largest font size in `[min, max]` (in 0.25pt steps) for which the text fits
/// the box. Falls back to `min` when nothing fits.
pub fn fit_font_size(
    text: &str,
    box_width_pt: f64,
    box_height_pt: f64,
    base: &TextMetrics,
    min: f64,
    max: f64,
    mode: FitMode,
) -> f64 {
    let mut size = max.max(min);
    while size > min {
        let metrics = TextMetrics { size, ..*base };
        if fits(text, box_width_pt, box_height_pt, &metrics, mode) {
            return size;
        }
        size -= STEP;
    }
    min
}

fn fits(text: &str, width: f64, height: f64, metrics: &TextMetrics, mode: FitMode) -> bool {
    match mode {
        FitMode::Horizontal => {
            let paragraphs: Vec<&str> = text.split('\n').collect();
            let widest = paragraphs
                .iter()
                .map(|p| metrics.width(p))
                .fold(0.0, f64::max);
            widest <= width && paragraphs.len() as f64 * metrics.line_box_pt() <= height
        }
        FitMode::Vertical => {
            let lines = wrap_text(text, width, metrics);
            lines.len() as f64 * metrics.line_box_pt() <= height
        }
    }
}
