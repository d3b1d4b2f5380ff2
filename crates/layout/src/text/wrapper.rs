use crate::fonts::FontFace;
use stencil_types::units::pt2mm;

// Tolerance for floating point noise when comparing widths.
const EPSILON: f64 = 1e-6;

/// Font, size and spacing used to measure one block of text.
#[derive(Debug, Clone, Copy)]
pub struct TextMetrics<'a> {
    pub font: &'a FontFace,
    /// Font size in points.
    pub size: f64,
    /// Extra space between characters, in points.
    pub char_spacing: f64,
    /// Line box as a multiple of the font size.
    pub line_height: f64,
}

impl<'a> TextMetrics<'a> {
    pub fn new(font: &'a FontFace, size: f64) -> Self {
        Self {
            font,
            size,
            char_spacing: 0.0,
            line_height: 1.0,
        }
    }

    pub fn width(&self, text: &str) -> f64 {
        self.font.text_width(text, self.size, self.char_spacing)
    }

    pub fn line_box_pt(&self) -> f64 {
        self.size * self.line_height
    }

    pub fn line_box_mm(&self) -> f64 {
        pt2mm(self.line_box_pt())
    }
}

/// Greedy word wrapping. Explicit newlines always start a new line, and a
/// word wider than the line is broken between characters. Always returns at
/// least one (possibly empty) line.
pub fn wrap_text(text: &str, max_width_pt: f64, metrics: &TextMetrics) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        let mut current = String::new();

        for (i, word) in paragraph.split(' ').enumerate() {
            let candidate = if i == 0 {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if metrics.width(&candidate) <= max_width_pt + EPSILON {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = if metrics.width(word) > max_width_pt + EPSILON {
                break_word(word, max_width_pt, metrics, &mut lines)
            } else {
                word.to_string()
            };
        }
        lines.push(current);
    }
    lines
}

fn break_word(word: &str, max_width_pt: f64, metrics: &TextMetrics, lines: &mut Vec<String>) -> String {
    let mut current = String::new();
    for ch in word.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);
        if !current.is_empty() && metrics.width(&candidate) > max_width_pt + EPSILON {
            lines.push(std::mem::replace(&mut current, ch.to_string()));
        } else {
            current = candidate;
        }
    }
    current
}
