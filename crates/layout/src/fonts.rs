//! Font set and metrics used for measuring text.
//!
//! Font discovery is the caller's job: faces are registered with raw
//! TrueType/OpenType bytes. The standard `Helvetica` face is always present and
//! measured with built-in metrics, so a template renders without any font files.
//!
//! Text is encoded as single-byte Latin-1/WinAnsi by the output sink, so widths
//! are tabulated for codes 32..=255 and every other character is measured as
//! the `?` it will be drawn as.

use crate::LayoutError;
use std::collections::BTreeMap;
use std::sync::Arc;
use stencil_template_core::FontCatalog;

pub const DEFAULT_FONT: &str = "Helvetica";

const FIRST_CODE: u32 = 32;
const LAST_CODE: u32 = 255;

const HELVETICA_ASCENT: f64 = 718.0;
const HELVETICA_DESCENT: f64 = -207.0;

/// Approximate Helvetica advance widths (1/1000 em) for WinAnsi codes 32..=255.
fn helvetica_widths() -> Vec<f64> {
    (FIRST_CODE..=LAST_CODE)
        .map(|code| match code {
            32 => 278.0,                          // space
            33..=47 => 333.0,                     // punctuation
            48..=57 => 556.0,                     // digits
            58..=64 => 333.0,                     // more punctuation
            73 | 74 => 278.0,                     // I J
            77 => 833.0,                          // M
            87 => 944.0,                          // W
            65..=90 => 667.0,                     // uppercase average
            91..=96 => 333.0,                     // brackets etc.
            102 | 105 | 106 | 108 | 116 => 278.0, // f i j l t
            109 | 119 => 833.0,                   // m w
            97..=122 => 556.0,                    // lowercase average
            _ => 556.0,
        })
        .collect()
}

#[derive(Debug, Clone)]
enum FontSource {
    Standard,
    TrueType(Arc<Vec<u8>>),
}

/// A registered face with precomputed WinAnsi metrics.
#[derive(Debug, Clone)]
pub struct FontFace {
    pub name: String,
    source: FontSource,
    widths_1000: Vec<f64>,
    ascent_1000: f64,
    descent_1000: f64,
}

impl FontFace {
    fn standard(name: &str) -> Self {
        Self {
            name: name.to_string(),
            source: FontSource::Standard,
            widths_1000: helvetica_widths(),
            ascent_1000: HELVETICA_ASCENT,
            descent_1000: HELVETICA_DESCENT,
        }
    }

    fn truetype(name: &str, data: Vec<u8>) -> Result<Self, LayoutError> {
        let face = ttf_parser::Face::parse(&data, 0)
            .map_err(|e| LayoutError::InvalidFont(name.to_string(), e.to_string()))?;
        let units = face.units_per_em() as f64;
        let scale = 1000.0 / units;

        let widths_1000 = (FIRST_CODE..=LAST_CODE)
            .map(|code| {
                char::from_u32(code)
                    .and_then(|ch| face.glyph_index(ch))
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| adv as f64 * scale)
                    .unwrap_or(500.0)
            })
            .collect();
        let ascent_1000 = face.ascender() as f64 * scale;
        let descent_1000 = face.descender() as f64 * scale;

        Ok(Self {
            name: name.to_string(),
            source: FontSource::TrueType(Arc::new(data)),
            widths_1000,
            ascent_1000,
            descent_1000,
        })
    }

    /// Raw font program, `None` for the standard face.
    pub fn data(&self) -> Option<&Arc<Vec<u8>>> {
        match &self.source {
            FontSource::Standard => None,
            FontSource::TrueType(data) => Some(data),
        }
    }

    pub fn is_standard(&self) -> bool {
        matches!(self.source, FontSource::Standard)
    }

    /// Advance widths in 1/1000 em for WinAnsi codes 32..=255.
    pub fn winansi_widths(&self) -> &[f64] {
        &self.widths_1000
    }

    pub fn char_width_1000(&self, ch: char) -> f64 {
        let code = ch as u32;
        if code < FIRST_CODE {
            return 0.0;
        }
        let code = if code > LAST_CODE { '?' as u32 } else { code };
        self.widths_1000[(code - FIRST_CODE) as usize]
    }

    /// Width of `text` in points, including `char_spacing` between characters.
    pub fn text_width(&self, text: &str, size: f64, char_spacing: f64) -> f64 {
        let mut count = 0usize;
        let glyphs: f64 = text
            .chars()
            .inspect(|_| count += 1)
            .map(|ch| self.char_width_1000(ch))
            .sum();
        glyphs * size / 1000.0 + char_spacing * count.saturating_sub(1) as f64
    }

    /// Distance from the top of the em box to the baseline, in points.
    pub fn ascent(&self, size: f64) -> f64 {
        self.ascent_1000 * size / 1000.0
    }

    /// Negative distance below the baseline, in points.
    pub fn descent(&self, size: f64) -> f64 {
        self.descent_1000 * size / 1000.0
    }

    pub fn ascent_1000(&self) -> f64 {
        self.ascent_1000
    }

    pub fn descent_1000(&self) -> f64 {
        self.descent_1000
    }
}

/// The named faces available to one generation call.
#[derive(Debug, Clone)]
pub struct FontSet {
    faces: BTreeMap<String, FontFace>,
    fallback: String,
    standard: FontFace,
}

impl Default for FontSet {
    fn default() -> Self {
        let mut faces = BTreeMap::new();
        faces.insert(DEFAULT_FONT.to_string(), FontFace::standard(DEFAULT_FONT));
        Self {
            faces,
            fallback: DEFAULT_FONT.to_string(),
            standard: FontFace::standard(DEFAULT_FONT),
        }
    }
}

impl FontSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a TrueType/OpenType face under `name`, replacing any previous one.
    pub fn add_font(&mut self, name: impl Into<String>, data: Vec<u8>) -> Result<(), LayoutError> {
        let name = name.into();
        let face = FontFace::truetype(&name, data)?;
        log::debug!("Registered font '{}'", name);
        self.faces.insert(name, face);
        Ok(())
    }

    /// Face used when a schema names no font or an unknown one.
    pub fn set_fallback(&mut self, name: &str) -> Result<(), LayoutError> {
        if !self.faces.contains_key(name) {
            return Err(LayoutError::Generic(format!(
                "Fallback font '{}' is not registered",
                name
            )));
        }
        self.fallback = name.to_string();
        Ok(())
    }

    pub fn fallback(&self) -> &FontFace {
        self.faces.get(&self.fallback).unwrap_or(&self.standard)
    }

    pub fn resolve(&self, name: Option<&str>) -> &FontFace {
        name.and_then(|n| self.faces.get(n))
            .unwrap_or_else(|| self.fallback())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.faces.contains_key(name)
    }

    pub fn faces(&self) -> impl Iterator<Item = &FontFace> {
        self.faces.values()
    }
}

impl FontCatalog for FontSet {
    fn contains_font(&self, name: &str) -> bool {
        self.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_face_is_always_present() {
        let fonts = FontSet::new();
        assert!(fonts.contains(DEFAULT_FONT));
        assert!(fonts.resolve(None).is_standard());
        assert_eq!(fonts.resolve(Some("Nope")).name, DEFAULT_FONT);
    }

    #[test]
    fn measures_with_spacing() {
        let face = FontSet::new().resolve(None).clone();
        // "ab" = 556 + 556 at 10pt
        assert!((face.text_width("ab", 10.0, 0.0) - 11.12).abs() < 1e-9);
        assert!((face.text_width("ab", 10.0, 1.0) - 12.12).abs() < 1e-9);
        assert_eq!(face.text_width("", 10.0, 5.0), 0.0);
    }

    #[test]
    fn non_latin_measures_as_question_mark() {
        let face = FontSet::new().resolve(None).clone();
        assert_eq!(face.char_width_1000('漢'), face.char_width_1000('?'));
    }

    #[test]
    fn rejects_garbage_font_data() {
        let mut fonts = FontSet::new();
        assert!(matches!(
            fonts.add_font("Broken", vec![0, 1, 2, 3]),
            Err(LayoutError::InvalidFont(..))
        ));
        assert!(fonts.set_fallback("Broken").is_err());
    }
}
