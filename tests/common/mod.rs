#![allow(dead_code)]

pub mod fixtures;
pub mod pdf_assertions;

use chrono::{NaiveDate, NaiveDateTime};
use lopdf::Document as LopdfDocument;
use stencil::{GenerateError, Generator, GeneratorBuilder, InputRecord, Template};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Wrapper around a generated PDF with helper methods
pub struct GeneratedPdf {
    pub bytes: Vec<u8>,
    pub doc: LopdfDocument,
}

impl GeneratedPdf {
    /// Create a GeneratedPdf from raw bytes
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, Box<dyn std::error::Error>> {
        let doc = LopdfDocument::load_mem(&bytes)?;
        Ok(Self { bytes, doc })
    }

    /// Get the number of pages in the PDF
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Text shown on each page, one string per `Tj`.
    pub fn page_texts(&self) -> Result<Vec<Vec<String>>, Box<dyn std::error::Error>> {
        pdf_assertions::shown_text(&self.doc)
    }

    /// Save PDF to a file for manual debugging
    pub fn save_for_debug(&self, name: &str) -> std::io::Result<()> {
        std::fs::write(format!("test_output_{}.pdf", name), &self.bytes)
    }
}

/// A fixed clock so output bytes and date placeholders are reproducible.
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 9)
        .and_then(|d| d.and_hms_opt(14, 5, 0))
        .unwrap_or_default()
}

/// A generator for `template` with the built-in plugins and a pinned clock.
pub fn generator(template: Template) -> Result<Generator, GenerateError> {
    GeneratorBuilder::new()
        .with_template(template)
        .with_now(fixed_now())
        .build()
}

/// Generate a PDF and load it back
pub fn generate_pdf(
    template: Template,
    inputs: &[InputRecord],
) -> Result<GeneratedPdf, Box<dyn std::error::Error>> {
    let bytes = generator(template)?.generate_pdf(inputs)?;
    GeneratedPdf::from_bytes(bytes)
}
