use crate::TemplateError;
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use stencil_types::{Padding, Size};

/// Blank base page: every template page gets the same size and padding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlankPdf {
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub padding: Padding,
}

impl BlankPdf {
    pub fn a4() -> Self {
        Self {
            width: 210.0,
            height: 297.0,
            padding: Padding::default(),
        }
    }
}

/// Source of page geometry for a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BasePdf {
    Blank(BlankPdf),
    /// A pre-existing base document, described by the size of each of its pages.
    #[serde(rename_all = "camelCase")]
    Custom { page_sizes: Vec<Size> },
}

impl Default for BasePdf {
    fn default() -> Self {
        BasePdf::Blank(BlankPdf::a4())
    }
}

impl BasePdf {
    pub fn is_blank(&self) -> bool {
        matches!(self, BasePdf::Blank(_))
    }

    /// Page geometry for the given template page index, if the base provides one.
    pub fn page_geometry(&self, page_index: usize) -> Option<PageGeometry> {
        match self {
            BasePdf::Blank(blank) => Some(PageGeometry {
                width: blank.width,
                height: blank.height,
                padding: blank.padding,
            }),
            BasePdf::Custom { page_sizes } => page_sizes.get(page_index).map(|size| PageGeometry {
                width: size.width,
                height: size.height,
                padding: Padding::default(),
            }),
        }
    }

    /// Number of base pages, or `None` when any number of pages is allowed.
    pub fn page_limit(&self) -> Option<usize> {
        match self {
            BasePdf::Blank(_) => None,
            BasePdf::Custom { page_sizes } => Some(page_sizes.len()),
        }
    }
}

/// Resolved size and padding of one physical page, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    pub padding: Padding,
}

impl PageGeometry {
    pub fn content_height(&self) -> f64 {
        (self.height - self.padding.top - self.padding.bottom).max(0.0)
    }

    pub fn content_width(&self) -> f64 {
        (self.width - self.padding.left - self.padding.right).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub base_pdf: BasePdf,
    pub schemas: Vec<Vec<Schema>>,
}

impl Template {
    pub fn from_json(source: &str) -> Result<Self, TemplateError> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TemplateError> {
        let path = path.as_ref();
        let template = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::debug!(
            "Loaded template {} with {} page(s)",
            path.display(),
            template.page_count()
        );
        Ok(template)
    }

    pub fn page_count(&self) -> usize {
        self.schemas.len()
    }

    /// All schemas in page order, then declaration order.
    pub fn all_schemas(&self) -> impl Iterator<Item = (usize, &Schema)> {
        self.schemas
            .iter()
            .enumerate()
            .flat_map(|(page, schemas)| schemas.iter().map(move |s| (page, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blank_base() {
        let template = Template::from_json(
            r#"{
                "basePdf": { "width": 210, "height": 297, "padding": [10, 10, 10, 10] },
                "schemas": [[{ "name": "a", "type": "text" }]]
            }"#,
        )
        .unwrap();
        let geometry = template.base_pdf.page_geometry(5).unwrap();
        assert_eq!(geometry.width, 210.0);
        assert_eq!(geometry.content_height(), 277.0);
        assert_eq!(template.base_pdf.page_limit(), None);
    }

    #[test]
    fn parses_custom_base_page_sizes() {
        let template = Template::from_json(
            r#"{
                "basePdf": { "pageSizes": [{ "width": 100, "height": 200 }] },
                "schemas": [[], []]
            }"#,
        )
        .unwrap();
        assert!(!template.base_pdf.is_blank());
        assert_eq!(template.base_pdf.page_geometry(0).unwrap().height, 200.0);
        assert!(template.base_pdf.page_geometry(1).is_none());
        assert_eq!(template.base_pdf.page_limit(), Some(1));
    }

    #[test]
    fn missing_base_defaults_to_a4() {
        let template = Template::from_json(r#"{ "schemas": [] }"#).unwrap();
        assert_eq!(template.base_pdf, BasePdf::Blank(BlankPdf::a4()));
    }
}
