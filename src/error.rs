use stencil_layout::LayoutError;
use stencil_plugins::PluginError;
use stencil_render_core::RenderError;
use stencil_template_core::{TemplateError, ValidationReport};
use thiserror::Error;

/// Everything that can stop a generation call. A call either returns complete
/// output or exactly one of these.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Validation failed with {count} error(s):\n{0}", count = .0.errors().count())]
    Validation(ValidationReport),

    #[error("Unknown schema type '{kind}' for '{schema}' on page {page}")]
    UnknownSchemaType {
        kind: String,
        schema: String,
        page: usize,
    },

    #[error("Schema '{schema}' on page {page} failed: {source}")]
    Schema {
        schema: String,
        page: usize,
        #[source]
        source: PluginError,
    },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generator is not configured correctly: {0}")]
    Config(String),
}

impl From<serde_json::Error> for GenerateError {
    fn from(e: serde_json::Error) -> Self {
        GenerateError::Template(TemplateError::ParseError(e))
    }
}
