//! stencil: position-based document templates rendered to PDF.
//!
//! A [`Template`] places typed schema instances on pages. For every input
//! record the [`Generator`] validates, measures data-dependent heights,
//! paginates, renders each schema through its plugin and hands the ordered
//! draw operations to a [`DocumentSink`].
//!
//! ```no_run
//! use stencil::{GeneratorBuilder, inputs_from_json};
//!
//! # fn main() -> Result<(), stencil::GenerateError> {
//! let generator = GeneratorBuilder::new()
//!     .with_template_file("invoice.json")?
//!     .build()?;
//! let inputs = inputs_from_json(r#"[{ "customer": "ACME" }]"#)?;
//! generator.generate_to_file(&inputs, "invoice.pdf")?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod generator;

pub use config::{GeneratorOptions, PaginationMode};
pub use error::GenerateError;
pub use generator::{
    Generator, GeneratorBuilder, RenderedPage, RenderedSchema, inputs_from_json,
};

pub use stencil_layout::{FontSet, LayoutCache};
pub use stencil_plugins::{Plugin, PluginError, PluginRegistry, RenderContext};
pub use stencil_render_core::{DocumentSink, DrawOp, Primitive};
pub use stencil_render_lopdf::LopdfSink;
pub use stencil_resource::{ImageDimensions, ResourceError, probe_data_uri, probe_dimensions};
pub use stencil_template_core::{
    BasePdf, FieldValue, InputRecord, Schema, Template, ValidationReport, Violation,
    ViolationKind,
};
pub use stencil_types::units;
