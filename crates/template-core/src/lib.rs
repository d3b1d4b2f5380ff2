//! Core data model for position-based document templates.
//!
//! A [`Template`] is an ordered list of pages, each holding [`Schema`]
//! instances in declaration order. One [`InputRecord`] populates one
//! generated document. This crate also provides the structural validator
//! ([`validate`]) and read-only placeholder substitution ([`placeholders`]).
//!
//! ## Key Abstractions
//!
//! - **`Template` / `BasePdf`**: page list plus page geometry source
//! - **`Schema`**: one placed field, common geometry plus typed properties
//! - **`FieldValue`**: the raw value a record supplies for a schema
//! - **`SchemaCatalog`**: what the validator needs to know about field types

use thiserror::Error;

pub mod input;
pub mod placeholders;
pub mod schema;
pub mod template;
pub mod validate;

pub use input::{FieldValue, InputRecord};
pub use placeholders::{PlaceholderVars, replace_placeholders};
pub use schema::{BodyRange, Schema};
pub use template::{BasePdf, BlankPdf, PageGeometry, Template};
pub use validate::{
    FontCatalog, SchemaCatalog, Severity, ValidationReport, Validator, Violation, ViolationKind,
};

/// Errors that can occur while loading or interpreting a template.
#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid properties for schema '{name}': {message}")]
    InvalidProps { name: String, message: String },

    #[error("Invalid table value for schema '{name}': {message}")]
    InvalidTableValue { name: String, message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
