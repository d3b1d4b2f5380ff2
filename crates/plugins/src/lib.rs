//! Field-type plugins.
//!
//! A [`Plugin`] turns one schema instance and its resolved value into draw
//! operations. The [`PluginRegistry`] maps `schema.type` to a plugin for one
//! generation call; [`PluginRegistry::builtin`] carries every type shipped
//! with stencil.

use stencil_layout::{FontSet, LayoutCache, LayoutError, RowSplit};
use stencil_render_core::DrawOp;
use stencil_resource::ResourceError;
use stencil_template_core::{FieldValue, PageGeometry, Schema, TemplateError};
use thiserror::Error;

pub mod builtin;
mod registry;

pub use registry::PluginRegistry;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Unknown schema type '{0}'")]
    UnknownSchemaType(String),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("Barcode could not be encoded: {0}")]
    Barcode(String),
    #[error("SVG could not be rendered: {0}")]
    Svg(String),
}

/// Everything a plugin may look at while measuring or drawing one instance.
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub schema: &'a Schema,
    pub value: &'a FieldValue,
    pub page: &'a PageGeometry,
    pub fonts: &'a FontSet,
    pub cache: &'a LayoutCache,
}

/// The capability set of one schema type.
///
/// Plugins are shared between concurrent generation calls and must not hold
/// per-call state; anything worth memoising goes into the call's
/// [`LayoutCache`].
pub trait Plugin: Send + Sync {
    /// The `schema.type` this plugin handles.
    fn type_name(&self) -> &'static str;

    /// Schema with the plugin's default properties. `required` set here is the
    /// default for templates that omit the flag.
    fn default_schema(&self) -> Schema;

    /// Draw operations in millimetres, page space, y down.
    fn render(&self, ctx: &RenderContext) -> Result<Vec<DrawOp>, PluginError>;

    /// Heights the instance occupies for this value, or `None` when it keeps
    /// its template height.
    fn dynamic_heights(&self, _ctx: &RenderContext) -> Result<Option<Vec<f64>>, PluginError> {
        Ok(None)
    }

    /// How the heights map to splittable rows, for types that can continue
    /// on the next page.
    fn row_split(&self, _schema: &Schema) -> Result<Option<RowSplit>, PluginError> {
        Ok(None)
    }
}
