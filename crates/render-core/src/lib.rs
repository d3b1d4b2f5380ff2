//! Core rendering abstractions for document output.
//!
//! Plugins describe what a schema looks like as a list of [`DrawOp`]s in
//! millimetres with a top-left origin. The orchestrator converts them to points
//! and feeds complete pages to a [`DocumentSink`], which owns every detail of
//! the output format.

mod error;
mod traits;
mod types;
pub mod utils;

pub use error::RenderError;
pub use traits::DocumentSink;
pub use types::{Bitmap, DrawOp, Primitive, Rotation, ShapeStyle, TextRun};
