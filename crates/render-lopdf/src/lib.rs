//! PDF output for stencil using lopdf.
//!
//! [`LopdfSink`] implements the backend-neutral `DocumentSink`: pages are
//! accumulated in memory and serialised once on `finish`. Fonts, images and
//! opacity states live in one resource dictionary shared by every page.

mod resources;
mod sink;

pub use sink::LopdfSink;
