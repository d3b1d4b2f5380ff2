//! Asset handling for the generation pipeline.
//!
//! Images reach the pipeline as base64 data URIs. This crate decodes them
//! ([`decode_data_uri`]) and recovers their intrinsic pixel size from the
//! PNG or JPEG header alone ([`probe_dimensions`]), without pulling in a
//! general image decoder.

mod data_uri;
mod error;
mod probe;

pub use data_uri::{DataUri, decode_data_uri};
pub use error::ResourceError;
pub use probe::{ImageDimensions, ImageFormat, probe_data_uri, probe_dimensions};
