use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Unsupported image format (only PNG and JPEG are supported)")]
    UnsupportedImageFormat,

    #[error("Corrupt image: {0}")]
    CorruptImage(String),

    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
}
