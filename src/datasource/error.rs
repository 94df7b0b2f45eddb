//! Data source error types

use thiserror::Error;

/// Failure raised while serving a single request
///
/// Every variant is turned into an `error` result by the dispatcher, so the
/// `Display` text is what callers see on the wire.
#[derive(Error, Debug)]
pub enum DataSourceError {
    // Validation errors
    #[error("Invalid request: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("No request type provided.")]
    MissingType,

    #[error("No key value provided.")]
    MissingKey,

    #[error("No query string provided.")]
    MissingQueryString,

    #[error("Invalid value for {field}: '{value}' is not a non-negative integer.")]
    InvalidOffset { field: &'static str, value: String },

    #[error("Invalid range [{start}, {end}) for an index of {len} keys.")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    // Lookup errors
    #[error("No such file.")]
    NoSuchKey,

    #[error("That file was not found on this server.")]
    FileNotFound,

    // IO errors
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

pub type Result<T> = std::result::Result<T, DataSourceError>;
