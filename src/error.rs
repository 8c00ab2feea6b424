//! Error types for schema loading and conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced while turning a schema description into OpenAPI.
///
/// Conversion of an already-built [`SchemaNode`](crate::SchemaNode) never
/// fails; every variant here comes from reading or parsing the input.
#[derive(Debug, Error)]
pub enum ConvertError {
    // Input errors (exit code 2)
    #[error("no schema was passed")]
    MissingSchema,

    #[error("value at {path} does not look like a schema: expected object, got {actual}")]
    UnrecognizedSchema { path: String, actual: String },

    #[error("\"{kind}\" at {path} is not a recognized schema type")]
    UnrecognizedKind { path: String, kind: String },

    #[error("invalid schema node at {path}: {message}")]
    InvalidNode { path: String, message: String },

    #[error("invalid JSON: {source}")]
    InvalidJson {
        #[source]
        source: serde_json::Error,
    },

    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[cfg(feature = "remote")]
    #[error("failed to fetch {url}: {source}")]
    NetworkError {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl ConvertError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::FileNotFound { .. } | ConvertError::ReadError { .. } => 3,
            #[cfg(feature = "remote")]
            ConvertError::NetworkError { .. } => 3,
            _ => 2,
        }
    }
}
