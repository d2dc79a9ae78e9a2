//! Error types for training-set preparation pipelines
//!
//! A single crate-wide error enum with constructor helpers so call sites can
//! attach the operation and path that failed without repeating boilerplate.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T, E = PrepError> = std::result::Result<T, E>;

/// Errors produced by the download and resize pipelines
#[derive(Debug, Error)]
pub enum PrepError {
    /// Network-level failure (connect, timeout, non-success status)
    #[error("Network error: {message}")]
    Network {
        /// What was being attempted
        message: String,
        /// Underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// File system failure, annotated with the operation and path
    #[error("File I/O error: failed to {operation} at {}: {source}", path.display())]
    FileIo {
        /// Operation being performed, e.g. "create output directory"
        operation: String,
        /// Path the operation targeted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration detected before any processing started
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Dataset metadata could not be read or a row failed validation
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Per-item processing failure (decode, resize, encode)
    #[error("Processing error: {0}")]
    Processing(String),
}

impl PrepError {
    /// Network error with an underlying source error
    pub fn network_error<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Box::new(source),
        }
    }

    /// File I/O error for a failed `operation` on `path`
    ///
    /// The original error is copied rather than moved so callers holding a
    /// borrowed `std::io::Error` can use this directly.
    pub fn file_io_error(operation: impl Into<String>, path: &Path, source: &std::io::Error) -> Self {
        Self::FileIo {
            operation: operation.into(),
            path: path.to_path_buf(),
            source: std::io::Error::new(source.kind(), source.to_string()),
        }
    }

    /// Configuration error detected at startup
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Dataset metadata error
    pub fn dataset(message: impl Into<String>) -> Self {
        Self::Dataset(message.into())
    }

    /// Per-item processing error
    pub fn processing(message: impl Into<String>) -> Self {
        Self::Processing(message.into())
    }
}
