//! Custom error types for cv-tensor-process.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the cv-tensor-process library.
#[derive(Error, Debug)]
pub enum Error {
    /// A configuration option is missing, out of range, or not recognized.
    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Failed to read a parameter file.
    #[error("failed to read parameters from {path}: {source}")]
    ParamsRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a parameter file.
    #[error("failed to load parameters from {path}: {source}")]
    ParamsFile {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The input image cannot be processed.
    #[error("invalid input image: {reason}")]
    InvalidInput { reason: String },

    /// Assembled tensor bytes do not match the expected payload size.
    #[error("invalid copy size: expected {expected} bytes, assembled {actual}")]
    Packing { expected: usize, actual: usize },

    /// An image message could not be decoded into a raw image.
    #[error("failed to decode image message: {reason}")]
    Decode { reason: String },

    /// Failed to load an image file.
    #[error("failed to load image from {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Failed to write a tensor descriptor.
    #[error("failed to save tensor to {path}: {source}")]
    TensorSave {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether this error should stop the pipeline from starting.
    ///
    /// Configuration errors are fatal; every other kind is scoped to the
    /// image that produced it.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter { .. } | Self::ParamsRead { .. } | Self::ParamsFile { .. }
        )
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

/// Result type alias for cv-tensor-process operations.
pub type Result<T> = std::result::Result<T, Error>;
