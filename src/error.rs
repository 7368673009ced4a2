//! Error types for emogif.
//!
//! Every fallible operation in the crate returns [`Result`], whose error side
//! is the [`EmogifError`] enum. The variants separate conditions callers are
//! expected to react to differently: a missing artifact triggers training, a
//! corrupt one aborts start-up, and `NotReady` means no model is installed.
//!
//! # Examples
//!
//! ```
//! use emogif::error::{EmogifError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(EmogifError::dataset("column `content` not found"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// The main error type for emogif operations.
#[derive(Error, Debug)]
pub enum EmogifError {
    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Delimited-file parsing errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dataset ingestion errors (missing columns, empty sources, ...)
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Text analysis errors
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Model fitting or inference errors
    #[error("Model error: {0}")]
    Model(String),

    /// A label or class code outside the fitted label set
    #[error("Invalid label: {0}")]
    InvalidLabel(String),

    /// Prediction requested before a model was installed
    #[error("Model is not ready: {0}")]
    NotReady(String),

    /// No artifact exists at the given path
    #[error("Artifact not found: {}", .0.display())]
    ArtifactNotFound(PathBuf),

    /// The artifact exists but cannot be decoded
    #[error("Corrupt artifact {}: {reason}", path.display())]
    CorruptArtifact { path: PathBuf, reason: String },

    /// Another process kept the training lock for too long
    #[error(
        "Timed out waiting for lock {}; remove it if no training run is active",
        .0.display()
    )]
    LockTimeout(PathBuf),

    /// Image search failures
    #[error("Media search error: {0}")]
    Media(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with EmogifError.
pub type Result<T> = std::result::Result<T, EmogifError>;

impl EmogifError {
    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        EmogifError::Config(msg.into())
    }

    /// Create a new dataset error.
    pub fn dataset<S: Into<String>>(msg: S) -> Self {
        EmogifError::Dataset(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        EmogifError::Analysis(msg.into())
    }

    /// Create a new model error.
    pub fn model<S: Into<String>>(msg: S) -> Self {
        EmogifError::Model(msg.into())
    }

    /// Create a new invalid label error.
    pub fn invalid_label<S: Into<String>>(msg: S) -> Self {
        EmogifError::InvalidLabel(msg.into())
    }

    /// Create a new not-ready error.
    pub fn not_ready<S: Into<String>>(msg: S) -> Self {
        EmogifError::NotReady(msg.into())
    }

    /// Create a new corrupt artifact error.
    pub fn corrupt<P: Into<PathBuf>, S: Into<String>>(path: P, reason: S) -> Self {
        EmogifError::CorruptArtifact {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new media search error.
    pub fn media<S: Into<String>>(msg: S) -> Self {
        EmogifError::Media(msg.into())
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        EmogifError::SerializationError(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        EmogifError::Other(msg.into())
    }

    /// Whether this error means the artifact file is simply absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EmogifError::ArtifactNotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = EmogifError::dataset("Test dataset error");
        assert_eq!(error.to_string(), "Dataset error: Test dataset error");

        let error = EmogifError::invalid_label("bored");
        assert_eq!(error.to_string(), "Invalid label: bored");
    }

    #[test]
    fn test_corrupt_artifact_message() {
        let error = EmogifError::corrupt("model/stack_model.bin", "bad magic");
        assert_eq!(
            error.to_string(),
            "Corrupt artifact model/stack_model.bin: bad magic"
        );
        assert!(!error.is_not_found());
        assert!(EmogifError::ArtifactNotFound(PathBuf::from("x")).is_not_found());
    }

    #[test]
    fn test_error_from_io() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let error = EmogifError::from(io_error);

        match error {
            EmogifError::Io(_) => {} // Expected
            _ => panic!("Expected IO error"),
        }
    }
}
