//! Error taxonomy for the migration pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Every failure is fatal to the run; variants only classify the cause.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// A required archive, index, document or asset file is absent
    #[error("Missing input: {}", path.display())]
    MissingInput { path: PathBuf },

    /// Malformed index/song/pack document or an out-of-range enum value
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// A record points at something that does not exist
    #[error("Referential error: {0}")]
    ReferentialError(String),

    /// The catalog backend rejected or failed an operation
    #[error("Catalog {operation} failed: {message}")]
    CollaboratorFailure { operation: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MigrateError {
    pub fn missing(path: impl Into<PathBuf>) -> Self {
        Self::MissingInput { path: path.into() }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaViolation(msg.into())
    }

    pub fn referential(msg: impl Into<String>) -> Self {
        Self::ReferentialError(msg.into())
    }

    pub fn collaborator(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CollaboratorFailure {
            operation: operation.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MigrateError>;
