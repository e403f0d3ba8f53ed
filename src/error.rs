//! Error types for the skill memory engine.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MemoryError>;

#[derive(Debug, Error)]
pub enum MemoryError {
    /// Malformed record, rejected before any write.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("skill not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("storage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Semantic path only. Callers fall back to lexical ranking.
    #[error("semantic index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("invalid document {path}: {message}")]
    InvalidDocument { path: PathBuf, message: String },

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("missing config: {0}")]
    MissingConfig(String),
}

impl MemoryError {
    /// Stable machine-readable code for JSON output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) | Self::Sqlite(_) | Self::Io(_) => "storage_error",
            Self::IndexUnavailable(_) => "index_unavailable",
            Self::InvalidDocument { .. } => "invalid_document",
            Self::Serialization(_) => "serialization_error",
            Self::Config(_) | Self::MissingConfig(_) => "config_error",
        }
    }

    /// True for failures of the persistence layer (I/O or corruption).
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Sqlite(_) | Self::Io(_))
    }
}
