//! Error types for loading value sources.

use thiserror::Error;

/// Errors that can occur while loading a config document.
#[derive(Debug, Error)]
pub enum SourceError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The file extension is neither JSON nor YAML.
    #[error("unsupported config format: {0}")]
    UnsupportedFormat(String),

    /// The document parsed but is not usable as a value source.
    #[error("invalid config document: {0}")]
    InvalidDocument(String),
}

/// Convenience alias for results with [`SourceError`].
pub type Result<T> = std::result::Result<T, SourceError>;
