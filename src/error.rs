//! Error types for Svar.

use thiserror::Error;

/// Library-level error type for Svar operations.
#[derive(Error, Debug)]
pub enum SvarError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dataset schema error: {0}")]
    Schema(String),

    #[error("Dataset parse error: {0}")]
    Parse(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("No index found: {0}. Build one with 'svar build <dataset.csv>'.")]
    IndexNotFound(String),

    #[error("Index search failed: {0}")]
    Search(String),

    #[error("Answer generation failed: {0}")]
    Generation(String),

    #[error("External service call timed out: {0}")]
    ServiceTimeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Svar operations.
pub type Result<T> = std::result::Result<T, SvarError>;
