//! Error types for the CDD research orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, CddError>;

#[derive(Error, Debug)]
pub enum CddError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Reasoning service error: {0}")]
    ReasoningError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Malformed report output: {0}")]
    MalformedOutput(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
