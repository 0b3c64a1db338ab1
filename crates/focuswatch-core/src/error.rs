//! Core error types for focuswatch-core.
//!
//! Malformed tracker rows are normalized during aggregation and never raised
//! here; network and model failures surface to the immediate caller but are
//! absorbed at the session monitor boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focuswatch-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A duration argument was zero or negative. Rejected synchronously,
    /// never retried.
    #[error("duration must be positive, got {0} ms")]
    InvalidDuration(i64),

    /// No tracker bucket matched the configured prefix.
    #[error("no activity bucket matching prefix '{prefix}'")]
    SourceUnavailable { prefix: String },

    /// The tracker answered with a non-success status.
    #[error("tracker request failed: {status} {message}")]
    Upstream { status: u16, message: String },

    /// The language model call failed or returned an unusable body.
    #[error("classifier error: {0}")]
    Classifier(String),

    /// Transport-level HTTP errors.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration-related errors.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Failed to parse configuration
    #[error("failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
