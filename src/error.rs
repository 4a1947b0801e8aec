// src/error.rs

//! Unified error handling for the mirror.

use std::fmt;

use thiserror::Error;

/// Result type alias for mirror operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Page URL does not have the `{base}/api/v1/{service}/user/{id}` shape
    #[error("Unexpected URL structure ({segments} segments): {url}")]
    MalformedUrl { url: String, segments: usize },

    /// Artist id has no entry in the id-to-name mapping
    #[error("Artist ID {artist_id} not found in data")]
    UnknownArtist { artist_id: String },

    /// Primary and fallback hosts both exhausted their retries
    #[error("Failed to fetch {url} after {attempts} attempts")]
    FetchExhausted { url: String, attempts: u32 },
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a malformed page URL error.
    pub fn malformed_url(url: impl Into<String>, segments: usize) -> Self {
        Self::MalformedUrl {
            url: url.into(),
            segments,
        }
    }
}
