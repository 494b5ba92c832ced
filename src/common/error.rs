//! Error types for the application.

use std::time::Duration;

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {message}")]
    ParseError { message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors raised by a mention source (fetching mentions or posting replies).
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Rate limited by platform")]
    RateLimited,

    #[error("Platform rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Request failed: {message}")]
    Transport { message: String },

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response from platform: {message}")]
    InvalidResponse { message: String },

    #[error("Failed to sign request: {message}")]
    Signing { message: String },

    #[error("Failed to load fixtures from '{path}': {message}")]
    Fixtures { path: String, message: String },
}

impl SourceError {
    /// Returns true for the rate-limit class of failures.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::InvalidResponse {
                message: e.to_string(),
            }
        } else {
            Self::Transport {
                message: e.to_string(),
            }
        }
    }
}

/// Network-level registry failures.
///
/// A registry answering with an error status or an empty result is not an
/// error, it is [`crate::registry::Resolution::NotFound`].
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Registry request failed: {message}")]
    Transport { message: String },

    #[error("Registry request timed out after {0:?}")]
    Timeout(Duration),
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            message: e.to_string(),
        }
    }
}

/// Result type alias for mention source operations.
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Result type alias for registry operations.
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;
