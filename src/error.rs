//! Error types for safe-fetch
//!
//! This module provides error handling for the library, including:
//! - The crate-wide [`Error`] type returned by fetchers and configuration
//! - Machine-readable error codes for per-identifier failures
//! - [`ErrorDetail`], the serializable failure record kept in a batch outcome

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for safe-fetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for safe-fetch
///
/// Fetchers return this type for a single identifier. The batch fetcher never
/// propagates it out of a batch; it is converted into an [`ErrorDetail`] and
/// kept next to the identifier that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.concurrency")
        key: Option<String>,
    },

    /// Network error (connect failure, timeout, broken body)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Remote endpoint answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// Status code returned by the server
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// Identifier cannot be turned into a request
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Serialization or decode error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Collaborator-reported fetch failure
    #[error("fetch failed: {0}")]
    Fetch(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error on a specific key
    pub fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }

    /// Get the machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(e) if e.is_timeout() => "timeout",
            Error::Network(e) if e.is_decode() => "decode_error",
            Error::Network(_) => "network_error",
            Error::HttpStatus { .. } => "http_status",
            Error::InvalidIdentifier(_) => "invalid_identifier",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Serialization(_) => "decode_error",
            Error::Io(_) => "io_error",
            Error::Fetch(_) => "fetch_failed",
            Error::Other(_) => "internal_error",
        }
    }
}

/// Serializable description of why one identifier produced no record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "http_status", "timeout")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Number of times the fetch was invoked for this identifier
    pub attempts: u32,
}

impl ErrorDetail {
    /// Create an error detail with an explicit code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            attempts: 1,
        }
    }

    /// Capture an error after `attempts` calls to the fetcher
    pub fn from_error(error: &Error, attempts: u32) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
            attempts,
        }
    }
}

impl From<&Error> for ErrorDetail {
    fn from(error: &Error) -> Self {
        Self::from_error(error, 1)
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}
