//! Error types for support-bundle
//!
//! This module provides the error taxonomy shared by every step of the workflow:
//! - Argument and configuration errors detected before any network access
//! - Remote request failures carrying the HTTP status
//! - Malformed response bodies (invalid JSON, missing or mistyped fields)
//! - Readiness timeouts and cancellation
//! - Transport and filesystem errors, propagated as-is

use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for support-bundle operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for support-bundle
///
/// Every step of the workflow returns this type. The orchestrator never rewraps it,
/// so the variant a caller sees is the variant the failing step produced.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrong number of positional arguments
    #[error("Wrong number of arguments. Expected: {expected}, Received: {received}")]
    InvalidArguments {
        /// Number of arguments the command takes
        expected: usize,
        /// Number of arguments actually supplied
        received: usize,
    },

    /// Source or target server details could not be resolved
    #[error("could not resolve server '{server_id}': {reason}")]
    ConnectionResolution {
        /// The server ID that was looked up (`<default>` when none was given)
        server_id: String,
        /// Why the lookup failed
        reason: String,
    },

    /// The remote service answered with an unexpected status
    #[error("http request failed with: {status}")]
    RemoteRequestFailed {
        /// The HTTP status returned by the service
        status: StatusCode,
    },

    /// The response body could not be interpreted
    #[error(transparent)]
    MalformedResponse(#[from] JsonError),

    /// The support bundle did not become ready before the deadline
    #[error("timeout waiting for support bundle to be ready")]
    TimedOut {
        /// How long the poller waited
        waited: Duration,
    },

    /// The operation was cancelled (e.g. Ctrl+C)
    #[error("operation cancelled")]
    Cancelled,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "servers")
        key: Option<String>,
    },

    /// Interactive prompt failed (closed stdin, terminal error)
    #[error("prompt failed: {0}")]
    Prompt(String),
}

impl Error {
    /// Process exit code for this error
    ///
    /// Usage errors exit with 2, everything else with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArguments { .. } => 2,
            _ => 1,
        }
    }

    /// Build a `RemoteRequestFailed` from a raw status code
    pub fn remote(status: StatusCode) -> Self {
        Error::RemoteRequestFailed { status }
    }
}

/// Errors raised while extracting fields from a JSON response body
#[derive(Debug, Error)]
pub enum JsonError {
    /// The body is not a JSON object
    #[error("unexpected JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The requested property is absent
    #[error("property {0} not found")]
    MissingField(String),

    /// The requested property exists but is not a string
    #[error("property {0} is not a string")]
    NotAString(String),
}
