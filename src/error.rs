//! Error types for sv-downloader
//!
//! Every failure an export task can hit maps onto one [`Error`] variant:
//! - Platform failures (authentication, unexpected status, export rejected)
//! - Protocol violations (missing response metadata, unparseable CSV)
//! - Local failures (disk I/O, invalid configuration or request)
//! - Cooperative cancellation ([`Error::Aborted`]), which is not a failure

use thiserror::Error;

/// Result type alias for sv-downloader operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sv-downloader
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "platform.host")
        key: Option<String>,
    },

    /// The download request itself is unusable (empty indicator set, bad identifier)
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The platform refused the login; carries the response body
    #[error("unable to get session for login: {0}")]
    Authentication(String),

    /// A metadata endpoint answered with a non-success status
    #[error("{endpoint} returned status {status}: {body}")]
    Status {
        /// Endpoint path that was requested
        endpoint: String,
        /// HTTP status code
        status: u16,
        /// Response body returned by the platform
        body: String,
    },

    /// The export endpoint answered with a non-success status
    #[error("download failed with status {status}: {body}")]
    Download {
        /// HTTP status code
        status: u16,
        /// Response body returned by the platform
        body: String,
    },

    /// Expected response metadata is missing or malformed
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A CSV body could not be interpreted
    #[error("parse error: {0}")]
    Parse(String),

    /// The task was aborted through its cancellation token
    #[error("download aborted")]
    Aborted,

    /// The layer loader rejected the exported file
    #[error("invalid layer: {0}")]
    InvalidLayer(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl Error {
    /// Machine-readable error code, stable across releases
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Authentication(_) => "authentication_failed",
            Error::Status { .. } => "unexpected_status",
            Error::Download { .. } => "download_failed",
            Error::Protocol(_) => "protocol_error",
            Error::Parse(_) => "parse_error",
            Error::Aborted => "aborted",
            Error::InvalidLayer(_) => "invalid_layer",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
        }
    }

    /// Whether this error is the cooperative-cancellation path rather than a failure
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    pub(crate) fn config(message: impl Into<String>, key: &str) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
