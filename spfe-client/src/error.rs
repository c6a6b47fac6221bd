//! SPFE error types using thiserror 2.0.
//!
//! Four failure kinds reach callers: configuration, transport, service and
//! protocol errors. Only transport failures are retried, and only inside a
//! single connection.

use thiserror::Error;

/// Failure while moving bytes to or from the service.
///
/// These never come from a decoded response; a response the service
/// produced on purpose is either a success or a [`SpfeError::Service`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Request did not complete within the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// TCP or TLS connection could not be established
    #[error("connection failed: {0}")]
    Connect(String),

    /// Service answered with a non-success HTTP status
    #[error("unexpected HTTP status {0}")]
    Status(u16),

    /// Any other transport-level failure
    #[error("HTTP error: {0}")]
    Http(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Http(err.to_string())
        }
    }
}

/// SPFE client errors.
#[derive(Error, Debug)]
pub enum SpfeError {
    /// Invalid key, certificate, CA material, address or environment
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Transport failed on every allowed attempt
    #[error("SPFE unreachable after {attempts} attempt(s): {source}")]
    Transport {
        /// Number of attempts made
        attempts: u32,
        /// Failure observed on the last attempt
        #[source]
        source: TransportError,
    },

    /// Service answered with `result = false`
    #[error("SPFE returned error: {}{message}", code_prefix(.code))]
    Service {
        /// Machine-readable error code, when the service sent one
        code: Option<String>,
        /// Human-readable message taken from `data`
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Malformed SPFE response: {0}")]
    Protocol(String),
}

/// Result type for SPFE operations.
pub type SpfeResult<T> = Result<T, SpfeError>;

fn code_prefix(code: &Option<String>) -> String {
    code.as_ref()
        .map(|code| format!("{code}: "))
        .unwrap_or_default()
}

impl SpfeError {
    /// Check if error is retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a protocol error.
    #[must_use]
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a service error.
    #[must_use]
    pub fn service(code: Option<String>, message: impl Into<String>) -> Self {
        Self::Service {
            code,
            message: message.into(),
        }
    }
}
