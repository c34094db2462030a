//! Error types for HTTP delivery attempts.

use thiserror::Error;

/// Transport-level failure.
///
/// Describes what went wrong on the wire without dictating recovery strategy.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Network connection failed.
    ///
    /// This includes DNS resolution failures, connection refused,
    /// and other network-level errors.
    #[error("Connection error: {0}")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The request deadline passed before a response arrived.
    #[error("Request timed out")]
    Timeout,

    /// The URL is missing or the request could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Failure of a single outbound delivery attempt.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Transport failure.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The endpoint answered with a non-2xx status.
    #[error("HTTP {status}")]
    NonSuccessStatus {
        /// Response status
        status: http::StatusCode,
        /// Response body, invalid UTF-8 replaced
        body: Option<String>,
    },

    /// A header value could not be encoded.
    #[error("Invalid value for header {name}: {reason}")]
    InvalidHeader {
        /// Header name
        name: String,
        /// Why the value was rejected
        reason: String,
    },

    /// The wire payload could not be serialized.
    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

impl AttemptError {
    /// Returns the response status, if a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<http::StatusCode> {
        match self {
            Self::NonSuccessStatus { status, .. } => Some(*status),
            Self::Http(_) | Self::InvalidHeader { .. } | Self::Encode(_) => None,
        }
    }

    /// Returns true if the attempt failed because its deadline passed.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(HttpError::Timeout))
    }
}
