//! Management API Error Types
//!
//! Errors raised by the remote management API layer. Service-layer code
//! wraps these into its own error type; the UI surfaces them as
//! notifications without tearing down the view.

use thiserror::Error;

/// Management API operation errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-success status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection/transport failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Response decoded but is not a valid payload for the endpoint
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl ApiError {
    /// Create an HTTP status error
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid payload error
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }
}
