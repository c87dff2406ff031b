//! Errors raised while talking to the booking API.

use http::StatusCode;
use http::header::InvalidHeaderValue;

/// Errors that can occur while interacting with the booking API.
#[derive(Debug, thiserror::Error)]
pub enum BookingClientError {
    /// URL parse error.
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        /// Human-readable context.
        context: &'static str,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
    /// A header value could not be encoded.
    #[error("Invalid header value: {context}: {source}")]
    InvalidHeader {
        /// Human-readable context.
        context: &'static str,
        /// The underlying header error.
        #[source]
        source: InvalidHeaderValue,
    },
    /// HTTP transport error, including timeouts.
    #[error("HTTP error: {context}: {source}")]
    Http {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// JSON deserialization error.
    #[error("Failed to deserialize JSON: {context}: {source}")]
    JsonDeserialization {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
    /// Unexpected HTTP status code.
    #[error("Unexpected HTTP status {status}: {context}: {body}")]
    HttpStatus {
        /// Human-readable context.
        context: &'static str,
        /// The HTTP status code.
        status: StatusCode,
        /// The response body.
        body: String,
    },
    /// Failed to read response body.
    #[error("Failed to read response body as text: {context}: {source}")]
    ResponseBodyRead {
        /// Human-readable context.
        context: &'static str,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },
}

impl BookingClientError {
    /// Returns the HTTP status for [`BookingClientError::HttpStatus`].
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` if the request timed out.
    ///
    /// A timed-out finish may still have been processed by the server.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Http { source, .. } => source.is_timeout(),
            _ => false,
        }
    }
}
