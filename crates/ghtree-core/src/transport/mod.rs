//! Authenticated JSON transport for the hosted REST API.
//!
//! The [`Transport`] trait is the only seam between the materialization
//! pipeline and the network. [`HttpTransport`] is the production
//! implementation; tests substitute an in-memory one.

mod http;

pub use http::{API_VERSION, HttpTransport, RATE_LIMIT_HEADER};

use thiserror::Error;

/// Issues a GET request and returns the decoded JSON body.
pub trait Transport: Send + Sync {
    /// Fetch `url` and parse the response body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Status`] for any non-success status.
    fn get_json(&self, url: &str) -> Result<serde_json::Value, TransportError>;
}

/// Transport error types
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request could not be sent or the connection failed
    #[error("Request to {url} failed: {source}")]
    Request {
        /// Requested URL
        url: String,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// Host answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status {
        /// Requested URL
        url: String,
        /// Response status code
        status: u16,
    },

    /// Body was not valid JSON
    #[error("Invalid JSON body from {url}: {source}")]
    Body {
        /// Requested URL
        url: String,
        /// Underlying reqwest error
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Credential contains characters not allowed in a header
    #[error("Credential is not a valid header value")]
    InvalidCredential,
}

impl TransportError {
    /// Status code for [`TransportError::Status`], if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
