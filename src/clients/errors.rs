//! Error types for the STAPI client.
//!
//! # Error Handling
//!
//! - [`ApiError`]: A request that failed on the wire or returned a non-success status
//! - [`InvalidHttpRequestError`]: A request that failed validation before sending
//! - [`ClientError`]: Unified error type returned by [`Client`](crate::Client) operations
//!
//! # Example
//!
//! ```rust,ignore
//! use stapi::{Client, ClientError};
//!
//! match client.get_order("o-1").await {
//!     Ok(order) => println!("{}", order.id),
//!     Err(ClientError::NotFound { .. }) => eprintln!("no such order"),
//!     Err(ClientError::Api(e)) => eprintln!("status {:?}: {}", e.status_code, e.message),
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```

use thiserror::Error;

use crate::clients::warnings::Advisory;
use crate::conformance::ConformanceError;
use crate::error::ConfigError;
use crate::models::ModelError;

/// Error returned when a request fails or the server answers with a
/// non-success status.
///
/// `status_code` is `None` when no response was received at all
/// (connection failure, timeout).
///
/// # Example
///
/// ```rust
/// use stapi::clients::ApiError;
///
/// let error = ApiError::new(Some(404), "Order not found");
/// assert!(error.is_not_found());
/// assert_eq!(error.to_string(), "Order not found (status 404)");
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}{}", .status_code.map(|c| format!(" (status {c})")).unwrap_or_default())]
pub struct ApiError {
    /// The HTTP status code of the response, if one was received.
    pub status_code: Option<u16>,
    /// Description of the failure.
    pub message: String,
}

impl ApiError {
    /// Creates a new API error.
    #[must_use]
    pub fn new(status_code: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status_code,
            message: message.into(),
        }
    }

    /// Returns true if the server answered 404.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.status_code, Some(404))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            status_code: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}

/// Error returned when an HTTP request fails validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// A GET request body is not a JSON object and cannot become query
    /// parameters.
    #[error("GET request parameters must be a JSON object.")]
    NonObjectQuery,

    /// The request URL cannot be parsed.
    #[error("Invalid request URL '{url}'.")]
    InvalidUrl {
        /// The URL that was provided.
        url: String,
    },
}

/// Unified error type for client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request failed or the server returned an error status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A link needed for the operation is not advertised by the server.
    #[error("No link with rel='{rel}' could be found on this API.")]
    MissingLink {
        /// The relation that was looked up.
        rel: String,
    },

    /// A single resource does not exist.
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// The kind of resource.
        resource: &'static str,
        /// The identifier that was requested.
        id: String,
    },

    /// A conformance class name is unknown.
    #[error(transparent)]
    Conformance(#[from] ConformanceError),

    /// A model value is invalid.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// A response body does not match the expected model.
    #[error("Failed to decode response: {0}")]
    Deserialize(#[from] serde_json::Error),

    /// A URL could not be built.
    #[error("Invalid URL '{url}'")]
    InvalidUrl {
        /// The URL that was provided.
        url: String,
    },

    /// An advisory warning escalated to an error by the warning policy.
    #[error(transparent)]
    Advisory(#[from] Advisory),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// Client configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
