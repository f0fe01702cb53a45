//! Error types for the server router.
//!
//! - [`ApiProblem`]: An error response, rendered as `{"detail": "..."}`
//! - [`RouterError`]: Invalid router or product configuration

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use super::backend::BackendError;

/// An HTTP error response with a `detail` message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{status}: {detail}")]
pub struct ApiProblem {
    /// The response status.
    pub status: StatusCode,
    /// The message placed in the `detail` member.
    pub detail: String,
}

impl ApiProblem {
    /// Creates a problem with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Creates a 404 problem.
    #[must_use]
    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, detail)
    }

    /// Creates a 400 problem.
    #[must_use]
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, detail)
    }

    /// Maps a backend error to a response.
    ///
    /// Not-found, bad-request and constraint errors keep the backend's
    /// message. Other failures are logged and answered with `context` as a
    /// 500, so internal details do not leak.
    #[must_use]
    pub fn from_backend(error: BackendError, context: &str) -> Self {
        match error {
            BackendError::NotFound(detail) => Self::not_found(detail),
            BackendError::BadRequest(detail) => Self::bad_request(detail),
            BackendError::Constraints(detail) => Self::new(StatusCode::UNPROCESSABLE_ENTITY, detail),
            BackendError::Internal(message) => {
                tracing::error!(error = %message, "{}", context);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, context)
            }
        }
    }

    /// Like [`from_backend`](Self::from_backend), but replaces the detail
    /// of a not-found error.
    #[must_use]
    pub fn from_backend_or_missing(error: BackendError, context: &str, missing: &str) -> Self {
        match error {
            BackendError::NotFound(_) => Self::not_found(missing),
            other => Self::from_backend(other, context),
        }
    }
}

impl IntoResponse for ApiProblem {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// Error raised when the router is configured with invalid products.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// A product does not list any GeoJSON geometry conformance.
    #[error("Product '{product_id}' must specify a conformance for a GeoJSON geometry (https://geojson.org/schema/...)")]
    MissingGeoJsonConformance {
        /// The offending product.
        product_id: String,
    },

    /// Two products share an identifier.
    #[error("Product '{product_id}' is already registered")]
    DuplicateProduct {
        /// The duplicated identifier.
        product_id: String,
    },

    /// A product identifier cannot be used as a path segment.
    #[error("Product id '{product_id}' is not a valid path segment")]
    InvalidProductId {
        /// The offending identifier.
        product_id: String,
    },
}
