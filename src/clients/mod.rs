//! Client types for STAPI servers.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`Client`]: The facade that discovers an API and exposes typed operations
//! - [`StapiIo`]: The HTTP transport used by the client
//! - [`Pages`]: Lazy walking of `rel="next"` links
//! - [`HttpRequest`]: A request to be sent to the API
//! - [`HttpResponse`]: A parsed response from the API
//! - [`Advisory`] / [`WarningPolicy`]: Non-fatal conditions and how they surface
//!
//! # Example
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use stapi::Client;
//!
//! let client = Client::open("https://stapi.example.com").await?;
//! let order = client.get_order("o-1").await?;
//! let statuses: Vec<_> = client
//!     .list_order_statuses(&order.id, None)
//!     .await?
//!     .try_collect()
//!     .await?;
//! ```
//!
//! # Retry Behavior
//!
//! Connection failures are retried up to
//! [`ClientConfig::max_retries`](crate::ClientConfig::max_retries) times
//! (5 by default) with exponential back-off starting at
//! [`RETRY_BASE_DELAY`]. Timeouts are retried for GET requests only, since a
//! POST that timed out may already have been processed. Responses with an
//! error status are never retried.

mod client;
mod errors;
mod http_client;
mod http_request;
mod http_response;
mod pagination;
mod warnings;

pub use client::{take_items, Client, ResourceStream};
pub use errors::{ApiError, ClientError, InvalidHttpRequestError};
pub use http_client::{StapiIo, RETRY_BASE_DELAY, SDK_VERSION};
pub use http_request::{serialize_to_query, HttpMethod, HttpRequest, HttpRequestBuilder};
pub use http_response::HttpResponse;
pub use pagination::Pages;
pub use warnings::{Advisory, WarningPolicy};
