//! A STAPI server router on top of pluggable backends.
//!
//! # Overview
//!
//! - [`RootRouter`]: Builds the [`axum::Router`] serving the STAPI path table
//! - [`ServerProduct`]: A product with its schemas and backends
//! - [`backend`]: The traits a server implements ([`RootBackend`],
//!   [`OpportunitySearchRecords`], [`CreateOrder`], [`SearchOpportunities`],
//!   [`SearchOpportunitiesAsync`])
//! - [`memory`]: An in-memory implementation of every backend trait
//!
//! # Routes
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | GET | `/` | Root document |
//! | GET | `/conformance` | |
//! | GET | `/products` | Paginated |
//! | GET | `/orders`, `/orders/{id}`, `/orders/{id}/statuses` | |
//! | GET | `/searches/opportunities[/{id}[/statuses]]` | With a search record backend |
//! | GET | `/products/{id}[/conformance, /queryables, /order-parameters]` | |
//! | POST | `/products/{id}/orders` | 201 with `Location` |
//! | POST | `/products/{id}/opportunities` | Honors `Prefer` |
//! | GET | `/products/{id}/opportunities/{collection_id}` | Asynchronous search results |
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stapi::server::{self, memory};
//!
//! let backend = Arc::new(memory::InMemoryBackend::with_opportunities(memory::demo_opportunities(5)));
//! let app = memory::demo_router(backend)?.into_router();
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! server::serve(listener, app).await?;
//! ```

pub mod backend;
mod errors;
pub mod memory;
mod product;
mod router;

pub use backend::{
    BackendError, CreateOrder, OpportunitySearchRecords, Page, RootBackend, SearchOpportunities,
    SearchOpportunitiesAsync,
};
pub use errors::{ApiProblem, RouterError};
pub use product::ServerProduct;
pub use router::{ListParams, RootRouter, GEOJSON_MEDIA_TYPE, JSON_MEDIA_TYPE};

/// Serves `router` on `listener` until the process is stopped.
///
/// # Errors
///
/// Returns an I/O error if the server fails.
pub async fn serve(listener: tokio::net::TcpListener, router: axum::Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "Serving STAPI");
    }
    axum::serve(listener, router).await
}
