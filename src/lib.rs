//! # STAPI for Rust
//!
//! Client, server router and resource models for STAPI, the sensor tasking
//! API: discover what a provider can task, search for collection
//! opportunities and place orders.
//!
//! ## Overview
//!
//! This crate provides:
//! - A client ([`Client`]) configured via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Lazy pagination over `rel="next"` links ([`clients::Pages`])
//! - A conformance registry matching advertised capability URIs ([`conformance`])
//! - The shared resource models ([`models`])
//! - An axum router serving the STAPI path table over pluggable backends ([`server`])
//! - An in-memory demo backend ([`server::memory`])
//!
//! ## Quick Start
//!
//! ```rust
//! use stapi::{ClientConfig, RootUrl, WarningPolicy};
//!
//! // Create configuration using the builder pattern
//! let config = ClientConfig::builder()
//!     .root_url(RootUrl::new("https://stapi.example.com").unwrap())
//!     .warning_policy(WarningPolicy::Error)
//!     .build()
//!     .unwrap();
//! ```
//!
//! ## Reading an API
//!
//! ```rust,ignore
//! use futures::TryStreamExt;
//! use stapi::Client;
//!
//! let client = Client::open_with(config).await?;
//!
//! // Streams fetch pages only as they are consumed
//! let products: Vec<_> = client.list_products(None).await?.try_collect().await?;
//! let order = client.get_order("o-1").await?;
//! ```
//!
//! ## Searching Opportunities and Ordering
//!
//! ```rust,ignore
//! use chrono::{Duration, Utc};
//! use futures::TryStreamExt;
//! use stapi::models::{Geometry, OrderPayload};
//!
//! let start = Utc::now();
//! let opportunities: Vec<_> = client
//!     .search_opportunities("test-spotlight", start, start + Duration::days(7), Geometry::point(0.0, 0.0), None, 10)
//!     .await?
//!     .try_collect()
//!     .await?;
//!
//! let payload: OrderPayload = serde_json::from_value(opportunities[0].links[0].body.clone().unwrap())?;
//! let order = client.create_order("test-spotlight", &payload).await?;
//! ```
//!
//! ## Serving an API
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stapi::server::{memory, serve};
//!
//! let backend = Arc::new(memory::InMemoryBackend::with_opportunities(memory::demo_opportunities(5)));
//! let app = memory::demo_router(backend)?.into_router();
//! serve(tokio::net::TcpListener::bind("127.0.0.1:8000").await?, app).await?;
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration and the conformance registry are values passed explicitly
//! - **Fail-fast validation**: Root URLs and intervals validate on construction
//! - **Thread-safe**: Clients and backends are `Send + Sync`
//! - **Async-first**: Designed for use with the Tokio async runtime

pub mod clients;
pub mod config;
pub mod conformance;
pub mod error;
pub mod models;
pub mod server;

// Re-export public types at crate root for convenience
pub use config::{ClientConfig, ClientConfigBuilder, RootUrl};
pub use error::ConfigError;

// Re-export client types
pub use clients::{
    Advisory, ApiError, Client, ClientError, HttpMethod, HttpRequest, HttpRequestBuilder,
    HttpResponse, InvalidHttpRequestError, WarningPolicy,
};

// Re-export conformance types
pub use conformance::{ConformanceClass, ConformanceRegistry};
