//! Backend traits the router dispatches to.
//!
//! A server is assembled from a [`RootBackend`] for orders, an optional
//! [`OpportunitySearchRecords`] backend, and per-product backends
//! ([`CreateOrder`], [`SearchOpportunities`], [`SearchOpportunitiesAsync`]).
//! Every method returns [`BackendError`], which the router maps to an HTTP
//! status.
//!
//! List methods take an opaque pagination token and a limit, and return a
//! [`Page`] whose `next` token, when present, the router threads into a
//! `rel="next"` link.

use async_trait::async_trait;
use thiserror::Error;

use super::product::ServerProduct;
use crate::models::{
    Opportunity, OpportunityCollection, OpportunityPayload, OpportunitySearchRecord,
    OpportunitySearchStatus, Order, OrderPayload, OrderStatus,
};

/// One page of a backend listing.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Token for the following page, if there is one.
    pub next: Option<String>,
}

impl<T> Page<T> {
    /// Creates a page.
    #[must_use]
    pub const fn new(items: Vec<T>, next: Option<String>) -> Self {
        Self { items, next }
    }

    /// Creates a final page with no continuation.
    #[must_use]
    pub const fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Errors returned by backends.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The requested resource or pagination token does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The request is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// The request is well formed but violates product constraints such as
    /// queryables or order parameters.
    #[error("{0}")]
    Constraints(String),

    /// Any other failure.
    #[error("{0}")]
    Internal(String),
}

/// Backend for the API-wide order endpoints.
#[async_trait]
pub trait RootBackend: Send + Sync {
    /// Lists orders starting at the `next` token.
    async fn get_orders(&self, next: Option<String>, limit: usize) -> Result<Page<Order>, BackendError>;

    /// Fetches one order.
    async fn get_order(&self, order_id: &str) -> Result<Order, BackendError>;

    /// Lists the status history of an order starting at the `next` token.
    async fn get_order_statuses(
        &self,
        order_id: &str,
        next: Option<String>,
        limit: usize,
    ) -> Result<Page<OrderStatus>, BackendError>;
}

/// Backend for records of asynchronous opportunity searches.
///
/// Supplying one enables the `/searches/opportunities` endpoints and, with
/// products that implement [`SearchOpportunitiesAsync`], asynchronous
/// searches.
#[async_trait]
pub trait OpportunitySearchRecords: Send + Sync {
    /// Lists search records starting at the `next` token.
    async fn get_search_records(
        &self,
        next: Option<String>,
        limit: usize,
    ) -> Result<Page<OpportunitySearchRecord>, BackendError>;

    /// Fetches one search record.
    async fn get_search_record(&self, search_record_id: &str) -> Result<OpportunitySearchRecord, BackendError>;

    /// Lists the status history of a search record starting at the `next`
    /// token.
    async fn get_search_record_statuses(
        &self,
        search_record_id: &str,
        next: Option<String>,
        limit: usize,
    ) -> Result<Page<OpportunitySearchStatus>, BackendError>;
}

/// Backend that turns an order payload into an order.
#[async_trait]
pub trait CreateOrder: Send + Sync {
    /// Creates an order for `product`.
    async fn create_order(&self, product: &ServerProduct, payload: OrderPayload) -> Result<Order, BackendError>;
}

/// Backend answering opportunity searches synchronously.
#[async_trait]
pub trait SearchOpportunities: Send + Sync {
    /// Searches opportunities. Pagination state travels in `search.next`
    /// and `search.limit`.
    async fn search_opportunities(
        &self,
        product: &ServerProduct,
        search: &OpportunityPayload,
    ) -> Result<Page<Opportunity>, BackendError>;
}

/// Backend answering opportunity searches asynchronously.
#[async_trait]
pub trait SearchOpportunitiesAsync: Send + Sync {
    /// Starts a search and returns its record.
    async fn search_opportunities_async(
        &self,
        product: &ServerProduct,
        search: &OpportunityPayload,
    ) -> Result<OpportunitySearchRecord, BackendError>;

    /// Fetches the results of a finished search.
    async fn get_opportunity_collection(
        &self,
        product: &ServerProduct,
        collection_id: &str,
    ) -> Result<OpportunityCollection, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_constructors() {
        let page = Page::new(vec![1, 2], Some("3".to_string()));
        assert_eq!(page.next.as_deref(), Some("3"));
        assert!(Page::last(vec![1]).next.is_none());
    }

    #[test]
    fn test_backend_error_displays_message() {
        let error = BackendError::Constraints("unknown order parameter 'x'".to_string());
        assert_eq!(error.to_string(), "unknown order parameter 'x'");
    }
}
