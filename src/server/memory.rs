//! An in-memory backend and demo catalog.
//!
//! [`InMemoryBackend`] implements every backend trait over data held behind
//! a [`tokio::sync::RwLock`]. It backs the `stapi serve` command and the
//! end-to-end tests.
//!
//! Opportunity searches answer from a canned list of opportunities filtered
//! by product. Asynchronous searches complete immediately: the record is
//! returned as `received`, and its stored history moves on to `completed`
//! with the results kept as an opportunity collection under the record id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::backend::{
    BackendError, CreateOrder, OpportunitySearchRecords, Page, RootBackend, SearchOpportunities,
    SearchOpportunitiesAsync,
};
use super::errors::RouterError;
use super::product::ServerProduct;
use super::router::RootRouter;
use crate::conformance::geojson;
use crate::models::{
    DatetimeInterval, Geometry, Opportunity, OpportunityCollection, OpportunityPayload,
    OpportunityProperties, OpportunitySearchRecord, OpportunitySearchStatus,
    OpportunitySearchStatusCode, Order, OrderPayload, OrderProperties, OrderSearchParameters,
    OrderStatus, OrderStatusCode, Product, Provider, ProviderRole,
};

/// Identifier of the demo product.
pub const DEMO_PRODUCT_ID: &str = "test-spotlight";

#[derive(Debug, Default)]
struct Store {
    orders: Vec<Order>,
    order_statuses: HashMap<String, Vec<OrderStatus>>,
    opportunities: Vec<Opportunity>,
    search_records: Vec<OpportunitySearchRecord>,
    search_statuses: HashMap<String, Vec<OpportunitySearchStatus>>,
    /// Search results keyed by search record id, with the owning product id.
    collections: HashMap<String, (String, OpportunityCollection)>,
}

/// In-memory implementation of every backend trait.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    store: RwLock<Store>,
}

// Verify InMemoryBackend is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<InMemoryBackend>();
};

impl InMemoryBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend answering searches from `opportunities`.
    #[must_use]
    pub fn with_opportunities(opportunities: Vec<Opportunity>) -> Self {
        Self {
            store: RwLock::new(Store {
                opportunities,
                ..Store::default()
            }),
        }
    }

    /// Appends a status to an order's history and makes it the current
    /// status.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] if the order does not exist.
    pub async fn push_order_status(&self, order_id: &str, status: OrderStatus) -> Result<(), BackendError> {
        let mut store = self.store.write().await;
        let order = store
            .orders
            .iter_mut()
            .find(|order| order.id == order_id)
            .ok_or_else(|| order_not_found(order_id))?;
        order.properties.status = status.clone();
        store
            .order_statuses
            .entry(order_id.to_string())
            .or_default()
            .push(status);
        Ok(())
    }

    async fn matching_opportunities(&self, product_id: &str) -> Vec<Opportunity> {
        self.store
            .read()
            .await
            .opportunities
            .iter()
            .filter(|opportunity| opportunity.properties.product_id == product_id)
            .cloned()
            .collect()
    }
}

fn order_not_found(order_id: &str) -> BackendError {
    BackendError::NotFound(format!("Order '{order_id}' not found"))
}

fn search_record_not_found(search_record_id: &str) -> BackendError {
    BackendError::NotFound(format!("Opportunity Search Record '{search_record_id}' not found"))
}

/// Paginates `items` with a numeric offset token.
fn page_by_index<T: Clone>(items: &[T], next: Option<String>, limit: usize) -> Result<Page<T>, BackendError> {
    let start = match next {
        Some(token) => token
            .parse::<usize>()
            .ok()
            .filter(|start| *start < items.len())
            .ok_or_else(|| BackendError::NotFound(format!("Invalid pagination token '{token}'")))?,
        None => 0,
    };
    let end = start.saturating_add(limit).min(items.len());
    let next = (end < items.len()).then(|| end.to_string());
    Ok(Page::new(items[start..end].to_vec(), next))
}

#[async_trait]
impl RootBackend for InMemoryBackend {
    async fn get_orders(&self, next: Option<String>, limit: usize) -> Result<Page<Order>, BackendError> {
        let store = self.store.read().await;
        let start = match next {
            Some(token) => store
                .orders
                .iter()
                .position(|order| order.id == token)
                .ok_or_else(|| BackendError::NotFound(format!("Invalid pagination token '{token}'")))?,
            None => 0,
        };
        let end = start.saturating_add(limit).min(store.orders.len());
        let next = store.orders.get(end).map(|order| order.id.clone());
        Ok(Page::new(store.orders[start..end].to_vec(), next))
    }

    async fn get_order(&self, order_id: &str) -> Result<Order, BackendError> {
        self.store
            .read()
            .await
            .orders
            .iter()
            .find(|order| order.id == order_id)
            .cloned()
            .ok_or_else(|| order_not_found(order_id))
    }

    async fn get_order_statuses(
        &self,
        order_id: &str,
        next: Option<String>,
        limit: usize,
    ) -> Result<Page<OrderStatus>, BackendError> {
        let store = self.store.read().await;
        let statuses = store
            .order_statuses
            .get(order_id)
            .ok_or_else(|| order_not_found(order_id))?;
        page_by_index(statuses, next, limit)
    }
}

#[async_trait]
impl CreateOrder for InMemoryBackend {
    async fn create_order(&self, product: &ServerProduct, payload: OrderPayload) -> Result<Order, BackendError> {
        let allowed = product.order_parameters();
        if let Some(unknown) = payload.order_parameters.keys().find(|key| !allowed.contains_key(*key)) {
            return Err(BackendError::Constraints(format!(
                "Unknown order parameter '{unknown}' for product '{}'",
                product.id()
            )));
        }

        let status = OrderStatus::new(OrderStatusCode::Received, None, None);
        let order = Order::new(
            Uuid::new_v4().to_string(),
            payload.geometry.clone(),
            OrderProperties {
                product_id: product.id().to_string(),
                created: Utc::now(),
                status: status.clone(),
                search_parameters: OrderSearchParameters {
                    datetime: payload.datetime,
                    geometry: payload.geometry,
                    filter: payload.filter,
                },
                opportunity_properties: Map::from_iter([(
                    "datetime".to_string(),
                    Value::String(payload.datetime.to_string()),
                )]),
                order_parameters: payload.order_parameters,
                extra: Map::new(),
            },
        );

        let mut store = self.store.write().await;
        store.order_statuses.insert(order.id.clone(), vec![status]);
        store.orders.push(order.clone());
        Ok(order)
    }
}

#[async_trait]
impl SearchOpportunities for InMemoryBackend {
    async fn search_opportunities(
        &self,
        product: &ServerProduct,
        search: &OpportunityPayload,
    ) -> Result<Page<Opportunity>, BackendError> {
        let opportunities = self.matching_opportunities(product.id()).await;
        let limit = usize::try_from(search.limit).unwrap_or(usize::MAX);
        page_by_index(&opportunities, search.next.clone(), limit.max(1))
    }
}

#[async_trait]
impl SearchOpportunitiesAsync for InMemoryBackend {
    async fn search_opportunities_async(
        &self,
        product: &ServerProduct,
        search: &OpportunityPayload,
    ) -> Result<OpportunitySearchRecord, BackendError> {
        let features = self.matching_opportunities(product.id()).await;

        let received = OpportunitySearchStatus::new(OpportunitySearchStatusCode::Received);
        let record = OpportunitySearchRecord {
            id: Uuid::new_v4().to_string(),
            product_id: product.id().to_string(),
            opportunity_request: search.clone(),
            status: received.clone(),
            links: Vec::new(),
        };

        let mut history = vec![received];
        for code in [
            OpportunitySearchStatusCode::InProgress,
            OpportunitySearchStatusCode::Completed,
        ] {
            let current = history.last().map(|status| status.status_code);
            if current.is_some_and(|current| !current.can_transition_to(code)) {
                return Err(BackendError::Internal(format!(
                    "Invalid search status transition to {code}"
                )));
            }
            history.push(OpportunitySearchStatus::new(code));
        }

        let mut collection = OpportunityCollection::new(features, Vec::new());
        collection.id = Some(record.id.clone());

        let mut store = self.store.write().await;
        let mut stored = record.clone();
        if let Some(last) = history.last() {
            stored.status = last.clone();
        }
        store.search_statuses.insert(record.id.clone(), history);
        store
            .collections
            .insert(record.id.clone(), (record.product_id.clone(), collection));
        store.search_records.push(stored);
        Ok(record)
    }

    async fn get_opportunity_collection(
        &self,
        product: &ServerProduct,
        collection_id: &str,
    ) -> Result<OpportunityCollection, BackendError> {
        self.store
            .read()
            .await
            .collections
            .get(collection_id)
            .filter(|(product_id, _)| product_id == product.id())
            .map(|(_, collection)| collection.clone())
            .ok_or_else(|| BackendError::NotFound(format!("Opportunity Collection '{collection_id}' not found")))
    }
}

#[async_trait]
impl OpportunitySearchRecords for InMemoryBackend {
    async fn get_search_records(
        &self,
        next: Option<String>,
        limit: usize,
    ) -> Result<Page<OpportunitySearchRecord>, BackendError> {
        page_by_index(&self.store.read().await.search_records, next, limit)
    }

    async fn get_search_record(&self, search_record_id: &str) -> Result<OpportunitySearchRecord, BackendError> {
        self.store
            .read()
            .await
            .search_records
            .iter()
            .find(|record| record.id == search_record_id)
            .cloned()
            .ok_or_else(|| search_record_not_found(search_record_id))
    }

    async fn get_search_record_statuses(
        &self,
        search_record_id: &str,
        next: Option<String>,
        limit: usize,
    ) -> Result<Page<OpportunitySearchStatus>, BackendError> {
        let store = self.store.read().await;
        let statuses = store
            .search_statuses
            .get(search_record_id)
            .ok_or_else(|| search_record_not_found(search_record_id))?;
        page_by_index(statuses, next, limit)
    }
}

/// Returns the demo product document.
#[must_use]
pub fn demo_product() -> Product {
    let mut product = Product::new(DEMO_PRODUCT_ID, "CC-BY-4.0");
    product.title = "Test Spotlight".to_string();
    product.description = "Spotlight tasking of a demo satellite".to_string();
    product.keywords = vec!["optical".to_string(), "spotlight".to_string()];
    product.conforms_to = vec![geojson::POINT.to_string()];
    product.providers = vec![Provider {
        name: "Test Provider".to_string(),
        description: Some("A provider for demonstration".to_string()),
        roles: vec![ProviderRole::Producer],
        url: "https://test-provider.example.com".to_string(),
    }];
    product
}

/// Returns `count` canned opportunities for the demo product, one per day
/// starting now, all at the same point.
#[must_use]
pub fn demo_opportunities(count: u32) -> Vec<Opportunity> {
    let start = Utc::now();
    (0..count)
        .filter_map(|day| {
            let begin = start + Duration::days(i64::from(day));
            let datetime = DatetimeInterval::new(Some(begin), Some(begin + Duration::hours(1))).ok()?;
            let mut opportunity = Opportunity::new(
                Geometry::point(0.0, 0.0),
                OpportunityProperties {
                    datetime,
                    product_id: DEMO_PRODUCT_ID.to_string(),
                    extra: Map::from_iter([
                        ("off_nadir".to_string(), json!({"minimum": 20, "maximum": 22})),
                        ("constraint".to_string(), json!("demo")),
                    ]),
                },
            );
            opportunity.id = Some(format!("opportunity-{day}"));
            Some(opportunity)
        })
        .collect()
}

/// Builds a router serving the demo product from `backend`, with
/// synchronous and asynchronous opportunity search.
///
/// # Errors
///
/// Returns [`RouterError`] if the demo product is rejected.
pub fn demo_router(backend: Arc<InMemoryBackend>) -> Result<RootRouter, RouterError> {
    let queryables = Map::from_iter([(
        "off_nadir".to_string(),
        json!({"type": "number", "minimum": 0, "maximum": 45}),
    )]);
    let order_parameters = Map::from_iter([("s3_path".to_string(), json!({"type": "string"}))]);

    let product = ServerProduct::new(demo_product(), backend.clone())?
        .with_queryables(queryables)
        .with_order_parameters(order_parameters)
        .with_search(backend.clone())
        .with_search_async(backend.clone());

    RootRouter::new(backend.clone())
        .with_id("stapi-demo")
        .with_title("STAPI demo")
        .with_description("In-memory STAPI demo server")
        .with_search_records(backend)
        .add_product(product)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_product(backend: &Arc<InMemoryBackend>) -> ServerProduct {
        ServerProduct::new(demo_product(), backend.clone())
            .unwrap()
            .with_order_parameters(Map::from_iter([("s3_path".to_string(), json!({"type": "string"}))]))
    }

    fn payload(order_parameters: Map<String, Value>) -> OrderPayload {
        let now = Utc::now();
        OrderPayload {
            datetime: DatetimeInterval::new(Some(now), Some(now + Duration::days(1))).unwrap(),
            geometry: Geometry::point(0.0, 0.0),
            filter: None,
            order_parameters,
        }
    }

    #[test]
    fn test_page_by_index() {
        let items = vec![1, 2, 3, 4, 5];
        let first = page_by_index(&items, None, 2).unwrap();
        assert_eq!(first.items, vec![1, 2]);
        assert_eq!(first.next.as_deref(), Some("2"));

        let last = page_by_index(&items, Some("4".to_string()), 2).unwrap();
        assert_eq!(last.items, vec![5]);
        assert!(last.next.is_none());

        assert!(matches!(
            page_by_index(&items, Some("9".to_string()), 2),
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_create_order_records_received_status() {
        let backend = Arc::new(InMemoryBackend::new());
        let product = server_product(&backend);
        let order = backend
            .create_order(&product, payload(Map::from_iter([("s3_path".to_string(), json!("s3://b"))])))
            .await
            .unwrap();

        assert_eq!(order.properties.status.status_code, OrderStatusCode::Received);
        assert_eq!(order.properties.product_id, DEMO_PRODUCT_ID);

        let statuses = backend.get_order_statuses(&order.id, None, 10).await.unwrap();
        assert_eq!(statuses.items.len(), 1);
        assert_eq!(backend.get_order(&order.id).await.unwrap().id, order.id);
    }

    #[tokio::test]
    async fn test_create_order_rejects_unknown_parameters() {
        let backend = Arc::new(InMemoryBackend::new());
        let product = server_product(&backend);
        let result = backend
            .create_order(&product, payload(Map::from_iter([("bogus".to_string(), json!(1))])))
            .await;
        assert!(matches!(result, Err(BackendError::Constraints(message)) if message.contains("bogus")));
    }

    #[tokio::test]
    async fn test_orders_paginate_by_order_id() {
        let backend = Arc::new(InMemoryBackend::new());
        let product = server_product(&backend);
        for _ in 0..3 {
            backend.create_order(&product, payload(Map::new())).await.unwrap();
        }

        let first = backend.get_orders(None, 2).await.unwrap();
        assert_eq!(first.items.len(), 2);
        let token = first.next.unwrap();

        let second = backend.get_orders(Some(token.clone()), 2).await.unwrap();
        assert_eq!(second.items[0].id, token);
        assert!(second.next.is_none());

        assert!(matches!(
            backend.get_orders(Some("missing".to_string()), 2).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_push_order_status_updates_current_status() {
        let backend = Arc::new(InMemoryBackend::new());
        let product = server_product(&backend);
        let order = backend.create_order(&product, payload(Map::new())).await.unwrap();

        backend
            .push_order_status(&order.id, OrderStatus::new(OrderStatusCode::Accepted, None, None))
            .await
            .unwrap();

        let stored = backend.get_order(&order.id).await.unwrap();
        assert_eq!(stored.properties.status.status_code, OrderStatusCode::Accepted);
        assert_eq!(backend.get_order_statuses(&order.id, None, 10).await.unwrap().items.len(), 2);
        assert!(backend
            .push_order_status("missing", OrderStatus::new(OrderStatusCode::Accepted, None, None))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_async_search_completes_immediately() {
        let backend = Arc::new(InMemoryBackend::with_opportunities(demo_opportunities(3)));
        let product = server_product(&backend);
        let now = Utc::now();
        let search = OpportunityPayload::new(
            DatetimeInterval::new(Some(now), Some(now + Duration::days(7))).unwrap(),
            Geometry::point(0.0, 0.0),
        );

        let record = backend.search_opportunities_async(&product, &search).await.unwrap();
        assert_eq!(record.status.status_code, OpportunitySearchStatusCode::Received);

        let stored = backend.get_search_record(&record.id).await.unwrap();
        assert_eq!(stored.status.status_code, OpportunitySearchStatusCode::Completed);

        let statuses = backend.get_search_record_statuses(&record.id, None, 10).await.unwrap();
        assert_eq!(statuses.items.len(), 3);

        let collection = backend.get_opportunity_collection(&product, &record.id).await.unwrap();
        assert_eq!(collection.features.len(), 3);
        assert_eq!(collection.id.as_deref(), Some(record.id.as_str()));
    }

    #[tokio::test]
    async fn test_opportunity_collection_is_scoped_to_its_product() {
        let backend = Arc::new(InMemoryBackend::new());
        let product = server_product(&backend);
        let mut other = demo_product();
        other.id = "other-product".to_string();
        let other = ServerProduct::new(other, backend.clone()).unwrap();

        let now = Utc::now();
        let search = OpportunityPayload::new(
            DatetimeInterval::new(Some(now), None).unwrap(),
            Geometry::point(0.0, 0.0),
        );
        let record = backend.search_opportunities_async(&product, &search).await.unwrap();

        let collection = backend.get_opportunity_collection(&product, &record.id).await.unwrap();
        assert!(collection.features.is_empty());
        assert!(matches!(
            backend.get_opportunity_collection(&other, &record.id).await,
            Err(BackendError::NotFound(_))
        ));
    }

    #[test]
    fn test_demo_router_builds() {
        let backend = Arc::new(InMemoryBackend::new());
        let router = demo_router(backend).unwrap();
        assert!(router.supports_async_opportunities());
    }
}
