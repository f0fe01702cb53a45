//! End-to-end tests for the server router.
//!
//! Each test binds a real axum server to `127.0.0.1:0` backed by the
//! in-memory backend and talks to it over HTTP, either with raw requests or
//! through the STAPI client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use futures::TryStreamExt;
use serde_json::{json, Value};
use stapi::clients::take_items;
use stapi::conformance::geojson;
use stapi::models::{Geometry, Order, OrderPayload};
use stapi::server::memory::{demo_opportunities, demo_product, demo_router, InMemoryBackend};
use stapi::server::{BackendError, CreateOrder, RootRouter, ServerProduct};
use stapi::{Client, ClientError, ConformanceClass, ConformanceRegistry};

/// Serves `router` on an ephemeral port and returns its base URL.
async fn spawn(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Serves the demo catalog with `opportunities` canned opportunities.
async fn spawn_demo(opportunities: u32) -> (String, Arc<InMemoryBackend>) {
    let backend = Arc::new(InMemoryBackend::with_opportunities(demo_opportunities(opportunities)));
    let router = demo_router(backend.clone()).unwrap().into_router();
    (spawn(router).await, backend)
}

/// Serves a catalog whose only product searches synchronously.
async fn spawn_sync_only() -> String {
    let backend = Arc::new(InMemoryBackend::with_opportunities(demo_opportunities(3)));
    let product = ServerProduct::new(demo_product(), backend.clone())
        .unwrap()
        .with_search(backend.clone());
    let router = RootRouter::new(backend).add_product(product).unwrap().into_router();
    spawn(router).await
}

fn search_body(limit: u32) -> Value {
    let start = Utc::now();
    json!({
        "datetime": format!("{}/{}", start.to_rfc3339(), (start + Duration::days(7)).to_rfc3339()),
        "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
        "filter": {"op": "and", "args": []},
        "limit": limit
    })
}

fn order_body(order_parameters: Value) -> Value {
    json!({
        "datetime": "2025-01-01T00:00:00Z/2025-01-08T00:00:00Z",
        "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
        "order_parameters": order_parameters
    })
}

fn rels(document: &Value) -> Vec<String> {
    document["links"]
        .as_array()
        .unwrap()
        .iter()
        .map(|link| link["rel"].as_str().unwrap().to_string())
        .collect()
}

fn header(response: &reqwest::Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .map(|value| value.to_str().unwrap().to_string())
}

// ============================================================================
// Root
// ============================================================================

#[tokio::test]
async fn test_root_document_and_conformance() {
    let (base, _) = spawn_demo(0).await;
    let registry = ConformanceRegistry::default();

    let root: Value = reqwest::get(format!("{base}/")).await.unwrap().json().await.unwrap();
    assert_eq!(root["id"], "stapi-demo");
    assert_eq!(
        rels(&root),
        vec!["self", "conformance", "products", "orders", "opportunity-search-records"]
    );
    assert_eq!(root["links"][3]["type"], "application/geo+json");

    let conformance: Value = reqwest::get(format!("{base}/conformance"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let uris: Vec<String> = serde_json::from_value(conformance["conformsTo"].clone()).unwrap();
    for class in [
        ConformanceClass::Core,
        ConformanceClass::OrderStatuses,
        ConformanceClass::SearchesOpportunity,
        ConformanceClass::SearchesOpportunityStatuses,
    ] {
        assert!(registry.matches(class, &uris), "missing {class}");
    }
}

#[tokio::test]
async fn test_sync_only_api_has_no_search_record_routes() {
    let base = spawn_sync_only().await;

    let root: Value = reqwest::get(format!("{base}/")).await.unwrap().json().await.unwrap();
    assert!(!rels(&root).contains(&"opportunity-search-records".to_string()));

    let response = reqwest::get(format!("{base}/searches/opportunities")).await.unwrap();
    assert_eq!(response.status(), 404);
}

// ============================================================================
// Products
// ============================================================================

#[tokio::test]
async fn test_product_links_and_conformance() {
    let (base, _) = spawn_demo(0).await;
    let registry = ConformanceRegistry::default();

    let product: Value = reqwest::get(format!("{base}/products/test-spotlight"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        rels(&product),
        vec!["self", "conformance", "queryables", "order-parameters", "create-order", "opportunities"]
    );
    assert_eq!(product["links"][4]["method"], "POST");

    let conformance: Value = reqwest::get(format!("{base}/products/test-spotlight/conformance"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let uris: Vec<String> = serde_json::from_value(conformance["conformsTo"].clone()).unwrap();
    assert!(uris.contains(&geojson::POINT.to_string()));
    assert!(registry.matches(ConformanceClass::Opportunities, &uris));
    assert!(registry.matches(ConformanceClass::AsyncOpportunities, &uris));
}

#[tokio::test]
async fn test_sync_only_product_conformance() {
    let base = spawn_sync_only().await;
    let registry = ConformanceRegistry::default();

    let conformance: Value = reqwest::get(format!("{base}/products/test-spotlight/conformance"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let uris: Vec<String> = serde_json::from_value(conformance["conformsTo"].clone()).unwrap();
    assert!(registry.matches(ConformanceClass::Opportunities, &uris));
    assert!(!registry.matches(ConformanceClass::AsyncOpportunities, &uris));
}

#[tokio::test]
async fn test_queryables_and_order_parameters() {
    let (base, _) = spawn_demo(0).await;

    let queryables: Value = reqwest::get(format!("{base}/products/test-spotlight/queryables"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(queryables["title"], "Queryables");
    assert_eq!(queryables["properties"]["off_nadir"]["type"], "number");

    let parameters: Value = reqwest::get(format!("{base}/products/test-spotlight/order-parameters"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(parameters["properties"]["s3_path"]["type"], "string");
}

#[tokio::test]
async fn test_products_pagination() {
    let backend = Arc::new(InMemoryBackend::new());
    let mut router = RootRouter::new(backend.clone());
    for id in ["alpha", "beta", "gamma"] {
        let mut product = demo_product();
        product.id = id.to_string();
        router = router
            .add_product(ServerProduct::new(product, backend.clone()).unwrap())
            .unwrap();
    }
    let base = spawn(router.into_router()).await;

    let page: Value = reqwest::get(format!("{base}/products?limit=2"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["products"].as_array().unwrap().len(), 2);
    let next = page["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|link| link["rel"] == "next")
        .unwrap();
    assert_eq!(next["href"], format!("{base}/products?next=gamma&limit=2"));

    let last: Value = reqwest::get(next["href"].as_str().unwrap())
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(last["products"][0]["id"], "gamma");
    assert_eq!(rels(&last), vec!["self"]);

    let response = reqwest::get(format!("{base}/products?next=delta")).await.unwrap();
    assert_eq!(response.status(), 404);
}

#[test]
fn test_duplicate_products_are_rejected() {
    let backend = Arc::new(InMemoryBackend::new());
    let product = ServerProduct::new(demo_product(), backend.clone()).unwrap();
    let result = RootRouter::new(backend)
        .add_product(product.clone())
        .unwrap()
        .add_product(product);
    assert!(result.is_err());
}

// ============================================================================
// Orders
// ============================================================================

#[tokio::test]
async fn test_create_order_returns_created_with_location() {
    let (base, _) = spawn_demo(0).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{base}/products/test-spotlight/orders"))
        .json(&order_body(json!({"s3_path": "s3://bucket/key"})))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(header(&response, "content-type").as_deref(), Some("application/geo+json"));
    let location = header(&response, "location").unwrap();
    let order: Order = response.json().await.unwrap();
    assert_eq!(location, format!("{base}/orders/{}", order.id));
    assert_eq!(order.properties.status.status_code.as_str(), "received");
    assert!(order.links.iter().any(|link| link.rel == "monitor"));

    let fetched: Order = http.get(&location).send().await.unwrap().json().await.unwrap();
    assert_eq!(fetched.id, order.id);
}

#[tokio::test]
async fn test_create_order_with_unknown_parameter_is_unprocessable() {
    let (base, _) = spawn_demo(0).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/products/test-spotlight/orders"))
        .json(&order_body(json!({"priority": "high"})))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("priority"));
}

struct FailingOrders;

#[async_trait]
impl CreateOrder for FailingOrders {
    async fn create_order(&self, _: &ServerProduct, _: OrderPayload) -> Result<Order, BackendError> {
        Err(BackendError::Internal("connection to tasking system lost".to_string()))
    }
}

#[tokio::test]
async fn test_backend_failure_is_internal_error() {
    let backend = Arc::new(InMemoryBackend::new());
    let product = ServerProduct::new(demo_product(), Arc::new(FailingOrders)).unwrap();
    let base = spawn(RootRouter::new(backend).add_product(product).unwrap().into_router()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/products/test-spotlight/orders"))
        .json(&order_body(json!({})))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Error creating order");
}

#[tokio::test]
async fn test_unknown_order_is_not_found() {
    let (base, _) = spawn_demo(0).await;

    let response = reqwest::get(format!("{base}/orders/missing")).await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Order not found");
}

// ============================================================================
// Opportunities
// ============================================================================

#[tokio::test]
async fn test_invalid_prefer_header_is_bad_request() {
    let (base, _) = spawn_demo(3).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/products/test-spotlight/opportunities"))
        .header("Prefer", "sometimes")
        .json(&search_body(10))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Invalid Prefer header value: sometimes");
}

#[tokio::test]
async fn test_prefer_wait_searches_synchronously() {
    let (base, _) = spawn_demo(3).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/products/test-spotlight/opportunities"))
        .header("Prefer", "wait")
        .json(&search_body(2))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(header(&response, "preference-applied").as_deref(), Some("wait"));

    let collection: Value = response.json().await.unwrap();
    assert_eq!(collection["features"].as_array().unwrap().len(), 2);
    assert_eq!(rels(&collection), vec!["create-order", "next"]);

    let create_order = &collection["links"][0];
    assert_eq!(create_order["method"], "POST");
    assert_eq!(create_order["body"]["filter"], json!({"op": "and", "args": []}));
    assert!(create_order["body"].get("limit").is_none());

    let next = &collection["links"][1];
    assert_eq!(next["body"]["next"], "2");
    assert_eq!(next["body"]["limit"], 2);
    assert_eq!(next["headers"]["Prefer"], "wait");
}

#[tokio::test]
async fn test_search_without_prefer_is_asynchronous() {
    let (base, _) = spawn_demo(3).await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{base}/products/test-spotlight/opportunities"))
        .json(&search_body(10))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert!(header(&response, "preference-applied").is_none());
    let location = header(&response, "location").unwrap();
    let record: Value = response.json().await.unwrap();
    let record_id = record["id"].as_str().unwrap();
    assert_eq!(location, format!("{base}/searches/opportunities/{record_id}"));
    assert_eq!(record["status"]["status_code"], "received");

    let stored: Value = http.get(&location).send().await.unwrap().json().await.unwrap();
    assert_eq!(stored["status"]["status_code"], "completed");
    let results = stored["links"]
        .as_array()
        .unwrap()
        .iter()
        .find(|link| link["rel"] == "opportunities")
        .unwrap();

    let collection: Value = http
        .get(results["href"].as_str().unwrap())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(collection["features"].as_array().unwrap().len(), 3);
    assert_eq!(rels(&collection), vec!["self"]);

    let statuses: Value = http
        .get(format!("{location}/statuses"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(statuses["statuses"].as_array().unwrap().len(), 3);

    let records: Value = http
        .get(format!("{base}/searches/opportunities"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(records["search_records"][0]["id"], record_id);
}

#[tokio::test]
async fn test_respond_async_preference_is_applied() {
    let (base, _) = spawn_demo(1).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/products/test-spotlight/opportunities"))
        .header("Prefer", "respond-async")
        .json(&search_body(10))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    assert_eq!(
        header(&response, "preference-applied").as_deref(),
        Some("respond-async")
    );
}

#[tokio::test]
async fn test_unknown_opportunity_collection_is_not_found() {
    let (base, _) = spawn_demo(1).await;

    let response = reqwest::get(format!("{base}/products/test-spotlight/opportunities/nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Opportunity Collection not found");
}

#[tokio::test]
async fn test_sync_only_product_searches_without_prefer() {
    let base = spawn_sync_only().await;

    let response = reqwest::Client::new()
        .post(format!("{base}/products/test-spotlight/opportunities"))
        .json(&search_body(10))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert!(header(&response, "preference-applied").is_none());
    let collection: Value = response.json().await.unwrap();
    assert_eq!(collection["features"].as_array().unwrap().len(), 3);

    let response = reqwest::get(format!("{base}/products/test-spotlight/opportunities/any"))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

// ============================================================================
// Client against the router
// ============================================================================

#[tokio::test]
async fn test_client_round_trip_against_demo_server() {
    let (base, backend) = spawn_demo(5).await;
    let client = Client::open(&base).await.unwrap();

    assert!(client.has_conformance(ConformanceClass::Core));
    assert!(client.has_conformance(ConformanceClass::OrderStatuses));

    let products = take_items(client.list_products(Some(1)).await.unwrap(), None)
        .await
        .unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].id, "test-spotlight");

    let conformance = client.get_product_conformance("test-spotlight").await.unwrap();
    assert!(conformance.conforms_to.contains(&geojson::POINT.to_string()));

    let start = Utc::now();
    let opportunities: Vec<_> = client
        .search_opportunities(
            "test-spotlight",
            start,
            start + Duration::days(7),
            Geometry::point(0.0, 0.0),
            None,
            2,
        )
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    assert_eq!(opportunities.len(), 5);

    let create_order = opportunities[0]
        .links
        .iter()
        .find(|link| link.rel == "create-order")
        .unwrap();
    let payload: OrderPayload = serde_json::from_value(create_order.body.clone().unwrap()).unwrap();
    let order = client.create_order("test-spotlight", &payload).await.unwrap();
    assert_eq!(order.properties.product_id, "test-spotlight");

    let fetched = client.get_order(&order.id).await.unwrap();
    assert_eq!(fetched.id, order.id);

    client.create_order("test-spotlight", &payload).await.unwrap();
    let orders = take_items(client.list_orders(Some(1)).await.unwrap(), None)
        .await
        .unwrap();
    assert_eq!(orders.len(), 2);

    backend
        .push_order_status(
            &order.id,
            stapi::models::OrderStatus::new(stapi::models::OrderStatusCode::Accepted, None, None),
        )
        .await
        .unwrap();
    let statuses = take_items(client.list_order_statuses(&order.id, Some(1)).await.unwrap(), None)
        .await
        .unwrap();
    let codes: Vec<&str> = statuses.iter().map(|s| s.status_code.as_str()).collect();
    assert_eq!(codes, vec!["received", "accepted"]);
}

#[tokio::test]
async fn test_client_reports_missing_resources() {
    let (base, _) = spawn_demo(0).await;
    let client = Client::open(&base).await.unwrap();

    assert!(matches!(
        client.get_product("nope").await,
        Err(ClientError::NotFound { resource: "Product", .. })
    ));
    assert!(matches!(
        client.get_order("nope").await,
        Err(ClientError::NotFound { resource: "Order", .. })
    ));
}
