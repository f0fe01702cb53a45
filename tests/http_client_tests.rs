//! Integration tests for the HTTP transport.
//!
//! These tests verify request building, query and body encoding, link
//! following, response parsing and error handling against a mock server.

use std::time::Duration;

use serde_json::{json, Value};
use stapi::clients::{HttpMethod, HttpRequest, StapiIo};
use stapi::models::{Link, RequestMethod};
use stapi::{ApiError, ClientConfig, ClientError, InvalidHttpRequestError, RootUrl};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn io_for(server: &MockServer) -> StapiIo {
    let config = ClientConfig::builder()
        .root_url(RootUrl::new(server.uri()).unwrap())
        .parameter("api_key", "secret")
        .build()
        .unwrap();
    StapiIo::new(&config).unwrap()
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_get_parameters_become_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/products"))
        .and(query_param("limit", "5"))
        .and(query_param("api_key", "secret"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"products": []})))
        .expect(1)
        .mount(&server)
        .await;

    let body = io_for(&server)
        .read_json("/products", HttpMethod::Get, Some(json!({"limit": 5})))
        .await
        .unwrap();

    assert_eq!(body, json!({"products": []}));
}

#[tokio::test]
async fn test_post_without_parameters_sends_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/p1/orders"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "o-1"})))
        .expect(1)
        .mount(&server)
        .await;

    let body = io_for(&server)
        .read_json("/products/p1/orders", HttpMethod::Post, None)
        .await
        .unwrap();

    assert_eq!(body["id"], "o-1");
}

#[tokio::test]
async fn test_follow_sends_link_method_headers_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/p1/opportunities"))
        .and(header("prefer", "wait"))
        .and(body_json(json!({"limit": 3})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("Preference-Applied", "wait")
                .set_body_json(json!({"features": []})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let link = Link::new("/products/p1/opportunities", "opportunities")
        .with_method(RequestMethod::Post)
        .with_header("Prefer", "wait")
        .with_body(json!({"limit": 3}));
    let response = io_for(&server).follow(&link).await.unwrap();

    assert_eq!(response.code, 200);
    assert_eq!(response.header("Preference-Applied"), Some("wait"));
}

#[test]
fn test_invalid_requests_are_rejected_before_sending() {
    let result = HttpRequest::builder(HttpMethod::Post, "https://stapi.example.com/orders").build();
    assert!(matches!(
        result,
        Err(InvalidHttpRequestError::MissingBody { .. })
    ));

    let result = HttpRequest::builder(HttpMethod::Get, "https://stapi.example.com/orders")
        .body(json!("limit=5"))
        .build();
    assert!(matches!(result, Err(InvalidHttpRequestError::NonObjectQuery)));
}

// ============================================================================
// Pages
// ============================================================================

#[tokio::test]
async fn test_fetch_page_merges_next_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "features": [{"id": "a"}],
            "links": [{
                "href": format!("{}/search", server.uri()),
                "rel": "next",
                "method": "POST",
                "body": {"next": "t2"},
                "merge": true
            }]
        })))
        .mount(&server)
        .await;

    let link = Link::new("/search", "search")
        .with_method(RequestMethod::Post)
        .with_body(json!({"limit": 1, "next": null}));
    let (page, next) = io_for(&server).fetch_page(&link, "features").await.unwrap();

    assert_eq!(page.unwrap()["features"][0]["id"], "a");
    let next = next.unwrap();
    assert_eq!(next.body, Some(json!({"limit": 1, "next": "t2"})));
    assert!(!next.merge);
}

#[tokio::test]
async fn test_fetch_page_without_items_ends() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "features": [],
            "links": [{"href": "/orders?page=2", "rel": "next"}]
        })))
        .mount(&server)
        .await;

    let (page, next) = io_for(&server)
        .fetch_page(&Link::new("/orders", "orders"), "features")
        .await
        .unwrap();

    assert!(page.is_none());
    assert!(next.is_none());
}

// ============================================================================
// Responses and errors
// ============================================================================

#[tokio::test]
async fn test_error_status_carries_problem_detail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders/o-9"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Order not found"})))
        .mount(&server)
        .await;

    let result = io_for(&server)
        .read_json("/orders/o-9", HttpMethod::Get, None)
        .await;

    match result {
        Err(ClientError::Api(e)) => {
            assert!(e.is_not_found());
            assert_eq!(e.message, "Order not found");
        }
        other => panic!("expected API error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_body_is_kept_as_text() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let body = io_for(&server)
        .read_json("/health", HttpMethod::Get, None)
        .await
        .unwrap();

    assert_eq!(body, Value::String("ok".to_string()));
}

#[tokio::test]
async fn test_connection_failure_is_retried_then_reported() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::builder()
        .root_url(RootUrl::new(format!("http://{addr}")).unwrap())
        .max_retries(Some(1))
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let io = StapiIo::new(&config).unwrap();

    let result = io.read_json("/", HttpMethod::Get, None).await;

    match result {
        Err(ClientError::Api(e)) => assert_eq!(e.status_code, None),
        other => panic!("expected connection error, got {other:?}"),
    }
}

fn timing_out_io(server: &MockServer) -> StapiIo {
    let config = ClientConfig::builder()
        .root_url(RootUrl::new(server.uri()).unwrap())
        .max_retries(Some(2))
        .timeout(Duration::from_millis(200))
        .build()
        .unwrap();
    StapiIo::new(&config).unwrap()
}

#[tokio::test]
async fn test_timed_out_post_is_not_resent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/products/p1/orders"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_delay(Duration::from_millis(600))
                .set_body_json(json!({"id": "o-1"})),
        )
        .mount(&server)
        .await;

    let result = timing_out_io(&server)
        .read_json("/products/p1/orders", HttpMethod::Post, Some(json!({"a": 1})))
        .await;

    assert!(matches!(result, Err(ClientError::Api(ApiError { status_code: None, .. }))));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_timed_out_get_is_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/orders"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(600))
                .set_body_json(json!({"features": []})),
        )
        .mount(&server)
        .await;

    let result = timing_out_io(&server)
        .read_json("/orders", HttpMethod::Get, None)
        .await;

    assert!(result.is_err());
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
