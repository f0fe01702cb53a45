//! The axum router serving the STAPI path table.
//!
//! [`RootRouter`] collects the API description, the root backend and the
//! products, then builds an [`axum::Router`]. Each product gets its own
//! nested router under `/products/{id}` whose routes depend on the
//! backends the product supplies.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stapi::server::{memory::InMemoryBackend, RootRouter};
//!
//! let backend = Arc::new(InMemoryBackend::default());
//! let app = RootRouter::new(backend.clone())
//!     .with_search_records(backend.clone())
//!     .add_product(product)?
//!     .into_router();
//!
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8000").await?;
//! axum::serve(listener, app).await?;
//! ```

use std::sync::Arc;

use axum::extract::{OriginalUri, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::backend::{OpportunitySearchRecords, RootBackend};
use super::errors::{ApiProblem, RouterError};
use super::product::ServerProduct;
use crate::conformance::{ConformanceClass, ConformanceRegistry};
use crate::models::{
    Conformance, Link, OpportunityCollection, OpportunityPayload, OpportunitySearchRecord,
    OpportunitySearchRecords as SearchRecordsPage, OpportunitySearchStatusCode,
    OpportunitySearchStatuses, Order, OrderCollection, OrderPayload, OrderStatuses, Prefer,
    Product, ProductsCollection, RequestMethod, RootResponse,
};

/// Media type of plain JSON documents.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Media type of GeoJSON documents.
pub const GEOJSON_MEDIA_TYPE: &str = "application/geo+json";

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

const PREFERENCE_APPLIED: &str = "preference-applied";
const PREFER: &str = "prefer";

/// Query parameters of paginated listings.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Pagination token.
    pub next: Option<String>,
    /// Page size, capped at 100.
    pub limit: Option<usize>,
}

impl ListParams {
    fn limit(&self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }
}

/// Builder for the root STAPI router.
pub struct RootRouter {
    id: String,
    title: String,
    description: String,
    conformances: Vec<String>,
    registry: ConformanceRegistry,
    base_url: Option<String>,
    backend: Arc<dyn RootBackend>,
    search_records: Option<Arc<dyn OpportunitySearchRecords>>,
    products: Vec<ServerProduct>,
}

impl RootRouter {
    /// Creates a router whose order endpoints are served by `backend`.
    ///
    /// The API advertises the core class until
    /// [`with_conformances`](Self::with_conformances) says otherwise.
    #[must_use]
    pub fn new(backend: Arc<dyn RootBackend>) -> Self {
        let registry = ConformanceRegistry::default();
        Self {
            id: "stapi-rust".to_string(),
            title: "STAPI".to_string(),
            description: "A STAPI implementation".to_string(),
            conformances: vec![registry.uri(ConformanceClass::Core)],
            registry,
            base_url: None,
            backend,
            search_records: None,
            products: Vec::new(),
        }
    }

    /// Sets the API identifier.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the API title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the API description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Replaces the base conformance list.
    #[must_use]
    pub fn with_conformances(mut self, conformances: Vec<String>) -> Self {
        self.conformances = conformances;
        self
    }

    /// Sets the registry used to build conformance URIs.
    #[must_use]
    pub fn with_registry(mut self, registry: ConformanceRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Fixes the base URL used in links. Without one, links are built from
    /// the request's `Host` header.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into().trim_end_matches('/').to_string());
        self
    }

    /// Enables the opportunity search record endpoints and asynchronous
    /// opportunity search.
    #[must_use]
    pub fn with_search_records(mut self, backend: Arc<dyn OpportunitySearchRecords>) -> Self {
        self.search_records = Some(backend);
        self
    }

    /// Registers a product.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::DuplicateProduct`] if a product with the same
    /// id is already registered.
    pub fn add_product(mut self, product: ServerProduct) -> Result<Self, RouterError> {
        if self.products.iter().any(|p| p.id() == product.id()) {
            return Err(RouterError::DuplicateProduct {
                product_id: product.id().to_string(),
            });
        }
        self.products.push(product);
        Ok(self)
    }

    /// Returns true if the API supports asynchronous opportunity search.
    #[must_use]
    pub const fn supports_async_opportunities(&self) -> bool {
        self.search_records.is_some()
    }

    /// Returns the conformance URIs the API advertises.
    #[must_use]
    pub fn conformances(&self) -> Vec<String> {
        let mut conformances = self.conformances.clone();
        let mut classes = vec![ConformanceClass::OrderStatuses];
        if self.supports_async_opportunities() {
            classes.push(ConformanceClass::SearchesOpportunity);
            classes.push(ConformanceClass::SearchesOpportunityStatuses);
        }
        for class in classes {
            let uri = self.registry.uri(class);
            if !conformances.contains(&uri) {
                conformances.push(uri);
            }
        }
        conformances
    }

    /// Builds the axum router.
    #[must_use]
    pub fn into_router(self) -> Router {
        let conformances = self.conformances();
        let supports_async = self.supports_async_opportunities();
        let state = Arc::new(RootState {
            id: self.id,
            title: self.title,
            description: self.description,
            conformances,
            registry: self.registry,
            base_url: self.base_url,
            backend: self.backend,
            search_records: self.search_records,
            products: self.products,
            supports_async,
        });

        let mut router = Router::new()
            .route("/", get(get_root))
            .route("/conformance", get(get_conformance))
            .route("/products", get(get_products))
            .route("/orders", get(get_orders))
            .route("/orders/:order_id", get(get_order))
            .route("/orders/:order_id/statuses", get(get_order_statuses));
        if state.search_records.is_some() {
            router = router
                .route("/searches/opportunities", get(get_search_records))
                .route("/searches/opportunities/:search_record_id", get(get_search_record))
                .route(
                    "/searches/opportunities/:search_record_id/statuses",
                    get(get_search_record_statuses),
                );
        }

        let mut app: Router = router.with_state(Arc::clone(&state));
        for product in &state.products {
            app = app.nest(&format!("/products/{}", product.id()), product_routes(&state, product));
        }

        tracing::debug!(
            products = state.products.len(),
            supports_async,
            "Built STAPI router"
        );
        app
    }
}

struct RootState {
    id: String,
    title: String,
    description: String,
    conformances: Vec<String>,
    registry: ConformanceRegistry,
    base_url: Option<String>,
    backend: Arc<dyn RootBackend>,
    search_records: Option<Arc<dyn OpportunitySearchRecords>>,
    products: Vec<ServerProduct>,
    supports_async: bool,
}

impl RootState {
    fn base(&self, headers: &HeaderMap) -> String {
        if let Some(base_url) = &self.base_url {
            return base_url.clone();
        }
        let host = headers
            .get(header::HOST)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("localhost");
        format!("http://{host}")
    }

    fn product_supports_search(&self, product: &ServerProduct) -> bool {
        product.supports_opportunities() || (self.supports_async && product.supports_async_opportunities())
    }

    fn product_links(&self, base: &str, product: &ServerProduct) -> Vec<Link> {
        let href = product_href(base, product.id());
        let mut links = vec![
            Link::new(href.clone(), "self").with_type(JSON_MEDIA_TYPE),
            Link::new(format!("{href}/conformance"), "conformance").with_type(JSON_MEDIA_TYPE),
            Link::new(format!("{href}/queryables"), "queryables").with_type(JSON_MEDIA_TYPE),
            Link::new(format!("{href}/order-parameters"), "order-parameters").with_type(JSON_MEDIA_TYPE),
            Link::new(format!("{href}/orders"), "create-order")
                .with_type(JSON_MEDIA_TYPE)
                .with_method(RequestMethod::Post),
        ];
        if self.product_supports_search(product) {
            links.push(
                Link::new(format!("{href}/opportunities"), "opportunities")
                    .with_type(JSON_MEDIA_TYPE)
                    .with_method(RequestMethod::Post),
            );
        }
        links
    }

    fn with_order_links(base: &str, mut order: Order) -> Order {
        let href = order_href(base, &order.id);
        order.links.push(Link::new(href.clone(), "self").with_type(GEOJSON_MEDIA_TYPE));
        order
            .links
            .push(Link::new(format!("{href}/statuses"), "monitor").with_type(JSON_MEDIA_TYPE));
        order
    }

    fn with_search_record_links(base: &str, mut record: OpportunitySearchRecord) -> OpportunitySearchRecord {
        let href = search_record_href(base, &record.id);
        record.links.push(Link::new(href.clone(), "self").with_type(JSON_MEDIA_TYPE));
        record
            .links
            .push(Link::new(format!("{href}/statuses"), "monitor").with_type(JSON_MEDIA_TYPE));
        if record.status.status_code == OpportunitySearchStatusCode::Completed {
            record.links.push(
                Link::new(
                    format!(
                        "{}/opportunities/{}",
                        product_href(base, &record.product_id),
                        urlencoding::encode(&record.id)
                    ),
                    "opportunities",
                )
                .with_type(GEOJSON_MEDIA_TYPE),
            );
        }
        record
    }

    fn search_records(&self) -> Result<&dyn OpportunitySearchRecords, ApiProblem> {
        self.search_records
            .as_deref()
            .ok_or_else(|| ApiProblem::not_found("Not Found"))
    }
}

fn product_href(base: &str, product_id: &str) -> String {
    format!("{base}/products/{}", urlencoding::encode(product_id))
}

fn order_href(base: &str, order_id: &str) -> String {
    format!("{base}/orders/{}", urlencoding::encode(order_id))
}

fn search_record_href(base: &str, search_record_id: &str) -> String {
    format!("{base}/searches/opportunities/{}", urlencoding::encode(search_record_id))
}

fn next_link(href: &str, token: &str, limit: usize) -> Link {
    Link::new(
        format!("{href}?next={}&limit={limit}", urlencoding::encode(token)),
        "next",
    )
    .with_type(JSON_MEDIA_TYPE)
}

fn geojson_response<T: Serialize>(status: StatusCode, body: &T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(GEOJSON_MEDIA_TYPE));
    response
}

fn set_header(response: &mut Response, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            response.headers_mut().insert(name, value);
        }
        Err(e) => tracing::warn!(header = %name, error = %e, "Skipping invalid header value"),
    }
}

// ============================================================================
// Root routes
// ============================================================================

async fn get_root(State(state): State<Arc<RootState>>, headers: HeaderMap) -> Json<RootResponse> {
    let base = state.base(&headers);
    let mut links = vec![
        Link::new(format!("{base}/"), "self").with_type(JSON_MEDIA_TYPE),
        Link::new(format!("{base}/conformance"), "conformance").with_type(JSON_MEDIA_TYPE),
        Link::new(format!("{base}/products"), "products").with_type(JSON_MEDIA_TYPE),
        Link::new(format!("{base}/orders"), "orders").with_type(GEOJSON_MEDIA_TYPE),
    ];
    if state.search_records.is_some() {
        links.push(
            Link::new(format!("{base}/searches/opportunities"), "opportunity-search-records")
                .with_type(JSON_MEDIA_TYPE),
        );
    }

    Json(RootResponse {
        id: state.id.clone(),
        conforms_to: state.conformances.clone(),
        title: state.title.clone(),
        description: state.description.clone(),
        links,
    })
}

async fn get_conformance(State(state): State<Arc<RootState>>) -> Json<Conformance> {
    Json(Conformance::new(state.conformances.clone()))
}

async fn get_products(
    State(state): State<Arc<RootState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<ProductsCollection>, ApiProblem> {
    let base = state.base(&headers);
    let limit = params.limit();
    let start = match &params.next {
        Some(token) => state
            .products
            .iter()
            .position(|p| p.id() == token)
            .ok_or_else(|| ApiProblem::not_found(format!("Invalid pagination token '{token}'")))?,
        None => 0,
    };
    let end = start.saturating_add(limit).min(state.products.len());

    let products = state.products[start..end]
        .iter()
        .map(|product| product.product().with_links(state.product_links(&base, product)))
        .collect();

    let href = format!("{base}/products");
    let mut links = vec![Link::new(href.clone(), "self").with_type(JSON_MEDIA_TYPE)];
    if let Some(next) = state.products.get(end) {
        links.push(next_link(&href, next.id(), limit));
    }

    Ok(Json(ProductsCollection::new(products, links)))
}

async fn get_orders(
    State(state): State<Arc<RootState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiProblem> {
    let base = state.base(&headers);
    let limit = params.limit();
    let page = state
        .backend
        .get_orders(params.next, limit)
        .await
        .map_err(|e| ApiProblem::from_backend(e, "Error finding Orders"))?;

    let features = page
        .items
        .into_iter()
        .map(|order| RootState::with_order_links(&base, order))
        .collect();
    let mut links = Vec::new();
    if let Some(token) = page.next {
        links.push(next_link(&format!("{base}/orders"), &token, limit));
    }

    Ok(geojson_response(StatusCode::OK, &OrderCollection::new(features, links)))
}

async fn get_order(
    State(state): State<Arc<RootState>>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
) -> Result<Response, ApiProblem> {
    let base = state.base(&headers);
    let order = state
        .backend
        .get_order(&order_id)
        .await
        .map_err(|e| ApiProblem::from_backend_or_missing(e, "Error finding Order", "Order not found"))?;

    Ok(geojson_response(StatusCode::OK, &RootState::with_order_links(&base, order)))
}

async fn get_order_statuses(
    State(state): State<Arc<RootState>>,
    headers: HeaderMap,
    Path(order_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<OrderStatuses>, ApiProblem> {
    let base = state.base(&headers);
    let limit = params.limit();
    let page = state
        .backend
        .get_order_statuses(&order_id, params.next, limit)
        .await
        .map_err(|e| ApiProblem::from_backend(e, "Error finding Order Statuses"))?;

    let href = format!("{}/statuses", order_href(&base, &order_id));
    let mut links = vec![Link::new(href.clone(), "self").with_type(JSON_MEDIA_TYPE)];
    if let Some(token) = page.next {
        links.push(next_link(&href, &token, limit));
    }

    Ok(Json(OrderStatuses {
        statuses: page.items,
        links,
    }))
}

async fn get_search_records(
    State(state): State<Arc<RootState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<SearchRecordsPage>, ApiProblem> {
    let base = state.base(&headers);
    let limit = params.limit();
    let page = state
        .search_records()?
        .get_search_records(params.next, limit)
        .await
        .map_err(|e| ApiProblem::from_backend(e, "Error finding Opportunity Search Records"))?;

    let href = format!("{base}/searches/opportunities");
    let mut links = vec![Link::new(href.clone(), "self").with_type(JSON_MEDIA_TYPE)];
    if let Some(token) = page.next {
        links.push(next_link(&href, &token, limit));
    }

    Ok(Json(SearchRecordsPage {
        search_records: page
            .items
            .into_iter()
            .map(|record| RootState::with_search_record_links(&base, record))
            .collect(),
        links,
    }))
}

async fn get_search_record(
    State(state): State<Arc<RootState>>,
    headers: HeaderMap,
    Path(search_record_id): Path<String>,
) -> Result<Json<OpportunitySearchRecord>, ApiProblem> {
    let base = state.base(&headers);
    let record = state
        .search_records()?
        .get_search_record(&search_record_id)
        .await
        .map_err(|e| {
            ApiProblem::from_backend_or_missing(
                e,
                "Error finding Opportunity Search Record",
                "Opportunity Search Record not found",
            )
        })?;

    Ok(Json(RootState::with_search_record_links(&base, record)))
}

async fn get_search_record_statuses(
    State(state): State<Arc<RootState>>,
    headers: HeaderMap,
    Path(search_record_id): Path<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<OpportunitySearchStatuses>, ApiProblem> {
    let base = state.base(&headers);
    let limit = params.limit();
    let page = state
        .search_records()?
        .get_search_record_statuses(&search_record_id, params.next, limit)
        .await
        .map_err(|e| ApiProblem::from_backend(e, "Error finding Opportunity Search Record Statuses"))?;

    let href = format!("{}/statuses", search_record_href(&base, &search_record_id));
    let mut links = vec![Link::new(href.clone(), "self").with_type(JSON_MEDIA_TYPE)];
    if let Some(token) = page.next {
        links.push(next_link(&href, &token, limit));
    }

    Ok(Json(OpportunitySearchStatuses {
        statuses: page.items,
        links,
    }))
}

// ============================================================================
// Product routes
// ============================================================================

struct ProductContext {
    root: Arc<RootState>,
    product: ServerProduct,
    conformances: Vec<String>,
}

impl ProductContext {
    fn href(&self, base: &str, subpath: &str) -> String {
        format!("{}/{subpath}", product_href(base, self.product.id()))
    }
}

fn product_routes(root: &Arc<RootState>, product: &ServerProduct) -> Router {
    let context = Arc::new(ProductContext {
        root: Arc::clone(root),
        product: product.clone(),
        conformances: product.conformances(&root.registry, root.supports_async),
    });

    let mut router = Router::new()
        .route("/", get(get_product))
        .route("/conformance", get(get_product_conformance))
        .route("/queryables", get(get_queryables))
        .route("/order-parameters", get(get_order_parameters))
        .route("/orders", post(create_order));
    if root.product_supports_search(product) {
        router = router.route("/opportunities", post(search_opportunities));
    }
    if root.supports_async && product.supports_async_opportunities() {
        router = router.route("/opportunities/:collection_id", get(get_opportunity_collection));
    }
    router.with_state(context)
}

async fn get_product(State(ctx): State<Arc<ProductContext>>, headers: HeaderMap) -> Json<Product> {
    let base = ctx.root.base(&headers);
    Json(ctx.product.product().with_links(ctx.root.product_links(&base, &ctx.product)))
}

async fn get_product_conformance(State(ctx): State<Arc<ProductContext>>) -> Json<Conformance> {
    Json(Conformance::new(ctx.conformances.clone()))
}

async fn get_queryables(State(ctx): State<Arc<ProductContext>>, headers: HeaderMap) -> Json<serde_json::Value> {
    let base = ctx.root.base(&headers);
    Json(ctx.product.queryables_schema(&ctx.href(&base, "queryables")))
}

async fn get_order_parameters(State(ctx): State<Arc<ProductContext>>, headers: HeaderMap) -> Json<serde_json::Value> {
    let base = ctx.root.base(&headers);
    Json(ctx.product.order_parameters_schema(&ctx.href(&base, "order-parameters")))
}

async fn create_order(
    State(ctx): State<Arc<ProductContext>>,
    headers: HeaderMap,
    Json(payload): Json<OrderPayload>,
) -> Result<Response, ApiProblem> {
    let base = ctx.root.base(&headers);
    let order = ctx
        .product
        .create_order_backend()
        .create_order(&ctx.product, payload)
        .await
        .map_err(|e| ApiProblem::from_backend(e, "Error creating order"))?;

    tracing::debug!(product_id = ctx.product.id(), order_id = %order.id, "Created order");
    let location = order_href(&base, &order.id);
    let mut response = geojson_response(StatusCode::CREATED, &RootState::with_order_links(&base, order));
    set_header(&mut response, header::LOCATION, &location);
    Ok(response)
}

fn parse_prefer(headers: &HeaderMap) -> Result<Option<Prefer>, ApiProblem> {
    let Some(value) = headers.get(PREFER) else {
        return Ok(None);
    };
    let raw = String::from_utf8_lossy(value.as_bytes());
    raw.parse::<Prefer>()
        .map(Some)
        .map_err(|_| ApiProblem::bad_request(format!("Invalid Prefer header value: {raw}")))
}

async fn search_opportunities(
    State(ctx): State<Arc<ProductContext>>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Json(search): Json<OpportunityPayload>,
) -> Result<Response, ApiProblem> {
    let prefer = parse_prefer(&headers)?;
    let base = ctx.root.base(&headers);

    let sync_backend = ctx.product.search_backend();
    let async_backend = if ctx.root.supports_async {
        ctx.product.search_async_backend()
    } else {
        None
    };
    let wait_for_sync = prefer == Some(Prefer::Wait) && sync_backend.is_some();

    match (sync_backend, async_backend) {
        (_, Some(backend)) if !wait_for_sync => {
            let record = backend
                .search_opportunities_async(&ctx.product, &search)
                .await
                .map_err(|e| ApiProblem::from_backend(e, "Error initiating an asynchronous opportunity search"))?;

            let location = search_record_href(&base, &record.id);
            let record = RootState::with_search_record_links(&base, record);
            let mut response = (StatusCode::CREATED, Json(&record)).into_response();
            set_header(&mut response, header::LOCATION, &location);
            if prefer.is_some() {
                set_header(&mut response, HeaderName::from_static(PREFERENCE_APPLIED), Prefer::RespondAsync.as_str());
            }
            Ok(response)
        }
        (Some(backend), _) => {
            let page = backend
                .search_opportunities(&ctx.product, &search)
                .await
                .map_err(|e| ApiProblem::from_backend(e, "Error searching opportunities"))?;

            let create_order_href = ctx.href(&base, "orders");
            let features = page
                .items
                .into_iter()
                .map(|mut opportunity| {
                    let body = json!({
                        "datetime": &opportunity.properties.datetime,
                        "geometry": &opportunity.geometry,
                        "filter": &search.filter,
                    });
                    opportunity.links.push(
                        Link::new(create_order_href.clone(), "create-order")
                            .with_type(JSON_MEDIA_TYPE)
                            .with_method(RequestMethod::Post)
                            .with_body(body),
                    );
                    opportunity
                })
                .collect();

            let mut links = vec![Link::new(create_order_href.clone(), "create-order")
                .with_type(JSON_MEDIA_TYPE)
                .with_method(RequestMethod::Post)
                .with_body(search.search_body())];
            if let Some(token) = page.next {
                let next_search = OpportunityPayload {
                    next: Some(token),
                    ..search.clone()
                };
                let mut next = Link::new(format!("{base}{}", uri.path()), "next")
                    .with_type(JSON_MEDIA_TYPE)
                    .with_method(RequestMethod::Post)
                    .with_body(next_search.body());
                if let Some(prefer) = prefer {
                    next = next.with_header("Prefer", prefer.as_str());
                }
                links.push(next);
            }

            let mut response = Json(OpportunityCollection::new(features, links)).into_response();
            if prefer == Some(Prefer::Wait) && ctx.root.supports_async {
                set_header(&mut response, HeaderName::from_static(PREFERENCE_APPLIED), Prefer::Wait.as_str());
            }
            Ok(response)
        }
        (None, _) => Err(ApiProblem::not_found("Not Found")),
    }
}

async fn get_opportunity_collection(
    State(ctx): State<Arc<ProductContext>>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Path(collection_id): Path<String>,
) -> Result<Response, ApiProblem> {
    let base = ctx.root.base(&headers);
    let backend = ctx
        .product
        .search_async_backend()
        .ok_or_else(|| ApiProblem::not_found("Not Found"))?;

    let mut collection = backend
        .get_opportunity_collection(&ctx.product, &collection_id)
        .await
        .map_err(|e| {
            ApiProblem::from_backend_or_missing(
                e,
                "Error fetching Opportunity Collection",
                "Opportunity Collection not found",
            )
        })?;
    collection
        .links
        .push(Link::new(format!("{base}{}", uri.path()), "self").with_type(GEOJSON_MEDIA_TYPE));

    Ok(geojson_response(StatusCode::OK, &collection))
}
