//! The STAPI client facade.
//!
//! [`Client`] is the entry point for talking to a STAPI server. Opening a
//! client discovers the server's links and conformance classes; the typed
//! accessors then follow those links.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{BoxStream, StreamExt};
use reqwest::Url;
use serde_json::{json, Value};

use crate::clients::errors::{ApiError, ClientError};
use crate::clients::http_client::StapiIo;
use crate::clients::http_request::HttpRequest;
use crate::clients::pagination::Pages;
use crate::clients::warnings::Advisory;
use crate::config::{ClientConfig, RootUrl};
use crate::conformance::ConformanceClass;
use crate::models::{
    Conformance, DatetimeInterval, Geometry, Link, Opportunity, OpportunityPayload, Order,
    OrderPayload, OrderStatus, Prefer, Product, RequestMethod,
};

/// Links assumed when the root document advertises none: (endpoint, rel).
const DEFAULT_LINKS: [(&str, &str); 2] = [("/conformance", "conformance"), ("/products", "products")];

/// A lazily paginated sequence of resources.
pub type ResourceStream<T> = BoxStream<'static, Result<T, ClientError>>;

/// A client for a STAPI server.
///
/// # Thread Safety
///
/// `Client` is `Send + Sync`. Streams returned by the list operations own a
/// handle to the transport and can outlive the borrow of the client.
///
/// # Example
///
/// ```rust,ignore
/// use futures::TryStreamExt;
/// use stapi::Client;
///
/// let client = Client::open("https://stapi.example.com").await?;
/// let products: Vec<_> = client.list_products(Some(10)).await?.try_collect().await?;
///
/// for product in products {
///     println!("{}: {}", product.id, product.title);
/// }
/// ```
#[derive(Debug)]
pub struct Client {
    io: Arc<StapiIo>,
    config: ClientConfig,
    links: Vec<Link>,
    conforms_to: Vec<String>,
}

// Verify Client is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Client>();
};

impl Client {
    /// Opens a client for the API rooted at `url` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the URL is invalid or the root document
    /// cannot be read.
    pub async fn open(url: &str) -> Result<Self, ClientError> {
        let config = ClientConfig::builder().root_url(RootUrl::new(url)?).build()?;
        Self::open_with(config).await
    }

    /// Opens a client with explicit configuration.
    ///
    /// Reads the root document for links, then `/conformance` for
    /// conformance classes, falling back to the root document's
    /// `conformsTo` if that endpoint fails.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the root document cannot be read or
    /// decoded, or if an advisory is raised under
    /// [`WarningPolicy::Error`](crate::WarningPolicy::Error).
    pub async fn open_with(config: ClientConfig) -> Result<Self, ClientError> {
        let io = Arc::new(StapiIo::new(&config)?);
        let mut client = Self {
            io,
            config,
            links: Vec::new(),
            conforms_to: Vec::new(),
        };

        let root = client.io.read_json("/", RequestMethod::Get, None).await?;
        client.read_links(&root)?;
        client.read_conformance(&root).await;

        if !client.has_conforms_to() {
            client.advise(Advisory::NoConformsTo)?;
        }
        if client.get_single_link(Some("products"), None).is_none() {
            client.advise(Advisory::MissingLink {
                rel: "products".to_string(),
                resource: "API".to_string(),
            })?;
        }

        tracing::debug!(
            root_url = %client.io.root_url(),
            links = client.links.len(),
            conforms_to = client.conforms_to.len(),
            "Opened STAPI client"
        );
        Ok(client)
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns the links discovered at the root.
    #[must_use]
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    fn read_links(&mut self, root: &Value) -> Result<(), ClientError> {
        let links: Vec<Link> = match root.get("links") {
            Some(links) if !links.is_null() => serde_json::from_value(links.clone())?,
            _ => Vec::new(),
        };

        if links.is_empty() {
            self.advise(Advisory::FallbackToDefaultLinks)?;
            self.links = DEFAULT_LINKS
                .iter()
                .map(|(endpoint, rel)| Ok(Link::new(self.io.resolve(endpoint)?.to_string(), *rel)))
                .collect::<Result<_, ClientError>>()?;
        } else {
            self.links = links;
        }
        Ok(())
    }

    async fn read_conformance(&mut self, root: &Value) {
        let document = match self
            .io
            .read_json("/conformance", RequestMethod::Get, None)
            .await
        {
            Ok(document) => document,
            Err(e) => {
                tracing::debug!(error = %e, "No /conformance endpoint; using root document");
                root.clone()
            }
        };

        let conformance: Conformance = serde_json::from_value(document).unwrap_or_default();
        if !conformance.conforms_to.is_empty() {
            self.set_conforms_to(conformance.conforms_to);
        }
    }

    fn advise(&self, advisory: Advisory) -> Result<(), ClientError> {
        self.config.warning_policy().apply(advisory)?;
        Ok(())
    }

    /// Returns the first link matching `rel` and one of `media_types`.
    ///
    /// Either filter may be omitted. With both omitted, the first link is
    /// returned.
    #[must_use]
    pub fn get_single_link(&self, rel: Option<&str>, media_types: Option<&[&str]>) -> Option<&Link> {
        self.links.iter().find(|link| {
            rel.map_or(true, |rel| link.rel == rel)
                && media_types.map_or(true, |types| {
                    types.contains(&link.media_type.as_deref().unwrap_or_default())
                })
        })
    }

    fn require_link(&self, rel: &str) -> Result<&Link, ClientError> {
        self.get_single_link(Some(rel), None)
            .ok_or_else(|| ClientError::MissingLink {
                rel: rel.to_string(),
            })
    }

    // ========================================================================
    // Conformance
    // ========================================================================

    /// Returns true if the server advertises any conformance classes.
    #[must_use]
    pub fn has_conforms_to(&self) -> bool {
        !self.conforms_to.is_empty()
    }

    /// Returns the advertised conformance URIs.
    #[must_use]
    pub fn conforms_to(&self) -> &[String] {
        &self.conforms_to
    }

    /// Replaces the cached conformance URIs.
    pub fn set_conforms_to(&mut self, conformance_uris: Vec<String>) {
        self.conforms_to = conformance_uris;
    }

    /// Clears the cached conformance URIs.
    pub fn clear_conforms_to(&mut self) {
        self.conforms_to.clear();
    }

    /// Adds the URI of a named conformance class, unless already present.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Conformance`] if the name is unknown.
    pub fn add_conforms_to(&mut self, name: &str) -> Result<(), ClientError> {
        let class = self.config.registry().class_of(name)?;
        if !self.has_conformance(class) {
            let uri = self.config.registry().uri(class);
            self.conforms_to.push(uri);
        }
        Ok(())
    }

    /// Removes every URI identifying a named conformance class.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Conformance`] if the name is unknown.
    pub fn remove_conforms_to(&mut self, name: &str) -> Result<(), ClientError> {
        let class = self.config.registry().class_of(name)?;
        let registry = self.config.registry().clone();
        self.conforms_to
            .retain(|uri| !registry.matches(class, std::slice::from_ref(uri)));
        Ok(())
    }

    /// Returns true if the cached conformance URIs include `class`.
    #[must_use]
    pub fn has_conformance(&self, class: ConformanceClass) -> bool {
        self.config.registry().matches(class, &self.conforms_to)
    }

    /// Returns true if the cached conformance URIs include the named class.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Conformance`] if the name is unknown.
    pub fn has_conformance_named(&self, name: &str) -> Result<bool, ClientError> {
        let class = self.config.registry().class_of(name)?;
        Ok(self.has_conformance(class))
    }

    // ========================================================================
    // Products
    // ========================================================================

    fn products_url(&self, product_id: Option<&str>, subpath: Option<&str>) -> Result<Url, ClientError> {
        let link = self.require_link("products")?;
        append_segments(&self.io.resolve(&link.href)?, product_id.into_iter().chain(subpath))
    }

    /// Lists products, following pagination lazily.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingLink`] if the server has no products
    /// link. Request failures surface as stream items.
    pub async fn list_products(&self, limit: Option<u32>) -> Result<ResourceStream<Product>, ClientError> {
        let url = self.products_url(None, None)?;
        let link = paged_get_link(url, limit);
        Ok(Pages::new(Arc::clone(&self.io), link, "products").items())
    }

    /// Fetches a single product.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the server answers 404 or with
    /// an empty body, or another [`ClientError`] if the request fails.
    pub async fn get_product(&self, product_id: &str) -> Result<Product, ClientError> {
        let url = self.products_url(Some(product_id), None)?;
        let body = self.read_single(url, "Product", product_id).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Fetches the conformance classes of a single product.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the product does not exist, or
    /// another [`ClientError`] if the request fails.
    pub async fn get_product_conformance(&self, product_id: &str) -> Result<Conformance, ClientError> {
        let url = self.products_url(Some(product_id), Some("conformance"))?;
        let body = self.read_single(url, "Product", product_id).await?;
        Ok(serde_json::from_value(body)?)
    }

    // ========================================================================
    // Opportunities
    // ========================================================================

    /// Searches opportunities for a product, following pagination lazily.
    ///
    /// The search is a POST whose response is the first page; later pages
    /// are fetched through `rel="next"` links. The request carries
    /// `Prefer: wait` so servers that also search asynchronously answer
    /// with results rather than a search record.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if `end` precedes `start`, the products link
    /// is missing, or the server does not support opportunity search and
    /// the warning policy escalates that. Request failures surface as
    /// stream items.
    pub async fn search_opportunities(
        &self,
        product_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        geometry: Geometry,
        filter: Option<Value>,
        limit: u32,
    ) -> Result<ResourceStream<Opportunity>, ClientError> {
        if !self.has_conformance(ConformanceClass::Opportunities)
            && !self.has_conformance(ConformanceClass::AsyncOpportunities)
        {
            self.advise(Advisory::DoesNotConformTo {
                classes: vec![ConformanceClass::Opportunities.name().to_string()],
            })?;
        }

        let url = self.products_url(Some(product_id), Some("opportunities"))?;
        let payload = OpportunityPayload {
            filter,
            limit,
            ..OpportunityPayload::new(DatetimeInterval::new(Some(start), Some(end))?, geometry)
        };
        let link = Link::new(url.to_string(), "opportunities")
            .with_method(RequestMethod::Post)
            .with_header("Prefer", Prefer::Wait.as_str())
            .with_body(payload.body());

        Ok(Pages::new(Arc::clone(&self.io), link, "features").items())
    }

    // ========================================================================
    // Orders
    // ========================================================================

    /// Creates an order for a product.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the products link is missing, the request
    /// fails or the response is not an order.
    pub async fn create_order(&self, product_id: &str, payload: &OrderPayload) -> Result<Order, ClientError> {
        let url = self.products_url(Some(product_id), Some("orders"))?;
        let request = HttpRequest::builder(RequestMethod::Post, url.as_str())
            .body(serde_json::to_value(payload)?)
            .build()?;
        let response = self.io.request(request).await?;
        tracing::debug!(
            product_id,
            location = response.location().unwrap_or_default(),
            "Created order"
        );
        Ok(serde_json::from_value(response.body)?)
    }

    fn orders_url(&self, order_id: Option<&str>, subpath: Option<&str>) -> Result<Url, ClientError> {
        let link = self.require_link("orders")?;
        append_segments(&self.io.resolve(&link.href)?, order_id.into_iter().chain(subpath))
    }

    /// Lists orders, following pagination lazily.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingLink`] if the server has no orders
    /// link. Request failures surface as stream items.
    pub async fn list_orders(&self, limit: Option<u32>) -> Result<ResourceStream<Order>, ClientError> {
        let url = self.orders_url(None, None)?;
        let link = paged_get_link(url, limit);
        Ok(Pages::new(Arc::clone(&self.io), link, "features").items())
    }

    /// Fetches a single order.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] if the server answers 404 or with
    /// an empty body, or another [`ClientError`] if the request fails.
    pub async fn get_order(&self, order_id: &str) -> Result<Order, ClientError> {
        let url = self.orders_url(Some(order_id), None)?;
        let body = self.read_single(url, "Order", order_id).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Lists the status history of an order, following pagination lazily.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::MissingLink`] if the server has no orders
    /// link. Request failures surface as stream items.
    pub async fn list_order_statuses(
        &self,
        order_id: &str,
        limit: Option<u32>,
    ) -> Result<ResourceStream<OrderStatus>, ClientError> {
        if !self.has_conformance(ConformanceClass::OrderStatuses) {
            self.advise(Advisory::DoesNotConformTo {
                classes: vec![ConformanceClass::OrderStatuses.name().to_string()],
            })?;
        }
        let url = self.orders_url(Some(order_id), Some("statuses"))?;
        let link = paged_get_link(url, limit);
        Ok(Pages::new(Arc::clone(&self.io), link, "statuses").items())
    }

    async fn read_single(&self, url: Url, resource: &'static str, id: &str) -> Result<Value, ClientError> {
        let not_found = || ClientError::NotFound {
            resource,
            id: id.to_string(),
        };

        match self.io.read_json(url.as_str(), RequestMethod::Get, None).await {
            Ok(Value::Null) => Err(not_found()),
            Ok(Value::Object(map)) if map.is_empty() => Err(not_found()),
            Ok(body) => Ok(body),
            Err(ClientError::Api(ApiError {
                status_code: Some(404),
                ..
            })) => Err(not_found()),
            Err(e) => Err(e),
        }
    }
}

/// Appends path segments to `base`, percent-encoding each one.
fn append_segments<'a>(base: &Url, segments: impl Iterator<Item = &'a str>) -> Result<Url, ClientError> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().map_err(|()| ClientError::InvalidUrl {
            url: base.to_string(),
        })?;
        path.pop_if_empty();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn paged_get_link(url: Url, limit: Option<u32>) -> Link {
    let link = Link::new(url.to_string(), "");
    match limit {
        Some(limit) => link.with_body(json!({ "limit": limit })),
        None => link,
    }
}

/// Collects at most `max_items` items from a resource stream.
///
/// # Errors
///
/// Returns the first error yielded by the stream.
pub async fn take_items<T: Send + 'static>(stream: ResourceStream<T>, max_items: Option<usize>) -> Result<Vec<T>, ClientError> {
    let stream = match max_items {
        Some(max) => stream.take(max).boxed(),
        None => stream,
    };
    futures::TryStreamExt::try_collect(stream).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_segments_encodes_ids() {
        let base = Url::parse("https://stapi.example.com/products").unwrap();
        let url = append_segments(&base, ["a b", "orders"].into_iter()).unwrap();
        assert_eq!(url.as_str(), "https://stapi.example.com/products/a%20b/orders");
    }

    #[test]
    fn test_append_segments_handles_trailing_slash() {
        let base = Url::parse("https://stapi.example.com/orders/").unwrap();
        let url = append_segments(&base, ["o1"].into_iter()).unwrap();
        assert_eq!(url.as_str(), "https://stapi.example.com/orders/o1");
    }

    #[test]
    fn test_paged_get_link_carries_limit() {
        let url = Url::parse("https://stapi.example.com/orders").unwrap();
        assert_eq!(paged_get_link(url.clone(), Some(3)).body, Some(json!({"limit": 3})));
        assert!(paged_get_link(url, None).body.is_none());
    }
}
