//! Products served by the router.
//!
//! A [`ServerProduct`] pairs a [`Product`] document with the JSON schemas of
//! its queryables and order parameters and the backends that implement its
//! operations. Which opportunity backends are present decides the product's
//! routes and conformance classes.

use std::fmt;
use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::backend::{CreateOrder, SearchOpportunities, SearchOpportunitiesAsync};
use super::errors::RouterError;
use crate::conformance::{geojson, ConformanceClass, ConformanceRegistry};
use crate::models::Product;

const JSON_SCHEMA: &str = "https://json-schema.org/draft/2020-12/schema";

/// A product together with its schemas and backends.
#[derive(Clone)]
pub struct ServerProduct {
    product: Product,
    queryables: Map<String, Value>,
    order_parameters: Map<String, Value>,
    create_order: Arc<dyn CreateOrder>,
    search: Option<Arc<dyn SearchOpportunities>>,
    search_async: Option<Arc<dyn SearchOpportunitiesAsync>>,
}

impl fmt::Debug for ServerProduct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerProduct")
            .field("id", &self.product.id)
            .field("queryables", &self.queryables.keys().collect::<Vec<_>>())
            .field("order_parameters", &self.order_parameters.keys().collect::<Vec<_>>())
            .field("search", &self.search.is_some())
            .field("search_async", &self.search_async.is_some())
            .finish_non_exhaustive()
    }
}

impl ServerProduct {
    /// Creates a product that accepts orders through `create_order`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::MissingGeoJsonConformance`] if the product's
    /// `conformsTo` has no GeoJSON geometry entry, or
    /// [`RouterError::InvalidProductId`] if its id is empty or would change
    /// under percent-encoding, since links to the product carry the encoded
    /// form while routes match the raw one.
    pub fn new(product: Product, create_order: Arc<dyn CreateOrder>) -> Result<Self, RouterError> {
        if product.id.is_empty() || urlencoding::encode(&product.id) != product.id {
            return Err(RouterError::InvalidProductId {
                product_id: product.id,
            });
        }
        if !product.conforms_to.iter().any(|uri| geojson::is_geojson(uri)) {
            return Err(RouterError::MissingGeoJsonConformance {
                product_id: product.id,
            });
        }

        Ok(Self {
            product,
            queryables: Map::new(),
            order_parameters: Map::new(),
            create_order,
            search: None,
            search_async: None,
        })
    }

    /// Sets the queryable properties, as JSON schema property definitions.
    #[must_use]
    pub fn with_queryables(mut self, queryables: Map<String, Value>) -> Self {
        self.queryables = queryables;
        self
    }

    /// Sets the order parameter properties, as JSON schema property
    /// definitions.
    #[must_use]
    pub fn with_order_parameters(mut self, order_parameters: Map<String, Value>) -> Self {
        self.order_parameters = order_parameters;
        self
    }

    /// Enables synchronous opportunity search.
    #[must_use]
    pub fn with_search(mut self, backend: Arc<dyn SearchOpportunities>) -> Self {
        self.search = Some(backend);
        self
    }

    /// Enables asynchronous opportunity search.
    #[must_use]
    pub fn with_search_async(mut self, backend: Arc<dyn SearchOpportunitiesAsync>) -> Self {
        self.search_async = Some(backend);
        self
    }

    /// Returns the product document.
    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    /// Returns the product identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.product.id
    }

    /// Returns the queryable property definitions.
    #[must_use]
    pub const fn queryables(&self) -> &Map<String, Value> {
        &self.queryables
    }

    /// Returns the order parameter property definitions.
    #[must_use]
    pub const fn order_parameters(&self) -> &Map<String, Value> {
        &self.order_parameters
    }

    pub(crate) fn create_order_backend(&self) -> &dyn CreateOrder {
        self.create_order.as_ref()
    }

    pub(crate) fn search_backend(&self) -> Option<&dyn SearchOpportunities> {
        self.search.as_deref()
    }

    pub(crate) fn search_async_backend(&self) -> Option<&dyn SearchOpportunitiesAsync> {
        self.search_async.as_deref()
    }

    /// Returns true if the product searches opportunities synchronously.
    #[must_use]
    pub const fn supports_opportunities(&self) -> bool {
        self.search.is_some()
    }

    /// Returns true if the product searches opportunities asynchronously.
    #[must_use]
    pub const fn supports_async_opportunities(&self) -> bool {
        self.search_async.is_some()
    }

    /// Returns the conformance URIs the product advertises.
    ///
    /// That is the product's own list, plus the opportunities class when it
    /// searches synchronously, plus the opportunities and asynchronous
    /// opportunities classes when both it and the API support asynchronous
    /// search.
    #[must_use]
    pub fn conformances(&self, registry: &ConformanceRegistry, api_supports_async: bool) -> Vec<String> {
        let mut conformances = self.product.conforms_to.clone();
        let mut add = |class: ConformanceClass| {
            let uri = registry.uri(class);
            if !conformances.contains(&uri) {
                conformances.push(uri);
            }
        };

        if self.supports_opportunities() {
            add(ConformanceClass::Opportunities);
        }
        if api_supports_async && self.supports_async_opportunities() {
            add(ConformanceClass::Opportunities);
            add(ConformanceClass::AsyncOpportunities);
        }
        conformances
    }

    /// Returns the JSON schema document for the queryables.
    #[must_use]
    pub fn queryables_schema(&self, id: &str) -> Value {
        object_schema(id, "Queryables", &self.queryables)
    }

    /// Returns the JSON schema document for the order parameters.
    #[must_use]
    pub fn order_parameters_schema(&self, id: &str) -> Value {
        object_schema(id, "Order Parameters", &self.order_parameters)
    }
}

fn object_schema(id: &str, title: &str, properties: &Map<String, Value>) -> Value {
    json!({
        "$schema": JSON_SCHEMA,
        "$id": id,
        "type": "object",
        "title": title,
        "properties": properties,
        "additionalProperties": false,
    })
}
