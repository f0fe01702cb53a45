//! Products and their providers.

use serde::{Deserialize, Serialize};

use super::Link;
use crate::conformance::STAPI_VERSION;

/// The role a provider plays for a product.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderRole {
    /// Licenses the data.
    Licensor,
    /// Produces the data.
    Producer,
    /// Processes the data.
    Processor,
    /// Hosts the data.
    Host,
}

/// An organisation involved in providing a product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Name of the provider.
    pub name: String,
    /// Description of the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Roles of the provider.
    pub roles: Vec<ProviderRole>,
    /// Homepage of the provider.
    pub url: String,
}

fn collection_type() -> String {
    "Collection".to_string()
}

fn product_stapi_type() -> String {
    "Product".to_string()
}

pub(crate) fn stapi_version() -> String {
    STAPI_VERSION.to_string()
}

/// A product offered for tasking.
///
/// # Example
///
/// ```rust
/// use stapi::models::{Link, Product};
///
/// let product = Product::new("optical-hi-res", "CC-BY-4.0");
/// let linked = product.with_links(vec![Link::new("https://x.test/products/optical-hi-res", "self")]);
///
/// assert!(product.links.is_empty());
/// assert_eq!(linked.links.len(), 1);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Always `"Collection"`.
    #[serde(rename = "type", default = "collection_type")]
    pub type_: String,
    /// Always `"Product"`.
    #[serde(default = "product_stapi_type")]
    pub stapi_type: String,
    /// STAPI version of the product document.
    #[serde(default = "stapi_version")]
    pub stapi_version: String,
    /// Conformance URIs specific to this product.
    #[serde(rename = "conformsTo", default)]
    pub conforms_to: Vec<String>,
    /// Product identifier.
    pub id: String,
    /// Human readable title.
    #[serde(default)]
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// License identifier.
    pub license: String,
    /// Providers of the product.
    #[serde(default)]
    pub providers: Vec<Provider>,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Product {
    /// Creates a product with the given id and license and every other
    /// field defaulted.
    #[must_use]
    pub fn new(id: impl Into<String>, license: impl Into<String>) -> Self {
        Self {
            type_: collection_type(),
            stapi_type: product_stapi_type(),
            stapi_version: stapi_version(),
            conforms_to: Vec::new(),
            id: id.into(),
            title: String::new(),
            description: String::new(),
            keywords: Vec::new(),
            license: license.into(),
            providers: Vec::new(),
            links: Vec::new(),
        }
    }

    /// Returns a copy with `links` appended; `self` is left untouched.
    #[must_use]
    pub fn with_links(&self, links: Vec<Link>) -> Self {
        let mut product = self.clone();
        product.links.extend(links);
        product
    }
}

/// A page of products.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductsCollection {
    /// Always `"ProductCollection"`.
    #[serde(rename = "type", default = "products_collection_type")]
    pub type_: String,
    /// Hypermedia links, including `next` when more pages exist.
    #[serde(default)]
    pub links: Vec<Link>,
    /// The products on this page.
    pub products: Vec<Product>,
}

fn products_collection_type() -> String {
    "ProductCollection".to_string()
}

impl ProductsCollection {
    /// Creates a collection page.
    #[must_use]
    pub fn new(products: Vec<Product>, links: Vec<Link>) -> Self {
        Self {
            type_: products_collection_type(),
            links,
            products,
        }
    }
}
