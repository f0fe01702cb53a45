//! The root document and conformance declaration.

use serde::{Deserialize, Serialize};

use super::Link;

/// The document served at the API root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootResponse {
    /// API identifier.
    pub id: String,
    /// Conformance URIs of the API.
    #[serde(rename = "conformsTo", default)]
    pub conforms_to: Vec<String>,
    /// Human readable title.
    #[serde(default)]
    pub title: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// The conformance declaration of an API or product.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conformance {
    /// Conformance URIs.
    #[serde(rename = "conformsTo", default)]
    pub conforms_to: Vec<String>,
}

impl Conformance {
    /// Creates a conformance declaration.
    #[must_use]
    pub const fn new(conforms_to: Vec<String>) -> Self {
        Self { conforms_to }
    }
}
