//! Conformance classes and the registry that recognises them.
//!
//! A STAPI server advertises the capabilities it implements as a list of
//! URIs (`conformsTo`). This module names the capability classes this crate
//! understands and matches them against advertised URIs regardless of the
//! exact API version in the URI.
//!
//! # Example
//!
//! ```rust
//! use stapi::conformance::{ConformanceClass, ConformanceRegistry};
//!
//! let registry = ConformanceRegistry::default();
//! let advertised = vec!["https://stapi.example.com/v0.2.0/core".to_string()];
//!
//! let class = registry.class_of("CORE").unwrap();
//! assert_eq!(class, ConformanceClass::Core);
//! assert!(registry.matches(class, &advertised));
//! ```

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use thiserror::Error;

/// The STAPI version this crate speaks.
pub const STAPI_VERSION: &str = "0.1.0";

/// The base URI of STAPI conformance class URIs.
pub const DEFAULT_BASE_URI: &str = "https://stapi.example.com";

/// Errors raised by the conformance registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConformanceError {
    /// The name does not identify a known conformance class.
    #[error("Invalid conformance class '{name}'. Options are: {options}")]
    UnknownClass {
        /// The name that was provided.
        name: String,
        /// The valid class names.
        options: String,
    },
}

/// A capability class a STAPI server can advertise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConformanceClass {
    /// Products, orders and the root document.
    Core,
    /// Synchronous opportunity search.
    Opportunities,
    /// Asynchronous opportunity search.
    AsyncOpportunities,
    /// Order status histories.
    OrderStatuses,
    /// Listing of opportunity search records.
    SearchesOpportunity,
    /// Status histories of opportunity search records.
    SearchesOpportunityStatuses,
}

impl ConformanceClass {
    /// Every known class.
    pub const ALL: [Self; 6] = [
        Self::Core,
        Self::Opportunities,
        Self::AsyncOpportunities,
        Self::OrderStatuses,
        Self::SearchesOpportunity,
        Self::SearchesOpportunityStatuses,
    ];

    /// Returns the upper-case name of the class.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Core => "CORE",
            Self::Opportunities => "OPPORTUNITIES",
            Self::AsyncOpportunities => "ASYNC_OPPORTUNITIES",
            Self::OrderStatuses => "ORDER_STATUSES",
            Self::SearchesOpportunity => "SEARCHES_OPPORTUNITY",
            Self::SearchesOpportunityStatuses => "SEARCHES_OPPORTUNITY_STATUSES",
        }
    }

    /// Returns the URI path suffixes that identify the class.
    ///
    /// The first suffix is the one used when building URIs.
    #[must_use]
    pub const fn suffixes(&self) -> &'static [&'static str] {
        match self {
            Self::Core => &["core"],
            Self::Opportunities => &["opportunities"],
            Self::AsyncOpportunities => &["opportunities-async", "async-opportunities"],
            Self::OrderStatuses => &["order-statuses"],
            Self::SearchesOpportunity => &["searches-opportunity"],
            Self::SearchesOpportunityStatuses => &["searches-opportunity-statuses"],
        }
    }

    fn options() -> String {
        Self::ALL
            .iter()
            .map(Self::name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for ConformanceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConformanceClass {
    type Err = ConformanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|class| class.name() == normalized)
            .ok_or_else(|| ConformanceError::UnknownClass {
                name: s.to_string(),
                options: Self::options(),
            })
    }
}

/// GeoJSON geometry schema URIs a product may list among its conformances.
pub mod geojson {
    /// Point geometries.
    pub const POINT: &str = "https://geojson.org/schema/Point.json";
    /// LineString geometries.
    pub const LINESTRING: &str = "https://geojson.org/schema/LineString.json";
    /// Polygon geometries.
    pub const POLYGON: &str = "https://geojson.org/schema/Polygon.json";
    /// MultiPoint geometries.
    pub const MULTI_POINT: &str = "https://geojson.org/schema/MultiPoint.json";
    /// MultiPolygon geometries.
    pub const MULTI_POLYGON: &str = "https://geojson.org/schema/MultiPolygon.json";
    /// MultiLineString geometries.
    pub const MULTI_LINESTRING: &str = "https://geojson.org/schema/MultiLineString.json";

    /// All GeoJSON conformance URIs.
    pub const ALL: [&str; 6] = [
        POINT,
        LINESTRING,
        POLYGON,
        MULTI_POINT,
        MULTI_POLYGON,
        MULTI_LINESTRING,
    ];

    /// Returns true if `uri` is a GeoJSON geometry conformance URI.
    #[must_use]
    pub fn is_geojson(uri: &str) -> bool {
        ALL.contains(&uri)
    }
}

/// Matches conformance class names and URIs.
///
/// The registry is an immutable value; clients hold one in their
/// configuration and servers use one to build the URIs they advertise.
#[derive(Clone, Debug)]
pub struct ConformanceRegistry {
    base_uri: String,
    /// One compiled pattern per class, in [`ConformanceClass::ALL`] order.
    patterns: Vec<Option<Regex>>,
}

impl PartialEq for ConformanceRegistry {
    fn eq(&self, other: &Self) -> bool {
        self.base_uri == other.base_uri
    }
}

impl Eq for ConformanceRegistry {}

impl Default for ConformanceRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URI)
    }
}

impl ConformanceRegistry {
    /// Creates a registry for conformance URIs rooted at `base_uri`.
    #[must_use]
    pub fn new(base_uri: impl Into<String>) -> Self {
        let base_uri = base_uri.into().trim_end_matches('/').to_string();
        let patterns = ConformanceClass::ALL
            .iter()
            .map(|class| compile_pattern(&base_uri, *class))
            .collect();
        Self { base_uri, patterns }
    }

    /// Returns the base URI.
    #[must_use]
    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Looks up a class by name.
    ///
    /// Names are case-insensitive and `-` is equivalent to `_`.
    ///
    /// # Errors
    ///
    /// Returns [`ConformanceError::UnknownClass`] if no class has the name.
    pub fn class_of(&self, name: &str) -> Result<ConformanceClass, ConformanceError> {
        name.parse()
    }

    /// Returns true if any advertised URI identifies `class`, in any
    /// version.
    #[must_use]
    pub fn matches(&self, class: ConformanceClass, advertised: &[String]) -> bool {
        let Some(pattern) = self.pattern(class) else {
            return false;
        };
        advertised.iter().any(|uri| pattern.is_match(uri))
    }

    /// Returns the URI of `class` for the current STAPI version.
    #[must_use]
    pub fn uri(&self, class: ConformanceClass) -> String {
        format!(
            "{}/v{}/{}",
            self.base_uri,
            STAPI_VERSION,
            class.suffixes()[0]
        )
    }

    fn pattern(&self, class: ConformanceClass) -> Option<&Regex> {
        self.patterns.get(class as usize).and_then(Option::as_ref)
    }
}

fn compile_pattern(base_uri: &str, class: ConformanceClass) -> Option<Regex> {
    let suffixes = class
        .suffixes()
        .iter()
        .map(|suffix| regex::escape(suffix))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!("^{}/v[^/]+/(?:{})$", regex::escape(base_uri), suffixes);
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            tracing::warn!(%class, error = %e, "Could not compile conformance pattern");
            None
        }
    }
}
