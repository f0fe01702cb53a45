//! Opportunities, opportunity searches and their records.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::order::feature_collection_type;
use super::{DatetimeInterval, Geometry, Link, ModelError};

/// Properties of an opportunity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpportunityProperties {
    /// The window in which the opportunity can be acquired.
    pub datetime: DatetimeInterval,
    /// The product the opportunity belongs to.
    pub product_id: String,
    /// Product specific fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

/// A possible acquisition, encoded as a GeoJSON feature.
///
/// Opportunities returned by a server carry a `create-order` link whose
/// body is a ready-made order request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    /// Always `"Feature"`.
    #[serde(rename = "type", default = "feature_type")]
    pub type_: String,
    /// Opportunity identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Footprint of the opportunity.
    pub geometry: Geometry,
    /// Opportunity properties.
    pub properties: OpportunityProperties,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Opportunity {
    /// Creates an opportunity without id or links.
    #[must_use]
    pub fn new(geometry: Geometry, properties: OpportunityProperties) -> Self {
        Self {
            type_: feature_type(),
            id: None,
            geometry,
            properties,
            links: Vec::new(),
        }
    }
}

/// A page of opportunities, encoded as a GeoJSON feature collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpportunityCollection {
    /// Always `"FeatureCollection"`.
    #[serde(rename = "type", default = "feature_collection_type")]
    pub type_: String,
    /// Identifier of an asynchronous search result collection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The opportunities on this page.
    pub features: Vec<Opportunity>,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

impl OpportunityCollection {
    /// Creates a collection page.
    #[must_use]
    pub fn new(features: Vec<Opportunity>, links: Vec<Link>) -> Self {
        Self {
            type_: feature_collection_type(),
            id: None,
            features,
            links,
        }
    }
}

const fn default_limit() -> u32 {
    10
}

/// The body of an opportunity search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpportunityPayload {
    /// Requested time window.
    pub datetime: DatetimeInterval,
    /// Area of interest.
    pub geometry: Geometry,
    /// Opaque CQL2 filter.
    #[serde(default)]
    pub filter: Option<Value>,
    /// Pagination token.
    #[serde(default)]
    pub next: Option<String>,
    /// Page size.
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl OpportunityPayload {
    /// Creates a search payload with the default page size.
    #[must_use]
    pub const fn new(datetime: DatetimeInterval, geometry: Geometry) -> Self {
        Self {
            datetime,
            geometry,
            filter: None,
            next: None,
            limit: default_limit(),
        }
    }

    /// Returns the search criteria without pagination fields.
    #[must_use]
    pub fn search_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("datetime".to_string(), Value::String(self.datetime.to_string()));
        body.insert(
            "geometry".to_string(),
            serde_json::to_value(&self.geometry).unwrap_or(Value::Null),
        );
        body.insert("filter".to_string(), self.filter.clone().unwrap_or(Value::Null));
        Value::Object(body)
    }

    /// Returns the full payload including pagination fields.
    #[must_use]
    pub fn body(&self) -> Value {
        let mut body = self.search_body();
        if let Value::Object(map) = &mut body {
            map.insert(
                "next".to_string(),
                self.next.clone().map_or(Value::Null, Value::String),
            );
            map.insert("limit".to_string(), Value::from(self.limit));
        }
        body
    }
}

/// Status codes of an opportunity search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunitySearchStatusCode {
    /// The search was received.
    Received,
    /// The search is running.
    InProgress,
    /// The search failed.
    Failed,
    /// The search was canceled.
    Canceled,
    /// The search finished.
    Completed,
}

impl OpportunitySearchStatusCode {
    /// Returns the wire name of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::InProgress => "in_progress",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
            Self::Completed => "completed",
        }
    }

    /// Returns true if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed | Self::Canceled | Self::Completed)
    }

    /// Returns true if a search may move from `self` to `next`.
    ///
    /// `received` moves to `in_progress` or straight to a terminal code;
    /// `in_progress` moves to a terminal code.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        match self {
            Self::Received => !matches!(next, Self::Received),
            Self::InProgress => next.is_terminal(),
            Self::Failed | Self::Canceled | Self::Completed => false,
        }
    }
}

impl fmt::Display for OpportunitySearchStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point-in-time status of an opportunity search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySearchStatus {
    /// When the status was recorded.
    pub timestamp: DateTime<Utc>,
    /// The status code.
    pub status_code: OpportunitySearchStatusCode,
    /// Machine readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    /// Human readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_text: Option<String>,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

impl OpportunitySearchStatus {
    /// Creates a status stamped with the current UTC time.
    #[must_use]
    pub fn new(status_code: OpportunitySearchStatusCode) -> Self {
        Self {
            timestamp: Utc::now(),
            status_code,
            reason_code: None,
            reason_text: None,
            links: Vec::new(),
        }
    }
}

/// A record of an asynchronous opportunity search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySearchRecord {
    /// Record identifier.
    pub id: String,
    /// The product searched.
    pub product_id: String,
    /// The search request.
    pub opportunity_request: OpportunityPayload,
    /// Current status.
    pub status: OpportunitySearchStatus,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// A page of opportunity search records.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySearchRecords {
    /// The records on this page.
    pub search_records: Vec<OpportunitySearchRecord>,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// A page of an opportunity search's status history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OpportunitySearchStatuses {
    /// The statuses on this page.
    pub statuses: Vec<OpportunitySearchStatus>,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// Values of the `Prefer` request header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Prefer {
    /// Ask the server to process the request asynchronously.
    #[serde(rename = "respond-async")]
    RespondAsync,
    /// Ask the server to answer synchronously.
    #[serde(rename = "wait")]
    Wait,
}

impl Prefer {
    /// Returns the header value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RespondAsync => "respond-async",
            Self::Wait => "wait",
        }
    }
}

impl fmt::Display for Prefer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Prefer {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "respond-async" => Ok(Self::RespondAsync),
            "wait" => Ok(Self::Wait),
            other => Err(ModelError::InvalidPreference {
                value: other.to_string(),
            }),
        }
    }
}
