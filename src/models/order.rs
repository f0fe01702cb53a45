//! Orders and their status histories.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::product::stapi_version;
use super::{DatetimeInterval, Geometry, Link};

/// Status codes an order may report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatusCode {
    /// The order was received.
    Received,
    /// The order was accepted.
    Accepted,
    /// The order was rejected.
    Rejected,
    /// The order was fulfilled.
    Completed,
    /// The order was cancelled by the provider.
    Cancelled,
    /// The order was scheduled.
    Scheduled,
    /// The order is on hold.
    Held,
    /// The order is being processed.
    Processing,
    /// Capacity was reserved for the order.
    Reserved,
    /// The sensor was tasked.
    Tasked,
    /// The order was cancelled by the user.
    UserCancelled,
    /// The order expired.
    Expired,
    /// The order failed.
    Failed,
}

impl OrderStatusCode {
    /// Returns the wire name of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Scheduled => "scheduled",
            Self::Held => "held",
            Self::Processing => "processing",
            Self::Reserved => "reserved",
            Self::Tasked => "tasked",
            Self::UserCancelled => "user_cancelled",
            Self::Expired => "expired",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for OrderStatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatusCode {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(Value::String(s.to_string()))
    }
}

/// A point-in-time status of an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderStatus {
    /// When the status was recorded.
    pub timestamp: DateTime<Utc>,
    /// The status code.
    pub status_code: OrderStatusCode,
    /// Machine readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    /// Human readable reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_text: Option<String>,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
    /// Provider specific fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl OrderStatus {
    /// Creates a status stamped with the current UTC time.
    #[must_use]
    pub fn new(
        status_code: OrderStatusCode,
        reason_code: Option<String>,
        reason_text: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            status_code,
            reason_code,
            reason_text,
            links: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// A page of an order's status history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderStatuses {
    /// The statuses on this page.
    pub statuses: Vec<OrderStatus>,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

/// The search that led to an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderSearchParameters {
    /// Requested time window.
    pub datetime: DatetimeInterval,
    /// Area of interest.
    pub geometry: Geometry,
    /// Opaque CQL2 filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
}

/// Properties of an order feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderProperties {
    /// Product the order was placed against.
    pub product_id: String,
    /// When the order was created.
    pub created: DateTime<Utc>,
    /// Current status.
    pub status: OrderStatus,
    /// The search that led to the order.
    pub search_parameters: OrderSearchParameters,
    /// Properties of the opportunity that was ordered.
    #[serde(default)]
    pub opportunity_properties: Map<String, Value>,
    /// Product specific order parameters.
    #[serde(default)]
    pub order_parameters: Map<String, Value>,
    /// Provider specific fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

fn order_stapi_type() -> String {
    "Order".to_string()
}

/// An order, encoded as a GeoJSON feature.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Order identifier.
    pub id: String,
    /// Always `"Feature"`.
    #[serde(rename = "type", default = "feature_type")]
    pub type_: String,
    /// Always `"Order"`.
    #[serde(default = "order_stapi_type")]
    pub stapi_type: String,
    /// STAPI version of the order document.
    #[serde(default = "stapi_version")]
    pub stapi_version: String,
    /// Footprint of the order.
    pub geometry: Geometry,
    /// Order properties.
    pub properties: OrderProperties,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Order {
    /// Creates an order with the default feature metadata.
    #[must_use]
    pub fn new(id: impl Into<String>, geometry: Geometry, properties: OrderProperties) -> Self {
        Self {
            id: id.into(),
            type_: feature_type(),
            stapi_type: order_stapi_type(),
            stapi_version: stapi_version(),
            geometry,
            properties,
            links: Vec::new(),
        }
    }
}

/// A page of orders, encoded as a GeoJSON feature collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderCollection {
    /// Always `"FeatureCollection"`.
    #[serde(rename = "type", default = "feature_collection_type")]
    pub type_: String,
    /// The orders on this page.
    pub features: Vec<Order>,
    /// Hypermedia links.
    #[serde(default)]
    pub links: Vec<Link>,
}

pub(crate) fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

impl OrderCollection {
    /// Creates a collection page.
    #[must_use]
    pub fn new(features: Vec<Order>, links: Vec<Link>) -> Self {
        Self {
            type_: feature_collection_type(),
            features,
            links,
        }
    }
}

/// The body of an order request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderPayload {
    /// Requested time window.
    pub datetime: DatetimeInterval,
    /// Area of interest.
    pub geometry: Geometry,
    /// Opaque CQL2 filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Product specific order parameters.
    #[serde(default)]
    pub order_parameters: Map<String, Value>,
}
