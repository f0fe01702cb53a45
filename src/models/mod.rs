//! Resource models shared by the client and the server router.
//!
//! # Overview
//!
//! - [`Link`]: Hypermedia references embedded in every resource
//! - [`Product`] / [`ProductsCollection`]: Taskable products
//! - [`Order`] / [`OrderCollection`] / [`OrderStatus`]: Orders and their history
//! - [`Opportunity`] / [`OpportunityCollection`] / [`OpportunityPayload`]: Opportunity search
//! - [`OpportunitySearchRecord`]: Records of asynchronous searches
//! - [`RootResponse`] / [`Conformance`]: API discovery documents
//! - [`DatetimeInterval`] / [`Geometry`]: Shared value types
//!
//! All models serialize to and from the STAPI JSON encoding with `serde`.
//! Documents may carry fields beyond those modelled here; order,
//! order-status and opportunity properties keep them in an `extra` map.

mod datetime_interval;
mod errors;
mod geometry;
mod link;
mod opportunity;
mod order;
mod product;
mod root;

pub use datetime_interval::DatetimeInterval;
pub use errors::ModelError;
pub use geometry::{Geometry, Position};
pub use link::{find_link, Link, LinkHeaderValue, RequestMethod};
pub use opportunity::{
    Opportunity, OpportunityCollection, OpportunityPayload, OpportunityProperties,
    OpportunitySearchRecord, OpportunitySearchRecords, OpportunitySearchStatus,
    OpportunitySearchStatusCode, OpportunitySearchStatuses, Prefer,
};
pub use order::{
    Order, OrderCollection, OrderPayload, OrderProperties, OrderSearchParameters, OrderStatus,
    OrderStatusCode, OrderStatuses,
};
pub use product::{Product, ProductsCollection, Provider, ProviderRole};
pub use root::{Conformance, RootResponse};
