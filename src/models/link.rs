//! Hypermedia links.
//!
//! Every STAPI resource embeds a `links` array. Links carry enough
//! information for a client to follow them without guessing: the HTTP
//! method, optional headers and, for POST links, the request body.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ModelError;

/// HTTP methods a link may ask the client to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestMethod {
    /// `GET`, the default for links.
    #[default]
    #[serde(rename = "GET")]
    Get,
    /// `POST`, used for searches and order creation.
    #[serde(rename = "POST")]
    Post,
}

impl RequestMethod {
    /// Returns the method as an uppercase string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(ModelError::InvalidMethod {
                method: s.to_string(),
            }),
        }
    }
}

/// A header value on a link: either a single string or a list of strings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkHeaderValue {
    /// A single header value.
    Single(String),
    /// Several values for the same header name.
    Multiple(Vec<String>),
}

impl LinkHeaderValue {
    /// Returns the individual values.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multiple(values) => values.iter().map(String::as_str).collect(),
        }
    }
}

/// A hypermedia reference.
///
/// # Example
///
/// ```rust
/// use stapi::models::{Link, RequestMethod};
/// use serde_json::json;
///
/// let link = Link::new("https://stapi.example.com/products/p1/orders", "create-order")
///     .with_method(RequestMethod::Post)
///     .with_body(json!({"geometry": null}));
///
/// assert_eq!(link.method, RequestMethod::Post);
/// assert!(!link.merge);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The location of the resource.
    pub href: String,

    /// Relation type of the link.
    pub rel: String,

    /// The media type of the resource.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,

    /// Title of the resource.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// The HTTP method the resource expects.
    #[serde(default)]
    pub method: RequestMethod,

    /// Header names mapped to values to send when following the link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, LinkHeaderValue>>,

    /// For POST links, the JSON body to send.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,

    /// When true the client merges `body` into the current request body
    /// instead of replacing it.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub merge: bool,
}

impl Link {
    /// Creates a GET link with the given href and relation.
    #[must_use]
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            media_type: None,
            title: None,
            method: RequestMethod::Get,
            headers: None,
            body: None,
            merge: false,
        }
    }

    /// Sets the media type.
    #[must_use]
    pub fn with_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = Some(media_type.into());
        self
    }

    /// Sets the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the HTTP method.
    #[must_use]
    pub const fn with_method(mut self, method: RequestMethod) -> Self {
        self.method = method;
        self
    }

    /// Adds a header to send when following the link.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), LinkHeaderValue::Single(value.into()));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets the merge flag.
    #[must_use]
    pub const fn with_merge(mut self, merge: bool) -> Self {
        self.merge = merge;
        self
    }

    /// Returns the body to send when following this link from a request
    /// that carried `current`.
    ///
    /// With `merge` set, the link body's keys are folded into `current`.
    /// Otherwise the link body replaces `current`.
    #[must_use]
    pub fn resolve_body(&self, current: Option<&Value>) -> Option<Value> {
        if !self.merge {
            return self.body.clone();
        }
        match (current, &self.body) {
            (Some(Value::Object(base)), Some(Value::Object(extra))) => {
                let mut merged = base.clone();
                for (key, value) in extra {
                    merged.insert(key.clone(), value.clone());
                }
                Some(Value::Object(merged))
            }
            (Some(base), None) => Some(base.clone()),
            (_, body) => body.clone(),
        }
    }
}

/// Finds the first link with the given relation.
#[must_use]
pub fn find_link<'a>(links: &'a [Link], rel: &str) -> Option<&'a Link> {
    links.iter().find(|link| link.rel == rel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_link_defaults_from_minimal_json() {
        let link: Link =
            serde_json::from_value(json!({"href": "https://x.test/a", "rel": "self"})).unwrap();

        assert_eq!(link.method, RequestMethod::Get);
        assert!(!link.merge);
        assert!(link.body.is_none());
        assert!(link.media_type.is_none());
    }

    #[test]
    fn test_link_serializes_type_field_name() {
        let link = Link::new("https://x.test/a", "self").with_type("application/json");
        let value = serde_json::to_value(&link).unwrap();

        assert_eq!(value["type"], "application/json");
        assert_eq!(value["method"], "GET");
        assert!(value.get("merge").is_none());
    }

    #[test]
    fn test_link_headers_accept_string_or_list() {
        let link: Link = serde_json::from_value(json!({
            "href": "https://x.test/a",
            "rel": "next",
            "headers": {"X-One": "a", "X-Many": ["b", "c"]}
        }))
        .unwrap();

        let headers = link.headers.unwrap();
        assert_eq!(headers["X-One"].values(), vec!["a"]);
        assert_eq!(headers["X-Many"].values(), vec!["b", "c"]);
    }

    #[test]
    fn test_resolve_body_replaces_without_merge() {
        let link = Link::new("https://x.test/a", "next").with_body(json!({"next": "t2"}));
        let current = json!({"limit": 10, "next": "t1"});

        assert_eq!(link.resolve_body(Some(&current)), Some(json!({"next": "t2"})));
    }

    #[test]
    fn test_resolve_body_merges_when_requested() {
        let link = Link::new("https://x.test/a", "next")
            .with_method(RequestMethod::Post)
            .with_body(json!({"next": "t2"}))
            .with_merge(true);
        let current = json!({"limit": 10, "next": "t1"});

        assert_eq!(
            link.resolve_body(Some(&current)),
            Some(json!({"limit": 10, "next": "t2"}))
        );
    }

    #[test]
    fn test_request_method_parses_case_insensitively() {
        assert_eq!("post".parse::<RequestMethod>().unwrap(), RequestMethod::Post);
        assert!(matches!(
            "PUT".parse::<RequestMethod>(),
            Err(ModelError::InvalidMethod { .. })
        ));
    }

    #[test]
    fn test_find_link_returns_first_match() {
        let links = vec![
            Link::new("https://x.test/1", "next"),
            Link::new("https://x.test/2", "next"),
        ];
        assert_eq!(find_link(&links, "next").unwrap().href, "https://x.test/1");
        assert!(find_link(&links, "prev").is_none());
    }
}
