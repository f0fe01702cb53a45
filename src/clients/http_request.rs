//! HTTP request types for the STAPI client.
//!
//! This module provides the [`HttpRequest`] type and its builder. Requests
//! address absolute URLs; the transport resolves relative endpoints against
//! the root URL before building them.

use std::collections::HashMap;

use serde_json::Value;

use crate::clients::errors::InvalidHttpRequestError;
use crate::models::{Link, RequestMethod};

/// HTTP methods used by STAPI.
pub type HttpMethod = RequestMethod;

/// An HTTP request to be sent to a STAPI server.
///
/// GET requests carry their parameters as a JSON object that is turned
/// into query parameters; POST requests send their body as JSON.
///
/// # Example
///
/// ```rust
/// use stapi::clients::{HttpMethod, HttpRequest};
/// use serde_json::json;
///
/// let get_request = HttpRequest::builder(HttpMethod::Get, "https://stapi.example.com/products")
///     .body(json!({"limit": 10}))
///     .build()
///     .unwrap();
/// assert_eq!(get_request.query().get("limit").map(String::as_str), Some("10"));
///
/// let post_request = HttpRequest::builder(HttpMethod::Post, "https://stapi.example.com/products/p1/orders")
///     .body(json!({"order_parameters": {}}))
///     .build()
///     .unwrap();
/// assert!(post_request.query().is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// The absolute URL for this request.
    pub url: String,
    /// The request body or GET parameters, if any.
    pub body: Option<Value>,
    /// Query parameters to append to the URL.
    pub query: Option<HashMap<String, String>>,
    /// Additional headers; a name may repeat.
    pub extra_headers: Vec<(String, String)>,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    ///
    /// # Arguments
    ///
    /// * `method` - The HTTP method for the request
    /// * `url` - The absolute URL for the request
    #[must_use]
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, url)
    }

    /// Creates a builder that follows `link`: its href, method, headers
    /// and body.
    #[must_use]
    pub fn from_link(link: &Link) -> HttpRequestBuilder {
        let mut builder = HttpRequestBuilder::new(link.method, link.href.clone());
        if let Some(headers) = &link.headers {
            for (name, value) in headers {
                for v in value.values() {
                    builder = builder.header(name.clone(), v);
                }
            }
        }
        match (&link.body, link.method) {
            (Some(body), _) => builder.body(body.clone()),
            (None, RequestMethod::Post) => builder.body(Value::Object(serde_json::Map::new())),
            (None, RequestMethod::Get) => builder,
        }
    }

    /// Validates the request, ensuring it meets all requirements.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if:
    /// - `http_method` is `Post` but `body` is `None`
    /// - `http_method` is `Get` and `body` is not a JSON object
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        match (self.http_method, &self.body) {
            (RequestMethod::Post, None) => Err(InvalidHttpRequestError::MissingBody {
                method: self.http_method.to_string(),
            }),
            (RequestMethod::Get, Some(body)) if !body.is_object() => {
                Err(InvalidHttpRequestError::NonObjectQuery)
            }
            _ => Ok(()),
        }
    }

    /// Returns the query parameters to send, merging explicit parameters
    /// with those derived from a GET body.
    #[must_use]
    pub fn query(&self) -> HashMap<String, String> {
        let mut query = self.query.clone().unwrap_or_default();
        if self.http_method == RequestMethod::Get {
            if let Some(body) = &self.body {
                query.extend(serialize_to_query(body));
            }
        }
        query
    }

    /// Returns the JSON body to send, if the method carries one.
    #[must_use]
    pub const fn json_body(&self) -> Option<&Value> {
        match self.http_method {
            RequestMethod::Post => self.body.as_ref(),
            RequestMethod::Get => None,
        }
    }
}

/// Turns a JSON object into query parameters.
///
/// Strings are sent raw, numbers and booleans via their JSON text, arrays
/// of scalars are comma-joined, nested objects are JSON-encoded and nulls
/// are skipped.
#[must_use]
pub fn serialize_to_query(value: &Value) -> HashMap<String, String> {
    let mut query = HashMap::new();

    if let Value::Object(map) = value {
        for (key, val) in map {
            match val {
                Value::Null => {}
                Value::String(s) => {
                    query.insert(key.clone(), s.clone());
                }
                Value::Number(n) => {
                    query.insert(key.clone(), n.to_string());
                }
                Value::Bool(b) => {
                    query.insert(key.clone(), b.to_string());
                }
                Value::Array(arr) => {
                    let values: Vec<String> = arr
                        .iter()
                        .filter_map(|v| match v {
                            Value::String(s) => Some(s.clone()),
                            Value::Number(n) => Some(n.to_string()),
                            _ => None,
                        })
                        .collect();
                    if !values.is_empty() {
                        query.insert(key.clone(), values.join(","));
                    }
                }
                Value::Object(_) => {
                    query.insert(key.clone(), val.to_string());
                }
            }
        }
    }

    query
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    url: String,
    body: Option<Value>,
    query: Option<HashMap<String, String>>,
    extra_headers: Vec<(String, String)>,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            http_method: method,
            url: url.into(),
            body: None,
            query: None,
            extra_headers: Vec::new(),
        }
    }

    /// Sets the request body (JSON for POST, query parameters for GET).
    #[must_use]
    pub fn body(mut self, body: impl Into<Value>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets all query parameters at once.
    #[must_use]
    pub fn query(mut self, query: HashMap<String, String>) -> Self {
        self.query = Some(query);
        self
    }

    /// Adds a single query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Adds a single extra header.
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((key.into(), value.into()));
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let request = HttpRequest {
            http_method: self.http_method,
            url: self.url,
            body: self.body,
            query: self.query,
            extra_headers: self.extra_headers,
        };
        request.verify()?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const URL: &str = "https://stapi.example.com/products";

    #[test]
    fn test_post_requires_body() {
        let result = HttpRequest::builder(HttpMethod::Post, URL).build();
        assert!(matches!(
            result,
            Err(InvalidHttpRequestError::MissingBody { .. })
        ));
    }

    #[test]
    fn test_get_body_must_be_object() {
        let result = HttpRequest::builder(HttpMethod::Get, URL)
            .body(json!([1, 2]))
            .build();
        assert!(matches!(result, Err(InvalidHttpRequestError::NonObjectQuery)));
    }

    #[test]
    fn test_get_body_becomes_query() {
        let request = HttpRequest::builder(HttpMethod::Get, URL)
            .body(json!({"limit": 5, "next": "abc", "skip": null}))
            .query_param("api_key", "k")
            .build()
            .unwrap();

        let query = request.query();
        assert_eq!(query.get("limit").map(String::as_str), Some("5"));
        assert_eq!(query.get("next").map(String::as_str), Some("abc"));
        assert_eq!(query.get("api_key").map(String::as_str), Some("k"));
        assert!(!query.contains_key("skip"));
        assert!(request.json_body().is_none());
    }

    #[test]
    fn test_serialize_to_query_handles_arrays_and_objects() {
        let query = serialize_to_query(&json!({
            "ids": ["a", "b"],
            "flag": true,
            "bbox": {"x": 1}
        }));
        assert_eq!(query.get("ids").map(String::as_str), Some("a,b"));
        assert_eq!(query.get("flag").map(String::as_str), Some("true"));
        assert_eq!(query.get("bbox").map(String::as_str), Some(r#"{"x":1}"#));
    }

    #[test]
    fn test_from_link_copies_method_headers_and_body() {
        let link: Link = serde_json::from_value(json!({
            "href": "https://stapi.example.com/products/p1/opportunities",
            "rel": "next",
            "method": "POST",
            "headers": {"X-Many": ["a", "b"]},
            "body": {"next": "t"}
        }))
        .unwrap();

        let request = HttpRequest::from_link(&link).build().unwrap();
        assert_eq!(request.http_method, HttpMethod::Post);
        assert_eq!(request.extra_headers.len(), 2);
        assert_eq!(request.json_body(), Some(&json!({"next": "t"})));
    }

    #[test]
    fn test_from_post_link_without_body_sends_empty_object() {
        let link = Link::new(URL, "next").with_method(RequestMethod::Post);
        let request = HttpRequest::from_link(&link).build().unwrap();
        assert_eq!(request.json_body(), Some(&json!({})));
    }
}
