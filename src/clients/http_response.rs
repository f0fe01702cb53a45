//! HTTP response type for the STAPI client.

use std::collections::HashMap;

use serde_json::Value;

/// A response received from a STAPI server.
///
/// # Example
///
/// ```rust
/// use std::collections::HashMap;
/// use stapi::clients::HttpResponse;
/// use serde_json::json;
///
/// let mut headers = HashMap::new();
/// headers.insert("location".to_string(), vec!["https://x.test/orders/1".to_string()]);
///
/// let response = HttpResponse::new(201, headers, json!({"id": "1"}));
/// assert!(response.is_ok());
/// assert_eq!(response.location(), Some("https://x.test/orders/1"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub code: u16,
    /// Response headers, names lower-cased.
    pub headers: HashMap<String, Vec<String>>,
    /// Decoded JSON body; `Value::Null` when the body was empty.
    pub body: Value,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub const fn new(code: u16, headers: HashMap<String, Vec<String>>, body: Value) -> Self {
        Self {
            code,
            headers,
            body,
        }
    }

    /// Returns true for any 2xx status.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the first value of a header.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `Location` header.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Returns a readable message for an error response.
    ///
    /// Uses the `detail` member of a problem body when present, then the
    /// raw body, then a generic message.
    #[must_use]
    pub fn error_message(&self) -> String {
        match &self.body {
            Value::Object(map) => map.get("detail").map_or_else(
                || self.body.to_string(),
                |detail| detail.as_str().map_or_else(|| detail.to_string(), String::from),
            ),
            Value::String(raw) if !raw.is_empty() => raw.clone(),
            Value::Null => format!("Request failed with status {}", self.code),
            other => other.to_string(),
        }
    }
}

/// Lower-cases header names and groups repeated values.
pub(crate) fn parse_response_headers(
    headers: &reqwest::header::HeaderMap,
) -> HashMap<String, Vec<String>> {
    let mut result: HashMap<String, Vec<String>> = HashMap::new();
    for (name, value) in headers {
        let key = name.as_str().to_lowercase();
        let value = value.to_str().unwrap_or_default().to_string();
        result.entry(key).or_default().push(value);
    }
    result
}
