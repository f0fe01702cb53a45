//! HTTP transport for STAPI communication.
//!
//! This module provides [`StapiIo`], which performs one request/response
//! cycle against a STAPI server: it resolves endpoints against the root URL,
//! applies session-wide headers and parameters, runs the request modifier
//! hook, retries transient failures and turns error responses into
//! [`ApiError`]s.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;

use crate::clients::errors::{ApiError, ClientError, InvalidHttpRequestError};
use crate::clients::http_request::{HttpMethod, HttpRequest};
use crate::clients::http_response::{parse_response_headers, HttpResponse};
use crate::config::{ClientConfig, RequestModifier, RootUrl};
use crate::models::{find_link, Link, RequestMethod};

/// Delay before the first retry; each further retry doubles it.
pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Crate version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// HTTP transport for a STAPI server.
///
/// The transport handles:
/// - Resolving relative endpoints against the root URL
/// - Default headers including User-Agent and Accept
/// - Session-wide query parameters
/// - The request modifier hook
/// - Retries with exponential back-off for connection and timeout failures
///
/// # Thread Safety
///
/// `StapiIo` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use stapi::clients::{HttpMethod, StapiIo};
/// use stapi::{ClientConfig, RootUrl};
///
/// let config = ClientConfig::builder()
///     .root_url(RootUrl::new("https://stapi.example.com")?)
///     .build()?;
/// let io = StapiIo::new(&config)?;
///
/// let root = io.read_json("/", HttpMethod::Get, None).await?;
/// ```
pub struct StapiIo {
    client: reqwest::Client,
    root_url: RootUrl,
    default_headers: HashMap<String, String>,
    parameters: HashMap<String, String>,
    max_retries: Option<u32>,
    request_modifier: Option<RequestModifier>,
}

// Verify StapiIo is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<StapiIo>();
};

impl std::fmt::Debug for StapiIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StapiIo")
            .field("root_url", &self.root_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl StapiIo {
    /// Creates a transport from client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the underlying HTTP client cannot be created
    /// (for example, TLS initialization failure).
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let user_agent = format!("{user_agent_prefix}STAPI Rust Client v{SDK_VERSION}");

        let mut default_headers = HashMap::new();
        default_headers.insert("User-Agent".to_string(), user_agent);
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        for (name, value) in config.headers() {
            default_headers.retain(|existing: &String, _| !existing.eq_ignore_ascii_case(name));
            default_headers.insert(name.clone(), value.clone());
        }

        let mut builder = reqwest::Client::builder().use_rustls_tls();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            root_url: config.root_url().clone(),
            default_headers,
            parameters: config.parameters().clone(),
            max_retries: config.max_retries(),
            request_modifier: config.request_modifier().cloned(),
        })
    }

    /// Returns the root URL of the API.
    #[must_use]
    pub const fn root_url(&self) -> &RootUrl {
        &self.root_url
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Resolves an endpoint, absolute or relative to the root URL.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the endpoint does not form a
    /// valid URL.
    pub fn resolve(&self, endpoint: &str) -> Result<Url, ClientError> {
        self.root_url
            .join(endpoint)
            .map_err(|_| ClientError::InvalidUrl {
                url: endpoint.to_string(),
            })
    }

    /// Sends a request.
    ///
    /// Connection failures, and timeouts of GET requests, are retried up to
    /// the configured number of times, waiting [`RETRY_BASE_DELAY`] before the first retry
    /// and doubling the wait each time. Any 2xx status is a success.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - The request cannot be sent or retries are exhausted (`Api`, no status)
    /// - A non-2xx response is received (`Api`, with status)
    pub async fn request(&self, request: HttpRequest) -> Result<HttpResponse, ClientError> {
        request.verify()?;

        let mut attempt: u32 = 0;
        loop {
            let outgoing = self.build_request(&request)?;

            match self.client.execute(outgoing).await {
                Ok(res) => return Self::handle_response(res).await,
                Err(e)
                    if is_retryable(&e, request.http_method)
                        && self.max_retries.is_some_and(|max| attempt < max) =>
                {
                    let delay = RETRY_BASE_DELAY.saturating_mul(2u32.saturating_pow(attempt));
                    attempt += 1;
                    tracing::debug!(
                        url = %request.url,
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "Retrying STAPI request"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::debug!(url = %request.url, error = %e, "STAPI request failed");
                    return Err(ApiError::from(e).into());
                }
            }
        }
    }

    /// Reads JSON from an endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - An absolute URL or a path relative to the root URL
    /// * `method` - The HTTP method
    /// * `parameters` - Query parameters for GET, the JSON body for POST
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails.
    pub async fn read_json(
        &self,
        endpoint: &str,
        method: HttpMethod,
        parameters: Option<Value>,
    ) -> Result<Value, ClientError> {
        let url = self.resolve(endpoint)?;
        let mut builder = HttpRequest::builder(method, url.as_str());
        match (parameters, method) {
            (Some(parameters), _) => builder = builder.body(parameters),
            (None, RequestMethod::Post) => builder = builder.body(Value::Object(serde_json::Map::new())),
            (None, RequestMethod::Get) => {}
        }
        let response = self.request(builder.build()?).await?;
        Ok(response.body)
    }

    /// Follows a link and returns the decoded response along with the
    /// response headers.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails.
    pub async fn follow(&self, link: &Link) -> Result<HttpResponse, ClientError> {
        let url = self.resolve(&link.href)?;
        let mut absolute = link.clone();
        absolute.href = url.to_string();
        self.request(HttpRequest::from_link(&absolute).build()?).await
    }

    /// Fetches one page of a paginated collection.
    ///
    /// Returns `(None, None)` if the page's `lookup_key` member is absent or
    /// empty. Otherwise returns the page and its `rel="next"` link, with the
    /// link body already merged into the current body when the link asks
    /// for it.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the page's links
    /// cannot be decoded.
    pub async fn fetch_page(
        &self,
        link: &Link,
        lookup_key: &str,
    ) -> Result<(Option<Value>, Option<Link>), ClientError> {
        let page = self.follow(link).await?.body;

        if !has_items(&page, lookup_key) {
            return Ok((None, None));
        }

        let links: Vec<Link> = match page.get("links") {
            Some(links) if !links.is_null() => serde_json::from_value(links.clone())?,
            _ => Vec::new(),
        };
        let next = find_link(&links, "next").cloned().map(|mut next| {
            next.body = next.resolve_body(link.body.as_ref());
            next.merge = false;
            next
        });

        Ok((Some(page), next))
    }

    fn build_request(&self, request: &HttpRequest) -> Result<reqwest::Request, ClientError> {
        let url = Url::parse(&request.url).map_err(|_| InvalidHttpRequestError::InvalidUrl {
            url: request.url.clone(),
        })?;
        let method = match request.http_method {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
        };

        let mut builder = self.client.request(method, url);
        for (name, value) in merge_headers(&self.default_headers, &request.extra_headers) {
            builder = builder.header(name, value);
        }

        let mut query = self.parameters.clone();
        query.extend(request.query());
        if !query.is_empty() {
            builder = builder.query(&query);
        }

        if let Some(body) = request.json_body() {
            builder = builder.json(body);
        }

        let mut outgoing = builder.build().map_err(ApiError::from)?;
        if let Some(modifier) = &self.request_modifier {
            if let Some(replacement) = modifier(&mut outgoing) {
                outgoing = replacement;
            }
        }

        let header_names: Vec<&str> = outgoing.headers().keys().map(|k| k.as_str()).collect();
        match request.json_body() {
            Some(payload) => tracing::debug!(
                method = %outgoing.method(),
                url = %outgoing.url(),
                headers = ?header_names,
                payload = %payload,
                "Sending STAPI request"
            ),
            None => tracing::debug!(
                method = %outgoing.method(),
                url = %outgoing.url(),
                headers = ?header_names,
                "Sending STAPI request"
            ),
        }

        Ok(outgoing)
    }

    async fn handle_response(res: reqwest::Response) -> Result<HttpResponse, ClientError> {
        let code = res.status().as_u16();
        let headers = parse_response_headers(res.headers());
        let text = res.text().await.map_err(ApiError::from)?;

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).unwrap_or(Value::String(text))
        };

        let response = HttpResponse::new(code, headers, body);
        if response.is_ok() {
            return Ok(response);
        }

        tracing::debug!(status = code, "STAPI request returned an error status");
        Err(ApiError::new(Some(code), response.error_message()).into())
    }
}

/// Combines session headers with a request's own headers. A request header
/// replaces any session header of the same name, compared
/// case-insensitively; repeated request headers are all kept.
fn merge_headers<'a>(
    defaults: &'a HashMap<String, String>,
    extra: &'a [(String, String)],
) -> Vec<(&'a str, &'a str)> {
    let mut merged: Vec<(&str, &str)> = defaults
        .iter()
        .filter(|(name, _)| !extra.iter().any(|(extra_name, _)| extra_name.eq_ignore_ascii_case(name)))
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    merged.extend(extra.iter().map(|(name, value)| (name.as_str(), value.as_str())));
    merged
}

/// Connection failures happen before anything reaches the server and are
/// always retried. A timeout may fire after the server received the
/// request, so only GETs are retried on timeout.
fn is_retryable(error: &reqwest::Error, method: HttpMethod) -> bool {
    error.is_connect() || (error.is_timeout() && method == RequestMethod::Get)
}

/// Returns true if `page[lookup_key]` holds at least one item.
fn has_items(page: &Value, lookup_key: &str) -> bool {
    match page.get(lookup_key) {
        None | Some(Value::Null) => false,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(items)) => !items.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ClientConfig {
        ClientConfig::builder()
            .root_url(RootUrl::new("https://stapi.example.com").unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_user_agent_header_format() {
        let io = StapiIo::new(&config()).unwrap();

        let user_agent = io.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.contains("STAPI Rust Client v"));
    }

    #[test]
    fn test_user_agent_with_prefix() {
        let config = ClientConfig::builder()
            .root_url(RootUrl::new("https://stapi.example.com").unwrap())
            .user_agent_prefix("MyApp/1.0")
            .build()
            .unwrap();
        let io = StapiIo::new(&config).unwrap();

        let user_agent = io.default_headers().get("User-Agent").unwrap();
        assert!(user_agent.starts_with("MyApp/1.0 | "));
    }

    #[test]
    fn test_accept_header_is_json() {
        let io = StapiIo::new(&config()).unwrap();

        assert_eq!(
            io.default_headers().get("Accept"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_configured_headers_override_defaults() {
        let config = ClientConfig::builder()
            .root_url(RootUrl::new("https://stapi.example.com").unwrap())
            .header("Accept", "application/geo+json")
            .build()
            .unwrap();
        let io = StapiIo::new(&config).unwrap();

        assert_eq!(
            io.default_headers().get("Accept"),
            Some(&"application/geo+json".to_string())
        );
    }

    #[test]
    fn test_resolve_relative_and_absolute_endpoints() {
        let io = StapiIo::new(&config()).unwrap();

        assert_eq!(
            io.resolve("/products").unwrap().as_str(),
            "https://stapi.example.com/products"
        );
        assert_eq!(
            io.resolve("https://elsewhere.example.com/x").unwrap().as_str(),
            "https://elsewhere.example.com/x"
        );
    }

    #[test]
    fn test_request_headers_replace_session_headers() {
        let io = StapiIo::new(&config()).unwrap();
        let request = HttpRequest::builder(HttpMethod::Get, "https://stapi.example.com/orders")
            .header("accept", "application/geo+json")
            .header("X-Trace", "a")
            .header("X-Trace", "b")
            .build()
            .unwrap();

        let outgoing = io.build_request(&request).unwrap();

        let accept: Vec<&str> = outgoing
            .headers()
            .get_all("accept")
            .iter()
            .map(|value| value.to_str().unwrap())
            .collect();
        assert_eq!(accept, vec!["application/geo+json"]);
        assert_eq!(outgoing.headers().get_all("x-trace").iter().count(), 2);
        assert!(outgoing.headers().contains_key("user-agent"));
    }

    #[test]
    fn test_configured_header_names_are_case_insensitive() {
        let config = ClientConfig::builder()
            .root_url(RootUrl::new("https://stapi.example.com").unwrap())
            .header("accept", "application/geo+json")
            .build()
            .unwrap();
        let io = StapiIo::new(&config).unwrap();

        let accept: Vec<_> = io
            .default_headers()
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("accept"))
            .map(|(_, value)| value.as_str())
            .collect();
        assert_eq!(accept, vec!["application/geo+json"]);
    }

    #[test]
    fn test_has_items() {
        assert!(has_items(&json!({"features": [1]}), "features"));
        assert!(!has_items(&json!({"features": []}), "features"));
        assert!(!has_items(&json!({"features": null}), "features"));
        assert!(!has_items(&json!({"products": [1]}), "features"));
    }

    #[test]
    fn test_client_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<StapiIo>();
    }
}
