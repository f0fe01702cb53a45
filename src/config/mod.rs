//! Client configuration for STAPI.
//!
//! This module provides the configuration used to open a [`Client`](crate::Client):
//! where the API lives, what every request carries, how failures are
//! retried and how advisory warnings are surfaced.
//!
//! # Overview
//!
//! - [`ClientConfig`]: The immutable configuration held by a client
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`RootUrl`]: A validated STAPI root URL
//! - [`RequestModifier`]: A hook applied to every outgoing request
//!
//! # Example
//!
//! ```rust
//! use stapi::{ClientConfig, RootUrl, WarningPolicy};
//!
//! let config = ClientConfig::builder()
//!     .root_url(RootUrl::new("https://stapi.example.com").unwrap())
//!     .header("Authorization", "Bearer token")
//!     .warning_policy(WarningPolicy::Ignore)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.max_retries(), Some(5));
//! ```

mod newtypes;

pub use newtypes::RootUrl;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};

use crate::clients::WarningPolicy;
use crate::conformance::ConformanceRegistry;
use crate::error::ConfigError;

/// Default number of retries for connection and timeout failures.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// A hook invoked on every outgoing request just before it is sent.
///
/// The hook may mutate the request in place and return `None`, or return a
/// replacement request which is sent instead.
pub type RequestModifier =
    Arc<dyn Fn(&mut reqwest::Request) -> Option<reqwest::Request> + Send + Sync>;

/// Configuration for a STAPI client.
///
/// # Thread Safety
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`.
#[derive(Clone)]
pub struct ClientConfig {
    root_url: RootUrl,
    headers: HashMap<String, String>,
    parameters: HashMap<String, String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    warning_policy: WarningPolicy,
    request_modifier: Option<RequestModifier>,
    registry: ConformanceRegistry,
    user_agent_prefix: Option<String>,
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the root URL of the API.
    #[must_use]
    pub const fn root_url(&self) -> &RootUrl {
        &self.root_url
    }

    /// Returns the headers sent with every request.
    #[must_use]
    pub const fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Returns the query parameters sent with every request.
    #[must_use]
    pub const fn parameters(&self) -> &HashMap<String, String> {
        &self.parameters
    }

    /// Returns the per-request timeout, if configured.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Returns the number of retries for transient failures.
    ///
    /// `None` disables retries.
    #[must_use]
    pub const fn max_retries(&self) -> Option<u32> {
        self.max_retries
    }

    /// Returns how advisory warnings are handled.
    #[must_use]
    pub const fn warning_policy(&self) -> WarningPolicy {
        self.warning_policy
    }

    /// Returns the request modifier hook, if configured.
    #[must_use]
    pub const fn request_modifier(&self) -> Option<&RequestModifier> {
        self.request_modifier.as_ref()
    }

    /// Returns the conformance registry.
    #[must_use]
    pub const fn registry(&self) -> &ConformanceRegistry {
        &self.registry
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("root_url", &self.root_url)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("parameters", &self.parameters)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("warning_policy", &self.warning_policy)
            .field("request_modifier", &self.request_modifier.is_some())
            .field("registry", &self.registry)
            .field("user_agent_prefix", &self.user_agent_prefix)
            .finish()
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// `root_url` is required. Everything else has a default.
///
/// # Defaults
///
/// - `max_retries`: `Some(5)`
/// - `warning_policy`: [`WarningPolicy::Warn`]
/// - `registry`: [`ConformanceRegistry::default`]
/// - `timeout`: `None`
/// - `headers`, `parameters`: empty
#[derive(Default)]
pub struct ClientConfigBuilder {
    root_url: Option<RootUrl>,
    headers: HashMap<String, String>,
    parameters: HashMap<String, String>,
    timeout: Option<Duration>,
    max_retries: Option<Option<u32>>,
    warning_policy: Option<WarningPolicy>,
    request_modifier: Option<RequestModifier>,
    registry: Option<ConformanceRegistry>,
    user_agent_prefix: Option<String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the root URL (required).
    #[must_use]
    pub fn root_url(mut self, url: RootUrl) -> Self {
        self.root_url = Some(url);
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds several headers sent with every request.
    #[must_use]
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Adds a query parameter sent with every request.
    #[must_use]
    pub fn parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the number of retries; `None` disables retrying.
    #[must_use]
    pub const fn max_retries(mut self, retries: Option<u32>) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Sets how advisory warnings are handled.
    #[must_use]
    pub const fn warning_policy(mut self, policy: WarningPolicy) -> Self {
        self.warning_policy = Some(policy);
        self
    }

    /// Sets a hook applied to each request before it is sent.
    ///
    /// # Example
    ///
    /// ```rust
    /// use stapi::{ClientConfig, RootUrl};
    ///
    /// let config = ClientConfig::builder()
    ///     .root_url(RootUrl::new("https://stapi.example.com").unwrap())
    ///     .request_modifier(|request: &mut reqwest::Request| {
    ///         request.headers_mut().insert("x-trace", "1".parse().unwrap());
    ///         None
    ///     })
    ///     .build()
    ///     .unwrap();
    /// assert!(config.request_modifier().is_some());
    /// ```
    #[must_use]
    pub fn request_modifier<F>(mut self, modifier: F) -> Self
    where
        F: Fn(&mut reqwest::Request) -> Option<reqwest::Request> + Send + Sync + 'static,
    {
        self.request_modifier = Some(Arc::new(modifier));
        self
    }

    /// Sets the conformance registry.
    #[must_use]
    pub fn registry(mut self, registry: ConformanceRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`ClientConfig`], validating required fields and headers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `root_url` is not set,
    /// or [`ConfigError::InvalidHeader`] if a header cannot be sent.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let root_url = self
            .root_url
            .ok_or(ConfigError::MissingRequiredField { field: "root_url" })?;

        for (name, value) in &self.headers {
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
            HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
                name: name.clone(),
                reason: e.to_string(),
            })?;
        }

        Ok(ClientConfig {
            root_url,
            headers: self.headers,
            parameters: self.parameters,
            timeout: self.timeout,
            max_retries: self.max_retries.unwrap_or(Some(DEFAULT_MAX_RETRIES)),
            warning_policy: self.warning_policy.unwrap_or_default(),
            request_modifier: self.request_modifier,
            registry: self.registry.unwrap_or_default(),
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
