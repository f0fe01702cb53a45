//! Validated newtype wrappers for configuration values.
//!
//! Values are checked on construction so an invalid root URL is rejected
//! before a client ever touches the network.

use std::fmt;

use reqwest::Url;

use crate::error::ConfigError;

/// A validated STAPI root URL.
///
/// The root URL must be absolute and use the `http` or `https` scheme.
/// A trailing slash is removed so relative endpoints can be appended
/// uniformly.
///
/// # Example
///
/// ```rust
/// use stapi::RootUrl;
///
/// let root = RootUrl::new("https://stapi.example.com/").unwrap();
/// assert_eq!(root.as_ref(), "https://stapi.example.com");
/// assert_eq!(root.join("/products").unwrap().as_str(), "https://stapi.example.com/products");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootUrl {
    url: String,
}

impl RootUrl {
    /// Creates a new validated root URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRootUrl`] if the URL cannot be parsed
    /// or does not use an HTTP scheme.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/').to_string();

        let parsed = Url::parse(&trimmed).map_err(|_| ConfigError::InvalidRootUrl { url: url.clone() })?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidRootUrl { url });
        }

        Ok(Self { url: trimmed })
    }

    /// Returns the URL scheme (e.g., "https").
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.split("://").next().unwrap_or_default()
    }

    /// Resolves an endpoint against the root URL.
    ///
    /// Absolute endpoints are returned unchanged. Relative endpoints are
    /// appended to the root URL, keeping any path prefix the root carries.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRootUrl`] if the resulting URL is not
    /// valid.
    pub fn join(&self, endpoint: &str) -> Result<Url, ConfigError> {
        let candidate = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("{}/{}", self.url, endpoint.trim_start_matches('/'))
        };
        Url::parse(&candidate).map_err(|_| ConfigError::InvalidRootUrl { url: candidate })
    }
}

impl AsRef<str> for RootUrl {
    fn as_ref(&self) -> &str {
        &self.url
    }
}

impl fmt::Display for RootUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}
