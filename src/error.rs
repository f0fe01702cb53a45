//! Configuration errors for the STAPI crate.
//!
//! This module contains the error type returned while building client
//! configuration and validating configuration values.
//!
//! # Error Handling
//!
//! Configuration constructors return `Result<T, ConfigError>` so invalid
//! values fail fast, before any request is made.
//!
//! # Example
//!
//! ```rust
//! use stapi::{ConfigError, RootUrl};
//!
//! let result = RootUrl::new("not a url");
//! assert!(matches!(result, Err(ConfigError::InvalidRootUrl { .. })));
//! ```

use thiserror::Error;

/// Errors that can occur while configuring a client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The root URL is not an absolute HTTP(S) URL.
    #[error("Invalid root URL '{url}'. Please provide an absolute http(s) URL (e.g., 'https://stapi.example.com').")]
    InvalidRootUrl {
        /// The invalid URL that was provided.
        url: String,
    },

    /// A required field is missing.
    #[error("Missing required field: '{field}'. This field must be set before building the configuration.")]
    MissingRequiredField {
        /// The name of the missing field.
        field: &'static str,
    },

    /// A default header name or value cannot be sent over HTTP.
    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader {
        /// The header name that was provided.
        name: String,
        /// The reason the header was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_root_url_error_message() {
        let error = ConfigError::InvalidRootUrl {
            url: "ftp:/nowhere".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("ftp:/nowhere"));
        assert!(message.contains("absolute http(s) URL"));
    }

    #[test]
    fn test_missing_required_field_error_message() {
        let error = ConfigError::MissingRequiredField { field: "root_url" };
        let message = error.to_string();
        assert!(message.contains("root_url"));
        assert!(message.contains("must be set"));
    }

    #[test]
    fn test_error_implements_std_error() {
        let error = ConfigError::MissingRequiredField { field: "root_url" };
        let _: &dyn std::error::Error = &error;
    }
}
