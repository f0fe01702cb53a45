//! Validation errors raised by the resource models.

use thiserror::Error;

/// Errors that can occur while constructing or parsing resource models.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// A datetime interval string could not be parsed.
    #[error("Invalid datetime interval '{value}': {reason}")]
    InvalidInterval {
        /// The raw value that was provided.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The end of a datetime interval precedes its start.
    #[error("Invalid datetime interval: end before start")]
    EndBeforeStart,

    /// A request method other than GET or POST was supplied.
    #[error("Invalid request method '{method}'. Expected GET or POST.")]
    InvalidMethod {
        /// The method that was provided.
        method: String,
    },

    /// A `Prefer` header value is not one of the supported preferences.
    #[error("Invalid Prefer header value: {value}")]
    InvalidPreference {
        /// The header value that was provided.
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_interval_message_includes_value() {
        let error = ModelError::InvalidInterval {
            value: "yesterday".to_string(),
            reason: "missing '/' separator".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("yesterday"));
        assert!(message.contains("separator"));
    }

    #[test]
    fn test_end_before_start_message() {
        assert_eq!(
            ModelError::EndBeforeStart.to_string(),
            "Invalid datetime interval: end before start"
        );
    }
}
