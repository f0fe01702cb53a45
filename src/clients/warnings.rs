//! Advisory warnings raised by the client.
//!
//! Some conditions are worth telling the caller about without failing the
//! operation: a server that advertises no conformance classes, a missing
//! link, a fallback to default links. A [`WarningPolicy`] held in the client
//! configuration decides whether such an [`Advisory`] is logged, escalated
//! to an error, or ignored.
//!
//! # Example
//!
//! ```rust
//! use stapi::clients::{Advisory, WarningPolicy};
//!
//! let advisory = Advisory::NoConformsTo;
//! assert!(WarningPolicy::Warn.apply(advisory.clone()).is_ok());
//! assert!(WarningPolicy::Error.apply(advisory).is_err());
//! ```

use thiserror::Error;

/// A non-fatal condition detected by the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Advisory {
    /// The server does not advertise any conformance classes.
    #[error("Server does not advertise any conformance classes.")]
    NoConformsTo,

    /// The server does not advertise a class the operation relies on.
    #[error("Server does not conform to {}", .classes.join(", "))]
    DoesNotConformTo {
        /// Names of the missing classes.
        classes: Vec<String>,
    },

    /// A link was not found on a resource.
    #[error("No link with rel='{rel}' could be found on this {resource}.")]
    MissingLink {
        /// The relation that was looked up.
        rel: String,
        /// The resource that was searched.
        resource: String,
    },

    /// The root document has no links and default links were assumed.
    #[error("No links found in the root of the STAPI API; falling back to default links.")]
    FallbackToDefaultLinks,
}

/// How advisory warnings are surfaced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WarningPolicy {
    /// Log with `tracing::warn!` and continue.
    #[default]
    Warn,
    /// Fail the operation with the advisory.
    Error,
    /// Continue silently.
    Ignore,
}

impl WarningPolicy {
    /// Applies the policy to an advisory.
    ///
    /// # Errors
    ///
    /// Returns the advisory itself under [`WarningPolicy::Error`].
    pub fn apply(self, advisory: Advisory) -> Result<(), Advisory> {
        match self {
            Self::Warn => {
                tracing::warn!("{}", advisory);
                Ok(())
            }
            Self::Error => Err(advisory),
            Self::Ignore => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_warn() {
        assert_eq!(WarningPolicy::default(), WarningPolicy::Warn);
    }

    #[test]
    fn test_ignore_and_warn_continue() {
        assert!(WarningPolicy::Ignore.apply(Advisory::NoConformsTo).is_ok());
        assert!(WarningPolicy::Warn
            .apply(Advisory::FallbackToDefaultLinks)
            .is_ok());
    }

    #[test]
    fn test_error_policy_escalates() {
        let advisory = Advisory::MissingLink {
            rel: "orders".to_string(),
            resource: "API".to_string(),
        };
        assert_eq!(WarningPolicy::Error.apply(advisory.clone()), Err(advisory));
    }

    #[test]
    fn test_advisory_messages() {
        let advisory = Advisory::DoesNotConformTo {
            classes: vec!["OPPORTUNITIES".to_string(), "CORE".to_string()],
        };
        assert_eq!(
            advisory.to_string(),
            "Server does not conform to OPPORTUNITIES, CORE"
        );

        let advisory = Advisory::MissingLink {
            rel: "products".to_string(),
            resource: "API".to_string(),
        };
        assert_eq!(
            advisory.to_string(),
            "No link with rel='products' could be found on this API."
        );
    }
}
