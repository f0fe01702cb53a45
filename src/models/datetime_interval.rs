//! Datetime intervals in the `start/end` notation.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::ModelError;

/// Marker for an open end of an interval.
const OPEN: &str = "..";

/// A time interval with optional start and end.
///
/// Serialized as `"<start>/<end>"` where each side is an RFC 3339 timestamp
/// or `..` for an open end.
///
/// # Example
///
/// ```rust
/// use stapi::models::DatetimeInterval;
///
/// let interval: DatetimeInterval = "2025-01-01T00:00:00Z/..".parse().unwrap();
/// assert!(interval.start().is_some());
/// assert!(interval.end().is_none());
/// assert_eq!(interval.to_string(), "2025-01-01T00:00:00Z/..");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DatetimeInterval {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl DatetimeInterval {
    /// Creates an interval.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EndBeforeStart`] if both ends are present and
    /// `end` precedes `start`.
    pub fn new(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, ModelError> {
        if let (Some(start), Some(end)) = (start, end) {
            if end < start {
                return Err(ModelError::EndBeforeStart);
            }
        }
        Ok(Self { start, end })
    }

    /// Returns the start of the interval, if bounded.
    #[must_use]
    pub const fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    /// Returns the end of the interval, if bounded.
    #[must_use]
    pub const fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }
}

fn parse_bound(raw: &str, value: &str) -> Result<Option<DateTime<Utc>>, ModelError> {
    let raw = raw.trim();
    if raw.is_empty() || raw == OPEN {
        return Ok(None);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| ModelError::InvalidInterval {
            value: value.to_string(),
            reason: e.to_string(),
        })
}

fn format_bound(bound: Option<DateTime<Utc>>) -> String {
    bound.map_or_else(
        || OPEN.to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
    )
}

impl FromStr for DatetimeInterval {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s.split_once('/').ok_or_else(|| ModelError::InvalidInterval {
            value: s.to_string(),
            reason: "missing '/' separator".to_string(),
        })?;
        Self::new(parse_bound(start, s)?, parse_bound(end, s)?)
    }
}

impl fmt::Display for DatetimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", format_bound(self.start), format_bound(self.end))
    }
}

impl Serialize for DatetimeInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for DatetimeInterval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(de::Error::custom)
    }
}
