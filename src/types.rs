//! Core data types shared by the templating components
//!
//! # Key Types
//!
//! - **`TimeRange`**: Time window of a request (start, end) in milliseconds
//! - **`VariableValue`**: A display text / underlying value pair
//! - **`Query`**: One query row of a panel, identified by its `ref_id`
//!
//! # Example
//!
//! ```rust
//! use kuba_templating::types::{Query, TimeRange};
//!
//! let range = TimeRange::new(1000, 2000).unwrap();
//! assert_eq!(range.duration_ms(), Some(1000));
//!
//! let query = Query::new("A").with_field("expr", "up{job=\"$job\"}");
//! assert_eq!(query.ref_id, "A");
//! ```

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Time range of a request (inclusive on both ends)
///
/// Timestamps are Unix milliseconds. Both bounds are inclusive.
///
/// # Example
///
/// ```rust
/// use kuba_templating::types::TimeRange;
///
/// let range = TimeRange::new(1000, 2000).unwrap();
/// assert!(range.contains(1000));
/// assert!(range.contains(2000));
/// assert!(!range.contains(2001));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start timestamp in milliseconds (inclusive)
    pub start: i64,

    /// End timestamp in milliseconds (inclusive)
    pub end: i64,
}

impl TimeRange {
    /// Create a new time range with validation
    ///
    /// # Returns
    ///
    /// - `Ok(TimeRange)` if start <= end
    /// - `Err(Error::InvalidTimeRange)` if start > end
    ///
    /// # Example
    ///
    /// ```rust
    /// use kuba_templating::types::TimeRange;
    ///
    /// assert!(TimeRange::new(1000, 2000).is_ok());
    /// assert!(TimeRange::new(2000, 1000).is_err());
    /// ```
    pub fn new(start: i64, end: i64) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidTimeRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Create a new time range without validation
    ///
    /// `duration_ms` returns a negative value for a reversed range.
    pub fn new_unchecked(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Build a range from two UTC instants
    pub fn from_datetimes(from: DateTime<Utc>, to: DateTime<Utc>) -> Result<Self> {
        Self::new(from.timestamp_millis(), to.timestamp_millis())
    }

    /// Build a range spanning midnight of `from` to midnight of `to` (UTC)
    ///
    /// ```rust
    /// use chrono::NaiveDate;
    /// use kuba_templating::types::TimeRange;
    ///
    /// let range = TimeRange::from_dates(
    ///     NaiveDate::from_ymd_opt(2022, 6, 8).unwrap(),
    ///     NaiveDate::from_ymd_opt(2022, 6, 10).unwrap(),
    /// )
    /// .unwrap();
    /// assert_eq!(range.duration_ms(), Some(2 * 86_400_000));
    /// ```
    pub fn from_dates(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        let start = Utc.from_utc_datetime(&from.and_time(chrono::NaiveTime::MIN));
        let end = Utc.from_utc_datetime(&to.and_time(chrono::NaiveTime::MIN));
        Self::from_datetimes(start, end)
    }

    /// Range covering the last `duration_ms` milliseconds up to `now`
    pub fn last_ms(now: i64, duration_ms: i64) -> Self {
        Self {
            start: now.saturating_sub(duration_ms),
            end: now,
        }
    }

    /// Check if a timestamp falls within this range (inclusive)
    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Check if `other` lies completely inside this range
    pub fn contains_range(&self, other: &TimeRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Get the duration of this range in milliseconds
    ///
    /// Returns `None` if the subtraction would overflow.
    pub fn duration_ms(&self) -> Option<i64> {
        self.end.checked_sub(self.start)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// A selectable value of a variable
///
/// `text` is what a picker shows, `value` is what gets substituted into a
/// query. For most variables they are the same.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableValue {
    /// Display text
    pub text: String,
    /// Underlying value
    pub value: String,
}

impl VariableValue {
    /// Create a value whose text and value differ
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }

    /// Create a value whose display text equals its value
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            text: value.clone(),
            value,
        }
    }

    /// True when the underlying value is empty
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl From<&str> for VariableValue {
    fn from(value: &str) -> Self {
        Self::plain(value)
    }
}

impl From<String> for VariableValue {
    fn from(value: String) -> Self {
        Self::plain(value)
    }
}

/// One query row of a panel
///
/// Only `ref_id` and `hide` are interpreted here. Everything else is
/// datasource specific and kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Query {
    /// Identifier unique within the query list ("A", "B", ...)
    #[serde(default)]
    pub ref_id: String,

    /// Hidden queries are not executed
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub hide: bool,

    /// Datasource specific fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Query {
    /// Create a query with the given ref id and no fields
    pub fn new(ref_id: impl Into<String>) -> Self {
        Self {
            ref_id: ref_id.into(),
            ..Default::default()
        }
    }

    /// Builder style helper to set a string field
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields
            .insert(key.into(), serde_json::Value::String(value.into()));
        self
    }

    /// Read a string field
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}
