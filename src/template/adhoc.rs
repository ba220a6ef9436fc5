//! Ad-hoc filters
//!
//! Ad-hoc filters are structured `key op value` constraints chosen by the
//! user. They are never merged into the substitution scope; the datasource
//! applies them as query filters.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::format::prometheus_string_escape;

/// Comparison operator of an ad-hoc filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOperator {
    /// `=`
    #[serde(rename = "=")]
    Equals,
    /// `!=`
    #[serde(rename = "!=")]
    NotEquals,
    /// `=~`
    #[serde(rename = "=~")]
    RegexMatch,
    /// `!~`
    #[serde(rename = "!~")]
    RegexNotMatch,
    /// `<`
    #[serde(rename = "<")]
    LessThan,
    /// `>`
    #[serde(rename = ">")]
    GreaterThan,
}

impl FilterOperator {
    /// Operator as written in a query
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Equals => "=",
            FilterOperator::NotEquals => "!=",
            FilterOperator::RegexMatch => "=~",
            FilterOperator::RegexNotMatch => "!~",
            FilterOperator::LessThan => "<",
            FilterOperator::GreaterThan => ">",
        }
    }

    /// True for the two regex operators
    pub fn is_regex(&self) -> bool {
        matches!(self, FilterOperator::RegexMatch | FilterOperator::RegexNotMatch)
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ad-hoc filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdHocFilter {
    /// Label or column name
    pub key: String,
    /// Comparison operator
    pub operator: FilterOperator,
    /// Compared value
    pub value: String,
}

impl AdHocFilter {
    /// Create a filter
    pub fn new(key: impl Into<String>, operator: FilterOperator, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Render filters as a label matcher list body: `k="v",k2=~"v2"`
///
/// Every value is escaped for a double-quoted PromQL string, so `"` and `\`
/// cannot end the literal early. Regex values stay patterns; only their
/// quoting changes. `<` and `>` have no label matcher form and are skipped.
///
/// ```rust
/// use kuba_templating::template::{render_adhoc_matchers, AdHocFilter, FilterOperator};
///
/// let filters = vec![
///     AdHocFilter::new("job", FilterOperator::Equals, "api"),
///     AdHocFilter::new("pod", FilterOperator::RegexMatch, "api-.*"),
/// ];
/// assert_eq!(render_adhoc_matchers(&filters), r#"job="api",pod=~"api-.*""#);
/// ```
pub fn render_adhoc_matchers(filters: &[AdHocFilter]) -> String {
    filters
        .iter()
        .filter(|f| !matches!(f.operator, FilterOperator::LessThan | FilterOperator::GreaterThan))
        .map(|f| format!("{}{}\"{}\"", f.key, f.operator, prometheus_string_escape(&f.value)))
        .collect::<Vec<_>>()
        .join(",")
}
