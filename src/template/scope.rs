//! Scoped variables: the per-request snapshot that interpolation reads
//!
//! A [`ScopedVars`] is built fresh for every resolution call and owns all of
//! its data. Mutating the variable store afterwards never changes a scope
//! that was already handed to a request.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a scoped variable: text or a number
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopedValue {
    /// String value
    Text(String),
    /// Numeric value (`__interval_ms`, `__range_s`, ...)
    Number(f64),
}

impl ScopedValue {
    /// An empty text value never resolves a token
    pub fn is_empty(&self) -> bool {
        matches!(self, ScopedValue::Text(s) if s.is_empty())
    }

    /// Numeric view of the value, parsing text when possible
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScopedValue::Number(n) => Some(*n),
            ScopedValue::Text(s) => s.parse().ok(),
        }
    }
}

impl fmt::Display for ScopedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopedValue::Text(s) => f.write_str(s),
            // f64 Display prints 30000.0 as "30000"
            ScopedValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for ScopedValue {
    fn from(value: &str) -> Self {
        ScopedValue::Text(value.to_string())
    }
}

impl From<String> for ScopedValue {
    fn from(value: String) -> Self {
        ScopedValue::Text(value)
    }
}

impl From<f64> for ScopedValue {
    fn from(value: f64) -> Self {
        ScopedValue::Number(value)
    }
}

impl From<i64> for ScopedValue {
    fn from(value: i64) -> Self {
        ScopedValue::Number(value as f64)
    }
}

/// One entry of a scope: display text plus substituted value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedVar {
    /// Display text
    pub text: String,
    /// Value substituted into queries
    pub value: ScopedValue,
    /// Value was already escaped for its destination when it was joined
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub formatted: bool,
}

impl ScopedVar {
    /// Create an entry with distinct text and value
    pub fn new(text: impl Into<String>, value: impl Into<ScopedValue>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
            formatted: false,
        }
    }

    /// Create a text entry whose display text equals its value
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            text: value.clone(),
            value: ScopedValue::Text(value),
            formatted: false,
        }
    }

    /// Create a numeric entry whose display text is the number itself
    pub fn number(value: f64) -> Self {
        let value = ScopedValue::Number(value);
        Self {
            text: value.to_string(),
            value,
            formatted: false,
        }
    }

    /// Mark the value as already escaped, so interpolation inserts it as is
    pub fn preformatted(mut self) -> Self {
        self.formatted = true;
        self
    }
}

/// Insertion-ordered mapping from variable name to [`ScopedVar`]
///
/// # Example
///
/// ```rust
/// use kuba_templating::template::{ScopedVar, ScopedVars};
///
/// let mut scope = ScopedVars::new();
/// scope.insert("env", ScopedVar::text("prod"));
/// scope.insert("env", ScopedVar::text("staging"));
///
/// assert_eq!(scope.len(), 1);
/// assert_eq!(scope.resolve("env").as_deref(), Some("staging"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScopedVars(IndexMap<String, ScopedVar>);

impl ScopedVars {
    /// Create an empty scope
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry; a replaced entry keeps its position
    pub fn insert(&mut self, name: impl Into<String>, var: ScopedVar) -> Option<ScopedVar> {
        self.0.insert(name.into(), var)
    }

    /// Builder style insert
    pub fn with(mut self, name: impl Into<String>, var: ScopedVar) -> Self {
        self.insert(name, var);
        self
    }

    /// Layer `other` on top of this scope; entries of `other` win
    pub fn extend(&mut self, other: &ScopedVars) {
        for (name, var) in other.iter() {
            self.0.insert(name.clone(), var.clone());
        }
    }

    /// Look up an entry
    pub fn get(&self, name: &str) -> Option<&ScopedVar> {
        self.0.get(name)
    }

    /// Check if an entry exists, resolvable or not
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Entry for `name` when it can resolve a token
    pub fn get_resolvable(&self, name: &str) -> Option<&ScopedVar> {
        self.0.get(name).filter(|var| !var.value.is_empty())
    }

    /// Substitutable value of `name`, or `None` when absent or empty
    pub fn resolve(&self, name: &str) -> Option<String> {
        self.get_resolvable(name).map(|var| var.value.to_string())
    }

    /// Display text of `name`, or `None` when absent or its value is empty
    pub fn resolve_text(&self, name: &str) -> Option<&str> {
        self.0
            .get(name)
            .filter(|var| !var.value.is_empty())
            .map(|var| var.text.as_str())
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ScopedVar)> {
        self.0.iter()
    }

    /// Names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the scope has no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<N: Into<String>> FromIterator<(N, ScopedVar)> for ScopedVars {
    fn from_iter<I: IntoIterator<Item = (N, ScopedVar)>>(iter: I) -> Self {
        let mut scope = ScopedVars::new();
        for (name, var) in iter {
            scope.insert(name, var);
        }
        scope
    }
}
