//! Token scanning and substitution
//!
//! Two token shapes are recognized by a single regular expression:
//!
//! - `$name`: bare word, identifier characters only
//! - `[[name]]`: bracket form, any non-bracket characters inside, so a name
//!   can sit directly against other text (`cpu[[suffix]]total`)
//!
//! Substitution is a single left-to-right pass. A substituted value is never
//! scanned again, so a variable whose value contains `$other` (or itself)
//! stays literal and cycles cannot recurse.
//!
//! A token whose name is missing from the scope, or whose value is empty, is
//! left exactly as written.
//!
//! # Example
//!
//! ```rust
//! use kuba_templating::template::{Interpolator, ScopedVar, ScopedVars};
//!
//! let scope = ScopedVars::new().with("job", ScopedVar::text("api"));
//! let interpolator = Interpolator::default();
//!
//! assert_eq!(
//!     interpolator.interpolate("up{job=\"$job\", env=\"$env\"}", &scope),
//!     "up{job=\"api\", env=\"$env\"}"
//! );
//! ```

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::borrow::Cow;
use tracing::{debug, warn};

use super::scope::ScopedVars;
use crate::config::InterpolationConfig;
use crate::metrics;

lazy_static! {
    /// `$name` or `[[name]]`
    static ref TOKEN_RE: Regex = Regex::new(r"\$(\w+)|\[\[([^\[\]]+?)\]\]").unwrap();
}

/// Name captured by a token match
fn token_name<'t>(caps: &Captures<'t>) -> &'t str {
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .unwrap_or_default()
}

/// Token scanner and substitution engine
#[derive(Debug, Clone)]
pub struct Interpolator {
    warn_on_unresolved: bool,
    highlight_class: String,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(&InterpolationConfig::default())
    }
}

impl Interpolator {
    /// Create an interpolator from configuration
    pub fn new(config: &InterpolationConfig) -> Self {
        Self {
            warn_on_unresolved: config.warn_on_unresolved,
            highlight_class: config.highlight_class.clone(),
        }
    }

    /// Substitute every resolvable token with its value
    pub fn interpolate(&self, input: &str, scope: &ScopedVars) -> String {
        self.interpolate_with(input, scope, |value: &str| value.to_string())
    }

    /// Substitute every resolvable token with its value passed through `escape`
    ///
    /// `escape` sees only the value being inserted, never the surrounding
    /// text.
    ///
    /// ```rust
    /// use kuba_templating::template::{format::sql_string_escape, Interpolator, ScopedVar, ScopedVars};
    ///
    /// let scope = ScopedVars::new().with("name", ScopedVar::text("O'Brien"));
    /// let sql = Interpolator::default().interpolate_with(
    ///     "SELECT * FROM users WHERE name = '$name'",
    ///     &scope,
    ///     sql_string_escape,
    /// );
    /// assert_eq!(sql, "SELECT * FROM users WHERE name = 'O''Brien'");
    /// ```
    pub fn interpolate_with<F>(&self, input: &str, scope: &ScopedVars, escape: F) -> String
    where
        F: Fn(&str) -> String,
    {
        self.substitute(input, |name| scope.resolve(name).map(|value| escape(&value)))
            .into_owned()
    }

    /// Like [`interpolate_with`](Self::interpolate_with), but values marked
    /// preformatted are inserted as they are
    ///
    /// Joined multi-value selections were already escaped part by part for
    /// their destination; escaping them again would break them.
    pub fn interpolate_escaped<F>(&self, input: &str, scope: &ScopedVars, escape: F) -> String
    where
        F: Fn(&str) -> String,
    {
        self.substitute(input, |name| {
            scope.get_resolvable(name).map(|var| {
                let value = var.value.to_string();
                if var.formatted {
                    value
                } else {
                    escape(&value)
                }
            })
        })
        .into_owned()
    }

    /// Substitute every resolvable token with its display text
    ///
    /// Used for legends and titles, where the human readable text is wanted.
    pub fn interpolate_text(&self, input: &str, scope: &ScopedVars) -> String {
        self.substitute(input, |name| scope.resolve_text(name).map(str::to_string))
            .into_owned()
    }

    fn substitute<'a, L>(&self, input: &'a str, lookup: L) -> Cow<'a, str>
    where
        L: Fn(&str) -> Option<String>,
    {
        TOKEN_RE.replace_all(input, |caps: &Captures| {
            let name = token_name(caps);
            match lookup(name) {
                Some(value) => {
                    metrics::record_token(true);
                    value
                }
                None => {
                    metrics::record_token(false);
                    if self.warn_on_unresolved {
                        warn!(variable = %name, "Template variable left unresolved");
                    } else {
                        debug!(variable = %name, "Template variable left unresolved");
                    }
                    caps[0].to_string()
                }
            }
        })
    }

    /// True iff at least one token in `expression` resolves in `scope`
    pub fn variable_exists(&self, expression: &str, scope: &ScopedVars) -> bool {
        TOKEN_RE
            .captures_iter(expression)
            .any(|caps| scope.resolve(token_name(&caps)).is_some())
    }

    /// Wrap every resolvable token in a marker span
    ///
    /// Unresolvable tokens are left bare. The text is otherwise untouched.
    pub fn highlight_variables_as_html(&self, input: &str, scope: &ScopedVars) -> String {
        TOKEN_RE
            .replace_all(input, |caps: &Captures| {
                if scope.resolve(token_name(caps)).is_some() {
                    format!("<span class=\"{}\">{}</span>", self.highlight_class, &caps[0])
                } else {
                    caps[0].to_string()
                }
            })
            .into_owned()
    }
}

/// True when `expression` contains any token, resolvable or not
pub fn contains_template(expression: &str) -> bool {
    TOKEN_RE.is_match(expression)
}

/// Names referenced by `expression`, in order of first appearance
///
/// ```rust
/// use kuba_templating::template::variable_names;
///
/// let names = variable_names("sum(rate(x{job=\"$job\"}[$__interval])) by ([[group]], $job)");
/// assert_eq!(names, vec!["job", "__interval", "group"]);
/// ```
pub fn variable_names(expression: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in TOKEN_RE.captures_iter(expression) {
        let name = token_name(&caps);
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
