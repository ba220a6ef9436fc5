//! Multi-value joining and destination escaping
//!
//! A multi-value selection has to become one string before it reaches the
//! interpolator. [`MultiValueFormat`] decides how the parts are joined. The
//! escape functions are what datasources pass to
//! [`Interpolator::interpolate_escaped`](super::Interpolator::interpolate_escaped);
//! lists joined here are not escaped a second time.

use serde::{Deserialize, Serialize};

/// How the parts of a multi-value selection are joined
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiValueFormat {
    /// `a,b,c`
    #[default]
    Csv,
    /// `a|b|c`
    Pipe,
    /// `(a|b|c)` with every part regex-escaped
    Regex,
    /// `{a,b,c}`
    Glob,
    /// `["a","b","c"]`
    Json,
    /// Parts joined with an arbitrary separator
    Custom(String),
    /// PromQL regex matcher: `(a|b|c)`, parts escaped for a quoted regex
    Prometheus,
    /// SQL list: `'a','b','c'`, parts escaped as string literals
    Sql,
}

impl MultiValueFormat {
    /// Join the parts of a selection into one string
    ///
    /// A single part renders as itself, except for the escaping formats
    /// (`Regex`, `Prometheus`, `Sql`) and `Json` (always an array).
    ///
    /// ```rust
    /// use kuba_templating::template::MultiValueFormat;
    ///
    /// let parts = ["web-1", "web-2"];
    /// assert_eq!(MultiValueFormat::Csv.join(&parts), "web-1,web-2");
    /// assert_eq!(MultiValueFormat::Glob.join(&parts), "{web-1,web-2}");
    /// assert_eq!(MultiValueFormat::Regex.join(&["a.b"]), "a\\.b");
    /// ```
    pub fn join<S: AsRef<str>>(&self, parts: &[S]) -> String {
        match self {
            MultiValueFormat::Csv => join_with(parts, ","),
            MultiValueFormat::Pipe => join_with(parts, "|"),
            MultiValueFormat::Custom(separator) => join_with(parts, separator),
            MultiValueFormat::Regex => {
                let escaped: Vec<String> = parts.iter().map(|p| regex_escape(p.as_ref())).collect();
                if escaped.len() == 1 {
                    escaped.into_iter().next().unwrap_or_default()
                } else {
                    format!("({})", escaped.join("|"))
                }
            }
            MultiValueFormat::Glob => {
                if parts.len() == 1 {
                    parts[0].as_ref().to_string()
                } else {
                    format!("{{{}}}", join_with(parts, ","))
                }
            }
            MultiValueFormat::Prometheus => {
                let escaped: Vec<String> =
                    parts.iter().map(|p| prometheus_special_regex_escape(p.as_ref())).collect();
                if escaped.len() == 1 {
                    escaped.into_iter().next().unwrap_or_default()
                } else {
                    format!("({})", escaped.join("|"))
                }
            }
            MultiValueFormat::Sql => parts
                .iter()
                .map(|p| format!("'{}'", sql_string_escape(p.as_ref())))
                .collect::<Vec<_>>()
                .join(","),
            MultiValueFormat::Json => {
                let values: Vec<&str> = parts.iter().map(|p| p.as_ref()).collect();
                serde_json::to_string(&values).unwrap_or_default()
            }
        }
    }
}

fn join_with<S: AsRef<str>>(parts: &[S], separator: &str) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        out.push_str(part.as_ref());
    }
    out
}

/// Escape regex metacharacters (`\ ^ $ * + ? . ( ) | [ ] { } /`)
pub fn regex_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '\\' | '^' | '$' | '*' | '+' | '?' | '.' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '/'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape a value placed inside a quoted PromQL label matcher
///
/// Backslashes are doubled and single quotes become `\\'`.
pub fn prometheus_regular_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\\\'")
}

/// Escape a value placed inside a double-quoted PromQL string
///
/// Only `\` and `"` are touched; the unquoted string equals `value`.
pub fn prometheus_string_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape a value placed inside a PromQL regex matcher
///
/// Each regex metacharacter gets a double backslash so that it survives both
/// string unquoting and regex compilation.
pub fn prometheus_special_regex_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 2);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\\\\\"),
            '$' | '^' | '*' | '{' | '}' | '[' | ']' | '\'' | '+' | '?' | '.' | '(' | ')' | '|' => {
                out.push_str("\\\\");
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Escape a value placed inside a single-quoted SQL string literal
pub fn sql_string_escape(value: &str) -> String {
    value.replace('\'', "''")
}
