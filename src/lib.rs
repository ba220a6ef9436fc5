//! Kuba Templating - query parameterization for dashboard panels
//!
//! This library turns templated panel queries into concrete datasource
//! requests:
//! - `$name` / `[[name]]` token substitution over an immutable scope
//! - Layered scopes: dashboard variables, panel repeats, per-query bindings
//! - Interval quantization (`$__interval`, `$__interval_ms`, `$__rate_interval`)
//! - Ref id allocation for query lists
//! - Conditional rendering against the current time range

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

/// Prometheus metrics and telemetry
pub mod metrics;

/// Configuration management with TOML support
pub mod config;

/// Variables, scopes, multi-value formats and token interpolation
pub mod template;

/// Ref ids, interval computation and the request resolution pipeline
pub mod query;

/// Visibility conditions for panels and rows
pub mod conditional;

// Re-export main types
pub use config::Config;
pub use error::{Error, Result};
pub use query::{QueryRequest, QueryResolver};
pub use template::{Interpolator, ScopeComposer, ScopedVars, Variable, VariableStore};
pub use types::{Query, TimeRange, VariableValue};
