//! Dashboard templating: variables, scopes and token interpolation
//!
//! # Flow
//!
//! ```text
//! VariableStore ──snapshot──┐
//! panel overrides ──────────┼──► ScopeComposer ──► ScopedVars ──► Interpolator ──► query text
//! query overrides ──────────┘                          ▲
//!                                     __interval, __range, ... (query::interval)
//! ```

pub mod adhoc;
pub mod compose;
pub mod format;
pub mod interpolate;
pub mod scope;
pub mod variables;

pub use adhoc::{render_adhoc_matchers, AdHocFilter, FilterOperator};
pub use compose::{ComposedScope, ScopeComposer};
pub use format::MultiValueFormat;
pub use interpolate::{contains_template, variable_names, Interpolator};
pub use scope::{ScopedValue, ScopedVar, ScopedVars};
pub use variables::{Current, SharedVariableStore, Variable, VariableKind, VariableStore, ALL_VALUE};
