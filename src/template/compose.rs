//! Scope composition for one query execution
//!
//! Layers, later wins on a name collision:
//!
//! 1. global dashboard variables
//! 2. panel overrides (the bound value of a repeated panel)
//! 3. bindings re-bound for this one query
//!
//! Ad-hoc filters never enter the substitution scope. They travel next to it
//! in [`ComposedScope`] for the datasource to apply.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::adhoc::AdHocFilter;
use super::format::MultiValueFormat;
use super::scope::ScopedVars;
use super::variables::Variable;

/// Scope plus pass-through filters for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComposedScope {
    /// Flat substitution scope
    pub scoped_vars: ScopedVars,
    /// Filters for the datasource, untouched
    pub adhoc_filters: Vec<AdHocFilter>,
}

/// Merges variable layers into one owned [`ScopedVars`]
#[derive(Debug, Clone, Default)]
pub struct ScopeComposer {
    format: MultiValueFormat,
}

impl ScopeComposer {
    /// Create a composer joining list selections with `format`
    pub fn new(format: MultiValueFormat) -> Self {
        Self { format }
    }

    /// Format used for list selections
    pub fn format(&self) -> &MultiValueFormat {
        &self.format
    }

    /// Merge the three layers into one flat scope
    ///
    /// ```rust
    /// use kuba_templating::template::{ScopeComposer, ScopedVar, ScopedVars, Variable};
    ///
    /// let globals = vec![Variable::single("env", "prod")];
    /// let panel = ScopedVars::new().with("env", ScopedVar::text("staging"));
    ///
    /// let scope = ScopeComposer::default().compose(&globals, &panel, &ScopedVars::new());
    /// assert_eq!(scope.resolve("env").as_deref(), Some("staging"));
    /// ```
    pub fn compose(
        &self,
        globals: &[Variable],
        panel_overrides: &ScopedVars,
        query_overrides: &ScopedVars,
    ) -> ScopedVars {
        let mut scope: ScopedVars = globals
            .iter()
            .filter_map(|v| v.to_scoped(&self.format).map(|scoped| (v.name.clone(), scoped)))
            .collect();

        for name in panel_overrides.names().chain(query_overrides.names()) {
            if scope.contains(name) {
                debug!(variable = %name, "Variable overridden for query");
            }
        }

        scope.extend(panel_overrides);
        scope.extend(query_overrides);
        scope
    }

    /// Merge the layers and carry the ad-hoc filters alongside
    pub fn compose_with_filters(
        &self,
        globals: &[Variable],
        panel_overrides: &ScopedVars,
        query_overrides: &ScopedVars,
        adhoc_filters: &[AdHocFilter],
    ) -> ComposedScope {
        ComposedScope {
            scoped_vars: self.compose(globals, panel_overrides, query_overrides),
            adhoc_filters: adhoc_filters.to_vec(),
        }
    }
}
