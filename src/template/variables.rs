//! Dashboard variables and the store that holds their current selection
//!
//! The store is owned by the surrounding application, which mutates it when a
//! user changes a selection or a URL parameter drives one. Readers never keep
//! references into it: they take a [`ScopedVars`] snapshot first.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::format::MultiValueFormat;
use super::scope::{ScopedVar, ScopedVars};
use crate::types::VariableValue;

/// Value every "All" selection carries
pub const ALL_VALUE: &str = "$__all";

/// Kind of variable, as declared in dashboard settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Values come from a datasource query
    #[default]
    Query,
    /// Fixed list of values typed by the user
    Custom,
    /// Hidden single value
    Constant,
    /// Free text input
    TextBox,
    /// List of interval strings ("1m", "5m", ...)
    Interval,
    /// Datasource picker
    Datasource,
}

/// Current selection of a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Current {
    /// Exactly one selected value
    Single(VariableValue),
    /// A list selection (multi-value variables)
    Multi(Vec<VariableValue>),
}

impl Current {
    /// True when nothing usable is selected
    pub fn is_empty(&self) -> bool {
        match self {
            Current::Single(v) => v.is_empty(),
            Current::Multi(values) => values.iter().all(VariableValue::is_empty),
        }
    }

    fn is_all(&self) -> bool {
        match self {
            Current::Single(v) => v.value == ALL_VALUE,
            Current::Multi(values) => values.len() == 1 && values[0].value == ALL_VALUE,
        }
    }
}

impl Default for Current {
    fn default() -> Self {
        Current::Single(VariableValue::plain(""))
    }
}

/// A named dashboard variable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variable {
    /// Unique name within a store, referenced as `$name`
    pub name: String,

    /// Variable kind
    #[serde(default, rename = "type")]
    pub kind: VariableKind,

    /// Current selection
    #[serde(default)]
    pub current: Current,

    /// Whether several values may be selected at once
    #[serde(default, rename = "multi")]
    pub multi_value: bool,

    /// Whether an "All" option is offered
    #[serde(default)]
    pub include_all: bool,

    /// Value substituted for "All" instead of every option
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_value: Option<String>,

    /// Selectable options, used to expand "All"
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<VariableValue>,
}

impl Variable {
    /// Create a single-value variable
    pub fn single(name: impl Into<String>, value: impl Into<VariableValue>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::default(),
            current: Current::Single(value.into()),
            multi_value: false,
            include_all: false,
            all_value: None,
            options: Vec::new(),
        }
    }

    /// Create a multi-value variable with the given selection
    pub fn multi<I, V>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<VariableValue>,
    {
        Self {
            current: Current::Multi(values.into_iter().map(Into::into).collect()),
            multi_value: true,
            ..Self::single(name, "")
        }
    }

    /// Builder style setter for the kind
    pub fn with_kind(mut self, kind: VariableKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder style setter enabling "All" over the given options
    pub fn with_all<I, V>(mut self, options: I, all_value: Option<String>) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<VariableValue>,
    {
        self.include_all = true;
        self.options = options.into_iter().map(Into::into).collect();
        self.all_value = all_value;
        self
    }

    /// Selected values, with "All" expanded to every non-"All" option
    pub fn selected_values(&self) -> Vec<&VariableValue> {
        if self.include_all && self.current.is_all() {
            return self
                .options
                .iter()
                .filter(|o| o.value != ALL_VALUE)
                .collect();
        }
        match &self.current {
            Current::Single(v) => vec![v],
            Current::Multi(values) => values.iter().collect(),
        }
    }

    /// Flatten the current selection into one scope entry
    ///
    /// List selections are joined with `format`; display texts are joined
    /// with `" + "`. Joined lists and a custom "All" value are marked
    /// preformatted and skip the destination escape. Returns `None` when the
    /// selection is empty, so the variable contributes nothing to the scope.
    pub fn to_scoped(&self, format: &MultiValueFormat) -> Option<ScopedVar> {
        if self.current.is_empty() {
            return None;
        }

        if self.include_all && self.current.is_all() {
            if let Some(all_value) = &self.all_value {
                return Some(ScopedVar::new("All", all_value.clone()).preformatted());
            }
        }

        match (&self.current, self.include_all && self.current.is_all()) {
            (Current::Single(v), false) => Some(ScopedVar::new(v.text.clone(), v.value.clone())),
            _ => {
                let selected = self.selected_values();
                if selected.is_empty() {
                    return None;
                }
                let values: Vec<&str> = selected.iter().map(|v| v.value.as_str()).collect();
                let texts: Vec<&str> = selected.iter().map(|v| v.text.as_str()).collect();
                Some(ScopedVar::new(texts.join(" + "), format.join(&values)).preformatted())
            }
        }
    }
}

/// The current set of variable definitions, keyed by name
///
/// Keeps dashboard order. Names are unique: adding a variable whose name is
/// already present replaces the old definition in place.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl VariableStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from a dashboard's variable list
    pub fn from_variables(variables: impl IntoIterator<Item = Variable>) -> Self {
        let mut store = Self::new();
        for variable in variables {
            store.add(variable);
        }
        store
    }

    /// Add a variable, replacing any existing one with the same name
    pub fn add(&mut self, variable: Variable) -> Option<Variable> {
        match self.index.get(&variable.name) {
            Some(&pos) => Some(std::mem::replace(&mut self.variables[pos], variable)),
            None => {
                self.index.insert(variable.name.clone(), self.variables.len());
                self.variables.push(variable);
                None
            }
        }
    }

    /// Remove a variable by name
    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        let pos = self.index.remove(name)?;
        let removed = self.variables.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Change the selection of a variable
    ///
    /// Returns false when no variable has that name.
    pub fn set_current(&mut self, name: &str, current: Current) -> bool {
        match self.index.get(name) {
            Some(&pos) => {
                debug!(variable = %name, "Variable selection changed");
                self.variables[pos].current = current;
                true
            }
            None => false,
        }
    }

    /// Look up a variable by name
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.index.get(name).map(|&pos| &self.variables[pos])
    }

    /// Variables in dashboard order
    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    /// True when the store holds no variables
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Drop every variable (dashboard unload)
    pub fn clear(&mut self) {
        self.variables.clear();
        self.index.clear();
    }

    /// Snapshot the current selections into an owned scope
    pub fn snapshot(&self, format: &MultiValueFormat) -> ScopedVars {
        self.variables
            .iter()
            .filter_map(|v| v.to_scoped(format).map(|scoped| (v.name.clone(), scoped)))
            .collect()
    }
}

/// A variable store shared between the UI side that mutates it and the
/// request side that snapshots it
#[derive(Debug, Clone, Default)]
pub struct SharedVariableStore {
    inner: Arc<RwLock<VariableStore>>,
}

impl SharedVariableStore {
    /// Wrap a store for sharing
    pub fn new(store: VariableStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    /// Mutate the store under the write lock
    pub fn update<R>(&self, f: impl FnOnce(&mut VariableStore) -> R) -> R {
        f(&mut self.inner.write())
    }

    /// Read the store under the read lock
    pub fn read<R>(&self, f: impl FnOnce(&VariableStore) -> R) -> R {
        f(&self.inner.read())
    }

    /// Take an owned snapshot of every current selection
    pub fn snapshot(&self, format: &MultiValueFormat) -> ScopedVars {
        self.inner.read().snapshot(format)
    }

    /// Clone the variable list for composition
    pub fn variables(&self) -> Vec<Variable> {
        self.inner.read().variables().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value_to_scoped() {
        let var = Variable::single("env", VariableValue::new("Production", "prod"));
        let scoped = var.to_scoped(&MultiValueFormat::Csv).unwrap();
        assert_eq!(scoped.text, "Production");
        assert_eq!(scoped.value.to_string(), "prod");
        assert!(!scoped.formatted);
    }

    #[test]
    fn test_empty_selection_contributes_nothing() {
        assert!(Variable::single("env", "").to_scoped(&MultiValueFormat::Csv).is_none());
        let empty_multi: Vec<&str> = vec![];
        assert!(Variable::multi("host", empty_multi)
            .to_scoped(&MultiValueFormat::Csv)
            .is_none());
    }

    #[test]
    fn test_multi_value_joined_by_format() {
        let var = Variable::multi("host", ["web-1", "web-2"]);
        let csv = var.to_scoped(&MultiValueFormat::Csv).unwrap();
        assert_eq!(csv.value.to_string(), "web-1,web-2");
        assert_eq!(csv.text, "web-1 + web-2");
        assert!(csv.formatted);

        let pipe = var.to_scoped(&MultiValueFormat::Pipe).unwrap();
        assert_eq!(pipe.value.to_string(), "web-1|web-2");
    }

    #[test]
    fn test_all_expands_to_options() {
        let var = Variable::single("host", VariableValue::new("All", ALL_VALUE))
            .with_all(["$__all", "a", "b", "c"], None);
        let scoped = var.to_scoped(&MultiValueFormat::Regex).unwrap();
        assert_eq!(scoped.value.to_string(), "(a|b|c)");
    }

    #[test]
    fn test_all_uses_custom_all_value() {
        let var = Variable::single("host", VariableValue::new("All", ALL_VALUE))
            .with_all(["a", "b"], Some(".*".to_string()));
        let scoped = var.to_scoped(&MultiValueFormat::Csv).unwrap();
        assert_eq!(scoped.value.to_string(), ".*");
        assert_eq!(scoped.text, "All");
        assert!(scoped.formatted);
    }

    #[test]
    fn test_store_add_replaces_same_name() {
        let mut store = VariableStore::new();
        assert!(store.add(Variable::single("env", "prod")).is_none());
        let old = store.add(Variable::single("env", "staging")).unwrap();
        assert_eq!(old.current, Current::Single(VariableValue::plain("prod")));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_remove_keeps_index_consistent() {
        let mut store = VariableStore::from_variables([
            Variable::single("a", "1"),
            Variable::single("b", "2"),
            Variable::single("c", "3"),
        ]);
        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert_eq!(store.get("c").map(|v| v.name.as_str()), Some("c"));
        assert!(store.set_current("b", Current::Single(VariableValue::plain("20"))));
        assert_eq!(
            store.snapshot(&MultiValueFormat::Csv).resolve("b").as_deref(),
            Some("20")
        );
    }

    #[test]
    fn test_snapshot_is_detached_from_store() {
        let shared = SharedVariableStore::new(VariableStore::from_variables([Variable::single(
            "env", "prod",
        )]));
        let snapshot = shared.snapshot(&MultiValueFormat::Csv);

        shared.update(|store| {
            store.set_current("env", Current::Single(VariableValue::plain("staging")))
        });

        assert_eq!(snapshot.resolve("env").as_deref(), Some("prod"));
        assert_eq!(
            shared
                .snapshot(&MultiValueFormat::Csv)
                .resolve("env")
                .as_deref(),
            Some("staging")
        );
    }

    #[test]
    fn test_variable_deserializes_dashboard_json() {
        let json = r#"{
            "name": "job",
            "type": "custom",
            "multi": true,
            "current": [{"text": "api", "value": "api"}, {"text": "db", "value": "db"}]
        }"#;
        let var: Variable = serde_json::from_str(json).unwrap();
        assert_eq!(var.kind, VariableKind::Custom);
        assert!(var.multi_value);
        assert_eq!(
            var.to_scoped(&MultiValueFormat::Csv).unwrap().value.to_string(),
            "api,db"
        );
    }
}
