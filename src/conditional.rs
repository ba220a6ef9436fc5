//! Conditional rendering
//!
//! [`evaluate`] answers the basic question: does the current time range lie
//! inside a configured window? A [`ConditionGroup`] combines that check with
//! variable, data and range size conditions to decide whether a panel or row
//! is shown.
//!
//! Nothing here is cached; every call reads the context it is given.
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use kuba_templating::conditional::evaluate;
//! use kuba_templating::types::TimeRange;
//!
//! let day = |d| NaiveDate::from_ymd_opt(2022, 6, d).unwrap();
//! let window = TimeRange::from_dates(day(8), day(10)).unwrap();
//!
//! assert!(evaluate(&window, &window));
//! assert!(!evaluate(&window, &TimeRange::from_dates(day(7), day(10)).unwrap()));
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::query::interval::interval_to_ms;
use crate::template::scope::ScopedVars;
use crate::types::TimeRange;

/// True iff `current` lies completely inside `window` (bounds inclusive)
pub fn evaluate(window: &TimeRange, current: &TimeRange) -> bool {
    window.contains_range(current)
}

/// Show or hide when the conditions hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Render only when the conditions hold
    #[default]
    Show,
    /// Render only when the conditions do not hold
    Hide,
}

/// How item results are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Combine {
    /// Every item must hold
    #[default]
    And,
    /// At least one item must hold
    Or,
}

/// Comparison against a variable's current value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VariableOperator {
    /// Exact equality
    #[default]
    Equals,
    /// Not equal
    NotEquals,
    /// Regex finds a match in the value
    Matches,
    /// Regex finds no match in the value
    NotMatches,
}

/// Condition on a variable value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableCondition {
    /// Variable name, without `$`
    pub variable: String,
    /// Comparison
    pub operator: VariableOperator,
    /// Right hand side; a pattern for the regex operators
    pub value: String,
}

/// One condition of a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "spec")]
pub enum ConditionItem {
    /// Variable comparison
    #[serde(rename = "ConditionalRenderingVariable")]
    Variable(VariableCondition),

    /// Holds when "has data" equals the flag
    #[serde(rename = "ConditionalRenderingData")]
    Data {
        /// Expected data presence
        value: bool,
    },

    /// Holds when the current range is no longer than the interval string
    #[serde(rename = "ConditionalRenderingTimeRangeSize")]
    TimeRangeSize {
        /// Maximum duration, e.g. `"7d"`
        value: String,
    },

    /// Holds when the current range lies inside the window
    #[serde(rename = "ConditionalRenderingTimeWindow")]
    TimeWindow {
        /// Allowed window
        value: TimeRange,
    },
}

/// Inputs a condition is checked against
#[derive(Debug, Clone, Copy)]
pub struct ConditionContext<'a> {
    /// Resolved variables
    pub scope: &'a ScopedVars,
    /// Whether the element's queries returned data
    pub has_data: bool,
    /// Dashboard time range
    pub range: TimeRange,
}

impl ConditionItem {
    /// Variable condition helper
    pub fn variable(
        variable: impl Into<String>,
        operator: VariableOperator,
        value: impl Into<String>,
    ) -> Self {
        ConditionItem::Variable(VariableCondition {
            variable: variable.into(),
            operator,
            value: value.into(),
        })
    }

    /// Check the item
    ///
    /// `None` means the item cannot be evaluated (bad pattern, bad duration)
    /// and is left out of the group result.
    pub fn check(&self, ctx: &ConditionContext<'_>) -> Option<bool> {
        match self {
            ConditionItem::Variable(cond) => check_variable(cond, ctx.scope),
            ConditionItem::Data { value } => Some(ctx.has_data == *value),
            ConditionItem::TimeRangeSize { value } => match interval_to_ms(value) {
                Ok(max_ms) => Some(ctx.range.duration_ms().unwrap_or(i64::MAX) <= max_ms),
                Err(e) => {
                    warn!(value = %value, error = %e, "Skipping time range size condition");
                    None
                }
            },
            ConditionItem::TimeWindow { value } => Some(evaluate(value, &ctx.range)),
        }
    }
}

fn check_variable(cond: &VariableCondition, scope: &ScopedVars) -> Option<bool> {
    let current = scope.resolve(&cond.variable).unwrap_or_default();
    match cond.operator {
        VariableOperator::Equals => Some(current == cond.value),
        VariableOperator::NotEquals => Some(current != cond.value),
        VariableOperator::Matches | VariableOperator::NotMatches => {
            let re = match Regex::new(&cond.value) {
                Ok(re) => re,
                Err(e) => {
                    warn!(pattern = %cond.value, error = %e, "Skipping variable condition");
                    return None;
                }
            };
            let matched = re.is_match(&current);
            Some(matched == (cond.operator == VariableOperator::Matches))
        }
    }
}

/// A set of conditions deciding whether an element is rendered
///
/// ```rust
/// use kuba_templating::conditional::{ConditionContext, ConditionGroup, ConditionItem, VariableOperator};
/// use kuba_templating::template::{ScopedVar, ScopedVars};
/// use kuba_templating::types::TimeRange;
///
/// let group = ConditionGroup::default()
///     .with_item(ConditionItem::variable("env", VariableOperator::Equals, "prod"));
/// let scope = ScopedVars::new().with("env", ScopedVar::text("prod"));
/// let ctx = ConditionContext { scope: &scope, has_data: true, range: TimeRange::new(0, 1).unwrap() };
///
/// assert!(group.is_visible(&ctx));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    /// Show or hide when the conditions hold
    #[serde(default)]
    pub visibility: Visibility,
    /// Combination of item results
    #[serde(default, rename = "condition")]
    pub combine: Combine,
    /// Conditions
    #[serde(default)]
    pub items: Vec<ConditionItem>,
}

impl ConditionGroup {
    /// Builder style item append
    pub fn with_item(mut self, item: ConditionItem) -> Self {
        self.items.push(item);
        self
    }

    /// Check that every pattern and duration in the group is well formed
    ///
    /// [`is_visible`](Self::is_visible) skips bad items; this surfaces them,
    /// e.g. when a condition is saved.
    pub fn validate(&self) -> Result<()> {
        for item in &self.items {
            match item {
                ConditionItem::Variable(cond)
                    if matches!(
                        cond.operator,
                        VariableOperator::Matches | VariableOperator::NotMatches
                    ) =>
                {
                    Regex::new(&cond.value)?;
                }
                ConditionItem::TimeRangeSize { value } => {
                    interval_to_ms(value)?;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Whether the element is rendered
    ///
    /// A group with no evaluable items is always visible.
    pub fn is_visible(&self, ctx: &ConditionContext<'_>) -> bool {
        let results: Vec<bool> = self.items.iter().filter_map(|item| item.check(ctx)).collect();
        if results.is_empty() {
            return true;
        }

        let holds = match self.combine {
            Combine::And => results.iter().all(|r| *r),
            Combine::Or => results.iter().any(|r| *r),
        };
        let visible = match self.visibility {
            Visibility::Show => holds,
            Visibility::Hide => !holds,
        };
        debug!(items = results.len(), holds, visible, "Evaluated condition group");
        visible
    }
}
