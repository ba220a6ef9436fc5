//! Query requests and the resolution pipeline
//!
//! A [`QueryRequest`] leaves here with a flat scope, a computed interval and
//! every templated target field rewritten:
//!
//! ```text
//! globals + panel + query bindings ──► ScopeComposer ──► scope
//!                                                          │
//!      range, resolution, floor ──► IntervalCalculator ──► + __interval*, __range*, __rate_interval
//!                                                          │
//!        targets ──► per-target step (opt-in) ──► Interpolator(escape)
//! ```
//!
//! Datasource differences (floor, escaping, list format, step adjustment,
//! which fields hold template text) are behind the [`DatasourceRules`] trait.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::interval::{
    adjust_interval, interval_scoped_vars, interval_to_seconds, populate_interval, range_scoped_vars,
    rate_interval_scoped_vars, Interval, DEFAULT_SCRAPE_INTERVAL_S,
};
use crate::config::{Config, IntervalConfig};
use crate::template::adhoc::AdHocFilter;
use crate::template::compose::ScopeComposer;
use crate::template::format::{prometheus_regular_escape, sql_string_escape, MultiValueFormat};
use crate::template::interpolate::Interpolator;
use crate::template::scope::{ScopedVar, ScopedVars};
use crate::template::variables::Variable;
use crate::types::{Query, TimeRange};

// ============================================================================
// Datasource rules
// ============================================================================

/// What a datasource contributes to resolution
pub trait DatasourceRules {
    /// Smallest interval the datasource can serve, e.g. `"15s"`
    fn min_interval(&self) -> Option<&str> {
        None
    }

    /// Scrape interval used for `$__rate_interval`
    fn scrape_interval(&self) -> Option<&str> {
        None
    }

    /// Escape one substituted value for the query language
    ///
    /// Not applied to list selections joined with a destination format.
    fn escape(&self, value: &str) -> String {
        value.to_string()
    }

    /// List format used instead of the configured one
    fn multi_value_format(&self) -> Option<MultiValueFormat> {
        None
    }

    /// Whether each target gets its own step from its `interval` and
    /// `intervalFactor` fields
    fn adjusts_step(&self) -> bool {
        false
    }

    /// Whether the string field `field` of a query holds template text
    fn is_template_field(&self, field: &str) -> bool {
        let _ = field;
        true
    }
}

/// No floor, no escaping, every string field templated
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainDatasource;

impl DatasourceRules for PlainDatasource {}

/// PromQL datasource
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrometheusRules {
    /// Datasource level minimum step
    pub min_interval: Option<String>,
    /// Scrape interval of the server
    pub scrape_interval: Option<String>,
}

impl DatasourceRules for PrometheusRules {
    fn min_interval(&self) -> Option<&str> {
        self.min_interval.as_deref()
    }

    fn scrape_interval(&self) -> Option<&str> {
        self.scrape_interval.as_deref()
    }

    fn escape(&self, value: &str) -> String {
        prometheus_regular_escape(value)
    }

    fn multi_value_format(&self) -> Option<MultiValueFormat> {
        Some(MultiValueFormat::Prometheus)
    }

    fn adjusts_step(&self) -> bool {
        true
    }

    fn is_template_field(&self, field: &str) -> bool {
        matches!(field, "expr" | "interval")
    }
}

/// SQL datasource; values land inside single quoted literals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlRules {
    /// Datasource level minimum step
    pub min_interval: Option<String>,
}

impl DatasourceRules for SqlRules {
    fn min_interval(&self) -> Option<&str> {
        self.min_interval.as_deref()
    }

    fn escape(&self, value: &str) -> String {
        sql_string_escape(value)
    }

    fn multi_value_format(&self) -> Option<MultiValueFormat> {
        Some(MultiValueFormat::Sql)
    }

    fn is_template_field(&self, field: &str) -> bool {
        field == "rawSql"
    }
}

// ============================================================================
// Request types
// ============================================================================

/// Panel level inputs to resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelContext {
    /// Repeat bindings of this panel instance
    #[serde(default)]
    pub scoped_vars: ScopedVars,

    /// Pixel width, used as interval resolution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_data_points: Option<u32>,

    /// Panel minimum interval; may itself reference a variable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
}

/// A batch of queries for one datasource call
///
/// Before resolution `scoped_vars` holds only per-query bindings. After
/// resolution it holds the full scope the targets were interpolated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Queries to run
    pub targets: Vec<Query>,

    /// Requested time range
    pub range: TimeRange,

    /// Substitution scope
    #[serde(default)]
    pub scoped_vars: ScopedVars,

    /// Computed interval text
    #[serde(default)]
    pub interval: String,

    /// Computed interval in milliseconds
    #[serde(default)]
    pub interval_ms: i64,

    /// Resolution override for this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_data_points: Option<u32>,

    /// Filters passed through to the datasource
    #[serde(default)]
    pub adhoc_filters: Vec<AdHocFilter>,
}

impl QueryRequest {
    /// Unresolved request for `targets` over `range`
    pub fn new(targets: Vec<Query>, range: TimeRange) -> Self {
        Self {
            targets,
            range,
            scoped_vars: ScopedVars::new(),
            interval: String::new(),
            interval_ms: 0,
            max_data_points: None,
            adhoc_filters: Vec::new(),
        }
    }

    /// Bind `name` for this request only
    pub fn with_scoped_var(mut self, name: impl Into<String>, var: ScopedVar) -> Self {
        self.scoped_vars.insert(name, var);
        self
    }

    /// Override the resolution
    pub fn with_max_data_points(mut self, max_data_points: u32) -> Self {
        self.max_data_points = Some(max_data_points);
        self
    }

    /// Attach ad-hoc filters
    pub fn with_adhoc_filters(mut self, filters: Vec<AdHocFilter>) -> Self {
        self.adhoc_filters = filters;
        self
    }

    /// Run the resolution pipeline; see [`QueryResolver::resolve`]
    pub fn resolve<D>(
        self,
        resolver: &QueryResolver,
        globals: &[Variable],
        panel: &PanelContext,
        datasource: &D,
    ) -> QueryRequest
    where
        D: DatasourceRules + ?Sized,
    {
        resolver.resolve(self, globals, panel, datasource)
    }
}

// ============================================================================
// Resolver
// ============================================================================

/// Resolution pipeline built from [`Config`]
#[derive(Debug, Clone)]
pub struct QueryResolver {
    composer: ScopeComposer,
    interpolator: Interpolator,
    interval: IntervalConfig,
}

impl Default for QueryResolver {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl QueryResolver {
    /// Create a resolver from configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            composer: ScopeComposer::new(config.multi_value.format.clone()),
            interpolator: Interpolator::new(&config.interpolation),
            interval: config.interval.clone(),
        }
    }

    /// Scope composer in use
    pub fn composer(&self) -> &ScopeComposer {
        &self.composer
    }

    /// Interpolator in use
    pub fn interpolator(&self) -> &Interpolator {
        &self.interpolator
    }

    /// Resolve `request` against the dashboard state
    ///
    /// 1. Compose globals, panel bindings and the request's own bindings,
    ///    joining lists with the datasource format when it has one.
    /// 2. Compute the interval: resolution from the request, then the panel,
    ///    then the configured default; floor from the panel, then the
    ///    datasource, then the configured default.
    /// 3. Add `__range*` and `__rate_interval` to the scope.
    /// 4. Drop hidden targets. When the datasource adjusts steps, each
    ///    target gets a `step` field and its own `__interval*` and
    ///    `__rate_interval` (see [`step_seconds`](Self::step_seconds)).
    /// 5. Interpolate templated fields through the datasource escape.
    ///
    /// The returned request scope holds the request level interval. Ad-hoc
    /// filters are carried through untouched.
    pub fn resolve<D>(
        &self,
        request: QueryRequest,
        globals: &[Variable],
        panel: &PanelContext,
        datasource: &D,
    ) -> QueryRequest
    where
        D: DatasourceRules + ?Sized,
    {
        let range = request.range;
        let composer = match datasource.multi_value_format() {
            Some(format) => ScopeComposer::new(format),
            None => self.composer.clone(),
        };
        let scope = composer.compose(globals, &panel.scoped_vars, &request.scoped_vars);

        let resolution = request
            .max_data_points
            .or(panel.max_data_points)
            .unwrap_or(self.interval.default_max_data_points);
        let floor = self.floor(panel, datasource, &scope);

        let request = QueryRequest {
            scoped_vars: scope,
            ..request
        };
        let mut request = populate_interval(request, range, i64::from(resolution), &floor);
        request.max_data_points = Some(resolution);

        let scrape_s = self.scrape_seconds(datasource);
        request.scoped_vars.extend(&range_scoped_vars(&range));
        request.scoped_vars.extend(&rate_interval_scoped_vars(
            request.interval_ms as f64 / 1000.0,
            scrape_s,
        ));

        let targets = std::mem::take(&mut request.targets);
        request.targets = if datasource.adjusts_step() {
            self.step_targets(targets, &request, scrape_s, datasource)
        } else {
            self.interpolate_targets(targets, &request.scoped_vars, datasource)
        };

        debug!(
            targets = request.targets.len(),
            interval = %request.interval,
            filters = request.adhoc_filters.len(),
            "Resolved query request"
        );
        request
    }

    /// Step in seconds for `query` within a resolved request
    ///
    /// The largest of the request interval times the query's
    /// `intervalFactor` (default 1), the query's own `interval` and the
    /// smallest step that keeps the range under `max_points_per_query`.
    /// The query `interval` may reference variables of the request scope.
    pub fn step_seconds(&self, request: &QueryRequest, query: &Query) -> f64 {
        let request_s = request.interval_ms as f64 / 1000.0;
        let range_s = request.range.duration_ms().unwrap_or(i64::MAX).max(0) as f64 / 1000.0;
        let factor = query
            .fields
            .get("intervalFactor")
            .and_then(serde_json::Value::as_f64)
            .filter(|f| *f > 0.0)
            .unwrap_or(1.0);
        let min_s = self
            .query_interval_seconds(query, &request.scoped_vars)
            .unwrap_or(request_s);
        adjust_interval(request_s, min_s, range_s, factor, self.interval.max_points_per_query)
    }

    /// Give every visible target its own step and interpolate it with it
    ///
    /// The query `interval`, when set, also stands in for the scrape interval
    /// of its `__rate_interval`.
    fn step_targets<D>(
        &self,
        targets: Vec<Query>,
        request: &QueryRequest,
        scrape_s: f64,
        datasource: &D,
    ) -> Vec<Query>
    where
        D: DatasourceRules + ?Sized,
    {
        targets
            .into_iter()
            .filter(|query| !query.hide)
            .map(|mut query| {
                let step = self.step_seconds(request, &query);
                let scrape = self
                    .query_interval_seconds(&query, &request.scoped_vars)
                    .unwrap_or(scrape_s);

                let mut scope = request.scoped_vars.clone();
                scope.extend(&interval_scoped_vars(&Interval::from_ms((step * 1000.0).round() as i64)));
                scope.extend(&rate_interval_scoped_vars(step, scrape));
                debug!(ref_id = %query.ref_id, step, scrape, "Adjusted query step");

                query.fields.insert("step".to_string(), serde_json::json!(step));
                self.interpolate_query(query, &scope, datasource)
            })
            .collect()
    }

    /// Interpolate the templated fields of every visible target
    ///
    /// Hidden targets are dropped. Non-string fields are left alone.
    pub fn interpolate_targets<D>(
        &self,
        targets: Vec<Query>,
        scope: &ScopedVars,
        datasource: &D,
    ) -> Vec<Query>
    where
        D: DatasourceRules + ?Sized,
    {
        targets
            .into_iter()
            .filter(|query| !query.hide)
            .map(|query| self.interpolate_query(query, scope, datasource))
            .collect()
    }

    fn interpolate_query<D>(&self, mut query: Query, scope: &ScopedVars, datasource: &D) -> Query
    where
        D: DatasourceRules + ?Sized,
    {
        for (field, value) in query.fields.iter_mut() {
            if !datasource.is_template_field(field) {
                continue;
            }
            if let serde_json::Value::String(text) = value {
                *text = self
                    .interpolator
                    .interpolate_escaped(text, scope, |v| datasource.escape(v));
            }
        }
        query
    }

    /// The query's own `interval` field in seconds, if set and valid
    fn query_interval_seconds(&self, query: &Query, scope: &ScopedVars) -> Option<f64> {
        let raw = query.field_str("interval").filter(|s| !s.trim().is_empty())?;
        let interval = self.interpolator.interpolate(raw, scope);
        match interval_to_seconds(&interval) {
            Ok(seconds) if seconds > 0.0 => Some(seconds),
            Ok(_) => None,
            Err(e) => {
                warn!(ref_id = %query.ref_id, interval = %interval, error = %e, "Ignoring invalid query interval");
                None
            }
        }
    }

    fn floor<D>(&self, panel: &PanelContext, datasource: &D, scope: &ScopedVars) -> String
    where
        D: DatasourceRules + ?Sized,
    {
        match panel.interval.as_deref().filter(|s| !s.trim().is_empty()) {
            Some(panel_interval) => self.interpolator.interpolate(panel_interval, scope),
            None => datasource
                .min_interval()
                .unwrap_or(self.interval.default_min_interval.as_str())
                .to_string(),
        }
    }

    fn scrape_seconds<D>(&self, datasource: &D) -> f64
    where
        D: DatasourceRules + ?Sized,
    {
        let scrape = datasource
            .scrape_interval()
            .unwrap_or(self.interval.default_scrape_interval.as_str());
        match interval_to_seconds(scrape) {
            Ok(seconds) => seconds,
            Err(e) => {
                warn!(scrape_interval = %scrape, error = %e, "Ignoring invalid scrape interval");
                DEFAULT_SCRAPE_INTERVAL_S
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::adhoc::FilterOperator;
    use crate::template::format::MultiValueFormat;

    fn two_hours() -> TimeRange {
        TimeRange::new(1_654_646_400_000, 1_654_646_400_000 + 7_200_000).unwrap()
    }

    fn prometheus() -> PrometheusRules {
        PrometheusRules {
            min_interval: Some("15s".to_string()),
            scrape_interval: Some("15s".to_string()),
        }
    }

    #[test]
    fn test_resolve_end_to_end() {
        let mut config = Config::default();
        config.multi_value.format = MultiValueFormat::Regex;
        let resolver = QueryResolver::from_config(&config);

        let globals = vec![
            Variable::single("env", "prod"),
            Variable::multi("job", ["api", "web"]),
        ];
        let panel = PanelContext {
            scoped_vars: ScopedVars::new().with("env", ScopedVar::text("staging")),
            max_data_points: Some(200),
            interval: None,
        };
        let target = Query::new("A").with_field(
            "expr",
            "rate(http_requests{env=\"$env\",job=~\"$job\"}[$__rate_interval]) / $__interval_ms",
        );

        let resolved = QueryRequest::new(vec![target], two_hours()).resolve(
            &resolver,
            &globals,
            &panel,
            &prometheus(),
        );

        assert_eq!(resolved.interval, "30s");
        assert_eq!(resolved.interval_ms, 30_000);
        assert_eq!(resolved.max_data_points, Some(200));
        assert_eq!(
            resolved.targets[0].field_str("expr"),
            Some("rate(http_requests{env=\"staging\",job=~\"(api|web)\"}[1m]) / 30000")
        );
        assert_eq!(resolved.scoped_vars.resolve("__range").as_deref(), Some("7200s"));
    }

    #[test]
    fn test_hidden_targets_dropped() {
        let mut hidden = Query::new("B").with_field("expr", "up");
        hidden.hide = true;
        let targets = vec![Query::new("A").with_field("expr", "up"), hidden];

        let resolved = QueryResolver::default().resolve(
            QueryRequest::new(targets, two_hours()),
            &[],
            &PanelContext::default(),
            &PlainDatasource,
        );
        let ids: Vec<&str> = resolved.targets.iter().map(|q| q.ref_id.as_str()).collect();
        assert_eq!(ids, vec!["A"]);
    }

    #[test]
    fn test_query_binding_wins_over_panel() {
        let panel = PanelContext {
            scoped_vars: ScopedVars::new().with("host", ScopedVar::text("a")),
            ..Default::default()
        };
        let request = QueryRequest::new(vec![Query::new("A").with_field("q", "$host")], two_hours())
            .with_scoped_var("host", ScopedVar::text("b"));

        let resolved =
            QueryResolver::default().resolve(request, &[], &panel, &PlainDatasource);
        assert_eq!(resolved.targets[0].field_str("q"), Some("b"));
    }

    #[test]
    fn test_only_template_fields_rewritten() {
        let target = Query::new("A")
            .with_field("expr", "up{job=\"$job\"}")
            .with_field("legendFormat", "$job");
        let globals = vec![Variable::single("job", "api")];

        let resolved = QueryResolver::default().resolve(
            QueryRequest::new(vec![target], two_hours()),
            &globals,
            &PanelContext::default(),
            &prometheus(),
        );
        assert_eq!(resolved.targets[0].field_str("expr"), Some("up{job=\"api\"}"));
        assert_eq!(resolved.targets[0].field_str("legendFormat"), Some("$job"));
    }

    #[test]
    fn test_sql_values_escaped() {
        let target = Query::new("A").with_field("rawSql", "SELECT 1 WHERE name = '$name'");
        let globals = vec![Variable::single("name", "O'Brien")];
        let resolved = QueryResolver::default().resolve(
            QueryRequest::new(vec![target], two_hours()),
            &globals,
            &PanelContext::default(),
            &SqlRules::default(),
        );
        assert_eq!(
            resolved.targets[0].field_str("rawSql"),
            Some("SELECT 1 WHERE name = 'O''Brien'")
        );
    }

    #[test]
    fn test_panel_interval_can_reference_variable() {
        let globals = vec![Variable::single("min_step", "5m")];
        let panel = PanelContext {
            interval: Some("$min_step".to_string()),
            max_data_points: Some(1000),
            ..Default::default()
        };
        let resolved = QueryResolver::default().resolve(
            QueryRequest::new(vec![], two_hours()),
            &globals,
            &panel,
            &PlainDatasource,
        );
        assert_eq!(resolved.interval, "5m");
        assert_eq!(resolved.scoped_vars.resolve("__interval_s").as_deref(), Some("300"));
    }

    #[test]
    fn test_default_resolution_and_floor_from_config() {
        // 2h / 1000 points = 7.2s -> 5s, below the 15s default floor
        let resolved = QueryResolver::default().resolve(
            QueryRequest::new(vec![], two_hours()),
            &[],
            &PanelContext::default(),
            &PlainDatasource,
        );
        assert_eq!(resolved.max_data_points, Some(1000));
        assert_eq!(resolved.interval, "15s");
    }

    #[test]
    fn test_step_seconds() {
        let resolver = QueryResolver::default();
        let resolved = resolver.resolve(
            QueryRequest::new(vec![], two_hours()).with_max_data_points(200),
            &[],
            &PanelContext::default(),
            &PlainDatasource,
        );
        let plain = Query::new("A");
        let mut doubled = Query::new("B");
        doubled.fields.insert("intervalFactor".to_string(), serde_json::json!(2));
        let coarse = Query::new("C").with_field("interval", "$__range");

        assert_eq!(resolver.step_seconds(&resolved, &plain), 30.0);
        assert_eq!(resolver.step_seconds(&resolved, &doubled), 60.0);
        assert_eq!(resolver.step_seconds(&resolved, &coarse), 7200.0);
        assert_eq!(
            resolver.step_seconds(&resolved, &Query::new("D").with_field("interval", "soon")),
            30.0
        );

        // 30 days at one point per second would exceed 11000 points
        let month = QueryRequest {
            range: TimeRange::new(0, 30 * 86_400_000).unwrap(),
            interval_ms: 1_000,
            ..resolved
        };
        assert_eq!(resolver.step_seconds(&month, &plain), 236.0);
    }

    #[test]
    fn test_safe_step_wins_for_long_ranges() {
        // 30 days at 100000 points is a 30s interval, but 11000 points per
        // query need at least 236s
        let target = Query::new("A").with_field("expr", "rate(x[$__rate_interval]) / $__interval");
        let resolved = QueryResolver::default().resolve(
            QueryRequest::new(vec![target], TimeRange::new(0, 30 * 86_400_000).unwrap())
                .with_max_data_points(100_000),
            &[],
            &PanelContext::default(),
            &PrometheusRules::default(),
        );

        assert_eq!(resolved.interval, "30s");
        assert_eq!(resolved.targets[0].field_str("expr"), Some("rate(x[251s]) / 236s"));
        assert_eq!(resolved.targets[0].fields["step"], 236.0);
    }

    #[test]
    fn test_query_interval_sets_step_and_scrape() {
        let target = Query::new("A")
            .with_field("expr", "rate(x[$__rate_interval]) / $__interval_ms")
            .with_field("interval", "$step");
        let globals = vec![Variable::single("step", "1m")];

        let resolved = QueryResolver::default().resolve(
            QueryRequest::new(vec![target], two_hours()).with_max_data_points(200),
            &globals,
            &PanelContext::default(),
            &prometheus(),
        );
        // step max(30s, 1m); rate window max(1m + 1m, 4 * 1m)
        assert_eq!(resolved.targets[0].field_str("expr"), Some("rate(x[4m]) / 60000"));
        assert_eq!(resolved.targets[0].field_str("interval"), Some("1m"));
        // request scope keeps the request level interval
        assert_eq!(resolved.scoped_vars.resolve("__interval").as_deref(), Some("30s"));
    }

    #[test]
    fn test_prometheus_lists_use_regex_alternation() {
        let globals = vec![
            Variable::multi("job", ["api", "web"]),
            Variable::multi("path", ["a.b"]),
            Variable::single("env", "it's"),
        ];
        let target = Query::new("A").with_field("expr", "up{job=~\"$job\",path=~\"$path\",env=\"$env\"}");

        // default config joins with csv; the datasource format takes over
        let resolved = QueryResolver::default().resolve(
            QueryRequest::new(vec![target], two_hours()),
            &globals,
            &PanelContext::default(),
            &PrometheusRules::default(),
        );
        assert_eq!(
            resolved.targets[0].field_str("expr"),
            Some(r#"up{job=~"(api|web)",path=~"a\\.b",env="it\\'s"}"#)
        );
    }

    #[test]
    fn test_sql_lists_are_quoted() {
        let target = Query::new("A").with_field("rawSql", "SELECT * FROM t WHERE id IN ($ids)");
        let globals = vec![Variable::multi("ids", ["a", "O'Brien"])];
        let resolved = QueryResolver::default().resolve(
            QueryRequest::new(vec![target], two_hours()),
            &globals,
            &PanelContext::default(),
            &SqlRules::default(),
        );
        assert_eq!(
            resolved.targets[0].field_str("rawSql"),
            Some("SELECT * FROM t WHERE id IN ('a','O''Brien')")
        );
    }

    #[test]
    fn test_adhoc_filters_pass_through() {
        let filters = vec![AdHocFilter::new("region", FilterOperator::NotEquals, "eu")];
        let request = QueryRequest::new(vec![], two_hours()).with_adhoc_filters(filters.clone());
        let resolved = QueryResolver::default().resolve(
            request,
            &[],
            &PanelContext::default(),
            &PlainDatasource,
        );
        assert_eq!(resolved.adhoc_filters, filters);
        assert!(!resolved.scoped_vars.contains("region"));
    }

    #[test]
    fn test_request_serde_shape() {
        let json = r#"{
            "targets": [{"refId": "A", "expr": "up"}],
            "range": {"start": 0, "end": 60000},
            "maxDataPoints": 100
        }"#;
        let request: QueryRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.max_data_points, Some(100));
        assert!(request.scoped_vars.is_empty());

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["intervalMs"], 0);
        assert_eq!(value["targets"][0]["refId"], "A");
    }
}
