//! End-to-end tests for the templating pipeline
//!
//! Builds dashboard state the way an application would (variable store,
//! panel repeats, per-query bindings), resolves requests and checks what a
//! datasource would receive.

use std::sync::Arc;
use std::thread;

use chrono::NaiveDate;
use kuba_templating::conditional::{evaluate, ConditionContext, ConditionGroup, ConditionItem, VariableOperator};
use kuba_templating::config::Config;
use kuba_templating::query::refid::{add_query, next_ref_id};
use kuba_templating::query::{PanelContext, PrometheusRules, QueryRequest, QueryResolver};
use kuba_templating::template::{
    Current, Interpolator, MultiValueFormat, ScopedVar, ScopedVars, SharedVariableStore, Variable,
    VariableStore,
};
use kuba_templating::types::{Query, TimeRange, VariableValue};

// ============================================================================
// Helpers
// ============================================================================

fn two_hours() -> TimeRange {
    TimeRange::last_ms(1_654_646_400_000, 7_200_000)
}

fn dashboard() -> VariableStore {
    VariableStore::from_variables([
        Variable::single("env", "prod"),
        Variable::multi("instance", ["web-1", "web-2"]),
        Variable::single("datacenter", VariableValue::new("Frankfurt", "eu-central-1")),
    ])
}

fn prometheus() -> PrometheusRules {
    PrometheusRules {
        min_interval: Some("15s".to_string()),
        scrape_interval: Some("30s".to_string()),
    }
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_repeated_panel_resolution() {
    let mut config = Config::default();
    config.multi_value.format = MultiValueFormat::Regex;
    let resolver = QueryResolver::from_config(&config);
    let store = dashboard();

    let expr = "sum(rate(http_requests_total{env=\"$env\",instance=~\"$instance\",dc=\"[[datacenter]]\"}[$__rate_interval]))";
    let mut targets = Vec::new();
    add_query(&mut targets, Query::default().with_field("expr", expr));
    add_query(&mut targets, Query::default().with_field("expr", "up{env=\"$env\"}"));

    // One panel instance per repeated env value
    for env in ["staging", "dev"] {
        let panel = PanelContext {
            scoped_vars: ScopedVars::new().with("env", ScopedVar::text(env)),
            max_data_points: Some(200),
            interval: None,
        };
        let resolved = QueryRequest::new(targets.clone(), two_hours()).resolve(
            &resolver,
            store.variables(),
            &panel,
            &prometheus(),
        );

        assert_eq!(resolved.interval, "30s");
        assert_eq!(resolved.interval_ms, 30_000);
        assert_eq!(
            resolved.targets[0].field_str("expr").unwrap(),
            format!(
                "sum(rate(http_requests_total{{env=\"{}\",instance=~\"(web-1|web-2)\",dc=\"eu-central-1\"}}[2m]))",
                env
            )
        );
        assert_eq!(
            resolved.targets[1].field_str("expr").unwrap(),
            format!("up{{env=\"{}\"}}", env)
        );
        let ids: Vec<&str> = resolved.targets.iter().map(|q| q.ref_id.as_str()).collect();
        assert_eq!(ids, vec!["A", "B"]);
    }
}

#[test]
fn test_unknown_variables_survive_resolution() {
    let target = Query::new("A").with_field("expr", "up{job=\"$job\",zone=\"[[zone]]\"}");
    let resolved = QueryRequest::new(vec![target], two_hours()).resolve(
        &QueryResolver::default(),
        dashboard().variables(),
        &PanelContext::default(),
        &prometheus(),
    );
    assert_eq!(
        resolved.targets[0].field_str("expr"),
        Some("up{job=\"$job\",zone=\"[[zone]]\"}")
    );
}

#[test]
fn test_empty_selection_leaves_token() {
    let mut store = dashboard();
    assert!(store.set_current("env", Current::Multi(vec![])));

    let target = Query::new("A").with_field("expr", "up{env=\"$env\"}");
    let resolved = QueryRequest::new(vec![target], two_hours()).resolve(
        &QueryResolver::default(),
        store.variables(),
        &PanelContext::default(),
        &prometheus(),
    );
    assert_eq!(resolved.targets[0].field_str("expr"), Some("up{env=\"$env\"}"));
}

#[test]
fn test_resolution_is_idempotent_on_scope() {
    let resolver = QueryResolver::default();
    let request = QueryRequest::new(vec![Query::new("A").with_field("expr", "x")], two_hours());
    let once = request.resolve(&resolver, &[], &PanelContext::default(), &prometheus());

    let twice = QueryRequest {
        targets: vec![Query::new("A").with_field("expr", "x")],
        ..once.clone()
    }
    .resolve(&resolver, &[], &PanelContext::default(), &prometheus());

    assert_eq!(once.scoped_vars, twice.scoped_vars);
    assert_eq!(once.interval, twice.interval);
}

#[test]
fn test_warn_on_unresolved_keeps_text() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new("kuba_templating=debug"))
        .with_test_writer()
        .try_init();

    let mut config = Config::default();
    config.interpolation.warn_on_unresolved = true;
    let interpolator = Interpolator::new(&config.interpolation);

    let scope = ScopedVars::new().with("job", ScopedVar::text("api"));
    assert_eq!(
        interpolator.interpolate("$job/$missing/[[gone]]", &scope),
        "api/$missing/[[gone]]"
    );
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn test_snapshot_unaffected_by_later_mutation() {
    let shared = Arc::new(SharedVariableStore::new(dashboard()));
    let before = shared.snapshot(&MultiValueFormat::Csv);

    let writer = {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            shared.update(|store| store.set_current("env", Current::Single("dev".into())))
        })
    };
    assert!(writer.join().expect("writer panicked"));

    assert_eq!(before.resolve("env").as_deref(), Some("prod"));
    assert_eq!(before.resolve("instance").as_deref(), Some("web-1,web-2"));
    assert_eq!(
        shared.snapshot(&MultiValueFormat::Csv).resolve("env").as_deref(),
        Some("dev")
    );
}

// ============================================================================
// Ref ids
// ============================================================================

#[test]
fn test_delete_then_add_reuses_gap() {
    let mut queries = Vec::new();
    for _ in 0..5 {
        add_query(&mut queries, Query::default());
    }
    queries.retain(|q| q.ref_id != "C");

    assert_eq!(next_ref_id(&queries, None), "C");
    add_query(&mut queries, Query::default());
    assert_eq!(add_query(&mut queries, Query::default()), "F");
}

#[test]
fn test_allocation_past_z() {
    let mut queries = Vec::new();
    let ids: Vec<String> = (0..28)
        .map(|_| add_query(&mut queries, Query::default()))
        .collect();
    assert_eq!(ids[25], "Z");
    assert_eq!(ids[26], "AA");
    assert_eq!(ids[27], "AB");
}

// ============================================================================
// Conditional rendering
// ============================================================================

#[test]
fn test_time_window_condition() {
    let day = |d| NaiveDate::from_ymd_opt(2022, 6, d).unwrap();
    let window = TimeRange::from_dates(day(8), day(10)).unwrap();

    assert!(evaluate(&window, &window));
    assert!(!evaluate(&window, &TimeRange::from_dates(day(7), day(10)).unwrap()));
}

#[test]
fn test_condition_group_uses_resolved_scope() {
    let scope = dashboard().snapshot(&MultiValueFormat::Csv);
    let group = ConditionGroup::default()
        .with_item(ConditionItem::variable("datacenter", VariableOperator::Matches, "^eu-"))
        .with_item(ConditionItem::TimeRangeSize { value: "1d".to_string() });

    let ctx = ConditionContext {
        scope: &scope,
        has_data: false,
        range: two_hours(),
    };
    assert!(group.is_visible(&ctx));

    let week = ConditionContext {
        range: TimeRange::last_ms(1_654_646_400_000, 7 * 86_400_000),
        ..ctx
    };
    assert!(!group.is_visible(&week));
}
