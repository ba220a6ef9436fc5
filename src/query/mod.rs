//! Query lists and query requests
//!
//! - [`refid`]: identifiers for queries added to a panel
//! - [`interval`]: step computation and the `__interval` family of variables
//! - [`request`]: the resolution pipeline that turns a panel's targets into a
//!   datasource-ready [`QueryRequest`]
//!
//! # Example
//!
//! ```rust
//! use kuba_templating::query::{PanelContext, PlainDatasource, QueryRequest, QueryResolver};
//! use kuba_templating::template::Variable;
//! use kuba_templating::types::{Query, TimeRange};
//!
//! let resolver = QueryResolver::default();
//! let targets = vec![Query::new("A").with_field("expr", "up{env=\"$env\"}[$__interval]")];
//! let range = TimeRange::new(0, 7_200_000).unwrap();
//! let panel = PanelContext { max_data_points: Some(200), ..Default::default() };
//!
//! let resolved = QueryRequest::new(targets, range).resolve(
//!     &resolver,
//!     &[Variable::single("env", "prod")],
//!     &panel,
//!     &PlainDatasource,
//! );
//! assert_eq!(resolved.targets[0].field_str("expr"), Some("up{env=\"prod\"}[30s]"));
//! ```

pub mod interval;
pub mod refid;
pub mod request;

pub use interval::{get_intervals, parse_interval, populate_interval, Interval, IntervalUnit};
pub use refid::{add_query, duplicate_ref_ids, next_ref_id, ref_id_for_index};
pub use request::{
    DatasourceRules, PanelContext, PlainDatasource, PrometheusRules, QueryRequest, QueryResolver,
    SqlRules,
};
