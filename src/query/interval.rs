//! Interval quantization
//!
//! Turns a time range and a target resolution (usually the pixel width of a
//! panel) into a "pretty" step such as `30s`, never smaller than the floor a
//! datasource declares. The step is exposed to queries as the implicit
//! variables `$__interval`, `$__interval_ms` and `$__interval_s`.
//!
//! # Example
//!
//! ```rust
//! use kuba_templating::query::interval::get_intervals;
//! use kuba_templating::types::TimeRange;
//!
//! let two_hours = TimeRange::new(0, 7_200_000).unwrap();
//! let interval = get_intervals(&two_hours, "15s", 200);
//! assert_eq!(interval.text, "30s");
//! assert_eq!(interval.ms, 30_000);
//! ```

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1},
    combinator::{opt, recognize, value},
    IResult, Parser,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

use super::request::QueryRequest;
use crate::error::{Error, Result};
use crate::metrics;
use crate::template::scope::{ScopedVar, ScopedVars};
use crate::types::TimeRange;

/// Interval returned when no resolution is known
pub const DEFAULT_INTERVAL_MS: i64 = 1_000;

/// Scrape interval assumed for `$__rate_interval` when none is known
pub const DEFAULT_SCRAPE_INTERVAL_S: f64 = 15.0;

// ============================================================================
// Interval strings
// ============================================================================

/// Unit of an interval string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalUnit {
    /// `ms`
    Millisecond,
    /// `s`
    Second,
    /// `m`
    Minute,
    /// `h`
    Hour,
    /// `d`
    Day,
    /// `w`
    Week,
    /// `M` (30 days)
    Month,
    /// `y` (365 days)
    Year,
}

impl IntervalUnit {
    /// Length of one unit in milliseconds
    pub fn millis(&self) -> i64 {
        match self {
            IntervalUnit::Millisecond => 1,
            IntervalUnit::Second => 1_000,
            IntervalUnit::Minute => 60_000,
            IntervalUnit::Hour => 3_600_000,
            IntervalUnit::Day => 86_400_000,
            IntervalUnit::Week => 604_800_000,
            IntervalUnit::Month => 2_592_000_000,
            IntervalUnit::Year => 31_536_000_000,
        }
    }
}

/// A parsed interval string such as `15s` or `>1.5m`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedInterval {
    /// Number of units
    pub count: f64,
    /// Unit
    pub unit: IntervalUnit,
}

impl ParsedInterval {
    /// Interval length in milliseconds, rounded to the nearest millisecond
    pub fn to_ms(&self) -> i64 {
        (self.count * self.unit.millis() as f64).round() as i64
    }

    /// Interval length in seconds
    pub fn to_seconds(&self) -> f64 {
        self.count * self.unit.millis() as f64 / 1000.0
    }
}

/// Parse `<number><unit>` with an optional leading `>`
fn interval_parts(input: &str) -> IResult<&str, (&str, IntervalUnit)> {
    let (input, _) = opt(char('>')).parse(input)?;
    let (input, number) = recognize((digit1, opt((char('.'), digit1)))).parse(input)?;
    let (input, unit) = alt((
        value(IntervalUnit::Millisecond, tag("ms")),
        value(IntervalUnit::Second, tag("s")),
        value(IntervalUnit::Minute, tag("m")),
        value(IntervalUnit::Hour, tag("h")),
        value(IntervalUnit::Day, tag("d")),
        value(IntervalUnit::Week, tag("w")),
        value(IntervalUnit::Month, tag("M")),
        value(IntervalUnit::Year, tag("y")),
    ))
    .parse(input)?;

    Ok((input, (number, unit)))
}

/// Parse an interval string
///
/// Accepts a number (optionally fractional) followed by one of
/// `ms s m h d w M y`, optionally prefixed by `>` ("at least").
///
/// ```rust
/// use kuba_templating::query::interval::{parse_interval, IntervalUnit};
///
/// let parsed = parse_interval(">15s").unwrap();
/// assert_eq!(parsed.unit, IntervalUnit::Second);
/// assert_eq!(parsed.to_ms(), 15_000);
/// assert!(parse_interval("15 seconds").is_err());
/// ```
pub fn parse_interval(input: &str) -> Result<ParsedInterval> {
    let trimmed = input.trim();
    match interval_parts(trimmed) {
        Ok(("", (number, unit))) => {
            let count: f64 = number
                .parse()
                .map_err(|_| Error::invalid_interval(input, "number out of range"))?;
            Ok(ParsedInterval { count, unit })
        }
        Ok((rest, _)) => Err(Error::invalid_interval(
            input,
            format!("unexpected trailing input '{}'", rest),
        )),
        Err(_) => Err(Error::invalid_interval(
            input,
            "expected a number followed by one of ms, s, m, h, d, w, M, y",
        )),
    }
}

/// Interval string to milliseconds
pub fn interval_to_ms(input: &str) -> Result<i64> {
    parse_interval(input).map(|p| p.to_ms())
}

/// Interval string to seconds
pub fn interval_to_seconds(input: &str) -> Result<f64> {
    parse_interval(input).map(|p| p.to_seconds())
}

/// Render milliseconds with the largest unit that divides them exactly
///
/// ```rust
/// use kuba_templating::query::interval::format_interval;
///
/// assert_eq!(format_interval(30_000), "30s");
/// assert_eq!(format_interval(90_000), "90s");
/// assert_eq!(format_interval(3_600_000), "1h");
/// assert_eq!(format_interval(500), "500ms");
/// ```
pub fn format_interval(ms: i64) -> String {
    const UNITS: [(&str, i64); 5] = [
        ("y", 31_536_000_000),
        ("d", 86_400_000),
        ("h", 3_600_000),
        ("m", 60_000),
        ("s", 1_000),
    ];
    for (suffix, size) in UNITS {
        if ms >= size && ms % size == 0 {
            return format!("{}{}", ms / size, suffix);
        }
    }
    format!("{}ms", ms)
}

/// Render seconds with the first non-zero unit, truncating the rest
///
/// Display only: `90.0` renders as `1m`. Use [`format_interval`] when the
/// text must convert back to the same value.
pub fn seconds_to_hms(seconds: f64) -> String {
    let whole = seconds.floor() as i64;
    let years = whole / 31_536_000;
    if years > 0 {
        return format!("{}y", years);
    }
    let days = (whole % 31_536_000) / 86_400;
    if days > 0 {
        return format!("{}d", days);
    }
    let hours = (whole % 86_400) / 3_600;
    if hours > 0 {
        return format!("{}h", hours);
    }
    let minutes = (whole % 3_600) / 60;
    if minutes > 0 {
        return format!("{}m", minutes);
    }
    if whole > 0 {
        return format!("{}s", whole);
    }
    let millis = (seconds * 1000.0).floor() as i64;
    if millis > 0 {
        return format!("{}ms", millis);
    }
    "less than a millisecond".to_string()
}

// ============================================================================
// Quantization
// ============================================================================

/// Snap a raw interval onto the ladder of human-friendly steps
///
/// Each step covers raw values up to roughly halfway to the next step, so
/// `36s` becomes `30s` and `50s` becomes `1m`. The ladder is monotonic.
pub fn round_interval(raw_ms: f64) -> i64 {
    const LADDER: [(f64, i64); 28] = [
        (15.0, 10),                   // 0.01s
        (35.0, 20),                   // 0.02s
        (75.0, 50),                   // 0.05s
        (150.0, 100),                 // 0.1s
        (350.0, 200),                 // 0.2s
        (750.0, 500),                 // 0.5s
        (1_500.0, 1_000),             // 1s
        (3_500.0, 2_000),             // 2s
        (7_500.0, 5_000),             // 5s
        (12_500.0, 10_000),           // 10s
        (17_500.0, 15_000),           // 15s
        (25_000.0, 20_000),           // 20s
        (45_000.0, 30_000),           // 30s
        (90_000.0, 60_000),           // 1m
        (210_000.0, 120_000),         // 2m
        (450_000.0, 300_000),         // 5m
        (750_000.0, 600_000),         // 10m
        (1_050_000.0, 900_000),       // 15m
        (1_500_000.0, 1_200_000),     // 20m
        (2_700_000.0, 1_800_000),     // 30m
        (5_400_000.0, 3_600_000),     // 1h
        (9_000_000.0, 7_200_000),     // 2h
        (16_200_000.0, 10_800_000),   // 3h
        (32_400_000.0, 21_600_000),   // 6h
        (86_400_000.0, 43_200_000),   // 12h
        (604_800_000.0, 86_400_000),  // 1d
        (1_814_400_000.0, 604_800_000), // 1w
        (3_628_800_000.0, 2_592_000_000), // 30d
    ];
    for (below, step) in LADDER {
        if raw_ms < below {
            return step;
        }
    }
    31_536_000_000 // 1y
}

/// Step size and its millisecond value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Text form, e.g. `30s`
    #[serde(rename = "interval")]
    pub text: String,
    /// Milliseconds
    #[serde(rename = "intervalMs")]
    pub ms: i64,
}

impl Interval {
    /// Build from milliseconds, deriving the text form
    pub fn from_ms(ms: i64) -> Self {
        Self {
            text: format_interval(ms),
            ms,
        }
    }

    /// Interval in seconds
    pub fn seconds(&self) -> f64 {
        self.ms as f64 / 1000.0
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::from_ms(DEFAULT_INTERVAL_MS)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn floor_ms(floor: &str) -> i64 {
    if floor.trim().is_empty() {
        return 1;
    }
    match interval_to_ms(floor) {
        Ok(ms) => ms.max(1),
        Err(e) => {
            warn!(floor = %floor, error = %e, "Ignoring invalid minimum interval");
            1
        }
    }
}

/// Interval for `range` drawn at `resolution` points, bounded below by `floor`
///
/// A resolution of zero or less returns `1s`. An empty or invalid floor
/// means no lower bound beyond one millisecond. A range whose length
/// overflows is treated as the longest representable one.
pub fn get_intervals(range: &TimeRange, floor: &str, resolution: i64) -> Interval {
    if resolution <= 0 {
        metrics::record_interval("default", DEFAULT_INTERVAL_MS);
        return Interval::default();
    }

    let duration = range.duration_ms().unwrap_or(i64::MAX).max(0) as f64;
    let computed = round_interval(duration / resolution as f64);
    let lower = floor_ms(floor);

    let (ms, source) = if lower > computed {
        (lower, "floor")
    } else {
        (computed, "computed")
    };
    metrics::record_interval(source, ms);
    debug!(range = %range, resolution, interval_ms = ms, source, "Computed interval");

    Interval::from_ms(ms)
}

/// Write the interval for `range` onto `request`
///
/// Sets `interval`/`interval_ms` and extends (never replaces) the request
/// scope with `__interval`, `__interval_ms` and `__interval_s`. Calling it
/// twice with the same inputs gives the same request.
pub fn populate_interval(
    mut request: QueryRequest,
    range: TimeRange,
    resolution: i64,
    floor: &str,
) -> QueryRequest {
    let interval = get_intervals(&range, floor, resolution);
    request.range = range;
    request.scoped_vars.extend(&interval_scoped_vars(&interval));
    request.interval = interval.text;
    request.interval_ms = interval.ms;
    request
}

/// `__interval`, `__interval_ms` and `__interval_s` for `interval`
pub fn interval_scoped_vars(interval: &Interval) -> ScopedVars {
    ScopedVars::new()
        .with("__interval", ScopedVar::text(interval.text.clone()))
        .with("__interval_ms", ScopedVar::number(interval.ms as f64))
        .with("__interval_s", ScopedVar::number(interval.seconds()))
}

/// `__range_ms`, `__range_s` and `__range` for `range`
///
/// `__range_s` is rounded to whole seconds.
pub fn range_scoped_vars(range: &TimeRange) -> ScopedVars {
    let ms = range.duration_ms().unwrap_or(i64::MAX).max(0);
    let seconds = (ms as f64 / 1000.0).round();
    ScopedVars::new()
        .with("__range_ms", ScopedVar::number(ms as f64))
        .with("__range_s", ScopedVar::number(seconds))
        .with("__range", ScopedVar::text(format!("{}s", seconds)))
}

// ============================================================================
// Step adjustment
// ============================================================================

/// Final step in seconds for a query
///
/// The largest of `interval * factor`, `min_interval`, and the smallest step
/// that keeps `range` within `max_points` points. The safe step is rounded up
/// to whole seconds once it exceeds one second.
pub fn adjust_interval(
    interval_s: f64,
    min_interval_s: f64,
    range_s: f64,
    factor: f64,
    max_points: u32,
) -> f64 {
    let mut safe = range_s / f64::from(max_points.max(1));
    if safe > 1.0 {
        safe = safe.ceil();
    }
    (interval_s * factor).max(min_interval_s).max(safe)
}

/// Window in seconds for rate-style functions
///
/// At least four scrapes wide, and at least one step plus one scrape. A zero
/// scrape interval falls back to 15 seconds.
pub fn rate_interval(interval_s: f64, scrape_s: f64) -> f64 {
    let scrape = if scrape_s <= 0.0 {
        DEFAULT_SCRAPE_INTERVAL_S
    } else {
        scrape_s
    };
    (interval_s + scrape).max(4.0 * scrape)
}

/// `__rate_interval` for a step and scrape interval
///
/// Rendered on the same unit ladder as `__interval`, so fractional seconds
/// come out as milliseconds.
pub fn rate_interval_scoped_vars(interval_s: f64, scrape_s: f64) -> ScopedVars {
    let rate_ms = (rate_interval(interval_s, scrape_s) * 1000.0).round() as i64;
    ScopedVars::new().with("__rate_interval", ScopedVar::text(format_interval(rate_ms)))
}
