//! Date range resolution for analytics queries.
//!
//! Turns the optional `date_from` / `date_to` query parameters into a concrete
//! inclusive window. Defaults are relative to a caller-supplied `now`.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use crate::error::{CallboardError, Result};

/// Inclusive `[start, end]` time range plus an optional agent scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub agent_filter: Option<String>,
}

impl AggregationWindow {
    pub fn with_agent(mut self, agent_id: Option<String>) -> Self {
        self.agent_filter = agent_id;
        self
    }

    /// Both bounds inclusive.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at <= self.end
    }
}

/// Which bound a raw value was supplied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
    From,
    To,
}

impl Bound {
    fn field(self) -> &'static str {
        match self {
            Bound::From => "date_from",
            Bound::To => "date_to",
        }
    }
}

/// Resolve optional raw bounds into a validated window.
///
/// * missing `raw_to` → `now`
/// * missing `raw_from` → `now - default_span_days`
/// * blank strings count as missing
/// * a bare `YYYY-MM-DD` means start of day for `raw_from`, last instant of the day for `raw_to`
///
/// Fails with `InvalidDate` for unparseable input and `InvalidRange` when `start > end`.
pub fn resolve(
    raw_from: Option<&str>,
    raw_to: Option<&str>,
    default_span_days: i64,
    now: DateTime<Utc>,
) -> Result<AggregationWindow> {
    let end = match non_blank(raw_to) {
        Some(raw) => parse_bound(raw, Bound::To)?,
        None => now,
    };
    let start = match non_blank(raw_from) {
        Some(raw) => parse_bound(raw, Bound::From)?,
        None => now - Duration::days(default_span_days),
    };

    if start > end {
        return Err(CallboardError::InvalidRange { start, end });
    }

    Ok(AggregationWindow {
        start,
        end,
        agent_filter: None,
    })
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

fn parse_bound(raw: &str, bound: Bound) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let time = match bound {
            Bound::From => NaiveTime::MIN,
            Bound::To => NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999)
                .unwrap_or(NaiveTime::MIN),
        };
        return Ok(date.and_time(time).and_utc());
    }

    Err(CallboardError::InvalidDate {
        field: bound.field(),
        value: raw.to_string(),
    })
}
