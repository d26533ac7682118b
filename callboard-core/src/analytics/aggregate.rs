//! Aggregation engine — derives dashboard metrics from a session snapshot
//!
//! Every function here is pure over `&[Session]`: the caller (repository) has
//! already applied the window and agent filter. Input order does not matter
//! and output is deterministic.
//!
//! Series are keyed by the UTC calendar date of `start_time` and emitted in
//! ascending date order. Dates with no sessions are omitted rather than
//! zero-filled; charts render gaps for idle days.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::models::Session;

/// Scalar summary of a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetrics {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    /// Percentage in `[0, 100]`, one decimal place
    pub success_rate: f64,
    /// Mean seconds over completed sessions, one decimal place
    pub average_duration: f64,
    pub first_call: Option<DateTime<Utc>>,
    pub last_call: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallVolumePoint {
    pub date: NaiveDate,
    pub calls: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationTrendPoint {
    pub date: NaiveDate,
    pub average_duration: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessRatePoint {
    pub date: NaiveDate,
    pub success_rate: f64,
    pub total_calls: u64,
    pub successful_calls: u64,
}

/// All four views computed from one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateViews {
    pub metrics: KeyMetrics,
    pub call_volume: Vec<CallVolumePoint>,
    pub duration_trends: Vec<DurationTrendPoint>,
    pub success_rate_trends: Vec<SuccessRatePoint>,
}

/// Running counters for one group of sessions.
#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: u64,
    completed: u64,
    failed: u64,
    completed_duration: u64,
}

impl Tally {
    fn add(&mut self, session: &Session) {
        self.total += 1;
        if session.is_completed() {
            self.completed += 1;
            self.completed_duration += u64::from(session.duration_seconds);
        } else if session.is_failed() {
            self.failed += 1;
        }
    }

    fn average_duration(&self) -> f64 {
        if self.completed == 0 {
            return 0.0;
        }
        round1(self.completed_duration as f64 / self.completed as f64)
    }

    fn success_rate(&self) -> f64 {
        safe_rate(self.completed, self.total)
    }
}

/// Percentage of `successful` over `total`, rounded to one decimal.
///
/// Returns `0.0` when `total == 0`. This is the only place a rate is divided.
pub fn safe_rate(successful: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = round1(successful as f64 / total as f64 * 100.0);
    rate.clamp(0.0, 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn tally_by_date(sessions: &[Session]) -> BTreeMap<NaiveDate, Tally> {
    let mut buckets: BTreeMap<NaiveDate, Tally> = BTreeMap::new();
    for session in sessions {
        buckets.entry(session.bucket()).or_default().add(session);
    }
    buckets
}

pub fn compute_key_metrics(sessions: &[Session]) -> KeyMetrics {
    let mut tally = Tally::default();
    for session in sessions {
        tally.add(session);
    }

    KeyMetrics {
        total_calls: tally.total,
        successful_calls: tally.completed,
        failed_calls: tally.failed,
        success_rate: tally.success_rate(),
        average_duration: tally.average_duration(),
        first_call: sessions.iter().map(|s| s.start_time).min(),
        last_call: sessions.iter().map(|s| s.start_time).max(),
    }
}

/// Calls per date. Idle dates are omitted, not zero-filled.
pub fn compute_call_volume_series(sessions: &[Session]) -> Vec<CallVolumePoint> {
    tally_by_date(sessions)
        .into_iter()
        .map(|(date, t)| CallVolumePoint {
            date,
            calls: t.total,
        })
        .collect()
}

/// Mean completed-call duration per date; `0` for dates with no completed calls.
pub fn compute_duration_trend(sessions: &[Session]) -> Vec<DurationTrendPoint> {
    tally_by_date(sessions)
        .into_iter()
        .map(|(date, t)| DurationTrendPoint {
            date,
            average_duration: t.average_duration(),
        })
        .collect()
}

pub fn compute_success_rate_trend(sessions: &[Session]) -> Vec<SuccessRatePoint> {
    tally_by_date(sessions)
        .into_iter()
        .map(|(date, t)| SuccessRatePoint {
            date,
            success_rate: t.success_rate(),
            total_calls: t.total,
            successful_calls: t.completed,
        })
        .collect()
}

pub fn compute_all(sessions: &[Session]) -> AggregateViews {
    AggregateViews {
        metrics: compute_key_metrics(sessions),
        call_volume: compute_call_volume_series(sessions),
        duration_trends: compute_duration_trend(sessions),
        success_rate_trends: compute_success_rate_trend(sessions),
    }
}
