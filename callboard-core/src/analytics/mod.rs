//! Analytics aggregation core: window resolution, pure aggregation, recent activity.

pub mod aggregate;
pub mod range;
pub mod recent;

pub use aggregate::{
    compute_all, compute_call_volume_series, compute_duration_trend, compute_key_metrics,
    compute_success_rate_trend, safe_rate, AggregateViews, CallVolumePoint, DurationTrendPoint,
    KeyMetrics, SuccessRatePoint,
};
pub use range::{resolve, AggregationWindow};
pub use recent::{fetch_recent, RecentActivity, RecentCall};
