//! Analytics facade — assembles the two dashboard analytics queries
//!
//! Each query runs in the same order:
//! 1. Resolve the date window (validation only, no storage access)
//! 2. Per-agent only: resolve the agent and its recent calls (404 short-circuits here)
//! 3. Fetch the filtered session snapshot once
//! 4. Derive every view from that one snapshot
//!
//! Because a single snapshot feeds all views, `sum(callVolume.calls)` always
//! equals `metrics.totalCalls` within one response.

use callboard_core::analytics::{self, AggregateViews, AggregationWindow, RecentCall};
use callboard_core::config::AnalyticsConfig;
use callboard_core::error::Result;
use callboard_core::models::{Agent, CallerContext};
use callboard_core::repository::{SessionFilter, SessionRepository};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Raw query parameters shared by both endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsParams {
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    /// Ignored by the per-agent query, which takes the agent from the path.
    pub agent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl From<&AggregationWindow> for DateRange {
    fn from(window: &AggregationWindow) -> Self {
        Self {
            start: window.start,
            end: window.end,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub date_range: DateRange,
    #[serde(flatten)]
    pub views: AggregateViews,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<Agent> for AgentSummary {
    fn from(agent: Agent) -> Self {
        Self {
            id: agent.id,
            name: agent.name,
            description: agent.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentAnalyticsReport {
    pub agent: AgentSummary,
    pub date_range: DateRange,
    #[serde(flatten)]
    pub views: AggregateViews,
    pub recent_calls: Vec<RecentCall>,
}

fn agent_scope(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

async fn aggregate_window(
    repo: &dyn SessionRepository,
    caller: &CallerContext,
    window: &AggregationWindow,
) -> Result<AggregateViews> {
    let filter = SessionFilter::new(caller.clone(), window.clone());
    let sessions = repo.query(&filter).await?;

    tracing::debug!(
        user = %caller.user_id,
        start = %window.start,
        end = %window.end,
        agent = ?window.agent_filter,
        sessions = sessions.len(),
        "Aggregating analytics snapshot"
    );

    Ok(analytics::compute_all(&sessions))
}

/// `GET /analytics` — all of the caller's agents, or one when `agent_id` is set.
pub async fn global_analytics(
    repo: &dyn SessionRepository,
    caller: &CallerContext,
    params: &AnalyticsParams,
    config: &AnalyticsConfig,
    now: DateTime<Utc>,
) -> Result<AnalyticsReport> {
    let window = analytics::resolve(
        params.date_from.as_deref(),
        params.date_to.as_deref(),
        config.global_span_days,
        now,
    )?
    .with_agent(agent_scope(params.agent_id.as_deref()));

    let views = aggregate_window(repo, caller, &window).await?;

    Ok(AnalyticsReport {
        date_range: DateRange::from(&window),
        views,
    })
}

/// `GET /analytics/agent/:agentId` — one agent's metrics plus its latest calls.
pub async fn agent_analytics(
    repo: &dyn SessionRepository,
    caller: &CallerContext,
    agent_id: &str,
    params: &AnalyticsParams,
    config: &AnalyticsConfig,
    now: DateTime<Utc>,
) -> Result<AgentAnalyticsReport> {
    let window = analytics::resolve(
        params.date_from.as_deref(),
        params.date_to.as_deref(),
        config.agent_span_days,
        now,
    )?;

    let recent =
        analytics::fetch_recent(repo, caller, agent_id, config.recent_calls_limit).await?;

    let window = window.with_agent(Some(recent.agent.id.clone()));
    let views = aggregate_window(repo, caller, &window).await?;

    Ok(AgentAnalyticsReport {
        agent: AgentSummary::from(recent.agent),
        date_range: DateRange::from(&window),
        views,
        recent_calls: recent.calls,
    })
}
