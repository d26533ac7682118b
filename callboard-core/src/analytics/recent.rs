//! Recent activity for one agent, newest first.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{CallboardError, Result};
use crate::models::{Agent, CallerContext, Session, SessionStatus};
use crate::repository::SessionRepository;

/// A session enriched with the owning agent's display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCall {
    pub id: Uuid,
    pub agent_id: String,
    pub agent_name: String,
    pub customer_id: String,
    #[serde(rename = "type")]
    pub session_type: String,
    pub status: SessionStatus,
    pub duration_seconds: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl RecentCall {
    fn from_session(session: Session, agent_name: &str) -> Self {
        Self {
            id: session.id,
            agent_id: session.agent_id,
            agent_name: agent_name.to_string(),
            customer_id: session.customer_id,
            session_type: session.session_type,
            status: session.status,
            duration_seconds: session.duration_seconds,
            start_time: session.start_time,
            end_time: session.end_time,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecentActivity {
    pub agent: Agent,
    pub calls: Vec<RecentCall>,
}

/// Resolve the agent, then return its latest `limit` sessions.
///
/// Not restricted to any aggregation window.
pub async fn fetch_recent(
    repo: &dyn SessionRepository,
    caller: &CallerContext,
    agent_id: &str,
    limit: usize,
) -> Result<RecentActivity> {
    let agent = repo
        .get_agent(caller, agent_id)
        .await?
        .ok_or_else(|| CallboardError::AgentNotFound(agent_id.to_string()))?;

    let mut sessions = repo.recent_sessions(caller, &agent.id, limit).await?;
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    sessions.truncate(limit);

    let calls = sessions
        .into_iter()
        .map(|s| RecentCall::from_session(s, &agent.name))
        .collect();

    Ok(RecentActivity { agent, calls })
}
