use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{SessionFilter, SessionRepository};
use crate::error::Result;
use crate::models::{Agent, CallerContext, Session};

/// Repository over a fixed in-process snapshot.
///
/// Counts every call so callers can assert whether storage was touched.
#[derive(Debug, Default)]
pub struct MemorySessionRepository {
    agents: Vec<Agent>,
    sessions: Vec<Session>,
    calls: AtomicUsize,
}

impl MemorySessionRepository {
    pub fn new(agents: Vec<Agent>, sessions: Vec<Session>) -> Self {
        Self {
            agents,
            sessions,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of repository operations served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn owns(&self, caller: &CallerContext, agent_id: &str) -> bool {
        self.agents
            .iter()
            .any(|a| a.id == agent_id && a.owner_id == caller.user_id)
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn query(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        self.touch();
        Ok(self
            .sessions
            .iter()
            .filter(|s| self.owns(&filter.caller, &s.agent_id) && filter.matches(s))
            .cloned()
            .collect())
    }

    async fn get_agent(&self, caller: &CallerContext, agent_id: &str) -> Result<Option<Agent>> {
        self.touch();
        Ok(self
            .agents
            .iter()
            .find(|a| a.id == agent_id && a.owner_id == caller.user_id)
            .cloned())
    }

    async fn recent_sessions(
        &self,
        caller: &CallerContext,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<Session>> {
        self.touch();
        if !self.owns(caller, agent_id) {
            return Ok(Vec::new());
        }
        let mut sessions: Vec<Session> = self
            .sessions
            .iter()
            .filter(|s| s.agent_id == agent_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(limit);
        Ok(sessions)
    }

    async fn ping(&self) -> Result<String> {
        Ok(format!(
            "in-memory ({} agents, {} sessions)",
            self.agents.len(),
            self.sessions.len()
        ))
    }
}
