//! Read-only access to session and agent records.
//!
//! The aggregation core never builds queries itself; it hands a typed
//! [`SessionFilter`] to a [`SessionRepository`] implementation which translates
//! it into whatever the backing store speaks.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::analytics::range::AggregationWindow;
use crate::error::Result;
use crate::models::{Agent, CallerContext, Session};

pub use memory::MemorySessionRepository;
pub use postgres::PgSessionRepository;

/// Typed query predicate: the caller's sessions inside a window, optionally for one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFilter {
    pub caller: CallerContext,
    pub window: AggregationWindow,
}

impl SessionFilter {
    pub fn new(caller: CallerContext, window: AggregationWindow) -> Self {
        Self { caller, window }
    }

    /// In-process evaluation of the predicate, for stores that cannot push it down.
    pub fn matches(&self, session: &Session) -> bool {
        self.window.contains(session.start_time)
            && self
                .window
                .agent_filter
                .as_deref()
                .map_or(true, |agent| session.agent_id == agent)
    }
}

#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Sessions owned by the caller whose `start_time` lies inside the window
    /// (both ends inclusive), restricted to the window's agent when set.
    async fn query(&self, filter: &SessionFilter) -> Result<Vec<Session>>;

    /// A live (not soft-deleted) agent owned by the caller.
    async fn get_agent(&self, caller: &CallerContext, agent_id: &str) -> Result<Option<Agent>>;

    /// The agent's sessions, newest first, at most `limit`.
    async fn recent_sessions(
        &self,
        caller: &CallerContext,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<Session>>;

    /// Storage health probe; returns a human-readable backend description.
    async fn ping(&self) -> Result<String>;
}
