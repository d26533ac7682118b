use async_trait::async_trait;
use sqlx::PgPool;

use super::{SessionFilter, SessionRepository};
use crate::error::{CallboardError, Result};
use crate::models::{Agent, CallerContext, Session, SessionRow};

/// PostgreSQL-backed repository. Sessions of soft-deleted agents are invisible.
#[derive(Clone)]
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn into_sessions(rows: Vec<SessionRow>) -> Result<Vec<Session>> {
    rows.into_iter().map(Session::try_from).collect()
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn query(&self, filter: &SessionFilter) -> Result<Vec<Session>> {
        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                s.id, s.agent_id, s.customer_id, s.session_type, s.status,
                s.duration_seconds, s.start_time, s.end_time, s.transcript, s.satisfaction
            FROM sessions s
            INNER JOIN agents a ON a.id = s.agent_id
            WHERE a.owner_id = $1
              AND a.deleted_at IS NULL
              AND s.start_time >= $2
              AND s.start_time <= $3
              AND ($4::TEXT IS NULL OR s.agent_id = $4)
            "#,
        )
        .bind(&filter.caller.user_id)
        .bind(filter.window.start)
        .bind(filter.window.end)
        .bind(filter.window.agent_filter.as_deref())
        .fetch_all(&self.pool)
        .await?;

        into_sessions(rows)
    }

    async fn get_agent(&self, caller: &CallerContext, agent_id: &str) -> Result<Option<Agent>> {
        let agent = sqlx::query_as::<_, Agent>(
            r#"
            SELECT id, owner_id, name, description
            FROM agents
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(agent_id)
        .bind(&caller.user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(agent)
    }

    async fn recent_sessions(
        &self,
        caller: &CallerContext,
        agent_id: &str,
        limit: usize,
    ) -> Result<Vec<Session>> {
        let limit = i64::try_from(limit)
            .map_err(|_| CallboardError::Other(format!("limit out of range: {}", limit)))?;

        let rows = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT
                s.id, s.agent_id, s.customer_id, s.session_type, s.status,
                s.duration_seconds, s.start_time, s.end_time, s.transcript, s.satisfaction
            FROM sessions s
            INNER JOIN agents a ON a.id = s.agent_id
            WHERE s.agent_id = $1
              AND a.owner_id = $2
              AND a.deleted_at IS NULL
            ORDER BY s.start_time DESC
            LIMIT $3
            "#,
        )
        .bind(agent_id)
        .bind(&caller.user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_sessions(rows)
    }

    async fn ping(&self) -> Result<String> {
        Ok(crate::db::health_check(&self.pool).await?)
    }
}
