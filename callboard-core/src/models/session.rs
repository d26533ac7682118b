use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CallboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Initiated,
    InProgress,
    Completed,
    Failed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initiated => "initiated",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = CallboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initiated" => Ok(SessionStatus::Initiated),
            "in_progress" => Ok(SessionStatus::InProgress),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            "abandoned" => Ok(SessionStatus::Abandoned),
            other => Err(CallboardError::Other(format!(
                "unknown session status '{}'",
                other
            ))),
        }
    }
}

/// One logged call or chat interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: Uuid,
    pub agent_id: String,
    pub customer_id: String,
    #[serde(rename = "type")]
    pub session_type: String,
    pub status: SessionStatus,
    /// Only meaningful when `status == Completed`.
    pub duration_seconds: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub transcript: Option<String>,
    pub satisfaction: Option<serde_json::Value>,
}

impl Session {
    /// Calendar-date bucket (UTC) this session is counted under.
    pub fn bucket(&self) -> NaiveDate {
        self.start_time.date_naive()
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn is_failed(&self) -> bool {
        self.status == SessionStatus::Failed
    }
}

/// Raw `sessions` row; status is stored as TEXT and validated on conversion.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRow {
    pub id: Uuid,
    pub agent_id: String,
    pub customer_id: String,
    pub session_type: String,
    pub status: String,
    pub duration_seconds: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub transcript: Option<String>,
    pub satisfaction: Option<serde_json::Value>,
}

impl TryFrom<SessionRow> for Session {
    type Error = CallboardError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: row.id,
            agent_id: row.agent_id,
            customer_id: row.customer_id,
            session_type: row.session_type,
            status: row.status.parse()?,
            duration_seconds: u32::try_from(row.duration_seconds).unwrap_or(0),
            start_time: row.start_time,
            end_time: row.end_time,
            transcript: row.transcript,
            satisfaction: row.satisfaction,
        })
    }
}
