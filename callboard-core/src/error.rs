use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallboardError {
    #[error("Invalid date for {field}: '{value}' (expected RFC 3339 timestamp or YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Missing caller identity")]
    Unauthenticated,

    #[error("Database error: {0}")]
    Repository(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl CallboardError {
    /// Query parameter the error refers to, when it is a validation failure.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            CallboardError::InvalidDate { field, .. } => Some(*field),
            CallboardError::InvalidRange { .. } => Some("date_from"),
            _ => None,
        }
    }

    /// True for failures caused by the caller's input rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CallboardError::InvalidDate { .. }
                | CallboardError::InvalidRange { .. }
                | CallboardError::InvalidQuery(_)
                | CallboardError::AgentNotFound(_)
                | CallboardError::Unauthenticated
        )
    }
}

pub type Result<T> = std::result::Result<T, CallboardError>;
