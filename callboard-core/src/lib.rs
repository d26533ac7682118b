pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod repository;

pub use config::CallboardConfig;
pub use error::CallboardError;
pub use repository::{MemorySessionRepository, PgSessionRepository, SessionFilter, SessionRepository};
