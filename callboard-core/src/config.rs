use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CallboardConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(default = "default_connect_retries")]
    pub connect_retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

fn default_connect_retries() -> usize {
    5
}

fn default_retry_delay_ms() -> u64 {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8780,
        }
    }
}

/// Window defaults and limits for the analytics endpoints.
#[derive(Debug, Deserialize, Clone)]
pub struct AnalyticsConfig {
    /// Default window length for `GET /analytics`
    pub global_span_days: i64,
    /// Default window length for `GET /analytics/agent/:agentId`
    pub agent_span_days: i64,
    /// Number of sessions returned as `recentCalls`
    pub recent_calls_limit: usize,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            global_span_days: 7,
            agent_span_days: 30,
            recent_calls_limit: 10,
        }
    }
}

impl CallboardConfig {
    /// Load from a TOML file, then apply `CALLBOARD__SECTION__KEY` overrides.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("CALLBOARD").separator("__"))
            .build()?;
        s.try_deserialize()
    }

    /// Parse from an in-memory TOML string (no environment overrides).
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let s = Config::builder()
            .add_source(File::from_str(contents, config::FileFormat::Toml))
            .build()?;
        s.try_deserialize()
    }
}
