//! callboard-cli — terminal frontend for the Callboard analytics API
//!
//! # Subcommands
//! - `analytics [--from <date>] [--to <date>] [--agent <id>] [--json]` — metrics across agents
//! - `agent <id> [--from <date>] [--to <date>] [--json]`                — one agent + recent calls
//! - `status`                                                            — show server health

use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8780";

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "callboard-cli",
    version,
    about = "Callboard call analytics — terminal client"
)]
struct Cli {
    /// Callboard HTTP server URL (overrides CALLBOARD_HTTP_URL env var)
    #[arg(long, env = "CALLBOARD_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    /// User id sent as the x-user-id header
    #[arg(long, env = "CALLBOARD_USER_ID")]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show analytics across all agents (default: last 7 days)
    Analytics {
        /// Window start (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Window end (RFC 3339 or YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Restrict to one agent
        #[arg(long)]
        agent: Option<String>,

        /// Print the raw JSON payload
        #[arg(long)]
        json: bool,
    },

    /// Show analytics and recent calls for one agent (default: last 30 days)
    Agent {
        /// Agent id
        id: String,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show Callboard server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    data: Option<serde_json::Value>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub total_calls: u64,
    pub successful_calls: u64,
    pub failed_calls: u64,
    pub success_rate: f64,
    pub average_duration: f64,
}

#[derive(Debug, Deserialize)]
pub struct VolumePoint {
    pub date: String,
    pub calls: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatePoint {
    pub date: String,
    pub success_rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Deserialize)]
pub struct AgentInfo {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentCall {
    pub start_time: String,
    pub status: String,
    pub duration_seconds: u64,
    pub customer_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub date_range: DateRange,
    pub metrics: Metrics,
    pub call_volume: Vec<VolumePoint>,
    pub success_rate_trends: Vec<RatePoint>,
    pub agent: Option<AgentInfo>,
    #[serde(default)]
    pub recent_calls: Vec<RecentCall>,
}

// ============================================================================
// Request building
// ============================================================================

/// Build an endpoint URL by appending path segments to the server base.
///
/// Segments are percent-encoded by `url`, so agent ids may hold any character.
pub fn endpoint(server: &str, segments: &[&str]) -> anyhow::Result<reqwest::Url> {
    let mut url =
        reqwest::Url::parse(server).with_context(|| format!("invalid server URL: {}", server))?;
    url.path_segments_mut()
        .map_err(|_| anyhow::anyhow!("server URL cannot take a path: {}", server))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

/// GET an analytics endpoint and unwrap the `{success, data}` envelope.
///
/// `None` query values are left out of the request.
pub fn fetch_data(
    url: reqwest::Url,
    query: &[(&str, Option<&str>)],
    user: Option<&str>,
) -> anyhow::Result<serde_json::Value> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let mut req = client.get(url.clone()).query(query);
    if let Some(user) = user {
        req = req.header("x-user-id", user);
    }

    let resp = req
        .send()
        .with_context(|| format!("connection failed to {}", url))?;
    let status = resp.status();
    let envelope: Envelope = resp
        .json()
        .with_context(|| format!("server returned {} with an unreadable body", status))?;

    if !status.is_success() || !envelope.success {
        let msg = envelope.error.unwrap_or_else(|| "unknown error".to_string());
        bail!("server returned {}: {}", status, msg);
    }

    envelope.data.context("response had no data")
}

// ============================================================================
// Rendering
// ============================================================================

/// Human-readable summary of an analytics report.
pub fn render_report(report: &Report) -> String {
    let mut out = String::new();

    if let Some(agent) = &report.agent {
        out.push_str(&format!("Agent:        {} ({})\n", agent.name, agent.id));
        if let Some(desc) = &agent.description {
            out.push_str(&format!("              {}\n", desc));
        }
    }

    let m = &report.metrics;
    out.push_str(&format!(
        "Window:       {} → {}\n",
        report.date_range.start, report.date_range.end
    ));
    out.push_str(&format!("Total calls:  {}\n", m.total_calls));
    out.push_str(&format!(
        "Successful:   {}   Failed: {}\n",
        m.successful_calls, m.failed_calls
    ));
    out.push_str(&format!("Success rate: {:.1}%\n", m.success_rate));
    out.push_str(&format!("Avg duration: {:.1}s\n", m.average_duration));

    if !report.call_volume.is_empty() {
        out.push_str("\nDate         Calls  Success\n");
        for point in &report.call_volume {
            let rate = report
                .success_rate_trends
                .iter()
                .find(|r| r.date == point.date)
                .map(|r| r.success_rate)
                .unwrap_or(0.0);
            out.push_str(&format!("{:<12} {:>5}  {:>6.1}%\n", point.date, point.calls, rate));
        }
    }

    if !report.recent_calls.is_empty() {
        out.push_str("\nRecent calls\n");
        for call in &report.recent_calls {
            out.push_str(&format!(
                "  {}  {:<11} {:>5}s  {}\n",
                call.start_time, call.status, call.duration_seconds, call.customer_id
            ));
        }
    }

    out
}

fn print_data(data: serde_json::Value, json_output: bool) -> anyhow::Result<()> {
    if json_output {
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }
    let report: Report =
        serde_json::from_value(data).context("failed to parse analytics response")?;
    print!("{}", render_report(&report));
    Ok(())
}

fn do_analytics(
    server: &str,
    user: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    agent: Option<&str>,
    json_output: bool,
) -> anyhow::Result<()> {
    let url = endpoint(server, &["analytics"])?;
    let query = [("date_from", from), ("date_to", to), ("agent_id", agent)];
    print_data(fetch_data(url, &query, user)?, json_output)
}

fn do_agent(
    server: &str,
    user: Option<&str>,
    id: &str,
    from: Option<&str>,
    to: Option<&str>,
    json_output: bool,
) -> anyhow::Result<()> {
    let url = endpoint(server, &["analytics", "agent", id])?;
    let query = [("date_from", from), ("date_to", to)];
    print_data(fetch_data(url, &query, user)?, json_output)
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;

    let url = format!("{}/health", server);
    let resp = client
        .get(&url)
        .send()
        .with_context(|| format!("cannot reach {}", url))?;

    if !resp.status().is_success() {
        bail!("server unhealthy (HTTP {})", resp.status());
    }

    let body: serde_json::Value = resp.json().unwrap_or_default();
    println!("Callboard server: {}", body["status"].as_str().unwrap_or("unknown"));
    println!("Version:          {}", body["version"].as_str().unwrap_or("?"));
    println!("Database:         {}", body["database"].as_str().unwrap_or("?"));
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();
    let user = cli.user.as_deref();

    let result = match &cli.command {
        Commands::Analytics { from, to, agent, json } => do_analytics(
            &server,
            user,
            from.as_deref(),
            to.as_deref(),
            agent.as_deref(),
            *json,
        ),
        Commands::Agent { id, from, to, json } => {
            do_agent(&server, user, id, from.as_deref(), to.as_deref(), *json)
        }
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("callboard-cli: {:#}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sample_data() -> serde_json::Value {
        serde_json::json!({
            "dateRange": {"start": "2024-01-01T00:00:00Z", "end": "2024-01-07T00:00:00Z"},
            "metrics": {
                "totalCalls": 3, "successfulCalls": 2, "failedCalls": 1,
                "successRate": 66.7, "averageDuration": 150.0,
                "firstCall": "2024-01-01T09:00:00Z", "lastCall": "2024-01-02T10:00:00Z"
            },
            "callVolume": [
                {"date": "2024-01-01", "calls": 2},
                {"date": "2024-01-02", "calls": 1}
            ],
            "durationTrends": [],
            "successRateTrends": [
                {"date": "2024-01-01", "successRate": 100.0, "totalCalls": 2, "successfulCalls": 2},
                {"date": "2024-01-02", "successRate": 0.0, "totalCalls": 1, "successfulCalls": 0}
            ]
        })
    }

    // ========================================================================
    // TEST 1: endpoint appends encoded path segments to the server base
    // ========================================================================
    #[test]
    fn test_endpoint_path_segments() {
        let url = endpoint("http://h", &["analytics"]).unwrap();
        assert_eq!(url.as_str(), "http://h/analytics");

        let url = endpoint("http://h/api/", &["analytics", "agent", "front desk/2"]).unwrap();
        assert_eq!(url.as_str(), "http://h/api/analytics/agent/front%20desk%2F2");

        assert!(endpoint("not a url", &["analytics"]).is_err());
    }

    // ========================================================================
    // TEST 2: absent params are skipped and offsets survive encoding
    // ========================================================================
    #[tokio::test]
    async fn test_fetch_data_query_encoding() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/analytics"))
            .and(query_param("date_to", "2024-01-01T00:00:00+02:00"))
            .and(query_param_is_missing("date_from"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": sample_data()
            })))
            .mount(&mock_server)
            .await;

        let url = endpoint(&mock_server.uri(), &["analytics"]).unwrap();
        let data = tokio::task::spawn_blocking(move || {
            fetch_data(
                url,
                &[("date_from", None), ("date_to", Some("2024-01-01T00:00:00+02:00"))],
                None,
            )
        })
        .await
        .unwrap()
        .unwrap();
        assert_eq!(data["metrics"]["successRate"], 66.7);
    }

    // ========================================================================
    // TEST 3: render_report includes metrics and per-day rows
    // ========================================================================
    #[test]
    fn test_render_report_global() {
        let report: Report = serde_json::from_value(sample_data()).unwrap();
        let text = render_report(&report);
        assert!(text.contains("Total calls:  3"));
        assert!(text.contains("Success rate: 66.7%"));
        assert!(text.contains("Avg duration: 150.0s"));
        assert!(text.contains("2024-01-01"));
        assert!(!text.contains("Agent:"));
        assert!(!text.contains("Recent calls"));
    }

    // ========================================================================
    // TEST 4: render_report shows agent header and recent calls
    // ========================================================================
    #[test]
    fn test_render_report_agent() {
        let mut data = sample_data();
        data["agent"] = serde_json::json!({"id": "a1", "name": "Front Desk", "description": null});
        data["recentCalls"] = serde_json::json!([{
            "id": "00000000-0000-0000-0000-000000000000",
            "agentId": "a1", "agentName": "Front Desk", "customerId": "cust-9",
            "type": "voice", "status": "completed", "durationSeconds": 42,
            "startTime": "2024-01-02T10:00:00Z", "endTime": null
        }]);
        let report: Report = serde_json::from_value(data).unwrap();
        let text = render_report(&report);
        assert!(text.contains("Agent:        Front Desk (a1)"));
        assert!(text.contains("Recent calls"));
        assert!(text.contains("cust-9"));
    }

    // ========================================================================
    // TEST 5: fetch_data unwraps the success envelope and sends the caller header
    // ========================================================================
    #[tokio::test]
    async fn test_fetch_data_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/analytics"))
            .and(query_param("agent_id", "a1"))
            .and(header("x-user-id", "user-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "data": sample_data()
            })))
            .mount(&mock_server)
            .await;

        let url = endpoint(&mock_server.uri(), &["analytics"]).unwrap();
        let data = tokio::task::spawn_blocking(move || {
            fetch_data(url, &[("agent_id", Some("a1"))], Some("user-1"))
        })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(data["metrics"]["totalCalls"], 3);
    }

    // ========================================================================
    // TEST 6: fetch_data surfaces the server's error message
    // ========================================================================
    #[tokio::test]
    async fn test_fetch_data_not_found() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "success": false,
                "error": "Agent not found: ghost"
            })))
            .mount(&mock_server)
            .await;

        let url = endpoint(&mock_server.uri(), &["analytics", "agent", "ghost"]).unwrap();
        let err = tokio::task::spawn_blocking(move || fetch_data(url, &[], Some("user-1")))
            .await
            .unwrap()
            .unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("404"), "got: {}", msg);
        assert!(msg.contains("Agent not found: ghost"), "got: {}", msg);
    }
}
