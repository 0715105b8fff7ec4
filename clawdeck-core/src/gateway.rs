//! HTTP client for the agent gateway
//!
//! The gateway exposes a single tool-invocation endpoint; this client wraps
//! it for the two operations the dashboard needs: waking the agent with a
//! message and listing its scheduled cron jobs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::config::GatewayConfig;
use crate::error::{Error, Result};

/// A scheduled job as reported by the gateway's `cron` tool.
#[derive(Debug, Clone, Serialize)]
pub struct CronJob {
    pub id: String,
    pub name: String,
    /// Human-readable rendering of the schedule
    pub schedule: String,
    /// The schedule as the gateway reported it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_raw: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    pub enabled: bool,
    /// Next scheduled run (epoch ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_run: Option<i64>,
    /// Most recent run (epoch ms)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run: Option<i64>,
}

#[derive(Serialize)]
struct InvokeRequest<'a> {
    tool: &'a str,
    args: Value,
    #[serde(rename = "sessionKey")]
    session_key: &'a str,
}

/// HTTP client for the gateway's tool-invocation API
pub struct GatewayClient {
    config: GatewayConfig,
    http_client: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    /// Create a new gateway client from configuration
    ///
    /// Returns an error if the configuration is invalid or missing required fields.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        config.validate()?;

        let base_url = config.url.trim_end_matches('/').to_string();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.token {
            let auth_value = format!("Bearer {}", token);
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value)
                    .map_err(|e| Error::Config(format!("invalid gateway token: {}", e)))?,
            );
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
            base_url,
        })
    }

    /// Invoke a gateway tool and return the raw JSON reply.
    pub async fn invoke(&self, tool: &str, args: Value) -> Result<Value> {
        let url = format!("{}/tools/invoke", self.base_url);

        let request_body = InvokeRequest {
            tool,
            args,
            session_key: &self.config.session_key,
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::Gateway(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if status.is_success() {
            response
                .json()
                .await
                .map_err(|e| Error::Gateway(format!("failed to parse response: {}", e)))
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".to_string());
            Err(Error::Gateway(format!(
                "gateway error ({}): {}",
                status, error_text
            )))
        }
    }

    /// Wake the agent with a message.
    ///
    /// The message arrives as an immediate cron wake event, prefixed so the
    /// agent can tell dashboard messages from scheduled ones.
    pub async fn send_wake(&self, message: &str) -> Result<Value> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidQuery("message is required".to_string()));
        }

        self.invoke(
            "cron",
            serde_json::json!({
                "action": "wake",
                "text": format!("[Workshop] {}", trimmed),
                "mode": "now",
            }),
        )
        .await
    }

    /// List the agent's scheduled jobs, disabled ones included.
    ///
    /// A reply without `ok: true` yields an empty list rather than an error;
    /// only transport failures surface as [`Error::Gateway`].
    pub async fn list_cron_jobs(&self) -> Result<Vec<CronJob>> {
        let result = self
            .invoke(
                "cron",
                serde_json::json!({ "action": "list", "includeDisabled": true }),
            )
            .await?;

        if !result["ok"].as_bool().unwrap_or(false) {
            return Ok(Vec::new());
        }

        // The gateway wraps tool output twice: prefer result.details.jobs,
        // fall back to result.jobs.
        let raw_jobs = result["result"]["details"]["jobs"]
            .as_array()
            .or_else(|| result["result"]["jobs"].as_array())
            .cloned()
            .unwrap_or_default();

        Ok(raw_jobs.iter().map(job_from_value).collect())
    }

    /// Trigger a scheduled job immediately.
    pub async fn run_cron_job(&self, job_id: &str) -> Result<Value> {
        self.invoke(
            "cron",
            serde_json::json!({ "action": "run", "jobId": job_id }),
        )
        .await
    }
}

fn job_from_value(job: &Value) -> CronJob {
    let state = &job["state"];
    CronJob {
        id: job["id"].as_str().unwrap_or_default().to_string(),
        name: job["name"]
            .as_str()
            .filter(|n| !n.is_empty())
            .unwrap_or("Unnamed job")
            .to_string(),
        schedule: describe_schedule(&job["schedule"]),
        schedule_raw: (!job["schedule"].is_null()).then(|| job["schedule"].clone()),
        payload: (!job["payload"].is_null()).then(|| job["payload"].clone()),
        enabled: job["enabled"].as_bool().unwrap_or(false),
        next_run: state["nextRunAtMs"].as_i64(),
        last_run: state["lastRunAtMs"].as_i64(),
    }
}

/// Render a gateway schedule object for humans.
pub fn describe_schedule(schedule: &Value) -> String {
    if schedule.is_null() {
        return "Unknown".to_string();
    }
    match schedule["kind"].as_str() {
        Some("cron") => format!("Cron: {}", schedule["expr"].as_str().unwrap_or_default()),
        Some("every") => {
            let ms = schedule["everyMs"].as_i64().unwrap_or(0);
            let mins = ((ms as f64) / 60_000.0).round() as i64;
            let hours = ((ms as f64) / 3_600_000.0).round() as i64;
            let days = ((ms as f64) / 86_400_000.0).round() as i64;
            if days >= 1 && ms % 86_400_000 == 0 {
                format!("Every {} day{}", days, if days > 1 { "s" } else { "" })
            } else if hours >= 1 && ms % 3_600_000 == 0 {
                format!("Every {} hour{}", hours, if hours > 1 { "s" } else { "" })
            } else {
                format!("Every {} minute{}", mins, if mins > 1 { "s" } else { "" })
            }
        }
        Some("at") => {
            let when = schedule["at"]
                .as_str()
                .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| {
                    dt.with_timezone(&chrono::Local)
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                })
                .unwrap_or_else(|| schedule["at"].to_string());
            format!("Once at {}", when)
        }
        _ => schedule.to_string(),
    }
}
