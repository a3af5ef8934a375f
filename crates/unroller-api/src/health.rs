//! Upstream health checks.
//!
//! Every upstream exposes `{host}/__health`; an upstream is healthy when
//! that endpoint answers `200`.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use unroller_core::source::{USER_AGENT_VALUE, build_client};

use crate::state::{AppState, BuildInfo};

const HEALTH_PATH: &str = "/__health";

/// An upstream service the unroller depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    /// Name used in check ids and messages.
    pub app_name: String,
    /// Base URL; the check calls `{host}/__health`.
    pub host: String,
}

impl Upstream {
    /// Creates an upstream.
    pub fn new(app_name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            host: host.into(),
        }
    }

    fn health_url(&self) -> String {
        format!("{}{HEALTH_PATH}", self.host.trim_end_matches('/'))
    }
}

/// Outcome of one upstream check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckResult {
    /// Stable check id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Whether the upstream is healthy.
    pub ok: bool,
    /// 1 is the most severe.
    pub severity: u8,
    /// What breaks when the check fails.
    pub business_impact: String,
    /// What the check looks at.
    pub technical_summary: String,
    /// Result message.
    pub check_output: String,
}

/// Body of `/__health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    /// Report format version.
    pub schema_version: u8,
    /// Service name.
    pub name: String,
    /// Service description.
    pub description: String,
    /// Individual checks.
    pub checks: Vec<CheckResult>,
    /// Whether every check passed.
    pub ok: bool,
}

/// Checks the upstream services.
#[derive(Debug, Clone)]
pub struct HealthChecker {
    client: reqwest::Client,
    upstreams: Vec<Upstream>,
}

impl HealthChecker {
    /// Creates a checker for `upstreams`.
    pub fn new(client: reqwest::Client, upstreams: Vec<Upstream>) -> Self {
        Self { client, upstreams }
    }

    /// A checker with no upstreams. Always healthy.
    pub fn empty() -> unroller_core::Result<Self> {
        Ok(Self::new(
            build_client(std::time::Duration::from_secs(5))?,
            Vec::new(),
        ))
    }

    /// The checked upstreams.
    pub fn upstreams(&self) -> &[Upstream] {
        &self.upstreams
    }

    /// Checks one upstream, returning a message either way.
    pub async fn check(&self, upstream: &Upstream) -> Result<String, String> {
        let response = self
            .client
            .get(upstream.health_url())
            .header(reqwest::header::USER_AGENT, USER_AGENT_VALUE)
            .send()
            .await
            .map_err(|e| format!("{} service is unreachable: {e}", upstream.app_name))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(format!(
                "{} service is not responding with OK. status={}",
                upstream.app_name,
                status.as_u16()
            ));
        }
        Ok("OK".to_string())
    }

    /// Runs every check concurrently.
    pub async fn report(&self) -> HealthReport {
        let checks: Vec<CheckResult> = join_all(self.upstreams.iter().map(|upstream| async move {
            let outcome = self.check(upstream).await;
            CheckResult {
                id: format!("check-connect-{}", upstream.app_name),
                name: format!("Check connectivity to {}", upstream.app_name),
                ok: outcome.is_ok(),
                severity: 1,
                business_impact: "Unrolled content won't be available".to_string(),
                technical_summary: format!("Cannot connect to {}.", upstream.app_name),
                check_output: outcome.unwrap_or_else(|e| e),
            }
        }))
        .await;

        HealthReport {
            schema_version: 1,
            name: "content-unroller".to_string(),
            description: "Unrolls images and dynamic content referenced by a content document"
                .to_string(),
            ok: checks.iter().all(|c| c.ok),
            checks,
        }
    }

    /// `Ok` when every upstream is healthy, else the first failure.
    pub async fn good_to_go(&self) -> Result<(), String> {
        for upstream in &self.upstreams {
            self.check(upstream).await?;
        }
        Ok(())
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// `GET /__health`
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.health.report().await)
}

/// `GET /__gtg`
pub async fn good_to_go(State(state): State<AppState>) -> impl IntoResponse {
    match state.health.good_to_go().await {
        Ok(()) => (StatusCode::OK, "OK".to_string()),
        Err(message) => {
            tracing::warn!("Not good to go: {message}");
            (StatusCode::SERVICE_UNAVAILABLE, message)
        }
    }
}

/// `GET /__ping`
pub async fn ping() -> &'static str {
    "pong"
}

/// `GET /__build-info`
pub async fn build_info(State(state): State<AppState>) -> Json<BuildInfo> {
    Json(state.build_info.as_ref().clone())
}
