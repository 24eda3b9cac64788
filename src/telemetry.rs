//! Telemetry payload shapes and the upload boundary.
//!
//! Events are a closed set: each variant carries its own typed payload
//! and knows its target URL. The actual transport lives behind
//! [`TelemetrySink`]; the pipeline only produces well-shaped payloads
//! and never blocks on delivery.

use crate::error::Result;
use crate::git::RepoMetadata;
use crate::sarif::{SarifDocument, Summary};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};

const DEFAULT_API_URL: &str = "https://api.dragnetsec.io";
const DEFAULT_INGEST_URL: &str = "https://ingest.dragnetsec.io";

/// Telemetry settings, resolved from the process environment exactly
/// once at startup and passed by reference everywhere else.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub api_url: String,
    pub ingest_url: String,
    pub token: Option<String>,
    pub profile: Option<String>,
    pub user_agent: String,
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        let token = env_var("DRAGNET_AGENT_TOKEN");
        Self {
            enabled: token.is_some(),
            api_url: env_var("DRAGNET_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            ingest_url: env_var("DRAGNET_INGEST_URL")
                .unwrap_or_else(|| DEFAULT_INGEST_URL.to_string()),
            token,
            profile: env_var("DRAGNET_PROFILE"),
            user_agent: format!(
                "dragnet/{} ({}-{})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
        }
    }

    /// Config with uploads off, for local scans and tests.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            api_url: DEFAULT_API_URL.to_string(),
            ingest_url: DEFAULT_INGEST_URL.to_string(),
            token: None,
            profile: None,
            user_agent: format!("dragnet/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Findings totals in the dashboard's severity vocabulary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FindingsCount {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub med: usize,
    pub low: usize,
}

impl From<&Summary> for FindingsCount {
    fn from(summary: &Summary) -> Self {
        Self {
            total: summary.total(),
            critical: 0,
            high: summary.errors.len(),
            med: summary.warnings.len(),
            low: summary.notes.len(),
        }
    }
}

/// One telemetry event per scan lifecycle stage.
#[derive(Debug)]
pub enum TelemetryEvent {
    ScanStarted {
        scanners: Vec<String>,
        repo_full_name: String,
    },
    ScanMetadata {
        scan_id: String,
        metadata: RepoMetadata,
        repo_full_name: String,
    },
    ScanResults {
        scan_id: String,
        findings: SarifDocument,
        log: String,
    },
    ScanCompleted {
        scan_id: String,
        findings: FindingsCount,
    },
    ScanFailed {
        scan_id: String,
    },
}

impl TelemetryEvent {
    /// Short event name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScanStarted { .. } => "scan_started",
            Self::ScanMetadata { .. } => "scan_metadata",
            Self::ScanResults { .. } => "scan_results",
            Self::ScanCompleted { .. } => "scan_completed",
            Self::ScanFailed { .. } => "scan_failed",
        }
    }

    /// Whether the event travels over the sensitive ingest channel.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Self::ScanMetadata { .. } | Self::ScanResults { .. })
    }

    pub fn url(&self, config: &TelemetryConfig) -> String {
        match self {
            Self::ScanStarted { .. } => format!("{}/scans/started", config.api_url),
            Self::ScanMetadata { scan_id, .. } => {
                format!("{}/scans/{scan_id}/metadata", config.ingest_url)
            }
            Self::ScanResults { scan_id, .. } => {
                format!("{}/scans/{scan_id}/results", config.ingest_url)
            }
            Self::ScanCompleted { scan_id, .. } | Self::ScanFailed { scan_id } => {
                format!("{}/scans/{scan_id}/completed", config.api_url)
            }
        }
    }

    pub fn content_type(&self) -> &'static str {
        "application/json"
    }

    /// JSON body for the event.
    pub fn payload(&self, config: &TelemetryConfig) -> Value {
        let timestamp = Utc::now().to_rfc3339();
        match self {
            Self::ScanStarted {
                scanners,
                repo_full_name,
            } => json!({
                "scanners": scanners,
                "repoFullName": repo_full_name,
                "timestamp": timestamp,
                "profile_id": config.profile,
            }),
            Self::ScanMetadata {
                metadata,
                repo_full_name,
                ..
            } => json!({
                "metadata": metadata,
                "repoFullName": repo_full_name,
            }),
            Self::ScanResults { findings, log, .. } => json!({
                "findings": findings,
                "profileId": config.profile,
                "log": BASE64.encode(log.as_bytes()),
            }),
            Self::ScanCompleted { findings, .. } => json!({
                "findings": findings,
                "timestamp": timestamp,
                "status": "success",
                "log": {"sizeBytes": 0, "warnings": 0, "errors": 0, "link": "none"},
                "params": {"id": ""},
            }),
            Self::ScanFailed { .. } => json!({
                "findings": FindingsCount::default(),
                "timestamp": timestamp,
                "status": "failure",
                "log": {"sizeBytes": 0, "warnings": 0, "errors": 0, "link": "none"},
                "params": {"id": ""},
            }),
        }
    }
}

/// Upload boundary. Implementations deliver events to the dashboard;
/// the pipeline treats every failure as non-fatal.
pub trait TelemetrySink {
    fn send(&self, event: &TelemetryEvent, config: &TelemetryConfig) -> Result<()>;
}

/// Sink that only records events in the debug log.
#[derive(Debug, Default)]
pub struct LogSink;

impl TelemetrySink for LogSink {
    fn send(&self, event: &TelemetryEvent, config: &TelemetryConfig) -> Result<()> {
        tracing::debug!(
            event = event.name(),
            url = %event.url(config),
            sensitive = event.is_sensitive(),
            "telemetry event"
        );
        Ok(())
    }
}
