//! SARIF 2.1.0 document model and the aggregation pipeline stages.
//!
//! The model is deliberately partial: it types the fields the pipeline
//! reads and rewrites, and carries everything else through flattened
//! property bags so scanner output survives a round-trip untouched.

pub mod escalate;
pub mod merge;
pub mod normalize;
pub mod summarize;

pub use escalate::escalate;
pub use merge::merge_files;
pub use normalize::{SANDBOX_PREFIX, normalize};
pub use summarize::{Artifact, Finding, Summary, summarize};

use crate::error::{DragnetError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const SARIF_VERSION: &str = "2.1.0";
pub const SARIF_SCHEMA: &str = "https://json.schemastore.org/sarif-2.1.0.json";

/// Severity level attached to a result or a rule's default configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warning,
    Note,
    None,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
            Level::None => "none",
        }
    }

    /// Whether this level maps to one of the three summary buckets.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Level::None)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "error" => Ok(Level::Error),
            "warning" => Ok(Level::Warning),
            "note" => Ok(Level::Note),
            "none" => Ok(Level::None),
            other => Err(format!("unknown severity level: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifDocument {
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub version: String,
    pub runs: Vec<SarifRun>,
}

impl SarifDocument {
    /// Empty aggregate document with the fixed schema header.
    pub fn new() -> Self {
        Self {
            schema: Some(SARIF_SCHEMA.to_string()),
            version: SARIF_VERSION.to_string(),
            runs: Vec::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| DragnetError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(|e| DragnetError::ParseSarif {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn write_to(&self, path: &Path, pretty: bool) -> Result<()> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        fs::write(path, json).map_err(|e| DragnetError::WriteFile {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

impl Default for SarifDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifRun {
    pub tool: SarifTool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invocations: Option<Value>,
    #[serde(default)]
    pub results: Vec<SarifResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<RunProperties>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SarifTool {
    pub driver: SarifDriver,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifDriver {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semantic_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub information_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<SarifRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifRule {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_configuration: Option<RuleConfiguration>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(default)]
    pub message: SarifMessage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<SarifLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_fingerprints: Option<BTreeMap<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SarifResult {
    /// First physical location's (uri, start line), if any.
    pub fn primary_location(&self) -> Option<(&str, u64)> {
        let physical = self.locations.first()?.physical_location.as_ref()?;
        let uri = physical.artifact_location.as_ref()?.uri.as_str();
        let line = physical
            .region
            .as_ref()
            .and_then(|region| region.start_line)
            .unwrap_or(0);
        Some((uri, line))
    }

    /// Drop empty fingerprint entries; drop the map entirely once empty.
    pub fn scrub_fingerprints(&mut self) {
        if let Some(fingerprints) = &mut self.partial_fingerprints {
            fingerprints.retain(|_, value| match value {
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                _ => true,
            });
            if fingerprints.is_empty() {
                self.partial_fingerprints = None;
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SarifMessage {
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SarifLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub physical_location: Option<PhysicalLocation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_location: Option<ArtifactLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<Region>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactLocation {
    #[serde(default)]
    pub uri: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_line: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Provenance attached to each run of an aggregate document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<RepositoryProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub includedirs: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryProperty {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}
