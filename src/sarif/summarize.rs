//! Severity bucketing and exit-code derivation.

use super::{Level, SarifDocument, SarifResult, SarifRun};
use serde::Serialize;

/// A denormalized finding. Produced only during summarization, never
/// persisted.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub tool: String,
    pub level: Level,
    pub message: String,
    pub artifact: Artifact,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Artifact {
    pub name: String,
    pub line: u64,
}

/// Findings grouped by severity, in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub notes: Vec<Finding>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.notes.len()
    }

    pub fn is_clean(&self) -> bool {
        self.total() == 0
    }

    /// Exit status for a completed scan: 0 when clean, otherwise 8 with
    /// one bit per non-empty bucket (errors 1, warnings 2, notes 4).
    pub fn exit_code(&self) -> u8 {
        if self.is_clean() {
            return 0;
        }
        let mut code = 0x8;
        if !self.errors.is_empty() {
            code |= 0x1;
        }
        if !self.warnings.is_empty() {
            code |= 0x2;
        }
        if !self.notes.is_empty() {
            code |= 0x4;
        }
        code
    }
}

/// Group every result of the document into severity buckets.
///
/// Results whose effective severity cannot be determined (unknown rule,
/// or a level outside error/warning/note) are excluded from all buckets.
pub fn summarize(document: &SarifDocument) -> Summary {
    let mut summary = Summary::default();

    for run in &document.runs {
        for result in &run.results {
            let Some(level) = effective_level(run, result) else {
                continue;
            };
            let (name, line) = result
                .primary_location()
                .map(|(uri, line)| (uri.to_string(), line))
                .unwrap_or_default();
            let finding = Finding {
                tool: run.tool.driver.name.clone(),
                level,
                message: result.message.text.clone(),
                artifact: Artifact { name, line },
            };
            match level {
                Level::Error => summary.errors.push(finding),
                Level::Warning => summary.warnings.push(finding),
                Level::Note => summary.notes.push(finding),
                Level::None => {}
            }
        }
    }

    summary
}

/// Own level when recognized, else the referenced rule's default, which
/// itself defaults to `error` when the rule carries no explicit level.
fn effective_level(run: &SarifRun, result: &SarifResult) -> Option<Level> {
    if let Some(level) = result.level
        && level.is_recognized()
    {
        return Some(level);
    }

    let rule_id = result.rule_id.as_deref()?;
    let rule = run.tool.driver.rules.iter().find(|r| r.id == rule_id)?;
    let level = rule
        .default_configuration
        .as_ref()
        .and_then(|config| config.level)
        .unwrap_or(Level::Error);
    level.is_recognized().then_some(level)
}
