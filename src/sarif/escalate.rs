//! Severity escalation.

use super::{Level, SarifDocument};

/// Promote results whose effective severity is in `escalations` to
/// `error`.
///
/// A result with an explicit level is rewritten directly; otherwise the
/// referenced rule's default-configuration level is rewritten, so every
/// result inheriting from that rule reads as escalated too. Results
/// already at `error` are untouched, which makes a repeat application
/// with the same set a no-op.
pub fn escalate(mut document: SarifDocument, escalations: &[Level]) -> SarifDocument {
    if escalations.is_empty() {
        return document;
    }

    for run in &mut document.runs {
        for result in &mut run.results {
            if let Some(level) = result.level
                && escalations.contains(&level)
            {
                result.level = Some(Level::Error);
                continue;
            }

            let Some(rule_id) = result.rule_id.as_deref() else {
                continue;
            };
            if let Some(rule) = run.tool.driver.rules.iter_mut().find(|r| r.id == rule_id)
                && let Some(config) = rule.default_configuration.as_mut()
                && let Some(level) = config.level
                && escalations.contains(&level)
            {
                config.level = Some(Level::Error);
            }
        }
    }

    document
}
