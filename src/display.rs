//! Console rendering of summarized findings.

use crate::sarif::{Finding, Level, Summary};
use clap::ValueEnum;
use colored::Colorize;

/// Vocabulary used to print severities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum SeverityFormat {
    /// high / moderate / low
    #[default]
    Security,
    /// error / warning / note
    Sarif,
}

impl SeverityFormat {
    /// Per-finding severity label.
    pub fn label(&self, level: Level) -> &'static str {
        match (self, level) {
            (Self::Security, Level::Error) => "high",
            (Self::Security, Level::Warning) => "moderate",
            (Self::Security, Level::Note) => "low",
            (Self::Sarif, Level::Error) => "error",
            (Self::Sarif, Level::Warning) => "warning",
            (Self::Sarif, Level::Note) => "note",
            (_, Level::None) => "",
        }
    }

    fn suffix(&self) -> &'static str {
        match self {
            Self::Security => " severity",
            Self::Sarif => "",
        }
    }

    fn total_label(&self, level: Level) -> &'static str {
        match (self, level) {
            (Self::Security, Level::Error) => "high",
            (Self::Security, Level::Warning) => "moderate",
            (Self::Security, Level::Note) => "low",
            (Self::Sarif, Level::Error) => "error(s)",
            (Self::Sarif, Level::Warning) => "warning(s)",
            (Self::Sarif, Level::Note) => "note(s)",
            (_, Level::None) => "",
        }
    }
}

/// Print one line per finding: notes first, then warnings, then errors.
pub fn display_findings(summary: &Summary, format: SeverityFormat) {
    for finding in &summary.notes {
        println!(
            "{}: {}{}: {}: {}",
            location(finding),
            format.label(Level::Note).bold(),
            format.suffix(),
            finding.tool,
            finding.message
        );
    }
    for finding in &summary.warnings {
        println!(
            "{}: {}{}: {}: {}",
            location(finding),
            format.label(Level::Warning).bold().yellow(),
            format.suffix(),
            finding.tool,
            finding.message
        );
    }
    for finding in &summary.errors {
        println!(
            "{}: {}{}: {}: {}",
            location(finding),
            format.label(Level::Error).bold().red(),
            format.suffix(),
            finding.tool,
            finding.message
        );
    }
}

/// Print the totals line.
pub fn display_totals(summary: &Summary, format: SeverityFormat) {
    let total = summary.total();
    let noun = if total == 1 {
        "vulnerability"
    } else {
        "vulnerabilities"
    };
    println!(
        "{} {}: {} {}, {} {}, {} {}.",
        total,
        noun,
        summary.errors.len(),
        format.total_label(Level::Error).red().bold(),
        summary.warnings.len(),
        format.total_label(Level::Warning).yellow().bold(),
        summary.notes.len(),
        format.total_label(Level::Note),
    );
}

fn location(finding: &Finding) -> String {
    format!("{}:{}", finding.artifact.name, finding.artifact.line)
}
