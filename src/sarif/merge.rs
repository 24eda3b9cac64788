//! Merging per-scanner result documents into one aggregate document.

use super::{SarifDocument, SarifDriver, SarifRun, SarifTool};
use crate::error::Result;
use serde_json::Value;
use std::collections::HashSet;
use std::path::PathBuf;

/// Merge per-scanner SARIF files, in the given order, into one document.
///
/// Each run is renamed to the scanner identifier (the file stem); the
/// original tool name moves to `properties.officialName`. Only rule
/// definitions referenced by at least one result are carried over, so
/// rule catalogs never accumulate orphans across merges. A malformed
/// input file fails the whole merge.
pub fn merge_files(files: &[PathBuf]) -> Result<SarifDocument> {
    let mut merged = SarifDocument::new();

    for file in files {
        let source = SarifDocument::from_file(file)?;
        let scanner = file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        for run in source.runs {
            merged.runs.push(merge_run(&scanner, run));
        }
    }

    for run in &mut merged.runs {
        for result in &mut run.results {
            result.scrub_fingerprints();
        }
    }

    Ok(merged)
}

fn merge_run(scanner: &str, run: SarifRun) -> SarifRun {
    let referenced: HashSet<String> = run
        .results
        .iter()
        .filter_map(|result| result.rule_id.clone())
        .collect();

    let driver = run.tool.driver;
    let mut properties = driver.properties;
    properties.insert(
        "officialName".to_string(),
        Value::String(driver.name.clone()),
    );
    let rules = driver
        .rules
        .into_iter()
        .filter(|rule| referenced.contains(&rule.id))
        .collect();

    SarifRun {
        tool: SarifTool {
            driver: SarifDriver {
                name: scanner.to_string(),
                semantic_version: driver.semantic_version,
                information_uri: driver.information_uri,
                properties,
                rules,
            },
        },
        invocations: run.invocations,
        results: run.results,
        properties: None,
    }
}
