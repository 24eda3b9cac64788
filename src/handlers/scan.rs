//! `scan` command: the full scan pipeline.

use super::{EXIT_ABORTED, EXIT_USAGE, load_catalog};
use crate::cli::ScanArgs;
use crate::display::{self, SeverityFormat};
use crate::error::{DragnetError, Result};
use crate::git;
use crate::runner::{self, ScanPlan};
use crate::sarif::{self, Level};
use crate::telemetry::{
    FindingsCount, LogSink, TelemetryConfig, TelemetryEvent, TelemetrySink,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

pub fn handle_scan(args: &ScanArgs, telemetry: &TelemetryConfig) -> ExitCode {
    match run_scan_pipeline(args, telemetry, &LogSink) {
        Ok(code) => ExitCode::from(code),
        Err(error) => {
            eprintln!("{error}");
            match error {
                DragnetError::Usage(_) => ExitCode::from(EXIT_USAGE),
                _ => ExitCode::from(EXIT_ABORTED),
            }
        }
    }
}

fn run_scan_pipeline(
    args: &ScanArgs,
    telemetry: &TelemetryConfig,
    sink: &dyn TelemetrySink,
) -> Result<u8> {
    // Resolve and validate scan parameters.
    let target = resolve_target(args.target.as_deref())?;
    let catalog = load_catalog(args.catalog.as_deref())?;
    let scanners = catalog.select(args.scanners.as_deref(), args.categories.as_deref())?;
    let escalations = parse_escalations(args.escalate.as_deref(), args.format)?;
    let assets = args.assets.clone().unwrap_or_else(default_assets_dir);

    let upload = telemetry.enabled && !args.local;
    if !upload && !args.quiet {
        println!("INFO: Running a local scan.\n");
    }

    // Scan output directory; removed on every exit path when dropped.
    let scans_root = scans_root()?;
    let outdir = tempfile::Builder::new()
        .prefix("scan-")
        .tempdir_in(&scans_root)
        .map_err(|e| DragnetError::WriteFile {
            path: scans_root.clone(),
            source: e,
        })?;

    // Target git metadata.
    let metadata = git::metadata(&target)?;
    let repo_full_name = metadata.full_name();
    debug!(target = %target.display(), repo = %repo_full_name, "Resolved scan target");

    // Telemetry: scan lifecycle. Failures never affect the scan.
    let scan_id = upload.then(|| Uuid::new_v4().to_string());
    if let Some(scan_id) = &scan_id {
        send_event(
            sink,
            telemetry,
            &TelemetryEvent::ScanStarted {
                scanners: scanners.iter().map(|s| s.name.clone()).collect(),
                repo_full_name: repo_full_name.clone(),
            },
        );
        send_event(
            sink,
            telemetry,
            &TelemetryEvent::ScanMetadata {
                scan_id: scan_id.clone(),
                metadata: metadata.clone(),
                repo_full_name: repo_full_name.clone(),
            },
        );
    }

    if !args.quiet {
        println!(
            "Running {} of {} scanners:",
            scanners.len(),
            catalog.scanners.len()
        );
    }

    let plan = ScanPlan {
        scanners,
        target: target.clone(),
        assets,
        outdir: outdir.path().to_path_buf(),
        quiet: args.quiet,
        timeout: args.timeout.map(Duration::from_secs),
    };

    let output = match runner::run_all(&plan) {
        Ok(output) => output,
        Err(error) => {
            eprintln!("\n{error}");
            if !args.quiet {
                eprintln!("Scan NOT completed!");
            }
            if let Some(scan_id) = &scan_id {
                send_event(
                    sink,
                    telemetry,
                    &TelemetryEvent::ScanFailed {
                        scan_id: scan_id.clone(),
                    },
                );
            }
            return Ok(EXIT_ABORTED);
        }
    };

    // Transform findings: escalate severities, then normalize paths.
    let mut document = output.sarif;
    if !escalations.is_empty() {
        document = sarif::escalate(document, &escalations);
    }
    let document = sarif::normalize(document, &target, &metadata);

    // Export findings.
    if let Some(outfile) = &args.output {
        document.write_to(outfile, true)?;
    }

    if let Some(scan_id) = &scan_id {
        send_event(
            sink,
            telemetry,
            &TelemetryEvent::ScanResults {
                scan_id: scan_id.clone(),
                findings: document.clone(),
                log: output.log.clone(),
            },
        );
    }

    // Summarize and display.
    let summary = sarif::summarize(&document);
    if let Some(scan_id) = &scan_id {
        send_event(
            sink,
            telemetry,
            &TelemetryEvent::ScanCompleted {
                scan_id: scan_id.clone(),
                findings: FindingsCount::from(&summary),
            },
        );
    }

    if !args.quiet {
        println!();
        display::display_findings(&summary, args.format);
        if let Some(outfile) = &args.output {
            println!("Findings exported to {}", outfile.display());
        }
        display::display_totals(&summary, args.format);
    }

    let exit_code = summary.exit_code();
    if !args.quiet && exit_code != 0 {
        println!(
            "Terminating with exit code {exit_code}. See 'dragnet scan --help' for the list of possible exit codes."
        );
    }

    Ok(exit_code)
}

fn resolve_target(target: Option<&Path>) -> Result<PathBuf> {
    let target = target
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    if !target.exists() {
        return Err(DragnetError::Usage(format!(
            "Path not found: {}",
            target.display()
        )));
    }
    target.canonicalize().map_err(|e| DragnetError::ReadFile {
        path: target,
        source: e,
    })
}

/// Map the display vocabulary's severities onto SARIF levels.
fn parse_escalations(escalate: Option<&str>, format: SeverityFormat) -> Result<Vec<Level>> {
    let Some(list) = escalate else {
        return Ok(Vec::new());
    };
    let mut levels = Vec::new();
    for severity in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let level = match (format, severity) {
            (SeverityFormat::Security, "moderate") => Level::Warning,
            (SeverityFormat::Security, "low") => Level::Note,
            (SeverityFormat::Sarif, "warning") => Level::Warning,
            (SeverityFormat::Sarif, "note") => Level::Note,
            (SeverityFormat::Security, _) => {
                return Err(DragnetError::Usage(
                    "Severity to escalate must be 'moderate' or 'low'".to_string(),
                ));
            }
            (SeverityFormat::Sarif, _) => {
                return Err(DragnetError::Usage(
                    "Severity to escalate must be 'warning' or 'note'".to_string(),
                ));
            }
        };
        if !levels.contains(&level) {
            levels.push(level);
        }
    }
    Ok(levels)
}

fn default_assets_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("scanners")))
        .unwrap_or_else(|| PathBuf::from("scanners"))
}

fn scans_root() -> Result<PathBuf> {
    let root = dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(".dragnet")
        .join("scans");
    std::fs::create_dir_all(&root).map_err(|e| DragnetError::WriteFile {
        path: root.clone(),
        source: e,
    })?;
    Ok(root)
}

fn send_event(sink: &dyn TelemetrySink, config: &TelemetryConfig, event: &TelemetryEvent) {
    if let Err(error) = sink.send(event, config) {
        warn!(event = event.name(), %error, "Telemetry upload skipped");
        eprintln!("WARNING: Telemetry will be skipped for this event: {error}");
    }
}
