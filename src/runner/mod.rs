//! Concurrent scanner orchestration.
//!
//! One OS process per selected scanner, all launched at once. The first
//! non-zero exit broadcasts a cancellation signal that kills every
//! sibling still running; a scanner killed that way is never reported as
//! a failure of its own. On all-success the per-scanner output files are
//! merged, in scanner order, into one document.

pub mod progress;

use crate::catalog::ScannerDescriptor;
use crate::error::{DragnetError, Result};
use crate::sarif::{self, SarifDocument};
use progress::{RunProgress, ScannerTicker};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::debug;

/// Everything one orchestration run needs.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub scanners: Vec<ScannerDescriptor>,
    pub target: PathBuf,
    pub assets: PathBuf,
    pub outdir: PathBuf,
    pub quiet: bool,
    pub timeout: Option<Duration>,
}

/// Combined output of a successful orchestration.
#[derive(Debug)]
pub struct ScanOutput {
    /// Scanner stdout logs concatenated in scanner order.
    pub log: String,
    /// Merged finding document.
    pub sarif: SarifDocument,
}

enum ScannerOutcome {
    Completed(String),
    Failed(Box<DragnetError>),
    Cancelled,
}

enum WaitOutcome {
    Status(std::process::ExitStatus),
    TimedOut,
    WaitFailed(std::io::Error),
}

/// Run every scanner concurrently and merge their outputs.
///
/// Blocks until all scanners settle.
pub fn run_all(plan: &ScanPlan) -> Result<ScanOutput> {
    let runtime =
        tokio::runtime::Runtime::new().map_err(|e| DragnetError::Runtime(e.to_string()))?;
    runtime.block_on(run_all_async(plan))
}

async fn run_all_async(plan: &ScanPlan) -> Result<ScanOutput> {
    let progress = RunProgress::new(plan.quiet);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let mut jobs: JoinSet<(usize, ScannerOutcome)> = JoinSet::new();

    for (index, scanner) in plan.scanners.iter().enumerate() {
        let command = substitute(
            &scanner.cmd,
            &plan.target,
            &plan.assets.join(&scanner.name),
            &plan.outdir,
        );
        debug!(scanner = %scanner.name, %command, "Launching scanner");
        let ticker = progress.add(&scanner.name);
        let name = scanner.name.clone();
        let cancel = cancel_rx.clone();
        let timeout = plan.timeout;
        jobs.spawn(async move {
            let outcome = run_scanner(&name, &command, timeout, cancel, &ticker).await;
            (index, outcome)
        });
    }
    drop(cancel_rx);

    let mut logs: Vec<Option<String>> = vec![None; plan.scanners.len()];
    let mut failure: Option<DragnetError> = None;
    while let Some(joined) = jobs.join_next().await {
        match joined {
            Ok((index, ScannerOutcome::Completed(log))) => logs[index] = Some(log),
            Ok((_, ScannerOutcome::Cancelled)) => {}
            Ok((_, ScannerOutcome::Failed(error))) => {
                if failure.is_none() {
                    failure = Some(*error);
                    let _ = cancel_tx.send(true);
                }
            }
            Err(join_error) => {
                if failure.is_none() {
                    failure = Some(DragnetError::Runtime(join_error.to_string()));
                    let _ = cancel_tx.send(true);
                }
            }
        }
    }

    if let Some(error) = failure {
        return Err(error);
    }

    let files: Vec<PathBuf> = plan
        .scanners
        .iter()
        .map(|scanner| plan.outdir.join(format!("{}.sarif", scanner.name)))
        .collect();
    let merged = sarif::merge_files(&files)?;
    merged.write_to(&plan.outdir.join("scan.sarif"), false)?;

    let log = logs.into_iter().flatten().collect();
    Ok(ScanOutput { log, sarif: merged })
}

async fn run_scanner(
    name: &str,
    command: &str,
    timeout: Option<Duration>,
    mut cancel: watch::Receiver<bool>,
    ticker: &ScannerTicker,
) -> ScannerOutcome {
    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(source) => {
            ticker.fail();
            return ScannerOutcome::Failed(Box::new(DragnetError::Launch {
                scanner: name.to_string(),
                source,
            }));
        }
    };

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let status = tokio::select! {
        outcome = wait_child(&mut child, timeout) => match outcome {
            WaitOutcome::Status(status) => status,
            WaitOutcome::TimedOut => {
                kill(&mut child).await;
                ticker.fail();
                return ScannerOutcome::Failed(Box::new(DragnetError::Timeout {
                    scanner: name.to_string(),
                    seconds: timeout.map(|t| t.as_secs()).unwrap_or_default(),
                }));
            }
            WaitOutcome::WaitFailed(source) => {
                kill(&mut child).await;
                ticker.fail();
                return ScannerOutcome::Failed(Box::new(DragnetError::Launch {
                    scanner: name.to_string(),
                    source,
                }));
            }
        },
        _ = cancel.changed() => {
            kill(&mut child).await;
            ticker.clear();
            return ScannerOutcome::Cancelled;
        }
    };

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    if status.success() {
        ticker.finish();
        ScannerOutcome::Completed(stdout)
    } else {
        ticker.fail();
        ScannerOutcome::Failed(Box::new(DragnetError::ScannerFailed {
            scanner: name.to_string(),
            command: command.to_string(),
            status: describe_status(status),
            output: format!("{stdout}{stderr}"),
        }))
    }
}

async fn wait_child(child: &mut Child, timeout: Option<Duration>) -> WaitOutcome {
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
            Ok(Ok(status)) => WaitOutcome::Status(status),
            Ok(Err(error)) => WaitOutcome::WaitFailed(error),
            Err(_) => WaitOutcome::TimedOut,
        },
        None => match child.wait().await {
            Ok(status) => WaitOutcome::Status(status),
            Err(error) => WaitOutcome::WaitFailed(error),
        },
    }
}

/// Best-effort SIGKILL; reaps the child so it never outlives the scan.
async fn kill(child: &mut Child) {
    if child.start_kill().is_ok() {
        let _ = child.wait().await;
    }
}

async fn read_stream<R>(stream: Option<R>) -> String
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    let Some(mut stream) = stream else {
        return String::new();
    };
    let mut buffer = String::new();
    let _ = stream.read_to_string(&mut buffer).await;
    buffer
}

fn describe_status(status: std::process::ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exited with code {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// Expand the `{target}`, `{assets}`, and `{output}` placeholders of a
/// command template.
fn substitute(template: &str, target: &Path, assets: &Path, outdir: &Path) -> String {
    template
        .replace("{target}", &target.display().to_string())
        .replace("{assets}", &assets.display().to_string())
        .replace("{output}", &outdir.display().to_string())
}
