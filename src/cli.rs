use crate::display::SeverityFormat;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dragnet",
    version,
    about = "Vulnerability scan orchestrator",
    long_about = "dragnet runs a set of external vulnerability scanners against a target \
                  concurrently and merges their findings into one SARIF report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a target for vulnerabilities
    #[command(after_help = EXIT_CODE_HELP)]
    Scan(ScanArgs),
    /// Display available scanners
    Scanners(ScannersArgs),
}

const EXIT_CODE_HELP: &str = "\
Exit codes:
     0 - Clean and successful scan. No errors, warnings, or notes.
     1 - Bad command, arguments, or options. Scan not completed.
  8-15 - Scan completed with errors, warnings, or notes.
     9 - Scan completed with errors (no warnings or notes).
    10 - Scan completed with warnings (no errors or notes).
    11 - Scan completed with errors and warnings (no notes).
    12 - Scan completed with notes (no errors or warnings).
    13 - Scan completed with errors and notes (no warnings).
    14 - Scan completed with warnings and notes (no errors).
    15 - Scan completed with errors, warnings, and notes.
    16 - Scan aborted due to unexpected error.";

#[derive(Args, Debug, Default)]
pub struct ScanArgs {
    /// Target to scan (defaults to the current working directory)
    pub target: Option<PathBuf>,

    /// Comma-separated list of scanner categories ('all' for every category)
    #[arg(short, long)]
    pub categories: Option<String>,

    /// Comma-separated list of scanners to use ('all' for every scanner)
    #[arg(short, long)]
    pub scanners: Option<String>,

    /// Comma-separated severities to treat as high/error
    #[arg(short, long)]
    pub escalate: Option<String>,

    /// Severity vocabulary for displayed findings
    #[arg(short, long, value_enum, default_value_t = SeverityFormat::Security)]
    pub format: SeverityFormat,

    /// Write findings to a SARIF file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Scanner catalog file (defaults to the built-in catalog)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Scanner assets directory
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Per-scanner timeout in seconds (no timeout when omitted)
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Suppress stdout logging
    #[arg(short, long)]
    pub quiet: bool,

    /// Log detailed debug info
    #[arg(short, long)]
    pub debug: bool,

    /// Local scan: never upload findings
    #[arg(short, long)]
    pub local: bool,
}

#[derive(Args, Debug, Default)]
pub struct ScannersArgs {
    /// Scanner catalog file (defaults to the built-in catalog)
    #[arg(long)]
    pub catalog: Option<PathBuf>,
}
