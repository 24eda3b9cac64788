use clap::Parser;
use dragnet::telemetry::TelemetryConfig;
use dragnet::{
    Cli, Command,
    handlers::{handle_scan, handle_scanners},
};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let debug = matches!(&cli.command, Command::Scan(args) if args.debug);
    let default_filter = if debug { "dragnet=debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // The process environment is read exactly once, here.
    let telemetry = TelemetryConfig::from_env();

    match &cli.command {
        Command::Scan(args) => handle_scan(args, &telemetry),
        Command::Scanners(args) => handle_scanners(args),
    }
}
