//! Per-scanner progress display.

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

/// Refresh interval for running-scanner tickers.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Progress display for one orchestration run.
///
/// Quiet mode carries no bars at all, so every operation is a no-op.
pub struct RunProgress {
    multi: Option<MultiProgress>,
}

impl RunProgress {
    pub fn new(quiet: bool) -> Self {
        Self {
            multi: (!quiet).then(MultiProgress::new),
        }
    }

    /// Register an elapsed-time ticker for one scanner.
    pub fn add(&self, name: &str) -> ScannerTicker {
        let bar = self.multi.as_ref().map(|multi| {
            let bar = multi.add(ProgressBar::new_spinner());
            bar.set_style(
                ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
                    .expect("Invalid progress template"),
            );
            bar.set_message(name.to_string());
            bar.enable_steady_tick(TICK_INTERVAL);
            bar
        });
        ScannerTicker { bar }
    }
}

/// Ticker for a single running scanner.
pub struct ScannerTicker {
    bar: Option<ProgressBar>,
}

impl ScannerTicker {
    /// Freeze the ticker with its final elapsed time.
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }

    /// Freeze the ticker after a scanner failure.
    pub fn fail(&self) {
        if let Some(bar) = &self.bar {
            bar.abandon();
        }
    }

    /// Remove the ticker without a final state (cancelled scanners).
    pub fn clear(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
