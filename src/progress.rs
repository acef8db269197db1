//! Batch progress reporting.
//!
//! Jobs may run on several threads, so all progress events are funneled
//! through a single [`ProgressCallback`]; the console implementation keeps
//! its own atomic completion counter and is safe to share across workers.

use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

// ============================================================
// Callback
// ============================================================

/// Receives batch progress events from the runner.
pub trait ProgressCallback: Send + Sync {
    /// A job is starting. `file_number` is 1-based and reflects input
    /// order, not completion order.
    fn on_file_start(&self, file_number: usize, total: usize, path: &Path);

    /// A job finished, successfully or not.
    fn on_file_done(&self, path: &Path, ok: bool);
}

/// Callback that swallows every event.
pub struct SilentProgress;

impl ProgressCallback for SilentProgress {
    fn on_file_start(&self, _file_number: usize, _total: usize, _path: &Path) {}
    fn on_file_done(&self, _path: &Path, _ok: bool) {}
}

// ============================================================
// Output mode
// ============================================================

/// Output verbosity mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No output.
    Quiet,
    /// Progress bar and summary.
    #[default]
    Normal,
    /// Per-file lines.
    Verbose,
}

impl OutputMode {
    /// Create an `OutputMode` from CLI flags.
    pub fn from_flags(quiet: bool, verbosity: u8) -> Self {
        if quiet {
            OutputMode::Quiet
        } else if verbosity > 0 {
            OutputMode::Verbose
        } else {
            OutputMode::Normal
        }
    }
}

// ============================================================
// Progress bar
// ============================================================

/// Progress bar width in characters.
const PROGRESS_BAR_WIDTH: usize = 40;

/// Build a progress bar string.
pub fn build_progress_bar(percent: u8) -> String {
    let percent = percent.min(100) as usize;
    let filled = percent * PROGRESS_BAR_WIDTH / 100;
    let empty = PROGRESS_BAR_WIDTH - filled;
    format!("[{}{}]", "=".repeat(filled), "-".repeat(empty))
}

// ============================================================
// Console reporter
// ============================================================

/// Console progress reporter for the CLI.
pub struct ConsoleProgress {
    total: usize,
    completed: AtomicUsize,
    mode: OutputMode,
}

impl ConsoleProgress {
    /// Create a reporter for a batch of `total` files.
    pub fn new(total: usize, mode: OutputMode) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            mode,
        }
    }
}

impl ProgressCallback for ConsoleProgress {
    fn on_file_start(&self, file_number: usize, total: usize, path: &Path) {
        if self.mode == OutputMode::Verbose {
            println!("[{}/{}] Processing: {}", file_number, total, path.display());
        }
    }

    fn on_file_done(&self, path: &Path, ok: bool) {
        let done = self.completed.fetch_add(1, Ordering::Relaxed) + 1;
        match self.mode {
            OutputMode::Quiet => {}
            OutputMode::Normal => {
                let percent = if self.total == 0 {
                    100
                } else {
                    (done * 100 / self.total) as u8
                };
                print!(
                    "\r{} {:3}% ({}/{})",
                    build_progress_bar(percent),
                    percent,
                    done,
                    self.total
                );
                if done == self.total {
                    println!();
                }
                let _ = io::stdout().flush();
            }
            OutputMode::Verbose => {
                let status = if ok { "done" } else { "FAILED" };
                println!("    {}: {}", status, path.display());
            }
        }
    }
}

/// Print the final batch summary.
pub fn print_summary(total: usize, succeeded: usize, failed: usize) {
    println!();
    println!("{}", "=".repeat(60));
    println!("Batch Summary");
    println!("{}", "=".repeat(60));
    println!("  Total files: {}", total);
    println!("  Succeeded:   {}", succeeded);
    println!("  Failed:      {}", failed);
    println!("{}", "=".repeat(60));
}
