//! Progress reporting for batch frame filtering.

use std::io::{self, Write};

use crate::batch::FrameRecord;

/// Output verbosity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// No output
    Quiet,
    /// Normal output (summary only)
    #[default]
    Normal,
    /// Verbose output (progress bar)
    Verbose,
    /// Very verbose (one line per frame)
    VeryVerbose,
}

impl OutputMode {
    /// Create OutputMode from verbosity level
    pub fn from_verbosity(level: u8) -> Self {
        match level {
            0 => OutputMode::Normal,
            1 => OutputMode::Verbose,
            _ => OutputMode::VeryVerbose,
        }
    }

    /// Check if output should be shown at this mode
    pub fn should_show(&self, required: OutputMode) -> bool {
        use OutputMode::*;
        match (self, required) {
            (Quiet, _) => false,
            (Normal, Quiet | Normal) => true,
            (Verbose, Quiet | Normal | Verbose) => true,
            (VeryVerbose, _) => true,
            _ => false,
        }
    }
}

/// Progress bar width in characters
const PROGRESS_BAR_WIDTH: usize = 40;

/// Build a progress bar string
pub fn build_progress_bar(percent: u8) -> String {
    let percent = percent.min(100);
    let filled = (percent as usize * PROGRESS_BAR_WIDTH) / 100;
    let empty = PROGRESS_BAR_WIDTH - filled;
    format!("[{}{}]", "=".repeat(filled), "-".repeat(empty))
}

/// Receives progress events from a batch run
///
/// Frames finish on worker threads, so implementations must be `Sync`.
pub trait ProgressCallback: Sync {
    /// Called once before any frame is processed
    fn on_start(&self, _total: usize) {}

    /// Called after each frame; `done` counts finished frames so far
    fn on_frame_done(&self, _done: usize, _total: usize, _record: &FrameRecord) {}
}

/// Callback that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {}

/// Terminal progress display
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameProgress {
    output_mode: OutputMode,
}

impl FrameProgress {
    pub fn new(output_mode: OutputMode) -> Self {
        Self { output_mode }
    }

    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    /// Print final summary
    pub fn print_summary(total: usize, kept: usize, rejected: usize, errors: usize) {
        println!();
        println!("{}", "=".repeat(60));
        println!("Filter Summary");
        println!("{}", "=".repeat(60));
        println!("  Total frames: {}", total);
        println!("  Kept:         {}", kept);
        println!("  Rejected:     {}", rejected);
        println!("  Errors:       {}", errors);
        println!("{}", "=".repeat(60));
        println!();
    }
}

impl ProgressCallback for FrameProgress {
    fn on_start(&self, total: usize) {
        if self.output_mode.should_show(OutputMode::Normal) {
            println!("Filtering {} frame(s)", total);
        }
    }

    fn on_frame_done(&self, done: usize, total: usize, record: &FrameRecord) {
        if self.output_mode.should_show(OutputMode::VeryVerbose) {
            println!("  [{}/{}] {}", done, total, record.describe());
            return;
        }

        if self.output_mode.should_show(OutputMode::Verbose) && total > 0 {
            let percent = ((done as f64 / total as f64) * 100.0) as u8;
            let mut stdout = io::stdout().lock();
            let _ = write!(
                stdout,
                "\r  {} {:3}% ({}/{})",
                build_progress_bar(percent),
                percent,
                done,
                total
            );
            if done == total {
                let _ = writeln!(stdout);
            }
            let _ = stdout.flush();
        }
    }
}
