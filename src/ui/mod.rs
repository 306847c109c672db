//! UI/Progress presentation layer
//!
//! This module handles:
//! - Progress reporting while APKs are serialized
//! - Interactive progress bars using indicatif
//! - Silent progress for `--quiet` and library use
//! - Styled command summaries (see [`display`])
//!
//! All progress reporting goes through the ProgressReporter trait. Reporters
//! are shared with the worker pool, so every method takes `&self`.

pub mod display;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress reporter trait for long-running stages
pub trait ProgressReporter: Send + Sync {
    /// Begin a stage of `total` steps
    fn start(&self, stage: &str, total: u64);

    /// One step of the current stage is done
    fn advance(&self, item: &str);

    /// The current stage completed
    fn finish(&self);

    /// Abandon on error
    fn abandon(&self);
}

/// Interactive progress reporter with a visual progress bar
pub struct InteractiveProgressReporter {
    bar: ProgressBar,
}

impl InteractiveProgressReporter {
    pub fn new() -> Self {
        let style = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        let bar = ProgressBar::new(0);
        bar.set_style(style);
        Self { bar }
    }
}

impl Default for InteractiveProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for InteractiveProgressReporter {
    fn start(&self, stage: &str, total: u64) {
        self.bar.set_length(total);
        self.bar.set_position(0);
        self.bar.set_message(stage.to_string());
    }

    fn advance(&self, item: &str) {
        // Truncate long paths for display
        let display_path = if item.len() > 50 {
            let start = item.len() - 47;
            let start = (start..item.len())
                .find(|i| item.is_char_boundary(*i))
                .unwrap_or(start);
            format!("...{}", &item[start..])
        } else {
            item.to_string()
        };
        self.bar.set_message(display_path);
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }

    fn abandon(&self) {
        self.bar.abandon();
    }
}

/// Silent progress reporter
///
/// No-op implementation used with `--quiet` and when the library runs
/// embedded.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn start(&self, _stage: &str, _total: u64) {}

    fn advance(&self, _item: &str) {}

    fn finish(&self) {}

    fn abandon(&self) {}
}
