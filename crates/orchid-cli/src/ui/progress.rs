//! Progress indicators for long-running CLI operations.
//!
//! Spinners and bars from `indicatif`. They are hidden when stdout is not a
//! TTY, under `--quiet`, and for `--json` output.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Progress feedback mode based on output context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    /// Interactive TTY: show animated spinners and progress bars
    Interactive,
    /// Non-TTY or quiet: suppress progress, show only final results
    Quiet,
    /// Machine-readable: no progress at all (for --json)
    Silent,
}

impl ProgressMode {
    pub fn detect(quiet: bool, json: bool) -> Self {
        if json {
            Self::Silent
        } else if quiet || !atty::is(atty::Stream::Stdout) {
            Self::Quiet
        } else {
            Self::Interactive
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive)
    }
}

/// Spinner tick characters (Braille-based).
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Progress bar characters.
const BAR_CHARS: &str = "█░";

/// A spinner or bar; hidden outside interactive mode.
#[derive(Debug)]
pub struct Progress {
    bar: ProgressBar,
    mode: ProgressMode,
}

impl Progress {
    /// Indeterminate work, e.g. a search.
    pub fn spinner(message: &str, mode: ProgressMode) -> Self {
        let bar = if mode.is_interactive() {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .tick_chars(SPINNER_CHARS)
                    .template("{spinner:.cyan} {msg} ({elapsed})")
                    .expect("valid template"),
            );
            pb.set_message(message.to_string());
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        } else {
            ProgressBar::hidden()
        };

        Self { bar, mode }
    }

    /// Work with a known number of units, e.g. files or snippets.
    pub fn bar(total: u64, message: &str, mode: ProgressMode) -> Self {
        let bar = if mode.is_interactive() {
            let pb = ProgressBar::new(total);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{bar:20.cyan/dim}] {percent:>3}% ({pos}/{len}) {msg} ({elapsed})")
                    .expect("valid template")
                    .progress_chars(BAR_CHARS),
            );
            pb.set_message(message.to_string());
            pb
        } else {
            ProgressBar::hidden()
        };

        Self { bar, mode }
    }

    pub fn set_position(&self, pos: u64) {
        self.bar.set_position(pos);
    }

    /// Print above the bar without breaking it.
    pub fn println(&self, line: &str) {
        if self.mode.is_interactive() {
            self.bar.println(line);
        } else {
            println!("{}", line);
        }
    }

    pub fn finish_clear(&self) {
        self.bar.finish_and_clear();
    }

    /// Clear the bar, then print `message` if non-empty.
    pub fn finish_with_message(&self, message: &str) {
        if self.mode.is_interactive() {
            self.bar.finish_and_clear();
        }
        if !message.is_empty() {
            println!("{}", message);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.bar.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_is_silent() {
        assert_eq!(ProgressMode::detect(false, true), ProgressMode::Silent);
        assert_eq!(ProgressMode::detect(true, false), ProgressMode::Quiet);
    }

    #[test]
    fn test_hidden_progress_tracks_position() {
        let progress = Progress::bar(10, "Embedding snippets", ProgressMode::Quiet);
        progress.set_position(4);
        assert_eq!(progress.bar.position(), 4);
        progress.finish_clear();
    }
}
