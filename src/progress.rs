use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::scan_events::ProgressEvent;

const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Create a percent-based bar for scans
///
/// Shows: spinner, progress bar, percent, elapsed time, status message
pub fn create_scan_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% ({elapsed_precise}) {msg}")
    {
        pb.set_style(style.tick_chars(SPINNER_CHARS).progress_chars("█▓░"));
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a spinner for the clean pass, whose length is not known up front
pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style.tick_chars(SPINNER_CHARS));
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Render the latest scan event on `pb`
pub fn apply_event(pb: &ProgressBar, event: &ProgressEvent) {
    pb.set_position(u64::from(event.percent));
    pb.set_message(event.status.clone());
}
