//! Progress bar helpers using indicatif

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Create a spinner for indeterminate progress
pub fn create_spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .template("    {spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Create a per-feature progress bar
pub fn create_progress_bar(len: u64, message: &str) -> ProgressBar {
    let style = ProgressStyle::default_bar()
        .template("{msg} [{bar:40.cyan/blue}] {pos}/{len} features ({percent}%) [{eta}]")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=>-");
    let pb = ProgressBar::new(len);
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

/// Finish a spinner with a success message
pub fn finish_with_success(pb: &ProgressBar, message: &str) {
    pb.finish_with_message(format!("[OK] {}", message));
}
