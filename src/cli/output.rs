//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying progress spinners and
//! formatted status messages to the user.

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::acquire::AcquireReport;

/// Create a spinner for operations with unknown duration
///
/// Returns a hidden spinner in quiet mode.
pub fn create_spinner(message: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Print an acquisition summary
pub fn print_acquire_report(report: &AcquireReport) {
    if !report.downloaded.is_empty() {
        println!(
            "{} Downloaded {} source(s): {}",
            status::SUCCESS,
            report.downloaded.len(),
            report.downloaded.join(", ")
        );
    }
    if !report.revalidated.is_empty() {
        println!(
            "  Reused {} unchanged archive(s): {}",
            report.revalidated.len(),
            report.revalidated.join(", ")
        );
    }
    if !report.cached.is_empty() {
        println!("  {} source(s) already extracted", report.cached.len());
    }
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Warning prefix (yellow triangle)
    pub const WARNING: &str = "⚠";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}
