//! Output formatting and progress indicators
//!
//! Progress bars, status lines and error reporting for the terminal.

use indicatif::{ProgressBar, ProgressStyle};

use crate::core::bundle::BundleSummary;

/// Create a progress bar for downloads
pub fn create_download_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
            .expect("Invalid progress bar template")
            .progress_chars("█▓▒░"),
    );
    pb
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";
}

/// Print an error and its causes to stderr
pub fn display_error(error: &anyhow::Error) {
    for line in error_lines(error) {
        eprintln!("{line}");
    }
}

/// An error followed by one line per cause
pub fn error_lines(error: &anyhow::Error) -> Vec<String> {
    std::iter::once(format!("{} Error: {error}", status::ERROR))
        .chain(error.chain().skip(1).map(|cause| format!("  caused by: {cause}")))
        .collect()
}

/// Lines describing what a run produced
pub fn summary_lines(summary: &BundleSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if !summary.dependencies.is_empty() {
        lines.push(format!(
            "{} Installed dependencies: {}",
            status::SUCCESS,
            summary.dependencies.join(", ")
        ));
    }
    if summary.target_installed {
        lines.push(format!("{} Installed cencalvm", status::SUCCESS));
    }
    if let Some(package) = &summary.package {
        if let Some(relocated) = &package.relocated {
            lines.push(format!(
                "{} Relocated {} library references in {} binaries",
                status::SUCCESS,
                relocated.changed,
                relocated.binaries
            ));
        }
        lines.push(format!("{} Stripped {} files", status::SUCCESS, package.stripped));
        lines.push(format!(
            "{} Created {}",
            status::SUCCESS,
            package.archive.display()
        ));
    }
    lines
}
