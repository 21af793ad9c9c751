//! Colored stdout reporting for action execution.
//!
//! Captured command output is passed through verbatim; the surrounding
//! marker lines carry a timestamp in the same format tracing uses.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Print the start of an action execution.
pub fn print_action_start(argv: &[String], working_dir: &Path) {
    println!(
        "{} {} {} in {}",
        timestamp().dimmed(),
        "[ACTION]".blue().bold(),
        argv.join(" ").cyan(),
        working_dir.display()
    );
    let _ = io::stdout().flush();
}

/// Copy a command's captured output to stdout, unmodified.
pub fn print_command_output(combined: &[u8]) {
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(combined);
    let _ = stdout.flush();
}
