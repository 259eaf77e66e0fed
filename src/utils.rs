//! Utility functions for progress reporting and diagnostics

use std::error::Error as StdError;

/// Percentage of `declared` covered by `received`, rounded down and clamped to 100
///
/// A zero declared length reports 100: there is nothing left to wait for.
pub fn progress_percent(received: u64, declared: u64) -> u8 {
    if declared == 0 {
        return 100;
    }
    let percent = (u128::from(received) * 100) / u128::from(declared);
    percent.min(100) as u8
}

/// Size in mebibytes with two decimals, e.g. `"1.50 MB"`
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Render an error and all of its sources, one `caused by:` line per source
///
/// A source whose message the text already contains (a wrapper that prints
/// its inner error) adds no line.
pub fn error_chain(error: &dyn StdError) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !text.contains(&message) {
            text.push_str("\ncaused by: ");
            text.push_str(&message);
        }
        source = cause.source();
    }
    text
}
