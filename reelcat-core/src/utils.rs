//! Utility functions for formatting and default paths.
//!
//! General-purpose helpers shared by the encoder command builders and by the
//! CLI's progress display.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default output location: `reelcat_<stamp>.mp4` in the directory above the
/// one holding `first_input`, falling back to the current directory.
#[must_use]
pub fn default_output_path(first_input: &Path, stamp: &str) -> PathBuf {
    let dir = first_input
        .parent()
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    dir.join(format!("reelcat_{stamp}.mp4"))
}

/// Formats a number the way the concat manifest and `-r` expect: plain
/// decimal notation, never an exponent, always with a decimal point
/// (`1.0`, `0.04`, `0.00005`).
#[must_use]
pub fn format_decimal(value: f64) -> String {
    let mut text = value.to_string();
    if value.is_finite() && !text.contains('.') {
        text.push_str(".0");
    }
    text
}

/// Formats seconds as HH:MM:SS (e.g., 3725.0 -> "01:02:05"). Returns "??:??:??" for invalid inputs.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??".to_string();
    }

    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats a remaining-time estimate as MM:SS, growing to H:MM:SS past an hour.
#[must_use]
pub fn format_eta(eta: Duration) -> String {
    let total = eta.as_secs();
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes:02}:{secs:02}")
    }
}

/// Formats bytes with appropriate binary units (B, KiB, MiB, GiB).
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes_f64 = bytes as f64;
    if bytes_f64 >= GIB {
        format!("{:.2} GiB", bytes_f64 / GIB)
    } else if bytes_f64 >= MIB {
        format!("{:.2} MiB", bytes_f64 / MIB)
    } else if bytes_f64 >= KIB {
        format!("{:.2} KiB", bytes_f64 / KIB)
    } else {
        format!("{bytes} B")
    }
}
