// ============================================================================
// reelcat-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// The CLI reuses reelcat-core's error type and adds user-facing wording on
// top of it when reporting a failure.
//
// KEY COMPONENTS:
// - CliResult: Type alias for CLI operations
// - user_message: one-line explanation plus an optional hint

// ---- Internal crate imports ----
use reelcat_core::{CoreError, CoreResult};

// ---- Standard library imports ----
use std::io;

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

// ============================================================================
// USER-FACING MESSAGES
// ============================================================================

/// Message and optional hint shown when a command fails.
pub fn user_message(error: &CoreError) -> (String, Option<&'static str>) {
    let hint = match error {
        CoreError::CommandStart(_, source) if source.kind() == io::ErrorKind::NotFound => {
            Some("Install ffmpeg and ffprobe, or place them next to the reelcat executable.")
        }
        CoreError::MixedMediaKind(_) => {
            Some("Convert images and video clips in separate runs.")
        }
        CoreError::JobInProgress => Some("Wait for the running conversion to finish."),
        _ => None,
    };
    (error.to_string(), hint)
}
