// ============================================================================
// reelcat-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Conversion Pipeline
//
// Every fallible operation in reelcat-core returns `CoreResult<T>`. Probe
// failures never show up here: probing is best-effort and degrades to `None`.
//
// KEY COMPONENTS:
// - CoreError: the error taxonomy of the pipeline
// - Helper constructors for process spawn/wait failures

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the conversion pipeline.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Bad fps/bitrate/target size/resolution, or an empty inventory.
    /// Always raised before any subprocess is spawned.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An insertion would have mixed images and videos in one inventory.
    #[error("Cannot mix images and videos in one conversion: {0}")]
    MixedMediaKind(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, #[source] io::Error),

    #[error("Failed while waiting for {0}: {1}")]
    CommandWait(String, #[source] io::Error),

    /// A per-clip normalization pass exited non-zero.
    #[error("Transcoding {} failed ({status}): {diagnostics}", .path.display())]
    TranscodeFailed {
        path: PathBuf,
        status: String,
        diagnostics: String,
    },

    /// The final concat pass exited non-zero. Carries ffmpeg's diagnostic
    /// output verbatim.
    #[error("FFmpeg error: {0}")]
    EncodeFailed(String),

    /// Creating or deleting a temporary artifact failed.
    #[error("File system error on {}: {source}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("A conversion job is already running")]
    JobInProgress,
}

/// Result type for reelcat-core operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Builds the error for a command that could not be spawned.
pub fn command_start_error(cmd_name: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandStart(cmd_name.into(), err)
}

/// Builds the error for a command whose exit status could not be collected.
pub fn command_wait_error(cmd_name: impl Into<String>, err: io::Error) -> CoreError {
    CoreError::CommandWait(cmd_name.into(), err)
}

/// Builds an `InvalidParameter` error from anything displayable.
pub fn invalid_parameter(message: impl Into<String>) -> CoreError {
    CoreError::InvalidParameter(message.into())
}
