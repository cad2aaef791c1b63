// ============================================================================
// reelcat-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with ffmpeg and ffprobe
//
// This module encapsulates every interaction with the external command-line
// tools. The pipeline only talks to them through the `FfmpegSpawner` and
// `MediaProber` traits, so tests can substitute scripted implementations.
//
// KEY COMPONENTS:
// - FfmpegSpawner / FfmpegProcess: spawning ffmpeg and collecting its exit
// - run_ffmpeg: one ffmpeg run with its diagnostic stream drained concurrently
// - MediaProber / FfprobeProber: best-effort dimension and bitrate discovery
// - Dependency checking functions

use crate::error::{CoreError, CoreResult};
use std::io;
use std::process::{Command, Stdio};

/// Traits and implementations for spawning ffmpeg processes
pub mod ffmpeg_executor;

/// Traits and implementations for probing media with ffprobe
pub mod ffprobe_executor;

pub use ffmpeg_executor::{
    FfmpegProcess, FfmpegRun, FfmpegSpawner, SidecarProcess, SidecarSpawner, command_line,
    run_ffmpeg,
};
pub use ffprobe_executor::{FfprobeProber, MediaProber, parse_bitrate_kbps, probe_items};

/// Checks that `cmd_name -version` can be started.
///
/// A missing tool surfaces as `CommandStart` wrapping `io::ErrorKind::NotFound`.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {cmd_name}");
            Ok(())
        }
        Err(e) => {
            if e.kind() == io::ErrorKind::NotFound {
                log::warn!("Dependency '{cmd_name}' not found.");
            } else {
                log::error!("Failed to start dependency check command '{cmd_name}': {e}");
            }
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

/// Checks for both ffmpeg (as resolved by ffmpeg-sidecar) and ffprobe.
pub fn check_dependencies() -> CoreResult<()> {
    if !ffmpeg_sidecar::command::ffmpeg_is_installed() {
        log::warn!("Dependency 'ffmpeg' not found.");
        return Err(CoreError::CommandStart(
            "ffmpeg".to_string(),
            io::Error::new(io::ErrorKind::NotFound, "ffmpeg is not installed"),
        ));
    }
    check_dependency("ffprobe")
}
