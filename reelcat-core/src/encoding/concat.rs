//! Concat manifest and the final encode.
//!
//! The manifest lists one `file '<path>'` entry per item in inventory order.
//! Image entries are followed by `duration <1/fps>` so each image occupies
//! exactly one frame slot; clip entries carry their own timing.

use crate::config::OUTPUT_PIXEL_FORMAT;
use crate::error::{CoreError, CoreResult, invalid_parameter};
use crate::external::{FfmpegSpawner, run_ffmpeg};
use crate::hardware::VideoCodec;
use crate::inventory::{MediaItem, MediaKind};
use crate::params::ResolvedParameters;
use crate::progress::MonitorOptions;
use crate::utils::format_decimal;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Quotes a path for a concat manifest `file` directive.
///
/// Inside single quotes the only special character is `'` itself, written
/// as `'\''` (close, escaped quote, reopen).
#[must_use]
pub fn escape_manifest_path(path: &Path) -> String {
    format!("'{}'", path.to_string_lossy().replace('\'', r"'\''"))
}

/// Builds the manifest text for `items`.
///
/// `clips` holds the normalized clip for each video item (see
/// `transcode_videos`). Relative paths are made absolute because the demuxer
/// resolves them against the manifest's own directory.
pub fn build_manifest(items: &[MediaItem], clips: &[Option<PathBuf>], fps: f64) -> CoreResult<String> {
    let frame_duration = format_decimal(1.0 / fps);
    let mut manifest = String::new();

    for (index, item) in items.iter().enumerate() {
        let source = match item.kind {
            MediaKind::Image => item.path.clone(),
            MediaKind::Video => clips.get(index).cloned().flatten().ok_or_else(|| {
                invalid_parameter(format!(
                    "no normalized clip for {}",
                    item.path.display()
                ))
            })?,
        };
        let source = std::path::absolute(&source).unwrap_or(source);

        let _ = writeln!(manifest, "file {}", escape_manifest_path(&source));
        if item.kind == MediaKind::Image {
            let _ = writeln!(manifest, "duration {frame_duration}");
        }
    }

    Ok(manifest)
}

/// Writes the manifest to `path`.
pub fn write_manifest(path: &Path, contents: &str) -> CoreResult<()> {
    std::fs::write(path, contents).map_err(|source| CoreError::FileSystem {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Wrote concat manifest {}", path.display());
    Ok(())
}

/// Builds the final encode:
/// `ffmpeg -y -r <fps> -f concat -safe 0 -i <manifest> -c:v <codec> <rate args> [-s WxH] -pix_fmt yuv420p <out>`.
#[must_use]
pub fn build_concat_command(
    manifest: &Path,
    output: &Path,
    fps: f64,
    codec: VideoCodec,
    params: &ResolvedParameters,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.arg("-y");
    cmd.arg("-r");
    cmd.arg(format_decimal(fps));
    cmd.args(["-f", "concat", "-safe", "0"]);
    cmd.input(manifest.to_string_lossy().as_ref());
    cmd.args(["-c:v", codec.encoder_name()]);
    cmd.args(codec.rate_control_args(params.bitrate_kbps));
    if let Some(resolution) = params.resolution {
        cmd.arg("-s");
        cmd.arg(resolution.to_string());
    }
    cmd.args(["-pix_fmt", OUTPUT_PIXEL_FORMAT]);
    cmd.output(output.to_string_lossy().as_ref());
    cmd
}

/// Runs the final encode with progress monitoring.
///
/// A non-zero exit becomes `EncodeFailed` carrying ffmpeg's diagnostics.
pub fn run_concat<S: FfmpegSpawner>(
    spawner: &S,
    cmd: FfmpegCommand,
    monitor: MonitorOptions,
) -> CoreResult<()> {
    let run = run_ffmpeg(spawner, cmd, "final encode", Some(monitor))?;
    if run.status.success() {
        Ok(())
    } else {
        log::error!("Final encode failed: {}", run.status);
        Err(CoreError::EncodeFailed(run.diagnostics))
    }
}
