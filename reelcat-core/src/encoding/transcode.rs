//! Per-clip normalization.
//!
//! Every video input is re-encoded to the job codec, the target fps and
//! `yuv420p` (plus the resolved size, if any) so the concat demuxer can join
//! the clips without stream mismatches. Clips run sequentially in inventory
//! order; the first failure aborts the stage. Each run is monitored like the
//! final encode. A clip's frame count is not known up front, so its
//! snapshots carry frames and throughput but no percent.

use super::StageOutcome;
use crate::config::{OUTPUT_PIXEL_FORMAT, Resolution};
use crate::error::{CoreError, CoreResult};
use crate::external::{FfmpegSpawner, run_ffmpeg};
use crate::hardware::VideoCodec;
use crate::inventory::{MediaItem, MediaKind};
use crate::progress::{CancellationToken, MonitorOptions, ProgressSnapshot, ProgressTracker};
use crate::temp_files::TempArtifacts;
use crate::utils::format_decimal;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Common stream format every normalized clip is encoded to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipFormat {
    pub codec: VideoCodec,
    pub fps: f64,
    pub resolution: Option<Resolution>,
}

/// Builds `ffmpeg -y -i <in> -c:v <codec> -r <fps> -pix_fmt yuv420p [-s WxH] <out>`.
#[must_use]
pub fn build_transcode_command(input: &Path, output: &Path, format: &ClipFormat) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new();
    cmd.arg("-y");
    cmd.input(input.to_string_lossy().as_ref());
    cmd.args(["-c:v", format.codec.encoder_name()]);
    cmd.arg("-r");
    cmd.arg(format_decimal(format.fps));
    cmd.args(["-pix_fmt", OUTPUT_PIXEL_FORMAT]);
    if let Some(resolution) = format.resolution {
        cmd.arg("-s");
        cmd.arg(resolution.to_string());
    }
    cmd.output(output.to_string_lossy().as_ref());
    cmd
}

/// Normalizes every video item into a temporary clip.
///
/// Returns one entry per item: the clip path for videos, `None` for anything
/// else. Clip paths are registered with `artifacts` before ffmpeg starts so a
/// partial file is cleaned up too. `on_progress(clip, total, snapshot)` runs
/// on the monitor thread with the 1-based clip number; `on_clip(done, total)`
/// runs after each successful clip. Cancellation is checked before each clip.
pub fn transcode_videos<S, F, P>(
    spawner: &S,
    items: &[MediaItem],
    clip_format: &ClipFormat,
    artifacts: &mut TempArtifacts,
    cancel: &CancellationToken,
    mut on_clip: F,
    on_progress: P,
) -> CoreResult<StageOutcome<Vec<Option<PathBuf>>>>
where
    S: FfmpegSpawner,
    F: FnMut(usize, usize),
    P: Fn(usize, usize, ProgressSnapshot) + Clone + Send + 'static,
{
    let total = items.iter().filter(|i| i.kind == MediaKind::Video).count();
    let mut clips = Vec::with_capacity(items.len());
    let mut done = 0;

    for (index, item) in items.iter().enumerate() {
        if item.kind != MediaKind::Video {
            clips.push(None);
            continue;
        }
        if cancel.is_cancelled() {
            log::info!("Transcoding cancelled after {done} of {total} clip(s)");
            return Ok(StageOutcome::Cancelled);
        }

        let clip_number = done + 1;
        let clip_path = artifacts.new_path(&format!("clip_{index:04}"), "mp4");
        log::info!(
            "Transcoding clip {clip_number}/{total}: {}",
            item.path.display()
        );
        let cmd = build_transcode_command(&item.path, &clip_path, clip_format);
        let report = on_progress.clone();
        let monitor = MonitorOptions::new(
            ProgressTracker::new(0, Instant::now()),
            cancel.clone(),
            move |snapshot| report(clip_number, total, snapshot),
        );
        let run = run_ffmpeg(spawner, cmd, "clip transcode", Some(monitor))?;

        if !run.status.success() {
            log::error!("Transcoding {} failed: {}", item.path.display(), run.status);
            return Err(CoreError::TranscodeFailed {
                path: item.path.clone(),
                status: run.status.to_string(),
                diagnostics: run.diagnostics,
            });
        }

        done += 1;
        on_clip(done, total);
        clips.push(Some(clip_path));
    }

    Ok(StageOutcome::Completed(clips))
}
