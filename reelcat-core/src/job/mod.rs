// ============================================================================
// reelcat-core/src/job/mod.rs
// ============================================================================
//
// CONVERSION JOB: Lifecycle of One Conversion
//
// A job takes an inventory snapshot, an encoding config and an output path,
// and walks through
//
//   Validating -> Probing -> [Transcoding] -> Concatenating -> Succeeded
//
// with Failed and Cancelled reachable from any non-terminal state. Progress
// and state changes are delivered as `JobEvent`s over a channel; the owner
// keeps its inventory and applies `Probed` events to it by `ItemId`.
//
// Temporary artifacts are removed on every terminal state.

use crate::config::{EncodingConfig, PipelineSettings};
use crate::encoding::{
    ClipFormat, StageOutcome, build_concat_command, build_manifest, run_concat, transcode_videos,
    write_manifest,
};
use crate::error::{CoreError, CoreResult, invalid_parameter};
use crate::external::{FfmpegSpawner, MediaProber, probe_items};
use crate::hardware::select_job_codec;
use crate::inventory::{InventorySnapshot, ItemId, ProbeData};
use crate::params::{self, ResolvedParameters};
use crate::progress::{CancellationToken, MonitorOptions, ProgressSnapshot, ProgressTracker};
use crate::temp_files::TempArtifacts;
use crossbeam_channel::Sender;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

pub mod orchestrator;

pub use orchestrator::{JobHandle, Orchestrator};

/// Lifecycle state of a conversion job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Validating,
    Probing,
    Transcoding,
    Concatenating,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed | JobState::Cancelled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Idle => "idle",
            JobState::Validating => "validating",
            JobState::Probing => "probing",
            JobState::Transcoding => "transcoding",
            JobState::Concatenating => "concatenating",
            JobState::Succeeded => "succeeded",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Notifications a running job sends to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum JobEvent {
    State(JobState),
    /// New probe facts for the item with `id`.
    Probed { id: ItemId, probe: ProbeData },
    /// `done` of `total` video clips normalized.
    ClipTranscoded { done: usize, total: usize },
    /// Progress of the clip being normalized; percent stays at zero.
    ClipProgress {
        clip: usize,
        total: usize,
        snapshot: ProgressSnapshot,
    },
    /// Final-encode progress.
    Progress(ProgressSnapshot),
}

/// How a job ended.
#[derive(Debug)]
pub enum JobOutcome {
    Succeeded(PathBuf),
    Failed(CoreError),
    Cancelled,
}

impl JobOutcome {
    #[must_use]
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Succeeded(_) => JobState::Succeeded,
            JobOutcome::Failed(_) => JobState::Failed,
            JobOutcome::Cancelled => JobState::Cancelled,
        }
    }
}

/// Collaborators a job runs with.
pub struct JobContext<'a, S, P: ?Sized> {
    pub spawner: &'a S,
    pub prober: &'a P,
    pub cancel: CancellationToken,
    pub events: Sender<JobEvent>,
}

impl<S, P: ?Sized> JobContext<'_, S, P> {
    fn emit(&self, event: JobEvent) {
        // A dropped receiver only means nobody is watching.
        let _ = self.events.send(event);
    }

    fn enter(&self, state: JobState) {
        log::debug!("Job state: {state}");
        self.emit(JobEvent::State(state));
    }
}

/// One submitted conversion.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    snapshot: InventorySnapshot,
    config: EncodingConfig,
    output_path: PathBuf,
    settings: PipelineSettings,
}

impl ConversionJob {
    #[must_use]
    pub fn new(
        snapshot: InventorySnapshot,
        config: EncodingConfig,
        output_path: PathBuf,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            snapshot,
            config,
            output_path,
            settings,
        }
    }

    #[must_use]
    pub fn output_path(&self) -> &PathBuf {
        &self.output_path
    }

    /// Checks everything that can be checked without touching the disk or
    /// spawning anything.
    pub fn validate(&self) -> CoreResult<()> {
        if self.snapshot.is_empty() {
            return Err(invalid_parameter("no input files selected"));
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(invalid_parameter("no output path given"));
        }
        self.config.validate()
    }

    /// Runs the job to a terminal state and reports it.
    pub fn run<S, P>(self, ctx: &JobContext<'_, S, P>) -> JobOutcome
    where
        S: FfmpegSpawner,
        P: MediaProber + ?Sized,
    {
        ctx.enter(JobState::Validating);
        let outcome = match self.validate() {
            Ok(()) => self.execute(ctx),
            Err(e) => JobOutcome::Failed(e),
        };

        match &outcome {
            JobOutcome::Succeeded(path) => log::info!("Conversion finished: {}", path.display()),
            JobOutcome::Failed(e) => log::error!("Conversion failed: {e}"),
            JobOutcome::Cancelled => log::info!("Conversion cancelled"),
        }
        ctx.enter(outcome.state());
        outcome
    }

    fn execute<S, P>(&self, ctx: &JobContext<'_, S, P>) -> JobOutcome
    where
        S: FfmpegSpawner,
        P: MediaProber + ?Sized,
    {
        ctx.enter(JobState::Probing);
        let probes = probe_items(ctx.prober, self.snapshot.items());
        for (item, probe) in self.snapshot.items().iter().zip(&probes) {
            if !probe.is_empty() {
                ctx.emit(JobEvent::Probed {
                    id: item.id,
                    probe: *probe,
                });
            }
        }
        let snapshot = self.snapshot.with_probes(&probes);

        let params = match params::resolve(&self.config, snapshot.items()) {
            Ok(params) => params,
            Err(e) => return JobOutcome::Failed(e),
        };
        if ctx.cancel.is_cancelled() {
            return JobOutcome::Cancelled;
        }

        let mut artifacts = match TempArtifacts::create(&self.settings) {
            Ok(artifacts) => artifacts,
            Err(e) => return JobOutcome::Failed(e),
        };

        let result = self.encode(&snapshot, &params, &mut artifacts, ctx);
        // Deletion failures are logged by cleanup and never replace the outcome.
        let _ = artifacts.cleanup();

        match result {
            Ok(StageOutcome::Completed(())) => JobOutcome::Succeeded(self.output_path.clone()),
            Ok(StageOutcome::Cancelled) => JobOutcome::Cancelled,
            Err(e) => JobOutcome::Failed(e),
        }
    }

    fn encode<S, P>(
        &self,
        snapshot: &InventorySnapshot,
        params: &ResolvedParameters,
        artifacts: &mut TempArtifacts,
        ctx: &JobContext<'_, S, P>,
    ) -> CoreResult<StageOutcome<()>>
    where
        S: FfmpegSpawner,
        P: MediaProber + ?Sized,
    {
        let codec = select_job_codec(
            self.config.use_hardware_encoder,
            &self.settings.hardware_probe_tool,
        );
        log::info!("Using encoder {}", codec.encoder_name());

        let items = snapshot.items();
        let clips = if snapshot.has_video() {
            ctx.enter(JobState::Transcoding);
            let clip_format = ClipFormat {
                codec,
                fps: self.config.fps,
                resolution: params.resolution,
            };
            let events = ctx.events.clone();
            let progress_events = ctx.events.clone();
            let stage = transcode_videos(
                ctx.spawner,
                items,
                &clip_format,
                artifacts,
                &ctx.cancel,
                |done, total| {
                    let _ = events.send(JobEvent::ClipTranscoded { done, total });
                },
                move |clip, total, snapshot| {
                    let _ = progress_events.send(JobEvent::ClipProgress {
                        clip,
                        total,
                        snapshot,
                    });
                },
            )?;
            match stage {
                StageOutcome::Completed(clips) => clips,
                StageOutcome::Cancelled => return Ok(StageOutcome::Cancelled),
            }
        } else {
            vec![None; items.len()]
        };

        if ctx.cancel.is_cancelled() {
            return Ok(StageOutcome::Cancelled);
        }

        ctx.enter(JobState::Concatenating);
        let manifest = build_manifest(items, &clips, self.config.fps)?;
        let manifest_path = artifacts.new_path("manifest", "txt");
        write_manifest(&manifest_path, &manifest)?;

        let cmd = build_concat_command(
            &manifest_path,
            &self.output_path,
            self.config.fps,
            codec,
            params,
        );
        let events = ctx.events.clone();
        let monitor = MonitorOptions::new(
            ProgressTracker::new(items.len(), Instant::now()),
            ctx.cancel.clone(),
            move |snapshot| {
                let _ = events.send(JobEvent::Progress(snapshot));
            },
        );
        run_concat(ctx.spawner, cmd, monitor)?;

        // Cancellation does not stop a running encode; it only decides how
        // the job is reported once the encode has exited.
        if ctx.cancel.is_cancelled() {
            return Ok(StageOutcome::Cancelled);
        }
        Ok(StageOutcome::Completed(()))
    }
}
