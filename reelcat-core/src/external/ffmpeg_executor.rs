// ============================================================================
// reelcat-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// This module provides abstractions for spawning ffmpeg and running it to
// completion while its diagnostic stream is drained on a reader thread.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar
// - run_ffmpeg: spawn, drain, optionally monitor, wait
//
// ARCHITECTURE:
// ffmpeg writes its progress and errors to stderr. The reader thread is the
// only consumer of that stream; it parses it with ffmpeg-sidecar's log
// parser, forwards frame counts to a channel and keeps the log lines for
// error reporting. A progress monitor, when asked for, consumes the channel
// on its own thread.

use crate::error::{CoreResult, command_start_error, command_wait_error};
use crate::progress::{DiagnosticReader, MonitorOptions, ProgressMonitor, ProgressTracker};
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::io::Read;
use std::process::{ExitStatus, Stdio};

// --- FFmpeg Execution Abstraction ---

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Hands out the diagnostic (stderr) stream. Only the first call returns it.
    fn take_diagnostics(&mut self) -> Option<Box<dyn Read + Send>>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner: Send + Sync {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn take_diagnostics(&mut self) -> Option<Box<dyn Read + Send>> {
        self.0
            .take_stderr()
            .map(|stderr| Box::new(stderr) as Box<dyn Read + Send>)
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
///
/// ffmpeg-sidecar resolves the binary next to the running executable first,
/// then on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        // Nothing reads stdout, and an inherited stdin would let ffmpeg
        // consume keystrokes meant for the terminal.
        cmd.as_inner_mut().stdout(Stdio::null()).stdin(Stdio::null());
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))
    }
}

// --- Running ---

/// Exit status and full diagnostic transcript of one ffmpeg run.
#[derive(Debug)]
pub struct FfmpegRun {
    pub status: ExitStatus,
    pub diagnostics: String,
    /// Final tracker state when the run was monitored.
    pub tracker: Option<ProgressTracker>,
}

/// Renders the arguments of `cmd` as one line for logging.
pub fn command_line(cmd: &mut FfmpegCommand) -> String {
    cmd.as_inner()
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Spawns `cmd`, drains its diagnostics until exit and waits for it.
///
/// With `monitor` set, diagnostic lines also feed a progress monitor running
/// on its own thread. A non-zero exit is not an error here; callers map it to
/// their stage's failure.
pub fn run_ffmpeg<S: FfmpegSpawner>(
    spawner: &S,
    mut cmd: FfmpegCommand,
    label: &str,
    monitor: Option<MonitorOptions>,
) -> CoreResult<FfmpegRun> {
    log::debug!("Running {label}: ffmpeg {}", command_line(&mut cmd));

    let mut process = spawner.spawn(cmd)?;
    let (reader, frames) = match process.take_diagnostics() {
        Some(stream) => DiagnosticReader::spawn(stream),
        None => DiagnosticReader::spawn(std::io::empty()),
    };
    let monitor = monitor.map(|options| ProgressMonitor::start(frames, options));

    let status = process.wait();
    let diagnostics = reader.finish();
    let tracker = monitor.and_then(ProgressMonitor::finish);
    let status = status?;

    log::debug!("{label} exited with {status}");
    Ok(FfmpegRun {
        status,
        diagnostics,
        tracker,
    })
}
