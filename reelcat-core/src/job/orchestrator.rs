//! Runs conversion jobs off the caller's thread, one at a time.
//!
//! [`Orchestrator::submit`] validates synchronously, so parameter errors come
//! back before anything is spawned or written. Accepted jobs run on a
//! dedicated thread; the returned [`JobHandle`] carries the event stream, the
//! cancel switch and the final [`JobOutcome`].

use super::{ConversionJob, JobContext, JobEvent, JobOutcome};
use crate::config::{EncodingConfig, PipelineSettings};
use crate::error::{CoreError, CoreResult, command_start_error};
use crate::external::{FfmpegSpawner, FfprobeProber, MediaProber, SidecarSpawner};
use crate::inventory::InventorySnapshot;
use crate::progress::CancellationToken;
use crossbeam_channel::{Receiver, unbounded};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// Owns the collaborators and admits at most one running job.
pub struct Orchestrator<S, P> {
    spawner: Arc<S>,
    prober: Arc<P>,
    settings: PipelineSettings,
    busy: Arc<AtomicBool>,
}

impl Orchestrator<SidecarSpawner, FfprobeProber> {
    /// Orchestrator driving the real ffmpeg and ffprobe.
    #[must_use]
    pub fn with_defaults(settings: PipelineSettings) -> Self {
        Self::new(SidecarSpawner, FfprobeProber, settings)
    }
}

impl<S, P> Orchestrator<S, P>
where
    S: FfmpegSpawner + 'static,
    P: MediaProber + 'static,
{
    #[must_use]
    pub fn new(spawner: S, prober: P, settings: PipelineSettings) -> Self {
        Self {
            spawner: Arc::new(spawner),
            prober: Arc::new(prober),
            settings,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a job is currently running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Validates and starts a conversion of `snapshot` into `output_path`.
    ///
    /// Fails with `InvalidParameter` for unusable input and `JobInProgress`
    /// while another job runs. A new job is accepted once the previous
    /// handle's [`JobHandle::wait`] has returned.
    pub fn submit(
        &self,
        snapshot: InventorySnapshot,
        config: EncodingConfig,
        output_path: PathBuf,
    ) -> CoreResult<JobHandle> {
        let job = ConversionJob::new(snapshot, config, output_path, self.settings.clone());
        job.validate()?;

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::warn!("Rejected job submission: a conversion is already running");
            return Err(CoreError::JobInProgress);
        }
        let slot = BusySlot(Arc::clone(&self.busy));

        let (events_tx, events_rx) = unbounded();
        let cancel = CancellationToken::new();
        let spawner = Arc::clone(&self.spawner);
        let prober = Arc::clone(&self.prober);
        let job_cancel = cancel.clone();

        log::info!(
            "Starting conversion of {} item(s) into {}",
            job.snapshot.len(),
            job.output_path().display()
        );

        let thread = thread::Builder::new()
            .name("reelcat-job".to_string())
            .spawn(move || {
                let _slot = slot;
                let ctx = JobContext {
                    spawner: spawner.as_ref(),
                    prober: prober.as_ref(),
                    cancel: job_cancel,
                    events: events_tx,
                };
                job.run(&ctx)
            })
            .map_err(|e| command_start_error("job thread", e))?;

        Ok(JobHandle {
            events: events_rx,
            cancel,
            thread,
        })
    }
}

/// Clears the busy flag when the job thread ends, however it ends.
struct BusySlot(Arc<AtomicBool>);

impl Drop for BusySlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// The caller's side of a running job.
pub struct JobHandle {
    events: Receiver<JobEvent>,
    cancel: CancellationToken,
    thread: JoinHandle<JobOutcome>,
}

impl JobHandle {
    /// State changes, probe results and progress, in emission order.
    #[must_use]
    pub fn events(&self) -> &Receiver<JobEvent> {
        &self.events
    }

    /// Requests cancellation. Takes effect between stages and clips; a
    /// running ffmpeg process is left to finish.
    pub fn cancel(&self) {
        log::info!("Cancellation requested");
        self.cancel.cancel();
    }

    /// Token for requesting cancellation from another thread.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Blocks until the job ends.
    pub fn wait(self) -> JobOutcome {
        self.thread.join().unwrap_or_else(|_| {
            log::error!("Job thread panicked");
            JobOutcome::Failed(CoreError::Io(io::Error::other("job thread panicked")))
        })
    }
}
