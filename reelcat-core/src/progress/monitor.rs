//! Producer and consumer threads around one ffmpeg run.
//!
//! The [`DiagnosticReader`] owns the child's stderr and runs ffmpeg-sidecar's
//! [`FfmpegLogParser`] over it until EOF. Frame counts from progress events
//! go into an unbounded channel; log lines are kept as the run's transcript.
//! The [`ProgressMonitor`] wakes every [`PROGRESS_POLL_INTERVAL`], drains the
//! channel in order, feeds the tracker and reports a snapshot when anything
//! changed. It stops when the channel disconnects or the job is cancelled.

use super::{CancellationToken, PROGRESS_POLL_INTERVAL, ProgressSnapshot, ProgressTracker};
use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use ffmpeg_sidecar::event::FfmpegEvent;
use ffmpeg_sidecar::log_parser::FfmpegLogParser;
use std::io::Read;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Callback receiving progress snapshots on the monitor thread.
pub type ProgressCallback = Box<dyn FnMut(ProgressSnapshot) + Send>;

/// Everything a monitored run needs besides the frame counts themselves.
pub struct MonitorOptions {
    pub tracker: ProgressTracker,
    pub cancel: CancellationToken,
    pub on_update: ProgressCallback,
}

impl MonitorOptions {
    pub fn new<F>(tracker: ProgressTracker, cancel: CancellationToken, on_update: F) -> Self
    where
        F: FnMut(ProgressSnapshot) + Send + 'static,
    {
        Self {
            tracker,
            cancel,
            on_update: Box::new(on_update),
        }
    }
}

/// Thread parsing a diagnostic stream to EOF.
pub struct DiagnosticReader {
    handle: JoinHandle<String>,
}

impl DiagnosticReader {
    /// Starts parsing `stream`; reported frame counts arrive on the returned
    /// receiver in emission order.
    pub fn spawn<R: Read + Send + 'static>(stream: R) -> (Self, Receiver<u64>) {
        let (tx, rx) = unbounded();
        let handle = thread::spawn(move || read_events(stream, &tx));
        (Self { handle }, rx)
    }

    /// Waits for EOF and returns the transcript, one log line per `\n`.
    pub fn finish(self) -> String {
        self.handle.join().unwrap_or_else(|_| {
            log::error!("Diagnostic reader thread panicked");
            String::new()
        })
    }
}

fn read_events<R: Read>(stream: R, tx: &Sender<u64>) -> String {
    let mut parser = FfmpegLogParser::new(stream);
    let mut transcript = String::new();

    loop {
        match parser.parse_next_event() {
            Ok(FfmpegEvent::LogEOF) => break,
            Ok(FfmpegEvent::Progress(progress)) => {
                // The consumer may already be gone after a cancel; keep draining anyway.
                let _ = tx.send(u64::from(progress.frame));
            }
            Ok(FfmpegEvent::Log(_, line) | FfmpegEvent::Error(line)) => {
                if !line.trim().is_empty() {
                    transcript.push_str(&line);
                    transcript.push('\n');
                }
            }
            Ok(_) => {}
            Err(e) => {
                log::debug!("Stopped reading diagnostics: {e}");
                break;
            }
        }
    }

    transcript
}

/// Thread turning frame counts into progress snapshots.
pub struct ProgressMonitor {
    handle: JoinHandle<ProgressTracker>,
}

impl ProgressMonitor {
    pub fn start(frames: Receiver<u64>, options: MonitorOptions) -> Self {
        let MonitorOptions {
            mut tracker,
            cancel,
            mut on_update,
        } = options;

        let handle = thread::spawn(move || {
            let ticker = crossbeam_channel::tick(PROGRESS_POLL_INTERVAL);
            loop {
                let _ = ticker.recv();
                if cancel.is_cancelled() {
                    log::debug!("Progress monitoring stopped by cancellation");
                    break;
                }

                let mut updated = false;
                let mut disconnected = false;
                loop {
                    match frames.try_recv() {
                        Ok(frame) => {
                            tracker.observe_frame(frame, Instant::now());
                            updated = true;
                        }
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => {
                            disconnected = true;
                            break;
                        }
                    }
                }

                if updated {
                    on_update(tracker.snapshot());
                }
                if disconnected {
                    break;
                }
            }
            tracker
        });

        Self { handle }
    }

    /// Waits for the monitor to stop and returns the final tracker.
    pub fn finish(self) -> Option<ProgressTracker> {
        match self.handle.join() {
            Ok(tracker) => Some(tracker),
            Err(_) => {
                log::error!("Progress monitor thread panicked");
                None
            }
        }
    }
}
