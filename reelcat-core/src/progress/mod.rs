// ============================================================================
// reelcat-core/src/progress/mod.rs
// ============================================================================
//
// PROGRESS: Frame-Based Progress Tracking for ffmpeg Runs
//
// ffmpeg-sidecar's log parser turns ffmpeg's status lines into frame counts.
// The tracker turns those counts into percent complete, throughput and a
// remaining-time estimate. Throughput and ETA are only recomputed when at
// least `MIN_SAMPLE_INTERVAL` has passed since the previous sample, so bursts
// of updates cannot produce division by near-zero intervals.
//
// KEY COMPONENTS:
// - ProgressTracker / ProgressSnapshot: the computation and its output
// - CancellationToken: cooperative stop signal shared with the monitor
// - monitor: the reader and consumer threads around one ffmpeg run

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub mod monitor;

pub use monitor::{DiagnosticReader, MonitorOptions, ProgressCallback, ProgressMonitor};

/// How often the consumer drains the line queue.
pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Minimum spacing between samples used for fps and ETA.
pub const MIN_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Frame counter reading taken at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSample {
    pub frame_index: u64,
    pub at: Instant,
}

/// What the display needs after an update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSnapshot {
    pub current_frame: u64,
    pub total_units: u64,
    /// 0.0 to 100.0.
    pub percent: f64,
    /// Frames per second between the last two samples.
    pub fps: Option<f64>,
    /// Remaining time; `None` until some progress exists.
    pub eta: Option<Duration>,
    pub elapsed: Duration,
}

/// Progress of one monitored ffmpeg run.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    total_units: u64,
    started: Instant,
    last_sample: ProgressSample,
    last_seen: Instant,
    current_frame: u64,
    percent: f64,
    fps: Option<f64>,
    eta: Option<Duration>,
}

impl ProgressTracker {
    /// Starts tracking an encode of `total_units` frame slots begun at `started`.
    /// With `total_units` 0 only the frame count and throughput move.
    #[must_use]
    pub fn new(total_units: usize, started: Instant) -> Self {
        Self {
            total_units: total_units as u64,
            started,
            last_sample: ProgressSample {
                frame_index: 0,
                at: started,
            },
            last_seen: started,
            current_frame: 0,
            percent: 0.0,
            fps: None,
            eta: None,
        }
    }

    /// Records that ffmpeg reached `frame` at `now`.
    pub fn observe_frame(&mut self, frame: u64, now: Instant) {
        self.current_frame = frame;
        self.last_seen = now;
        self.percent = if self.total_units == 0 {
            0.0
        } else {
            (100.0 * frame as f64 / self.total_units as f64).min(100.0)
        };

        let since_last = now.saturating_duration_since(self.last_sample.at);
        if since_last < MIN_SAMPLE_INTERVAL {
            return;
        }

        let frames = frame.saturating_sub(self.last_sample.frame_index);
        self.fps = Some(frames as f64 / since_last.as_secs_f64());

        let elapsed = now.saturating_duration_since(self.started).as_secs_f64();
        self.eta = (self.percent > 0.0).then(|| {
            let remaining = elapsed * 100.0 / self.percent - elapsed;
            Duration::from_secs_f64(remaining.max(0.0))
        });

        self.last_sample = ProgressSample {
            frame_index: frame,
            at: now,
        };
    }

    #[must_use]
    pub fn last_sample(&self) -> ProgressSample {
        self.last_sample
    }

    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            current_frame: self.current_frame,
            total_units: self.total_units,
            percent: self.percent,
            fps: self.fps,
            eta: self.eta,
            elapsed: self.last_seen.saturating_duration_since(self.started),
        }
    }
}

/// Shared stop flag for a job and the threads working for it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_clamps_and_eta() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(100, start);

        tracker.observe_frame(25, start + Duration::from_secs(1));
        let snap = tracker.snapshot();
        assert_eq!(snap.percent, 25.0);
        assert_eq!(snap.fps, Some(25.0));
        // 1s for 25% leaves 3s.
        assert_eq!(snap.eta, Some(Duration::from_secs(3)));

        tracker.observe_frame(250, start + Duration::from_secs(2));
        assert_eq!(tracker.snapshot().percent, 100.0);
        assert_eq!(tracker.snapshot().eta, Some(Duration::ZERO));
    }

    #[test]
    fn test_samples_closer_than_interval_only_move_percent() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(10, start);

        tracker.observe_frame(1, start + Duration::from_millis(100));
        let snap = tracker.snapshot();
        assert_eq!(snap.percent, 10.0);
        assert_eq!(snap.fps, None);
        assert_eq!(snap.eta, None);
        assert_eq!(tracker.last_sample().frame_index, 0);

        tracker.observe_frame(5, start + Duration::from_millis(600));
        assert_eq!(tracker.last_sample().frame_index, 5);
        assert!(tracker.snapshot().fps.is_some());
    }

    #[test]
    fn test_no_eta_without_progress() {
        let start = Instant::now();
        let mut tracker = ProgressTracker::new(10, start);
        tracker.observe_frame(0, start + Duration::from_secs(1));
        let snap = tracker.snapshot();
        assert_eq!(snap.percent, 0.0);
        assert_eq!(snap.fps, Some(0.0));
        assert_eq!(snap.eta, None);
    }

    #[test]
    fn test_cancellation_token_is_shared() {
        let token = CancellationToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
