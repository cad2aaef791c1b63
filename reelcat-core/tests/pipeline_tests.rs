// reelcat-core/tests/pipeline_tests.rs
//
// End-to-end job runs through the orchestrator with mocked ffmpeg/ffprobe.

#![cfg(unix)]

mod common;

use common::{
    MockFfmpegSpawner, MockProber, arg_after, entries_in, progress_line, settings_in,
};
use crossbeam_channel::bounded;
use reelcat_core::config::{EncodingConfig, EncodingConfigBuilder};
use reelcat_core::error::CoreError;
use reelcat_core::inventory::{InventorySnapshot, MediaInventory};
use reelcat_core::job::{JobEvent, JobHandle, JobOutcome, JobState, Orchestrator};
use std::path::{Path, PathBuf};
use tempfile::tempdir;

fn software_config(fps: f64) -> EncodingConfig {
    EncodingConfigBuilder::new()
        .fps(fps)
        .use_hardware_encoder(false)
        .build()
}

fn touch_all(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(name);
            std::fs::write(&path, b"x").unwrap();
            path
        })
        .collect()
}

fn snapshot_of(paths: &[PathBuf]) -> InventorySnapshot {
    let mut inventory = MediaInventory::new();
    inventory.add(paths.iter().cloned()).unwrap();
    inventory.snapshot()
}

fn drain(handle: JobHandle) -> (Vec<JobEvent>, JobOutcome) {
    let events: Vec<JobEvent> = handle.events().iter().collect();
    (events, handle.wait())
}

fn states(events: &[JobEvent]) -> Vec<JobState> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::State(state) => Some(*state),
            _ => None,
        })
        .collect()
}

#[test]
fn test_three_images_at_one_fps() {
    let inputs = tempdir().unwrap();
    let work = tempdir().unwrap();
    let paths = touch_all(inputs.path(), &["a.png", "b.png", "c.png"]);
    let output = inputs.path().join("out.mp4");

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("concat", &progress_line(3), true);
    let prober = MockProber::new()
        .with_dimensions(&paths[0], 640, 480)
        .with_dimensions(&paths[2], 800, 400);

    let orchestrator = Orchestrator::new(spawner.clone(), prober, settings_in(work.path()));
    let handle = orchestrator
        .submit(snapshot_of(&paths), software_config(1.0), output.clone())
        .unwrap();
    let (events, outcome) = drain(handle);

    match outcome {
        JobOutcome::Succeeded(path) => assert_eq!(path, output),
        other => panic!("expected success, got {other:?}"),
    }
    assert_eq!(
        states(&events),
        [
            JobState::Validating,
            JobState::Probing,
            JobState::Concatenating,
            JobState::Succeeded
        ]
    );

    let manifests = spawner.get_manifests();
    assert_eq!(manifests.len(), 1);
    let expected: String = paths
        .iter()
        .map(|p| format!("file '{}'\nduration 1.0\n", p.display()))
        .collect();
    assert_eq!(manifests[0], expected);

    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 1);
    let args = &calls[0];
    assert_eq!(arg_after(args, "-r"), Some("1.0"));
    assert_eq!(arg_after(args, "-safe"), Some("0"));
    assert_eq!(arg_after(args, "-s"), Some("800x480"));
    assert_eq!(arg_after(args, "-b:v"), Some("20000k"));
    assert_eq!(arg_after(args, "-c:v"), Some("libx264"));
    assert_eq!(args.last().map(PathBuf::from), Some(output.clone()));

    let probed = events
        .iter()
        .filter(|e| matches!(e, JobEvent::Probed { .. }))
        .count();
    assert_eq!(probed, 2);
    assert!(events.iter().any(|e| matches!(
        e,
        JobEvent::Progress(snap) if snap.current_frame == 3 && snap.percent == 100.0
    )));

    assert!(output.exists());
    assert_eq!(entries_in(work.path()), 0, "work directory must be removed");
}

#[test]
fn test_video_clips_are_normalized_then_joined() {
    let inputs = tempdir().unwrap();
    let work = tempdir().unwrap();
    let paths = touch_all(inputs.path(), &["one.mp4", "two.mov"]);
    let output = inputs.path().join("joined.mp4");

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("clip_0000", "", true);
    spawner.add_success_expectation("clip_0001", "", true);
    spawner.add_success_expectation("concat", "", true);
    let prober = MockProber::new()
        .with_dimensions(&paths[0], 1920, 1080)
        .with_bitrate(&paths[0], 4000)
        .with_bitrate(&paths[1], 6000);

    let orchestrator = Orchestrator::new(spawner.clone(), prober, settings_in(work.path()));
    let handle = orchestrator
        .submit(snapshot_of(&paths), software_config(30.0), output.clone())
        .unwrap();
    let (events, outcome) = drain(handle);

    assert!(matches!(outcome, JobOutcome::Succeeded(_)), "{outcome:?}");
    assert_eq!(
        states(&events),
        [
            JobState::Validating,
            JobState::Probing,
            JobState::Transcoding,
            JobState::Concatenating,
            JobState::Succeeded
        ]
    );
    let clip_events: Vec<(usize, usize)> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::ClipTranscoded { done, total } => Some((*done, *total)),
            _ => None,
        })
        .collect();
    assert_eq!(clip_events, [(1, 2), (2, 2)]);

    let calls = spawner.get_received_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(arg_after(&calls[0], "-i"), Some(paths[0].to_str().unwrap()));
    assert_eq!(arg_after(&calls[0], "-s"), Some("1920x1080"));
    assert_eq!(arg_after(&calls[2], "-b:v"), Some("5000k"));

    let clip_outputs: Vec<&String> = calls[..2].iter().map(|c| c.last().unwrap()).collect();
    let manifest = &spawner.get_manifests()[0];
    let expected: String = clip_outputs
        .iter()
        .map(|clip| format!("file '{clip}'\n"))
        .collect();
    assert_eq!(manifest, &expected);
    assert!(!manifest.contains("duration"));

    assert_eq!(entries_in(work.path()), 0);
}

#[test]
fn test_empty_inventory_is_rejected_without_side_effects() {
    let work = tempdir().unwrap();
    let spawner = MockFfmpegSpawner::new();
    let prober = MockProber::new();
    let orchestrator = Orchestrator::new(spawner.clone(), prober.clone(), settings_in(work.path()));

    let result = orchestrator.submit(
        InventorySnapshot::default(),
        software_config(30.0),
        work.path().join("out.mp4"),
    );

    assert!(matches!(result, Err(CoreError::InvalidParameter(_))));
    assert!(spawner.get_received_calls().is_empty());
    assert_eq!(prober.call_count(), 0);
    assert_eq!(entries_in(work.path()), 0);
    assert!(!orchestrator.is_busy());
}

#[test]
fn test_invalid_fps_is_rejected_at_submission() {
    let inputs = tempdir().unwrap();
    let paths = touch_all(inputs.path(), &["a.png"]);
    let spawner = MockFfmpegSpawner::new();
    let orchestrator = Orchestrator::new(spawner.clone(), MockProber::new(), settings_in(inputs.path()));

    let result = orchestrator.submit(
        snapshot_of(&paths),
        software_config(0.0),
        inputs.path().join("out.mp4"),
    );
    assert!(matches!(result, Err(CoreError::InvalidParameter(_))));
    assert!(spawner.get_received_calls().is_empty());
}

#[test]
fn test_transcode_failure_cleans_up() {
    let inputs = tempdir().unwrap();
    let work = tempdir().unwrap();
    let paths = touch_all(inputs.path(), &["a.mp4", "b.mp4"]);
    let output = inputs.path().join("out.mp4");

    let spawner = MockFfmpegSpawner::new();
    spawner.add_success_expectation("clip_0000", "", true);
    spawner.add_exit_error_expectation("clip_0001", "moov atom not found\n", 1);

    let orchestrator = Orchestrator::new(spawner.clone(), MockProber::new(), settings_in(work.path()));
    let handle = orchestrator
        .submit(snapshot_of(&paths), software_config(30.0), output.clone())
        .unwrap();
    let (events, outcome) = drain(handle);

    match outcome {
        JobOutcome::Failed(CoreError::TranscodeFailed {
            path, diagnostics, ..
        }) => {
            assert_eq!(path, paths[1]);
            assert!(diagnostics.contains("moov atom not found"));
        }
        other => panic!("expected TranscodeFailed, got {other:?}"),
    }
    assert_eq!(states(&events).last(), Some(&JobState::Failed));
    assert!(!states(&events).contains(&JobState::Concatenating));
    assert_eq!(spawner.get_received_calls().len(), 2);
    assert_eq!(entries_in(work.path()), 0);
    assert!(!output.exists());
}

#[test]
fn test_encode_failure_carries_diagnostics() {
    let inputs = tempdir().unwrap();
    let work = tempdir().unwrap();
    let paths = touch_all(inputs.path(), &["a.png", "b.png"]);

    let spawner = MockFfmpegSpawner::new();
    spawner.add_exit_error_expectation("concat", "Unknown encoder 'libx264'\n", 1);

    let orchestrator = Orchestrator::new(spawner, MockProber::new(), settings_in(work.path()));
    let handle = orchestrator
        .submit(
            snapshot_of(&paths),
            software_config(30.0),
            inputs.path().join("out.mp4"),
        )
        .unwrap();
    let (_, outcome) = drain(handle);

    match outcome {
        JobOutcome::Failed(CoreError::EncodeFailed(diagnostics)) => {
            assert!(diagnostics.contains("Unknown encoder 'libx264'"));
        }
        other => panic!("expected EncodeFailed, got {other:?}"),
    }
    assert_eq!(entries_in(work.path()), 0);
}

#[test]
fn test_second_job_is_rejected_while_one_runs() {
    let inputs = tempdir().unwrap();
    let work = tempdir().unwrap();
    let paths = touch_all(inputs.path(), &["a.png"]);

    let (release, gate) = bounded::<()>(0);
    let spawner = MockFfmpegSpawner::new();
    spawner.add_gated_expectation("concat", gate);
    spawner.add_success_expectation("concat", "", true);

    let orchestrator = Orchestrator::new(spawner, MockProber::new(), settings_in(work.path()));
    let first = orchestrator
        .submit(
            snapshot_of(&paths),
            software_config(30.0),
            inputs.path().join("first.mp4"),
        )
        .unwrap();
    assert!(orchestrator.is_busy());

    let second = orchestrator.submit(
        snapshot_of(&paths),
        software_config(30.0),
        inputs.path().join("second.mp4"),
    );
    assert!(matches!(second, Err(CoreError::JobInProgress)));

    drop(release);
    assert!(matches!(first.wait(), JobOutcome::Succeeded(_)));
    assert!(!orchestrator.is_busy());

    let third = orchestrator
        .submit(
            snapshot_of(&paths),
            software_config(30.0),
            inputs.path().join("third.mp4"),
        )
        .unwrap();
    assert!(matches!(third.wait(), JobOutcome::Succeeded(_)));
}

#[test]
fn test_cancel_during_encode_ends_cancelled_after_cleanup() {
    let inputs = tempdir().unwrap();
    let work = tempdir().unwrap();
    let paths = touch_all(inputs.path(), &["a.png", "b.png"]);

    let (release, gate) = bounded::<()>(0);
    let spawner = MockFfmpegSpawner::new();
    spawner.add_gated_expectation("concat", gate);

    let orchestrator = Orchestrator::new(spawner, MockProber::new(), settings_in(work.path()));
    let handle = orchestrator
        .submit(
            snapshot_of(&paths),
            software_config(30.0),
            inputs.path().join("out.mp4"),
        )
        .unwrap();

    for event in handle.events().iter() {
        if event == JobEvent::State(JobState::Concatenating) {
            break;
        }
    }
    handle.cancel();
    drop(release);

    let (events, outcome) = drain(handle);
    assert!(matches!(outcome, JobOutcome::Cancelled), "{outcome:?}");
    assert_eq!(states(&events).last(), Some(&JobState::Cancelled));
    assert_eq!(entries_in(work.path()), 0);
}

#[test]
fn test_cancel_from_another_thread_via_token() {
    let inputs = tempdir().unwrap();
    let work = tempdir().unwrap();
    let paths = touch_all(inputs.path(), &["a.png"]);

    let (release, gate) = bounded::<()>(0);
    let spawner = MockFfmpegSpawner::new();
    spawner.add_gated_expectation("concat", gate);

    let orchestrator = Orchestrator::new(spawner, MockProber::new(), settings_in(work.path()));
    let handle = orchestrator
        .submit(
            snapshot_of(&paths),
            software_config(30.0),
            inputs.path().join("out.mp4"),
        )
        .unwrap();

    for event in handle.events().iter() {
        if event == JobEvent::State(JobState::Concatenating) {
            break;
        }
    }
    let token = handle.cancellation_token();
    std::thread::spawn(move || token.cancel()).join().unwrap();
    drop(release);

    let (_, outcome) = drain(handle);
    assert!(matches!(outcome, JobOutcome::Cancelled), "{outcome:?}");
    assert_eq!(entries_in(work.path()), 0);
}
