// reelcat-core/tests/common/mod.rs
//
// Mock spawner and prober shared by the integration tests.

#![allow(dead_code)]

use crossbeam_channel::Receiver;
use ffmpeg_sidecar::command::FfmpegCommand;
use reelcat_core::config::{PipelineSettings, Resolution};
use reelcat_core::error::{CoreError, CoreResult};
use reelcat_core::external::{FfmpegProcess, FfmpegSpawner, MediaProber};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::os::unix::process::ExitStatusExt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One ffmpeg stats line reporting `frame`, newline-terminated.
pub fn progress_line(frame: u64) -> String {
    format!(
        "frame={frame:>5} fps=0.0 q=-1.0 Lsize=      10KiB time=00:00:03.00 bitrate=  27.2kbits/s speed= 283x\n"
    )
}

/// Mock implementation of FfmpegProcess.
pub struct MockFfmpegProcess {
    /// Bytes served as the diagnostic stream.
    stderr: Option<Vec<u8>>,
    exit_status: ExitStatus,
    /// When set, `wait` blocks until the sender side fires or is dropped.
    gate: Option<Receiver<()>>,
}

impl FfmpegProcess for MockFfmpegProcess {
    fn take_diagnostics(&mut self) -> Option<Box<dyn Read + Send>> {
        self.stderr
            .take()
            .map(|bytes| Box::new(Cursor::new(bytes)) as Box<dyn Read + Send>)
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        Ok(self.exit_status)
    }
}

/// Represents an expected ffmpeg command call and its mock result.
struct MockFfmpegExpectation {
    arg_pattern: String,
    stderr: Vec<u8>,
    exit_code: i32,
    create_dummy_output: bool,
    gate: Option<Receiver<()>>,
    spawn_error: Option<CoreError>,
}

/// Mock implementation of FfmpegSpawner supporting multiple expectations.
///
/// Each spawn is matched against the first expectation whose pattern occurs
/// in any argument; unmatched spawns panic. Concat manifests are captured at
/// spawn time since the job deletes them afterwards.
#[derive(Clone, Default)]
pub struct MockFfmpegSpawner {
    expectations: Arc<Mutex<Vec<MockFfmpegExpectation>>>,
    received_calls: Arc<Mutex<Vec<Vec<String>>>>,
    manifests: Arc<Mutex<Vec<String>>>,
}

impl MockFfmpegSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, expectation: MockFfmpegExpectation) {
        self.expectations.lock().unwrap().push(expectation);
    }

    pub fn add_success_expectation(&self, arg_pattern: &str, stderr: &str, create_dummy_output: bool) {
        self.push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            stderr: stderr.as_bytes().to_vec(),
            exit_code: 0,
            create_dummy_output,
            gate: None,
            spawn_error: None,
        });
    }

    pub fn add_exit_error_expectation(&self, arg_pattern: &str, stderr: &str, exit_code: i32) {
        self.push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            stderr: stderr.as_bytes().to_vec(),
            exit_code,
            create_dummy_output: false,
            gate: None,
            spawn_error: None,
        });
    }

    /// Success whose `wait` blocks until `gate` fires.
    pub fn add_gated_expectation(&self, arg_pattern: &str, gate: Receiver<()>) {
        self.push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            stderr: Vec::new(),
            exit_code: 0,
            create_dummy_output: true,
            gate: Some(gate),
            spawn_error: None,
        });
    }

    pub fn add_spawn_error_expectation(&self, arg_pattern: &str, error: CoreError) {
        self.push(MockFfmpegExpectation {
            arg_pattern: arg_pattern.to_string(),
            stderr: Vec::new(),
            exit_code: 0,
            create_dummy_output: false,
            gate: None,
            spawn_error: Some(error),
        });
    }

    pub fn get_received_calls(&self) -> Vec<Vec<String>> {
        self.received_calls.lock().unwrap().clone()
    }

    pub fn get_manifests(&self) -> Vec<String> {
        self.manifests.lock().unwrap().clone()
    }
}

impl FfmpegSpawner for MockFfmpegSpawner {
    type Process = MockFfmpegProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        let args: Vec<String> = cmd
            .as_inner()
            .get_args()
            .map(|s| s.to_string_lossy().into_owned())
            .collect();
        self.received_calls.lock().unwrap().push(args.clone());

        if args.iter().any(|a| a == "concat") {
            if let Some(manifest) = arg_after(&args, "-i") {
                let text = std::fs::read_to_string(manifest).unwrap_or_default();
                self.manifests.lock().unwrap().push(text);
            }
        }

        let expectation = {
            let mut expectations = self.expectations.lock().unwrap();
            let index = expectations
                .iter()
                .position(|exp| args.iter().any(|arg| arg.contains(&exp.arg_pattern)))
                .unwrap_or_else(|| {
                    panic!("MockFfmpegSpawner: No expectation found for command args: {args:?}")
                });
            expectations.remove(index)
        };

        if let Some(err) = expectation.spawn_error {
            return Err(err);
        }

        if expectation.create_dummy_output {
            if let Some(output) = args.last() {
                std::fs::write(output, b"mock output").unwrap();
            }
        }

        Ok(MockFfmpegProcess {
            stderr: Some(expectation.stderr),
            exit_status: ExitStatus::from_raw(expectation.exit_code << 8),
            gate: expectation.gate,
        })
    }
}

/// Value following `flag` in an argument list.
pub fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Mock implementation of MediaProber answering from fixed tables.
#[derive(Clone, Default)]
pub struct MockProber {
    dimensions: HashMap<PathBuf, Resolution>,
    bitrates: HashMap<PathBuf, u32>,
    calls: Arc<AtomicUsize>,
}

impl MockProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dimensions(mut self, path: &Path, width: u32, height: u32) -> Self {
        self.dimensions
            .insert(path.to_path_buf(), Resolution::new(width, height));
        self
    }

    pub fn with_bitrate(mut self, path: &Path, kbps: u32) -> Self {
        self.bitrates.insert(path.to_path_buf(), kbps);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MediaProber for MockProber {
    fn probe_dimensions(&self, path: &Path) -> Option<Resolution> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.dimensions.get(path).copied()
    }

    fn probe_bitrate_kbps(&self, path: &Path) -> Option<u32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bitrates.get(path).copied()
    }
}

/// Settings pointing the job work directory into `base`.
pub fn settings_in(base: &Path) -> PipelineSettings {
    PipelineSettings {
        temp_dir: Some(base.to_path_buf()),
        ..PipelineSettings::default()
    }
}

/// Number of entries left in `dir`.
pub fn entries_in(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
