//! Core library for turning image sequences or video clips into one video
//! using ffmpeg and ffprobe.
//!
//! This crate provides the input inventory, encoding parameter resolution,
//! per-clip normalization, concat-manifest encoding with frame-based progress,
//! and a single-job orchestrator running conversions on a worker thread.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use reelcat_core::{
//!     EncodingConfigBuilder, JobEvent, JobOutcome, MediaInventory, Orchestrator,
//!     PipelineSettings,
//! };
//! use std::path::PathBuf;
//!
//! let mut inventory = MediaInventory::new();
//! inventory.add(["shots/001.png", "shots/002.png", "shots/003.png"]).unwrap();
//!
//! let config = EncodingConfigBuilder::new().fps(24.0).build();
//! let orchestrator = Orchestrator::with_defaults(PipelineSettings::default());
//! let handle = orchestrator
//!     .submit(inventory.snapshot(), config, PathBuf::from("out.mp4"))
//!     .unwrap();
//!
//! for event in handle.events().iter() {
//!     match event {
//!         JobEvent::Probed { id, probe } => {
//!             inventory.record_probe(id, probe);
//!         }
//!         JobEvent::Progress(snapshot) => println!("{:.1}%", snapshot.percent),
//!         _ => {}
//!     }
//! }
//!
//! if let JobOutcome::Succeeded(path) = handle.wait() {
//!     println!("Wrote {}", path.display());
//! }
//! ```

pub mod config;
pub mod encoding;
pub mod error;
pub mod external;
pub mod hardware;
pub mod inventory;
pub mod job;
pub mod params;
pub mod progress;
pub mod temp_files;
pub mod utils;

// Re-exports for public API
pub use config::{
    EncodingConfig, EncodingConfigBuilder, EncodingSettings, PipelineSettings, Resolution,
    SizeUnit, TargetSize, parse_bitrate, parse_fps, parse_resolution, parse_target_size,
};
pub use error::{CoreError, CoreResult};
pub use external::{
    FfmpegProcess, FfmpegSpawner, FfprobeProber, MediaProber, SidecarSpawner, check_dependencies,
};
pub use hardware::{HardwareEncoding, VideoCodec};
pub use inventory::{
    InventorySnapshot, ItemId, MediaInventory, MediaItem, MediaKind, ProbeData,
    natural_sort_paths,
};
pub use job::{ConversionJob, JobEvent, JobHandle, JobOutcome, JobState, Orchestrator};
pub use params::{ResolvedParameters, resolve as resolve_parameters};
pub use progress::{CancellationToken, ProgressSnapshot, ProgressTracker};
pub use temp_files::{TempArtifacts, create_temp_file_path};
pub use utils::{default_output_path, format_bytes, format_duration, format_eta};
