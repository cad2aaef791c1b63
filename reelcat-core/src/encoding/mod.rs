// ============================================================================
// reelcat-core/src/encoding/mod.rs
// ============================================================================
//
// ENCODING: The Two ffmpeg Stages of a Conversion
//
// Video inputs are first normalized one by one into temporary clips with a
// common codec, frame rate and pixel format. The final stage feeds either the
// images or the normalized clips to ffmpeg's concat demuxer through a
// manifest and encodes the output at the resolved bitrate and resolution.
//
// KEY COMPONENTS:
// - transcode: per-clip normalization
// - concat: manifest construction and the monitored final encode

pub mod concat;
pub mod transcode;

pub use concat::{
    build_concat_command, build_manifest, escape_manifest_path, run_concat, write_manifest,
};
pub use transcode::{ClipFormat, build_transcode_command, transcode_videos};

/// Result of a stage that honours cancellation between units of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Completed(T),
    Cancelled,
}
