//! FFprobe integration for best-effort media probing
//!
//! Probing feeds parameter resolution: frame dimensions for the bounding box
//! and, for video clips, the stream bitrate. Any failure (missing tool,
//! unreadable file, odd output) yields `None` and is logged, never raised.
use crate::config::Resolution;
use crate::inventory::{MediaItem, MediaKind, ProbeData};
use ffprobe::{FfProbe, Stream, ffprobe};
use rayon::prelude::*;
use std::path::Path;

/// Source of per-file media facts.
pub trait MediaProber: Send + Sync {
    /// Width and height of the first video stream.
    fn probe_dimensions(&self, path: &Path) -> Option<Resolution>;

    /// Bitrate of the first video stream in kbps.
    fn probe_bitrate_kbps(&self, path: &Path) -> Option<u32>;

    /// Fills whatever `cached` is missing. Bitrate is only probed for videos.
    fn probe_missing(&self, path: &Path, kind: MediaKind, cached: ProbeData) -> ProbeData {
        let mut probe = ProbeData::default();
        if cached.dimensions.is_none() {
            probe.dimensions = self.probe_dimensions(path);
        }
        if kind == MediaKind::Video && cached.bitrate_kbps.is_none() {
            probe.bitrate_kbps = self.probe_bitrate_kbps(path);
        }
        probe
    }
}

/// `MediaProber` backed by the `ffprobe` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfprobeProber;

impl FfprobeProber {
    fn metadata(path: &Path) -> Option<FfProbe> {
        log::debug!("Running ffprobe (via crate) on: {}", path.display());
        match ffprobe(path) {
            Ok(metadata) => Some(metadata),
            Err(err) => {
                log::warn!("ffprobe failed on {}: {:?}", path.display(), err);
                None
            }
        }
    }
}

fn video_stream(metadata: &FfProbe) -> Option<&Stream> {
    metadata
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
}

/// Dimensions of the first video stream; zero sizes count as unknown.
fn stream_dimensions(metadata: &FfProbe, path: &Path) -> Option<Resolution> {
    let stream = video_stream(metadata)?;
    let width = u32::try_from(stream.width?).ok()?;
    let height = u32::try_from(stream.height?).ok()?;
    if width == 0 || height == 0 {
        log::warn!("Ignoring zero dimensions reported for {}", path.display());
        return None;
    }
    Some(Resolution::new(width, height))
}

fn stream_bitrate_kbps(metadata: &FfProbe) -> Option<u32> {
    video_stream(metadata)
        .and_then(|s| s.bit_rate.as_deref())
        .and_then(parse_bitrate_kbps)
}

impl MediaProber for FfprobeProber {
    fn probe_dimensions(&self, path: &Path) -> Option<Resolution> {
        stream_dimensions(&Self::metadata(path)?, path)
    }

    fn probe_bitrate_kbps(&self, path: &Path) -> Option<u32> {
        stream_bitrate_kbps(&Self::metadata(path)?)
    }

    /// Both facts come from a single ffprobe run.
    fn probe_missing(&self, path: &Path, kind: MediaKind, cached: ProbeData) -> ProbeData {
        probe_once(path, kind, cached, Self::metadata)
    }
}

/// Fills the missing facts of one item from at most one `run` of ffprobe.
fn probe_once<F>(path: &Path, kind: MediaKind, cached: ProbeData, run: F) -> ProbeData
where
    F: FnOnce(&Path) -> Option<FfProbe>,
{
    let wants_dimensions = cached.dimensions.is_none();
    let wants_bitrate = kind == MediaKind::Video && cached.bitrate_kbps.is_none();
    if !wants_dimensions && !wants_bitrate {
        return ProbeData::default();
    }

    let Some(metadata) = run(path) else {
        return ProbeData::default();
    };
    ProbeData {
        dimensions: if wants_dimensions {
            stream_dimensions(&metadata, path)
        } else {
            None
        },
        bitrate_kbps: if wants_bitrate {
            stream_bitrate_kbps(&metadata)
        } else {
            None
        },
    }
}

/// Converts ffprobe's bits-per-second string to whole kbps.
///
/// `N/A`, garbage and zero all mean "unknown".
#[must_use]
pub fn parse_bitrate_kbps(raw: &str) -> Option<u32> {
    let bps: u64 = raw.trim().parse().ok()?;
    let kbps = u32::try_from(bps / 1000).ok()?;
    (kbps > 0).then_some(kbps)
}

/// Probes every item in parallel, skipping facts already cached.
///
/// Returns one entry per item, in the same order as `items`; entries hold
/// only newly discovered values.
pub fn probe_items<P: MediaProber + ?Sized>(prober: &P, items: &[MediaItem]) -> Vec<ProbeData> {
    items
        .par_iter()
        .map(|item| prober.probe_missing(&item.path, item.kind, item.probe))
        .collect()
}
