//! Encoding parameter resolution.
//!
//! Turns the user's [`EncodingConfig`] plus whatever probing found into the
//! [`ResolvedParameters`] of a job. Resolution follows a bounding-box policy
//! (max width, max height) that ignores aspect ratio; duration treats every
//! item, image or clip, as exactly one frame slot at the target fps.

use crate::config::{
    DEFAULT_BITRATE_KBPS, EncodingConfig, MIN_TARGET_BITRATE_KBPS, Resolution,
    TARGET_SIZE_HEADROOM,
};
use crate::error::{CoreResult, invalid_parameter};
use crate::inventory::{MediaItem, MediaKind};

/// Parameters computed once per job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedParameters {
    /// `None` lets ffmpeg use the first input's native size.
    pub resolution: Option<Resolution>,
    pub bitrate_kbps: u32,
}

/// Where the resolved bitrate came from, for logging and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitrateSource {
    TargetSize,
    Explicit,
    ProbedAverage,
    Default,
}

/// Seconds of output the inventory is assumed to produce.
pub fn duration_seconds(item_count: usize, fps: f64) -> CoreResult<f64> {
    if !fps.is_finite() || fps <= 0.0 {
        return Err(invalid_parameter(format!("fps must be a positive number, got {fps}")));
    }
    Ok(item_count as f64 / fps)
}

/// Largest width and largest height over all probed items.
#[must_use]
pub fn bounding_box(items: &[MediaItem]) -> Option<Resolution> {
    items
        .iter()
        .filter_map(|item| item.probe.dimensions)
        .reduce(|acc, dim| Resolution::new(acc.width.max(dim.width), acc.height.max(dim.height)))
}

/// Explicit override first, then the bounding box of probed items.
#[must_use]
pub fn resolve_resolution(config: &EncodingConfig, items: &[MediaItem]) -> Option<Resolution> {
    config.resolution_override.or_else(|| bounding_box(items))
}

/// Bitrate a target size allows over `duration_secs`, never below the floor.
pub fn target_size_bitrate(bits: f64, duration_secs: f64) -> CoreResult<u32> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(invalid_parameter(format!(
            "cannot derive a bitrate for a duration of {duration_secs}s"
        )));
    }
    let bits_per_second = ((bits / duration_secs) * TARGET_SIZE_HEADROOM).floor();
    let kbps = (bits_per_second / 1000.0).floor();
    // Saturating float-to-int cast keeps huge targets at u32::MAX.
    Ok((kbps as u32).max(MIN_TARGET_BITRATE_KBPS))
}

/// Picks the bitrate in strict precedence: target size, explicit value,
/// mean of probed bitrates, default.
pub fn resolve_bitrate(
    config: &EncodingConfig,
    duration_secs: f64,
    probed_bitrates: &[u32],
) -> CoreResult<(u32, BitrateSource)> {
    if let Some(target) = config.target_size {
        if !target.value.is_finite() || target.value <= 0.0 {
            return Err(invalid_parameter(format!(
                "target size must be a positive number, got {}",
                target.value
            )));
        }
        let kbps = target_size_bitrate(target.bits(), duration_secs)?;
        return Ok((kbps, BitrateSource::TargetSize));
    }

    match config.bitrate_kbps {
        Some(0) => return Err(invalid_parameter("bitrate must be a positive number of kbps")),
        Some(kbps) => return Ok((kbps, BitrateSource::Explicit)),
        None => {}
    }

    if !probed_bitrates.is_empty() {
        let sum: u64 = probed_bitrates.iter().map(|b| u64::from(*b)).sum();
        let mean = sum / probed_bitrates.len() as u64;
        return Ok((mean as u32, BitrateSource::ProbedAverage));
    }

    Ok((DEFAULT_BITRATE_KBPS, BitrateSource::Default))
}

/// Probed bitrates of video items; images and unknowns contribute nothing.
#[must_use]
pub fn probed_video_bitrates(items: &[MediaItem]) -> Vec<u32> {
    items
        .iter()
        .filter(|item| item.kind == MediaKind::Video)
        .filter_map(|item| item.probe.bitrate_kbps)
        .collect()
}

/// Resolves everything a job needs from its config and probed items.
pub fn resolve(config: &EncodingConfig, items: &[MediaItem]) -> CoreResult<ResolvedParameters> {
    config.validate()?;
    let duration = duration_seconds(items.len(), config.fps)?;
    let resolution = resolve_resolution(config, items);
    let (bitrate_kbps, source) = resolve_bitrate(config, duration, &probed_video_bitrates(items))?;

    log::info!(
        "Resolved parameters: {} item(s) over {duration:.2}s, bitrate {bitrate_kbps} kbps ({source:?}), resolution {}",
        items.len(),
        resolution.map_or_else(|| "native".to_string(), |r| r.to_string()),
    );

    Ok(ResolvedParameters {
        resolution,
        bitrate_kbps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_size_example() {
        let bits = 10.0 * 1024.0 * 1024.0 * 8.0;
        assert_eq!(bits, 83_886_080.0);
        assert_eq!(target_size_bitrate(bits, 20.0).unwrap(), 4110);
    }

    #[test]
    fn test_target_size_floor() {
        // 1 KB over an hour is far below the floor.
        assert_eq!(target_size_bitrate(8192.0, 3600.0).unwrap(), MIN_TARGET_BITRATE_KBPS);
    }

    #[test]
    fn test_duration_rejects_zero_fps() {
        assert!(duration_seconds(3, 0.0).is_err());
        assert_eq!(duration_seconds(3, 1.0).unwrap(), 3.0);
        assert_eq!(duration_seconds(60, 30.0).unwrap(), 2.0);
    }
}
