// ============================================================================
// reelcat-core/src/config.rs
// ============================================================================
//
// CONFIGURATION: Encoding Configuration, Parsing and Defaults
//
// This module defines the user-facing encoding configuration, the helpers that
// turn user-supplied strings into validated values, the runtime settings of
// the pipeline and an optional JSON settings file.
//
// KEY COMPONENTS:
// - EncodingConfig / EncodingConfigBuilder: what the user asked for
// - Parse helpers: fps, bitrate, target size, resolution from raw strings
// - PipelineSettings: where temp files go and which tool probes the GPU
// - EncodingSettings: serde-backed settings file providing defaults
//
// USAGE:
// The CLI parses raw strings with the helpers below, merges them over the
// settings file and hands an `EncodingConfig` to the orchestrator, which
// validates it again before anything is spawned.

use crate::error::{CoreResult, invalid_parameter};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Default output frame rate.
pub const DEFAULT_FPS: f64 = 30.0;

/// Bitrate used when nothing else determines one (20 Mbps).
pub const DEFAULT_BITRATE_KBPS: u32 = 20_000;

/// Lowest bitrate a target-size calculation may produce.
pub const MIN_TARGET_BITRATE_KBPS: u32 = 500;

/// Share of the target size actually budgeted, so the output stays under it.
pub const TARGET_SIZE_HEADROOM: f64 = 0.98;

/// Pixel format of normalized clips and of the final output.
pub const OUTPUT_PIXEL_FORMAT: &str = "yuv420p";

/// Vendor diagnostic tool whose zero exit means the NVENC path is usable.
pub const DEFAULT_HARDWARE_PROBE_TOOL: &str = "nvidia-smi";

// ============================================================================
// VALUE TYPES
// ============================================================================

/// Unit of a target output size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeUnit {
    #[default]
    #[serde(rename = "MB", alias = "mb")]
    Megabytes,
    #[serde(rename = "KB", alias = "kb")]
    Kilobytes,
}

impl SizeUnit {
    /// Number of bits in one unit (binary prefixes).
    #[must_use]
    pub fn bits_per_unit(self) -> f64 {
        match self {
            SizeUnit::Megabytes => 1024.0 * 1024.0 * 8.0,
            SizeUnit::Kilobytes => 1024.0 * 8.0,
        }
    }
}

impl FromStr for SizeUnit {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MB" => Ok(SizeUnit::Megabytes),
            "KB" => Ok(SizeUnit::Kilobytes),
            other => Err(invalid_parameter(format!(
                "size unit must be MB or KB, got '{other}'"
            ))),
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeUnit::Megabytes => f.write_str("MB"),
            SizeUnit::Kilobytes => f.write_str("KB"),
        }
    }
}

/// Desired output file size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetSize {
    pub value: f64,
    pub unit: SizeUnit,
}

impl TargetSize {
    #[must_use]
    pub fn bits(&self) -> f64 {
        self.value * self.unit.bits_per_unit()
    }
}

impl fmt::Display for TargetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Frame dimensions in pixels, rendered as `WxH` for ffmpeg's `-s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let trimmed = s.trim();
        let (w, h) = trimmed
            .split_once(['x', 'X'])
            .ok_or_else(|| invalid_parameter(format!("resolution must look like 1920x1080, got '{trimmed}'")))?;
        let width = w.trim().parse::<u32>().ok().filter(|v| *v > 0);
        let height = h.trim().parse::<u32>().ok().filter(|v| *v > 0);
        match (width, height) {
            (Some(width), Some(height)) => Ok(Resolution { width, height }),
            _ => Err(invalid_parameter(format!(
                "resolution needs two positive integers, got '{trimmed}'"
            ))),
        }
    }
}

// ============================================================================
// ENCODING CONFIGURATION
// ============================================================================

/// What the user asked the conversion to produce.
///
/// # Examples
///
/// ```rust
/// use reelcat_core::config::{EncodingConfigBuilder, SizeUnit, TargetSize};
///
/// let config = EncodingConfigBuilder::new()
///     .fps(24.0)
///     .target_size(TargetSize { value: 10.0, unit: SizeUnit::Megabytes })
///     .use_hardware_encoder(false)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Output frame rate; every inventory item occupies one frame slot at it.
    pub fps: f64,

    /// Explicit bitrate, loses against a target size.
    pub bitrate_kbps: Option<u32>,

    /// Forces the output resolution, skipping the bounding-box policy.
    pub resolution_override: Option<Resolution>,

    /// Desired output size; the bitrate is derived from it.
    pub target_size: Option<TargetSize>,

    /// Prefer NVENC when the capability probe succeeds.
    pub use_hardware_encoder: bool,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            bitrate_kbps: None,
            resolution_override: None,
            target_size: None,
            use_hardware_encoder: true,
        }
    }
}

impl EncodingConfig {
    /// Rejects non-finite or non-positive values.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.fps.is_finite() || self.fps <= 0.0 {
            return Err(invalid_parameter(format!(
                "fps must be a positive number, got {}",
                self.fps
            )));
        }

        if self.bitrate_kbps == Some(0) {
            return Err(invalid_parameter("bitrate must be a positive number of kbps"));
        }

        if let Some(target) = self.target_size {
            if !target.value.is_finite() || target.value <= 0.0 {
                return Err(invalid_parameter(format!(
                    "target size must be a positive number, got {}",
                    target.value
                )));
            }
        }

        if let Some(res) = self.resolution_override {
            if res.width == 0 || res.height == 0 {
                return Err(invalid_parameter(format!(
                    "resolution must be non-zero, got {res}"
                )));
            }
        }

        Ok(())
    }
}

/// Builder for [`EncodingConfig`], starting from the defaults.
#[derive(Debug, Clone, Default)]
pub struct EncodingConfigBuilder {
    config: EncodingConfig,
}

impl EncodingConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from the values of a settings file instead of the defaults.
    #[must_use]
    pub fn from_settings(settings: &EncodingSettings) -> Self {
        let defaults = EncodingConfig::default();
        Self {
            config: EncodingConfig {
                fps: settings.fps.unwrap_or(defaults.fps),
                bitrate_kbps: settings.bitrate_kbps,
                resolution_override: settings.resolution,
                target_size: settings.target_size,
                use_hardware_encoder: settings
                    .use_hardware_encoder
                    .unwrap_or(defaults.use_hardware_encoder),
            },
        }
    }

    #[must_use]
    pub fn fps(mut self, fps: f64) -> Self {
        self.config.fps = fps;
        self
    }

    #[must_use]
    pub fn bitrate_kbps(mut self, bitrate_kbps: u32) -> Self {
        self.config.bitrate_kbps = Some(bitrate_kbps);
        self
    }

    #[must_use]
    pub fn resolution(mut self, resolution: Resolution) -> Self {
        self.config.resolution_override = Some(resolution);
        self
    }

    #[must_use]
    pub fn target_size(mut self, target_size: TargetSize) -> Self {
        self.config.target_size = Some(target_size);
        self
    }

    #[must_use]
    pub fn use_hardware_encoder(mut self, enabled: bool) -> Self {
        self.config.use_hardware_encoder = enabled;
        self
    }

    #[must_use]
    pub fn build(self) -> EncodingConfig {
        self.config
    }
}

// ============================================================================
// RAW STRING PARSING
// ============================================================================

/// Parses a user-entered frame rate.
pub fn parse_fps(raw: &str) -> CoreResult<f64> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(fps) if fps.is_finite() && fps > 0.0 => Ok(fps),
        _ => Err(invalid_parameter(format!(
            "fps must be a positive number, got '{trimmed}'"
        ))),
    }
}

/// Parses a user-entered bitrate in kbps. Thousands separators are accepted
/// (`20,000`); an empty string means "not set".
pub fn parse_bitrate(raw: &str) -> CoreResult<Option<u32>> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<u32>() {
        Ok(kbps) if kbps > 0 => Ok(Some(kbps)),
        _ => Err(invalid_parameter(format!(
            "bitrate must be a positive whole number of kbps, got '{}'",
            raw.trim()
        ))),
    }
}

/// Parses a user-entered target size. An empty string means "not set".
pub fn parse_target_size(raw: &str, unit: SizeUnit) -> CoreResult<Option<TargetSize>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(Some(TargetSize { value, unit })),
        _ => Err(invalid_parameter(format!(
            "target size must be a positive number, got '{trimmed}'"
        ))),
    }
}

/// Parses a `WxH` resolution override. An empty string means "not set".
pub fn parse_resolution(raw: &str) -> CoreResult<Option<Resolution>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some)
}

// ============================================================================
// PIPELINE SETTINGS
// ============================================================================

/// Runtime knobs of the pipeline that are not part of the encode itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Parent directory for the per-job work directory (system temp if unset).
    pub temp_dir: Option<PathBuf>,

    /// Tool run without arguments to decide whether NVENC is available.
    pub hardware_probe_tool: String,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            temp_dir: None,
            hardware_probe_tool: DEFAULT_HARDWARE_PROBE_TOOL.to_string(),
        }
    }
}

/// Contents of an optional JSON settings file. Every field is optional;
/// command-line values take precedence over it.
///
/// ```json
/// { "fps": 24, "bitrate_kbps": 8000, "target_size": { "value": 50, "unit": "MB" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingSettings {
    pub fps: Option<f64>,
    pub bitrate_kbps: Option<u32>,
    pub resolution: Option<Resolution>,
    pub target_size: Option<TargetSize>,
    pub use_hardware_encoder: Option<bool>,
    pub temp_dir: Option<PathBuf>,
    pub hardware_probe_tool: Option<String>,
}

impl EncodingSettings {
    /// Reads a settings file. Malformed content is an `InvalidParameter`.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: EncodingSettings = serde_json::from_str(&content).map_err(|e| {
            invalid_parameter(format!("settings file {}: {e}", path.display()))
        })?;
        log::debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    /// Pipeline settings with this file's overrides applied.
    #[must_use]
    pub fn pipeline_settings(&self) -> PipelineSettings {
        let defaults = PipelineSettings::default();
        PipelineSettings {
            temp_dir: self.temp_dir.clone().or(defaults.temp_dir),
            hardware_probe_tool: self
                .hardware_probe_tool
                .clone()
                .unwrap_or(defaults.hardware_probe_tool),
        }
    }
}
