//! Hardware encoder detection and codec selection.
//!
//! NVENC is used only when the user asked for it and the vendor diagnostic
//! tool (`nvidia-smi` by default) exits zero. Anything else, including the tool
//! being absent, falls back to libx264 without raising an error.

use std::process::{Command, Stdio};

/// Video codec for both the per-clip normalization and the final encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    /// `h264_nvenc`
    Nvenc,
    /// `libx264`
    Libx264,
}

impl VideoCodec {
    /// Name passed to ffmpeg's `-c:v`.
    #[must_use]
    pub fn encoder_name(self) -> &'static str {
        match self {
            VideoCodec::Nvenc => "h264_nvenc",
            VideoCodec::Libx264 => "libx264",
        }
    }

    #[must_use]
    pub fn is_hardware(self) -> bool {
        matches!(self, VideoCodec::Nvenc)
    }

    /// Rate-control arguments following `-c:v <codec>` in the final encode.
    ///
    /// Both paths cap the rate at the target with a buffer of twice the
    /// bitrate; NVENC additionally gets its highest-quality preset and VBR.
    #[must_use]
    pub fn rate_control_args(self, bitrate_kbps: u32) -> Vec<String> {
        let mut args = Vec::new();
        if self.is_hardware() {
            args.extend(
                ["-preset", "p7", "-tune", "hq", "-rc", "vbr_hq"]
                    .iter()
                    .map(|s| (*s).to_string()),
            );
        }
        args.push("-b:v".to_string());
        args.push(format!("{bitrate_kbps}k"));
        args.push("-maxrate".to_string());
        args.push(format!("{bitrate_kbps}k"));
        args.push("-bufsize".to_string());
        args.push(format!("{}k", u64::from(bitrate_kbps) * 2));
        args
    }
}

/// Outcome of the once-per-job hardware capability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HardwareEncoding {
    /// Whether the vendor tool reported a usable GPU.
    pub nvenc_available: bool,
}

impl HardwareEncoding {
    /// Runs `probe_tool` with no arguments; a zero exit means NVENC is usable.
    #[must_use]
    pub fn detect(probe_tool: &str) -> Self {
        let nvenc_available = match Command::new(probe_tool)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
        {
            Ok(status) if status.success() => true,
            Ok(status) => {
                log::debug!("{probe_tool} exited with {status}, no hardware encoder");
                false
            }
            Err(e) => {
                log::debug!("{probe_tool} could not be run ({e}), no hardware encoder");
                false
            }
        };

        Self { nvenc_available }
    }

    /// Codec for this job: NVENC only when requested and available.
    #[must_use]
    pub fn select_codec(&self, use_hardware: bool) -> VideoCodec {
        if use_hardware && self.nvenc_available {
            VideoCodec::Nvenc
        } else {
            if use_hardware {
                log::warn!("Hardware encoding requested but unavailable, using libx264");
            }
            VideoCodec::Libx264
        }
    }

    /// Logs the detected capabilities.
    pub fn log_capabilities(&self) {
        if self.nvenc_available {
            log::info!("Hardware encoding: NVENC available");
        } else {
            log::info!("Hardware encoding: None");
        }
    }
}

/// Probes only when the user asked for hardware encoding at all.
#[must_use]
pub fn select_job_codec(use_hardware: bool, probe_tool: &str) -> VideoCodec {
    if !use_hardware {
        return VideoCodec::Libx264;
    }
    let hardware = HardwareEncoding::detect(probe_tool);
    hardware.log_capabilities();
    hardware.select_codec(true)
}
