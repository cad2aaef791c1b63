// reelcat-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Reelcat: turn image sequences or video clips into one video",
    long_about = "Concatenates images (one frame each) or video clips into a single H.264 video using ffmpeg via reelcat-core."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug output (RUST_LOG overrides this)
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Converts the inputs, in order, into one video
    Convert(ConvertArgs),
    /// Probes the inputs and shows the parameters a conversion would use
    Probe(ProbeArgs),
}

/// Encoding options shared by `convert` and `probe`.
///
/// Values are taken as text and parsed by reelcat-core so that, for example,
/// `--bitrate 20,000` is accepted.
#[derive(Args, Debug, Clone, Default)]
pub struct EncodingArgs {
    /// Output frame rate; each image or clip occupies one frame slot [default: 30]
    #[arg(long, value_name = "FPS", env = "REELCAT_FPS")]
    pub fps: Option<String>,

    /// Video bitrate in kbps (ignored when --target-size is given)
    #[arg(long, value_name = "KBPS", env = "REELCAT_BITRATE")]
    pub bitrate: Option<String>,

    /// Force the output resolution, e.g. 1920x1080
    #[arg(long, value_name = "WxH", env = "REELCAT_RESOLUTION")]
    pub resolution: Option<String>,

    /// Desired output size; the bitrate is derived from it
    #[arg(long, value_name = "SIZE", env = "REELCAT_TARGET_SIZE")]
    pub target_size: Option<String>,

    /// Unit of --target-size: MB or KB [default: MB]
    #[arg(long, value_name = "UNIT", env = "REELCAT_SIZE_UNIT")]
    pub size_unit: Option<String>,

    /// Never use the NVENC hardware encoder
    #[arg(long, default_value_t = false)]
    pub no_hardware: bool,

    /// Optional JSON settings file providing defaults for the options above
    #[arg(long, value_name = "FILE", env = "REELCAT_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Image files or video clips (mp4, mov, avi, mkv); kinds cannot be mixed
    #[arg(required = true, value_name = "INPUTS")]
    pub inputs: Vec<PathBuf>,

    /// Output file (defaults to reelcat_<timestamp>.mp4 next to the inputs' folder)
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Keep the inputs in the order given instead of natural filename order
    #[arg(long, default_value_t = false)]
    pub keep_order: bool,

    /// Parent directory for temporary files
    #[arg(long, value_name = "DIR", env = "REELCAT_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    #[command(flatten)]
    pub encoding: EncodingArgs,
}

#[derive(Parser, Debug)]
pub struct ProbeArgs {
    /// Image files or video clips to inspect
    #[arg(required = true, value_name = "INPUTS")]
    pub inputs: Vec<PathBuf>,

    /// Keep the inputs in the order given instead of natural filename order
    #[arg(long, default_value_t = false)]
    pub keep_order: bool,

    #[command(flatten)]
    pub encoding: EncodingArgs,
}
