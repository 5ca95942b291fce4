use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::grabber::SinkFormat;
use crate::output::TiffCompression;

/// TIFF compression choices for the command line.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum CompressionArg {
    None,
    Lzw,
    Deflate,
    DeflateBest,
}

impl From<CompressionArg> for TiffCompression {
    fn from(arg: CompressionArg) -> Self {
        match arg {
            CompressionArg::None => TiffCompression::None,
            CompressionArg::Lzw => TiffCompression::Lzw,
            CompressionArg::Deflate => TiffCompression::DeflateBalanced,
            CompressionArg::DeflateBest => TiffCompression::DeflateBest,
        }
    }
}

/// Sink formats the capture helper can average.
#[derive(clap::ValueEnum, Clone, Debug, PartialEq, Copy)]
pub enum SinkArg {
    Y800,
    Rgb24,
    Rgb32,
}

impl From<SinkArg> for SinkFormat {
    fn from(arg: SinkArg) -> Self {
        match arg {
            SinkArg::Y800 => SinkFormat::Y800,
            SinkArg::Rgb24 => SinkFormat::Rgb24,
            SinkArg::Rgb32 => SinkFormat::Rgb32,
        }
    }
}

/// Capture averaged or HDR stills from Imaging Source cameras.
///
/// # Example
///
/// ```bash
/// tiscap devices
/// tiscap capture --device "DFK 33UX264 12345678" --average 8 -o shot.tiff
/// TISGRABBER_LIBRARY=C:\tis\tisgrabber_x64.dll tiscap capture --state cam.xml --hdr -o hdr.tiff
/// ```
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the tisgrabber library
    #[arg(long, env = "TISGRABBER_LIBRARY")]
    pub library: Option<PathBuf>,

    /// SDK license key; omitted runs the SDK in trial mode
    #[arg(long, env = "TISGRABBER_LICENSE", hide_env_values = true)]
    pub license_key: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List connected devices
    Devices,

    /// List video formats, input channels and video norms of a device
    Formats {
        /// Unique device name, as printed by `devices`
        #[arg(short, long)]
        device: String,
    },

    /// Capture a still, optionally averaged or HDR merged, to TIFF
    Capture(CaptureArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct CaptureArgs {
    /// Unique device name; used when the state file is missing or stale
    #[arg(short, long, env = "TISGRABBER_DEVICE")]
    pub device: Option<String>,

    /// Device state XML, loaded if present and saved after opening
    #[arg(long)]
    pub state: Option<PathBuf>,

    /// Video format, e.g. "RGB32 (640x480)"
    #[arg(long)]
    pub format: Option<String>,

    /// Pixel format delivered to memory
    #[arg(long, value_enum)]
    pub sink: Option<SinkArg>,

    /// Exposure time in seconds; 0 keeps the camera's setting
    #[arg(long, default_value_t = 0.0)]
    pub exposure: f32,

    /// Gain; 0 keeps the camera's setting
    #[arg(long, default_value_t = 0)]
    pub gain: i32,

    /// Number of frames averaged per shot
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub average: u32,

    /// Bracket three exposures (0.5x, 1x, 2x) and merge them
    #[arg(long)]
    pub hdr: bool,

    /// Frames discarded after each exposure change
    #[arg(long, default_value_t = 0)]
    pub settle_frames: u32,

    /// Snap timeout in milliseconds; negative waits forever
    #[arg(long, default_value_t = 2000, allow_negative_numbers = true)]
    pub timeout_ms: i64,

    /// TIFF compression
    #[arg(long, value_enum, default_value = "lzw")]
    pub compression: CompressionArg,

    /// Output TIFF path
    #[arg(short, long)]
    pub output: PathBuf,
}
