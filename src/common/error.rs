use thiserror::Error;

use crate::grabber::GrabberError;
use crate::hdr::HdrError;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Camera SDK error: {0}")]
    Grabber(#[from] GrabberError),

    #[error("Invalid capture configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported sink format: {0}")]
    UnsupportedFormat(String),

    #[error("Frame {index} is {width}x{height}x{channels}, expected {expected}")]
    FrameMismatch {
        index: usize,
        width: usize,
        height: usize,
        channels: usize,
        expected: String,
    },

    #[error("HDR merge failed: {0}")]
    Hdr(#[from] HdrError),

    #[error("Failed to encode image: {0}")]
    EncodeError(String),

    #[error("Failed to write output file: {0}")]
    OutputWriteError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
