//! Capture configuration and frame types

use std::time::Duration;

use crate::common::error::{CaptureError, Result};
use crate::hdr::HdrImage;

/// Snap timeout handed to the SDK when none is configured.
pub const DEFAULT_SNAP_TIMEOUT: Duration = Duration::from_millis(2000);

/// An 8-bit frame copied out of the SDK, rows top-down.
///
/// Color frames keep the sink's channel order (BGR or BGRA).
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<u8>,
}

impl Frame {
    pub fn new(width: usize, height: usize, channels: usize, data: Vec<u8>) -> Result<Self> {
        if data.len() != width * height * channels {
            return Err(CaptureError::InvalidConfig(format!(
                "frame buffer holds {} bytes, {}x{}x{} needs {}",
                data.len(),
                width,
                height,
                channels,
                width * height * channels
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let start = (y * self.width + x) * self.channels;
        &self.data[start..start + self.channels]
    }

    pub fn same_shape(&self, other: &Frame) -> bool {
        self.width == other.width && self.height == other.height && self.channels == other.channels
    }
}

/// What a capture produced.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutput {
    Frame(Frame),
    Hdr(HdrImage),
}

/// Configuration for a capture
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Exposure time in seconds; non-positive keeps the camera's setting
    pub exposure: f32,
    /// Gain in device units; non-positive keeps the camera's setting
    pub gain: i32,
    /// Number of frames averaged per shot
    pub average: u32,
    /// Capture three exposures and merge them
    pub hdr: bool,
    /// Timeout for each snap; `None` waits forever
    pub snap_timeout: Option<Duration>,
    /// Mirror rows after averaging; frames already arrive top-down
    pub flip_vertical: bool,
    /// Frames snapped and thrown away after an exposure change
    pub settle_frames: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            exposure: 0.0,
            gain: 0,
            average: 1,
            hdr: false,
            snap_timeout: Some(DEFAULT_SNAP_TIMEOUT),
            flip_vertical: false,
            settle_frames: 0,
        }
    }
}

impl CaptureConfig {
    pub fn builder() -> CaptureConfigBuilder {
        CaptureConfigBuilder::default()
    }
}

/// Builder for CaptureConfig
#[derive(Default)]
pub struct CaptureConfigBuilder {
    exposure: Option<f32>,
    gain: Option<i32>,
    average: Option<u32>,
    hdr: Option<bool>,
    snap_timeout: Option<Option<Duration>>,
    flip_vertical: Option<bool>,
    settle_frames: Option<u32>,
}

impl CaptureConfigBuilder {
    pub fn exposure(mut self, seconds: f32) -> Self {
        self.exposure = Some(seconds);
        self
    }

    pub fn gain(mut self, gain: i32) -> Self {
        self.gain = Some(gain);
        self
    }

    pub fn average(mut self, frames: u32) -> Self {
        self.average = Some(frames);
        self
    }

    pub fn hdr(mut self, enable: bool) -> Self {
        self.hdr = Some(enable);
        self
    }

    pub fn snap_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.snap_timeout = Some(timeout);
        self
    }

    pub fn flip_vertical(mut self, enable: bool) -> Self {
        self.flip_vertical = Some(enable);
        self
    }

    pub fn settle_frames(mut self, frames: u32) -> Self {
        self.settle_frames = Some(frames);
        self
    }

    pub fn build(self) -> Result<CaptureConfig> {
        let default = CaptureConfig::default();
        let config = CaptureConfig {
            exposure: self.exposure.unwrap_or(default.exposure),
            gain: self.gain.unwrap_or(default.gain),
            average: self.average.unwrap_or(default.average),
            hdr: self.hdr.unwrap_or(default.hdr),
            snap_timeout: self.snap_timeout.unwrap_or(default.snap_timeout),
            flip_vertical: self.flip_vertical.unwrap_or(default.flip_vertical),
            settle_frames: self.settle_frames.unwrap_or(default.settle_frames),
        };
        if config.average == 0 {
            return Err(CaptureError::InvalidConfig(
                "average must be at least 1".to_string(),
            ));
        }
        if !config.exposure.is_finite() {
            return Err(CaptureError::InvalidConfig(format!(
                "exposure must be finite, got {}",
                config.exposure
            )));
        }
        Ok(config)
    }
}
