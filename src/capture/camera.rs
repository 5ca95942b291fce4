use std::time::Duration;

use tracing::debug;

use crate::capture::types::Frame;
use crate::common::error::{CaptureError, Result};
use crate::grabber::{Grabber, ImageDescription};

/// What the capture helper needs from a camera.
pub trait Camera {
    /// Starts the live stream without a display window.
    fn start_stream(&mut self) -> Result<()>;
    fn stop_stream(&mut self) -> Result<()>;

    /// Waits for the next frame.
    fn snap_frame(&mut self, timeout: Option<Duration>) -> Result<()>;
    /// Copies the last snapped frame, rows top-down.
    fn copy_frame(&mut self) -> Result<Frame>;

    /// Exposure time in seconds.
    fn exposure(&mut self) -> Result<f32>;
    fn set_exposure(&mut self, seconds: f32) -> Result<()>;
    fn gain(&mut self) -> Result<i32>;
    fn set_gain(&mut self, gain: i32) -> Result<()>;

    /// Whether the camera currently controls exposure itself.
    fn auto_exposure(&mut self) -> Result<bool>;
    fn set_auto_exposure(&mut self, on: bool) -> Result<()>;
    fn auto_gain(&mut self) -> Result<bool>;
    fn set_auto_gain(&mut self, on: bool) -> Result<()>;
}

const EXPOSURE: &str = "Exposure";
const GAIN: &str = "Gain";

impl Camera for Grabber {
    fn start_stream(&mut self) -> Result<()> {
        Ok(self.start_live(false)?)
    }

    fn stop_stream(&mut self) -> Result<()> {
        Ok(self.stop_live()?)
    }

    fn snap_frame(&mut self, timeout: Option<Duration>) -> Result<()> {
        Ok(self.snap(timeout)?)
    }

    fn copy_frame(&mut self) -> Result<Frame> {
        let (desc, data) = self.read_frame()?;
        frame_from_sdk(desc, data)
    }

    fn exposure(&mut self) -> Result<f32> {
        Ok(self.property_absolute_value(EXPOSURE, "Value")?)
    }

    fn set_exposure(&mut self, seconds: f32) -> Result<()> {
        debug!(seconds, "Setting exposure");
        Ok(self.set_property_absolute_value(EXPOSURE, "Value", seconds)?)
    }

    fn gain(&mut self) -> Result<i32> {
        Ok(self.property_value(GAIN, "Value")?)
    }

    fn set_gain(&mut self, gain: i32) -> Result<()> {
        debug!(gain, "Setting gain");
        Ok(self.set_property_value(GAIN, "Value", gain)?)
    }

    fn auto_exposure(&mut self) -> Result<bool> {
        Ok(self.property_switch(EXPOSURE, "Auto")?)
    }

    fn set_auto_exposure(&mut self, on: bool) -> Result<()> {
        Ok(self.set_property_switch(EXPOSURE, "Auto", on)?)
    }

    fn auto_gain(&mut self) -> Result<bool> {
        Ok(self.property_switch(GAIN, "Auto")?)
    }

    fn set_auto_gain(&mut self, on: bool) -> Result<()> {
        Ok(self.set_property_switch(GAIN, "Auto", on)?)
    }
}

/// Wraps a top-down frame read from the SDK. Only non-empty frames from
/// 8-bit interleaved sinks whose reported depth matches their sample count
/// are accepted.
fn frame_from_sdk(desc: ImageDescription, data: Vec<u8>) -> Result<Frame> {
    let channels = desc.format.samples_per_pixel().ok_or_else(|| {
        CaptureError::UnsupportedFormat(format!("{:?} frames cannot be averaged", desc.format))
    })?;
    if desc.bytes_per_pixel() != channels {
        return Err(CaptureError::UnsupportedFormat(format!(
            "{:?} sink reports {} bits per pixel",
            desc.format, desc.bits_per_pixel
        )));
    }
    if desc.width == 0 || desc.height == 0 {
        return Err(CaptureError::UnsupportedFormat(format!(
            "{:?} sink reports an empty {}x{} frame",
            desc.format, desc.width, desc.height
        )));
    }
    Frame::new(desc.width, desc.height, channels, data)
}

/// Applies manual exposure and gain. Non-positive values leave the camera's
/// current setting (and its auto mode) untouched.
pub fn set_properties<C: Camera + ?Sized>(camera: &mut C, exposure: f32, gain: i32) -> Result<()> {
    if exposure > 0.0 {
        camera.set_auto_exposure(false)?;
        camera.set_exposure(exposure)?;
    }
    if gain > 0 {
        camera.set_auto_gain(false)?;
        camera.set_gain(gain)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grabber::SinkFormat;

    fn desc(width: usize, height: usize, format: SinkFormat, bits_per_pixel: usize) -> ImageDescription {
        ImageDescription {
            width,
            height,
            bits_per_pixel,
            format,
        }
    }

    #[test]
    fn rgb_frames_keep_their_layout() {
        let frame = frame_from_sdk(desc(2, 1, SinkFormat::Rgb24, 24), vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!((frame.width, frame.height, frame.channels), (2, 1, 3));
        assert_eq!(frame.pixel(1, 0), &[4, 5, 6]);
    }

    #[test]
    fn mono_and_rgba_sinks_are_accepted() {
        assert_eq!(frame_from_sdk(desc(2, 2, SinkFormat::Y800, 8), vec![0; 4]).unwrap().channels, 1);
        assert_eq!(frame_from_sdk(desc(1, 1, SinkFormat::Rgb32, 32), vec![0; 4]).unwrap().channels, 4);
    }

    #[test]
    fn packed_and_16bit_sinks_are_rejected() {
        for (format, bits) in [(SinkFormat::Uyvy, 16), (SinkFormat::Y16, 16)] {
            let err = frame_from_sdk(desc(2, 2, format, bits), vec![0; 8]).unwrap_err();
            assert!(matches!(err, CaptureError::UnsupportedFormat(_)), "{format:?}: {err}");
        }
    }

    #[test]
    fn depth_must_match_sample_count() {
        let err = frame_from_sdk(desc(1, 1, SinkFormat::Rgb32, 24), vec![0; 3]).unwrap_err();
        match err {
            CaptureError::UnsupportedFormat(msg) => assert_eq!(msg, "Rgb32 sink reports 24 bits per pixel"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn zero_sized_frames_are_rejected() {
        let err = frame_from_sdk(desc(0, 4, SinkFormat::Y800, 8), Vec::new()).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported sink format: Y800 sink reports an empty 0x4 frame");
        assert!(frame_from_sdk(desc(4, 0, SinkFormat::Rgb24, 24), Vec::new()).is_err());
    }
}
