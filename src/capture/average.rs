use std::time::Duration;

use tracing::{debug, instrument};

use crate::capture::camera::Camera;
use crate::capture::types::Frame;
use crate::common::error::{CaptureError, Result};
use crate::common::flip_rows;

/// Running mean of `count` frames of identical shape.
///
/// Each sample is divided by `count` as it is added, then the sum is clipped
/// to `[0, 255]` and truncated when the accumulator is finished. The f32
/// quotients can sum to just under the true mean, so identical frames may
/// come out one level darker (six frames of 7 give 6).
#[derive(Debug)]
pub struct FrameAccumulator {
    count: u32,
    added: usize,
    shape: Option<(usize, usize, usize)>,
    sum: Vec<f32>,
}

impl FrameAccumulator {
    pub fn new(count: u32) -> Result<Self> {
        if count == 0 {
            return Err(CaptureError::InvalidConfig(
                "cannot average zero frames".to_string(),
            ));
        }
        Ok(Self {
            count,
            added: 0,
            shape: None,
            sum: Vec::new(),
        })
    }

    pub fn add(&mut self, frame: &Frame) -> Result<()> {
        let shape = (frame.width, frame.height, frame.channels);
        match self.shape {
            None => {
                self.shape = Some(shape);
                self.sum = vec![0.0; frame.data.len()];
            }
            Some((w, h, c)) if (w, h, c) != shape => {
                return Err(CaptureError::FrameMismatch {
                    index: self.added,
                    width: frame.width,
                    height: frame.height,
                    channels: frame.channels,
                    expected: format!("{w}x{h}x{c}"),
                });
            }
            Some(_) => {}
        }
        let n = self.count as f32;
        for (acc, &v) in self.sum.iter_mut().zip(&frame.data) {
            *acc += v as f32 / n;
        }
        self.added += 1;
        Ok(())
    }

    pub fn added(&self) -> usize {
        self.added
    }

    pub fn finish(self, flip_vertical: bool) -> Result<Frame> {
        let (width, height, channels) = self.shape.ok_or_else(|| {
            CaptureError::InvalidConfig("no frames were accumulated".to_string())
        })?;
        let row = width * channels;
        let mut data: Vec<u8> = self.sum.iter().map(|v| v.clamp(0.0, 255.0) as u8).collect();
        if flip_vertical {
            flip_rows(&mut data, row);
        }
        Frame::new(width, height, channels, data)
    }
}

/// Snaps `count` frames and returns their mean.
#[instrument(skip(camera, timeout))]
pub fn average_frames<C: Camera + ?Sized>(
    camera: &mut C,
    count: u32,
    timeout: Option<Duration>,
    flip_vertical: bool,
) -> Result<Frame> {
    let mut acc = FrameAccumulator::new(count)?;
    for _ in 0..count {
        camera.snap_frame(timeout)?;
        let frame = camera.copy_frame()?;
        acc.add(&frame)?;
    }
    debug!(frames = acc.added(), "Averaged frames");
    acc.finish(flip_vertical)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(width: usize, height: usize, data: Vec<u8>) -> Frame {
        let channels = data.len() / (width * height);
        Frame::new(width, height, channels, data).unwrap()
    }

    #[test]
    fn mean_truncates() {
        let mut acc = FrameAccumulator::new(2).unwrap();
        acc.add(&frame(1, 1, vec![10])).unwrap();
        acc.add(&frame(1, 1, vec![13])).unwrap();
        assert_eq!(acc.finish(false).unwrap().data, vec![11]);
    }

    #[test]
    fn identical_frames_can_lose_a_level() {
        let mut acc = FrameAccumulator::new(6).unwrap();
        for _ in 0..6 {
            acc.add(&frame(1, 1, vec![7])).unwrap();
        }
        assert_eq!(acc.finish(false).unwrap().data, vec![6]);

        let mut acc = FrameAccumulator::new(2).unwrap();
        for _ in 0..2 {
            acc.add(&frame(1, 1, vec![7])).unwrap();
        }
        assert_eq!(acc.finish(false).unwrap().data, vec![7]);
    }

    #[test]
    fn bright_frames_clip_at_255() {
        let mut acc = FrameAccumulator::new(3).unwrap();
        for _ in 0..3 {
            acc.add(&frame(1, 1, vec![255, 255, 255])).unwrap();
        }
        assert_eq!(acc.finish(false).unwrap().data, vec![255, 255, 255]);
    }

    #[test]
    fn fewer_frames_than_count_darken() {
        let mut acc = FrameAccumulator::new(4).unwrap();
        acc.add(&frame(1, 1, vec![200])).unwrap();
        assert_eq!(acc.finish(false).unwrap().data, vec![50]);
    }

    #[test]
    fn flip_reverses_row_order() {
        let mut acc = FrameAccumulator::new(1).unwrap();
        acc.add(&frame(2, 3, vec![1, 2, 3, 4, 5, 6])).unwrap();
        let out = acc.finish(true).unwrap();
        assert_eq!(out.data, vec![5, 6, 3, 4, 1, 2]);
    }

    #[test]
    fn shape_change_is_reported() {
        let mut acc = FrameAccumulator::new(2).unwrap();
        acc.add(&frame(2, 2, vec![0; 4])).unwrap();
        let err = acc.add(&frame(1, 2, vec![0; 2])).unwrap_err();
        match err {
            CaptureError::FrameMismatch { index, width, expected, .. } => {
                assert_eq!(index, 1);
                assert_eq!(width, 1);
                assert_eq!(expected, "2x2x1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_accumulator_fails() {
        let acc = FrameAccumulator::new(1).unwrap();
        assert!(acc.finish(false).is_err());
        assert!(FrameAccumulator::new(0).is_err());
    }
}
