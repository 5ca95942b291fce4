//! HDR merge types

use thiserror::Error;

/// Merged radiance map, interleaved in the channel order of the source frames.
#[derive(Debug, Clone, PartialEq)]
pub struct HdrImage {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl HdrImage {
    pub fn pixel(&self, x: usize, y: usize) -> &[f32] {
        let start = (y * self.width + x) * self.channels;
        &self.data[start..start + self.channels]
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum HdrError {
    #[error("No images to merge")]
    NoImages,

    #[error("Got {images} images but {times} exposure times")]
    TimesMismatch { images: usize, times: usize },

    #[error("Exposure time {value} at index {index} is not positive")]
    NonPositiveTime { index: usize, value: f32 },

    #[error("Image {index} does not match the size or channel count of the first image")]
    ShapeMismatch { index: usize },

    #[error("Response curve has {curve} channels, images have {images}")]
    ResponseChannels { curve: usize, images: usize },

    #[error("Invalid response curve: {0}")]
    InvalidResponse(String),
}
