//! Safe types exchanged with the grabber handle

use std::os::raw::{c_int, c_long};

use crate::grabber::sys;

/// Pixel format the SDK delivers into memory (the "sink" format).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFormat {
    Y800,
    Rgb24,
    Rgb32,
    Uyvy,
    Y16,
}

impl SinkFormat {
    pub(crate) fn to_raw(self) -> c_int {
        let raw = match self {
            SinkFormat::Y800 => sys::COLORFORMAT::Y800,
            SinkFormat::Rgb24 => sys::COLORFORMAT::RGB24,
            SinkFormat::Rgb32 => sys::COLORFORMAT::RGB32,
            SinkFormat::Uyvy => sys::COLORFORMAT::UYVY,
            SinkFormat::Y16 => sys::COLORFORMAT::Y16,
        };
        raw as c_int
    }

    /// Unknown codes read back as RGB24, the SDK's default sink.
    pub(crate) fn from_raw(raw: c_int) -> Self {
        match raw {
            0 => SinkFormat::Y800,
            2 => SinkFormat::Rgb32,
            3 => SinkFormat::Uyvy,
            4 => SinkFormat::Y16,
            _ => SinkFormat::Rgb24,
        }
    }

    /// Number of interleaved 8-bit samples per pixel, if the format is one
    /// the capture helper can average.
    pub fn samples_per_pixel(self) -> Option<usize> {
        match self {
            SinkFormat::Y800 => Some(1),
            SinkFormat::Rgb24 => Some(3),
            SinkFormat::Rgb32 => Some(4),
            SinkFormat::Uyvy | SinkFormat::Y16 => None,
        }
    }
}

/// File type for [`Grabber::save_image`](crate::grabber::Grabber::save_image).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFileType {
    Bmp,
    Jpeg,
}

impl ImageFileType {
    pub(crate) fn to_raw(self) -> c_int {
        match self {
            ImageFileType::Bmp => sys::IMG_FILETYPE::FILETYPE_BMP as c_int,
            ImageFileType::Jpeg => sys::IMG_FILETYPE::FILETYPE_JPEG as c_int,
        }
    }
}

/// Layout of the frames currently produced by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDescription {
    pub width: usize,
    pub height: usize,
    pub bits_per_pixel: usize,
    pub format: SinkFormat,
}

impl ImageDescription {
    /// Builds a description from `IC_GetImageDescription` outputs. Negative
    /// sizes read as zero.
    pub(crate) fn from_sdk(width: c_long, height: c_long, bits: c_int, format: c_int) -> Self {
        Self {
            width: width.max(0) as usize,
            height: height.max(0) as usize,
            bits_per_pixel: bits.max(0) as usize,
            format: SinkFormat::from_raw(format),
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bits_per_pixel / 8
    }

    /// Size in bytes of one frame in the SDK's buffer.
    pub fn buffer_len(&self) -> usize {
        self.width * self.height * self.bytes_per_pixel()
    }
}

/// A connected device as reported by the SDK's device list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub index: usize,
    /// Model name, e.g. "DFK 33UX264".
    pub name: String,
    /// Model name and serial number separated by a space.
    pub unique_name: String,
}

/// Inclusive range reported by the SDK for a property element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyRange<T> {
    pub min: T,
    pub max: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sink_format_round_trips_known_codes() {
        for fmt in [
            SinkFormat::Y800,
            SinkFormat::Rgb24,
            SinkFormat::Rgb32,
            SinkFormat::Uyvy,
            SinkFormat::Y16,
        ] {
            assert_eq!(SinkFormat::from_raw(fmt.to_raw()), fmt);
        }
    }

    #[test]
    fn unknown_sink_code_reads_as_rgb24() {
        assert_eq!(SinkFormat::from_raw(17), SinkFormat::Rgb24);
        assert_eq!(SinkFormat::from_raw(-1), SinkFormat::Rgb24);
    }

    #[test]
    fn buffer_len_uses_whole_bytes() {
        let desc = ImageDescription {
            width: 640,
            height: 480,
            bits_per_pixel: 24,
            format: SinkFormat::Rgb24,
        };
        assert_eq!(desc.bytes_per_pixel(), 3);
        assert_eq!(desc.buffer_len(), 640 * 480 * 3);
    }

    #[test]
    fn negative_sdk_sizes_read_as_empty() {
        let desc = ImageDescription::from_sdk(-1, 480, 8, 0);
        assert_eq!(desc.width, 0);
        assert_eq!(desc.format, SinkFormat::Y800);
        assert_eq!(desc.buffer_len(), 0);
    }

    #[test]
    fn only_8bit_sinks_are_averageable() {
        assert_eq!(SinkFormat::Rgb32.samples_per_pixel(), Some(4));
        assert_eq!(SinkFormat::Y16.samples_per_pixel(), None);
        assert_eq!(SinkFormat::Uyvy.samples_per_pixel(), None);
    }
}
