use std::io::{Cursor, Write};

use tiff::encoder::colortype;
use tiff::encoder::compression::DeflateLevel;
use tiff::encoder::{Compression, TiffEncoder};
use tiff::tags::Predictor;
use tracing::debug;

use crate::capture::Frame;
use crate::common::error::{CaptureError, Result};
use crate::hdr::HdrImage;
use crate::output::types::{TiffCompression, TiffOutputConfig};
use crate::output::writer::ImageWriter;

pub struct StandardTiffWriter;

fn compression(config: &TiffOutputConfig) -> Compression {
    match config.compression {
        TiffCompression::None => Compression::Uncompressed,
        TiffCompression::Lzw => Compression::Lzw,
        TiffCompression::DeflateFast => Compression::Deflate(DeflateLevel::Fast),
        TiffCompression::DeflateBalanced => Compression::Deflate(DeflateLevel::Balanced),
        TiffCompression::DeflateBest => Compression::Deflate(DeflateLevel::Best),
    }
}

/// Reorders BGR(A) samples to RGB(A) in place.
pub(crate) fn swap_red_blue<T>(data: &mut [T], channels: usize) {
    if channels < 3 {
        return;
    }
    for px in data.chunks_exact_mut(channels) {
        px.swap(0, 2);
    }
}

// Encodes `$data` as a single-page TIFF of color type `$color`.
macro_rules! encode {
    ($color:ty, $width:expr, $height:expr, $data:expr, $predictor:expr, $config:expr) => {{
        let mut buffer = Vec::new();
        {
            let mut encoder = TiffEncoder::new(Cursor::new(&mut buffer))
                .map_err(|e| CaptureError::EncodeError(e.to_string()))?
                .with_compression(compression($config));
            if let Some(predictor) = $predictor {
                encoder = encoder.with_predictor(predictor);
            }
            encoder
                .write_image::<$color>($width as u32, $height as u32, $data)
                .map_err(|e| CaptureError::EncodeError(e.to_string()))?;
        }
        buffer
    }};
}

impl ImageWriter for StandardTiffWriter {
    fn write_frame(&self, frame: &Frame, output: &mut dyn Write, config: &TiffOutputConfig) -> Result<()> {
        debug!("Encoding TIFF frame: {}x{}x{}", frame.width, frame.height, frame.channels);

        let predictor = match config.predictor {
            Some(2) => Some(Predictor::Horizontal),
            Some(_) => Some(Predictor::None),
            None => None,
        };
        let mut data = frame.data.clone();
        swap_red_blue(&mut data, frame.channels);

        let (w, h) = (frame.width, frame.height);
        let buffer = match frame.channels {
            1 => encode!(colortype::Gray8, w, h, &data, predictor, config),
            3 => encode!(colortype::RGB8, w, h, &data, predictor, config),
            4 => encode!(colortype::RGBA8, w, h, &data, predictor, config),
            n => return Err(CaptureError::EncodeError(format!("cannot write {n}-channel frame"))),
        };
        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }

    fn write_hdr(&self, image: &HdrImage, output: &mut dyn Write, config: &TiffOutputConfig) -> Result<()> {
        debug!("Encoding float TIFF: {}x{}x{}", image.width, image.height, image.channels);

        let mut data = image.data.clone();
        swap_red_blue(&mut data, image.channels);

        let (w, h) = (image.width, image.height);
        let buffer = match image.channels {
            1 => encode!(colortype::Gray32Float, w, h, &data, None::<Predictor>, config),
            3 => encode!(colortype::RGB32Float, w, h, &data, None::<Predictor>, config),
            4 => encode!(colortype::RGBA32Float, w, h, &data, None::<Predictor>, config),
            n => return Err(CaptureError::EncodeError(format!("cannot write {n}-channel image"))),
        };
        output.write_all(&buffer)?;

        debug!("TIFF encoding complete");
        Ok(())
    }
}
