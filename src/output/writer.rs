use std::io::Write;

use crate::capture::Frame;
use crate::common::error::Result;
use crate::hdr::HdrImage;
use crate::output::types::TiffOutputConfig;

pub trait ImageWriter {
    fn write_frame(&self, frame: &Frame, output: &mut dyn Write, config: &TiffOutputConfig) -> Result<()>;
    fn write_hdr(&self, image: &HdrImage, output: &mut dyn Write, config: &TiffOutputConfig) -> Result<()>;
}
