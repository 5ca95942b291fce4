//! TIFF output module
//!
//! Writes averaged frames and merged HDR images to TIFF.

mod standard_tiff_writer;
pub mod types;
mod writer;

pub use standard_tiff_writer::StandardTiffWriter;
pub use types::{TiffCompression, TiffOutputConfig, TiffOutputConfigBuilder};
pub use writer::ImageWriter;
