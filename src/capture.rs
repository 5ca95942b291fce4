//! Capture helper
//!
//! Sets exposure and gain on a camera, averages several snapped frames to
//! reduce noise, and optionally brackets three exposures and merges them into
//! an HDR radiance map.

mod average;
mod camera;
mod exposure;
mod pipeline;
mod timing;
pub mod types;


pub use average::{FrameAccumulator, average_frames};
pub use camera::{Camera, set_properties};
pub use exposure::ExposureTable;
pub use pipeline::CapturePipeline;
pub use timing::{PipelineTimings, StepTiming, Timer};
pub use types::{CaptureConfig, CaptureConfigBuilder, CaptureOutput, DEFAULT_SNAP_TIMEOUT, Frame};
