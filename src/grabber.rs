//! Binding to The Imaging Source tisgrabber SDK
//!
//! `sys` declares the C ABI; `GrabberLibrary` loads it at runtime and
//! `Grabber` wraps one device handle with owned, checked calls.

mod error;
mod handle;
mod library;
pub mod sys;
pub mod types;

pub use error::{GrabberError, Result, status_name};
pub use handle::Grabber;
pub use library::GrabberLibrary;
pub use types::{DeviceInfo, ImageDescription, ImageFileType, PropertyRange, SinkFormat};
