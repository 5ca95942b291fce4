//! Bindings for The Imaging Source "tisgrabber" camera SDK, with a capture
//! helper for frame averaging and Debevec HDR merging.

pub mod capture;
pub mod cli;
pub mod common;
pub mod grabber;
pub mod hdr;
pub mod logger;
pub mod output;
