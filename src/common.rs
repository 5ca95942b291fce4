//! Common utilities module
//!
//! This module contains the error type shared by the capture helper and the
//! image writers, and the row helpers used on frame buffers.

pub mod error;
pub mod rows;

pub use error::{CaptureError, Result};
pub use rows::flip_rows;
