//! HDR merge module
//!
//! Merges bracketed 8-bit exposures into a floating point radiance map using
//! the Debevec & Malik estimator.

mod debevec;
mod response;
mod types;

pub use debevec::MergeDebevec;
pub use response::{LDR_SIZE, ResponseCurve, triangle_weights};
pub use types::{HdrError, HdrImage};
