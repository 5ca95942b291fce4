use crate::common::error::{CaptureError, Result};

/// Exposure times (seconds) bracketing a reference exposure for HDR capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureTable {
    reference: f32,
    times: [f32; 3],
}

impl ExposureTable {
    pub const FACTORS: [f32; 3] = [0.5, 1.0, 2.0];

    pub fn around(reference: f32) -> Result<Self> {
        if !(reference > 0.0) || !reference.is_finite() {
            return Err(CaptureError::InvalidConfig(format!(
                "reference exposure must be positive, camera reports {reference}"
            )));
        }
        Ok(Self {
            reference,
            times: Self::FACTORS.map(|f| reference * f),
        })
    }

    pub fn reference(&self) -> f32 {
        self.reference
    }

    pub fn times(&self) -> &[f32] {
        &self.times
    }
}
