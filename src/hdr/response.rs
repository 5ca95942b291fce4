//! Camera response curves and pixel weights for the Debevec merge.

use crate::hdr::types::HdrError;

/// Number of levels in an 8-bit sample.
pub const LDR_SIZE: usize = 256;

/// Maps each 8-bit level to relative irradiance, per channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseCurve {
    channels: usize,
    // LDR_SIZE rows of `channels` values.
    table: Vec<f32>,
}

impl ResponseCurve {
    /// Identity response. Level 0 maps to 1 like level 1, so its log stays finite.
    pub fn linear(channels: usize) -> Self {
        let mut table = Vec::with_capacity(LDR_SIZE * channels);
        for z in 0..LDR_SIZE {
            let value = z.max(1) as f32;
            table.extend(std::iter::repeat_n(value, channels));
        }
        Self { channels, table }
    }

    /// Builds a curve from `LDR_SIZE * channels` strictly positive values.
    pub fn from_table(channels: usize, table: Vec<f32>) -> Result<Self, HdrError> {
        if channels == 0 {
            return Err(HdrError::InvalidResponse("zero channels".to_string()));
        }
        if table.len() != LDR_SIZE * channels {
            return Err(HdrError::InvalidResponse(format!(
                "expected {} values, got {}",
                LDR_SIZE * channels,
                table.len()
            )));
        }
        if let Some(bad) = table.iter().find(|v| !(**v > 0.0) || !v.is_finite()) {
            return Err(HdrError::InvalidResponse(format!(
                "values must be positive and finite, found {bad}"
            )));
        }
        Ok(Self { channels, table })
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn value(&self, level: u8, channel: usize) -> f32 {
        self.table[level as usize * self.channels + channel]
    }

    /// Natural log of the table, laid out like the table itself.
    pub(crate) fn log_table(&self) -> Vec<f32> {
        self.table.iter().map(|v| v.ln()).collect()
    }
}

/// Hat weighting: mid-tones count most, clipped levels least.
pub fn triangle_weights() -> [f32; LDR_SIZE] {
    let half = LDR_SIZE / 2;
    let mut w = [0.0f32; LDR_SIZE];
    for (z, weight) in w.iter_mut().enumerate() {
        *weight = if z < half {
            (z + 1) as f32
        } else {
            (LDR_SIZE - z) as f32
        };
    }
    w
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_peaks_in_the_middle() {
        let w = triangle_weights();
        assert_eq!(w[0], 1.0);
        assert_eq!(w[127], 128.0);
        assert_eq!(w[128], 128.0);
        assert_eq!(w[255], 1.0);
        assert!(w.iter().all(|v| *v > 0.0));
    }

    #[test]
    fn linear_response_avoids_zero() {
        let curve = ResponseCurve::linear(3);
        assert_eq!(curve.value(0, 0), 1.0);
        assert_eq!(curve.value(1, 2), 1.0);
        assert_eq!(curve.value(200, 1), 200.0);
        assert!(curve.log_table().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn table_length_is_checked() {
        let err = ResponseCurve::from_table(3, vec![1.0; 10]).unwrap_err();
        assert!(matches!(err, HdrError::InvalidResponse(_)));
    }

    #[test]
    fn non_positive_entries_are_rejected() {
        let mut table = vec![1.0; LDR_SIZE];
        table[5] = 0.0;
        assert!(ResponseCurve::from_table(1, table).is_err());
    }
}
