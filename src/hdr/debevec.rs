use tracing::{debug, instrument};

use crate::capture::Frame;
use crate::hdr::response::{LDR_SIZE, ResponseCurve, triangle_weights};
use crate::hdr::types::{HdrError, HdrImage};

/// Debevec & Malik radiance merge of bracketed 8-bit exposures.
///
/// For every pixel, each exposure contributes `ln f(z) - ln t` weighted by the
/// mean hat weight of the pixel's channels. The result is the exponential of
/// the weighted mean.
#[derive(Debug, Clone, Default)]
pub struct MergeDebevec {
    response: Option<ResponseCurve>,
}

impl MergeDebevec {
    /// Merge assuming a linear camera response.
    pub fn new() -> Self {
        Self { response: None }
    }

    pub fn with_response(response: ResponseCurve) -> Self {
        Self {
            response: Some(response),
        }
    }

    fn validate(images: &[Frame], times: &[f32]) -> Result<(), HdrError> {
        let first = images.first().ok_or(HdrError::NoImages)?;
        if images.len() != times.len() {
            return Err(HdrError::TimesMismatch {
                images: images.len(),
                times: times.len(),
            });
        }
        if let Some((index, &value)) = times
            .iter()
            .enumerate()
            .find(|(_, t)| !(**t > 0.0) || !t.is_finite())
        {
            return Err(HdrError::NonPositiveTime { index, value });
        }
        if first.channels == 0 {
            return Err(HdrError::ShapeMismatch { index: 0 });
        }
        if let Some(index) = images.iter().position(|img| !img.same_shape(first)) {
            return Err(HdrError::ShapeMismatch { index });
        }
        Ok(())
    }

    /// Merges `images` taken with exposure `times` (seconds) into a radiance map.
    #[instrument(skip_all, fields(images = images.len()))]
    pub fn process(&self, images: &[Frame], times: &[f32]) -> Result<HdrImage, HdrError> {
        Self::validate(images, times)?;
        let first = &images[0];
        let channels = first.channels;

        let linear;
        let response = match &self.response {
            Some(curve) => {
                if curve.channels() != channels {
                    return Err(HdrError::ResponseChannels {
                        curve: curve.channels(),
                        images: channels,
                    });
                }
                curve
            }
            None => {
                linear = ResponseCurve::linear(channels);
                &linear
            }
        };
        let log_response = response.log_table();
        let weights = triangle_weights();
        let log_times: Vec<f32> = times.iter().map(|t| t.ln()).collect();

        let pixels = first.width * first.height;
        let mut result = vec![0.0f32; pixels * channels];
        let mut weight_sum = vec![0.0f32; pixels];

        for (image, log_t) in images.iter().zip(&log_times) {
            for (p, samples) in image.data.chunks_exact(channels).enumerate() {
                let w = samples.iter().map(|&z| weights[z as usize]).sum::<f32>() / channels as f32;
                let out = &mut result[p * channels..(p + 1) * channels];
                for (c, (&z, acc)) in samples.iter().zip(out.iter_mut()).enumerate() {
                    *acc += w * (log_response[z as usize * channels + c] - log_t);
                }
                weight_sum[p] += w;
            }
        }

        // Hat weights are at least 1, so every sum is positive.
        for (p, acc) in result.chunks_exact_mut(channels).enumerate() {
            let inv = 1.0 / weight_sum[p];
            for v in acc {
                *v = (*v * inv).exp();
            }
        }

        debug!(
            width = first.width,
            height = first.height,
            channels,
            levels = LDR_SIZE,
            "Merged exposures"
        );
        Ok(HdrImage {
            width: first.width,
            height: first.height,
            channels,
            data: result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(width: usize, height: usize, channels: usize, level: u8) -> Frame {
        Frame::new(width, height, channels, vec![level; width * height * channels]).unwrap()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() <= 1e-3 * b.abs().max(1.0)
    }

    #[test]
    fn single_exposure_recovers_level_over_time() {
        let img = flat(2, 2, 3, 100);
        let hdr = MergeDebevec::new().process(&[img], &[0.5]).unwrap();
        assert_eq!(hdr.data.len(), 12);
        assert!(hdr.data.iter().all(|v| close(*v, 200.0)));
    }

    #[test]
    fn consistent_bracket_agrees_on_radiance() {
        // Radiance 400: 0.25 s -> 100, 0.5 s -> 200.
        let images = [flat(1, 1, 1, 100), flat(1, 1, 1, 200)];
        let hdr = MergeDebevec::new().process(&images, &[0.25, 0.5]).unwrap();
        assert!(close(hdr.data[0], 400.0), "got {}", hdr.data[0]);
    }

    #[test]
    fn mid_tones_dominate_clipped_samples() {
        // The 2 s exposure is saturated (weight 1); the 1 s one sits mid-range.
        let images = [flat(1, 1, 1, 120), flat(1, 1, 1, 255)];
        let hdr = MergeDebevec::new().process(&images, &[1.0, 2.0]).unwrap();
        let ln = (121.0 * 120f32.ln() + 1.0 * (255f32.ln() - 2f32.ln())) / 122.0;
        assert!(close(hdr.data[0], ln.exp()));
    }

    #[test]
    fn black_pixels_stay_finite() {
        let hdr = MergeDebevec::new().process(&[flat(1, 1, 3, 0)], &[1.0]).unwrap();
        assert!(hdr.data.iter().all(|v| v.is_finite() && *v > 0.0));
    }

    #[test]
    fn weight_is_shared_across_channels() {
        let img = Frame::new(1, 1, 3, vec![10, 128, 250]).unwrap();
        let hdr = MergeDebevec::new().process(&[img], &[1.0]).unwrap();
        assert!(close(hdr.pixel(0, 0)[0], 10.0));
        assert!(close(hdr.pixel(0, 0)[1], 128.0));
        assert!(close(hdr.pixel(0, 0)[2], 250.0));
    }

    #[test]
    fn empty_input_is_rejected() {
        assert_eq!(MergeDebevec::new().process(&[], &[]).unwrap_err(), HdrError::NoImages);
    }

    #[test]
    fn times_must_match_images() {
        let err = MergeDebevec::new()
            .process(&[flat(1, 1, 1, 1)], &[1.0, 2.0])
            .unwrap_err();
        assert_eq!(err, HdrError::TimesMismatch { images: 1, times: 2 });
    }

    #[test]
    fn non_positive_time_is_rejected() {
        let images = [flat(1, 1, 1, 1), flat(1, 1, 1, 1)];
        let err = MergeDebevec::new().process(&images, &[1.0, 0.0]).unwrap_err();
        assert_eq!(err, HdrError::NonPositiveTime { index: 1, value: 0.0 });
    }

    #[test]
    fn shapes_must_match() {
        let images = [flat(2, 1, 1, 1), flat(1, 2, 1, 1)];
        let err = MergeDebevec::new().process(&images, &[1.0, 2.0]).unwrap_err();
        assert_eq!(err, HdrError::ShapeMismatch { index: 1 });
    }

    #[test]
    fn custom_response_channels_must_match() {
        let merge = MergeDebevec::with_response(ResponseCurve::linear(1));
        let err = merge.process(&[flat(1, 1, 3, 1)], &[1.0]).unwrap_err();
        assert_eq!(err, HdrError::ResponseChannels { curve: 1, images: 3 });
    }
}
