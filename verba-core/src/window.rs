//! Frame weighting envelopes applied before autocorrelation.
//!
//! Windowing tapers the edges of an analysis frame to limit the artifacts a
//! hard cut-off would smear into the spectral estimate. Each variant also
//! reports its average level (`gain`) so callers can rescale a windowed frame
//! by `1/gain` and keep energy comparable across window shapes.

use std::f32::consts::PI;
use std::str::FromStr;

use crate::error::VerbaError;

const HAMMING_ALPHA: f32 = 0.54;
const HAMMING_BETA: f32 = 1.0 - HAMMING_ALPHA;

/// Weighting envelope for one analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowFunction {
    /// Identity — the frame is used as-is.
    None,
    /// `0.54 − 0.46·cos(2πα)`.
    Hamming,
    /// `sin²(πα)`.
    #[default]
    Hann,
}

impl WindowFunction {
    /// Scale sample `i` of the frame by the envelope value at `i/(N−1)`,
    /// in place.
    ///
    /// Frames shorter than 2 samples are left untouched — there is no ramp
    /// to evaluate over a single point.
    pub fn apply(self, samples: &mut [f32]) {
        if self == WindowFunction::None || samples.len() < 2 {
            return;
        }

        let last = (samples.len() - 1) as f32;
        for (i, sample) in samples.iter_mut().enumerate() {
            *sample *= self.weight(i as f32 / last);
        }
    }

    fn weight(self, alpha: f32) -> f32 {
        match self {
            WindowFunction::None => 1.0,
            WindowFunction::Hamming => HAMMING_ALPHA - HAMMING_BETA * (2.0 * PI * alpha).cos(),
            WindowFunction::Hann => (PI * alpha).sin().powi(2),
        }
    }

    /// Average level of the envelope. Multiply a windowed frame by
    /// `1/gain()` to restore its average amplitude.
    pub fn gain(self) -> f32 {
        match self {
            WindowFunction::None => 1.0,
            WindowFunction::Hamming => (HAMMING_ALPHA + HAMMING_BETA) / 2.0,
            WindowFunction::Hann => 0.5,
        }
    }
}

impl FromStr for WindowFunction {
    type Err = VerbaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(WindowFunction::None),
            "hamming" => Ok(WindowFunction::Hamming),
            "hann" => Ok(WindowFunction::Hann),
            other => Err(VerbaError::UnknownWindowFunction(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn none_is_identity() {
        let mut samples = vec![0.3f32, -0.7, 0.1];
        WindowFunction::None.apply(&mut samples);
        assert_eq!(samples, vec![0.3, -0.7, 0.1]);
    }

    #[test]
    fn gains() {
        assert_eq!(WindowFunction::None.gain(), 1.0);
        assert_eq!(WindowFunction::Hamming.gain(), 0.5);
        assert_eq!(WindowFunction::Hann.gain(), 0.5);
    }

    #[test]
    fn hann_is_transparent_at_the_center() {
        // Odd length puts one sample exactly at α = 0.5 where sin²(πα) = 1.
        let mut samples = vec![0.8f32; 101];
        WindowFunction::Hann.apply(&mut samples);
        assert_abs_diff_eq!(samples[50], 0.8, epsilon = 1e-6);
        // Edges are fully attenuated.
        assert_abs_diff_eq!(samples[0], 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(samples[100], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn hann_gain_restores_average_amplitude() {
        let mut samples = vec![0.8f32; 1000];
        WindowFunction::Hann.apply(&mut samples);
        let inv_gain = 1.0 / WindowFunction::Hann.gain();
        for sample in &mut samples {
            *sample *= inv_gain;
        }
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        assert_abs_diff_eq!(mean, 0.8, epsilon = 1e-2);
    }

    #[test]
    fn hamming_edges_keep_the_pedestal() {
        let mut samples = vec![1.0f32; 11];
        WindowFunction::Hamming.apply(&mut samples);
        // Hamming does not reach zero at the edges: 0.54 − 0.46 = 0.08.
        assert_abs_diff_eq!(samples[0], 0.08, epsilon = 1e-6);
        assert_abs_diff_eq!(samples[10], 0.08, epsilon = 1e-6);
    }

    #[test]
    fn single_sample_frame_is_untouched() {
        let mut samples = vec![0.5f32];
        WindowFunction::Hann.apply(&mut samples);
        assert_eq!(samples, vec![0.5]);
    }

    #[test]
    fn parse_names() {
        assert_eq!("hann".parse::<WindowFunction>().unwrap(), WindowFunction::Hann);
        assert_eq!(
            "hamming".parse::<WindowFunction>().unwrap(),
            WindowFunction::Hamming
        );
        assert_eq!("none".parse::<WindowFunction>().unwrap(), WindowFunction::None);
        assert!("blackman".parse::<WindowFunction>().is_err());
    }
}
