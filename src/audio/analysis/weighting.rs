use std::f64::consts::PI;

use biquad::{Biquad, Coefficients, DirectForm1};

use crate::audio::config;
use crate::audio::errors::AudioAnalysisError;

/// Perceptual (K-)weighting filter: a high-frequency pre-emphasis shelf
/// cascaded into a low-frequency roll-off. Coefficients are derived once per
/// sample rate; delay state persists for the life of the stream and is never
/// reset at block boundaries.
pub struct KWeightingFilter {
    shelf: DirectForm1<f64>,
    highpass: DirectForm1<f64>,
}

/// High-frequency boost shelf, bilinear-transformed from the analog
/// prototype with `K = tan(PI * f0 / fs)`.
fn shelf_coefficients(fs: f64) -> Coefficients<f64> {
    let k = (PI * config::SHELF_CENTER_HZ / fs).tan();
    let k2 = k * k;
    let q = config::SHELF_Q;
    let vh = 10.0_f64.powf(config::SHELF_GAIN_DB / 20.0);
    let vb = vh.powf(config::SHELF_MIDPOINT_EXPONENT);
    let a0 = 1.0 + k / q + k2;

    Coefficients {
        b0: (vh + vb * k / q + k2) / a0,
        b1: 2.0 * (k2 - vh) / a0,
        b2: (vh - vb * k / q + k2) / a0,
        a1: 2.0 * (k2 - 1.0) / a0,
        a2: (1.0 - k / q + k2) / a0,
    }
}

/// Low-frequency roll-off (revised low-frequency B-weighting high-pass).
/// The numerator is left unnormalized, matching the reference response.
fn highpass_coefficients(fs: f64) -> Coefficients<f64> {
    let k = (PI * config::HIGHPASS_CORNER_HZ / fs).tan();
    let k2 = k * k;
    let q = config::HIGHPASS_Q;
    let a0 = 1.0 + k / q + k2;

    Coefficients {
        b0: 1.0,
        b1: -2.0,
        b2: 1.0,
        a1: 2.0 * (k2 - 1.0) / a0,
        a2: (1.0 - k / q + k2) / a0,
    }
}

impl KWeightingFilter {
    pub fn new(sample_rate: f32) -> Result<Self, AudioAnalysisError> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(AudioAnalysisError::InvalidSampleRate(sample_rate));
        }
        let fs = f64::from(sample_rate);
        Ok(Self {
            shelf: DirectForm1::<f64>::new(shelf_coefficients(fs)),
            highpass: DirectForm1::<f64>::new(highpass_coefficients(fs)),
        })
    }

    /// Processes one sample through both weighting stages.
    #[inline]
    pub fn run(&mut self, input: f64) -> f64 {
        self.highpass.run(self.shelf.run(input))
    }

    /// Processes a block of samples. Same length out as in; causal; delay
    /// state carries over into the next call.
    pub fn process(&mut self, block: &[f32]) -> Vec<f64> {
        block.iter().map(|&s| self.run(f64::from(s))).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_sample_rate() {
        assert!(matches!(
            KWeightingFilter::new(0.0),
            Err(AudioAnalysisError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            KWeightingFilter::new(-44100.0),
            Err(AudioAnalysisError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            KWeightingFilter::new(f32::NAN),
            Err(AudioAnalysisError::InvalidSampleRate(_))
        ));
    }

    #[test]
    fn zero_input_yields_zero_output() {
        let mut filter = KWeightingFilter::new(48000.0).unwrap();
        let out = filter.process(&[0.0; 4800]);
        assert_eq!(out.len(), 4800);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn shelf_matches_reference_at_48k() {
        // Reference second-stage coefficients for 48 kHz from the ITU tables.
        let c = shelf_coefficients(48000.0);
        assert!((c.b0 - 1.53512485958697).abs() < 1e-4, "b0 = {}", c.b0);
        assert!((c.b1 - -2.69169618940638).abs() < 1e-4, "b1 = {}", c.b1);
        assert!((c.b2 - 1.19839281085285).abs() < 1e-4, "b2 = {}", c.b2);
        assert!((c.a1 - -1.69065929318241).abs() < 1e-4, "a1 = {}", c.a1);
        assert!((c.a2 - 0.73248077421585).abs() < 1e-4, "a2 = {}", c.a2);
    }

    #[test]
    fn highpass_matches_reference_at_48k() {
        let c = highpass_coefficients(48000.0);
        assert_eq!(c.b0, 1.0);
        assert_eq!(c.b1, -2.0);
        assert_eq!(c.b2, 1.0);
        assert!((c.a1 - -1.99004745483398).abs() < 1e-6, "a1 = {}", c.a1);
        assert!((c.a2 - 0.99007225036621).abs() < 1e-6, "a2 = {}", c.a2);
    }

    #[test]
    fn state_persists_across_calls() {
        let signal: Vec<f32> = (0..2000)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin())
            .collect();

        let mut whole = KWeightingFilter::new(48000.0).unwrap();
        let expected = whole.process(&signal);

        let mut split = KWeightingFilter::new(48000.0).unwrap();
        let mut actual = split.process(&signal[..700]);
        actual.extend(split.process(&signal[700..]));

        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < 1e-12);
        }
    }
}
