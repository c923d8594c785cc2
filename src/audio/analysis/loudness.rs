use crate::audio::config;
use crate::audio::errors::AudioAnalysisError;

use super::weighting::KWeightingFilter;

/// Anything that can reduce a decoded recording to a single integrated
/// loudness value. The engine is backend-agnostic at this seam; an
/// accelerated implementation may be substituted for [`KWeightedMeter`].
pub trait MeterBackend: Send + Sync {
    /// Returns integrated loudness in LUFS, or negative infinity when no
    /// gating block exceeded the absolute gate.
    fn measure(&self, channels: &[Vec<f32>], sample_rate: f32) -> Result<f64, AudioAnalysisError>;
}

/// Loudness of one 400 ms gating block.
#[derive(Debug, Clone, Copy)]
pub struct LoudnessBlock {
    pub index: usize,
    pub loudness_lufs: f64,
}

/// Built-in meter: K-weighting followed by two-stage block gating.
#[derive(Debug, Default, Clone, Copy)]
pub struct KWeightedMeter;

impl KWeightedMeter {
    pub fn new() -> Self {
        KWeightedMeter
    }
}

fn power_to_lufs(power: f64) -> f64 {
    if power <= 0.0 {
        return f64::NEG_INFINITY;
    }
    config::LOUDNESS_REFERENCE_OFFSET + 10.0 * power.log10()
}

fn mean_square(block: &[f64]) -> f64 {
    if block.is_empty() {
        return 0.0;
    }
    block.iter().map(|s| s * s).sum::<f64>() / block.len() as f64
}

/// Weights one channel and reduces it to per-block mean-square powers.
/// Filter delay state persists across the whole channel; the trailing
/// partial block is discarded.
fn channel_block_powers(
    samples: &[f32],
    sample_rate: f32,
) -> Result<Vec<f64>, AudioAnalysisError> {
    let block_len = (f64::from(sample_rate) * config::GATING_BLOCK_SECS).floor() as usize;
    let mut filter = KWeightingFilter::new(sample_rate)?;
    Ok(samples
        .chunks_exact(block_len)
        .map(|chunk| mean_square(&filter.process(chunk)))
        .collect())
}

fn validate(channels: &[Vec<f32>], sample_rate: f32) -> Result<usize, AudioAnalysisError> {
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(AudioAnalysisError::InvalidSampleRate(sample_rate));
    }
    if channels.is_empty() {
        return Err(AudioAnalysisError::NoChannels);
    }
    let expected = channels[0].len();
    if expected == 0 {
        return Err(AudioAnalysisError::EmptySamples);
    }
    for (i, ch) in channels.iter().enumerate() {
        if ch.len() != expected {
            return Err(AudioAnalysisError::ChannelLengthMismatch {
                channel: i,
                expected,
                actual: ch.len(),
            });
        }
    }
    Ok(expected)
}

/// Per-block combined powers for the whole recording.
///
/// Channel policy: one channel is used as-is; two channels are weighted
/// independently and their block powers summed; more than two channels are
/// averaged sample-wise into mono first (documented simplification).
fn combined_block_powers(
    channels: &[Vec<f32>],
    sample_rate: f32,
) -> Result<Vec<f64>, AudioAnalysisError> {
    match channels.len() {
        1 => channel_block_powers(&channels[0], sample_rate),
        2 => {
            let (left, right) = rayon::join(
                || channel_block_powers(&channels[0], sample_rate),
                || channel_block_powers(&channels[1], sample_rate),
            );
            let left = left?;
            let right = right?;
            Ok(left
                .into_iter()
                .zip(right)
                .map(|(l, r)| l + r)
                .collect())
        }
        n => {
            let len = channels[0].len();
            let inv_count = 1.0 / n as f32;
            let mono: Vec<f32> = (0..len)
                .map(|i| channels.iter().map(|ch| ch[i]).sum::<f32>() * inv_count)
                .collect();
            channel_block_powers(&mono, sample_rate)
        }
    }
}

/// Loudness of every gating block, before any gate is applied.
pub fn block_loudness(
    channels: &[Vec<f32>],
    sample_rate: f32,
) -> Result<Vec<LoudnessBlock>, AudioAnalysisError> {
    validate(channels, sample_rate)?;
    let powers = combined_block_powers(channels, sample_rate)?;
    Ok(powers
        .iter()
        .enumerate()
        .map(|(index, &p)| LoudnessBlock {
            index,
            loudness_lufs: power_to_lufs(p),
        })
        .collect())
}

impl MeterBackend for KWeightedMeter {
    fn measure(&self, channels: &[Vec<f32>], sample_rate: f32) -> Result<f64, AudioAnalysisError> {
        validate(channels, sample_rate)?;
        let powers = combined_block_powers(channels, sample_rate)?;

        // Stage 1: absolute gate. Blocks at or below -70 LUFS are discarded
        // and the remainder averaged in the power domain.
        let absolute_survivors: Vec<f64> = powers
            .iter()
            .copied()
            .filter(|&p| power_to_lufs(p) > config::ABSOLUTE_GATE_LUFS)
            .collect();
        if absolute_survivors.is_empty() {
            return Ok(f64::NEG_INFINITY);
        }
        let gated_loudness = power_to_lufs(
            absolute_survivors.iter().sum::<f64>() / absolute_survivors.len() as f64,
        );

        // Stage 2: relative gate at the first-stage result minus 10 LU.
        let relative_threshold = gated_loudness + config::RELATIVE_GATE_OFFSET_LU;
        let relative_survivors: Vec<f64> = absolute_survivors
            .into_iter()
            .filter(|&p| power_to_lufs(p) > relative_threshold)
            .collect();
        if relative_survivors.is_empty() {
            return Ok(f64::NEG_INFINITY);
        }

        Ok(power_to_lufs(
            relative_survivors.iter().sum::<f64>() / relative_survivors.len() as f64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, amplitude: f32, sample_rate: f32, seconds: f32) -> Vec<f32> {
        let count = (sample_rate * seconds) as usize;
        (0..count)
            .map(|i| {
                amplitude * (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin()
            })
            .collect()
    }

    #[test]
    fn digital_silence_is_negative_infinity() {
        let meter = KWeightedMeter::new();
        let result = meter.measure(&[vec![0.0; 48000]], 48000.0).unwrap();
        assert_eq!(result, f64::NEG_INFINITY);
    }

    #[test]
    fn shorter_than_one_block_is_negative_infinity() {
        let meter = KWeightedMeter::new();
        // 100 ms at 48 kHz never fills a 400 ms block.
        let result = meter.measure(&[vec![0.5; 4800]], 48000.0).unwrap();
        assert_eq!(result, f64::NEG_INFINITY);
    }

    #[test]
    fn rejects_invalid_input() {
        let meter = KWeightedMeter::new();
        assert!(matches!(
            meter.measure(&[], 48000.0),
            Err(AudioAnalysisError::NoChannels)
        ));
        assert!(matches!(
            meter.measure(&[Vec::new()], 48000.0),
            Err(AudioAnalysisError::EmptySamples)
        ));
        assert!(matches!(
            meter.measure(&[vec![0.0; 100]], 0.0),
            Err(AudioAnalysisError::InvalidSampleRate(_))
        ));
        assert!(matches!(
            meter.measure(&[vec![0.0; 100], vec![0.0; 99]], 48000.0),
            Err(AudioAnalysisError::ChannelLengthMismatch { channel: 1, .. })
        ));
    }

    #[test]
    fn stationary_sine_blocks_are_uniform() {
        // Full-scale 1 kHz sine has mean-square 0.5; the signal is
        // stationary so every 400 ms block reads the same loudness and no
        // gate removes anything.
        let signal = sine(1000.0, 1.0, 48000.0, 2.0);
        let blocks = block_loudness(&[signal.clone()], 48000.0).unwrap();
        assert_eq!(blocks.len(), 5);
        // The first block carries the filter settling transient; compare the
        // steady-state blocks tightly and the first one loosely.
        let reference = blocks[2].loudness_lufs;
        for block in &blocks[1..] {
            assert!((block.loudness_lufs - reference).abs() < 0.01);
        }
        assert!((blocks[0].loudness_lufs - reference).abs() < 0.1);

        let meter = KWeightedMeter::new();
        let integrated = meter.measure(&[signal], 48000.0).unwrap();
        assert!((integrated - reference).abs() < 0.05);
        // A full-scale ~1 kHz sine reads about -3 LUFS.
        assert!((integrated + 3.01).abs() < 0.2, "integrated = {integrated}");
    }

    #[test]
    fn stereo_measurement_is_channel_order_invariant() {
        let left = sine(440.0, 0.8, 48000.0, 1.0);
        let right = sine(1000.0, 0.3, 48000.0, 1.0);
        let meter = KWeightedMeter::new();
        let forward = meter
            .measure(&[left.clone(), right.clone()], 48000.0)
            .unwrap();
        let swapped = meter.measure(&[right, left], 48000.0).unwrap();
        assert!((forward - swapped).abs() < 1e-9);
    }

    #[test]
    fn stereo_sums_channel_powers() {
        // Identical content in both channels doubles the block power, which
        // reads 3.01 dB louder than the mono measurement.
        let signal = sine(1000.0, 0.5, 48000.0, 1.0);
        let meter = KWeightedMeter::new();
        let mono = meter.measure(&[signal.clone()], 48000.0).unwrap();
        let stereo = meter
            .measure(&[signal.clone(), signal], 48000.0)
            .unwrap();
        assert!((stereo - mono - 3.0103).abs() < 0.01);
    }

    #[test]
    fn quiet_tail_is_gated_out() {
        // Two full blocks of tone followed by silence: the quiet blocks fall
        // under the gates and must not drag the average down.
        let mut signal = sine(1000.0, 0.5, 48000.0, 0.8);
        signal.extend(std::iter::repeat(0.0).take(48000 + 9600));
        let meter = KWeightedMeter::new();
        let gated = meter.measure(&[signal], 48000.0).unwrap();
        let tone_only = meter
            .measure(&[sine(1000.0, 0.5, 48000.0, 0.8)], 48000.0)
            .unwrap();
        assert!(
            (gated - tone_only).abs() < 0.05,
            "gated = {gated}, tone_only = {tone_only}"
        );
    }
}
