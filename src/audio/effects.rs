use std::collections::HashMap;

use biquad::{Biquad as _, Coefficients, DirectForm1, ToHertz, Type};
use lazy_static::lazy_static;

use crate::audio::config;
use crate::audio::errors::AudioEffectsError;
use crate::audio::types::{BandGains, EqParams};

// --- Band Specifications ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandKind {
    LowShelf,
    Peaking,
    HighShelf,
}

/// One parametric stage. Center frequency and Q are fixed once created;
/// only the gain is meant to change over the stage's lifetime.
#[derive(Debug, Clone, Copy)]
pub struct EqBandSpec {
    pub kind: BandKind,
    pub center_hz: f32,
    pub q: f32,
    pub gain_db: f32,
}

impl EqBandSpec {
    /// Two specs describe the same stage when everything but gain matches.
    fn same_identity(&self, other: &Self) -> bool {
        const EPSILON: f32 = 1e-3;
        self.kind == other.kind
            && (self.center_hz - other.center_hz).abs() < EPSILON
            && (self.q - other.q).abs() < EPSILON
    }
}

/// Specs for the simplified 3-band topology: bass low shelf, mid peak,
/// treble high shelf at the configured crossover frequencies.
pub fn three_band_specs(params: &EqParams) -> Vec<EqBandSpec> {
    vec![
        EqBandSpec {
            kind: BandKind::LowShelf,
            center_hz: config::LOW_MID_CROSSOVER_HZ,
            q: config::SHELF_Q_FACTOR,
            gain_db: params.low_gain_db,
        },
        EqBandSpec {
            kind: BandKind::Peaking,
            center_hz: config::MID_CENTER_HZ,
            q: config::MID_PEAK_Q_FACTOR,
            gain_db: params.mid_gain_db,
        },
        EqBandSpec {
            kind: BandKind::HighShelf,
            center_hz: config::MID_HIGH_CROSSOVER_HZ,
            q: config::SHELF_Q_FACTOR,
            gain_db: params.high_gain_db,
        },
    ]
}

/// Specs for the 10-band ISO-spaced topology (all peaking, Q = 1).
pub fn ten_band_specs(gains: &BandGains) -> Vec<EqBandSpec> {
    let gains = gains.clamped();
    config::ISO_BAND_CENTERS_HZ
        .iter()
        .zip(gains.0.iter())
        .map(|(&center_hz, &gain_db)| EqBandSpec {
            kind: BandKind::Peaking,
            center_hz,
            q: config::ISO_BAND_Q_FACTOR,
            gain_db,
        })
        .collect()
}

fn band_coefficients(
    spec: &EqBandSpec,
    sample_rate: f32,
) -> Result<Coefficients<f32>, AudioEffectsError> {
    let filter_type = match spec.kind {
        BandKind::LowShelf => Type::LowShelf(spec.gain_db),
        BandKind::Peaking => Type::PeakingEQ(spec.gain_db),
        BandKind::HighShelf => Type::HighShelf(spec.gain_db),
    };
    Coefficients::<f32>::from_params(
        filter_type,
        sample_rate.hz(),
        spec.center_hz.hz(),
        spec.q,
    )
    .map_err(|e| AudioEffectsError::CoefficientCalculationError {
        filter_type: format!("{:?} @ {} Hz: {:?}", spec.kind, spec.center_hz, e),
    })
}

// --- Device Presets ---

lazy_static! {
    /// 10-band gain vectors approximating common playback devices, keyed by
    /// device name. "studioMonitors" is the flat reference. Manual mode has
    /// no entry here; its gains live on the session.
    pub static ref DEVICE_PRESETS: HashMap<&'static str, BandGains> = {
        let mut presets = HashMap::new();
        presets.insert("car", BandGains([5.0, 5.0, 4.0, 3.0, 2.0, 0.0, -1.0, -2.0, -3.0, -4.0]));
        presets.insert("iphone", BandGains([2.0, 2.0, 1.0, 1.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]));
        presets.insert("macbook", BandGains([-1.0, -1.0, 0.0, 1.0, 2.0, 2.0, 2.0, 3.0, 4.0, 4.0]));
        presets.insert("headphones", BandGains([3.0, 3.0, 2.0, 2.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0]));
        presets.insert("tv", BandGains([4.0, 4.0, 3.0, 2.0, 1.0, 0.0, -1.0, -1.0, 0.0, 1.0]));
        presets.insert("homeTheater", BandGains([5.0, 5.0, 4.0, 3.0, 2.0, 2.0, 1.0, 1.0, 2.0, 3.0]));
        presets.insert("bluetoothSpeaker", BandGains([4.0, 4.0, 3.0, 3.0, 2.0, 1.0, 1.0, 2.0, 2.0, 2.0]));
        presets.insert("studioMonitors", BandGains([0.0; 10]));
        presets.insert("gamingHeadset", BandGains([5.0, 5.0, 4.0, 3.0, 2.0, 1.0, 1.0, 2.0, 2.0, 2.0]));
        presets.insert("tablet", BandGains([1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 3.0, 3.0, 3.0, 3.0]));
        presets
    };
}

pub fn device_preset(name: &str) -> Option<&'static BandGains> {
    DEVICE_PRESETS.get(name)
}

// --- Equalizer Chain ---

struct BandStage {
    spec: EqBandSpec,
    filter: DirectForm1<f32>,
}

/// Ordered processing chain: pre-gain stage -> band_1 ... band_n -> master
/// (volume) stage. Built once per loaded file and updated in place while the
/// band identities stay the same; any change of band count or identity drops
/// every stage and relinks the chain end-to-end so no stale signal path can
/// survive.
pub struct EqChain {
    sample_rate: f32,
    pre_gain: f32,
    master_gain: f32,
    stages: Vec<BandStage>,
}

impl EqChain {
    pub fn build(sample_rate: f32, specs: &[EqBandSpec]) -> Result<Self, AudioEffectsError> {
        let mut chain = EqChain {
            sample_rate,
            pre_gain: 1.0,
            master_gain: config::INITIAL_MASTER_GAIN,
            stages: Vec::new(),
        };
        chain.relink(specs)?;
        Ok(chain)
    }

    pub fn three_band(sample_rate: f32, params: &EqParams) -> Result<Self, AudioEffectsError> {
        Self::build(sample_rate, &three_band_specs(params))
    }

    pub fn ten_band(sample_rate: f32, gains: &BandGains) -> Result<Self, AudioEffectsError> {
        Self::build(sample_rate, &ten_band_specs(gains))
    }

    fn relink(&mut self, specs: &[EqBandSpec]) -> Result<(), AudioEffectsError> {
        if specs.is_empty() {
            return Err(AudioEffectsError::EmptyBandList);
        }
        // Build the whole replacement chain before touching the live one, so
        // a coefficient failure leaves the existing linkage intact.
        let mut stages = Vec::with_capacity(specs.len());
        for spec in specs {
            stages.push(BandStage {
                spec: *spec,
                filter: DirectForm1::<f32>::new(band_coefficients(spec, self.sample_rate)?),
            });
        }
        self.stages = stages;
        Ok(())
    }

    /// Applies a band description. If the number or identity of bands
    /// changed, the chain is fully rebuilt; if only gains changed, the
    /// affected coefficients are updated in place without touching linkage
    /// or filter memory.
    pub fn apply(&mut self, specs: &[EqBandSpec]) -> Result<(), AudioEffectsError> {
        if specs.is_empty() {
            return Err(AudioEffectsError::EmptyBandList);
        }
        let topology_changed = specs.len() != self.stages.len()
            || specs
                .iter()
                .zip(self.stages.iter())
                .any(|(spec, stage)| !stage.spec.same_identity(spec));
        if topology_changed {
            log::debug!(
                "EqChain: topology changed ({} -> {} bands), relinking",
                self.stages.len(),
                specs.len()
            );
            return self.relink(specs);
        }
        for (stage, spec) in self.stages.iter_mut().zip(specs.iter()) {
            if (stage.spec.gain_db - spec.gain_db).abs() > config::EQ_RECALC_THRESHOLD_DB {
                stage
                    .filter
                    .update_coefficients(band_coefficients(spec, self.sample_rate)?);
                stage.spec.gain_db = spec.gain_db;
            }
        }
        Ok(())
    }

    /// Replaces all band gains atomically (device-preset selection). Band
    /// identities are unchanged so this is always an in-place update.
    pub fn apply_band_gains(&mut self, gains: &BandGains) -> Result<(), AudioEffectsError> {
        self.apply(&ten_band_specs(gains))
    }

    /// Mutates a single band's gain (manual mode).
    pub fn set_band_gain(&mut self, index: usize, gain_db: f32) -> Result<(), AudioEffectsError> {
        let band_count = self.stages.len();
        let stage = self
            .stages
            .get_mut(index)
            .ok_or(AudioEffectsError::BandIndexOutOfRange { index, band_count })?;
        let clamped = gain_db.clamp(config::BAND_GAIN_MIN_DB, config::BAND_GAIN_MAX_DB);
        if (stage.spec.gain_db - clamped).abs() > config::EQ_RECALC_THRESHOLD_DB {
            let spec = EqBandSpec {
                gain_db: clamped,
                ..stage.spec
            };
            stage
                .filter
                .update_coefficients(band_coefficients(&spec, self.sample_rate)?);
            stage.spec = spec;
        }
        Ok(())
    }

    /// Sets the pre-gain from a penalty in dB. Non-finite penalties (a
    /// silent recording has an infinite one) are clamped to the configured
    /// bounds; the audio path never sees a non-finite ratio.
    pub fn set_pre_gain_db(&mut self, penalty_db: f64) {
        let bounded = if penalty_db.is_nan() { 0.0 } else { penalty_db };
        let clamped = bounded.clamp(config::PRE_GAIN_MIN_DB, config::PRE_GAIN_MAX_DB);
        self.pre_gain = 10.0_f64.powf(clamped / 20.0) as f32;
    }

    pub fn pre_gain(&self) -> f32 {
        self.pre_gain
    }

    /// Master (volume) stage, linear amplitude.
    pub fn set_master_gain(&mut self, linear: f32) {
        self.master_gain = linear.clamp(0.0, 2.0);
    }

    pub fn band_gains(&self) -> Vec<f32> {
        self.stages.iter().map(|stage| stage.spec.gain_db).collect()
    }

    pub fn band_count(&self) -> usize {
        self.stages.len()
    }

    /// Processes one sample through the full chain.
    #[inline]
    pub fn run(&mut self, input: f32) -> f32 {
        let mut sample = input * self.pre_gain;
        for stage in &mut self.stages {
            sample = stage.filter.run(sample);
        }
        let out = sample * self.master_gain;
        if !out.is_finite() {
            log::error!("EqChain produced non-finite value: {} (input {})", out, input);
        }
        out
    }

    pub fn process_block(&mut self, input: &[f32]) -> Vec<f32> {
        input.iter().map(|&s| self.run(s)).collect()
    }
}
