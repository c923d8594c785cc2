use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::audio::config;

// --- EQ Parameters ---

/// Holds the gain values (in dB) for the simplified 3-band EQ
/// (Low Shelf, Peaking, High Shelf).
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EqParams {
    pub low_gain_db: f32,
    pub mid_gain_db: f32,
    pub high_gain_db: f32,
}

impl Default for EqParams {
    fn default() -> Self {
        EqParams {
            low_gain_db: 0.0,
            mid_gain_db: 0.0,
            high_gain_db: 0.0,
        }
    }
}

/// Per-band gain values (in dB) for the 10-band ISO-spaced EQ, ordered to
/// match [`config::ISO_BAND_CENTERS_HZ`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BandGains(pub [f32; 10]);

impl Default for BandGains {
    fn default() -> Self {
        BandGains([0.0; 10])
    }
}

impl BandGains {
    pub fn clamped(&self) -> Self {
        let mut gains = self.0;
        for gain in &mut gains {
            *gain = gain.clamp(config::BAND_GAIN_MIN_DB, config::BAND_GAIN_MAX_DB);
        }
        BandGains(gains)
    }
}

// --- Loudness Analysis ---

/// A streaming platform's reference loudness level.
#[derive(Debug, Clone, Copy)]
pub struct PlatformTarget {
    pub name: &'static str,
    pub target_lufs: f64,
}

/// Per-target gain correction in dB, keyed by platform name. Includes the
/// "Original" entry with a correction of zero.
pub type PenaltyMap = HashMap<String, f64>;

/// Result of measuring one decoded recording.
#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Integrated loudness in LUFS; negative infinity when no gating block
    /// exceeded the absolute gate (digital silence).
    pub integrated_lufs: f64,
    pub penalties: PenaltyMap,
    pub duration_seconds: f64,
    pub sample_rate: f32,
}

// --- Transport ---

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TransportState {
    Stopped,
    Playing,
    Paused,
}
