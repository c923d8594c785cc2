// --- Loudness Gating Constants ---
/// Gating block length (400 ms of signal per block).
pub const GATING_BLOCK_SECS: f64 = 0.4;
/// Absolute gate: blocks at or below this loudness are discarded.
pub const ABSOLUTE_GATE_LUFS: f64 = -70.0;
/// Relative gate threshold offset from the first-stage gated loudness.
pub const RELATIVE_GATE_OFFSET_LU: f64 = -10.0;
/// Reference offset applied when converting mean-square power to LUFS.
pub const LOUDNESS_REFERENCE_OFFSET: f64 = -0.691;

// --- K-Weighting Prototype Constants ---
// Analog prototypes for the two weighting stages, bilinear-transformed per
// sample rate with K = tan(PI * f0 / fs).
pub const SHELF_CENTER_HZ: f64 = 1681.974450955533;
pub const SHELF_GAIN_DB: f64 = 3.999843853973347;
pub const SHELF_Q: f64 = 0.7071752369554196;
/// Exponent relating the shelf midpoint gain to the full shelf gain; keeps
/// the transformed response on the ITU reference curve.
pub const SHELF_MIDPOINT_EXPONENT: f64 = 0.4996667741545416;
pub const HIGHPASS_CORNER_HZ: f64 = 38.13547087602444;
pub const HIGHPASS_Q: f64 = 0.5003270373238773;

// --- EQ Filter Constants ---
pub const LOW_MID_CROSSOVER_HZ: f32 = 250.0;
pub const MID_HIGH_CROSSOVER_HZ: f32 = 3000.0;
pub const MID_CENTER_HZ: f32 = 1000.0;
pub const MID_PEAK_Q_FACTOR: f32 = std::f32::consts::FRAC_1_SQRT_2;
pub const SHELF_Q_FACTOR: f32 = 0.5;

/// ISO-spaced center frequencies for the 10-band parametric topology.
pub const ISO_BAND_CENTERS_HZ: [f32; 10] = [
    31.0, 62.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];
pub const ISO_BAND_Q_FACTOR: f32 = 1.0;
pub const BAND_GAIN_MIN_DB: f32 = -12.0;
pub const BAND_GAIN_MAX_DB: f32 = 12.0;

// --- Gain Stage Constants ---
// A silent recording yields an infinite penalty; the gain stage must never
// see a non-finite amplitude ratio, so penalties are clamped to these bounds
// before conversion.
pub const PRE_GAIN_MIN_DB: f64 = -96.0;
pub const PRE_GAIN_MAX_DB: f64 = 24.0;

// --- Audio Playback Thread Constants ---
pub const AUDIO_THREAD_TIME_UPDATE_INTERVAL_MS: u64 = 20; // 50 FPS for smooth observer ticks
pub const AUDIO_COMMAND_CHAN_SIZE: usize = 32;

// -- Initial Values --
pub const INITIAL_MASTER_GAIN: f32 = 1.0;
pub const DEFAULT_TARGET_NAME: &str = "Original";

// -- EQ Performance Constants --
/// Minimum change in dB before recalculating EQ filter coefficients.
/// Prevents expensive recalculation for tiny inaudible changes.
pub const EQ_RECALC_THRESHOLD_DB: f32 = 0.01;
