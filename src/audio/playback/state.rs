use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::audio::effects::EqChain;
use crate::audio::output::OutputSink;
use crate::audio::types::{AnalysisResult, BandGains, TransportState};

// --- Atomic float for the audio-callback read head ---

/// f64 stored as raw bits so the render callback and the audio thread can
/// share the fractional read head without a lock.
pub(crate) struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    pub(crate) fn new(value: f64) -> Self {
        AtomicF64 {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    pub(crate) fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.bits.load(order))
    }

    pub(crate) fn store(&self, value: f64, order: Ordering) {
        self.bits.store(value.to_bits(), order);
    }
}

// --- Playback Session ---

/// The one active session. Track assets (decoded buffer, EQ chain, sink) are
/// created once per loaded file and reused across play/pause cycles; the
/// transport fields are reset by stop and reachEnd. Full teardown happens
/// only when a new file replaces this one or the engine shuts down.
///
/// The `Arc`ed callback state (read head, playing flag, rate step) is
/// allocated fresh per load, so a render callback surviving from a replaced
/// track mutates orphaned state and stays inert.
pub(crate) struct PlaybackSession {
    pub(crate) samples: Arc<Vec<f32>>,
    pub(crate) sample_rate: f32,
    pub(crate) duration: Duration,
    pub(crate) analysis: AnalysisResult,
    pub(crate) chain: Arc<Mutex<EqChain>>,
    pub(crate) read_head: Arc<AtomicF64>,
    pub(crate) is_playing: Arc<AtomicBool>,
    pub(crate) sink: Box<dyn OutputSink>,
    pub(crate) active_target: String,
    pub(crate) active_device: Option<String>,
    pub(crate) manual_gains: BandGains,
    pub(crate) transport: TransportState,
    pub(crate) clock_start: Option<Instant>,
    pub(crate) resume_offset: Duration,
}

impl PlaybackSession {
    /// Stops the voice and releases the host audio resources. Required
    /// whenever a new file replaces this one or the session ends.
    pub(crate) fn teardown(&mut self) {
        self.is_playing.store(false, Ordering::Relaxed);
        self.transport = TransportState::Stopped;
        self.clock_start = None;
        self.resume_offset = Duration::ZERO;
        self.sink.close();
        log::info!("Session torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_f64_round_trips() {
        let value = AtomicF64::new(1.5);
        assert_eq!(value.load(Ordering::Relaxed), 1.5);
        value.store(-123.75, Ordering::Relaxed);
        assert_eq!(value.load(Ordering::Relaxed), -123.75);
    }
}
