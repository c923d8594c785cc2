use serde::Serialize;

use crate::audio::types::{AnalysisResult, TransportState};

// --- Event Payloads for Observers ---

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TransportTickPayload {
    pub elapsed_seconds: f64,
    pub is_playing: bool,
    pub active_target: String,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdatePayload {
    pub state: TransportState,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoadUpdatePayload {
    pub duration_seconds: f64,
    pub sample_rate: f32,
}

/// The UI-facing seam. Implementations are polled-push hybrids: the engine
/// pushes analysis results once per load and transport ticks on the audio
/// thread's update interval. All methods default to no-ops so observers
/// implement only what they render.
pub trait PlaybackObserver: Send + Sync {
    fn on_result(&self, _result: &AnalysisResult) {}
    fn on_transport_tick(&self, _payload: &TransportTickPayload) {}
    fn on_status_change(&self, _payload: &StatusUpdatePayload) {}
    fn on_load(&self, _payload: &LoadUpdatePayload) {}
    fn on_error(&self, _message: &str) {}
}

/// Observer that ignores everything.
pub struct NullObserver;

impl PlaybackObserver for NullObserver {}

// --- Event Emitter Helpers ---

pub(crate) fn emit_tick_event(
    observer: &dyn PlaybackObserver,
    elapsed_seconds: f64,
    is_playing: bool,
    active_target: &str,
) {
    observer.on_transport_tick(&TransportTickPayload {
        elapsed_seconds,
        is_playing,
        active_target: active_target.to_string(),
    });
}

pub(crate) fn emit_status_update_event(observer: &dyn PlaybackObserver, state: TransportState) {
    observer.on_status_change(&StatusUpdatePayload { state });
}

pub(crate) fn emit_load_update_event(
    observer: &dyn PlaybackObserver,
    duration_seconds: f64,
    sample_rate: f32,
) {
    observer.on_load(&LoadUpdatePayload {
        duration_seconds,
        sample_rate,
    });
}

pub(crate) fn emit_result_event(observer: &dyn PlaybackObserver, result: &AnalysisResult) {
    observer.on_result(result);
}

pub(crate) fn emit_error_event(observer: &dyn PlaybackObserver, message: &str) {
    log::warn!("Playback event: {}", message);
    observer.on_error(message);
}
