use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::audio::analysis::loudness::MeterBackend;
use crate::audio::analysis::penalty;
use crate::audio::config;
use crate::audio::decoding;
use crate::audio::effects::{self, EqChain};
use crate::audio::errors::PlaybackError;
use crate::audio::output::{OutputSink, RenderFn};
use crate::audio::types::{AnalysisResult, BandGains, TransportState};

use super::events::*;
use super::state::{AtomicF64, PlaybackSession};
use super::time;

// --- Render Callback ---

/// Builds the per-buffer render closure handed to the output sink. Reads the
/// shared per-track state, runs every frame through the EQ chain, and drops
/// the playing flag when the buffer runs out. The closure only ever touches
/// the `Arc`s allocated for its own track, so one left over from a replaced
/// file goes quiet instead of corrupting the new session.
fn build_render_callback(
    samples: Arc<Vec<f32>>,
    read_head: Arc<AtomicF64>,
    is_playing: Arc<AtomicBool>,
    read_step: Arc<AtomicF64>,
    chain: Arc<Mutex<EqChain>>,
) -> RenderFn {
    Box::new(move |output: &mut [f32], channels: u16| {
        if !is_playing.load(Ordering::Relaxed) {
            output.fill(0.0);
            return;
        }
        let Ok(mut chain) = chain.lock() else {
            output.fill(0.0);
            return;
        };
        let advance = read_step.load(Ordering::Relaxed);
        let mut head = read_head.load(Ordering::Relaxed);
        let total = samples.len();

        for frame_out in output.chunks_mut(channels.max(1) as usize) {
            let idx = head.floor() as usize;
            if idx + 1 >= total {
                if is_playing.swap(false, Ordering::Relaxed) {
                    log::info!("Render: track ended at read head {:.2}", head);
                }
                for sample_out in frame_out.iter_mut() {
                    *sample_out = 0.0;
                }
                continue;
            }
            // Linear interpolation covers the track/stream rate mismatch.
            let fraction = (head - idx as f64) as f32;
            let interpolated = samples[idx] + (samples[idx + 1] - samples[idx]) * fraction;
            let processed = chain.run(interpolated);
            for sample_out in frame_out.iter_mut() {
                *sample_out = processed;
            }
            head += advance;
        }
        read_head.store(head, Ordering::Relaxed);
    })
}

// --- Command Handlers ---

/// Decodes and measures a file off-thread, then builds the per-file graph
/// and sink binding. Replaces (and tears down) any previously loaded file.
pub(crate) async fn audio_thread_handle_load(
    path: String,
    session_slot: &mut Option<PlaybackSession>,
    mut sink: Box<dyn OutputSink>,
    meter: Arc<dyn MeterBackend>,
    observer: &dyn PlaybackObserver,
) {
    if let Some(mut old_session) = session_slot.take() {
        log::info!("Audio Thread: Replacing loaded track, tearing down old session");
        old_session.teardown();
    }

    let decode_path = path.clone();
    let analysis_result = tokio::task::spawn_blocking(
        move || -> Result<(decoding::DecodedAudio, f64), PlaybackError> {
            let decoded = decoding::decode_file(&decode_path)
                .map_err(|source| PlaybackError::PlaybackDecodeError { source })?;
            let lufs = meter
                .measure(&decoded.channels, decoded.sample_rate)
                .map_err(|source| PlaybackError::PlaybackAnalysisError { source })?;
            Ok((decoded, lufs))
        },
    )
    .await;

    let (decoded, integrated_lufs) = match analysis_result {
        Ok(Ok(pair)) => pair,
        Ok(Err(e)) => {
            log::error!("Audio Thread: Load failed for '{}': {}", path, e);
            emit_error_event(observer, &e.to_string());
            return;
        }
        Err(join_error) => {
            log::error!(
                "Audio Thread: Analysis task panicked for '{}': {}",
                path,
                join_error
            );
            emit_error_event(
                observer,
                &format!("Audio analysis task failed: {}", join_error),
            );
            return;
        }
    };

    let sample_rate = decoded.sample_rate;
    let duration = Duration::from_secs_f64(decoded.duration_seconds());
    let analysis = AnalysisResult {
        integrated_lufs,
        penalties: penalty::penalties(integrated_lufs),
        duration_seconds: duration.as_secs_f64(),
        sample_rate,
    };
    log::info!(
        "Audio Thread: Decoded '{}'. Duration: {:?}, Rate: {}, Integrated: {:.2} LUFS",
        path,
        duration,
        sample_rate,
        integrated_lufs
    );

    let chain = match EqChain::ten_band(sample_rate, &BandGains::default()) {
        Ok(chain) => Arc::new(Mutex::new(chain)),
        Err(source) => {
            let err = PlaybackError::GraphBuildError { source };
            log::error!("Audio Thread: {}", err);
            emit_error_event(observer, &err.to_string());
            return;
        }
    };

    let samples = Arc::new(decoded.downmix_mono());
    let read_head = Arc::new(AtomicF64::new(0.0));
    let is_playing = Arc::new(AtomicBool::new(false));
    let read_step = Arc::new(AtomicF64::new(1.0));

    let render = build_render_callback(
        samples.clone(),
        read_head.clone(),
        is_playing.clone(),
        read_step.clone(),
        chain.clone(),
    );

    let format = match sink.bind(render, sample_rate as u32) {
        Ok(format) => format,
        Err(e) => {
            log::error!("Audio Thread: Failed to bind output sink: {}", e);
            emit_error_event(observer, &e.to_string());
            return;
        }
    };
    if format.sample_rate > 0 && format.sample_rate != sample_rate as u32 {
        let ratio = f64::from(sample_rate) / f64::from(format.sample_rate);
        log::warn!(
            "Audio Thread: Sample rate mismatch. Track: {} Hz, Stream: {} Hz (step: {:.4})",
            sample_rate,
            format.sample_rate,
            ratio
        );
        read_step.store(ratio, Ordering::Relaxed);
    }

    *session_slot = Some(PlaybackSession {
        samples,
        sample_rate,
        duration,
        analysis: analysis.clone(),
        chain,
        read_head,
        is_playing,
        sink,
        active_target: config::DEFAULT_TARGET_NAME.to_string(),
        active_device: None,
        manual_gains: BandGains::default(),
        transport: TransportState::Stopped,
        clock_start: None,
        resume_offset: Duration::ZERO,
    });

    emit_result_event(observer, &analysis);
    emit_load_update_event(observer, analysis.duration_seconds, sample_rate);
    emit_status_update_event(observer, TransportState::Stopped);
}

/// Binds a fresh voice at the stored resume offset and starts the sink.
/// Every pause/resume cycle is a full stop + restart with an explicit
/// offset; the monotonic clock origin makes that invisible to observers.
pub(crate) fn audio_thread_handle_play(
    target: String,
    device: Option<String>,
    session_slot: &mut Option<PlaybackSession>,
    observer: &dyn PlaybackObserver,
) -> Result<(), PlaybackError> {
    let Some(session) = session_slot.as_mut() else {
        let err = PlaybackError::NotReady;
        emit_error_event(observer, &err.to_string());
        return Err(err);
    };

    // Play while already playing restarts at the current position (a target
    // switch routed through play rather than SetTarget).
    if session.transport == TransportState::Playing {
        let elapsed = time::current_position_secs(session);
        session.resume_offset = Duration::from_secs_f64(elapsed);
        session.is_playing.store(false, Ordering::Relaxed);
    }

    let gains = match device.as_deref() {
        Some(device_name) => match effects::device_preset(device_name) {
            Some(preset) => {
                session.manual_gains = preset.clone();
                preset.clone()
            }
            None => {
                log::warn!(
                    "Audio Thread: Unknown device preset '{}', keeping manual gains",
                    device_name
                );
                session.manual_gains.clone()
            }
        },
        None => session.manual_gains.clone(),
    };

    let penalty_db = penalty::penalty_for(&session.analysis.penalties, &target);
    {
        let mut chain = session.chain.lock().expect("EQ chain mutex poisoned");
        chain.set_pre_gain_db(penalty_db);
        if let Err(source) = chain.apply_band_gains(&gains) {
            let err = PlaybackError::GraphBuildError { source };
            emit_error_event(observer, &err.to_string());
            return Err(err);
        }
    }

    // Seed the voice, then ask the sink to run. A refused resume is reported
    // and leaves the transport state untouched.
    session.read_head.store(
        session.resume_offset.as_secs_f64() * f64::from(session.sample_rate),
        Ordering::Relaxed,
    );
    if let Err(e) = session.sink.resume() {
        log::error!("Audio Thread: Output sink refused to resume: {}", e);
        emit_error_event(observer, &e.to_string());
        return Err(e);
    }

    session.is_playing.store(true, Ordering::Relaxed);
    session.clock_start = Some(Instant::now() - session.resume_offset);
    session.transport = TransportState::Playing;
    session.active_target = target;
    session.active_device = device;
    log::info!(
        "Audio Thread: Playing (target '{}', device {:?}, offset {:.2}s)",
        session.active_target,
        session.active_device,
        session.resume_offset.as_secs_f64()
    );
    emit_status_update_event(observer, TransportState::Playing);
    Ok(())
}

pub(crate) fn audio_thread_handle_pause(
    session_slot: &mut Option<PlaybackSession>,
    observer: &dyn PlaybackObserver,
) {
    let Some(session) = session_slot.as_mut() else {
        log::warn!("Audio Thread: Pause ignored, no track loaded");
        return;
    };
    if session.transport != TransportState::Playing {
        log::warn!("Audio Thread: Pause ignored, not playing");
        return;
    }

    let elapsed = time::current_position_secs(session);
    session.is_playing.store(false, Ordering::Relaxed);
    session.resume_offset = Duration::from_secs_f64(elapsed);
    session.clock_start = None;
    session.transport = TransportState::Paused;
    log::info!("Audio Thread: Paused at {:.2}s", elapsed);
    emit_status_update_event(observer, TransportState::Paused);
    emit_tick_event(observer, elapsed, false, &session.active_target);
}

pub(crate) fn audio_thread_handle_seek(
    position_seconds: f64,
    session_slot: &mut Option<PlaybackSession>,
    observer: &dyn PlaybackObserver,
) {
    let Some(session) = session_slot.as_mut() else {
        log::warn!("Audio Thread: Seek ignored, no track loaded");
        return;
    };
    let duration_secs = session.duration.as_secs_f64();
    let clamped = position_seconds.max(0.0).min(duration_secs);
    if clamped != position_seconds {
        log::warn!(
            "Audio Thread: Seek position {:.2}s out of range, clamping to {:.2}s",
            position_seconds,
            clamped
        );
    }

    session.resume_offset = Duration::from_secs_f64(clamped);
    session
        .read_head
        .store(clamped * f64::from(session.sample_rate), Ordering::Relaxed);
    if session.transport == TransportState::Playing {
        // Stop-then-restart at the new offset; the audible discontinuity is
        // accepted behavior.
        session.clock_start = Some(Instant::now() - session.resume_offset);
    }
    emit_tick_event(
        observer,
        clamped,
        session.transport == TransportState::Playing,
        &session.active_target,
    );
}

pub(crate) fn audio_thread_handle_stop(
    session_slot: &mut Option<PlaybackSession>,
    observer: &dyn PlaybackObserver,
) {
    let Some(session) = session_slot.as_mut() else {
        return;
    };
    session.is_playing.store(false, Ordering::Relaxed);
    session.transport = TransportState::Stopped;
    session.clock_start = None;
    session.resume_offset = Duration::ZERO;
    session.read_head.store(0.0, Ordering::Relaxed);
    log::info!("Audio Thread: Stopped");
    emit_status_update_event(observer, TransportState::Stopped);
}

/// Target switch: only the pre-gain changes, in place, without restarting
/// the voice.
pub(crate) fn audio_thread_handle_set_target(
    name: String,
    session_slot: &mut Option<PlaybackSession>,
    observer: &dyn PlaybackObserver,
) {
    let Some(session) = session_slot.as_mut() else {
        emit_error_event(observer, "Cannot switch target: no track loaded");
        return;
    };
    let penalty_db = penalty::penalty_for(&session.analysis.penalties, &name);
    session
        .chain
        .lock()
        .expect("EQ chain mutex poisoned")
        .set_pre_gain_db(penalty_db);
    session.active_target = name;
    log::debug!(
        "Audio Thread: Target '{}' ({:+.2} dB pre-gain)",
        session.active_target,
        penalty_db
    );
}

/// Device switch: replaces all band gains atomically, in place. `None`
/// returns to manual mode with a flat curve.
pub(crate) fn audio_thread_handle_set_device(
    name: Option<String>,
    session_slot: &mut Option<PlaybackSession>,
    observer: &dyn PlaybackObserver,
) {
    let Some(session) = session_slot.as_mut() else {
        emit_error_event(observer, "Cannot switch device: no track loaded");
        return;
    };
    let gains = match name.as_deref() {
        Some(device_name) => match effects::device_preset(device_name) {
            Some(preset) => preset.clone(),
            None => {
                emit_error_event(
                    observer,
                    &format!("Unknown device preset '{}'", device_name),
                );
                return;
            }
        },
        None => BandGains::default(),
    };

    session.manual_gains = gains.clone();
    if let Err(e) = session
        .chain
        .lock()
        .expect("EQ chain mutex poisoned")
        .apply_band_gains(&gains)
    {
        emit_error_event(observer, &e.to_string());
        return;
    }
    session.active_device = name;
    log::debug!("Audio Thread: Device {:?}", session.active_device);
}

/// Manual per-band mutation. Stored always; applied to the live chain only
/// while no device preset is active.
pub(crate) fn audio_thread_handle_set_manual_band(
    index: usize,
    gain_db: f32,
    session_slot: &mut Option<PlaybackSession>,
    observer: &dyn PlaybackObserver,
) {
    let Some(session) = session_slot.as_mut() else {
        emit_error_event(observer, "Cannot set band gain: no track loaded");
        return;
    };
    if index >= session.manual_gains.0.len() {
        emit_error_event(observer, &format!("Band index {} out of range", index));
        return;
    }
    let clamped = gain_db.clamp(config::BAND_GAIN_MIN_DB, config::BAND_GAIN_MAX_DB);
    session.manual_gains.0[index] = clamped;
    if session.active_device.is_none() {
        if let Err(e) = session
            .chain
            .lock()
            .expect("EQ chain mutex poisoned")
            .set_band_gain(index, clamped)
        {
            emit_error_event(observer, &e.to_string());
        }
    }
}

pub(crate) fn audio_thread_handle_set_volume(
    level: f32,
    session_slot: &mut Option<PlaybackSession>,
) {
    let Some(session) = session_slot.as_mut() else {
        log::warn!("Audio Thread: SetVolume ignored, no track loaded");
        return;
    };
    session
        .chain
        .lock()
        .expect("EQ chain mutex poisoned")
        .set_master_gain(level);
    log::debug!("Audio Thread: Master gain set to {}", level);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::output::test_support::{SinkCalls, TestSink};

    fn test_session(sink: Box<dyn OutputSink>) -> Option<PlaybackSession> {
        let sample_rate = 48000.0_f32;
        let integrated_lufs = -20.0;
        Some(PlaybackSession {
            samples: Arc::new(vec![0.1; 48000]),
            sample_rate,
            duration: Duration::from_secs(1),
            analysis: AnalysisResult {
                integrated_lufs,
                penalties: penalty::penalties(integrated_lufs),
                duration_seconds: 1.0,
                sample_rate,
            },
            chain: Arc::new(Mutex::new(
                EqChain::ten_band(sample_rate, &BandGains::default()).unwrap(),
            )),
            read_head: Arc::new(AtomicF64::new(0.0)),
            is_playing: Arc::new(AtomicBool::new(false)),
            sink,
            active_target: config::DEFAULT_TARGET_NAME.to_string(),
            active_device: None,
            manual_gains: BandGains::default(),
            transport: TransportState::Stopped,
            clock_start: None,
            resume_offset: Duration::ZERO,
        })
    }

    fn session_with_sink() -> (Option<PlaybackSession>, Arc<Mutex<SinkCalls>>) {
        let (sink, calls) = TestSink::new();
        (test_session(Box::new(sink)), calls)
    }

    #[test]
    fn play_without_loaded_track_is_not_ready() {
        let mut slot: Option<PlaybackSession> = None;
        let result =
            audio_thread_handle_play("Original".to_string(), None, &mut slot, &NullObserver);
        assert!(matches!(result, Err(PlaybackError::NotReady)));
        assert!(slot.is_none());
    }

    #[test]
    fn play_pause_play_resumes_at_paused_offset() {
        let (mut slot, _calls) = session_with_sink();
        audio_thread_handle_play("Original".to_string(), None, &mut slot, &NullObserver)
            .unwrap();
        std::thread::sleep(Duration::from_millis(30));
        audio_thread_handle_pause(&mut slot, &NullObserver);

        let session = slot.as_ref().unwrap();
        assert_eq!(session.transport, TransportState::Paused);
        let paused_offset = session.resume_offset.as_secs_f64();
        assert!(paused_offset > 0.0);

        audio_thread_handle_play("Original".to_string(), None, &mut slot, &NullObserver)
            .unwrap();
        let session = slot.as_ref().unwrap();
        assert_eq!(session.transport, TransportState::Playing);
        let elapsed = time::current_position_secs(session);
        assert!(
            (elapsed - paused_offset).abs() < 0.05,
            "elapsed {elapsed} should be continuous with paused offset {paused_offset}"
        );
    }

    #[test]
    fn seek_while_paused_then_play_starts_at_position() {
        let (mut slot, _calls) = session_with_sink();
        audio_thread_handle_play("Original".to_string(), None, &mut slot, &NullObserver)
            .unwrap();
        audio_thread_handle_pause(&mut slot, &NullObserver);

        audio_thread_handle_seek(0.5, &mut slot, &NullObserver);
        let session = slot.as_ref().unwrap();
        assert_eq!(session.transport, TransportState::Paused);
        assert!((session.resume_offset.as_secs_f64() - 0.5).abs() < 1e-9);

        audio_thread_handle_play("Original".to_string(), None, &mut slot, &NullObserver)
            .unwrap();
        let session = slot.as_ref().unwrap();
        let elapsed = time::current_position_secs(session);
        assert!((elapsed - 0.5).abs() < 0.05, "elapsed = {elapsed}");
        let expected_head = 0.5 * 48000.0;
        let head = session.read_head.load(Ordering::Relaxed);
        assert!((head - expected_head).abs() < 1.0);
    }

    #[test]
    fn seek_clamps_to_duration() {
        let (mut slot, _calls) = session_with_sink();
        audio_thread_handle_seek(5.0, &mut slot, &NullObserver);
        assert!(
            (slot.as_ref().unwrap().resume_offset.as_secs_f64() - 1.0).abs() < 1e-9
        );
        audio_thread_handle_seek(-2.0, &mut slot, &NullObserver);
        assert_eq!(slot.as_ref().unwrap().resume_offset, Duration::ZERO);
    }

    #[test]
    fn resume_failure_leaves_state_unchanged() {
        let (mut slot, calls) = session_with_sink();
        calls.lock().unwrap().fail_resume = true;

        let result =
            audio_thread_handle_play("Original".to_string(), None, &mut slot, &NullObserver);
        assert!(matches!(result, Err(PlaybackError::ResumeFailed { .. })));

        let session = slot.as_ref().unwrap();
        assert_eq!(session.transport, TransportState::Stopped);
        assert!(!session.is_playing.load(Ordering::Relaxed));
        assert!(session.clock_start.is_none());
        assert_eq!(session.resume_offset, Duration::ZERO);
    }

    #[test]
    fn reach_end_returns_to_stopped_with_zero_offset() {
        let (mut slot, _calls) = session_with_sink();
        audio_thread_handle_play("Original".to_string(), None, &mut slot, &NullObserver)
            .unwrap();
        // Rewind the clock origin so elapsed lands past the 1 s duration.
        slot.as_mut().unwrap().clock_start = Some(Instant::now() - Duration::from_secs(2));

        time::process_time_slice(&mut slot, &NullObserver);

        let session = slot.as_ref().unwrap();
        assert_eq!(session.transport, TransportState::Stopped);
        assert_eq!(session.resume_offset, Duration::ZERO);
        assert!(!session.is_playing.load(Ordering::Relaxed));
        assert_eq!(session.read_head.load(Ordering::Relaxed), 0.0);
    }

    #[test]
    fn target_and_device_change_do_not_restart_voice() {
        let (mut slot, calls) = session_with_sink();
        audio_thread_handle_play("Original".to_string(), None, &mut slot, &NullObserver)
            .unwrap();
        assert_eq!(calls.lock().unwrap().resumed, 1);

        audio_thread_handle_set_target("Spotify".to_string(), &mut slot, &NullObserver);
        audio_thread_handle_set_device(Some("car".to_string()), &mut slot, &NullObserver);

        let session = slot.as_ref().unwrap();
        assert_eq!(session.transport, TransportState::Playing);
        assert!(session.is_playing.load(Ordering::Relaxed));
        assert_eq!(calls.lock().unwrap().resumed, 1, "voice must not restart");
        assert_eq!(session.active_target, "Spotify");
        assert_eq!(session.active_device.as_deref(), Some("car"));

        let chain = session.chain.lock().unwrap();
        // Spotify penalty for -20 LUFS is +6 dB.
        let expected = 10.0_f32.powf(6.0 / 20.0);
        assert!((chain.pre_gain() - expected).abs() < 1e-3);
        assert_eq!(chain.band_gains()[0], 5.0);
    }

    #[test]
    fn apple_music_penalty_becomes_pre_gain() {
        let (mut slot, _calls) = session_with_sink();
        audio_thread_handle_play("Apple Music".to_string(), None, &mut slot, &NullObserver)
            .unwrap();
        let session = slot.as_ref().unwrap();
        let chain = session.chain.lock().unwrap();
        // -16 target against -20 LUFS measured: +4 dB, factor ~1.585.
        assert!((chain.pre_gain() - 1.585).abs() < 1e-3);
    }

    #[test]
    fn stop_resets_offset_from_any_state() {
        let (mut slot, _calls) = session_with_sink();
        audio_thread_handle_play("Original".to_string(), None, &mut slot, &NullObserver)
            .unwrap();
        std::thread::sleep(Duration::from_millis(10));
        audio_thread_handle_stop(&mut slot, &NullObserver);

        let session = slot.as_ref().unwrap();
        assert_eq!(session.transport, TransportState::Stopped);
        assert_eq!(session.resume_offset, Duration::ZERO);
        assert!(!session.is_playing.load(Ordering::Relaxed));
    }

    #[test]
    fn pause_when_not_playing_is_a_noop() {
        let (mut slot, _calls) = session_with_sink();
        audio_thread_handle_pause(&mut slot, &NullObserver);
        let session = slot.as_ref().unwrap();
        assert_eq!(session.transport, TransportState::Stopped);
        assert_eq!(session.resume_offset, Duration::ZERO);
    }

    #[test]
    fn manual_band_is_stored_but_not_applied_while_device_active() {
        let (mut slot, _calls) = session_with_sink();
        audio_thread_handle_set_device(Some("tv".to_string()), &mut slot, &NullObserver);
        audio_thread_handle_set_manual_band(5, 9.0, &mut slot, &NullObserver);

        let session = slot.as_ref().unwrap();
        assert_eq!(session.manual_gains.0[5], 9.0);
        // The live chain still carries the tv preset at that band.
        let chain = session.chain.lock().unwrap();
        assert_eq!(chain.band_gains()[5], 0.0);
    }

    #[test]
    fn manual_band_applies_in_manual_mode() {
        let (mut slot, _calls) = session_with_sink();
        audio_thread_handle_set_manual_band(2, -7.5, &mut slot, &NullObserver);
        let session = slot.as_ref().unwrap();
        assert_eq!(session.manual_gains.0[2], -7.5);
        assert!((session.chain.lock().unwrap().band_gains()[2] + 7.5).abs() < 1e-6);
    }

    #[test]
    fn render_callback_plays_through_and_flags_end() {
        let samples = Arc::new(vec![0.25_f32; 100]);
        let read_head = Arc::new(AtomicF64::new(0.0));
        let is_playing = Arc::new(AtomicBool::new(true));
        let read_step = Arc::new(AtomicF64::new(1.0));
        let chain = Arc::new(Mutex::new(
            EqChain::ten_band(48000.0, &BandGains::default()).unwrap(),
        ));
        let mut render = build_render_callback(
            samples,
            read_head,
            is_playing.clone(),
            read_step,
            chain,
        );

        let mut output = vec![0.0_f32; 256];
        render(&mut output, 2);

        // 128 frames against 100 samples: the first frames carry signal, the
        // tail is silence and the playing flag has dropped.
        assert!((output[0] - 0.25).abs() < 1e-3);
        assert!((output[1] - 0.25).abs() < 1e-3);
        assert_eq!(output[254], 0.0);
        assert!(!is_playing.load(Ordering::Relaxed));
    }

    #[test]
    fn render_callback_is_silent_when_not_playing() {
        let samples = Arc::new(vec![0.5_f32; 100]);
        let read_head = Arc::new(AtomicF64::new(0.0));
        let is_playing = Arc::new(AtomicBool::new(false));
        let read_step = Arc::new(AtomicF64::new(1.0));
        let chain = Arc::new(Mutex::new(
            EqChain::ten_band(48000.0, &BandGains::default()).unwrap(),
        ));
        let mut render =
            build_render_callback(samples, read_head.clone(), is_playing, read_step, chain);

        let mut output = vec![1.0_f32; 64];
        render(&mut output, 2);
        assert!(output.iter().all(|&s| s == 0.0));
        assert_eq!(read_head.load(Ordering::Relaxed), 0.0);
    }
}
