use std::sync::atomic::Ordering;
use std::time::Duration;

use crate::audio::types::TransportState;

use super::events::{PlaybackObserver, emit_status_update_event, emit_tick_event};
use super::state::PlaybackSession;

/// Elapsed time into the recording. Derived from the monotonic clock origin
/// while playing (never by accumulating per-tick deltas, which would drift)
/// and from the stored resume offset otherwise.
pub(crate) fn current_position_secs(session: &PlaybackSession) -> f64 {
    let duration_secs = session.duration.as_secs_f64();
    match session.transport {
        TransportState::Playing => match session.clock_start {
            Some(clock_start) => clock_start.elapsed().as_secs_f64().min(duration_secs),
            None => session.resume_offset.as_secs_f64().min(duration_secs),
        },
        TransportState::Paused | TransportState::Stopped => {
            session.resume_offset.as_secs_f64().min(duration_secs)
        }
    }
}

/// One polling tick: publishes elapsed time to the observer and drives the
/// reachEnd transition once elapsed reaches the recording's duration.
pub(crate) fn process_time_slice(
    session_slot: &mut Option<PlaybackSession>,
    observer: &dyn PlaybackObserver,
) {
    let Some(session) = session_slot.as_mut() else {
        return;
    };
    if session.transport != TransportState::Playing {
        return;
    }

    let elapsed = current_position_secs(session);
    let duration_secs = session.duration.as_secs_f64();
    // The render callback drops the playing flag on its own when it runs out
    // of samples; either signal ends the session.
    let voice_finished = !session.is_playing.load(Ordering::Relaxed);

    if (duration_secs > 0.0 && elapsed >= duration_secs) || voice_finished {
        log::info!("Transport: reached end at {:.2}s", elapsed);
        session.is_playing.store(false, Ordering::Relaxed);
        session.transport = TransportState::Stopped;
        session.clock_start = None;
        session.resume_offset = Duration::ZERO;
        session.read_head.store(0.0, Ordering::Relaxed);
        emit_tick_event(observer, duration_secs, false, &session.active_target);
        emit_status_update_event(observer, TransportState::Stopped);
        return;
    }

    emit_tick_event(observer, elapsed, true, &session.active_target);
}
