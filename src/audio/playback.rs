use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::audio::analysis::loudness::MeterBackend;
use crate::audio::config::AUDIO_THREAD_TIME_UPDATE_INTERVAL_MS;
use crate::audio::output::OutputSink;

pub mod commands;
pub mod events;
mod handlers;
mod state;
mod time;

pub use commands::{AudioThreadCommand, EngineHandle};
pub use events::{NullObserver, PlaybackObserver};

use state::PlaybackSession;

/// Creates a fresh sink for each loaded file.
pub type SinkFactory = Box<dyn Fn() -> Box<dyn OutputSink> + Send>;

// --- Audio Thread Implementation ---

/// Dedicated audio thread: a single cooperative loop owns the one active
/// session and serializes every graph mutation and transport transition.
/// Commands arrive over the mpsc channel; a periodic interval drives the
/// observer ticks and end-of-media detection.
pub fn run_audio_thread(
    observer: Arc<dyn PlaybackObserver>,
    mut receiver: mpsc::Receiver<AudioThreadCommand>,
    sink_factory: SinkFactory,
    meter: Arc<dyn MeterBackend>,
) {
    log::info!("Audio Thread: Starting...");

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log::error!("Audio Thread: Failed to build Tokio runtime: {}", e);
            return;
        }
    };

    rt.block_on(async move {
        log::info!("Audio thread entering main loop.");
        let mut session_slot: Option<PlaybackSession> = None;
        let mut should_shutdown = false;
        let mut time_update_interval = tokio::time::interval(Duration::from_millis(
            AUDIO_THREAD_TIME_UPDATE_INTERVAL_MS,
        ));

        while !should_shutdown {
            tokio::select! {
                maybe_command = receiver.recv() => {
                    match maybe_command {
                        Some(command) => {
                            log::debug!("Audio Thread Received: {:?}", command);
                            match command {
                                AudioThreadCommand::LoadTrack { path } => {
                                    handlers::audio_thread_handle_load(
                                        path,
                                        &mut session_slot,
                                        sink_factory(),
                                        meter.clone(),
                                        observer.as_ref(),
                                    ).await;
                                }
                                AudioThreadCommand::Play { target, device } => {
                                    if let Err(e) = handlers::audio_thread_handle_play(
                                        target,
                                        device,
                                        &mut session_slot,
                                        observer.as_ref(),
                                    ) {
                                        log::error!("Audio Thread: Play failed: {}", e);
                                    }
                                }
                                AudioThreadCommand::Pause => {
                                    handlers::audio_thread_handle_pause(&mut session_slot, observer.as_ref());
                                }
                                AudioThreadCommand::Seek { position_seconds } => {
                                    handlers::audio_thread_handle_seek(position_seconds, &mut session_slot, observer.as_ref());
                                }
                                AudioThreadCommand::Stop => {
                                    handlers::audio_thread_handle_stop(&mut session_slot, observer.as_ref());
                                }
                                AudioThreadCommand::SetTarget { name } => {
                                    handlers::audio_thread_handle_set_target(name, &mut session_slot, observer.as_ref());
                                }
                                AudioThreadCommand::SetDevice { name } => {
                                    handlers::audio_thread_handle_set_device(name, &mut session_slot, observer.as_ref());
                                }
                                AudioThreadCommand::SetManualBand { index, gain_db } => {
                                    handlers::audio_thread_handle_set_manual_band(index, gain_db, &mut session_slot, observer.as_ref());
                                }
                                AudioThreadCommand::SetVolume { level } => {
                                    handlers::audio_thread_handle_set_volume(level, &mut session_slot);
                                }
                                AudioThreadCommand::Shutdown(shutdown_complete_tx) => {
                                    log::info!("Audio Thread: Shutdown received. Tearing down session.");
                                    if let Some(mut session) = session_slot.take() {
                                        session.teardown();
                                    }
                                    should_shutdown = true;
                                    if shutdown_complete_tx.send(()).is_err() {
                                        log::error!("Audio Thread: Failed to send shutdown completion signal.");
                                    }
                                }
                            }
                        }
                        None => {
                            log::info!("Audio Thread: Command channel closed. Exiting loop.");
                            if let Some(mut session) = session_slot.take() {
                                session.teardown();
                            }
                            should_shutdown = true;
                        }
                    }
                }
                _ = time_update_interval.tick(), if !should_shutdown => {
                    time::process_time_slice(&mut session_slot, observer.as_ref());
                }
            }
        }
        log::info!("Audio thread loop finished.");
    });
    log::info!("Audio thread has stopped.");
}
