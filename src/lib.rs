pub mod audio;

use std::sync::Arc;

use tokio::sync::mpsc;

use audio::config::AUDIO_COMMAND_CHAN_SIZE;
use audio::output::{CpalSink, OutputSink};
use audio::playback::{AudioThreadCommand, run_audio_thread};

pub use audio::analysis::loudness::{KWeightedMeter, MeterBackend};
pub use audio::playback::{EngineHandle, NullObserver, PlaybackObserver};
pub use audio::processor::{analyze_file, analyze_file_with_backend, analyze_files_batch};
pub use audio::types::{AnalysisResult, PenaltyMap, TransportState};

/// Initializes env_logger with an `info` default filter. Safe to call more
/// than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .try_init();
}

/// Spawns the dedicated audio thread and returns the handle used to drive
/// it. The observer receives analysis results, transport ticks, status
/// changes and errors; drop the handle (or call `shutdown`) to end the
/// engine.
pub fn start_engine(observer: Arc<dyn PlaybackObserver>) -> EngineHandle {
    let (audio_cmd_tx, audio_cmd_rx) = mpsc::channel::<AudioThreadCommand>(AUDIO_COMMAND_CHAN_SIZE);

    std::thread::spawn(move || {
        run_audio_thread(
            observer,
            audio_cmd_rx,
            Box::new(|| Box::new(CpalSink::new()) as Box<dyn OutputSink>),
            Arc::new(KWeightedMeter::new()),
        );
    });

    EngineHandle::new(audio_cmd_tx)
}
