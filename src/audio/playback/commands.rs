use tokio::sync::{mpsc, oneshot};

use crate::audio::errors::PlaybackError;

// --- Audio Thread Commands ---

#[derive(Debug)]
pub enum AudioThreadCommand {
    LoadTrack {
        path: String,
    },
    Play {
        target: String,
        device: Option<String>,
    },
    Pause,
    Seek {
        position_seconds: f64,
    },
    Stop,
    SetTarget {
        name: String,
    },
    SetDevice {
        name: Option<String>,
    },
    SetManualBand {
        index: usize,
        gain_db: f32,
    },
    SetVolume {
        level: f32,
    },
    Shutdown(oneshot::Sender<()>),
}

// --- Engine Handle ---

/// Cloneable front door to the audio thread. Every method serializes one
/// command onto the thread's channel; ordering between calls from a single
/// caller is preserved.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<AudioThreadCommand>,
}

impl EngineHandle {
    pub(crate) fn new(sender: mpsc::Sender<AudioThreadCommand>) -> Self {
        EngineHandle { sender }
    }

    async fn send(&self, command: AudioThreadCommand) -> Result<(), PlaybackError> {
        self.sender
            .send(command)
            .await
            .map_err(|e| PlaybackError::CommandSendError(e.to_string()))
    }

    pub async fn load_track(&self, path: impl Into<String>) -> Result<(), PlaybackError> {
        let path = path.into();
        log::info!("CMD: Load track '{}'", path);
        self.send(AudioThreadCommand::LoadTrack { path }).await
    }

    pub async fn play(
        &self,
        target: impl Into<String>,
        device: Option<String>,
    ) -> Result<(), PlaybackError> {
        let target = target.into();
        log::info!("CMD: Play (target: '{}', device: {:?})", target, device);
        self.send(AudioThreadCommand::Play { target, device }).await
    }

    pub async fn pause(&self) -> Result<(), PlaybackError> {
        log::info!("CMD: Pause");
        self.send(AudioThreadCommand::Pause).await
    }

    pub async fn seek(&self, position_seconds: f64) -> Result<(), PlaybackError> {
        log::info!("CMD: Seek to {:.2}s", position_seconds);
        self.send(AudioThreadCommand::Seek { position_seconds }).await
    }

    pub async fn stop(&self) -> Result<(), PlaybackError> {
        log::info!("CMD: Stop");
        self.send(AudioThreadCommand::Stop).await
    }

    pub async fn set_target(&self, name: impl Into<String>) -> Result<(), PlaybackError> {
        let name = name.into();
        log::info!("CMD: Set target '{}'", name);
        self.send(AudioThreadCommand::SetTarget { name }).await
    }

    pub async fn set_device(&self, name: Option<String>) -> Result<(), PlaybackError> {
        log::info!("CMD: Set device {:?}", name);
        self.send(AudioThreadCommand::SetDevice { name }).await
    }

    pub async fn set_manual_band(&self, index: usize, gain_db: f32) -> Result<(), PlaybackError> {
        log::debug!("CMD: Set manual band {} to {} dB", index, gain_db);
        self.send(AudioThreadCommand::SetManualBand { index, gain_db })
            .await
    }

    pub async fn set_volume(&self, level: f32) -> Result<(), PlaybackError> {
        log::debug!("CMD: Set volume to {}", level);
        self.send(AudioThreadCommand::SetVolume { level }).await
    }

    /// Asks the audio thread to tear down and waits for confirmation.
    pub async fn shutdown(&self) -> Result<(), PlaybackError> {
        log::info!("CMD: Shutdown");
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.send(AudioThreadCommand::Shutdown(shutdown_tx)).await?;
        shutdown_rx
            .await
            .map_err(|e| PlaybackError::ShutdownSignalError(e.to_string()))
    }
}
