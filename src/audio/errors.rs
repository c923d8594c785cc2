use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioAnalysisError {
    #[error("Invalid sample rate for loudness measurement: {0}")]
    InvalidSampleRate(f32),
    #[error("Cannot measure loudness of empty samples")]
    EmptySamples,
    #[error("No channels supplied for loudness measurement")]
    NoChannels,
    #[error("Channel length mismatch: channel {channel} has {actual} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },
}

#[derive(Error, Debug)]
pub enum AudioEffectsError {
    #[error("Failed to calculate {filter_type} coefficients")]
    CoefficientCalculationError { filter_type: String },
    #[error("Band index {index} out of range ({band_count} bands)")]
    BandIndexOutOfRange { index: usize, band_count: usize },
    #[error("Equalizer has no bands")]
    EmptyBandList,
}

#[derive(Error, Debug)]
pub enum AudioDecodingError {
    #[error("Failed to open file '{path}': {source}")]
    FileOpenError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Symphonia probe/format error for '{path}': {source}")]
    FormatError {
        path: String,
        #[source]
        source: SymphoniaError,
    },
    #[error("No suitable audio track in '{path}'")]
    NoSuitableTrack { path: String },
    #[error("Sample rate missing in '{path}'")]
    MissingSampleRate { path: String },
    #[error("Channel info missing in '{path}'")]
    MissingChannelInfo { path: String },
    #[error("Failed to create decoder for '{path}': {source}")]
    DecoderCreationError {
        path: String,
        #[source]
        source: SymphoniaError,
    },
    #[error("Symphonia fatal decode error in '{path}': {source}")]
    FatalDecodeError {
        path: String,
        #[source]
        source: SymphoniaError,
    },
    #[error("Symphonia I/O error reading packet for '{path}': {source}")]
    PacketReadIoError {
        path: String,
        #[source]
        source: SymphoniaError,
    },
    #[error("No samples decoded from '{path}'")]
    NoSamplesDecoded { path: String },
}

#[derive(Error, Debug)]
pub enum PlaybackError {
    #[error("Cannot play: no analyzed track is loaded")]
    NotReady,
    #[error("Output sink refused to resume: {reason}")]
    ResumeFailed { reason: String },
    #[error("Failed to initialize audio output stream: {0}")]
    OutputStreamInitError(String),
    #[error("Failed to build audio output stream: {0}")]
    BuildStreamError(#[from] cpal::BuildStreamError),
    #[error("Audio decoding for playback failed: {source}")]
    PlaybackDecodeError {
        #[source]
        source: AudioDecodingError,
    },
    #[error("Loudness analysis for playback failed: {source}")]
    PlaybackAnalysisError {
        #[source]
        source: AudioAnalysisError,
    },
    #[error("Equalizer graph construction failed: {source}")]
    GraphBuildError {
        #[source]
        source: AudioEffectsError,
    },
    #[error("Audio command send error: {0}")]
    CommandSendError(String),
    #[error("Failed to send shutdown completion signal: {0}")]
    ShutdownSignalError(String),
    #[error("Tokio JoinError from spawned task: {0}")]
    JoinError(#[from] tokio::task::JoinError),
}

#[derive(Error, Debug)]
pub enum AudioProcessorError {
    #[error("Decoding error during analysis for '{path}': {source}")]
    AnalysisDecodingError {
        path: String,
        source: AudioDecodingError,
    },
    #[error("Loudness measurement failed for '{path}': {source}")]
    AnalysisLoudnessError {
        path: String,
        source: AudioAnalysisError,
    },
}

// Boundary conversions for callers that want stringly-typed results
// (batch analysis maps, observer error events).
impl From<AudioDecodingError> for String {
    fn from(err: AudioDecodingError) -> String {
        err.to_string()
    }
}
impl From<AudioAnalysisError> for String {
    fn from(err: AudioAnalysisError) -> String {
        err.to_string()
    }
}
impl From<PlaybackError> for String {
    fn from(err: PlaybackError) -> String {
        err.to_string()
    }
}
impl From<AudioProcessorError> for String {
    fn from(err: AudioProcessorError) -> String {
        err.to_string()
    }
}
