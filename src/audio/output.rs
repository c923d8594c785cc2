use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig, SupportedStreamConfigRange};

use crate::audio::errors::PlaybackError;

/// Render callback handed to the sink: fills an interleaved output buffer
/// for the given channel count.
pub type RenderFn = Box<dyn FnMut(&mut [f32], u16) + Send + 'static>;

/// Negotiated stream format reported back from [`OutputSink::bind`].
#[derive(Debug, Clone, Copy)]
pub struct SinkFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// The real-time output device seam. A sink accepts a render callback once
/// per loaded file, starts delivery on `resume` (which may be refused by a
/// suspended host), and must be closed explicitly when the file is replaced
/// or the session ends.
///
/// Sinks live and die on the audio thread (the platform stream handle is not
/// `Send`); only the factory that creates them crosses threads.
pub trait OutputSink {
    fn bind(&mut self, render: RenderFn, sample_rate: u32) -> Result<SinkFormat, PlaybackError>;
    fn resume(&mut self) -> Result<(), PlaybackError>;
    fn close(&mut self);
}

// --- CPAL Implementation ---

pub struct CpalSink {
    stream: Option<Stream>,
}

impl CpalSink {
    pub fn new() -> Self {
        CpalSink { stream: None }
    }

    /// Picks an f32 output config, preferring stereo at the track's own
    /// sample rate, falling back through the common rates to the device
    /// default.
    fn choose_config(
        device: &cpal::Device,
        track_sample_rate: u32,
    ) -> Result<StreamConfig, PlaybackError> {
        let supported: Vec<SupportedStreamConfigRange> = device
            .supported_output_configs()
            .map(|configs| configs.collect())
            .unwrap_or_else(|e| {
                log::warn!("Output: could not enumerate configs, using default: {}", e);
                Vec::new()
            });

        let mut best: Option<SupportedStreamConfigRange> = None;
        for rate in [track_sample_rate, 48000, 44100] {
            for range in supported
                .iter()
                .filter(|r| r.sample_format() == cpal::SampleFormat::F32)
            {
                if range.min_sample_rate().0 <= rate && range.max_sample_rate().0 >= rate {
                    if range.channels() == 2 {
                        return Ok(StreamConfig {
                            channels: 2,
                            sample_rate: SampleRate(rate),
                            buffer_size: cpal::BufferSize::Default,
                        });
                    }
                    if best.is_none() {
                        best = Some(range.clone());
                    }
                }
            }
            if let Some(range) = best.take() {
                return Ok(StreamConfig {
                    channels: range.channels(),
                    sample_rate: SampleRate(rate),
                    buffer_size: cpal::BufferSize::Default,
                });
            }
        }

        let default = device
            .default_output_config()
            .map_err(|e| PlaybackError::OutputStreamInitError(e.to_string()))?;
        log::warn!("Output: using default output config as fallback: {:?}", default);
        Ok(default.config())
    }
}

impl Default for CpalSink {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputSink for CpalSink {
    fn bind(&mut self, mut render: RenderFn, sample_rate: u32) -> Result<SinkFormat, PlaybackError> {
        self.close();

        let host = cpal::default_host();
        let device = host.default_output_device().ok_or_else(|| {
            PlaybackError::OutputStreamInitError("no default output device".to_string())
        })?;
        let config = Self::choose_config(&device, sample_rate)?;
        let channels = config.channels;

        let data_callback = move |output: &mut [f32], _info: &cpal::OutputCallbackInfo| {
            render(output, channels);
        };
        let error_callback = |err: cpal::StreamError| {
            log::error!("Output: stream error: {}", err);
        };

        let stream = device.build_output_stream(&config, data_callback, error_callback, None)?;
        log::info!(
            "Output: stream built ({} ch, {} Hz)",
            channels,
            config.sample_rate.0
        );
        self.stream = Some(stream);
        Ok(SinkFormat {
            sample_rate: config.sample_rate.0,
            channels,
        })
    }

    fn resume(&mut self) -> Result<(), PlaybackError> {
        match &self.stream {
            Some(stream) => stream.play().map_err(|e| PlaybackError::ResumeFailed {
                reason: e.to_string(),
            }),
            None => Err(PlaybackError::ResumeFailed {
                reason: "no stream bound".to_string(),
            }),
        }
    }

    fn close(&mut self) {
        if self.stream.take().is_some() {
            log::info!("Output: stream released");
        }
    }
}

// --- Test Double ---
