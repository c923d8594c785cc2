use std::fs::File;

use symphonia::core::{
    audio::SampleBuffer,
    codecs::{CODEC_TYPE_NULL, DecoderOptions},
    errors::Error as SymphoniaError,
    formats::FormatOptions,
    io::MediaSourceStream,
    meta::MetadataOptions,
    probe::Hint,
};

use super::errors::AudioDecodingError;

/// A fully decoded recording with discrete channel buffers. The loudness
/// meter consumes the channels as-is; playback uses the mono downmix.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    pub channels: Vec<Vec<f32>>,
    pub sample_rate: f32,
}

impl DecodedAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate <= 0.0 || self.channels.is_empty() {
            return 0.0;
        }
        self.channels[0].len() as f64 / self.sample_rate as f64
    }

    /// Uniform sample-wise average of all channels.
    pub fn downmix_mono(&self) -> Vec<f32> {
        if self.channels.is_empty() {
            return Vec::new();
        }
        if self.channels.len() == 1 {
            return self.channels[0].clone();
        }
        let len = self.channels[0].len();
        let inv_count = 1.0 / self.channels.len() as f32;
        (0..len)
            .map(|i| self.channels.iter().map(|ch| ch[i]).sum::<f32>() * inv_count)
            .collect()
    }
}

/// Decodes an audio file into per-channel f32 samples.
/// This is the centralized decoding function.
pub fn decode_file(path: &str) -> Result<DecodedAudio, AudioDecodingError> {
    let file = File::open(path).map_err(|e| AudioDecodingError::FileOpenError {
        path: path.to_string(),
        source: e,
    })?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let hint = Hint::new();

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| AudioDecodingError::FormatError {
            path: path.to_string(),
            source: e,
        })?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL && t.codec_params.sample_rate.is_some())
        .ok_or_else(|| AudioDecodingError::NoSuitableTrack {
            path: path.to_string(),
        })?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| AudioDecodingError::MissingSampleRate {
            path: path.to_string(),
        })? as f32;
    let channel_count = track
        .codec_params
        .channels
        .ok_or_else(|| AudioDecodingError::MissingChannelInfo {
            path: path.to_string(),
        })?
        .count();
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| AudioDecodingError::DecoderCreationError {
            path: path.to_string(),
            source: e,
        })?;

    let mut channels: Vec<Vec<f32>> = (0..channel_count)
        .map(|_| Vec::with_capacity(1024 * 256))
        .collect();
    let mut sample_buf: Option<SampleBuffer<f32>> = None;

    loop {
        match format.next_packet() {
            Ok(packet) => {
                if packet.track_id() != track_id {
                    continue;
                }
                match decoder.decode(&packet) {
                    Ok(audio_buf) => {
                        if sample_buf.is_none() {
                            sample_buf = Some(SampleBuffer::<f32>::new(
                                audio_buf.capacity() as u64,
                                *audio_buf.spec(),
                            ));
                        }
                        if let Some(buf) = sample_buf.as_mut() {
                            buf.copy_interleaved_ref(audio_buf);
                            for frame in buf.samples().chunks_exact(channel_count) {
                                for (ch, &sample) in frame.iter().enumerate() {
                                    channels[ch].push(sample);
                                }
                            }
                        }
                    }
                    Err(SymphoniaError::DecodeError(err_desc)) => {
                        log::warn!("Decode: Ignoring decode error in '{}': {}", path, err_desc);
                    }
                    Err(e) => {
                        return Err(AudioDecodingError::FatalDecodeError {
                            path: path.to_string(),
                            source: e,
                        });
                    }
                }
            }
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                log::debug!("Decode: Reached EOF for '{}'", path);
                break;
            }
            Err(SymphoniaError::ResetRequired) => {
                log::warn!("Decode: Decoder reset required unexpectedly for '{}'", path);
                break;
            }
            Err(e) => {
                return Err(AudioDecodingError::PacketReadIoError {
                    path: path.to_string(),
                    source: e,
                });
            }
        }
    }

    decoder.finalize();
    log::debug!(
        "Decode: Decoded {} channels x {} samples at {} Hz for '{}'",
        channels.len(),
        channels.first().map_or(0, Vec::len),
        sample_rate,
        path
    );
    if channels.iter().all(Vec::is_empty) {
        return Err(AudioDecodingError::NoSamplesDecoded {
            path: path.to_string(),
        });
    }

    Ok(DecodedAudio {
        channels,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_surfaces_open_error() {
        let result = decode_file("/nonexistent/definitely-not-here.wav");
        assert!(matches!(
            result,
            Err(AudioDecodingError::FileOpenError { .. })
        ));
    }

    #[test]
    fn downmix_averages_channels() {
        let decoded = DecodedAudio {
            channels: vec![vec![1.0, 0.0, -1.0], vec![0.0, 1.0, -1.0]],
            sample_rate: 48000.0,
        };
        let mono = decoded.downmix_mono();
        assert_eq!(mono, vec![0.5, 0.5, -1.0]);
    }

    #[test]
    fn duration_from_channel_length() {
        let decoded = DecodedAudio {
            channels: vec![vec![0.0; 48000]],
            sample_rate: 48000.0,
        };
        assert!((decoded.duration_seconds() - 1.0).abs() < 1e-9);
    }
}
