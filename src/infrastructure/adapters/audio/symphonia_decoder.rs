//! Symphonia Decoder - 基于 symphonia 的音频解码器
//!
//! 支持 MP3 / WAV，格式由探测决定，不依赖扩展名

use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioDecoderPort, DecodeError};
use crate::domain::audio::DecodedAudio;

/// Symphonia 解码器
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl AudioDecoderPort for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let cursor = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| DecodeError::Undecodable(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| DecodeError::Undecodable("No audio track found".to_string()))?;
        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate;
        let mut channels = track.codec_params.channels.map(|c| c.count() as u16);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| DecodeError::Undecodable(format!("Decoder creation failed: {}", e)))?;

        let mut samples: Vec<f32> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    return Err(DecodeError::Undecodable(format!("Packet read error: {}", e)));
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!("Decode error (skipping packet): {}", e);
                    continue;
                }
                Err(e) => return Err(DecodeError::Undecodable(e.to_string())),
            };

            let spec = *decoded.spec();
            sample_rate.get_or_insert(spec.rate);
            channels.get_or_insert(spec.channels.count() as u16);

            let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buffer.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buffer.samples());
        }

        let (Some(sample_rate), Some(channels)) = (sample_rate, channels) else {
            return Err(DecodeError::Undecodable("Unknown audio parameters".to_string()));
        };
        if samples.is_empty() {
            return Err(DecodeError::Empty);
        }

        Ok(DecodedAudio::new(samples, sample_rate, channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_decode_wav() {
        let wav = DecodedAudio::silence(Duration::from_millis(500), 16000, 1).to_wav_bytes();
        let audio = SymphoniaDecoder::new().decode(&wav).unwrap();

        assert_eq!(audio.sample_rate, 16000);
        assert_eq!(audio.channels, 1);
        assert_eq!(audio.duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_decode_stereo_wav() {
        let source = DecodedAudio::new(vec![0.25, -0.25, 0.5, -0.5], 8000, 2);
        let audio = SymphoniaDecoder::new().decode(&source.to_wav_bytes()).unwrap();

        assert_eq!(audio.channels, 2);
        assert_eq!(audio.frames(), 2);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(SymphoniaDecoder::new().decode(&[]), Err(DecodeError::Empty));
    }

    #[test]
    fn test_garbage_is_undecodable() {
        let result = SymphoniaDecoder::new().decode(b"definitely not audio");
        assert!(matches!(result, Err(DecodeError::Undecodable(_))));
    }
}
