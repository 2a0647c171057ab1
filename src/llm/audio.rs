//! Playable audio built from the raw PCM returned by the speech endpoint.
//!
//! The endpoint answers with base64-encoded little-endian 16-bit mono PCM and
//! a mime type such as `audio/L16;codec=pcm;rate=24000`.  [`AudioAsset`] wraps
//! those samples in a canonical 44-byte RIFF/WAVE header.

use std::io::Cursor;
use std::path::Path;

use base64::Engine;

use crate::llm::client::LlmError;

/// Sample rate assumed when the mime type does not declare one.
pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;

/// Size of the RIFF/WAVE header written in front of the PCM data.
pub const WAV_HEADER_LEN: usize = 44;

/// A self-contained WAV file ready for local playback.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioAsset {
    /// Complete WAV bytes (header + samples).
    pub wav: Vec<u8>,
    /// Declared sample rate in Hz.
    pub sample_rate: u32,
}

impl AudioAsset {
    /// Build an asset from the base64 payload and mime type of an
    /// `inlineData` part.
    pub fn from_inline_data(data_b64: &str, mime_type: &str) -> Result<Self, LlmError> {
        let pcm = base64::engine::general_purpose::STANDARD
            .decode(data_b64.trim())
            .map_err(|e| LlmError::SpeechSynthesisUnavailable(format!("bad base64: {e}")))?;
        let sample_rate = sample_rate_from_mime(mime_type);
        Self::from_pcm(&pcm, sample_rate)
    }

    /// Wrap raw 16-bit little-endian mono PCM bytes.
    ///
    /// A trailing odd byte (half a sample) is dropped.
    pub fn from_pcm(pcm: &[u8], sample_rate: u32) -> Result<Self, LlmError> {
        let wav = pcm_to_wav(pcm, sample_rate)?;
        Ok(Self { wav, sample_rate })
    }

    /// Number of PCM bytes after the header.
    pub fn data_len(&self) -> usize {
        self.wav.len().saturating_sub(WAV_HEADER_LEN)
    }

    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f32 {
        self.data_len() as f32 / (self.sample_rate as f32 * 2.0)
    }

    /// Write the WAV file to `path`, creating parent directories as needed.
    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.wav)
    }
}

/// Read the `rate=` parameter of an audio mime type, falling back to
/// [`DEFAULT_SAMPLE_RATE`].
///
/// ```
/// use german_tutor::llm::audio::sample_rate_from_mime;
///
/// assert_eq!(sample_rate_from_mime("audio/L16;codec=pcm;rate=16000"), 16_000);
/// assert_eq!(sample_rate_from_mime("audio/L16"), 24_000);
/// ```
pub fn sample_rate_from_mime(mime_type: &str) -> u32 {
    mime_type
        .split(';')
        .filter_map(|param| param.trim().strip_prefix("rate="))
        .find_map(|rate| rate.trim().parse::<u32>().ok())
        .filter(|rate| *rate > 0)
        .unwrap_or(DEFAULT_SAMPLE_RATE)
}

/// Encode mono 16-bit PCM bytes as a WAV file.
pub fn pcm_to_wav(pcm: &[u8], sample_rate: u32) -> Result<Vec<u8>, LlmError> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::with_capacity(WAV_HEADER_LEN + pcm.len()));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| LlmError::SpeechSynthesisUnavailable(e.to_string()))?;

        for pair in pcm.chunks_exact(2) {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            writer
                .write_sample(sample)
                .map_err(|e| LlmError::SpeechSynthesisUnavailable(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| LlmError::SpeechSynthesisUnavailable(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    #[test]
    fn header_is_44_bytes_and_declares_mono_16_bit() {
        let pcm = vec![0u8; 480];
        let wav = pcm_to_wav(&pcm, 24_000).unwrap();

        assert_eq!(wav.len(), WAV_HEADER_LEN + pcm.len());
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(u32_at(&wav, 4), 36 + pcm.len() as u32);
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u32_at(&wav, 16), 16);
        assert_eq!(u16_at(&wav, 20), 1, "PCM format");
        assert_eq!(u16_at(&wav, 22), 1, "mono");
        assert_eq!(u32_at(&wav, 24), 24_000);
        assert_eq!(u32_at(&wav, 28), 48_000, "byte rate");
        assert_eq!(u16_at(&wav, 32), 2, "block align");
        assert_eq!(u16_at(&wav, 34), 16);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32_at(&wav, 40), pcm.len() as u32);
    }

    #[test]
    fn samples_are_copied_verbatim() {
        let pcm = [0x01, 0x02, 0xff, 0x7f];
        let wav = pcm_to_wav(&pcm, 16_000).unwrap();
        assert_eq!(&wav[WAV_HEADER_LEN..], &pcm);
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        let wav = pcm_to_wav(&[1, 2, 3], 24_000).unwrap();
        assert_eq!(wav.len(), WAV_HEADER_LEN + 2);
    }

    #[test]
    fn rate_parsed_from_mime_parameters() {
        assert_eq!(sample_rate_from_mime("audio/L16;codec=pcm;rate=24000"), 24_000);
        assert_eq!(sample_rate_from_mime("audio/L16; rate=22050"), 22_050);
    }

    #[test]
    fn missing_or_garbage_rate_uses_default() {
        assert_eq!(sample_rate_from_mime("audio/L16;codec=pcm"), DEFAULT_SAMPLE_RATE);
        assert_eq!(sample_rate_from_mime("audio/L16;rate=fast"), DEFAULT_SAMPLE_RATE);
        assert_eq!(sample_rate_from_mime(""), DEFAULT_SAMPLE_RATE);
    }

    #[test]
    fn inline_data_round_trips_through_base64() {
        let pcm: Vec<u8> = (0..200u16).flat_map(|s| s.to_le_bytes()).collect();
        let b64 = base64::engine::general_purpose::STANDARD.encode(&pcm);

        let asset = AudioAsset::from_inline_data(&b64, "audio/L16;rate=8000").unwrap();
        assert_eq!(asset.sample_rate, 8_000);
        assert_eq!(asset.data_len(), pcm.len());
        assert!((asset.duration_secs() - 0.025).abs() < 1e-6);
    }

    #[test]
    fn invalid_base64_is_speech_unavailable() {
        let err = AudioAsset::from_inline_data("not base64 !!!", "audio/L16").unwrap_err();
        assert!(matches!(err, LlmError::SpeechSynthesisUnavailable(_)));
    }
}
