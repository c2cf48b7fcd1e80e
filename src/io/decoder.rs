//! Audio decoding using Symphonia

use super::signal::AudioSignal;
use crate::error::AnalysisError;
use crate::preprocessing::channel_mixer::downmix_interleaved;
use std::io::Cursor;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Mono PCM decoded from an encoded buffer
pub type DecodedAudio = AudioSignal;

/// Turns encoded audio bytes into mono PCM
pub trait AudioDecoder {
    /// Decode a complete encoded buffer
    ///
    /// # Errors
    ///
    /// Returns `AnalysisError::DecodingError` if the bytes are not audio the
    /// decoder understands
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, AnalysisError>;
}

/// Decoder for every container and codec enabled in Symphonia
///
/// The first audio track is decoded; multichannel audio is averaged to
/// mono. Corrupt packets are skipped.
#[derive(Debug, Clone, Default)]
pub struct SymphoniaDecoder {
    /// Optional file extension hint (e.g. "wav", "mp3")
    pub extension_hint: Option<String>,
}

impl SymphoniaDecoder {
    /// Decoder that guesses the container from the extension first
    pub fn with_extension(extension: &str) -> Self {
        Self {
            extension_hint: Some(extension.to_string()),
        }
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, AnalysisError> {
        if bytes.is_empty() {
            return Err(AnalysisError::DecodingError("Empty audio buffer".to_string()));
        }

        let cursor = Cursor::new(bytes.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = &self.extension_hint {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;
        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AnalysisError::DecodingError("No supported audio track found".to_string()))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| AnalysisError::DecodingError("Audio track has no sample rate".to_string()))?;

        let mut decoder =
            symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples: Vec<f32> = Vec::new();
        let mut skipped = 0usize;

        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                    buf.copy_interleaved_ref(decoded);
                    let mono = downmix_interleaved(buf.samples(), spec.channels.count())?;
                    samples.extend_from_slice(&mono);
                }
                Err(SymphoniaError::DecodeError(_)) => {
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if skipped > 0 {
            log::warn!("Skipped {} corrupt packets while decoding", skipped);
        }

        if samples.is_empty() {
            return Err(AnalysisError::DecodingError("No audio frames decoded".to_string()));
        }

        log::debug!(
            "Decoded {} samples at {} Hz ({:.2}s)",
            samples.len(),
            sample_rate,
            samples.len() as f32 / sample_rate as f32
        );

        AudioSignal::new(samples, sample_rate)
    }
}

/// Read and decode an audio file with [`SymphoniaDecoder`]
///
/// The file extension is used as a container hint.
///
/// # Errors
///
/// Returns `AnalysisError::DecodingError` if the file cannot be read or decoded
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<DecodedAudio, AnalysisError> {
    let path = path.as_ref();
    log::debug!("Decoding audio file: {}", path.display());

    let bytes = std::fs::read(path)?;
    let decoder = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => SymphoniaDecoder::with_extension(ext),
        None => SymphoniaDecoder::default(),
    };
    decoder.decode(&bytes)
}
