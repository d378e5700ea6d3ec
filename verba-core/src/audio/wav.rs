//! WAV-file ingestion via hound.

use std::path::Path;

use tracing::info;

use super::Audio;
use crate::error::{Result, VerbaError};

/// Decode a WAV file into a normalized mono [`Audio`].
///
/// Integer sources of any bit depth up to 32 are scaled by their full-scale
/// value; float sources pass through. Multi-channel files are mixed down by
/// averaging the channels of each frame.
///
/// # Errors
/// `VerbaError::UnsupportedAudio` on malformed or unreadable WAV data.
pub fn read_wav(path: &Path) -> Result<Audio> {
    let mut reader = hound::WavReader::open(path)
        .map_err(|e| VerbaError::UnsupportedAudio(format!("{}: {e}", path.display())))?;
    let spec = reader.spec();

    let interleaved: std::result::Result<Vec<f32>, hound::Error> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect(),
        hound::SampleFormat::Int => {
            let full_scale = (1u32 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / full_scale))
                .collect()
        }
    };
    let interleaved = interleaved
        .map_err(|e| VerbaError::UnsupportedAudio(format!("{}: {e}", path.display())))?;

    let samples = downmix(&interleaved, spec.channels as usize);
    let audio = Audio::new(samples, spec.sample_rate);

    info!(
        path = %path.display(),
        sample_rate = audio.sample_rate,
        channels = spec.channels,
        duration_ms = audio.duration_ms(),
        "WAV file decoded"
    );

    Ok(audio)
}

fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
