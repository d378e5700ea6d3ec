//! Speech endpointing: locating the word-bearing sample ranges inside a
//! full recording.
//!
//! ## Algorithm
//!
//! 1. Recordings shorter than `min_clip_ms` bypass detection entirely and
//!    come back as one span.
//! 2. The first `noise_ms` of the recording calibrate a noise threshold:
//!    mean(|x|) + stddev(|x|) over the prefix.
//! 3. The remainder is cut into consecutive `frame_ms` frames; a frame is
//!    speech iff its mean absolute amplitude exceeds the threshold. The
//!    trailing partial frame is dropped.
//! 4. Consecutive speech frames collapse into runs; short silent gaps inside
//!    a sustained utterance are bridged, then runs too short to be a word
//!    are pruned.
//! 5. Surviving runs convert back to sample indices.

use std::ops::Range;

use tracing::debug;

use crate::audio::Audio;

/// Thresholds driving span detection. Time-based fields are interpreted
/// against the recording's own sample rate; frame counts are in frames of
/// `frame_ms`.
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Length of the noise-calibration prefix.
    pub noise_ms: u32,
    /// Classification frame length.
    pub frame_ms: u32,
    /// Recordings shorter than this are treated as a single span.
    pub min_clip_ms: u32,
    /// Silent gaps shorter than this may be bridged.
    pub bridge_max_gap: usize,
    /// A bridged run must end up longer than this.
    pub bridge_min_run: usize,
    /// Runs shorter than this are discarded as noise blips.
    pub min_span_frames: usize,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            noise_ms: 100,
            frame_ms: 10,
            min_clip_ms: 1000,
            bridge_max_gap: 20,
            bridge_min_run: 20,
            min_span_frames: 10,
        }
    }
}

/// A contiguous sample range `[start, start+len)` believed to contain one
/// spoken word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleSpan {
    pub start: usize,
    pub len: usize,
}

impl SampleSpan {
    /// Index of the last sample inside the span.
    pub fn last_sample(&self) -> usize {
        self.start + self.len - 1
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.len
    }
}

/// A run of consecutive speech frames, in frame indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameRun {
    start: usize,
    len: usize,
}

impl FrameRun {
    fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Detect the speech spans of `audio`, ordered and non-overlapping.
///
/// An empty recording produces no spans; a recording with no frame above
/// the noise threshold produces no spans either.
pub fn detect_spans(audio: &Audio, config: &EndpointConfig) -> Vec<SampleSpan> {
    if audio.samples.is_empty() {
        return Vec::new();
    }

    if audio.samples.len() < audio.ms_to_samples(config.min_clip_ms) {
        return vec![SampleSpan {
            start: 0,
            len: audio.samples.len(),
        }];
    }

    let noise_samples = audio.ms_to_samples(config.noise_ms).min(audio.samples.len());
    let frame_samples = audio.ms_to_samples(config.frame_ms).max(1);
    let threshold = noise_threshold(&audio.samples[..noise_samples]);

    let is_speech: Vec<bool> = audio.samples[noise_samples..]
        .chunks_exact(frame_samples)
        .map(|frame| mean_abs(frame) > threshold)
        .collect();

    let mut runs = bridge_gaps(speech_runs(&is_speech), config);
    runs.retain(|run| run.len >= config.min_span_frames);

    debug!(
        threshold,
        frames = is_speech.len(),
        spans = runs.len(),
        "endpointing finished"
    );

    runs.into_iter()
        .map(|run| SampleSpan {
            start: run.start * frame_samples + noise_samples,
            len: run.len * frame_samples,
        })
        .collect()
}

fn mean_abs(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().map(|s| s.abs()).sum::<f32>() / samples.len() as f32
}

/// Noise floor estimate over the calibration prefix: population mean plus
/// one population standard deviation of the absolute amplitudes.
fn noise_threshold(prefix: &[f32]) -> f32 {
    if prefix.is_empty() {
        return 0.0;
    }
    let mean = mean_abs(prefix);
    let variance = prefix
        .iter()
        .map(|s| {
            let diff = s.abs() - mean;
            diff * diff
        })
        .sum::<f32>()
        / prefix.len() as f32;
    mean + variance.sqrt()
}

/// Collapse the per-frame classification into maximal runs of speech frames.
fn speech_runs(is_speech: &[bool]) -> Vec<FrameRun> {
    let mut runs = Vec::new();
    let mut current_start = None;

    for (i, &speech) in is_speech.iter().enumerate() {
        match (speech, current_start) {
            (true, None) => current_start = Some(i),
            (false, Some(start)) => {
                runs.push(FrameRun {
                    start,
                    len: i - start,
                });
                current_start = None;
            }
            _ => {}
        }
    }
    if let Some(start) = current_start {
        runs.push(FrameRun {
            start,
            len: is_speech.len() - start,
        });
    }

    runs
}

/// Merge runs separated by a short silent gap when the bridged run would be
/// long enough to count as sustained speech.
///
/// Single forward pass: a merged run keeps scanning against its next
/// neighbor, so one utterance split by several brief pauses can collapse
/// into one run, but earlier pairs are never revisited.
fn bridge_gaps(runs: Vec<FrameRun>, config: &EndpointConfig) -> Vec<FrameRun> {
    let mut iter = runs.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    for next in iter {
        let gap = next.start - current.end();
        let bridged_len = current.len + gap + next.len;
        if gap < config.bridge_max_gap && bridged_len > config.bridge_min_run {
            current.len = bridged_len;
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);

    merged
}
