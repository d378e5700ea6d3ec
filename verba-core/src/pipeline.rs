//! Recording → clip: endpointing followed by per-span LPC analysis.

use tracing::info;

use crate::audio::Audio;
use crate::clip::{AnalysisConfig, Clip};
use crate::endpoint::{self, EndpointConfig, SampleSpan};
use crate::error::Result;
use crate::lpc;

/// The result of one analysis run: the clip itself plus the sample spans
/// its words were cut from, kept for user-facing display.
#[derive(Debug, Clone)]
pub struct ClipAnalysis {
    pub clip: Clip,
    pub spans: Vec<SampleSpan>,
}

/// Run the full analysis pipeline over one recording.
///
/// Each detected speech span becomes one word; span order is preserved, so
/// word `i` of the clip corresponds to `spans[i]`.
pub fn analyze_clip(
    name: &str,
    audio: &Audio,
    config: &AnalysisConfig,
    endpoint_config: &EndpointConfig,
) -> Result<ClipAnalysis> {
    let spans = endpoint::detect_spans(audio, endpoint_config);
    info!(clip = name, words = spans.len(), "speech spans detected");

    let mut words = Vec::with_capacity(spans.len());
    for span in &spans {
        words.push(lpc::analyze_word(&audio.samples[span.range()], config)?);
    }

    let clip = Clip {
        name: name.to_string(),
        vector_size: config.vector_size,
        window_size: config.window_size,
        window_stride: config.window_stride,
        words,
    };

    Ok(ClipAnalysis { clip, spans })
}
