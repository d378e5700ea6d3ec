//! End-to-end pipeline test: synthetic recording → spans → words → codec.

use verba_core::codec::{decode_word, encode_word};
use verba_core::{analyze_clip, AnalysisConfig, Audio, EndpointConfig, WindowFunction};

/// Deterministic broadband signal so every LPC solve is well-conditioned.
fn chaos(n: usize, amplitude: f32) -> f32 {
    ((n as f32 * 12.9898).sin() * 43758.547).fract() * amplitude
}

/// 16 kHz recording with a quiet noise floor and two speech bursts, one of
/// them split by a pause short enough to be bridged.
fn synthetic_recording() -> Audio {
    const RATE: u32 = 16_000;
    const FRAME: usize = 160; // 10 ms

    // (speech?, frames): 10 calibration frames are prepended below.
    let pattern: &[(bool, usize)] = &[
        (false, 20),
        (true, 30),
        (false, 5), // bridged pause
        (true, 25),
        (false, 30),
        (true, 5), // noise blip, pruned
        (false, 20),
    ];

    let mut samples = Vec::new();
    for i in 0..(FRAME * 10) {
        samples.push(chaos(i, 0.001));
    }
    for &(speech, frames) in pattern {
        let amplitude = if speech { 0.5 } else { 0.001 };
        for _ in 0..(frames * FRAME) {
            let n = samples.len();
            samples.push(chaos(n, amplitude));
        }
    }
    Audio::new(samples, RATE)
}

#[test]
fn recording_becomes_one_bridged_word() {
    let audio = synthetic_recording();
    let config = AnalysisConfig {
        vector_size: 8,
        window_size: 1024,
        window_stride: 512,
        window_fn: WindowFunction::Hann,
    };

    let analysis = analyze_clip("greeting", &audio, &config, &EndpointConfig::default()).unwrap();

    // The two large bursts bridge across the 5-frame pause into one span;
    // the 5-frame blip is pruned.
    assert_eq!(analysis.spans.len(), 1);
    let span = analysis.spans[0];
    assert_eq!(span.start, 1600 + 20 * 160);
    assert_eq!(span.len, 60 * 160);

    let clip = &analysis.clip;
    assert_eq!(clip.name, "greeting");
    assert_eq!(clip.vector_size, 8);
    assert_eq!(clip.words.len(), 1);

    // 9600-sample span, 1024-sample windows every 512 samples: 17 positions.
    let word = &clip.words[0];
    assert_eq!(word.len(), 17);
    assert!(word.coeff_vectors.iter().all(|v| v.len() == 8));
    assert!(word
        .coeff_vectors
        .iter()
        .flatten()
        .all(|c| c.is_finite()));
}

#[test]
fn analyzed_words_survive_the_codec() {
    let audio = synthetic_recording();
    let config = AnalysisConfig {
        vector_size: 6,
        window_size: 512,
        window_stride: 256,
        window_fn: WindowFunction::Hamming,
    };

    let analysis = analyze_clip("codec", &audio, &config, &EndpointConfig::default()).unwrap();
    assert!(!analysis.clip.words.is_empty());

    for word in &analysis.clip.words {
        let bytes = encode_word(word).unwrap();
        assert_eq!(bytes.len(), 16 + word.len() * 6 * 8);
        assert_eq!(&decode_word(&bytes).unwrap(), word);
    }
}

#[test]
fn short_recording_is_analyzed_whole() {
    // Under a second of audio: endpointing bypasses detection and the
    // whole recording becomes a single word.
    let samples: Vec<f32> = (0..15_000).map(|n| chaos(n, 0.4)).collect();
    let audio = Audio::new(samples, 16_000);
    let config = AnalysisConfig::default();

    let analysis = analyze_clip("short", &audio, &config, &EndpointConfig::default()).unwrap();
    assert_eq!(analysis.spans.len(), 1);
    assert_eq!(analysis.spans[0].start, 0);
    assert_eq!(analysis.spans[0].last_sample(), 14_999);
    assert_eq!(analysis.clip.words.len(), 1);
    // 15000 samples fit (15000 − 1024)/512 + 1 = 28 window positions.
    assert_eq!(analysis.clip.words[0].len(), 28);
}
