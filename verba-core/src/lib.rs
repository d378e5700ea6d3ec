//! # verba-core
//!
//! Speech-analysis engine that segments a recording into spoken words and
//! reduces each to a sequence of linear-prediction coefficient vectors.
//!
//! ## Architecture
//!
//! ```text
//! WAV file / Microphone → Audio
//!                           │
//!                     endpoint::detect_spans
//!                           │
//!                 per-span lpc::analyze_word (window fn + Yule-Walker)
//!                           │
//!                         Clip { words }
//!                           │
//!                 codec::encode_word → persistence (verba-cli)
//! ```
//!
//! The pipeline is synchronous and single-threaded: every stage consumes its
//! input fully before the next one runs, and buffers are moved forward, never
//! shared. The one exception is microphone capture, where the OS audio
//! callback hands samples to the caller through a lock-free SPSC ring buffer.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod audio;
pub mod clip;
pub mod codec;
pub mod diff;
pub mod endpoint;
pub mod error;
pub mod lpc;
pub mod pipeline;
pub mod window;

// Convenience re-exports for downstream crates
pub use audio::Audio;
pub use clip::{AnalysisConfig, Clip, Word};
pub use endpoint::{EndpointConfig, SampleSpan};
pub use error::VerbaError;
pub use pipeline::{analyze_clip, ClipAnalysis};
pub use window::WindowFunction;
