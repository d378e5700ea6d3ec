//! Microphone capture via cpal.
//!
//! # Design constraints
//!
//! The cpal input callback runs on an OS audio thread at elevated priority.
//! It **must not** allocate heap memory after warm-up, block on a mutex, or
//! perform I/O. The callback therefore only converts and downmixes into a
//! reused scratch buffer and writes the result into an SPSC ring buffer
//! producer whose `push_slice` is lock-free.
//!
//! The caller owns the consumer half and drains it at leisure; a shared
//! `AtomicBool` tells the callback to stop writing.
//!
//! # Threading note
//!
//! `cpal::Stream` is `!Send` on most platforms (COM on Windows, CoreAudio on
//! macOS). Create and drop `AudioCapture` on the same thread.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    SampleFormat, SampleRate, Stream, StreamConfig,
};
use ringbuf::{traits::Split, HeapRb};
use tracing::{error, info, warn};

pub use ringbuf::traits::{Consumer, Producer};

use crate::error::{Result, VerbaError};

/// Producer half — written by the audio callback thread.
pub type CaptureProducer = ringbuf::HeapProd<f32>;

/// Consumer half — drained by the recording caller.
pub type CaptureConsumer = ringbuf::HeapCons<f32>;

/// Buffer capacity: 2^22 f32 samples ≈ 87 s at 48 kHz, enough slack for a
/// drain loop that only wakes every few tens of milliseconds.
pub const RING_CAPACITY: usize = 1 << 22;

/// Create a matched producer/consumer pair backed by a heap ring buffer.
pub fn create_capture_ring() -> (CaptureProducer, CaptureConsumer) {
    HeapRb::<f32>::new(RING_CAPACITY).split()
}

/// Handle to an active microphone stream.
///
/// **Not `Send`** — bound to its creation thread on Windows/macOS.
pub struct AudioCapture {
    /// Kept alive so the stream is not dropped prematurely.
    _stream: Stream,
    running: Arc<AtomicBool>,
    /// Capture sample rate reported by the device (Hz).
    pub sample_rate: u32,
}

impl AudioCapture {
    /// Open the system default microphone and push mono f32 frames into
    /// `producer` until [`stop`](Self::stop) is called.
    ///
    /// # Errors
    /// `VerbaError::NoDefaultInputDevice` when no microphone is available,
    /// `VerbaError::AudioDevice`/`VerbaError::AudioStream` when cpal fails
    /// to configure or build the stream.
    pub fn open_default(mut producer: CaptureProducer, running: Arc<AtomicBool>) -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or(VerbaError::NoDefaultInputDevice)?;

        info!(
            device = device.name().unwrap_or_default().as_str(),
            "opening input device"
        );

        let supported = device
            .default_input_config()
            .map_err(|e| VerbaError::AudioDevice(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        let ch = channels as usize;

        info!(sample_rate, channels, "audio config selected");

        let config = StreamConfig {
            channels,
            sample_rate: SampleRate(sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_fn = |err| error!("audio stream error: {err}");

        let stream = match supported.sample_format() {
            SampleFormat::F32 => {
                let running = Arc::clone(&running);
                let mut scratch: Vec<f32> = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _info| {
                        if running.load(Ordering::Relaxed) {
                            push_frames(&mut producer, &mut scratch, data, ch, |s| s);
                        }
                    },
                    err_fn,
                    None,
                )
            }

            SampleFormat::I16 => {
                let running = Arc::clone(&running);
                let mut scratch: Vec<f32> = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _info| {
                        if running.load(Ordering::Relaxed) {
                            push_frames(&mut producer, &mut scratch, data, ch, |s| {
                                s as f32 / 32768.0
                            });
                        }
                    },
                    err_fn,
                    None,
                )
            }

            SampleFormat::U8 => {
                let running = Arc::clone(&running);
                let mut scratch: Vec<f32> = Vec::new();
                device.build_input_stream(
                    &config,
                    move |data: &[u8], _info| {
                        if running.load(Ordering::Relaxed) {
                            push_frames(&mut producer, &mut scratch, data, ch, |s| {
                                (s as f32 - 128.0) / 128.0
                            });
                        }
                    },
                    err_fn,
                    None,
                )
            }

            fmt => {
                return Err(VerbaError::AudioStream(format!(
                    "unsupported sample format: {fmt:?}"
                )))
            }
        }
        .map_err(|e| VerbaError::AudioStream(e.to_string()))?;

        stream
            .play()
            .map_err(|e| VerbaError::AudioStream(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            running,
            sample_rate,
        })
    }

    /// Signal the callback to stop writing on its next invocation.
    pub fn stop(&self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Convert one callback buffer to mono f32 and push it into the ring.
fn push_frames<T: Copy>(
    producer: &mut CaptureProducer,
    scratch: &mut Vec<f32>,
    data: &[T],
    channels: usize,
    convert: impl Fn(T) -> f32,
) {
    let frames = data.len() / channels;
    scratch.resize(frames, 0.0);

    for (f, slot) in scratch.iter_mut().enumerate().take(frames) {
        let base = f * channels;
        let mut sum = 0.0f32;
        for c in 0..channels {
            sum += convert(data[base + c]);
        }
        *slot = sum / channels as f32;
    }

    let written = producer.push_slice(&scratch[..frames]);
    if written < frames {
        warn!("ring buffer full: dropped {} frames", frames - written);
    }
}
