//! Implementations of the CLI commands and their argument grammars.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::Duration;

use tracing::info;

use verba_core::audio::capture::{create_capture_ring, AudioCapture, Consumer};
use verba_core::audio::wav;
use verba_core::diff::distance_series;
use verba_core::error::{Result, VerbaError};
use verba_core::{analyze_clip, AnalysisConfig, Audio, EndpointConfig};

use crate::store::ClipStore;
use crate::AddArgs;

/// A window size or stride, either directly in samples or in milliseconds
/// to be resolved against the source sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeArg {
    Samples(usize),
    Millis(u32),
}

impl SizeArg {
    pub fn resolve(self, audio: &Audio) -> usize {
        match self {
            SizeArg::Samples(n) => n,
            SizeArg::Millis(ms) => audio.ms_to_samples(ms),
        }
    }
}

impl FromStr for SizeArg {
    type Err = VerbaError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || VerbaError::MalformedNumber(s.to_string());
        if let Some(ms) = s.strip_suffix("ms") {
            Ok(SizeArg::Millis(ms.parse().map_err(|_| malformed())?))
        } else {
            Ok(SizeArg::Samples(s.parse().map_err(|_| malformed())?))
        }
    }
}

/// Where the samples of a new clip come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipSource {
    Wav(PathBuf),
    Record,
}

impl FromStr for ClipSource {
    type Err = VerbaError;

    fn from_str(s: &str) -> Result<Self> {
        if s == "record" {
            Ok(ClipSource::Record)
        } else if let Some(path) = s.strip_prefix("wav=") {
            Ok(ClipSource::Wav(PathBuf::from(path)))
        } else {
            Err(VerbaError::MalformedSource(s.to_string()))
        }
    }
}

/// `clip:word_index[:offset]` — one end of a diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordRef {
    pub clip: String,
    pub word_index: usize,
    pub offset: usize,
}

impl FromStr for WordRef {
    type Err = VerbaError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || VerbaError::MalformedWordRef(s.to_string());
        let parts: Vec<&str> = s.split(':').collect();
        let (clip, word_index, offset) = match parts.as_slice() {
            [clip, word] => (clip, word, None),
            [clip, word, offset] => (clip, word, Some(offset)),
            _ => return Err(malformed()),
        };
        if clip.is_empty() {
            return Err(malformed());
        }

        Ok(WordRef {
            clip: clip.to_string(),
            word_index: word_index.parse().map_err(|_| malformed())?,
            offset: match offset {
                Some(o) => o.parse().map_err(|_| malformed())?,
                None => 0,
            },
        })
    }
}

pub fn db_list(database: &Path) -> Result<()> {
    let store = ClipStore::open(database)?;
    let names = store.all_clip_names()?;

    println!("Clips in the database:");
    if names.is_empty() {
        println!("\tNo clips.");
    } else {
        for name in names {
            println!("\t- {name}");
        }
    }
    Ok(())
}

pub fn db_add(database: &Path, args: AddArgs) -> Result<()> {
    let mut store = ClipStore::open(database)?;
    if store.clip_exists(&args.name)? {
        // Fail before recording or decoding anything.
        return Err(VerbaError::DuplicateClip(args.name));
    }

    let source: ClipSource = args.source.parse()?;
    let audio = match source {
        ClipSource::Wav(path) => wav::read_wav(&path)?,
        ClipSource::Record => record_interactive()?,
    };

    let config = AnalysisConfig {
        vector_size: args.vector_size,
        window_size: args.window_size.resolve(&audio),
        window_stride: args.window_stride.resolve(&audio),
        window_fn: args.window_fn,
    };

    let analysis = analyze_clip(&args.name, &audio, &config, &EndpointConfig::default())?;
    for (i, span) in analysis.spans.iter().enumerate() {
        println!(
            "word {i}: {}ms - {}ms",
            audio.samples_to_ms(span.start),
            audio.samples_to_ms(span.last_sample()),
        );
    }

    store.add_clip(&analysis.clip)?;
    println!(
        "Added clip `{}` with {} word(s).",
        analysis.clip.name,
        analysis.clip.words.len()
    );
    Ok(())
}

pub fn db_remove(database: &Path, name: &str) -> Result<()> {
    let mut store = ClipStore::open(database)?;
    store.remove_clip(name)?;
    println!("Removed clip `{name}`.");
    Ok(())
}

pub fn diff(database: &Path, first: &str, second: &str, count: usize) -> Result<()> {
    let first: WordRef = first.parse()?;
    let second: WordRef = second.parse()?;

    let store = ClipStore::open(database)?;
    let first_clip = store.get_clip(&first.clip)?;
    let second_clip = store.get_clip(&second.clip)?;

    let first_vectors = first_clip.word(first.word_index)?.vectors(first.offset, count)?;
    let second_vectors = second_clip
        .word(second.word_index)?
        .vectors(second.offset, count)?;

    let distances = distance_series(first_vectors, second_vectors);
    println!("Coefficient vector diff ({count} position(s)):");
    let mut max = 0.0f64;
    for (i, d) in distances.iter().enumerate() {
        println!("\t{i:>4}: {d:.6}");
        max = max.max(*d);
    }
    println!("\tmax: {max:.6}");
    Ok(())
}

/// Record from the default microphone until the user presses ENTER.
fn record_interactive() -> Result<Audio> {
    println!("[*] About to record audio. Press ENTER when ready.");
    wait_for_enter()?;
    for i in (1..=3).rev() {
        println!("[|] Recording in {i}...");
        thread::sleep(Duration::from_secs(1));
    }

    let (producer, mut consumer) = create_capture_ring();
    let running = Arc::new(AtomicBool::new(true));
    let capture = AudioCapture::open_default(producer, Arc::clone(&running))?;

    println!("[*] Recording in progress. Press ENTER to stop.");
    let stopped = Arc::new(AtomicBool::new(false));
    let stop_flag = Arc::clone(&stopped);
    let stdin_reader = thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        stop_flag.store(true, Ordering::Release);
    });

    // Drain the ring while the stream runs; the callback thread never
    // blocks on us.
    let mut samples: Vec<f32> = Vec::new();
    let mut chunk = vec![0.0f32; 8192];
    while !stopped.load(Ordering::Acquire) {
        let n = consumer.pop_slice(&mut chunk);
        if n > 0 {
            samples.extend_from_slice(&chunk[..n]);
        } else {
            thread::sleep(Duration::from_millis(20));
        }
    }

    capture.stop();
    // One settling pause, then pick up whatever the callback pushed last.
    thread::sleep(Duration::from_millis(50));
    loop {
        let n = consumer.pop_slice(&mut chunk);
        if n == 0 {
            break;
        }
        samples.extend_from_slice(&chunk[..n]);
    }
    let _ = stdin_reader.join();

    let audio = Audio::new(samples, capture.sample_rate);
    drop(capture);

    info!(
        samples = audio.samples.len(),
        sample_rate = audio.sample_rate,
        "recording captured"
    );
    println!("[+] Successfully recorded {}ms.", audio.duration_ms());
    Ok(audio)
}

fn wait_for_enter() -> Result<()> {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(())
}
