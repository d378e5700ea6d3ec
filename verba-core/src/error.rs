use thiserror::Error;

/// All errors produced by verba-core and its persistence layer.
#[derive(Debug, Error)]
pub enum VerbaError {
    #[error("audio device error: {0}")]
    AudioDevice(String),

    #[error("audio stream error: {0}")]
    AudioStream(String),

    #[error("no default input device found")]
    NoDefaultInputDevice,

    #[error("unsupported audio source: {0}")]
    UnsupportedAudio(String),

    #[error("autocorrelation matrix is singular — the frame is silent or constant")]
    SingularFrame,

    #[error("coefficient vectors in a word must all share one length")]
    MismatchedVectors,

    #[error("encoded word truncated: field needs {expected} bytes, {actual} remain")]
    CorruptWord { expected: usize, actual: usize },

    #[error("clip `{name}` is corrupted: {detail}")]
    CorruptClip { name: String, detail: String },

    #[error("duplicate clip name: `{0}`")]
    DuplicateClip(String),

    #[error("no such clip: `{0}`")]
    NoSuchClip(String),

    #[error("word index {index} out of range for a clip with {count} word(s)")]
    WordIndexOutOfRange { index: usize, count: usize },

    #[error("vector range {offset}+{count} exceeds a word with {available} vector(s)")]
    VectorRangeOutOfRange {
        offset: usize,
        count: usize,
        available: usize,
    },

    #[error("malformed number: `{0}`")]
    MalformedNumber(String),

    #[error("unknown window function: `{0}` (expected hamming, hann or none)")]
    UnknownWindowFunction(String),

    #[error("malformed word reference: `{0}` (expected clip:word_index[:offset])")]
    MalformedWordRef(String),

    #[error("unknown clip source: `{0}` (expected wav=<file> or record)")]
    MalformedSource(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, VerbaError>;
