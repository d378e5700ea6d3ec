//! Typed analysis results passed between the pipeline stages and persistence.

use crate::error::{Result, VerbaError};
use crate::window::WindowFunction;

/// Parameters of one analysis run, constructed once from parsed input and
/// passed by reference down the call chain.
///
/// All sizes are in samples and must be greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalysisConfig {
    /// Number of linear-prediction coefficients per vector (the LPC order).
    pub vector_size: usize,
    /// Length of the sliding analysis window.
    pub window_size: usize,
    /// Distance between consecutive window centers.
    pub window_stride: usize,
    /// Weighting envelope applied to each window before autocorrelation.
    pub window_fn: WindowFunction,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            vector_size: 16,
            window_size: 1024,
            window_stride: 512,
            window_fn: WindowFunction::Hann,
        }
    }
}

/// One detected spoken word: an ordered sequence of coefficient vectors,
/// all of the same length. A word may be empty (the segment was shorter
/// than one analysis window).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Word {
    pub coeff_vectors: Vec<Vec<f64>>,
}

impl Word {
    pub fn new(coeff_vectors: Vec<Vec<f64>>) -> Self {
        Self { coeff_vectors }
    }

    /// Number of coefficient vectors in this word.
    pub fn len(&self) -> usize {
        self.coeff_vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coeff_vectors.is_empty()
    }

    /// Shared length of the coefficient vectors, or `None` for an empty word.
    pub fn vector_size(&self) -> Option<usize> {
        self.coeff_vectors.first().map(Vec::len)
    }

    /// `count` vectors starting at `offset`.
    ///
    /// # Errors
    /// `VerbaError::VectorRangeOutOfRange` when the requested range does not
    /// fit inside this word.
    pub fn vectors(&self, offset: usize, count: usize) -> Result<&[Vec<f64>]> {
        let end = offset.checked_add(count);
        match end {
            Some(end) if end <= self.coeff_vectors.len() => Ok(&self.coeff_vectors[offset..end]),
            _ => Err(VerbaError::VectorRangeOutOfRange {
                offset,
                count,
                available: self.coeff_vectors.len(),
            }),
        }
    }
}

/// A named, analyzed recording: the parameters it was produced with and its
/// words, indexed contiguously from 0. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub name: String,
    pub vector_size: usize,
    pub window_size: usize,
    pub window_stride: usize,
    pub words: Vec<Word>,
}

impl Clip {
    /// The word at `index`.
    ///
    /// # Errors
    /// `VerbaError::WordIndexOutOfRange` when `index >= words.len()`.
    pub fn word(&self, index: usize) -> Result<&Word> {
        self.words
            .get(index)
            .ok_or(VerbaError::WordIndexOutOfRange {
                index,
                count: self.words.len(),
            })
    }
}
