//! Linear-prediction analysis via the Yule-Walker normal equations.
//!
//! A frame of `N` samples is modeled as each sample being a linear
//! combination of the `p` preceding ones. The model coefficients fall out of
//! the symmetric Toeplitz system `M·a = R[1..=p]` with `M[i][j] = R[|i−j|]`,
//! where `R[k]` is the frame's autocorrelation at lag `k`. The system is
//! solved by direct elimination; `p` is small.

use tracing::trace;

use crate::clip::{AnalysisConfig, Word};
use crate::error::{Result, VerbaError};

/// Relative pivot threshold below which the normal equations are rejected
/// as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Autocorrelation of `samples` at `lag`: `Σ_{i=lag}^{N−1} s[i]·s[i−lag]`,
/// accumulated in f64 to limit rounding drift over long frames.
pub fn autocorrelate(samples: &[f32], lag: usize) -> f64 {
    let mut sum = 0.0f64;
    for i in lag..samples.len() {
        sum += samples[i] as f64 * samples[i - lag] as f64;
    }
    sum
}

/// Estimate `order` linear-prediction coefficients for one windowed frame.
///
/// # Errors
/// `VerbaError::SingularFrame` when the autocorrelation matrix is singular
/// (a silent or constant frame).
pub fn analyze_window(samples: &[f32], order: usize) -> Result<Vec<f64>> {
    let r: Vec<f64> = (0..=order).map(|lag| autocorrelate(samples, lag)).collect();

    let mut matrix: Vec<Vec<f64>> = (0..order)
        .map(|i| (0..order).map(|j| r[i.abs_diff(j)]).collect())
        .collect();
    let mut coeffs: Vec<f64> = r[1..].to_vec();

    solve_in_place(&mut matrix, &mut coeffs)?;

    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(VerbaError::SingularFrame);
    }

    Ok(coeffs)
}

/// Gaussian elimination with partial pivoting, solving `matrix·x = rhs` with
/// the solution left in `rhs`.
fn solve_in_place(matrix: &mut [Vec<f64>], rhs: &mut [f64]) -> Result<()> {
    let n = rhs.len();

    let scale = matrix
        .iter()
        .flatten()
        .fold(0.0f64, |acc, v| acc.max(v.abs()));
    if scale == 0.0 {
        return Err(VerbaError::SingularFrame);
    }
    let threshold = scale * SINGULAR_EPSILON;

    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if matrix[row][col].abs() > matrix[pivot][col].abs() {
                pivot = row;
            }
        }
        if matrix[pivot][col].abs() < threshold {
            return Err(VerbaError::SingularFrame);
        }
        matrix.swap(pivot, col);
        rhs.swap(pivot, col);

        for row in col + 1..n {
            let factor = matrix[row][col] / matrix[col][col];
            for k in col..n {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    for col in (0..n).rev() {
        let mut acc = rhs[col];
        for k in col + 1..n {
            acc -= matrix[col][k] * rhs[k];
        }
        rhs[col] = acc / matrix[col][col];
    }

    Ok(())
}

/// Slide an analysis window across one speech segment and collect the
/// coefficient vector of every position into a [`Word`].
///
/// Window centers start at `window_size/2` and advance by `window_stride`
/// for as long as the window's right edge stays inside the segment. Each
/// window is weighted by `config.window_fn` and rescaled by `1/gain` before
/// the solve. A segment shorter than `window_size` yields an empty word.
pub fn analyze_word(samples: &[f32], config: &AnalysisConfig) -> Result<Word> {
    if config.vector_size == 0 || config.window_size == 0 || config.window_stride == 0 {
        return Err(VerbaError::MalformedNumber(
            "analysis sizes must be greater than zero".into(),
        ));
    }

    let half = config.window_size / 2;
    let inv_gain = 1.0 / config.window_fn.gain();

    let mut scratch = vec![0.0f32; config.window_size];
    let mut coeff_vectors = Vec::new();

    let mut center = half;
    while center - half + config.window_size <= samples.len() {
        let start = center - half;
        scratch.copy_from_slice(&samples[start..start + config.window_size]);

        config.window_fn.apply(&mut scratch);
        for sample in &mut scratch {
            *sample *= inv_gain;
        }

        coeff_vectors.push(analyze_window(&scratch, config.vector_size)?);
        center += config.window_stride;
    }

    trace!(
        windows = coeff_vectors.len(),
        segment_len = samples.len(),
        "segment analyzed"
    );

    Ok(Word::new(coeff_vectors))
}
