//! Digital Filters
//!
//! Direct-form IIR filtering of arbitrary order, single-pass (causal)
//! filtering of whole buffers, and the steady-state initial conditions the
//! zero-phase filter seeds itself with.

use crate::error::{DspError, DspResult};
use crate::filter_design::FilterCoefficients;
use crate::types::SignalBuffer;

/// IIR filter state (Direct Form II Transposed).
///
/// Generalizes the second-order biquad recurrence to any order:
///
/// ```text
/// y[n]    = b0*x[n] + z0
/// z_i     = b_{i+1}*x[n] + z_{i+1} - a_{i+1}*y[n]
/// z_{N-1} = b_N*x[n] - a_N*y[n]
/// ```
///
/// The shorter of `b` / `a` is treated as zero-padded.
#[derive(Clone, Debug)]
pub struct IirFilter {
    b: Vec<f64>,
    a: Vec<f64>,
    state: Vec<f64>,
}

impl IirFilter {
    /// Create a filter with zero initial state.
    #[must_use]
    pub fn new(coeffs: &FilterCoefficients) -> Self {
        let n = coeffs.len();
        let mut b = coeffs.feedforward().to_vec();
        let mut a = coeffs.feedback().to_vec();
        b.resize(n, 0.0);
        a.resize(n, 0.0);
        Self {
            b,
            a,
            state: vec![0.0; n - 1],
        }
    }

    /// Create a filter starting from the given delay-line state.
    ///
    /// # Errors
    /// [`DspError::InvalidSpecification`] if `state` does not have exactly
    /// `order` elements.
    pub fn with_state(coeffs: &FilterCoefficients, state: &[f64]) -> DspResult<Self> {
        let mut filter = Self::new(coeffs);
        if state.len() != filter.state.len() {
            return Err(DspError::invalid("initial state length must equal the filter order"));
        }
        filter.state.copy_from_slice(state);
        Ok(filter)
    }

    /// Process a single sample.
    #[inline]
    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.b[0] * input + self.state.first().copied().unwrap_or(0.0);
        let last = self.state.len();
        for i in 0..last {
            let next = if i + 1 < last { self.state[i + 1] } else { 0.0 };
            self.state[i] = self.b[i + 1] * input + next - self.a[i + 1] * output;
        }
        output
    }

    /// Process a block of samples in-place.
    pub fn process_block(&mut self, samples: &mut [f64]) {
        for sample in samples.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state.fill(0.0);
    }

    /// Current delay-line state.
    #[must_use]
    pub fn state(&self) -> &[f64] {
        &self.state
    }
}

/// Filter a buffer once, forward in time, from zero initial state.
///
/// Causal and therefore phase-shifting; see [`crate::filtfilt`] for the
/// zero-phase variant.
///
/// # Errors
/// [`DspError::NonFiniteSample`] if the filter diverges (unstable
/// coefficients).
pub fn lfilter(coeffs: &FilterCoefficients, input: &SignalBuffer) -> DspResult<SignalBuffer> {
    let mut filter = IirFilter::new(coeffs);
    let mut samples = input.samples().to_vec();
    filter.process_block(&mut samples);
    trace!("lfilter: {} samples, order {}", samples.len(), coeffs.order());
    input.with_samples(samples)
}

/// Initial state for which a constant input produces a constant output.
///
/// Solves `(I - companion(a)ᵀ)·zi = b[1..] - a[1..]·b[0]`. Scaling the result
/// by the first sample of a signal starts the filter as if that value had
/// been present forever, which suppresses the start-up transient.
///
/// # Errors
/// [`DspError::InvalidSpecification`] if the system is singular (a pole at
/// `z = 1`).
pub fn steady_state(coeffs: &FilterCoefficients) -> DspResult<Vec<f64>> {
    let n = coeffs.len();
    let mut b = coeffs.feedforward().to_vec();
    let mut a = coeffs.feedback().to_vec();
    b.resize(n, 0.0);
    a.resize(n, 0.0);

    let m = n - 1;
    if m == 0 {
        return Ok(Vec::new());
    }

    // Row-major m x m system with right-hand side appended
    let mut system = vec![vec![0.0; m + 1]; m];
    for (i, row) in system.iter_mut().enumerate() {
        row[0] += a[i + 1];
        row[i] += 1.0;
        if i + 1 < m {
            row[i + 1] -= 1.0;
        }
        row[m] = b[i + 1] - a[i + 1] * b[0];
    }

    solve(&mut system).ok_or(DspError::invalid(
        "filter has a pole at z = 1 and no steady state",
    ))
}

/// Gaussian elimination with partial pivoting on an augmented matrix.
fn solve(system: &mut [Vec<f64>]) -> Option<Vec<f64>> {
    let m = system.len();
    for col in 0..m {
        let pivot = (col..m).max_by(|&i, &j| system[i][col].abs().total_cmp(&system[j][col].abs()))?;
        if system[pivot][col].abs() < f64::EPSILON * 1e-3 {
            return None;
        }
        system.swap(col, pivot);
        for row in col + 1..m {
            let factor = system[row][col] / system[col][col];
            if factor != 0.0 {
                for k in col..=m {
                    system[row][k] -= factor * system[col][k];
                }
            }
        }
    }

    let mut x = vec![0.0; m];
    for row in (0..m).rev() {
        let tail: f64 = (row + 1..m).map(|k| system[row][k] * x[k]).sum();
        x[row] = (system[row][m] - tail) / system[row][row];
    }
    Some(x)
}
