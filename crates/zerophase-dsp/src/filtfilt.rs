//! Zero-phase (forward-backward) filtering.
//!
//! The signal is filtered forward, reversed, filtered again and reversed
//! back. The second pass undoes the phase shift of the first, so the net
//! response is `|H(e^jω)|²` with exactly zero phase. This requires the whole
//! signal up front and is therefore non-causal.
//!
//! Start/end transients are suppressed by extending the signal at both ends
//! with an odd reflection about its end samples and starting each pass from
//! the filter's steady state for the first sample it sees.

use crate::config::PADDING_FACTOR;
use crate::error::{DspError, DspResult};
use crate::filter::{steady_state, IirFilter};
use crate::filter_design::FilterCoefficients;
use crate::types::SignalBuffer;

/// Number of samples added at each end before filtering.
#[must_use]
pub fn padding_len(coeffs: &FilterCoefficients) -> usize {
    PADDING_FACTOR * (coeffs.len() - 1)
}

/// Shortest signal [`filtfilt`] accepts for these coefficients.
#[must_use]
pub fn min_signal_len(coeffs: &FilterCoefficients) -> usize {
    PADDING_FACTOR * coeffs.len()
}

/// Apply `coeffs` forward and backward for zero phase distortion.
///
/// The output has the same length and sample rate as `input`.
///
/// # Errors
/// * [`DspError::InsufficientSignalLength`] - `input` is shorter than
///   [`min_signal_len`]
/// * [`DspError::InvalidSpecification`] - the coefficients have no steady
///   state (pole at `z = 1`)
/// * [`DspError::NonFiniteSample`] - the filter diverged
pub fn filtfilt(coeffs: &FilterCoefficients, input: &SignalBuffer) -> DspResult<SignalBuffer> {
    let required = min_signal_len(coeffs);
    if input.len() < required {
        warn!(
            "filtfilt needs {} samples, got {}",
            required,
            input.len()
        );
        return Err(DspError::InsufficientSignalLength {
            len: input.len(),
            required,
        });
    }

    let padlen = padding_len(coeffs);
    let zi = steady_state(coeffs)?;
    debug!(
        "filtfilt: {} samples, order {}, padding {}",
        input.len(),
        coeffs.order(),
        padlen
    );

    let mut work = odd_extend(input.samples(), padlen);

    run_pass(coeffs, &zi, &mut work)?;
    work.reverse();
    run_pass(coeffs, &zi, &mut work)?;
    work.reverse();

    let filtered = work[padlen..work.len() - padlen].to_vec();
    input.with_samples(filtered)
}

/// One pass over `samples`, starting from `zi` scaled by the first sample.
fn run_pass(coeffs: &FilterCoefficients, zi: &[f64], samples: &mut [f64]) -> DspResult<()> {
    let first = samples.first().copied().ok_or(DspError::EmptySignal)?;
    let state: Vec<f64> = zi.iter().map(|z| z * first).collect();
    let mut filter = IirFilter::with_state(coeffs, &state)?;
    filter.process_block(samples);
    Ok(())
}

/// Extend `x` by `n` samples at each end with an odd reflection.
///
/// Left: `2·x[0] - x[n], …, 2·x[0] - x[1]`;
/// right: `2·x[N-1] - x[N-2], …, 2·x[N-1] - x[N-1-n]`.
/// Requires `n < x.len()`.
fn odd_extend(x: &[f64], n: usize) -> Vec<f64> {
    let len = x.len();
    let first = x[0];
    let last = x[len - 1];

    let mut out = Vec::with_capacity(len + 2 * n);
    out.extend((1..=n).rev().map(|i| 2.0 * first - x[i]));
    out.extend_from_slice(x);
    out.extend((1..=n).map(|i| 2.0 * last - x[len - 1 - i]));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter_design::{design, FilterSpec};

    const SAMPLE_RATE: f64 = 1000.0;

    #[test]
    fn test_odd_extend() {
        let x = [1.0, 2.0, 4.0, 7.0, 11.0];
        let ext = odd_extend(&x, 2);
        // left: 2*1-4, 2*1-2 ; right: 2*11-7, 2*11-4
        assert_eq!(ext, vec![-2.0, 0.0, 1.0, 2.0, 4.0, 7.0, 11.0, 15.0, 18.0]);
    }

    #[test]
    fn test_odd_extend_zero_padding() {
        let x = [3.0, 1.0];
        assert_eq!(odd_extend(&x, 0), vec![3.0, 1.0]);
    }

    #[test]
    fn test_padding_lengths() {
        let coeffs = design(&FilterSpec::lowpass(4, 10.0), SAMPLE_RATE).unwrap();
        assert_eq!(padding_len(&coeffs), 12);
        assert_eq!(min_signal_len(&coeffs), 15);
    }

    #[test]
    fn test_rejects_short_signal() {
        let coeffs = design(&FilterSpec::lowpass(4, 10.0), SAMPLE_RATE).unwrap();
        let short = SignalBuffer::zeros(14, SAMPLE_RATE).unwrap();
        assert_eq!(
            filtfilt(&coeffs, &short),
            Err(DspError::InsufficientSignalLength {
                len: 14,
                required: 15
            })
        );
        let just_enough = SignalBuffer::zeros(15, SAMPLE_RATE).unwrap();
        assert!(filtfilt(&coeffs, &just_enough).is_ok());
    }

    #[test]
    fn test_constant_signal_unchanged() {
        let coeffs = design(&FilterSpec::lowpass(3, 25.0), SAMPLE_RATE).unwrap();
        let dc = SignalBuffer::new(vec![0.4; 200], SAMPLE_RATE).unwrap();
        let out = filtfilt(&coeffs, &dc).unwrap();
        for s in out.samples() {
            assert!((s - 0.4).abs() < 1e-9, "sample {s}");
        }
    }

    #[test]
    fn test_preserves_length_and_rate() {
        let coeffs = design(&FilterSpec::highpass(2, 100.0), SAMPLE_RATE).unwrap();
        let input = SignalBuffer::impulse(64, 10, SAMPLE_RATE).unwrap();
        let out = filtfilt(&coeffs, &input).unwrap();
        assert_eq!(out.len(), 64);
        assert_eq!(out.sample_rate(), SAMPLE_RATE);
    }

    #[test]
    fn test_linear_ramp_passes_lowpass() {
        // |H|² is even in ω, so a ramp comes through without lag once the
        // start-up transients have died out
        let coeffs = design(&FilterSpec::lowpass(2, 50.0), SAMPLE_RATE).unwrap();
        let ramp: Vec<f64> = (0..300).map(|i| f64::from(i) * 0.01).collect();
        let input = SignalBuffer::new(ramp.clone(), SAMPLE_RATE).unwrap();
        let out = filtfilt(&coeffs, &input).unwrap();
        for (o, r) in out.samples()[50..250].iter().zip(&ramp[50..250]) {
            assert!((o - r).abs() < 1e-5, "{o} vs {r}");
        }
    }
}
