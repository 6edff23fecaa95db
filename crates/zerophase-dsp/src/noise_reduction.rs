//! Noise Reduction Module
//!
//! Non-linear smoothing for impulse noise that a linear low-pass would only
//! spread out, plus the offset and gain corrections usually applied before
//! and after filtering.

use crate::error::{DspError, DspResult};
use crate::types::SignalBuffer;

/// Subtract the arithmetic mean so the result averages to zero.
///
/// # Errors
/// [`DspError::NonFiniteSample`] if the samples are so large that their sum
/// overflows.
pub fn remove_dc_offset(buffer: &SignalBuffer) -> DspResult<SignalBuffer> {
    let samples = buffer.samples();
    let mean = samples.iter().sum::<f64>() / samples.len() as f64;
    debug!("removing DC offset {}", mean);
    buffer.map(|s| s - mean)
}

/// Multiply every sample by `gain`.
///
/// # Errors
/// * [`DspError::InvalidSpecification`] - `gain` is NaN or infinite
/// * [`DspError::NonFiniteSample`] - a scaled sample overflows
pub fn apply_gain(buffer: &SignalBuffer, gain: f64) -> DspResult<SignalBuffer> {
    if !gain.is_finite() {
        warn!("rejecting non-finite gain");
        return Err(DspError::invalid("gain must be finite"));
    }
    buffer.map(|s| s * gain)
}

/// Sliding-window median filter.
///
/// Each output sample is the median of the input samples within
/// `window / 2` positions of it. An even `window` is widened by one so the
/// window stays centred. Near the ends the window holds only the samples that
/// exist; when that leaves an even count, the two middle values are averaged.
/// `window <= 1` returns the input unchanged.
///
/// # Errors
/// None for a valid buffer; the `Result` carries through buffer validation.
pub fn median_filter(buffer: &SignalBuffer, window: usize) -> DspResult<SignalBuffer> {
    let window = if window % 2 == 0 { window + 1 } else { window };
    let half = window / 2;
    let samples = buffer.samples();
    let len = samples.len();

    trace!("median filter: window {}, {} samples", window, len);

    let mut scratch = Vec::with_capacity(window);
    let filtered = (0..len)
        .map(|i| {
            let start = i.saturating_sub(half);
            let end = (i + half + 1).min(len);
            scratch.clear();
            scratch.extend_from_slice(&samples[start..end]);
            median(&mut scratch)
        })
        .collect();

    buffer.with_samples(filtered)
}

/// Median of a non-empty slice, sorting it in place.
fn median(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}
