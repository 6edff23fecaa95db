//! Synthetic signal sources.
//!
//! Generates the test tones the pipeline is exercised with when no external
//! signal is supplied.

use crate::config::{DEFAULT_DURATION_S, DEFAULT_SAMPLE_RATE, DEFAULT_TONE_HZ};
use crate::error::{DspError, DspResult};
use crate::types::{check_sample_rate, SignalBuffer};

/// Sine tone generator.
///
/// Produces `amplitude · sin(2π·f·n/fs + phase)` for
/// `n = 0..round(duration · fs)`. The phase is computed from the sample index
/// on every step rather than accumulated, so long tones do not drift.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ToneGenerator {
    /// Peak amplitude
    pub amplitude: f64,
    /// Tone frequency in Hz
    pub frequency_hz: f64,
    /// Duration in seconds
    pub duration_s: f64,
    /// Sample rate in Hz
    pub sample_rate: f64,
    /// Initial phase in radians
    pub phase_rad: f64,
}

impl ToneGenerator {
    /// Create a generator with zero initial phase.
    ///
    /// # Arguments
    /// * `amplitude` - Peak amplitude
    /// * `frequency_hz` - Tone frequency in Hz
    /// * `duration_s` - Duration in seconds
    /// * `sample_rate` - Sample rate in Hz
    #[must_use]
    pub const fn new(amplitude: f64, frequency_hz: f64, duration_s: f64, sample_rate: f64) -> Self {
        Self {
            amplitude,
            frequency_hz,
            duration_s,
            sample_rate,
            phase_rad: 0.0,
        }
    }

    /// Same tone with a different initial phase.
    #[must_use]
    pub const fn with_phase(mut self, phase_rad: f64) -> Self {
        self.phase_rad = phase_rad;
        self
    }

    /// Number of samples [`generate`](Self::generate) will produce.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sample_count(&self) -> usize {
        let count = (self.duration_s * self.sample_rate).round();
        if count.is_finite() && count > 0.0 {
            count as usize
        } else {
            0
        }
    }

    /// Value of the tone at sample index `n`.
    #[must_use]
    pub fn sample_at(&self, n: usize) -> f64 {
        let t = n as f64 / self.sample_rate;
        self.amplitude * (2.0 * core::f64::consts::PI * self.frequency_hz * t + self.phase_rad).sin()
    }

    /// Render the tone into a new buffer.
    ///
    /// # Errors
    /// * [`DspError::InvalidSampleRate`] - bad sample rate
    /// * [`DspError::InvalidSpecification`] - non-finite amplitude, frequency or phase
    /// * [`DspError::EmptySignal`] - duration rounds to zero samples
    pub fn generate(&self) -> DspResult<SignalBuffer> {
        check_sample_rate(self.sample_rate)?;
        if !(self.amplitude.is_finite() && self.frequency_hz.is_finite() && self.phase_rad.is_finite())
        {
            return Err(DspError::invalid("tone parameters must be finite"));
        }
        let len = self.sample_count();
        debug!("generating {} samples of a {} Hz tone", len, self.frequency_hz);
        SignalBuffer::new((0..len).map(|n| self.sample_at(n)).collect(), self.sample_rate)
    }
}

impl Default for ToneGenerator {
    fn default() -> Self {
        Self::new(1.0, DEFAULT_TONE_HZ, DEFAULT_DURATION_S, DEFAULT_SAMPLE_RATE)
    }
}
