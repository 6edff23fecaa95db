//! Core types shared by every processing stage.

use crate::error::{DspError, DspResult};

/// Validate a sample rate: finite and strictly positive.
pub(crate) fn check_sample_rate(sample_rate: f64) -> DspResult<()> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        warn!("rejecting sample rate {}", sample_rate);
        Err(DspError::InvalidSampleRate(sample_rate))
    }
}

/// Validate samples: non-empty and free of NaN/infinity.
pub(crate) fn check_samples(samples: &[f64]) -> DspResult<()> {
    if samples.is_empty() {
        return Err(DspError::EmptySignal);
    }
    match samples.iter().position(|s| !s.is_finite()) {
        Some(index) => {
            warn!("non-finite sample at index {}", index);
            Err(DspError::NonFiniteSample { index })
        }
        None => Ok(()),
    }
}

/// A finite, uniformly sampled real signal.
///
/// Holds at least one finite sample and a positive sample rate. The samples
/// cannot be modified after construction; stages that transform a signal
/// return a new buffer with the same sample rate.
#[derive(Clone, Debug, PartialEq)]
pub struct SignalBuffer {
    samples: Vec<f64>,
    sample_rate: f64,
}

impl SignalBuffer {
    /// Create a buffer from samples and a sample rate in Hz.
    ///
    /// # Errors
    /// * [`DspError::InvalidSampleRate`] - rate is not finite and positive
    /// * [`DspError::EmptySignal`] - no samples
    /// * [`DspError::NonFiniteSample`] - a sample is NaN or infinite
    pub fn new(samples: Vec<f64>, sample_rate: f64) -> DspResult<Self> {
        check_sample_rate(sample_rate)?;
        check_samples(&samples)?;
        Ok(Self {
            samples,
            sample_rate,
        })
    }

    /// Buffer of `len` zeros.
    ///
    /// # Errors
    /// Same as [`SignalBuffer::new`]; `len == 0` is [`DspError::EmptySignal`].
    pub fn zeros(len: usize, sample_rate: f64) -> DspResult<Self> {
        Self::new(vec![0.0; len], sample_rate)
    }

    /// Unit impulse of `len` samples with the 1.0 at `position`.
    ///
    /// # Errors
    /// Same as [`SignalBuffer::zeros`], plus
    /// [`DspError::InvalidSpecification`] when `position >= len`.
    pub fn impulse(len: usize, position: usize, sample_rate: f64) -> DspResult<Self> {
        if position >= len {
            return Err(DspError::invalid("impulse position outside the buffer"));
        }
        let mut samples = vec![0.0; len];
        samples[position] = 1.0;
        Self::new(samples, sample_rate)
    }

    /// Samples in time order.
    #[must_use]
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    /// Sample rate in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of samples (always at least 1).
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always `false`; present for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate
    }

    /// Nyquist frequency (half the sample rate) in Hz.
    #[must_use]
    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    /// New buffer with the same sample rate and different samples.
    ///
    /// # Errors
    /// [`DspError::EmptySignal`] or [`DspError::NonFiniteSample`] for the
    /// replacement samples.
    pub fn with_samples(&self, samples: Vec<f64>) -> DspResult<Self> {
        check_samples(&samples)?;
        Ok(Self {
            samples,
            sample_rate: self.sample_rate,
        })
    }

    /// New buffer with `f` applied to every sample.
    ///
    /// # Errors
    /// [`DspError::NonFiniteSample`] if `f` produces NaN or infinity.
    pub fn map<F>(&self, f: F) -> DspResult<Self>
    where
        F: FnMut(f64) -> f64,
    {
        self.with_samples(self.samples.iter().copied().map(f).collect())
    }

    /// Consume the buffer and return its samples.
    #[must_use]
    pub fn into_samples(self) -> Vec<f64> {
        self.samples
    }
}

impl AsRef<[f64]> for SignalBuffer {
    fn as_ref(&self) -> &[f64] {
        &self.samples
    }
}
