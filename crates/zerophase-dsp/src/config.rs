//! Configuration constants and the caller-facing filter configuration.
//!
//! Compile-time limits and the defaults of the reference setup (1 kHz
//! sampling, 5 Hz tone, 4th-order low-pass at 10 Hz, noise σ = 0.5) are
//! centralized here.

use crate::error::{DspError, DspResult};
use crate::filter_design::{FilterSpec, FilterType};

/// Highest supported Butterworth order
pub const MAX_ORDER: usize = 12;

/// Coefficient capacity per polynomial (`MAX_ORDER + 1`)
pub const MAX_COEFFS: usize = MAX_ORDER + 1;

/// Rejection reason for an order outside `1..=MAX_ORDER`
pub(crate) const ORDER_LIMIT_REASON: &str = "order must be between 1 and 12";

// Keep the reason text and the capacity in step with MAX_ORDER
const _: () = assert!(MAX_ORDER == 12 && MAX_COEFFS >= 2);

/// Edge padding per filter delay for zero-phase filtering
pub const PADDING_FACTOR: usize = 3;

/// Default sample rate in Hz
pub const DEFAULT_SAMPLE_RATE: f64 = 1000.0;

/// Default synthetic tone frequency in Hz
pub const DEFAULT_TONE_HZ: f64 = 5.0;

/// Default synthetic tone duration in seconds
pub const DEFAULT_DURATION_S: f64 = 1.0;

/// Default filter order
pub const DEFAULT_ORDER: usize = 4;

/// Default cutoff frequency in Hz
pub const DEFAULT_CUTOFF_HZ: f64 = 10.0;

/// Default standard deviation of injected noise
pub const DEFAULT_NOISE_STD_DEV: f64 = 0.5;

/// Magnitude floor for dB conversion
pub const MIN_DB: f64 = -120.0;

/// Filter configuration exposed to callers.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterConfig {
    /// Butterworth order (1 to [`MAX_ORDER`])
    pub order: usize,
    /// Cutoff frequency in Hz
    pub cutoff_hz: f64,
    /// Low-pass or high-pass
    pub filter_type: FilterType,
    /// Noise added on the synthetic path (`None` = clean)
    pub noise_std_dev: Option<f64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_ORDER,
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            filter_type: FilterType::Lowpass,
            noise_std_dev: Some(DEFAULT_NOISE_STD_DEV),
        }
    }
}

impl FilterConfig {
    /// Filter specification described by this configuration.
    #[must_use]
    pub fn spec(&self) -> FilterSpec {
        FilterSpec {
            order: self.order,
            cutoff_hz: self.cutoff_hz,
            filter_type: self.filter_type,
        }
    }

    /// Check everything that can be checked without a sample rate.
    ///
    /// The Nyquist limit depends on the signal and is enforced at design time.
    ///
    /// # Errors
    /// [`DspError::InvalidSpecification`] describing the first problem found.
    pub fn validate(&self) -> DspResult<()> {
        if !(1..=MAX_ORDER).contains(&self.order) {
            return Err(DspError::invalid(ORDER_LIMIT_REASON));
        }
        if !(self.cutoff_hz.is_finite() && self.cutoff_hz > 0.0) {
            return Err(DspError::invalid("cutoff must be a positive frequency"));
        }
        match self.noise_std_dev {
            Some(sd) if !(sd.is_finite() && sd >= 0.0) => Err(DspError::invalid(
                "noise standard deviation must be finite and non-negative",
            )),
            _ => Ok(()),
        }
    }
}
