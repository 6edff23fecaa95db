//! Error types shared by every processing stage.

use thiserror::Error;

/// Result of a fallible DSP operation
pub type DspResult<T> = Result<T, DspError>;

/// Failure of a processing stage.
///
/// Every stage either returns a complete output or one of these; nothing is
/// retried internally because all stages are deterministic.
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DspError {
    /// Bad order/cutoff combination or other out-of-range parameter,
    /// rejected before any numeric work.
    #[error("invalid filter specification: {reason}")]
    InvalidSpecification {
        /// What was wrong with the parameters
        reason: &'static str,
    },

    /// Signal is too short for the edge padding the filter needs.
    #[error("signal has {len} samples but the filter needs at least {required}")]
    InsufficientSignalLength {
        /// Number of samples supplied
        len: usize,
        /// Minimum number of samples for this filter
        required: usize,
    },

    /// Zero-length signal.
    #[error("signal contains no samples")]
    EmptySignal,

    /// NaN or infinity in the input.
    #[error("non-finite sample at index {index}")]
    NonFiniteSample {
        /// Position of the first offending sample
        index: usize,
    },

    /// Sample rate is not a finite positive number.
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),
}

impl DspError {
    /// Shorthand for [`DspError::InvalidSpecification`].
    #[must_use]
    pub const fn invalid(reason: &'static str) -> Self {
        Self::InvalidSpecification { reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        let err = DspError::InsufficientSignalLength {
            len: 10,
            required: 15,
        };
        assert_eq!(
            err.to_string(),
            "signal has 10 samples but the filter needs at least 15"
        );
        assert_eq!(
            DspError::invalid("order must be at least 1").to_string(),
            "invalid filter specification: order must be at least 1"
        );
        assert_eq!(
            DspError::NonFiniteSample { index: 3 }.to_string(),
            "non-finite sample at index 3"
        );
    }
}
