//! Processing Pipeline
//!
//! Chains the stages into the complete conditioning run: design a
//! Butterworth filter from a [`FilterConfig`], filter the signal forward and
//! backward, and compute spectra of the signal before and after filtering.

use rand::Rng;

use crate::config::FilterConfig;
use crate::error::DspResult;
use crate::filter_design::{design, FilterCoefficients};
use crate::filtfilt::filtfilt;
use crate::noise::inject_noise;
use crate::oscillator::ToneGenerator;
use crate::spectrum::{analyze, Spectrum};
use crate::types::SignalBuffer;

/// Everything one pipeline run produces.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineOutput {
    /// Signal that entered the filter
    pub input: SignalBuffer,
    /// Zero-phase filtered signal (same length and rate as `input`)
    pub filtered: SignalBuffer,
    /// Coefficients designed for this run
    pub coefficients: FilterCoefficients,
    /// Spectrum of `input`
    pub input_spectrum: Spectrum,
    /// Spectrum of `filtered`
    pub output_spectrum: Spectrum,
}

/// Result of a synthetic run: the clean reference plus the processed
/// (possibly noisy) copy.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticRun {
    /// Tone before noise injection
    pub clean: SignalBuffer,
    /// Spectrum of `clean`
    pub clean_spectrum: Spectrum,
    /// Pipeline output for the noisy tone
    pub output: PipelineOutput,
}

/// Filter an existing signal and analyze it before and after.
///
/// `config.noise_std_dev` is not used here; externally supplied signals
/// carry their own noise.
///
/// # Errors
/// * [`DspError::InvalidSpecification`](crate::DspError::InvalidSpecification) - bad configuration for this sample rate
/// * [`DspError::InsufficientSignalLength`](crate::DspError::InsufficientSignalLength) - signal too short for the order
pub fn process(signal: &SignalBuffer, config: &FilterConfig) -> DspResult<PipelineOutput> {
    config.validate()?;
    info!(
        "processing {} samples at {} Hz: order {} cutoff {} Hz",
        signal.len(),
        signal.sample_rate(),
        config.order,
        config.cutoff_hz
    );

    let coefficients = design(&config.spec(), signal.sample_rate())?;
    let filtered = filtfilt(&coefficients, signal)?;
    let input_spectrum = analyze(signal)?;
    let output_spectrum = analyze(&filtered)?;

    Ok(PipelineOutput {
        input: signal.clone(),
        filtered,
        coefficients,
        input_spectrum,
        output_spectrum,
    })
}

/// Generate `tone`, add the configured noise from `rng`, and run
/// [`process`] on the result.
///
/// With `noise_std_dev == None` the processed signal is the clean tone and
/// `rng` is left untouched.
///
/// # Errors
/// Tone generation errors, invalid noise level, and everything [`process`]
/// returns.
pub fn run_synthetic<R>(tone: &ToneGenerator, config: &FilterConfig, rng: &mut R) -> DspResult<SyntheticRun>
where
    R: Rng + ?Sized,
{
    config.validate()?;
    let clean = tone.generate()?;
    let noisy = match config.noise_std_dev {
        Some(std_dev) => {
            debug!("adding noise with std dev {}", std_dev);
            inject_noise(&clean, std_dev, rng)?
        }
        None => clean.clone(),
    };

    let output = process(&noisy, config)?;
    let clean_spectrum = analyze(&clean)?;

    Ok(SyntheticRun {
        clean,
        clean_spectrum,
        output,
    })
}
