//! Zero-phase DSP Library
//!
//! Offline signal-conditioning primitives for complete, in-memory signals:
//! Butterworth filter design, forward-backward (zero-phase) IIR filtering and
//! one-sided magnitude spectra. Every stage is a pure function over immutable
//! values, so independent signals can be processed on separate threads by the
//! caller without coordination.
//!
//! # Modules
//!
//! - [`types`] - Core types: `SignalBuffer`
//! - [`complex`] - `f64` complex arithmetic for poles, zeros and the FFT
//! - [`oscillator`] - Synthetic tone source
//! - [`filter_design`] - Butterworth prototype + bilinear transform
//! - [`filter`] - Direct-form IIR filtering and steady-state conditions
//! - [`filtfilt`] - Zero-phase forward-backward filtering
//! - [`spectrum`] - FFT and one-sided magnitude spectrum
//! - [`noise`] - Seedable Gaussian noise injection
//! - [`noise_reduction`] - Median smoothing, DC offset removal and gain
//! - [`config`] - Constants and the caller-facing filter configuration
//! - [`pipeline`] - The complete synthesize/filter/analyze chain
//!
//! # Example
//!
//! ```
//! use zerophase_dsp::{design, filtfilt, analyze, FilterSpec, ToneGenerator};
//!
//! let tone = ToneGenerator::new(1.0, 5.0, 1.0, 1000.0).generate()?;
//! let coeffs = design(&FilterSpec::lowpass(4, 10.0), tone.sample_rate())?;
//! let filtered = filtfilt(&coeffs, &tone)?;
//! let spectrum = analyze(&filtered)?;
//! assert_eq!(spectrum.len(), 501);
//! # Ok::<(), zerophase_dsp::DspError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

// Must be declared first so the logging macros are visible to every module.
mod fmt;

pub mod complex;
pub mod config;
pub mod error;
pub mod filter;
pub mod filter_design;
pub mod filtfilt;
pub mod noise;
pub mod noise_reduction;
pub mod oscillator;
pub mod pipeline;
pub mod spectrum;
pub mod types;

// Re-export commonly used types
pub use complex::Complex;
pub use config::FilterConfig;
pub use error::{DspError, DspResult};
pub use filter::{lfilter, steady_state, IirFilter};
pub use filter_design::{design, design_zpk, FilterCoefficients, FilterSpec, FilterType, ZeroPoleGain};
pub use filtfilt::{filtfilt, min_signal_len};
pub use noise::{inject_noise, NoiseInjector};
pub use noise_reduction::{apply_gain, median_filter, remove_dc_offset};
pub use oscillator::ToneGenerator;
pub use pipeline::{process, run_synthetic, PipelineOutput, SyntheticRun};
pub use spectrum::{analyze, analyze_samples, Spectrum, SpectrumBin};
pub use types::SignalBuffer;
