//! Spectrum analysis.
//!
//! Computes the discrete Fourier transform of a whole buffer and reduces it
//! to a one-sided magnitude spectrum for display.
//!
//! Power-of-two lengths use an in-place radix-2 Cooley-Tukey FFT; any other
//! length is rewritten as a convolution (Bluestein's chirp-z algorithm) and
//! evaluated with power-of-two FFTs, so every length is O(N log N).

use core::f64::consts::PI;

use crate::complex::Complex;
use crate::config::MIN_DB;
use crate::error::DspResult;
use crate::types::{check_sample_rate, check_samples, SignalBuffer};

/// Single spectrum bin.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpectrumBin {
    /// Bin centre frequency in Hz
    pub frequency_hz: f64,
    /// Absolute value of the DFT coefficient
    pub magnitude: f64,
}

impl SpectrumBin {
    /// Magnitude in dB, floored at -120 dB.
    #[must_use]
    pub fn magnitude_db(&self) -> f64 {
        if self.magnitude > 0.0 {
            (20.0 * self.magnitude.log10()).max(MIN_DB)
        } else {
            MIN_DB
        }
    }
}

/// One-sided magnitude spectrum of a real signal.
///
/// Holds bins `0..=N/2` of an `N`-point DFT; bin `k` sits at
/// `k · sample_rate / N`. The other half of the DFT of a real signal is the
/// complex conjugate mirror of this one and is not kept.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Spectrum {
    bins: Vec<SpectrumBin>,
    sample_rate: f64,
    fft_len: usize,
}

impl Spectrum {
    /// Bins from DC to the Nyquist frequency.
    #[must_use]
    pub fn bins(&self) -> &[SpectrumBin] {
        &self.bins
    }

    /// Number of bins (`N/2 + 1`).
    #[must_use]
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Always `false`; a spectrum has at least the DC bin.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Length of the analyzed signal.
    #[must_use]
    pub fn fft_len(&self) -> usize {
        self.fft_len
    }

    /// Sample rate of the analyzed signal in Hz.
    #[must_use]
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Frequency resolution (Hz per bin).
    #[must_use]
    pub fn bin_width(&self) -> f64 {
        self.sample_rate / self.fft_len as f64
    }

    /// Iterate over the bins.
    pub fn iter(&self) -> core::slice::Iter<'_, SpectrumBin> {
        self.bins.iter()
    }

    /// `(frequency, magnitude)` pairs for a plotting or export layer.
    pub fn pairs(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bins.iter().map(|b| (b.frequency_hz, b.magnitude))
    }

    /// Bin closest to `freq` Hz (clamped to the available range).
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn bin_at(&self, freq: f64) -> SpectrumBin {
        let index = (freq / self.bin_width()).round().max(0.0) as usize;
        self.bins[index.min(self.bins.len() - 1)]
    }

    /// Magnitude of the bin closest to `freq` Hz.
    #[must_use]
    pub fn magnitude_at(&self, freq: f64) -> f64 {
        self.bin_at(freq).magnitude
    }

    /// Bin with the largest magnitude.
    #[must_use]
    pub fn peak(&self) -> Option<SpectrumBin> {
        self.bins
            .iter()
            .copied()
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
    }
}

impl<'a> IntoIterator for &'a Spectrum {
    type Item = &'a SpectrumBin;
    type IntoIter = core::slice::Iter<'a, SpectrumBin>;

    fn into_iter(self) -> Self::IntoIter {
        self.bins.iter()
    }
}

/// One-sided magnitude spectrum of a buffer.
///
/// # Errors
/// None in practice: a [`SignalBuffer`] is never empty. The `Result` keeps
/// the signature aligned with [`analyze_samples`].
pub fn analyze(buffer: &SignalBuffer) -> DspResult<Spectrum> {
    Ok(one_sided(buffer.samples(), buffer.sample_rate()))
}

/// One-sided magnitude spectrum of raw samples.
///
/// # Errors
/// * [`DspError::EmptySignal`](crate::DspError::EmptySignal) - no samples
/// * [`DspError::NonFiniteSample`](crate::DspError::NonFiniteSample) - NaN or infinity
/// * [`DspError::InvalidSampleRate`](crate::DspError::InvalidSampleRate) - bad rate
pub fn analyze_samples(samples: &[f64], sample_rate: f64) -> DspResult<Spectrum> {
    check_sample_rate(sample_rate)?;
    check_samples(samples)?;
    Ok(one_sided(samples, sample_rate))
}

fn one_sided(samples: &[f64], sample_rate: f64) -> Spectrum {
    let n = samples.len();
    let coeffs = dft(samples);
    let bin_width = sample_rate / n as f64;

    let bins = coeffs
        .iter()
        .take(n / 2 + 1)
        .enumerate()
        .map(|(k, c)| SpectrumBin {
            frequency_hz: k as f64 * bin_width,
            magnitude: c.magnitude(),
        })
        .collect();

    trace!("analyzed {} samples into {} bins", n, n / 2 + 1);
    Spectrum {
        bins,
        sample_rate,
        fft_len: n,
    }
}

/// Full DFT of a real sequence, any length.
#[must_use]
pub fn dft(samples: &[f64]) -> Vec<Complex> {
    let mut data: Vec<Complex> = samples.iter().map(|&s| Complex::from_real(s)).collect();
    if data.len().is_power_of_two() {
        fft_in_place(&mut data);
        data
    } else {
        bluestein(&data)
    }
}

/// In-place radix-2 DIT FFT. `data.len()` must be a power of two.
fn fft_in_place(data: &mut [Complex]) {
    let n = data.len();
    if n <= 1 {
        return;
    }

    // Bit-reverse permutation
    let mut j = 0;
    for i in 0..n - 1 {
        if i < j {
            data.swap(i, j);
        }
        let mut k = n / 2;
        while k <= j {
            j -= k;
            k /= 2;
        }
        j += k;
    }

    // Cooley-Tukey butterflies
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        let angle_step = -2.0 * PI / len as f64;

        for start in (0..n).step_by(len) {
            for m in 0..half {
                // Twiddle from the index, not an accumulated angle
                let w = Complex::cis(angle_step * m as f64);
                let u = data[start + m];
                let t = w * data[start + m + half];
                data[start + m] = u + t;
                data[start + m + half] = u - t;
            }
        }
        len *= 2;
    }
}

/// Inverse of [`fft_in_place`], including the `1/N` scaling.
fn ifft_in_place(data: &mut [Complex]) {
    for c in data.iter_mut() {
        *c = c.conjugate();
    }
    fft_in_place(data);
    let scale = 1.0 / data.len() as f64;
    for c in data.iter_mut() {
        *c = c.conjugate().scale(scale);
    }
}

/// Arbitrary-length DFT via Bluestein's chirp-z algorithm.
///
/// `X[k] = w[k] · Σ (x[n]·w[n]) · conj(w[k-n])` with `w[n] = e^(-jπn²/N)`;
/// the sum is a linear convolution evaluated with zero-padded power-of-two
/// FFTs of length `M >= 2N - 1`.
fn bluestein(input: &[Complex]) -> Vec<Complex> {
    let n = input.len();
    let m = (2 * n - 1).next_power_of_two();

    // n² mod 2n keeps the chirp angle small for long signals
    let chirp: Vec<Complex> = (0..n)
        .map(|k| {
            let k2 = ((k as u128 * k as u128) % (2 * n as u128)) as f64;
            Complex::cis(-PI * k2 / n as f64)
        })
        .collect();

    let mut a = vec![Complex::ZERO; m];
    for (slot, (&x, &w)) in a.iter_mut().zip(input.iter().zip(&chirp)) {
        *slot = x * w;
    }

    let mut b = vec![Complex::ZERO; m];
    b[0] = chirp[0].conjugate();
    for k in 1..n {
        let w = chirp[k].conjugate();
        b[k] = w;
        b[m - k] = w;
    }

    fft_in_place(&mut a);
    fft_in_place(&mut b);
    for (x, y) in a.iter_mut().zip(&b) {
        *x = *x * *y;
    }
    ifft_in_place(&mut a);

    a.iter().zip(&chirp).take(n).map(|(&c, &w)| c * w).collect()
}
