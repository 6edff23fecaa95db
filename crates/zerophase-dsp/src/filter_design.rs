//! Filter Design Module
//!
//! Derives IIR coefficients from a cutoff specification. Design happens once
//! per (specification, sample rate) pair, before any signal is touched.
//!
//! # Method
//!
//! 1. Butterworth analog prototype: `order` poles evenly spaced on the left
//!    half of the unit circle, no zeros, unity gain.
//! 2. Frequency pre-warping: `ωa = 2·fs·tan(π·fc/fs)`, so the digital filter
//!    is exactly -3 dB at the requested cutoff.
//! 3. Prototype mapping: `s → s/ωa` (low-pass) or `s → ωa/s` (high-pass).
//! 4. Bilinear transform `s = 2·fs·(z-1)/(z+1)` of every pole and zero.
//! 5. Expansion of the factored polynomials into `b` / `a` with `a[0] = 1`.

use core::f64::consts::{FRAC_PI_2, PI};

use heapless::Vec as FixedVec;

use crate::complex::Complex;
use crate::config::{MAX_COEFFS, MAX_ORDER, MIN_DB, ORDER_LIMIT_REASON};
use crate::error::{DspError, DspResult};
use crate::types::check_sample_rate;

/// Response shape
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterType {
    /// Pass below the cutoff
    #[default]
    Lowpass,
    /// Pass above the cutoff
    Highpass,
}

/// Butterworth filter specification
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FilterSpec {
    /// Filter order (1 to [`MAX_ORDER`])
    pub order: usize,
    /// -3 dB frequency in Hz
    pub cutoff_hz: f64,
    /// Low-pass or high-pass
    pub filter_type: FilterType,
}

impl FilterSpec {
    /// Low-pass specification.
    #[must_use]
    pub const fn lowpass(order: usize, cutoff_hz: f64) -> Self {
        Self {
            order,
            cutoff_hz,
            filter_type: FilterType::Lowpass,
        }
    }

    /// High-pass specification.
    #[must_use]
    pub const fn highpass(order: usize, cutoff_hz: f64) -> Self {
        Self {
            order,
            cutoff_hz,
            filter_type: FilterType::Highpass,
        }
    }

    /// Check the specification against a sample rate.
    ///
    /// # Errors
    /// * [`DspError::InvalidSampleRate`] - rate not finite and positive
    /// * [`DspError::InvalidSpecification`] - order outside `1..=MAX_ORDER`,
    ///   or cutoff not in `(0, sample_rate / 2)`
    pub fn validate(&self, sample_rate: f64) -> DspResult<()> {
        check_sample_rate(sample_rate)?;
        let result = if !(1..=MAX_ORDER).contains(&self.order) {
            Err(DspError::invalid(ORDER_LIMIT_REASON))
        } else if !(self.cutoff_hz.is_finite() && self.cutoff_hz > 0.0) {
            Err(DspError::invalid("cutoff must be a positive frequency"))
        } else if self.cutoff_hz >= sample_rate / 2.0 {
            Err(DspError::invalid("cutoff must be below the Nyquist frequency"))
        } else {
            Ok(())
        };
        if result.is_err() {
            warn!(
                "rejecting order {} cutoff {} Hz at {} Hz",
                self.order,
                self.cutoff_hz,
                sample_rate
            );
        }
        result
    }
}

/// Digital filter in factored form.
///
/// `H(z) = gain · Π(z - zeros) / Π(z - poles)`
#[derive(Clone, Debug, PartialEq)]
pub struct ZeroPoleGain {
    zeros: FixedVec<Complex, MAX_ORDER>,
    poles: FixedVec<Complex, MAX_ORDER>,
    gain: f64,
}

impl ZeroPoleGain {
    /// Zeros of the transfer function
    #[must_use]
    pub fn zeros(&self) -> &[Complex] {
        &self.zeros
    }

    /// Poles of the transfer function
    #[must_use]
    pub fn poles(&self) -> &[Complex] {
        &self.poles
    }

    /// Overall gain
    #[must_use]
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Expand into transfer-function coefficients.
    ///
    /// Poles and zeros of a real filter come in conjugate pairs, so the
    /// expanded polynomials are real and only the real parts are kept.
    ///
    /// # Errors
    /// [`DspError::InvalidSpecification`] if the factors exceed the
    /// coefficient capacity.
    pub fn to_coefficients(&self) -> DspResult<FilterCoefficients> {
        let b = poly(&self.zeros)?;
        let a = poly(&self.poles)?;

        let mut coeffs = FilterCoefficients {
            b: FixedVec::new(),
            a: FixedVec::new(),
        };
        for z in &b {
            push(&mut coeffs.b, z.re * self.gain)?;
        }
        for p in &a {
            push(&mut coeffs.a, p.re)?;
        }
        Ok(coeffs)
    }
}

/// Transfer-function coefficients of an IIR filter.
///
/// ```text
/// y[n] = Σ b[i]·x[n-i] - Σ_{i≥1} a[i]·y[n-i]
/// ```
///
/// `a[0]` is always 1. Both polynomials hold at most [`MAX_COEFFS`] terms.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterCoefficients {
    b: FixedVec<f64, MAX_COEFFS>,
    a: FixedVec<f64, MAX_COEFFS>,
}

impl FilterCoefficients {
    /// Pass-through filter.
    #[must_use]
    pub fn unity() -> Self {
        // Fits: MAX_COEFFS >= 2 is asserted in config
        Self {
            b: core::iter::once(1.0).collect(),
            a: core::iter::once(1.0).collect(),
        }
    }

    /// Build from caller-supplied polynomials, normalizing so `a[0] = 1`.
    ///
    /// # Arguments
    /// * `b` - Feedforward (numerator) coefficients
    /// * `a` - Feedback (denominator) coefficients
    ///
    /// # Errors
    /// [`DspError::InvalidSpecification`] when either polynomial is empty or
    /// longer than [`MAX_COEFFS`], contains non-finite values, or `a[0]` is 0.
    pub fn new(b: &[f64], a: &[f64]) -> DspResult<Self> {
        if b.is_empty() || a.is_empty() {
            return Err(DspError::invalid("coefficient polynomials must not be empty"));
        }
        if b.len() > MAX_COEFFS || a.len() > MAX_COEFFS {
            return Err(DspError::invalid("too many coefficients"));
        }
        if b.iter().chain(a).any(|c| !c.is_finite()) {
            return Err(DspError::invalid("coefficients must be finite"));
        }
        let a0 = a[0];
        if a0 == 0.0 {
            return Err(DspError::invalid("leading feedback coefficient must be non-zero"));
        }

        let mut coeffs = Self {
            b: FixedVec::new(),
            a: FixedVec::new(),
        };
        for &c in b {
            push(&mut coeffs.b, c / a0)?;
        }
        for &c in a {
            push(&mut coeffs.a, c / a0)?;
        }
        Ok(coeffs)
    }

    /// Feedforward coefficients `b`
    #[must_use]
    pub fn feedforward(&self) -> &[f64] {
        &self.b
    }

    /// Feedback coefficients `a` (`a[0] = 1`)
    #[must_use]
    pub fn feedback(&self) -> &[f64] {
        &self.a
    }

    /// Number of taps of the longer polynomial.
    #[must_use]
    pub fn len(&self) -> usize {
        self.b.len().max(self.a.len())
    }

    /// Always `false`; both polynomials hold at least one term.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Filter order (number of delay elements).
    #[must_use]
    pub fn order(&self) -> usize {
        self.len() - 1
    }

    /// Whether every root of the feedback polynomial lies strictly inside the
    /// unit circle.
    ///
    /// Uses the Schur–Cohn step-down recursion: the polynomial is reduced one
    /// degree at a time and is stable iff every reflection coefficient has
    /// magnitude below 1.
    #[must_use]
    pub fn is_stable(&self) -> bool {
        let mut poly: Vec<f64> = self.a.to_vec();
        while poly.len() > 1 {
            let m = poly.len() - 1;
            let k = poly[m] / poly[0];
            if k.is_nan() || k.abs() >= 1.0 {
                return false;
            }
            let denom = 1.0 - k * k;
            poly = (0..m).map(|i| (poly[i] - k * poly[m - i]) / denom).collect();
        }
        true
    }

    /// Complex frequency response `H(e^jω)` at `freq` Hz.
    #[must_use]
    pub fn frequency_response(&self, freq: f64, fs: f64) -> Complex {
        let omega = 2.0 * PI * freq / fs;
        let eval = |coeffs: &[f64]| {
            coeffs
                .iter()
                .enumerate()
                .fold(Complex::ZERO, |acc, (k, &c)| acc + Complex::cis(-omega * k as f64) * c)
        };
        eval(&self.b) / eval(&self.a)
    }

    /// Magnitude response at `freq` Hz.
    #[must_use]
    pub fn magnitude_at(&self, freq: f64, fs: f64) -> f64 {
        self.frequency_response(freq, fs).magnitude()
    }

    /// Magnitude response in dB at `freq` Hz.
    #[must_use]
    pub fn magnitude_db_at(&self, freq: f64, fs: f64) -> f64 {
        let mag = self.magnitude_at(freq, fs);
        if mag > 0.0 {
            (20.0 * mag.log10()).max(MIN_DB)
        } else {
            MIN_DB
        }
    }

    /// Magnitude response of forward-backward filtering at `freq` Hz.
    ///
    /// The two passes multiply `H(e^jω)` by its conjugate, so this is the
    /// square of [`magnitude_at`](Self::magnitude_at).
    #[must_use]
    pub fn zero_phase_magnitude_at(&self, freq: f64, fs: f64) -> f64 {
        self.frequency_response(freq, fs).magnitude_squared()
    }
}

impl Default for FilterCoefficients {
    fn default() -> Self {
        Self::unity()
    }
}

/// Design a Butterworth filter in factored (zero-pole-gain) form.
///
/// # Errors
/// See [`FilterSpec::validate`].
pub fn design_zpk(spec: &FilterSpec, sample_rate: f64) -> DspResult<ZeroPoleGain> {
    spec.validate(sample_rate)?;

    let order = spec.order;
    let fs2 = 2.0 * sample_rate;
    let warped = fs2 * (PI * spec.cutoff_hz / sample_rate).tan();

    // Analog prototype: left half of the unit circle
    let mut prototype: FixedVec<Complex, MAX_ORDER> = FixedVec::new();
    for k in 0..order {
        let angle = FRAC_PI_2 + (2 * k + 1) as f64 * PI / (2 * order) as f64;
        push(&mut prototype, Complex::cis(angle))?;
    }

    let mut zeros: FixedVec<Complex, MAX_ORDER> = FixedVec::new();
    let mut poles: FixedVec<Complex, MAX_ORDER> = FixedVec::new();
    let gain = match spec.filter_type {
        FilterType::Lowpass => {
            for &p in &prototype {
                push(&mut poles, p * warped)?;
            }
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let exponent = order as i32;
            warped.powi(exponent)
        }
        FilterType::Highpass => {
            for &p in &prototype {
                push(&mut zeros, Complex::ZERO)?;
                push(&mut poles, Complex::from_real(warped) / p)?;
            }
            // Prototype has no zeros, so Π(-z) is 1
            let denom: Complex = prototype.iter().map(|&p| -p).product();
            denom.recip().re
        }
    };

    // Bilinear transform; zeros at analog infinity land on z = -1
    let bilinear = |s: Complex| (Complex::from_real(fs2) + s) / (Complex::from_real(fs2) - s);
    let num: Complex = zeros.iter().map(|&z| Complex::from_real(fs2) - z).product();
    let den: Complex = poles.iter().map(|&p| Complex::from_real(fs2) - p).product();

    let mut zpk = ZeroPoleGain {
        zeros: FixedVec::new(),
        poles: FixedVec::new(),
        gain: gain * (num / den).re,
    };
    for &z in &zeros {
        push(&mut zpk.zeros, bilinear(z))?;
    }
    for _ in zeros.len()..poles.len() {
        push(&mut zpk.zeros, Complex::from_real(-1.0))?;
    }
    for &p in &poles {
        push(&mut zpk.poles, bilinear(p))?;
    }

    debug!(
        "designed order {} butterworth at {} Hz (fs {} Hz), gain {}",
        order,
        spec.cutoff_hz,
        sample_rate,
        zpk.gain
    );
    Ok(zpk)
}

/// Design a Butterworth filter and return its transfer-function coefficients.
///
/// # Arguments
/// * `spec` - Order, cutoff and response type
/// * `sample_rate` - Sample rate in Hz
///
/// The factored poles are always inside the unit circle, but expanding them
/// into `b`/`a` polynomials loses precision as they crowd together. High
/// orders with a cutoff very close to 0 Hz or to `sample_rate / 2` produce
/// coefficients whose own roots leave the unit circle; those are rejected
/// rather than returned.
///
/// # Errors
/// * [`DspError::InvalidSpecification`] - cutoff non-positive or at or above
///   `sample_rate / 2`, order outside `1..=MAX_ORDER`, or expanded
///   coefficients that fail [`FilterCoefficients::is_stable`]
/// * [`DspError::InvalidSampleRate`] - bad rate
pub fn design(spec: &FilterSpec, sample_rate: f64) -> DspResult<FilterCoefficients> {
    let coeffs = design_zpk(spec, sample_rate)?.to_coefficients()?;
    if !coeffs.is_stable() {
        warn!(
            "order {} at {} Hz (fs {} Hz) expands to unstable coefficients",
            spec.order,
            spec.cutoff_hz,
            sample_rate
        );
        return Err(DspError::invalid(
            "order too high for this cutoff: expanded coefficients are unstable",
        ));
    }
    Ok(coeffs)
}

/// Expand `Π(z - r)` into polynomial coefficients, highest power first.
fn poly(roots: &[Complex]) -> DspResult<FixedVec<Complex, MAX_COEFFS>> {
    let mut coeffs: FixedVec<Complex, MAX_COEFFS> = FixedVec::new();
    push(&mut coeffs, Complex::ONE)?;
    for &r in roots {
        push(&mut coeffs, Complex::ZERO)?;
        for i in (1..coeffs.len()).rev() {
            coeffs[i] = coeffs[i] - r * coeffs[i - 1];
        }
    }
    Ok(coeffs)
}

fn push<T, const N: usize>(vec: &mut FixedVec<T, N>, value: T) -> DspResult<()> {
    vec.push(value)
        .map_err(|_| DspError::invalid(ORDER_LIMIT_REASON))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f64 = 1000.0;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn first_order_quarter_rate() {
        // tan(π/4) = 1: pole lands on the origin, gain is exactly 1/2
        let coeffs = design(&FilterSpec::lowpass(1, 250.0), SAMPLE_RATE).unwrap();
        let b = coeffs.feedforward();
        let a = coeffs.feedback();
        assert!(approx_eq(b[0], 0.5, 1e-12) && approx_eq(b[1], 0.5, 1e-12), "b = {b:?}");
        assert!(approx_eq(a[0], 1.0, 1e-12) && approx_eq(a[1], 0.0, 1e-12), "a = {a:?}");
    }

    #[test]
    fn second_order_quarter_rate() {
        let coeffs = design(&FilterSpec::lowpass(2, 250.0), SAMPLE_RATE).unwrap();
        let expected_b = [0.292_893_218_8, 0.585_786_437_6, 0.292_893_218_8];
        let expected_a = [1.0, 0.0, 0.171_572_875_3];
        for (got, want) in coeffs.feedforward().iter().zip(expected_b) {
            assert!(approx_eq(*got, want, 1e-9), "b: {got} vs {want}");
        }
        for (got, want) in coeffs.feedback().iter().zip(expected_a) {
            assert!(approx_eq(*got, want, 1e-9), "a: {got} vs {want}");
        }
    }

    #[test]
    fn lowpass_numerator_is_binomial() {
        let coeffs = design(&FilterSpec::lowpass(4, 10.0), SAMPLE_RATE).unwrap();
        let b = coeffs.feedforward();
        assert_eq!(b.len(), 5);
        assert_eq!(coeffs.feedback().len(), 5);
        let binomial = [1.0, 4.0, 6.0, 4.0, 1.0];
        for (c, m) in b.iter().zip(binomial) {
            assert!(approx_eq(c / b[0], m, 1e-9));
        }
    }

    #[test]
    fn lowpass_response() {
        let fc = 10.0;
        let coeffs = design(&FilterSpec::lowpass(4, fc), SAMPLE_RATE).unwrap();

        let mag_dc = coeffs.magnitude_at(0.0, SAMPLE_RATE);
        assert!(approx_eq(mag_dc, 1.0, 1e-6), "DC magnitude: {mag_dc}");

        let mag_fc = coeffs.magnitude_at(fc, SAMPLE_RATE);
        assert!(
            approx_eq(mag_fc, core::f64::consts::FRAC_1_SQRT_2, 1e-6),
            "Cutoff magnitude: {mag_fc}"
        );

        let mag_high = coeffs.magnitude_at(fc * 10.0, SAMPLE_RATE);
        assert!(mag_high < 1e-3, "High freq magnitude: {mag_high}");
    }

    #[test]
    fn highpass_response() {
        let fc = 100.0;
        let coeffs = design(&FilterSpec::highpass(3, fc), SAMPLE_RATE).unwrap();

        let mag_dc = coeffs.magnitude_at(0.0, SAMPLE_RATE);
        assert!(mag_dc < 1e-9, "DC magnitude: {mag_dc}");

        let mag_fc = coeffs.magnitude_at(fc, SAMPLE_RATE);
        assert!(
            approx_eq(mag_fc, core::f64::consts::FRAC_1_SQRT_2, 1e-9),
            "Cutoff magnitude: {mag_fc}"
        );

        let mag_nyquist = coeffs.magnitude_at(SAMPLE_RATE / 2.0, SAMPLE_RATE);
        assert!(approx_eq(mag_nyquist, 1.0, 1e-9), "Nyquist magnitude: {mag_nyquist}");
    }

    #[test]
    fn zero_phase_response_is_squared() {
        let coeffs = design(&FilterSpec::lowpass(4, 50.0), SAMPLE_RATE).unwrap();
        for freq in [5.0, 50.0, 80.0] {
            let single = coeffs.magnitude_at(freq, SAMPLE_RATE);
            let double = coeffs.zero_phase_magnitude_at(freq, SAMPLE_RATE);
            assert!(approx_eq(double, single * single, 1e-12));
        }
        assert!(approx_eq(coeffs.zero_phase_magnitude_at(50.0, SAMPLE_RATE), 0.5, 1e-9));
    }

    #[test]
    fn magnitude_db_at_cutoff() {
        let coeffs = design(&FilterSpec::lowpass(2, 100.0), SAMPLE_RATE).unwrap();
        let db = coeffs.magnitude_db_at(100.0, SAMPLE_RATE);
        assert!(approx_eq(db, -3.0103, 1e-3), "Cutoff dB: {db}");
    }

    #[test]
    fn designed_poles_inside_unit_circle() {
        let zpk = design_zpk(&FilterSpec::lowpass(6, 40.0), SAMPLE_RATE).unwrap();
        assert_eq!(zpk.poles().len(), 6);
        assert_eq!(zpk.zeros().len(), 6);
        for p in zpk.poles() {
            assert!(p.magnitude() < 1.0, "pole {p:?}");
        }
        for z in zpk.zeros() {
            assert!(approx_eq(z.re, -1.0, 1e-12));
        }
    }

    #[test]
    fn highpass_zeros_at_dc() {
        let zpk = design_zpk(&FilterSpec::highpass(2, 40.0), SAMPLE_RATE).unwrap();
        for z in zpk.zeros() {
            assert!(approx_eq(z.re, 1.0, 1e-12) && z.im.abs() < 1e-12);
        }
    }

    #[test]
    fn stability_check_detects_unstable_polynomial() {
        // Pole at z = 1.25
        let unstable = FilterCoefficients::new(&[1.0], &[1.0, -1.25]).unwrap();
        assert!(!unstable.is_stable());
        // Poles at ±0.5j
        let stable = FilterCoefficients::new(&[1.0], &[1.0, 0.0, 0.25]).unwrap();
        assert!(stable.is_stable());
        // Pole on the unit circle
        let marginal = FilterCoefficients::new(&[1.0], &[1.0, -1.0]).unwrap();
        assert!(!marginal.is_stable());
    }

    #[test]
    fn new_normalizes_leading_coefficient() {
        let coeffs = FilterCoefficients::new(&[2.0, 2.0], &[4.0, -2.0]).unwrap();
        assert_eq!(coeffs.feedforward(), &[0.5, 0.5]);
        assert_eq!(coeffs.feedback(), &[1.0, -0.5]);
        assert_eq!(coeffs.order(), 1);
    }

    #[test]
    fn new_rejects_bad_input() {
        assert!(FilterCoefficients::new(&[], &[1.0]).is_err());
        assert!(FilterCoefficients::new(&[1.0], &[0.0, 1.0]).is_err());
        assert!(FilterCoefficients::new(&[f64::NAN], &[1.0]).is_err());
        assert!(FilterCoefficients::new(&[1.0; MAX_COEFFS + 1], &[1.0]).is_err());
    }

    #[test]
    fn unity_is_identity() {
        let coeffs = FilterCoefficients::unity();
        assert_eq!(coeffs.feedforward(), &[1.0]);
        assert_eq!(coeffs.feedback(), &[1.0]);
        assert_eq!(coeffs.order(), 0);
        assert!(coeffs.is_stable());
    }

    #[test]
    fn rejects_unstable_expansion() {
        // Poles are fine in factored form but the expanded a-polynomial is not
        for spec in [
            FilterSpec::lowpass(8, 2.0),
            FilterSpec::lowpass(12, 10.0),
            FilterSpec::highpass(8, 2.0),
            FilterSpec::lowpass(8, 498.0),
        ] {
            let zpk = design_zpk(&spec, SAMPLE_RATE).unwrap();
            assert!(zpk.poles().iter().all(|p| p.magnitude() < 1.0));
            assert!(!zpk.to_coefficients().unwrap().is_stable(), "{spec:?}");
            assert!(
                matches!(design(&spec, SAMPLE_RATE), Err(DspError::InvalidSpecification { .. })),
                "{spec:?} should be rejected"
            );
        }
        // Same orders with a moderate cutoff still design
        assert!(design(&FilterSpec::lowpass(8, 20.0), SAMPLE_RATE).unwrap().is_stable());
        assert!(design(&FilterSpec::lowpass(12, 200.0), SAMPLE_RATE).unwrap().is_stable());
    }

    #[test]
    fn order_error_names_limit() {
        let err = design(&FilterSpec::lowpass(MAX_ORDER + 1, 10.0), SAMPLE_RATE).unwrap_err();
        assert!(err.to_string().contains(&MAX_ORDER.to_string()), "{err}");
    }

    #[test]
    fn rejects_invalid_specs() {
        for spec in [
            FilterSpec::lowpass(0, 10.0),
            FilterSpec::lowpass(MAX_ORDER + 1, 10.0),
            FilterSpec::lowpass(4, 0.0),
            FilterSpec::lowpass(4, -1.0),
            FilterSpec::lowpass(4, f64::NAN),
            FilterSpec::lowpass(4, 500.0),
            FilterSpec::highpass(4, 600.0),
        ] {
            assert!(
                matches!(design(&spec, SAMPLE_RATE), Err(DspError::InvalidSpecification { .. })),
                "{spec:?} should be rejected"
            );
        }
    }
}
