//! Additive Gaussian noise.
//!
//! Zero-mean normal samples are drawn with the Box-Muller transform from the
//! uniform output of any [`rand::Rng`]. Seed the generator to make a run
//! reproducible; [`NoiseInjector`] bundles a seeded `ChaCha8Rng` whose stream
//! is identical on every platform.

use core::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::error::{DspError, DspResult};
use crate::types::SignalBuffer;

fn check_std_dev(std_dev: f64) -> DspResult<()> {
    if std_dev.is_finite() && std_dev >= 0.0 {
        Ok(())
    } else {
        warn!("rejecting noise standard deviation {}", std_dev);
        Err(DspError::invalid(
            "noise standard deviation must be finite and non-negative",
        ))
    }
}

/// One standard normal sample.
fn standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    // u1 in (0, 1] keeps ln() finite
    let u1 = 1.0 - rng.random::<f64>();
    let u2 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos()
}

/// Add independent `N(0, std_dev²)` noise to every sample.
///
/// Returns a new buffer; `buffer` is unchanged. `std_dev == 0` returns an
/// exact copy but still advances `rng`.
///
/// # Errors
/// [`DspError::InvalidSpecification`] if `std_dev` is negative or not finite.
pub fn inject_noise<R>(buffer: &SignalBuffer, std_dev: f64, rng: &mut R) -> DspResult<SignalBuffer>
where
    R: Rng + ?Sized,
{
    check_std_dev(std_dev)?;
    trace!("injecting noise, std dev {}, {} samples", std_dev, buffer.len());
    buffer.map(|s| s + std_dev * standard_normal(rng))
}

/// Reproducible noise source.
#[derive(Clone, Debug)]
pub struct NoiseInjector {
    std_dev: f64,
    rng: ChaCha8Rng,
}

impl NoiseInjector {
    /// Noise source with standard deviation `std_dev` seeded from `seed`.
    ///
    /// # Errors
    /// [`DspError::InvalidSpecification`] if `std_dev` is negative or not
    /// finite.
    pub fn from_seed(std_dev: f64, seed: u64) -> DspResult<Self> {
        check_std_dev(std_dev)?;
        Ok(Self {
            std_dev,
            rng: ChaCha8Rng::seed_from_u64(seed),
        })
    }

    /// Standard deviation of the injected noise.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Noisy copy of `buffer`. Successive calls continue the same stream.
    ///
    /// # Errors
    /// Propagates [`inject_noise`] errors.
    pub fn inject(&mut self, buffer: &SignalBuffer) -> DspResult<SignalBuffer> {
        inject_noise(buffer, self.std_dev, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silence(len: usize) -> SignalBuffer {
        SignalBuffer::zeros(len, 1000.0).unwrap()
    }

    #[test]
    fn test_same_seed_same_noise() {
        let mut a = NoiseInjector::from_seed(0.5, 7).unwrap();
        let mut b = NoiseInjector::from_seed(0.5, 7).unwrap();
        let input = silence(256);
        assert_eq!(a.inject(&input).unwrap(), b.inject(&input).unwrap());
    }

    #[test]
    fn test_different_seeds_differ() {
        let mut a = NoiseInjector::from_seed(0.5, 1).unwrap();
        let mut b = NoiseInjector::from_seed(0.5, 2).unwrap();
        let input = silence(64);
        assert_ne!(a.inject(&input).unwrap(), b.inject(&input).unwrap());
    }

    #[test]
    fn test_statistics() {
        let mut injector = NoiseInjector::from_seed(0.5, 42).unwrap();
        let noisy = injector.inject(&silence(20_000)).unwrap();
        let n = noisy.len() as f64;
        let mean = noisy.samples().iter().sum::<f64>() / n;
        let var = noisy.samples().iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        // Standard error of the mean is 0.5/sqrt(20000) ≈ 0.0035
        assert!(mean.abs() < 0.02, "mean {mean}");
        assert!((var.sqrt() - 0.5).abs() < 0.02, "std {}", var.sqrt());
    }

    #[test]
    fn test_zero_std_dev_is_identity() {
        let input = SignalBuffer::new(vec![1.0, -2.0, 3.5], 48.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let out = inject_noise(&input, 0.0, &mut rng).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_rejects_bad_std_dev() {
        assert!(NoiseInjector::from_seed(-0.1, 0).is_err());
        assert!(NoiseInjector::from_seed(f64::INFINITY, 0).is_err());
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(inject_noise(&silence(4), f64::NAN, &mut rng).is_err());
    }

    #[test]
    fn test_input_untouched() {
        let input = SignalBuffer::new(vec![0.25; 16], 100.0).unwrap();
        let mut injector = NoiseInjector::from_seed(1.0, 9).unwrap();
        let _ = injector.inject(&input).unwrap();
        assert!(input.samples().iter().all(|&s| s == 0.25));
    }
}
