//! Bounded additive noise for the synthesizers.
//!
//! The base shapes are deterministic; all randomness is drawn from a [`Noise`]
//! handed in by the caller. `Noise::none()` disables it entirely so tests can
//! assert exact values.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Largest amplitude the synthesizers accept.
pub const MAX_NOISE_AMPLITUDE: f64 = 0.02;

/// Source of uniform noise in `[-amplitude, amplitude]`.
#[derive(Debug, Clone)]
pub struct Noise {
    amplitude: f64,
    rng: Option<StdRng>,
}

impl Noise {
    /// No noise: every sample is exactly zero.
    pub fn none() -> Self {
        Self {
            amplitude: 0.0,
            rng: None,
        }
    }

    /// Reproducible noise from a fixed seed.
    pub fn seeded(seed: u64, amplitude: f64) -> Self {
        Self {
            amplitude: clamp_amplitude(amplitude),
            rng: Some(StdRng::seed_from_u64(seed)),
        }
    }

    /// Non-reproducible noise seeded from the OS.
    pub fn entropy(amplitude: f64) -> Self {
        Self {
            amplitude: clamp_amplitude(amplitude),
            rng: Some(StdRng::from_entropy()),
        }
    }

    /// Builds noise from optional configuration values.
    pub fn from_settings(seed: Option<u64>, amplitude: f64) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed, amplitude),
            None => Self::entropy(amplitude),
        }
    }

    pub fn amplitude(&self) -> f64 {
        self.amplitude
    }

    pub fn is_silent(&self) -> bool {
        self.rng.is_none() || self.amplitude == 0.0
    }

    /// Draws one sample.
    pub fn sample(&mut self) -> f64 {
        let amplitude = self.amplitude;
        match self.rng.as_mut() {
            Some(rng) if amplitude > 0.0 => rng.gen_range(-amplitude..=amplitude),
            _ => 0.0,
        }
    }
}

impl Default for Noise {
    fn default() -> Self {
        Self::none()
    }
}

fn clamp_amplitude(amplitude: f64) -> f64 {
    if amplitude.is_finite() {
        amplitude.abs().min(MAX_NOISE_AMPLITUDE)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_is_silent() {
        let mut noise = Noise::none();
        assert!(noise.is_silent());
        for _ in 0..10 {
            assert_eq!(noise.sample(), 0.0);
        }
    }

    #[test]
    fn test_amplitude_is_capped() {
        assert_eq!(Noise::seeded(1, 0.5).amplitude(), MAX_NOISE_AMPLITUDE);
        assert_eq!(Noise::seeded(1, -0.01).amplitude(), 0.01);
        assert_eq!(Noise::seeded(1, f64::NAN).amplitude(), 0.0);
    }

    #[test]
    fn test_samples_are_bounded() {
        let mut noise = Noise::seeded(7, 0.02);
        for _ in 0..1000 {
            let s = noise.sample();
            assert!((-0.02..=0.02).contains(&s));
        }
    }

    #[test]
    fn test_seeded_is_reproducible() {
        let mut a = Noise::seeded(42, 0.02);
        let mut b = Noise::seeded(42, 0.02);
        let xs: Vec<f64> = (0..20).map(|_| a.sample()).collect();
        let ys: Vec<f64> = (0..20).map(|_| b.sample()).collect();
        assert_eq!(xs, ys);
    }
}
