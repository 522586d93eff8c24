//! Random shadowing and multipath coefficients.
//!
//! Both are drawn once per access point at construction, for the whole user
//! population, and stay fixed for the trial.

use cellsim_common::SimError;
use rand::Rng;
use rand_distr::{Distribution, LogNormal, Normal};
use serde::{Deserialize, Serialize};

/// Default spread of the underlying normal of the log-normal shadowing.
pub const DEFAULT_SHADOWING_SIGMA: f64 = 2.0;

/// Log-normal shadowing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShadowingConfig {
    /// Draw log-normal coefficients instead of constant ones.
    pub enabled: bool,
    /// Standard deviation of the underlying normal (mean 0).
    pub sigma: f64,
}

impl ShadowingConfig {
    /// Shadowing turned off.
    pub fn disabled() -> Self {
        ShadowingConfig {
            enabled: false,
            sigma: DEFAULT_SHADOWING_SIGMA,
        }
    }

    /// Shadowing turned on with the given spread.
    pub fn with_sigma(sigma: f64) -> Self {
        ShadowingConfig { enabled: true, sigma }
    }
}

impl Default for ShadowingConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// One shadowing coefficient per user.
pub fn generate_shadowing<R: Rng + ?Sized>(
    rng: &mut R,
    number_ue: usize,
    config: &ShadowingConfig,
) -> Result<Vec<f64>, SimError> {
    if !config.enabled {
        return Ok(vec![1.0; number_ue]);
    }
    if !(config.sigma.is_finite() && config.sigma >= 0.0) {
        return Err(SimError::InvalidDistribution(format!(
            "shadowing sigma {} must be finite and non-negative",
            config.sigma
        )));
    }

    let dist = LogNormal::new(0.0, config.sigma).map_err(|e| {
        SimError::InvalidDistribution(format!("shadowing sigma {}: {}", config.sigma, e))
    })?;

    Ok((0..number_ue).map(|_| dist.sample(rng)).collect())
}

/// Rayleigh amplitude per (user, channel), indexed `[user][channel - 1]`.
///
/// Each amplitude is the magnitude of a complex gaussian whose components
/// have variance 1/2, so the mean power gain is 1.
pub fn generate_multipath<R: Rng + ?Sized>(
    rng: &mut R,
    number_ue: usize,
    number_channels: u32,
    enabled: bool,
) -> Result<Vec<Vec<f64>>, SimError> {
    let number_channels = number_channels as usize;
    if !enabled {
        return Ok(vec![vec![1.0; number_channels]; number_ue]);
    }

    let dist = Normal::new(0.0, std::f64::consts::FRAC_1_SQRT_2)
        .map_err(|e| SimError::InvalidDistribution(format!("multipath: {}", e)))?;

    let matrix = (0..number_ue)
        .map(|_| {
            (0..number_channels)
                .map(|_| {
                    let re = dist.sample(rng);
                    let im = dist.sample(rng);
                    re.hypot(im)
                })
                .collect()
        })
        .collect();

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_shadowing_disabled_is_unity() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let coeffs = generate_shadowing(&mut rng, 5, &ShadowingConfig::disabled()).unwrap();
        assert_eq!(coeffs, vec![1.0; 5]);
    }

    #[test]
    fn test_shadowing_log_normal_statistics() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let sigma = 2.0;
        let coeffs = generate_shadowing(&mut rng, 20_000, &ShadowingConfig::with_sigma(sigma)).unwrap();

        assert!(coeffs.iter().all(|c| *c > 0.0));

        // The log of the samples is N(0, sigma)
        let logs: Vec<f64> = coeffs.iter().map(|c| c.ln()).collect();
        let mean = logs.iter().sum::<f64>() / logs.len() as f64;
        let var = logs.iter().map(|l| (l - mean).powi(2)).sum::<f64>() / logs.len() as f64;
        assert!(mean.abs() < 0.1, "log-mean {} should be near 0", mean);
        assert!((var.sqrt() - sigma).abs() < 0.1, "log-std {} should be near {}", var.sqrt(), sigma);
    }

    #[test]
    fn test_shadowing_rejects_negative_sigma() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = generate_shadowing(&mut rng, 3, &ShadowingConfig::with_sigma(-1.0));
        assert!(matches!(result, Err(SimError::InvalidDistribution(_))));

        let result = generate_shadowing(&mut rng, 3, &ShadowingConfig::with_sigma(f64::NAN));
        assert!(matches!(result, Err(SimError::InvalidDistribution(_))));

        // Zero spread is a degenerate but valid log-normal
        let coeffs = generate_shadowing(&mut rng, 3, &ShadowingConfig::with_sigma(0.0)).unwrap();
        assert_eq!(coeffs, vec![1.0; 3]);
    }

    #[test]
    fn test_multipath_disabled_shape() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let matrix = generate_multipath(&mut rng, 4, 3, false).unwrap();
        assert_eq!(matrix.len(), 4);
        assert!(matrix.iter().all(|row| row == &vec![1.0; 3]));
    }

    #[test]
    fn test_multipath_rayleigh_mean_power() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let matrix = generate_multipath(&mut rng, 5_000, 4, true).unwrap();
        assert!(matrix.iter().all(|row| row.len() == 4));

        let samples: Vec<f64> = matrix.iter().flatten().copied().collect();
        assert!(samples.iter().all(|a| *a >= 0.0));

        // E[|h|^2] = 1 for unit-power Rayleigh fading
        let mean_power = samples.iter().map(|a| a * a).sum::<f64>() / samples.len() as f64;
        assert!((mean_power - 1.0).abs() < 0.05, "mean power {} should be near 1", mean_power);
    }
}
