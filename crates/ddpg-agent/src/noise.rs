//! Ornstein-Uhlenbeck exploration noise
//!
//! Temporally correlated noise layered over a deterministic policy during
//! training. The process description ([`OuNoise`]) is immutable; the noise
//! vector itself ([`OuState`]) is passed in and returned by every call so that
//! the caller owns the per-episode state.

use ndarray::{Array1, Zip};
use rand::Rng;
use rand_distr::StandardNormal;
use serde::{Deserialize, Serialize};

use ddpg_core::{BoxSpace, DdpgError, Result};

use crate::utils::{LinearSchedule, Schedule};

/// OU noise hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Long-run mean
    pub mu: f64,
    /// Mean reversion rate
    pub theta: f64,
    /// Volatility at step 0
    pub sigma_max: f64,
    /// Volatility once the decay period has elapsed
    pub sigma_min: f64,
    /// Number of steps over which sigma decays linearly
    pub decay_period: usize,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            mu: 0.0,
            theta: 0.15,
            sigma_max: 0.3,
            sigma_min: 0.3,
            decay_period: 100_000,
        }
    }
}

impl NoiseConfig {
    /// Reject negative volatilities and an increasing sigma schedule
    pub fn validate(&self) -> Result<()> {
        if !(self.theta >= 0.0 && self.theta.is_finite()) {
            return Err(DdpgError::InvalidConfig(format!("noise theta must be >= 0, got {}", self.theta)));
        }
        if !(self.sigma_min >= 0.0 && self.sigma_min <= self.sigma_max && self.sigma_max.is_finite()) {
            return Err(DdpgError::InvalidConfig(format!(
                "noise sigma must satisfy 0 <= sigma_min <= sigma_max, got [{}, {}]",
                self.sigma_min, self.sigma_max
            )));
        }
        if !self.mu.is_finite() {
            return Err(DdpgError::InvalidConfig("noise mu must be finite".into()));
        }
        Ok(())
    }
}

/// Current noise vector of one episode
#[derive(Debug, Clone, PartialEq)]
pub struct OuState {
    x: Array1<f64>,
}

impl OuState {
    /// Noise values
    #[must_use]
    pub fn values(&self) -> &Array1<f64> {
        &self.x
    }
}

/// Ornstein-Uhlenbeck process over a bounded action space
#[derive(Debug, Clone)]
pub struct OuNoise {
    mu: f64,
    theta: f64,
    sigma: LinearSchedule,
    bounds: BoxSpace,
}

impl OuNoise {
    /// Create the process for actions bounded by `bounds`
    pub fn new(config: &NoiseConfig, bounds: BoxSpace) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            mu: config.mu,
            theta: config.theta,
            sigma: LinearSchedule::new(config.sigma_max, config.sigma_min, config.decay_period),
            bounds,
        })
    }

    /// Action dimension
    #[must_use]
    pub fn dim(&self) -> usize {
        self.bounds.dim()
    }

    /// Action bounds applied by [`OuNoise::get_action`]
    #[must_use]
    pub fn bounds(&self) -> &BoxSpace {
        &self.bounds
    }

    /// Fresh state with every component at `mu`
    #[must_use]
    pub fn reset(&self) -> OuState {
        OuState {
            x: Array1::from_elem(self.dim(), self.mu),
        }
    }

    /// Volatility at `step`, linearly decayed from `sigma_max` to `sigma_min`
    #[must_use]
    pub fn sigma(&self, step: usize) -> f64 {
        self.sigma.value(step)
    }

    /// One OU step: `x + theta * (mu - x) + sigma(step) * N(0, 1)`
    pub fn evolve_state<R: Rng + ?Sized>(&self, state: OuState, step: usize, rng: &mut R) -> OuState {
        let sigma = self.sigma(step);
        let mut x = state.x;
        x.mapv_inplace(|v| {
            let gaussian: f64 = rng.sample(StandardNormal);
            v + self.theta * (self.mu - v) + sigma * gaussian
        });
        OuState { x }
    }

    /// Layer noise over `raw_action` and clip to the action bounds.
    ///
    /// Returns the noisy action and the evolved state.
    pub fn get_action<R: Rng + ?Sized>(
        &self,
        state: OuState,
        raw_action: &[f64],
        step: usize,
        rng: &mut R,
    ) -> Result<(Vec<f64>, OuState)> {
        DdpgError::check_dim(self.dim(), raw_action.len())?;
        DdpgError::check_dim(self.dim(), state.x.len())?;

        let state = self.evolve_state(state, step, rng);
        let mut action = Array1::from(raw_action.to_vec());
        Zip::from(&mut action)
            .and(&state.x)
            .and(&Array1::from(self.bounds.low.clone()))
            .and(&Array1::from(self.bounds.high.clone()))
            .for_each(|a, &x, &low, &high| *a = (*a + x).clamp(low, high));

        Ok((action.to_vec(), state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::StdRng, SeedableRng};

    fn decaying() -> OuNoise {
        let config = NoiseConfig {
            sigma_max: 0.3,
            sigma_min: 0.0,
            decay_period: 100,
            ..NoiseConfig::default()
        };
        OuNoise::new(&config, BoxSpace::symmetric(1, 1.0)).unwrap()
    }

    /// Std of the single-step increment `evolve(reset) - mu`
    fn increment_std(noise: &OuNoise, step: usize, rng: &mut StdRng) -> f64 {
        let n = 4000;
        let samples: Vec<f64> = (0..n)
            .map(|_| noise.evolve_state(noise.reset(), step, rng).values()[0])
            .collect();
        #[allow(clippy::cast_precision_loss)]
        let mean = samples.iter().sum::<f64>() / n as f64;
        #[allow(clippy::cast_precision_loss)]
        let var = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        var.sqrt()
    }

    #[test]
    fn defaults() {
        let config = NoiseConfig::default();
        assert_eq!(config.theta, 0.15);
        assert_eq!(config.sigma_max, 0.3);
        assert_eq!(config.decay_period, 100_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_increasing_sigma() {
        let config = NoiseConfig {
            sigma_max: 0.1,
            sigma_min: 0.2,
            ..NoiseConfig::default()
        };
        assert!(matches!(config.validate(), Err(DdpgError::InvalidConfig(_))));
    }

    #[test]
    fn reset_returns_mu() {
        let config = NoiseConfig {
            mu: 0.5,
            ..NoiseConfig::default()
        };
        let noise = OuNoise::new(&config, BoxSpace::symmetric(3, 1.0)).unwrap();
        assert_eq!(noise.reset().values().to_vec(), vec![0.5; 3]);
    }

    #[test]
    fn sigma_decays_to_floor() {
        let mut rng = StdRng::seed_from_u64(42);
        let noise = decaying();

        assert_abs_diff_eq!(increment_std(&noise, 0, &mut rng), 0.3, epsilon = 0.02);
        assert_abs_diff_eq!(increment_std(&noise, 100, &mut rng), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(increment_std(&noise, 500, &mut rng), 0.0, epsilon = 1e-12);

        let mut previous = f64::INFINITY;
        for step in 0..200 {
            let sigma = noise.sigma(step);
            assert!(sigma <= previous);
            previous = sigma;
        }
    }

    #[test]
    fn actions_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        let config = NoiseConfig {
            sigma_max: 5.0,
            sigma_min: 5.0,
            ..NoiseConfig::default()
        };
        let noise = OuNoise::new(&config, BoxSpace::symmetric(2, 1.0)).unwrap();

        let mut state = noise.reset();
        for step in 1..500 {
            let raw = [10.0, -10.0];
            let (action, next) = noise.get_action(state, &raw, step, &mut rng).unwrap();
            assert!(noise.bounds().contains(&action));
            state = next;
        }
    }

    #[test]
    fn rejects_wrong_action_length() {
        let mut rng = StdRng::seed_from_u64(0);
        let noise = decaying();
        let err = noise.get_action(noise.reset(), &[0.0, 0.0], 1, &mut rng).unwrap_err();
        assert!(matches!(err, DdpgError::DimensionMismatch { expected: 1, actual: 2 }));
    }
}
