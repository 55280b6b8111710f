//! Classic control environments

use std::f64::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use ddpg_core::{BoxSpace, DdpgError, Environment, Result, Step, StepInfo};

/// Pendulum physical constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendulumConfig {
    /// Angular velocity limit
    pub max_speed: f64,
    /// Torque limit
    pub max_torque: f64,
    /// Integration step
    pub dt: f64,
    /// Gravity
    pub g: f64,
    /// Pole mass
    pub m: f64,
    /// Pole length
    pub l: f64,
}

impl Default for PendulumConfig {
    fn default() -> Self {
        Self {
            max_speed: 8.0,
            max_torque: 2.0,
            dt: 0.05,
            g: 10.0,
            m: 1.0,
            l: 1.0,
        }
    }
}

/// Inverted pendulum swing-up.
///
/// Observation `[cos(theta), sin(theta), theta_dot]`, action `[torque]` in
/// `[-max_torque, max_torque]`. The episode never terminates on its own; wrap
/// it in [`crate::TimeLimit`].
#[derive(Debug, Clone)]
pub struct PendulumEnv {
    config: PendulumConfig,
    theta: f64,
    theta_dot: f64,
    last_torque: Option<f64>,
    rng: StdRng,
}

/// Wrap an angle into `[-pi, pi)`
#[must_use]
pub fn angle_normalize(x: f64) -> f64 {
    (x + PI).rem_euclid(2.0 * PI) - PI
}

impl PendulumEnv {
    /// Pendulum with the standard constants
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PendulumConfig::default())
    }

    /// Pendulum with custom constants
    #[must_use]
    pub fn with_config(config: PendulumConfig) -> Self {
        Self {
            config,
            theta: 0.0,
            theta_dot: 0.0,
            last_torque: None,
            rng: StdRng::from_entropy(),
        }
    }

    /// Set the physical state directly
    pub fn set_state(&mut self, theta: f64, theta_dot: f64) {
        self.theta = theta;
        self.theta_dot = theta_dot;
    }

    /// Current `(theta, theta_dot)`
    #[must_use]
    pub fn state(&self) -> (f64, f64) {
        (self.theta, self.theta_dot)
    }

    fn observation(&self) -> Vec<f64> {
        vec![self.theta.cos(), self.theta.sin(), self.theta_dot]
    }
}

impl Default for PendulumEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for PendulumEnv {
    fn observation_space(&self) -> BoxSpace {
        let high = vec![1.0, 1.0, self.config.max_speed];
        let low = high.iter().map(|&x| -x).collect();
        BoxSpace { low, high }
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::symmetric(1, self.config.max_torque)
    }

    fn reset(&mut self) -> Result<Vec<f64>> {
        self.theta = self.rng.gen_range(-PI..PI);
        self.theta_dot = self.rng.gen_range(-1.0..1.0);
        self.last_torque = None;
        Ok(self.observation())
    }

    fn step(&mut self, action: &[f64]) -> Result<Step> {
        DdpgError::check_dim(1, action.len())?;
        let c = &self.config;
        let u = action[0].clamp(-c.max_torque, c.max_torque);
        if !u.is_finite() {
            return Err(DdpgError::Environment(format!("non-finite torque {}", action[0])));
        }

        let (th, thdot) = (self.theta, self.theta_dot);
        let cost = angle_normalize(th).powi(2) + 0.1 * thdot.powi(2) + 0.001 * u.powi(2);

        let new_thdot = (thdot + (3.0 * c.g / (2.0 * c.l) * th.sin() + 3.0 / (c.m * c.l * c.l) * u) * c.dt)
            .clamp(-c.max_speed, c.max_speed);
        self.theta = th + new_thdot * c.dt;
        self.theta_dot = new_thdot;
        self.last_torque = Some(u);

        let mut step = Step::new(self.observation(), -cost);
        step.info = StepInfo::default().with("theta", angle_normalize(self.theta));
        Ok(step)
    }

    fn render(&self) -> Result<()> {
        println!(
            "theta: {:+.3} rad, theta_dot: {:+.3} rad/s, torque: {}",
            angle_normalize(self.theta),
            self.theta_dot,
            self.last_torque.map_or_else(|| "-".to_string(), |u| format!("{u:+.3}"))
        );
        Ok(())
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn angle_normalize_wraps() {
        assert_relative_eq!(angle_normalize(0.5), 0.5);
        assert_relative_eq!(angle_normalize(2.0 * PI + 0.25), 0.25, epsilon = 1e-12);
        assert_relative_eq!(angle_normalize(-PI - 0.25), PI - 0.25, epsilon = 1e-12);
    }

    #[test]
    fn upright_at_rest_is_free() {
        let mut env = PendulumEnv::new();
        env.set_state(0.0, 0.0);
        let step = env.step(&[0.0]).unwrap();
        assert_eq!(step.reward, 0.0);
        assert_eq!(step.observation, vec![1.0, 0.0, 0.0]);
        assert!(!step.done);
    }

    #[test]
    fn reward_penalises_angle_speed_and_torque() {
        let mut env = PendulumEnv::new();
        env.set_state(PI, 1.0);
        // torque above the limit is clipped to 2
        let step = env.step(&[5.0]).unwrap();
        let expected = -(PI * PI + 0.1 + 0.001 * 4.0);
        assert_relative_eq!(step.reward, expected, epsilon = 1e-9);
    }

    #[test]
    fn dynamics_follow_gravity_and_speed_limit() {
        let mut env = PendulumEnv::new();
        env.set_state(0.1, 0.0);
        env.step(&[0.0]).unwrap();
        let (theta, theta_dot) = env.state();
        let expected_thdot = 15.0 * 0.1_f64.sin() * 0.05;
        assert_relative_eq!(theta_dot, expected_thdot, epsilon = 1e-12);
        assert_relative_eq!(theta, 0.1 + expected_thdot * 0.05, epsilon = 1e-12);

        env.set_state(PI / 2.0, 7.9);
        env.step(&[2.0]).unwrap();
        assert_eq!(env.state().1, 8.0);
    }

    #[test]
    fn seeded_resets_repeat() {
        let mut a = PendulumEnv::new();
        let mut b = PendulumEnv::new();
        a.seed(11);
        b.seed(11);
        let first = a.reset().unwrap();
        assert_eq!(first, b.reset().unwrap());
        assert!(a.observation_space().contains(&first));
    }

    #[test]
    fn rejects_wrong_action_length() {
        let mut env = PendulumEnv::new();
        assert!(env.step(&[0.0, 1.0]).is_err());
    }
}
