//! Environment wrappers

use ddpg_core::{BoxSpace, DdpgError, Environment, Result, Step};

/// Exposes `[-1, 1]^n` actions and rescales them into the inner
/// environment's action bounds.
///
/// `a_env = low + (a + 1) / 2 * (high - low)`, clipped to `[low, high]`.
pub struct NormalizedActions<E> {
    /// Inner environment
    pub env: E,
    bounds: BoxSpace,
}

impl<E: Environment> NormalizedActions<E> {
    /// Wrap `env`; its action space must be bounded
    pub fn new(env: E) -> Result<Self> {
        let bounds = env.action_space();
        if bounds.low.iter().chain(&bounds.high).any(|v| !v.is_finite()) {
            return Err(DdpgError::InvalidConfig(
                "action normalization needs finite action bounds".into(),
            ));
        }
        Ok(Self { env, bounds })
    }

    /// Map a normalized action into the inner bounds
    #[must_use]
    pub fn action(&self, action: &[f64]) -> Vec<f64> {
        let scaled: Vec<f64> = action
            .iter()
            .zip(&self.bounds.low)
            .zip(&self.bounds.high)
            .map(|((a, low), high)| low + (a + 1.0) * 0.5 * (high - low))
            .collect();
        self.bounds.clip(&scaled)
    }

    /// Map an inner action back into `[-1, 1]`
    #[must_use]
    pub fn reverse_action(&self, action: &[f64]) -> Vec<f64> {
        action
            .iter()
            .zip(&self.bounds.low)
            .zip(&self.bounds.high)
            .map(|((a, low), high)| {
                if high > low {
                    (2.0 * (a - low) / (high - low) - 1.0).clamp(-1.0, 1.0)
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl<E: Environment> Environment for NormalizedActions<E> {
    fn observation_space(&self) -> BoxSpace {
        self.env.observation_space()
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::symmetric(self.bounds.dim(), 1.0)
    }

    fn reset(&mut self) -> Result<Vec<f64>> {
        self.env.reset()
    }

    fn step(&mut self, action: &[f64]) -> Result<Step> {
        DdpgError::check_dim(self.bounds.dim(), action.len())?;
        let scaled = self.action(action);
        self.env.step(&scaled)
    }

    fn render(&self) -> Result<()> {
        self.env.render()
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }

    fn seed(&mut self, seed: u64) {
        self.env.seed(seed);
    }
}

/// Time limit wrapper for episodes
pub struct TimeLimit<E> {
    /// Inner environment
    pub env: E,
    /// Maximum steps
    pub max_steps: usize,
    /// Current step count
    pub steps: usize,
}

impl<E> TimeLimit<E> {
    /// Create a new time limit wrapper
    pub fn new(env: E, max_steps: usize) -> Self {
        Self {
            env,
            max_steps,
            steps: 0,
        }
    }
}

impl<E: Environment> Environment for TimeLimit<E> {
    fn observation_space(&self) -> BoxSpace {
        self.env.observation_space()
    }

    fn action_space(&self) -> BoxSpace {
        self.env.action_space()
    }

    fn reset(&mut self) -> Result<Vec<f64>> {
        self.steps = 0;
        self.env.reset()
    }

    fn step(&mut self, action: &[f64]) -> Result<Step> {
        self.steps += 1;
        let mut step = self.env.step(action)?;

        if self.steps >= self.max_steps && !step.done {
            step.truncated = true;
            step.done = true;
        }

        Ok(step)
    }

    fn render(&self) -> Result<()> {
        self.env.render()
    }

    fn close(&mut self) -> Result<()> {
        self.env.close()
    }

    fn seed(&mut self, seed: u64) {
        self.env.seed(seed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PendulumEnv, TrackingEnv};
    use approx::assert_relative_eq;
    use ddpg_core::StepInfo;

    /// Reports the received action: first component as reward, second in the info
    struct Echo;

    impl Environment for Echo {
        fn observation_space(&self) -> BoxSpace {
            BoxSpace::symmetric(1, 1.0)
        }

        fn action_space(&self) -> BoxSpace {
            BoxSpace {
                low: vec![-2.0, 0.0],
                high: vec![2.0, 10.0],
            }
        }

        fn reset(&mut self) -> Result<Vec<f64>> {
            Ok(vec![0.0])
        }

        fn step(&mut self, action: &[f64]) -> Result<Step> {
            let mut step = Step::new(vec![0.0], action[0]);
            step.info = StepInfo::default().with("second", action[1]);
            Ok(step)
        }

        fn seed(&mut self, _seed: u64) {}
    }

    #[test]
    fn normalized_actions_map_into_bounds() {
        let env = NormalizedActions::new(Echo).unwrap();
        assert_eq!(env.action_space(), BoxSpace::symmetric(2, 1.0));
        assert_eq!(env.action(&[-1.0, -1.0]), vec![-2.0, 0.0]);
        assert_eq!(env.action(&[1.0, 1.0]), vec![2.0, 10.0]);
        assert_eq!(env.action(&[0.0, 0.0]), vec![0.0, 5.0]);
        // out of range inputs are clipped
        assert_eq!(env.action(&[3.0, -7.0]), vec![2.0, 0.0]);
    }

    #[test]
    fn reverse_action_inverts_mapping() {
        let env = NormalizedActions::new(Echo).unwrap();
        let normalized = [0.3, -0.6];
        let back = env.reverse_action(&env.action(&normalized));
        assert_relative_eq!(back[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(back[1], -0.6, epsilon = 1e-12);
    }

    #[test]
    fn normalized_step_forwards_scaled_action() {
        let mut env = NormalizedActions::new(Echo).unwrap();
        let step = env.step(&[0.5, 0.0]).unwrap();
        assert_eq!(step.reward, 1.0);
        assert_eq!(step.info.fields["second"], 5.0);
        assert!(env.step(&[0.5]).is_err());
    }

    #[test]
    fn normalized_pendulum_torque() {
        let mut env = NormalizedActions::new(PendulumEnv::new()).unwrap();
        assert_eq!(env.action(&[0.5]), vec![1.0]);
        env.env.set_state(0.0, 0.0);
        let step = env.step(&[1.0]).unwrap();
        // full torque: reward only pays the 0.001 * 2^2 control cost
        assert_relative_eq!(step.reward, -0.004, epsilon = 1e-12);
    }

    #[test]
    fn time_limit_truncates() {
        let mut env = TimeLimit::new(TrackingEnv::with_episode_length(100), 3);
        env.seed(0);
        env.reset().unwrap();
        assert!(!env.step(&[0.0]).unwrap().done);
        assert!(!env.step(&[0.0]).unwrap().done);
        let last = env.step(&[0.0]).unwrap();
        assert!(last.done && last.truncated);

        env.reset().unwrap();
        assert_eq!(env.steps, 0);
    }

    #[test]
    fn natural_termination_is_not_truncation() {
        let mut env = TimeLimit::new(TrackingEnv::with_episode_length(2), 2);
        env.seed(0);
        env.reset().unwrap();
        env.step(&[0.0]).unwrap();
        let last = env.step(&[0.0]).unwrap();
        assert!(last.done);
        assert!(!last.truncated);
    }
}
