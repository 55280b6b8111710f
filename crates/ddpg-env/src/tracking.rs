//! One-dimensional tracking task

use rand::{rngs::StdRng, Rng, SeedableRng};

use ddpg_core::{BoxSpace, DdpgError, Environment, Result, Step};

/// Default episode length
pub const TRACKING_EPISODE_LENGTH: usize = 10;

/// The observation is a target drawn uniformly from `[-1, 1]`; the reward is
/// `-|action - target|`. A new target is drawn every step and episodes end
/// after a fixed number of steps.
///
/// Small enough to learn in a few hundred updates, which makes it a useful
/// smoke test for an agent.
#[derive(Debug, Clone)]
pub struct TrackingEnv {
    episode_length: usize,
    target: f64,
    t: usize,
    rng: StdRng,
}

impl TrackingEnv {
    /// Tracking task with 10-step episodes
    #[must_use]
    pub fn new() -> Self {
        Self::with_episode_length(TRACKING_EPISODE_LENGTH)
    }

    /// Tracking task with custom episode length
    #[must_use]
    pub fn with_episode_length(episode_length: usize) -> Self {
        Self {
            episode_length: episode_length.max(1),
            target: 0.0,
            t: 0,
            rng: StdRng::from_entropy(),
        }
    }

    fn draw(&mut self) -> f64 {
        self.target = self.rng.gen_range(-1.0..=1.0);
        self.target
    }
}

impl Default for TrackingEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment for TrackingEnv {
    fn observation_space(&self) -> BoxSpace {
        BoxSpace::symmetric(1, 1.0)
    }

    fn action_space(&self) -> BoxSpace {
        BoxSpace::symmetric(1, 1.0)
    }

    fn reset(&mut self) -> Result<Vec<f64>> {
        self.t = 0;
        Ok(vec![self.draw()])
    }

    fn step(&mut self, action: &[f64]) -> Result<Step> {
        DdpgError::check_dim(1, action.len())?;
        let reward = -(action[0] - self.target).abs();
        self.t += 1;
        let next = self.draw();
        Ok(Step::new(vec![next], reward).terminal(self.t >= self.episode_length))
    }

    fn seed(&mut self, seed: u64) {
        self.rng = StdRng::seed_from_u64(seed);
    }
}
