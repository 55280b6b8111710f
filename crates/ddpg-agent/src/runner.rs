//! Training and evaluation loops

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use ddpg_core::{DdpgError, Environment, Result, Transition};

use crate::ddpg::DdpgAgent;
use crate::utils::smoothed;

/// Loop settings shared by [`train`] and [`test`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// Training episodes
    pub train_eps: usize,
    /// Evaluation episodes
    pub test_eps: usize,
    /// Report every `log_interval` training episodes
    pub log_interval: usize,
    /// Cut episodes after this many steps; `None` waits for the environment
    pub max_steps: Option<usize>,
    /// Call `render` after every evaluation step
    pub render: bool,
    /// Seed for the exploration noise; entropy when `None`
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            train_eps: 300,
            test_eps: 30,
            log_interval: 10,
            max_steps: None,
            render: false,
            seed: None,
        }
    }
}

/// Per-episode rewards and their exponential moving average
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardHistory {
    /// Total reward of every episode
    pub rewards: Vec<f64>,
    /// `0.9 * previous + 0.1 * reward`, starting at the first reward
    pub ma_rewards: Vec<f64>,
}

impl RewardHistory {
    /// Record one episode
    pub fn push(&mut self, reward: f64) {
        let ma = smoothed(self.ma_rewards.last().copied(), reward);
        self.rewards.push(reward);
        self.ma_rewards.push(ma);
    }

    /// Number of recorded episodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Whether nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }

    /// Latest moving average
    #[must_use]
    pub fn last_ma(&self) -> Option<f64> {
        self.ma_rewards.last().copied()
    }
}

fn check_spaces<E: Environment + ?Sized>(env: &E, agent: &DdpgAgent) -> Result<()> {
    DdpgError::check_dim(agent.n_states(), env.observation_space().dim())?;
    DdpgError::check_dim(agent.n_actions(), env.action_space().dim())
}

fn step_limit_reached(config: &TrainConfig, step: usize) -> bool {
    config.max_steps.is_some_and(|max| step >= max)
}

/// Train `agent` on `env` for `config.train_eps` episodes.
///
/// Every step: deterministic action, OU noise (step counter restarting at 1
/// each episode), environment step, store, one update.
pub fn train<E: Environment + ?Sized>(env: &mut E, agent: &mut DdpgAgent, config: &TrainConfig) -> Result<RewardHistory> {
    check_spaces(env, agent)?;
    info!("Start training, {} episodes", config.train_eps);

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut history = RewardHistory::default();

    for episode in 0..config.train_eps {
        let mut state = env.reset()?;
        let mut noise_state = agent.noise().reset();
        let mut ep_reward = 0.0;
        let mut step = 0;

        loop {
            step += 1;
            let raw_action = agent.choose_action(&state)?;
            let (action, next_noise) = agent.noise().get_action(noise_state, &raw_action, step, &mut rng)?;
            noise_state = next_noise;

            let outcome = env.step(&action)?;
            ep_reward += outcome.reward;
            agent.remember(Transition::new(
                state,
                action,
                outcome.reward,
                outcome.observation.clone(),
                outcome.done,
            ))?;
            agent.update();
            state = outcome.observation;

            if outcome.done || step_limit_reached(config, step) {
                break;
            }
        }

        history.push(ep_reward);
        debug!(episode = episode + 1, steps = step, reward = ep_reward, "training episode finished");
        if config.log_interval > 0 && (episode + 1) % config.log_interval == 0 {
            info!("Episode: {}/{}, Reward: {:.2}", episode + 1, config.train_eps, ep_reward);
        }
    }

    info!("Finish training");
    Ok(history)
}

/// Evaluate the bare policy for `config.test_eps` episodes.
///
/// No noise, no storing, no updates. The environment is closed at the end.
pub fn test<E: Environment + ?Sized>(env: &mut E, agent: &DdpgAgent, config: &TrainConfig) -> Result<RewardHistory> {
    check_spaces(env, agent)?;
    info!("Start testing, {} episodes", config.test_eps);

    let mut history = RewardHistory::default();
    for episode in 0..config.test_eps {
        let mut state = env.reset()?;
        let mut ep_reward = 0.0;
        let mut step = 0;

        loop {
            step += 1;
            let action = agent.choose_action(&state)?;
            let outcome = env.step(&action)?;
            if config.render {
                env.render()?;
            }
            ep_reward += outcome.reward;
            state = outcome.observation;

            if outcome.done || step_limit_reached(config, step) {
                break;
            }
        }

        history.push(ep_reward);
        info!("Episode: {}/{}, Reward: {:.1}", episode + 1, config.test_eps, ep_reward);
    }

    env.close()?;
    info!("Finish testing");
    Ok(history)
}
