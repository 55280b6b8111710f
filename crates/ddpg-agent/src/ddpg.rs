//! Deep Deterministic Policy Gradient agent
//!
//! The agent owns an actor, a critic, a slowly tracking target copy of each,
//! one Adam optimizer per online network, the replay buffer and the
//! exploration process. Every [`DdpgAgent::update`] runs the same three phases
//! in order:
//!
//! 1. critic regression towards `r + gamma * (1 - done) * Q'(s', mu'(s'))`;
//! 2. actor ascent on `Q(s, mu(s))` through the freshly updated critic;
//! 3. soft update of both target networks.

use std::path::Path;

use ndarray::{Array1, Zip};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use ddpg_core::{BoxSpace, DdpgError, DeterministicPolicy, Result, Transition};

use crate::actor::Actor;
use crate::buffer::{Batch, ReplayBuffer};
use crate::critic::Critic;
use crate::network::Mlp;
use crate::noise::{NoiseConfig, OuNoise};
use crate::optim::Adam;
use crate::target::SoftUpdate;

/// File name of the actor parameters inside a checkpoint directory
pub const ACTOR_FILE: &str = "actor.json";
/// File name of the critic parameters inside a checkpoint directory
pub const CRITIC_FILE: &str = "critic.json";

/// DDPG hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DdpgConfig {
    /// Discount factor
    pub gamma: f64,
    /// Critic learning rate
    pub critic_lr: f64,
    /// Actor learning rate
    pub actor_lr: f64,
    /// Replay buffer capacity
    pub memory_capacity: usize,
    /// Minibatch size
    pub batch_size: usize,
    /// Target tracking rate
    pub soft_tau: f64,
    /// Width of both hidden layers of actor and critic
    pub hidden_dim: usize,
    /// Half-width of the output layer initialisation
    pub init_w: f64,
    /// Seed for initialisation and minibatch sampling; entropy when `None`
    pub seed: Option<u64>,
    /// Exploration noise
    pub noise: NoiseConfig,
}

impl Default for DdpgConfig {
    fn default() -> Self {
        Self {
            gamma: 0.99,
            critic_lr: 1e-3,
            actor_lr: 1e-4,
            memory_capacity: 8000,
            batch_size: 128,
            soft_tau: 1e-2,
            hidden_dim: 256,
            init_w: 3e-3,
            seed: None,
            noise: NoiseConfig::default(),
        }
    }
}

impl DdpgConfig {
    /// Check that every hyperparameter is usable
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(DdpgError::InvalidConfig(msg));

        if !(0.0..=1.0).contains(&self.gamma) {
            return invalid(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        if !(self.soft_tau > 0.0 && self.soft_tau <= 1.0) {
            return invalid(format!("soft_tau must be in (0, 1], got {}", self.soft_tau));
        }
        for (name, lr) in [("actor_lr", self.actor_lr), ("critic_lr", self.critic_lr)] {
            if !(lr > 0.0 && lr.is_finite()) {
                return invalid(format!("{name} must be positive, got {lr}"));
            }
        }
        if self.memory_capacity == 0 {
            return invalid("memory_capacity must be positive".into());
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be positive".into());
        }
        if self.hidden_dim == 0 {
            return invalid("hidden_dim must be positive".into());
        }
        if !(self.init_w > 0.0 && self.init_w.is_finite()) {
            return invalid(format!("init_w must be positive, got {}", self.init_w));
        }
        self.noise.validate()
    }
}

/// Losses of one update
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UpdateStats {
    /// Mean squared TD error before the critic step
    pub critic_loss: f64,
    /// `-mean(Q(s, mu(s)))` before the actor step
    pub actor_loss: f64,
}

/// Phase of [`DdpgAgent::update`] that has just completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdatePhase {
    /// Critic optimizer step
    Critic,
    /// Actor optimizer step
    Actor,
    /// Soft update of both targets
    Targets,
}

/// Hook called after each phase of an update
pub trait UpdateObserver {
    /// `agent` reflects the state right after `phase`
    fn on_phase(&mut self, phase: UpdatePhase, agent: &DdpgAgent);
}

impl<F: FnMut(UpdatePhase, &DdpgAgent)> UpdateObserver for F {
    fn on_phase(&mut self, phase: UpdatePhase, agent: &DdpgAgent) {
        self(phase, agent);
    }
}

struct NoObserver;

impl UpdateObserver for NoObserver {
    fn on_phase(&mut self, _phase: UpdatePhase, _agent: &DdpgAgent) {}
}

/// DDPG agent
#[derive(Debug)]
pub struct DdpgAgent {
    config: DdpgConfig,
    n_states: usize,
    n_actions: usize,
    actor: Actor,
    critic: Critic,
    target_actor: Actor,
    target_critic: Critic,
    actor_optimizer: Adam,
    critic_optimizer: Adam,
    memory: ReplayBuffer,
    noise: OuNoise,
    rng: StdRng,
}

impl DdpgAgent {
    /// Create an agent for `n_states`-dimensional observations and
    /// `n_actions`-dimensional actions in `[-1, 1]`.
    ///
    /// Targets start as exact copies of the online networks.
    pub fn new(n_states: usize, n_actions: usize, config: DdpgConfig) -> Result<Self> {
        if n_states == 0 || n_actions == 0 {
            return Err(DdpgError::InvalidConfig(format!(
                "state and action dimensions must be positive, got ({n_states}, {n_actions})"
            )));
        }
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let actor = Actor::new(n_states, n_actions, config.hidden_dim, config.init_w, &mut rng);
        let critic = Critic::new(n_states, n_actions, config.hidden_dim, config.init_w, &mut rng);
        let actor_optimizer = Adam::new(actor.network(), config.actor_lr);
        let critic_optimizer = Adam::new(critic.network(), config.critic_lr);
        let noise = OuNoise::new(&config.noise, BoxSpace::symmetric(n_actions, 1.0))?;
        let memory = ReplayBuffer::new(config.memory_capacity);

        if config.batch_size > config.memory_capacity {
            warn!(
                batch_size = config.batch_size,
                memory_capacity = config.memory_capacity,
                "batch size exceeds replay capacity, updates will never run"
            );
        }
        debug!(
            n_states,
            n_actions,
            actor_params = actor.network().num_parameters(),
            critic_params = critic.network().num_parameters(),
            "created DDPG agent"
        );

        Ok(Self {
            target_actor: actor.clone(),
            target_critic: critic.clone(),
            config,
            n_states,
            n_actions,
            actor,
            critic,
            actor_optimizer,
            critic_optimizer,
            memory,
            noise,
            rng,
        })
    }

    /// Hyperparameters
    #[must_use]
    pub fn config(&self) -> &DdpgConfig {
        &self.config
    }

    /// Observation dimension
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Action dimension
    #[must_use]
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    /// Online actor
    #[must_use]
    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    /// Online critic
    #[must_use]
    pub fn critic(&self) -> &Critic {
        &self.critic
    }

    /// Target actor
    #[must_use]
    pub fn target_actor(&self) -> &Actor {
        &self.target_actor
    }

    /// Target critic
    #[must_use]
    pub fn target_critic(&self) -> &Critic {
        &self.target_critic
    }

    /// Exploration process over the normalized action space
    #[must_use]
    pub fn noise(&self) -> &OuNoise {
        &self.noise
    }

    /// Replay buffer
    #[must_use]
    pub fn memory(&self) -> &ReplayBuffer {
        &self.memory
    }

    /// Deterministic action `mu(state)` without exploration noise
    pub fn choose_action(&self, state: &[f64]) -> Result<Vec<f64>> {
        self.actor.act(state)
    }

    /// Store a transition for replay
    pub fn remember(&mut self, transition: Transition) -> Result<()> {
        DdpgError::check_dim(self.n_states, transition.state.len())?;
        DdpgError::check_dim(self.n_states, transition.next_state.len())?;
        DdpgError::check_dim(self.n_actions, transition.action.len())?;
        self.memory.push(transition);
        Ok(())
    }

    /// Regression targets `r + gamma * (1 - done) * Q'(s', mu'(s'))`.
    ///
    /// Terminal rows get exactly `r`; the bootstrap term is never evaluated
    /// into them.
    #[must_use]
    pub fn critic_targets(&self, batch: &Batch) -> Array1<f64> {
        let next_actions = self.target_actor.forward(batch.next_states.view());
        let next_q = self
            .target_critic
            .q_values(batch.next_states.view(), next_actions.view());
        let gamma = self.config.gamma;

        Zip::from(&batch.rewards)
            .and(&batch.dones)
            .and(&next_q)
            .map_collect(|&r, &done, &q| if done { r } else { r + gamma * q })
    }

    /// One training step on a sampled minibatch.
    ///
    /// Returns `None` without touching any parameter while the buffer holds
    /// fewer than `batch_size` transitions.
    pub fn update(&mut self) -> Option<UpdateStats> {
        self.update_with(&mut NoObserver)
    }

    /// Like [`DdpgAgent::update`], notifying `observer` after every phase
    pub fn update_with<O: UpdateObserver + ?Sized>(&mut self, observer: &mut O) -> Option<UpdateStats> {
        let transitions = self.memory.sample(self.config.batch_size, &mut self.rng)?;
        let batch = Batch::from_transitions(&transitions);

        let critic_loss = self.update_critic(&batch);
        observer.on_phase(UpdatePhase::Critic, self);

        let actor_loss = self.update_actor(&batch);
        observer.on_phase(UpdatePhase::Actor, self);

        let tau = self.config.soft_tau;
        self.target_critic.soft_update(&self.critic, tau);
        self.target_actor.soft_update(&self.actor, tau);
        observer.on_phase(UpdatePhase::Targets, self);

        trace!(critic_loss, actor_loss, "ddpg update");
        Some(UpdateStats {
            critic_loss,
            actor_loss,
        })
    }

    #[allow(clippy::cast_precision_loss)]
    fn update_critic(&mut self, batch: &Batch) -> f64 {
        let targets = self.critic_targets(batch);
        let (q, cache) = self
            .critic
            .forward_cached(batch.states.view(), batch.actions.view());

        let n = batch.len() as f64;
        let td = &q - &targets;
        let loss = td.mapv(|d| d * d).sum() / n;
        let grad_q = td.mapv(|d| 2.0 * d / n);

        let (grads, _) = self.critic.backward(&cache, &grad_q);
        self.critic_optimizer.step(self.critic.network_mut(), &grads);
        loss
    }

    #[allow(clippy::cast_precision_loss)]
    fn update_actor(&mut self, batch: &Batch) -> f64 {
        let (actions, actor_cache) = self.actor.forward_cached(batch.states.view());
        let (q, critic_cache) = self.critic.forward_cached(batch.states.view(), actions.view());

        let n = batch.len() as f64;
        let loss = -q.sum() / n;
        let grad_q = Array1::from_elem(batch.len(), -1.0 / n);

        // only dQ/da is used; the critic's parameter gradients are discarded
        let (_, grad_actions) = self.critic.backward(&critic_cache, &grad_q);
        let grads = self.actor.backward(&actor_cache, grad_actions);
        self.actor_optimizer.step(self.actor.network_mut(), &grads);
        loss
    }

    /// Copy the online parameters into both targets
    pub fn sync_targets(&mut self) {
        self.target_actor.hard_update(&self.actor);
        self.target_critic.hard_update(&self.critic);
    }

    /// Write actor and critic parameters into `dir` (created if missing).
    ///
    /// Target networks, optimizer moments and the replay buffer are not saved.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|e| checkpoint_error(dir, &e))?;
        write_network(&dir.join(ACTOR_FILE), self.actor.network())?;
        write_network(&dir.join(CRITIC_FILE), self.critic.network())?;
        debug!(path = %dir.display(), "saved checkpoint");
        Ok(())
    }

    /// Restore actor and critic parameters from `dir`.
    ///
    /// Both files are read and checked against this agent's architecture
    /// before anything is replaced. Targets keep their current parameters;
    /// call [`DdpgAgent::sync_targets`] to align them.
    pub fn load(&mut self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        let actor = read_network(&dir.join(ACTOR_FILE), self.actor.network())?;
        let critic = read_network(&dir.join(CRITIC_FILE), self.critic.network())?;

        *self.actor.network_mut() = actor;
        *self.critic.network_mut() = critic;
        debug!(path = %dir.display(), "loaded checkpoint");
        Ok(())
    }
}

fn checkpoint_error(path: &Path, reason: &dyn std::fmt::Display) -> DdpgError {
    DdpgError::Checkpoint {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

fn write_network(path: &Path, net: &Mlp) -> Result<()> {
    let json = serde_json::to_string(net)?;
    std::fs::write(path, json).map_err(|e| checkpoint_error(path, &e))
}

fn read_network(path: &Path, expected: &Mlp) -> Result<Mlp> {
    let json = std::fs::read_to_string(path).map_err(|e| checkpoint_error(path, &e))?;
    let net: Mlp = serde_json::from_str(&json).map_err(|e| checkpoint_error(path, &e))?;
    if !net.same_architecture(expected) {
        return Err(checkpoint_error(path, &"network architecture does not match the agent"));
    }
    Ok(net)
}
