//! Environment registry for creating environments by name

use std::collections::HashMap;

use tracing::debug;

use ddpg_core::{DdpgError, Environment, Result};

use crate::{PendulumEnv, TimeLimit, TrackingEnv};

/// Boxed environment that can be moved to a worker thread
pub type BoxedEnv = Box<dyn Environment + Send>;

type EnvConstructor = Box<dyn Fn() -> BoxedEnv + Send + Sync>;

/// Episode cap of the pendulum registrations
pub const PENDULUM_MAX_STEPS: usize = 200;

/// Named environment constructors
pub struct EnvRegistry {
    /// Registered environments
    envs: HashMap<String, EnvConstructor>,
}

impl EnvRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            envs: HashMap::new(),
        }
    }

    /// Registry holding `Pendulum-v0`, `Pendulum-v1` and `Tracking-v0`
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for name in ["Pendulum-v0", "Pendulum-v1"] {
            registry.register(name, || {
                Box::new(TimeLimit::new(PendulumEnv::new(), PENDULUM_MAX_STEPS))
            });
        }
        registry.register("Tracking-v0", || Box::new(TrackingEnv::new()));
        registry
    }

    /// Register an environment, replacing any previous entry of that name
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F)
    where
        F: Fn() -> BoxedEnv + Send + Sync + 'static,
    {
        self.envs.insert(name.into(), Box::new(constructor));
    }

    /// Create an environment by name, seeding it when `seed` is given
    pub fn make(&self, name: &str, seed: Option<u64>) -> Result<BoxedEnv> {
        let constructor = self
            .envs
            .get(name)
            .ok_or_else(|| DdpgError::Environment(format!("Unknown environment: {name}")))?;
        let mut env = constructor();
        if let Some(seed) = seed {
            env.seed(seed);
        }
        debug!(name, ?seed, "created environment");
        Ok(env)
    }

    /// Registered names, sorted
    #[must_use]
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.envs.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for EnvRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Create a built-in environment by name
pub fn make_env(name: &str, seed: Option<u64>) -> Result<BoxedEnv> {
    EnvRegistry::with_builtins().make(name, seed)
}
