//! Environment trait and step types

use serde::{Deserialize, Serialize};

use crate::{BoxSpace, Result};

/// Result of a single environment step
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    /// Observation after the action was applied
    pub observation: Vec<f64>,
    /// Reward signal
    pub reward: f64,
    /// Whether the episode is done
    pub done: bool,
    /// Whether the episode was cut by a time limit (implies `done`)
    pub truncated: bool,
    /// Additional info from the environment
    pub info: StepInfo,
}

impl Step {
    /// Non-terminal step without extra info
    #[must_use]
    pub fn new(observation: Vec<f64>, reward: f64) -> Self {
        Self {
            observation,
            reward,
            done: false,
            truncated: false,
            info: StepInfo::default(),
        }
    }

    /// Mark the step as terminal
    #[must_use]
    pub fn terminal(mut self, done: bool) -> Self {
        self.done = done;
        self
    }
}

/// Additional information from a step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Custom fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl StepInfo {
    /// Insert a field, returning the info for chaining
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// Continuous-control environment.
///
/// Observations and actions are fixed-length real vectors whose lengths are
/// given by [`Environment::observation_space`] and [`Environment::action_space`].
/// Errors raised by `reset` or `step` are not recovered by the training loop.
pub trait Environment {
    /// Bounds of the observation vector
    fn observation_space(&self) -> BoxSpace;

    /// Bounds of the action vector accepted by [`Environment::step`]
    fn action_space(&self) -> BoxSpace;

    /// Reset the environment and return the initial observation
    fn reset(&mut self) -> Result<Vec<f64>>;

    /// Apply an action and advance one step
    fn step(&mut self, action: &[f64]) -> Result<Step>;

    /// Render the environment (optional)
    fn render(&self) -> Result<()> {
        Ok(())
    }

    /// Close the environment
    fn close(&mut self) -> Result<()> {
        Ok(())
    }

    /// Reseed the environment's random number generator
    fn seed(&mut self, seed: u64);
}

impl<E: Environment + ?Sized> Environment for Box<E> {
    fn observation_space(&self) -> BoxSpace {
        (**self).observation_space()
    }

    fn action_space(&self) -> BoxSpace {
        (**self).action_space()
    }

    fn reset(&mut self) -> Result<Vec<f64>> {
        (**self).reset()
    }

    fn step(&mut self, action: &[f64]) -> Result<Step> {
        (**self).step(action)
    }

    fn render(&self) -> Result<()> {
        (**self).render()
    }

    fn close(&mut self) -> Result<()> {
        (**self).close()
    }

    fn seed(&mut self, seed: u64) {
        (**self).seed(seed);
    }
}
