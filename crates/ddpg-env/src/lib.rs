//! Continuous-control environments for DDPG training
//!
//! This crate provides:
//! - The classic Pendulum swing-up task
//! - A one-dimensional tracking task for quick learning checks
//! - Action normalization and time limit wrappers
//! - A name-based registry

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod classic;
pub mod registry;
pub mod tracking;
pub mod wrappers;

// Re-export environments
pub use classic::{angle_normalize, PendulumConfig, PendulumEnv};
pub use registry::{make_env, BoxedEnv, EnvRegistry};
pub use tracking::TrackingEnv;
pub use wrappers::{NormalizedActions, TimeLimit};

// Re-export core types
pub use ddpg_core::{BoxSpace, Environment, Step, StepInfo};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{make_env, EnvRegistry, NormalizedActions, PendulumEnv, TimeLimit, TrackingEnv};
    pub use ddpg_core::prelude::*;
}
