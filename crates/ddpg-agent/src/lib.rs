//! Deep Deterministic Policy Gradient for continuous control
//!
//! This crate provides the DDPG algorithm and its building blocks:
//! - Fixed-capacity experience replay
//! - Ornstein-Uhlenbeck exploration noise with decaying volatility
//! - Actor and critic networks on `ndarray` with hand-written backpropagation
//! - Target networks tracked by soft (Polyak) updates
//! - Training and evaluation loops with moving-average reward reporting

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod actor;
pub mod buffer;
pub mod critic;
pub mod ddpg;
pub mod network;
pub mod noise;
pub mod optim;
pub mod runner;
pub mod target;
pub mod utils;

// Re-export the agent
pub use ddpg::{DdpgAgent, DdpgConfig, UpdateObserver, UpdatePhase, UpdateStats};

// Re-export components
pub use actor::Actor;
pub use buffer::{Batch, ReplayBuffer};
pub use critic::Critic;
pub use network::{Activation, Mlp, MlpConfig};
pub use noise::{NoiseConfig, OuNoise, OuState};
pub use optim::Adam;
pub use target::SoftUpdate;

// Re-export loops and utilities
pub use runner::{test, train, RewardHistory, TrainConfig};
pub use utils::{LinearSchedule, Schedule};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DdpgAgent, DdpgConfig, NoiseConfig, ReplayBuffer, RewardHistory, TrainConfig, UpdateStats,
    };
    pub use ddpg_core::prelude::*;
}
