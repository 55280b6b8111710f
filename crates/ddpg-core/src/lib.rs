//! Core reinforcement learning traits and types for continuous control
//!
//! This crate provides the shared vocabulary used by the DDPG agent, the
//! environments and the command-line trainer: bounded vector spaces, the
//! environment contract, stored transitions and the error type.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod environment;
pub mod error;
pub mod policy;
pub mod space;
pub mod trajectory;

// Re-export core traits and types
pub use environment::{Environment, Step, StepInfo};
pub use error::{DdpgError, Result};
pub use policy::DeterministicPolicy;
pub use space::BoxSpace;
pub use trajectory::Transition;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        BoxSpace, DdpgError, DeterministicPolicy, Environment, Result, Step, StepInfo, Transition,
    };
}
