//! Policy abstractions for action selection

use crate::Result;

/// Deterministic policy that always returns the same action for a given state
pub trait DeterministicPolicy {
    /// Length of the state vectors accepted by [`DeterministicPolicy::act`]
    fn state_dim(&self) -> usize;

    /// Length of the produced action vectors
    fn action_dim(&self) -> usize;

    /// Get the deterministic action for a state
    fn act(&self, state: &[f64]) -> Result<Vec<f64>>;
}
