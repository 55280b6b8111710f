//! Stored experience

use serde::{Deserialize, Serialize};

/// Single environment transition `(s, a, r, s', done)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    /// State the action was taken in
    pub state: Vec<f64>,
    /// Action taken (normalized action space)
    pub action: Vec<f64>,
    /// Reward received
    pub reward: f64,
    /// Resulting state
    pub next_state: Vec<f64>,
    /// Whether the episode ended with this transition
    pub done: bool,
}

impl Transition {
    /// Create a new transition
    #[must_use]
    pub fn new(state: Vec<f64>, action: Vec<f64>, reward: f64, next_state: Vec<f64>, done: bool) -> Self {
        Self {
            state,
            action,
            reward,
            next_state,
            done,
        }
    }
}
