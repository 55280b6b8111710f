//! Deterministic policy network `mu(s)`

use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use ddpg_core::{DdpgError, DeterministicPolicy, Result};

use crate::network::{Activation, ForwardCache, Gradients, Mlp, MlpConfig};

/// Actor: `n_states -> hidden -> hidden -> n_actions` with ReLU hidden layers
/// and a `tanh` output, so every action component lies in `[-1, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    net: Mlp,
}

impl Actor {
    /// Freshly initialised actor
    pub fn new<R: Rng + ?Sized>(n_states: usize, n_actions: usize, hidden_dim: usize, init_w: f64, rng: &mut R) -> Self {
        let net = MlpConfig {
            input_dim: n_states,
            hidden_dims: vec![hidden_dim, hidden_dim],
            output_dim: n_actions,
            hidden_activation: Activation::Relu,
            output_activation: Activation::Tanh,
            init_w,
        }
        .init(rng);
        Self { net }
    }

    /// Batched forward pass, `[batch, n_states] -> [batch, n_actions]`
    #[must_use]
    pub fn forward(&self, states: ArrayView2<f64>) -> Array2<f64> {
        self.net.forward(states)
    }

    /// Forward pass keeping intermediates for [`Actor::backward`]
    #[must_use]
    pub fn forward_cached(&self, states: ArrayView2<f64>) -> (Array2<f64>, ForwardCache) {
        self.net.forward_cached(states)
    }

    /// Parameter gradients given `dL/d(action)`
    #[must_use]
    pub fn backward(&self, cache: &ForwardCache, grad_actions: Array2<f64>) -> Gradients {
        self.net.backward(cache, grad_actions).0
    }

    /// Underlying network
    #[must_use]
    pub fn network(&self) -> &Mlp {
        &self.net
    }

    /// Mutable access for optimizers and target updates
    pub fn network_mut(&mut self) -> &mut Mlp {
        &mut self.net
    }
}

impl DeterministicPolicy for Actor {
    fn state_dim(&self) -> usize {
        self.net.input_dim()
    }

    fn action_dim(&self) -> usize {
        self.net.output_dim()
    }

    fn act(&self, state: &[f64]) -> Result<Vec<f64>> {
        DdpgError::check_dim(self.state_dim(), state.len())?;
        let input = ArrayView1::from(state).insert_axis(Axis(0));
        Ok(self.forward(input).row(0).to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn actions_are_bounded() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut actor = Actor::new(3, 2, 16, 3e-3, &mut rng);
        // blow the output layer up so tanh saturates
        actor.network_mut().layers.last_mut().unwrap().weight.mapv_inplace(|w| w * 1e4);

        let states = array![[10.0, -5.0, 3.0], [-100.0, 50.0, 0.0]];
        let actions = actor.forward(states.view());
        assert_eq!(actions.dim(), (2, 2));
        assert!(actions.iter().all(|a| (-1.0..=1.0).contains(a)));
    }

    #[test]
    fn initial_actions_are_small() {
        let mut rng = StdRng::seed_from_u64(1);
        let actor = Actor::new(3, 1, 32, 3e-3, &mut rng);
        let action = actor.act(&[0.2, -0.4, 0.9]).unwrap();
        assert_eq!(action.len(), 1);
        assert!(action[0].abs() < 0.5);
    }

    #[test]
    fn act_checks_state_length() {
        let mut rng = StdRng::seed_from_u64(2);
        let actor = Actor::new(3, 1, 8, 3e-3, &mut rng);
        assert_eq!(actor.state_dim(), 3);
        assert_eq!(actor.action_dim(), 1);
        assert!(matches!(
            actor.act(&[0.0, 1.0]),
            Err(DdpgError::DimensionMismatch { expected: 3, actual: 2 })
        ));
    }
}
