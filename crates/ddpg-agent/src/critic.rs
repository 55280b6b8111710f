//! Action-value network `Q(s, a)`

use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

use ddpg_core::{DdpgError, Result};

use crate::network::{Activation, ForwardCache, Gradients, Mlp, MlpConfig};

/// Critic over the concatenated input `[state, action]`, with ReLU hidden
/// layers and a single linear output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Critic {
    net: Mlp,
    n_states: usize,
    n_actions: usize,
}

impl Critic {
    /// Freshly initialised critic
    pub fn new<R: Rng + ?Sized>(n_states: usize, n_actions: usize, hidden_dim: usize, init_w: f64, rng: &mut R) -> Self {
        let net = MlpConfig {
            input_dim: n_states + n_actions,
            hidden_dims: vec![hidden_dim, hidden_dim],
            output_dim: 1,
            hidden_activation: Activation::Relu,
            output_activation: Activation::Identity,
            init_w,
        }
        .init(rng);
        Self { net, n_states, n_actions }
    }

    /// State dimension
    #[must_use]
    pub fn n_states(&self) -> usize {
        self.n_states
    }

    /// Action dimension
    #[must_use]
    pub fn n_actions(&self) -> usize {
        self.n_actions
    }

    fn join(&self, states: ArrayView2<f64>, actions: ArrayView2<f64>) -> Array2<f64> {
        debug_assert_eq!(states.nrows(), actions.nrows());
        let mut input = Array2::zeros((states.nrows(), self.n_states + self.n_actions));
        input.slice_mut(s![.., ..self.n_states]).assign(&states);
        input.slice_mut(s![.., self.n_states..]).assign(&actions);
        input
    }

    /// Batched Q-values, one per row
    #[must_use]
    pub fn q_values(&self, states: ArrayView2<f64>, actions: ArrayView2<f64>) -> Array1<f64> {
        self.net
            .forward(self.join(states, actions).view())
            .index_axis_move(Axis(1), 0)
    }

    /// Q-values plus the intermediates needed by [`Critic::backward`]
    #[must_use]
    pub fn forward_cached(&self, states: ArrayView2<f64>, actions: ArrayView2<f64>) -> (Array1<f64>, ForwardCache) {
        let (q, cache) = self.net.forward_cached(self.join(states, actions).view());
        (q.index_axis_move(Axis(1), 0), cache)
    }

    /// Backpropagate `dL/dQ` (one entry per row).
    ///
    /// Returns the parameter gradients and `dL/d(action)`, `[batch, n_actions]`.
    #[must_use]
    pub fn backward(&self, cache: &ForwardCache, grad_q: &Array1<f64>) -> (Gradients, Array2<f64>) {
        let grad_output = grad_q.clone().insert_axis(Axis(1));
        let (grads, input_grad) = self.net.backward(cache, grad_output);
        let action_grad = input_grad.slice(s![.., self.n_states..]).to_owned();
        (grads, action_grad)
    }

    /// Q-value of a single state-action pair
    pub fn value(&self, state: &[f64], action: &[f64]) -> Result<f64> {
        DdpgError::check_dim(self.n_states, state.len())?;
        DdpgError::check_dim(self.n_actions, action.len())?;
        let states = ArrayView1::from(state).insert_axis(Axis(0));
        let actions = ArrayView1::from(action).insert_axis(Axis(0));
        Ok(self.q_values(states, actions)[0])
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};

    fn critic() -> Critic {
        Critic::new(2, 1, 8, 0.5, &mut StdRng::seed_from_u64(9))
    }

    #[test]
    fn q_values_per_row() {
        let critic = critic();
        let states = array![[0.1, 0.2], [0.3, -0.4], [1.0, 0.0]];
        let actions = array![[0.5], [-0.5], [0.0]];
        let q = critic.q_values(states.view(), actions.view());
        assert_eq!(q.len(), 3);
        assert_relative_eq!(q[1], critic.value(&[0.3, -0.4], &[-0.5]).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn action_gradient_matches_finite_differences() {
        let critic = critic();
        let states = array![[0.1, 0.2], [0.3, -0.4]];
        let actions = array![[0.5], [-0.25]];
        let (_, cache) = critic.forward_cached(states.view(), actions.view());
        let (_, action_grad) = critic.backward(&cache, &array![1.0, 1.0]);
        assert_eq!(action_grad.dim(), (2, 1));

        let eps = 1e-6;
        for row in 0..2 {
            let state = states.row(row).to_vec();
            let a = actions[[row, 0]];
            let numeric = (critic.value(&state, &[a + eps]).unwrap()
                - critic.value(&state, &[a - eps]).unwrap())
                / (2.0 * eps);
            assert_relative_eq!(action_grad[[row, 0]], numeric, epsilon = 1e-6);
        }
    }

    #[test]
    fn value_checks_lengths() {
        let critic = critic();
        assert!(matches!(
            critic.value(&[0.0], &[0.0]),
            Err(DdpgError::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            critic.value(&[0.0, 0.0], &[0.0, 1.0]),
            Err(DdpgError::DimensionMismatch { expected: 1, actual: 2 })
        ));
    }
}
