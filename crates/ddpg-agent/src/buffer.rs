//! Experience replay buffer

use std::collections::VecDeque;

use ndarray::{Array1, Array2};
use rand::Rng;

use ddpg_core::Transition;

/// Fixed-capacity FIFO replay buffer.
///
/// Once full, every push evicts the oldest transition, so the buffer always
/// holds the most recent `capacity` transitions.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    /// Buffer storage, oldest first
    buffer: VecDeque<Transition>,
    /// Maximum capacity
    capacity: usize,
}

impl ReplayBuffer {
    /// Create a new replay buffer
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a transition, evicting the oldest one when full
    pub fn push(&mut self, transition: Transition) {
        if self.capacity == 0 {
            return;
        }
        if self.buffer.len() >= self.capacity {
            self.buffer.pop_front();
        }
        self.buffer.push_back(transition);
    }

    /// Sample `batch_size` transitions uniformly at random.
    ///
    /// Indices are drawn independently, so a batch may contain the same
    /// transition more than once. Returns `None` while the buffer holds fewer
    /// than `batch_size` transitions.
    pub fn sample<R: Rng + ?Sized>(&self, batch_size: usize, rng: &mut R) -> Option<Vec<Transition>> {
        if batch_size == 0 || self.buffer.len() < batch_size {
            return None;
        }

        let batch = (0..batch_size)
            .map(|_| self.buffer[rng.gen_range(0..self.buffer.len())].clone())
            .collect();
        Some(batch)
    }

    /// Get the current size of the buffer
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if buffer is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Maximum number of stored transitions
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Stored transitions, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.buffer.iter()
    }

    /// Drop every stored transition, keeping the capacity
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

/// Sampled transitions stacked into matrices, one row per transition
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// `[batch, n_states]`
    pub states: Array2<f64>,
    /// `[batch, n_actions]`
    pub actions: Array2<f64>,
    /// `[batch]`
    pub rewards: Array1<f64>,
    /// `[batch, n_states]`
    pub next_states: Array2<f64>,
    /// `[batch]`
    pub dones: Array1<bool>,
}

impl Batch {
    /// Stack transitions. All transitions must share the same state and action
    /// lengths (the agent checks this when they are stored).
    #[must_use]
    pub fn from_transitions(transitions: &[Transition]) -> Self {
        let n = transitions.len();
        let state_dim = transitions.first().map_or(0, |t| t.state.len());
        let action_dim = transitions.first().map_or(0, |t| t.action.len());

        let mut states = Array2::zeros((n, state_dim));
        let mut actions = Array2::zeros((n, action_dim));
        let mut next_states = Array2::zeros((n, state_dim));
        for (i, t) in transitions.iter().enumerate() {
            states.row_mut(i).assign(&Array1::from(t.state.clone()));
            actions.row_mut(i).assign(&Array1::from(t.action.clone()));
            next_states.row_mut(i).assign(&Array1::from(t.next_state.clone()));
        }

        Self {
            states,
            actions,
            rewards: transitions.iter().map(|t| t.reward).collect(),
            next_states,
            dones: transitions.iter().map(|t| t.done).collect(),
        }
    }

    /// Number of transitions in the batch
    #[must_use]
    pub fn len(&self) -> usize {
        self.rewards.len()
    }

    /// Whether the batch is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rewards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn transition(i: usize) -> Transition {
        #[allow(clippy::cast_precision_loss)]
        let x = i as f64;
        Transition::new(vec![x, -x], vec![x / 10.0], x, vec![x + 1.0, -x - 1.0], i % 3 == 0)
    }

    #[test]
    fn push_and_len() {
        let mut buffer = ReplayBuffer::new(4);
        assert!(buffer.is_empty());
        for i in 0..3 {
            buffer.push(transition(i));
        }
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn overwrites_oldest_when_full() {
        let mut buffer = ReplayBuffer::new(3);
        for i in 0..5 {
            buffer.push(transition(i));
        }
        let rewards: Vec<f64> = buffer.iter().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn clear_empties_but_keeps_capacity() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut buffer = ReplayBuffer::new(3);
        for i in 0..3 {
            buffer.push(transition(i));
        }
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.capacity(), 3);
        assert!(buffer.sample(1, &mut rng).is_none());

        for i in 5..9 {
            buffer.push(transition(i));
        }
        let rewards: Vec<f64> = buffer.iter().map(|t| t.reward).collect();
        assert_eq!(rewards, vec![6.0, 7.0, 8.0]);
    }

    #[test]
    fn sample_requires_enough_data() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut buffer = ReplayBuffer::new(5);
        for i in 0..3 {
            buffer.push(transition(i));
        }
        assert!(buffer.sample(10, &mut rng).is_none());
        assert!(buffer.sample(4, &mut rng).is_none());
        assert!(buffer.sample(0, &mut rng).is_none());

        let batch = buffer.sample(3, &mut rng).unwrap();
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|t| buffer.iter().any(|s| s == t)));
    }

    #[test]
    fn sample_covers_whole_buffer() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut buffer = ReplayBuffer::new(8);
        for i in 0..8 {
            buffer.push(transition(i));
        }
        let mut seen = [false; 8];
        for _ in 0..200 {
            for t in buffer.sample(4, &mut rng).unwrap() {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let idx = t.reward as usize;
                seen[idx] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn batch_stacks_rows() {
        let transitions: Vec<_> = (0..3).map(transition).collect();
        let batch = Batch::from_transitions(&transitions);
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.states.dim(), (3, 2));
        assert_eq!(batch.actions.dim(), (3, 1));
        assert_eq!(batch.states[[2, 1]], -2.0);
        assert_eq!(batch.next_states[[1, 0]], 2.0);
        assert_eq!(batch.rewards.to_vec(), vec![0.0, 1.0, 2.0]);
        assert_eq!(batch.dones.to_vec(), vec![true, false, false]);
    }

    proptest! {
        #[test]
        fn length_is_min_of_capacity_and_pushes(capacity in 1usize..32, pushes in 0usize..128) {
            let mut buffer = ReplayBuffer::new(capacity);
            for i in 0..pushes {
                buffer.push(transition(i));
            }
            prop_assert_eq!(buffer.len(), capacity.min(pushes));
            if pushes > capacity {
                // the (pushes - capacity + 1)-th insert, zero-based index pushes - capacity
                #[allow(clippy::cast_precision_loss)]
                let oldest = (pushes - capacity) as f64;
                prop_assert_eq!(buffer.iter().next().map(|t| t.reward), Some(oldest));
            }
        }
    }
}
