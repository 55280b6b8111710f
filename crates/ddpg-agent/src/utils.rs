//! Utility functions and helpers for the agent

/// Trait for schedules (e.g., for exploration decay)
pub trait Schedule: Send + Sync {
    /// Get value at step t
    fn value(&self, t: usize) -> f64;
}

/// Linear schedule that decays from start to end over steps
#[derive(Debug, Clone, PartialEq)]
pub struct LinearSchedule {
    /// Starting value
    pub start: f64,
    /// Ending value
    pub end: f64,
    /// Number of steps for decay
    pub steps: usize,
}

impl LinearSchedule {
    /// Create a new linear schedule
    #[must_use]
    pub fn new(start: f64, end: f64, steps: usize) -> Self {
        Self { start, end, steps }
    }
}

impl Schedule for LinearSchedule {
    #[allow(clippy::cast_precision_loss)]
    fn value(&self, t: usize) -> f64 {
        if t >= self.steps {
            self.end
        } else {
            let progress = t as f64 / self.steps as f64;
            self.start - (self.start - self.end) * progress
        }
    }
}

/// Polyak averaging for target network updates
#[inline]
#[must_use]
pub fn polyak_update(target_weight: f64, source_weight: f64, tau: f64) -> f64 {
    tau * source_weight + (1.0 - tau) * target_weight
}

/// Exponential moving average used for reward reporting:
/// `0.9 * previous + 0.1 * value`, or `value` when there is no previous entry.
#[must_use]
pub fn smoothed(previous: Option<f64>, value: f64) -> f64 {
    match previous {
        Some(prev) => 0.9 * prev + 0.1 * value,
        None => value,
    }
}
