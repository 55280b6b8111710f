//! Bounded continuous spaces for observations and actions

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{DdpgError, Result};

/// Box space: a product of closed intervals `[low[i], high[i]]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    /// Lower bounds for each dimension
    pub low: Vec<f64>,
    /// Upper bounds for each dimension
    pub high: Vec<f64>,
}

impl BoxSpace {
    /// Create a new box space
    pub fn new(low: Vec<f64>, high: Vec<f64>) -> Result<Self> {
        DdpgError::check_dim(low.len(), high.len())?;
        if let Some(i) = low.iter().zip(&high).position(|(l, h)| l > h || l.is_nan() || h.is_nan()) {
            return Err(DdpgError::InvalidConfig(format!(
                "box bound {i} is empty: [{}, {}]",
                low[i], high[i]
            )));
        }
        Ok(Self { low, high })
    }

    /// Symmetric box `[-bound, bound]^dim`
    #[must_use]
    pub fn symmetric(dim: usize, bound: f64) -> Self {
        Self {
            low: vec![-bound; dim],
            high: vec![bound; dim],
        }
    }

    /// Get the dimensionality of the space
    #[must_use]
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Check if a vector lies inside the space
    #[must_use]
    pub fn contains(&self, x: &[f64]) -> bool {
        x.len() == self.low.len()
            && x
                .iter()
                .zip(&self.low)
                .zip(&self.high)
                .all(|((x, l), h)| x >= l && x <= h)
    }

    /// Clip a vector elementwise into the space
    #[must_use]
    pub fn clip(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(&self.low)
            .zip(&self.high)
            .map(|((x, l), h)| x.clamp(*l, *h))
            .collect()
    }

    /// Sample a point uniformly; unbounded dimensions are sampled from `[-1, 1]`
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<f64> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&l, &h)| {
                if l.is_finite() && h.is_finite() {
                    if l < h {
                        rng.gen_range(l..=h)
                    } else {
                        l
                    }
                } else {
                    rng.gen_range(-1.0..=1.0)
                }
            })
            .collect()
    }
}
