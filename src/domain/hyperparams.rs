// ============================================================
// Layer 3 — Hyperparameter Search Space
// ============================================================
// Each trial draws one HyperparameterDraw from the space:
//   batch_size    — categorical, default {8, 16, 32}
//   learning_rate — continuous, log-uniform in [1e-5, 5e-5]
//
// Log-uniform means ln(lr) is uniform, so each decade of the
// range is sampled equally often.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ClfError, Result};

/// One trial's hyperparameters. Fixed for the trial's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HyperparameterDraw {
    pub batch_size:    usize,
    pub learning_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpace {
    pub batch_sizes: Vec<usize>,
    pub lr_low:      f64,
    pub lr_high:     f64,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            batch_sizes: vec![8, 16, 32],
            lr_low:      1e-5,
            lr_high:     5e-5,
        }
    }
}

impl SearchSpace {
    pub fn new(batch_sizes: Vec<usize>, lr_low: f64, lr_high: f64) -> Result<Self> {
        let space = Self { batch_sizes, lr_low, lr_high };
        space.validate()?;
        Ok(space)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_sizes.is_empty() || self.batch_sizes.contains(&0) {
            return Err(ClfError::Config(
                "batch size choices must be non-empty and positive".to_string(),
            ));
        }
        if !(self.lr_low > 0.0 && self.lr_low <= self.lr_high) {
            return Err(ClfError::Config(format!(
                "learning rate range [{}, {}] must satisfy 0 < low <= high",
                self.lr_low, self.lr_high
            )));
        }
        Ok(())
    }

    /// Draw a batch size uniformly and a learning rate log-uniformly.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> HyperparameterDraw {
        let batch_size = self.batch_sizes.choose(rng).copied().unwrap_or(16);

        let (lo, hi) = (self.lr_low.ln(), self.lr_high.ln());
        let learning_rate = if hi > lo {
            rng.gen_range(lo..hi).exp()
        } else {
            self.lr_low
        };

        HyperparameterDraw {
            batch_size,
            // exp(ln(x)) can land a hair outside the range
            learning_rate: learning_rate.clamp(self.lr_low, self.lr_high),
        }
    }
}
