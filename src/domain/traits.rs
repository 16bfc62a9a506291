// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The application layer programs against these traits so the
// concrete loader / classifier can be swapped without touching
// the workflow code.
//
// Reference: Rust Book §10 (Traits: Defining Shared Behaviour)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::error::Result;
use crate::domain::example::Example;

// ─── DatasetSource ────────────────────────────────────────────────────────────
/// Any component that can produce labelled examples.
///
/// Implementations:
///   - CsvLoader → reads a delimited file with a header row
pub trait DatasetSource {
    fn load_all(&self) -> Result<Vec<Example>>;
}

// ─── TextClassifier ───────────────────────────────────────────────────────────
/// Output of a single-example prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Softmax probability per class name
    pub probabilities: BTreeMap<String, f32>,
    /// Class with the highest probability
    pub label: String,
    /// Probability of `label`
    pub confidence: f32,
}

/// Any component that can classify one piece of raw text.
pub trait TextClassifier {
    fn predict(&self, text: &str) -> Result<Prediction>;
}
