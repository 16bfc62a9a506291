// ============================================================
// Layer 3 — Error Taxonomy
// ============================================================
// Every library-level failure surfaces as a ClfError.
// Nothing in the pipeline retries: errors propagate straight
// to the caller, and only the CLI layer wraps them in anyhow
// context for display.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClfError {
    /// Input to cleaning / tokenisation was not text
    #[error("input is not valid text: {0}")]
    InputType(String),

    /// Predicted and true label sequences cannot be scored
    #[error("cannot compute metrics: {0}")]
    MetricInput(String),

    /// Inference or save attempted before any model was promoted
    #[error("no trained model available; run tuning or load an artifact first")]
    NotTrained,

    /// Accelerator, pretrained weights or tokenizer could not be reached
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A persisted artifact is malformed or from another format version
    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ClfError>;
