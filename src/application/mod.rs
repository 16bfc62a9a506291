// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Workflow coordination only: each use case wires the data,
// ml and infra layers together for one CLI command. No model
// math and no printing here.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

/// Hyperparameter search and best-model export
pub mod tune_use_case;

/// Single-text inference from a saved artifact
pub mod predict_use_case;

/// Metrics of a saved artifact on a labelled CSV
pub mod evaluate_use_case;
