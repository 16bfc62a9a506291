// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// All Burn model, training and tuning code lives here.
//
//   model.rs      — transformer encoder + classification head
//   trainer.rs    — one epoch over a data loader (Train / Eval)
//   evaluator.rs  — accuracy, precision, recall, F1
//   tuner.rs      — hyperparameter search, pruning, best-model
//                   tracking (backend-agnostic)
//   objective.rs  — the Burn fine-tuning run behind each trial
//   predictor.rs  — inference on raw text + artifact save/load
//
// Reference: Burn Book §3 (Building Blocks), §5 (Training)
//            Devlin et al. (2019) BERT

/// Transformer text classifier architecture
pub mod model;

/// Single-epoch training / evaluation pass
pub mod trainer;

/// Classification metrics
pub mod evaluator;

/// Trial loop, sampler and pruners
pub mod tuner;

/// Burn-backed tuning objective
pub mod objective;

/// Inference on raw text and model persistence
pub mod predictor;
