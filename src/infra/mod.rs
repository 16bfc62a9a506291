// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem on behalf of the
// other layers:
//
//   checkpoint.rs      — model artifact (manifest + weights)
//                        and run configuration JSON
//
//   tokenizer_store.rs — tokenizer.json: load a pretrained one
//                        or build a word-level vocabulary from
//                        the training corpus
//
//   metrics.rs         — per-epoch CSV log and trial history
//
// Reference: Rust Book §7 (Modules)
//            Burn Book §5 (Checkpointing)

/// Model artifact saving and loading
pub mod checkpoint;

/// Tokenizer building, saving, and loading
pub mod tokenizer_store;

/// Tuning metrics CSV / JSON logger
pub mod metrics;
