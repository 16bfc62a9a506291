// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types and traits that define what the system
// works with: labelled examples, classification tasks,
// hyperparameter draws and the error taxonomy.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain structs, enums and traits
//
// Reference: Rust Book §5 (Structs), §10 (Traits)

// Raw / cleaned / label-encoded examples and the two tasks
pub mod example;

// Hyperparameter search space and per-trial draws
pub mod hyperparams;

// Error taxonomy shared by every layer below the CLI
pub mod error;

// Core abstractions (traits) that other layers implement
pub mod traits;
