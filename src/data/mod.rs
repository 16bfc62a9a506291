// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from the dataset file to tensor batches:
//
//   CSV file
//       │
//       ▼
//   CsvLoader         → reads (text, label) rows
//       │
//       ▼
//   TextCleaner       → strips tags, URLs, mentions, stopwords
//       │
//       ▼
//   Task::encode_label → label string → class index
//       │
//       ▼
//   split_train_val   → seeded train / validation split
//       │
//       ▼
//   ClfDataset        → Burn Dataset, tokenises on demand
//       │
//       ▼
//   ClfBatcher        → stacks examples into tensor batches
//
// Reference: Burn Book §4 (Datasets and Dataloaders)

/// Reads labelled rows from CSV files
pub mod loader;

/// Deterministic text normalisation
pub mod cleaner;

/// Fixed-length encoding and Burn's Dataset trait
pub mod dataset;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

/// Shuffles and splits data into train/validation sets
pub mod splitter;
