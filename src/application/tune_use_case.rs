// ============================================================
// Layer 2 — TuneUseCase
// ============================================================
// Orchestrates the full fine-tuning pipeline in order:
//
//   Step 1: Load and clean CSV rows       (Layer 4 - data)
//   Step 2: Encode labels                 (Layer 3 - domain)
//   Step 3: Seeded train/validation split (Layer 4 - data)
//   Step 4: Tokenizer: pretrained or built from corpus (Layer 6)
//   Step 5: Model config + datasets       (Layer 5 / 4)
//   Step 6: Save run config               (Layer 6 - infra)
//   Step 7: Hyperparameter search         (Layer 5 - ml)
//   Step 8: Save the best model artifact  (Layer 5 / 6)
//
// Reference: Burn Book §5 (Training)

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use burn::{backend::{Autodiff, Wgpu}, tensor::backend::AutodiffBackend};
use serde::{Deserialize, Serialize};

use crate::data::{
    cleaner::TextCleaner,
    dataset::{ClfDataset, SequenceEncoder},
    loader::CsvLoader,
    splitter::split_train_val,
};
use crate::domain::example::{LabeledText, Task};
use crate::domain::hyperparams::SearchSpace;
use crate::domain::traits::DatasetSource;
use crate::infra::{
    checkpoint::ArtifactStore,
    metrics::TrialLogger,
    tokenizer_store::TokenizerStore,
};
use crate::ml::{
    model::{ClassifierConfig, TextEncoderConfig},
    objective::FineTuneObjective,
    predictor::Predictor,
    tuner::{BestTrial, MedianPruner, TrialRecord, Tuner, TunerConfig},
};

pub const TUNE_CONFIG_FILE: &str = "tune_config.json";

// ─── Tuning Configuration ────────────────────────────────────────────────────
// Everything a run needs. Saved next to the artifact so a run
// can be reproduced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuneConfig {
    pub data_path:    String,
    pub task:         Task,
    /// Defaults to the task's standard column names
    pub text_column:  Option<String>,
    pub label_column: Option<String>,
    pub limit:        Option<usize>,
    pub output_dir:   String,
    /// Directory of a saved artifact to start every trial from
    pub pretrained:   Option<String>,
    pub max_length:   usize,
    pub vocab_size:   usize,
    pub val_fraction: f64,
    pub seed:         u64,
    pub n_trials:     usize,
    pub epochs:       usize,
    pub batch_sizes:  Vec<usize>,
    pub lr_low:       f64,
    pub lr_high:      f64,
    pub n_startup_trials: usize,
    pub n_warmup_epochs:  usize,
    pub d_model:      usize,
    pub num_heads:    usize,
    pub num_layers:   usize,
    pub d_ff:         usize,
    pub dropout:      f64,
}

impl Default for TuneConfig {
    fn default() -> Self {
        Self {
            data_path:    "data/reviews.csv".to_string(),
            task:         Task::Sentiment,
            text_column:  None,
            label_column: None,
            limit:        None,
            output_dir:   "artifacts".to_string(),
            pretrained:   None,
            max_length:   128,
            vocab_size:   20_000,
            val_fraction: 0.2,
            seed:         42,
            n_trials:     10,
            epochs:       3,
            batch_sizes:  vec![8, 16, 32],
            lr_low:       1e-5,
            lr_high:      5e-5,
            n_startup_trials: 2,
            n_warmup_epochs:  1,
            d_model:      256,
            num_heads:    4,
            num_layers:   4,
            d_ff:         1024,
            dropout:      0.1,
        }
    }
}

/// What a finished run reports back to the CLI.
#[derive(Debug, Clone)]
pub struct TuneSummary {
    pub history:  Vec<TrialRecord>,
    pub best:     Option<BestTrial>,
    /// Where the best model was saved, if any trial completed
    pub artifact: Option<PathBuf>,
}

// ─── TuneUseCase ──────────────────────────────────────────────────────────────
pub struct TuneUseCase {
    config: TuneConfig,
}

impl TuneUseCase {
    pub fn new(config: TuneConfig) -> Self {
        Self { config }
    }

    /// Run on the GPU backend.
    pub fn execute(&self) -> Result<TuneSummary> {
        self.run::<Autodiff<Wgpu>>(Default::default())
    }

    pub fn run<B: AutodiffBackend>(&self, device: B::Device) -> Result<TuneSummary> {
        let cfg  = &self.config;
        let task = cfg.task;

        if !(0.0..1.0).contains(&cfg.val_fraction) || cfg.val_fraction == 0.0 {
            bail!("--val-fraction must be in (0, 1), got {}", cfg.val_fraction);
        }

        // ── Step 1: Load and clean rows ──────────────────────────────────────
        let text_column  = cfg.text_column.clone().unwrap_or_else(|| task.text_column().to_string());
        let label_column = cfg.label_column.clone().unwrap_or_else(|| task.label_column().to_string());
        tracing::info!("Loading '{}' ({} task)", cfg.data_path, task);
        let rows = CsvLoader::new(&cfg.data_path, text_column, label_column)
            .with_limit(cfg.limit)
            .with_cleaner(TextCleaner::new())
            .load_all()
            .with_context(|| format!("cannot load dataset '{}'", cfg.data_path))?;
        tracing::info!("Loaded {} rows", rows.len());

        // ── Step 2: Encode labels ────────────────────────────────────────────
        let samples = rows
            .into_iter()
            .map(|row| {
                let label = task.encode_label(&row.label)?;
                Ok(LabeledText { text: row.text, label })
            })
            .collect::<crate::domain::error::Result<Vec<_>>>()?;

        // ── Step 3: Split ────────────────────────────────────────────────────
        let (train, valid) = split_train_val(samples, 1.0 - cfg.val_fraction, cfg.seed);
        if train.is_empty() || valid.is_empty() {
            bail!(
                "split produced {} train / {} validation examples; need at least one of each",
                train.len(),
                valid.len()
            );
        }
        tracing::info!("Split: {} train, {} validation", train.len(), valid.len());

        // ── Step 4: Tokenizer ────────────────────────────────────────────────
        let (tokenizer, pretrained_encoder) = match &cfg.pretrained {
            Some(dir) => {
                tracing::info!("Using pretrained encoder from '{dir}'");
                let manifest  = ArtifactStore::new(dir).load_manifest()?;
                let tokenizer = TokenizerStore::new(dir).load()?;
                (tokenizer, Some(manifest.model.encoder))
            }
            None => {
                let texts: Vec<String> = train.iter().map(|s| s.text.clone()).collect();
                let tokenizer = TokenizerStore::new(&cfg.output_dir).build_and_save(&texts, cfg.vocab_size)?;
                (tokenizer, None)
            }
        };
        let encoder = SequenceEncoder::new(Arc::new(tokenizer), cfg.max_length)?;

        // ── Step 5: Model config + datasets ──────────────────────────────────
        let encoder_config = match pretrained_encoder {
            Some(enc) => {
                if cfg.max_length > enc.max_seq_len {
                    bail!(
                        "max length {} exceeds the pretrained encoder's {} positions",
                        cfg.max_length,
                        enc.max_seq_len
                    );
                }
                enc
            }
            None => TextEncoderConfig::new(encoder.vocab_size(), cfg.max_length)
                .with_d_model(cfg.d_model)
                .with_num_heads(cfg.num_heads)
                .with_num_layers(cfg.num_layers)
                .with_d_ff(cfg.d_ff)
                .with_dropout(cfg.dropout),
        };
        let model_config = ClassifierConfig::new(encoder_config, task.num_classes()).with_dropout(cfg.dropout);

        let train_ds = ClfDataset::new(train, encoder.clone());
        let valid_ds = ClfDataset::new(valid, encoder.clone());
        tracing::info!("Train class counts: {:?}", train_ds.class_counts(task.num_classes()));

        // ── Step 6: Save run config ──────────────────────────────────────────
        let store = ArtifactStore::new(&cfg.output_dir);
        store.save_config(TUNE_CONFIG_FILE, cfg)?;

        // ── Step 7: Search ───────────────────────────────────────────────────
        let space  = SearchSpace::new(cfg.batch_sizes.clone(), cfg.lr_low, cfg.lr_high)?;
        let pruner = MedianPruner::new(cfg.n_startup_trials, cfg.n_warmup_epochs);
        let tuner_config = TunerConfig { n_trials: cfg.n_trials, epochs_per_trial: cfg.epochs, seed: cfg.seed };

        let mut objective = FineTuneObjective::<B>::new(train_ds, valid_ds, model_config.clone(), cfg.epochs, device.clone())
            .with_seed(cfg.seed);
        if let Some(dir) = &cfg.pretrained {
            objective = objective.with_pretrained(dir);
        }

        let mut logger = TrialLogger::new(&cfg.output_dir)?;
        let outcome    = Tuner::new(tuner_config, space, pruner)?.run(&mut objective, &mut logger)?;
        logger.write_history(&outcome.history)?;

        // ── Step 8: Save best model ──────────────────────────────────────────
        let artifact = match (outcome.best, outcome.best_state) {
            (Some(best), Some(model)) => {
                tracing::info!(
                    "Best trial {} (epoch {}): acc={:.4}, batch_size={}, lr={:.3e}",
                    best.trial + 1, best.epoch + 1, best.value, best.draw.batch_size, best.draw.learning_rate
                );
                let mut predictor = Predictor::<B::InnerBackend>::new(task, encoder, model_config, device);
                predictor.promote(model);
                predictor.save(&cfg.output_dir)?;
                Some(store.dir().to_path_buf())
            }
            _ => {
                tracing::warn!("Every trial was pruned; no model saved");
                None
            }
        };

        Ok(TuneSummary { history: outcome.history, best: outcome.best, artifact })
    }
}
