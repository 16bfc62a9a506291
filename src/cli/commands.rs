// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the three subcommands: `tune`, `predict` and
// `evaluate`, and all their configurable flags.
//
// Reference: Rust Book §12 (Building a CLI Program)

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::application::{evaluate_use_case::EvaluateConfig, tune_use_case::TuneConfig};
use crate::domain::example::Task;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search hyperparameters, fine-tune, and save the best model
    Tune(TuneArgs),

    /// Classify one text with a saved model
    Predict(PredictArgs),

    /// Score a saved model on a labelled CSV
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug)]
pub struct TuneArgs {
    /// CSV file with a header row
    #[arg(long)]
    pub data: String,

    /// `sentiment` or `abuse`
    #[arg(long, default_value = "sentiment")]
    pub task: Task,

    /// Text column (default: review / tweet_text)
    #[arg(long)]
    pub text_column: Option<String>,

    /// Label column (default: sentiment / cyberbullying_type)
    #[arg(long)]
    pub label_column: Option<String>,

    /// Read at most this many rows
    #[arg(long)]
    pub limit: Option<usize>,

    /// Where the best model, tokenizer and logs are written
    #[arg(long, default_value = "artifacts")]
    pub output: String,

    /// Saved model directory whose encoder every trial starts from
    #[arg(long)]
    pub pretrained: Option<String>,

    /// Tokens per example including [CLS] and [SEP]
    #[arg(long, default_value_t = 128)]
    pub max_length: usize,

    /// Vocabulary size when building a tokenizer from the corpus
    #[arg(long, default_value_t = 20_000)]
    pub vocab_size: usize,

    #[arg(long, default_value_t = 0.2)]
    pub val_fraction: f64,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of hyperparameter draws
    #[arg(long, default_value_t = 10)]
    pub trials: usize,

    #[arg(long, default_value_t = 3)]
    pub epochs: usize,

    /// Candidate batch sizes, comma separated
    #[arg(long, value_delimiter = ',', default_value = "8,16,32")]
    pub batch_sizes: Vec<usize>,

    /// Lower bound of the log-uniform learning-rate range
    #[arg(long, default_value_t = 1e-5)]
    pub lr_low: f64,

    #[arg(long, default_value_t = 5e-5)]
    pub lr_high: f64,

    /// Completed trials before the median pruner may prune
    #[arg(long, default_value_t = 2)]
    pub startup_trials: usize,

    /// Epochs at the start of each trial that are never pruned
    #[arg(long, default_value_t = 1)]
    pub warmup_epochs: usize,

    #[arg(long, default_value_t = 256)]
    pub d_model: usize,

    /// d_model must be divisible by num_heads
    #[arg(long, default_value_t = 4)]
    pub num_heads: usize,

    #[arg(long, default_value_t = 4)]
    pub num_layers: usize,

    #[arg(long, default_value_t = 1024)]
    pub d_ff: usize,

    #[arg(long, default_value_t = 0.1)]
    pub dropout: f64,
}

/// The application layer never sees clap types.
impl From<TuneArgs> for TuneConfig {
    fn from(a: TuneArgs) -> Self {
        TuneConfig {
            data_path:        a.data,
            task:             a.task,
            text_column:      a.text_column,
            label_column:     a.label_column,
            limit:            a.limit,
            output_dir:       a.output,
            pretrained:       a.pretrained,
            max_length:       a.max_length,
            vocab_size:       a.vocab_size,
            val_fraction:     a.val_fraction,
            seed:             a.seed,
            n_trials:         a.trials,
            epochs:           a.epochs,
            batch_sizes:      a.batch_sizes,
            lr_low:           a.lr_low,
            lr_high:          a.lr_high,
            n_startup_trials: a.startup_trials,
            n_warmup_epochs:  a.warmup_epochs,
            d_model:          a.d_model,
            num_heads:        a.num_heads,
            num_layers:       a.num_layers,
            d_ff:             a.d_ff,
            dropout:          a.dropout,
        }
    }
}

#[derive(Args, Debug)]
pub struct PredictArgs {
    /// Text to classify
    #[arg(long)]
    pub text: String,

    /// Directory written by `tune`
    #[arg(long, default_value = "artifacts")]
    pub model: PathBuf,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labelled CSV file
    #[arg(long)]
    pub data: PathBuf,

    #[arg(long, default_value = "artifacts")]
    pub model: PathBuf,

    #[arg(long)]
    pub text_column: Option<String>,

    #[arg(long)]
    pub label_column: Option<String>,

    #[arg(long)]
    pub limit: Option<usize>,
}

impl From<EvaluateArgs> for EvaluateConfig {
    fn from(a: EvaluateArgs) -> Self {
        EvaluateConfig {
            model_dir:    a.model,
            data_path:    a.data,
            text_column:  a.text_column,
            label_column: a.label_column,
            limit:        a.limit,
        }
    }
}
