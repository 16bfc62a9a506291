// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Parses arguments with clap and routes each subcommand to its
// use case. Results are printed here and nowhere else.
//
//   tune      — hyperparameter search; saves the best model
//   predict   — classify one text, JSON on stdout
//   evaluate  — metrics of a saved model on a CSV, JSON on stdout
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, EvaluateArgs, PredictArgs, TuneArgs};

#[derive(Parser, Debug)]
#[command(
    name = "text-clf",
    version = "0.1.0",
    about = "Fine-tune a transformer text classifier with hyperparameter search, then predict."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Tune(args)     => run_tune(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Evaluate(args) => run_evaluate(args),
        }
    }
}

fn run_tune(args: TuneArgs) -> Result<()> {
    use crate::application::tune_use_case::TuneUseCase;

    tracing::info!("Tuning {} classifier on {}", args.task, args.data);
    let summary = TuneUseCase::new(args.into()).execute()?;

    let pruned = summary.history.iter().filter(|t| t.value.is_none()).count();
    println!("Trials: {} ({} pruned)", summary.history.len(), pruned);
    match (summary.best, summary.artifact) {
        (Some(best), Some(dir)) => {
            println!(
                "Best: trial {} epoch {} accuracy {:.4} (batch_size={}, lr={:.3e})",
                best.trial + 1, best.epoch + 1, best.value, best.draw.batch_size, best.draw.learning_rate
            );
            println!("Model saved to {}", dir.display());
        }
        _ => println!("No trial completed; nothing saved."),
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::PredictUseCase;

    let prediction = PredictUseCase::new(args.model)?.predict(&args.text)?;
    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}

fn run_evaluate(args: EvaluateArgs) -> Result<()> {
    use crate::application::evaluate_use_case::EvaluateUseCase;

    let metrics = EvaluateUseCase::new(args.into()).execute()?;
    println!("{}", serde_json::to_string_pretty(&metrics)?);
    Ok(())
}
