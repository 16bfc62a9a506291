// ============================================================
// Layer 2 — EvaluateUseCase
// ============================================================
// Scores a saved artifact on a labelled CSV:
//
//   load artifact → load rows → encode labels for the
//   artifact's task → batched prediction → Evaluator
//
// Texts are cleaned inside the Predictor, exactly as at
// training time.

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::{backend::Wgpu, prelude::Backend};

use crate::data::loader::CsvLoader;
use crate::domain::traits::DatasetSource;
use crate::ml::{
    evaluator::{evaluate, ClassificationMetrics},
    predictor::Predictor,
};

#[derive(Debug, Clone)]
pub struct EvaluateConfig {
    pub model_dir:    PathBuf,
    pub data_path:    PathBuf,
    pub text_column:  Option<String>,
    pub label_column: Option<String>,
    pub limit:        Option<usize>,
}

pub struct EvaluateUseCase {
    config: EvaluateConfig,
}

impl EvaluateUseCase {
    pub fn new(config: EvaluateConfig) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> Result<ClassificationMetrics> {
        self.run::<Wgpu>(Default::default())
    }

    pub fn run<B: Backend>(&self, device: B::Device) -> Result<ClassificationMetrics> {
        let cfg = &self.config;

        let predictor = Predictor::<B>::load(&cfg.model_dir, device)
            .with_context(|| format!("cannot load model from '{}'", cfg.model_dir.display()))?;
        let task = predictor.task();

        let text_column  = cfg.text_column.clone().unwrap_or_else(|| task.text_column().to_string());
        let label_column = cfg.label_column.clone().unwrap_or_else(|| task.label_column().to_string());
        let rows = CsvLoader::new(&cfg.data_path, text_column, label_column)
            .with_limit(cfg.limit)
            .load_all()
            .with_context(|| format!("cannot load dataset '{}'", cfg.data_path.display()))?;
        tracing::info!("Evaluating {} rows with the {} model", rows.len(), task);

        let targets = rows
            .iter()
            .map(|row| task.encode_label(&row.label))
            .collect::<crate::domain::error::Result<Vec<_>>>()?;
        let texts: Vec<&str> = rows.iter().map(|row| row.text.as_str()).collect();
        let predictions = predictor.predict_classes(&texts)?;

        let metrics = evaluate(&predictions, &targets, task.num_classes())?;
        tracing::info!(
            "acc={:.4} precision={:.4} recall={:.4} f1={:.4}",
            metrics.accuracy, metrics.precision, metrics.recall, metrics.f1
        );
        Ok(metrics)
    }
}
