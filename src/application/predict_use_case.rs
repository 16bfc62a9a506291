// ============================================================
// Layer 2 — PredictUseCase
// ============================================================
// Loads a saved artifact and classifies one piece of text.

use std::path::PathBuf;

use anyhow::{Context, Result};
use burn::backend::Wgpu;

use crate::domain::traits::{Prediction, TextClassifier};
use crate::ml::predictor::Predictor;

pub struct PredictUseCase {
    classifier: Box<dyn TextClassifier>,
}

impl PredictUseCase {
    pub fn new(model_dir: impl Into<PathBuf>) -> Result<Self> {
        let model_dir = model_dir.into();
        let predictor = Predictor::<Wgpu>::load(&model_dir, Default::default())
            .with_context(|| format!("cannot load model from '{}'", model_dir.display()))?;
        Ok(Self::with_classifier(Box::new(predictor)))
    }

    /// Use any classifier, e.g. one already in memory.
    pub fn with_classifier(classifier: Box<dyn TextClassifier>) -> Self {
        Self { classifier }
    }

    pub fn predict(&self, text: &str) -> Result<Prediction> {
        Ok(self.classifier.predict(text)?)
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::domain::error::ClfError;

    struct Fixed;

    impl TextClassifier for Fixed {
        fn predict(&self, text: &str) -> crate::domain::error::Result<Prediction> {
            if text.is_empty() {
                return Err(ClfError::NotTrained);
            }
            Ok(Prediction {
                probabilities: BTreeMap::from([("negative".into(), 0.2), ("positive".into(), 0.8)]),
                label:         "positive".into(),
                confidence:    0.8,
            })
        }
    }

    #[test]
    fn test_delegates_to_classifier() {
        let uc = PredictUseCase::with_classifier(Box::new(Fixed));
        assert_eq!(uc.predict("anything").unwrap().label, "positive");
        assert!(uc.predict("").is_err());
    }

    #[test]
    fn test_missing_model_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PredictUseCase::new(dir.path().join("missing")).is_err());
    }
}
