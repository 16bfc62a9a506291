// ============================================================
// Layer 5 — Predictor
// ============================================================
// Holds the promoted best model and classifies raw text:
//
//   raw text → TextCleaner → SequenceEncoder → forward
//            → softmax → argmax → label name
//
// Also owns the artifact round trip: save writes the manifest,
// weights and tokenizer into one directory; load rebuilds an
// identical Predictor from it.
//
// The model lives on a plain (non-autodiff) backend, so dropout
// is inactive and no graph is recorded.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use burn::{data::dataloader::batcher::Batcher, prelude::*, tensor::activation::softmax};

use crate::data::{
    batcher::ClfBatcher,
    cleaner::TextCleaner,
    dataset::{EncodedExample, SequenceEncoder},
};
use crate::domain::error::{ClfError, Result};
use crate::domain::example::Task;
use crate::domain::traits::{Prediction, TextClassifier};
use crate::infra::{
    checkpoint::{ArtifactManifest, ArtifactStore},
    tokenizer_store::TokenizerStore,
};
use crate::ml::model::{ClassifierConfig, TransformerClassifier};

const PREDICT_BATCH: usize = 32;

pub struct Predictor<B: Backend> {
    task:    Task,
    encoder: SequenceEncoder,
    cleaner: TextCleaner,
    config:  ClassifierConfig,
    model:   Option<TransformerClassifier<B>>,
    device:  B::Device,
}

impl<B: Backend> Predictor<B> {
    /// A predictor with no model yet; `predict` fails until `promote`.
    pub fn new(task: Task, encoder: SequenceEncoder, config: ClassifierConfig, device: B::Device) -> Self {
        Self { task, encoder, cleaner: TextCleaner::new(), config, model: None, device }
    }

    pub fn task(&self) -> Task {
        self.task
    }

    /// Replace the held model.
    pub fn promote(&mut self, model: TransformerClassifier<B>) {
        self.model = Some(model);
    }

    fn model(&self) -> Result<&TransformerClassifier<B>> {
        self.model.as_ref().ok_or(ClfError::NotTrained)
    }

    fn probabilities(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let model   = self.model()?;
        let batcher = ClfBatcher::<B>::new(self.device.clone());
        let classes = self.config.num_classes;

        let mut out = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(PREDICT_BATCH) {
            let items = chunk
                .iter()
                .map(|t| Ok(EncodedExample::new(self.encoder.encode(&self.cleaner.clean(t))?, 0)))
                .collect::<Result<Vec<_>>>()?;

            let batch  = batcher.batch(items);
            let logits = model.forward(batch.input_ids, batch.attention_mask);
            let probs: Vec<f32> = softmax(logits, 1).into_data().iter::<f32>().collect();

            out.extend(probs.chunks(classes).map(<[f32]>::to_vec));
        }
        Ok(out)
    }

    /// Class ids for many texts, batched.
    pub fn predict_classes(&self, texts: &[&str]) -> Result<Vec<usize>> {
        Ok(self.probabilities(texts)?.iter().map(|p| argmax(p)).collect())
    }

    pub fn predict_text(&self, text: &str) -> Result<Prediction> {
        let probs = self.probabilities(&[text])?.into_iter().next().unwrap_or_default();
        let class = argmax(&probs);

        let probabilities: BTreeMap<String, f32> = self
            .task
            .labels()
            .iter()
            .zip(&probs)
            .map(|(name, &p)| (name.to_string(), p))
            .collect();

        let label = self
            .task
            .label_name(class)
            .ok_or_else(|| ClfError::Artifact(format!("model produced unknown class {class}")))?;

        Ok(Prediction {
            probabilities,
            label:      label.to_string(),
            confidence: probs.get(class).copied().unwrap_or(0.0),
        })
    }

    /// Persist model and tokenizer so `load` rebuilds this predictor.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let model = self.model()?;
        let store = ArtifactStore::new(&dir);

        store.save_manifest(&ArtifactManifest::new(self.task, self.encoder.max_length(), self.config.clone()))?;
        store.save_model(model)?;
        TokenizerStore::new(&dir).save(self.encoder.tokenizer())?;

        tracing::info!("Saved model artifact to '{}'", store.dir().display());
        Ok(())
    }

    pub fn load(dir: impl AsRef<Path>, device: B::Device) -> Result<Self> {
        let store    = ArtifactStore::new(&dir);
        let manifest = store.load_manifest()?;

        let expected: Vec<String> = manifest.task.labels().iter().map(|l| l.to_string()).collect();
        if manifest.labels != expected {
            return Err(ClfError::Artifact(format!(
                "label set {:?} does not match task '{}'",
                manifest.labels, manifest.task
            )));
        }
        if manifest.model.num_classes != expected.len() {
            return Err(ClfError::Artifact(format!(
                "model has {} outputs but task '{}' has {} classes",
                manifest.model.num_classes, manifest.task, expected.len()
            )));
        }

        let tokenizer = TokenizerStore::new(&dir).load()?;
        let encoder   = SequenceEncoder::new(Arc::new(tokenizer), manifest.max_length)?;
        let model     = store.load_model::<B>(&manifest.model, &device)?;

        tracing::info!("Loaded {} model from '{}'", manifest.task, store.dir().display());

        let mut predictor = Self::new(manifest.task, encoder, manifest.model, device);
        predictor.promote(model);
        Ok(predictor)
    }
}

impl<B: Backend> TextClassifier for Predictor<B> {
    fn predict(&self, text: &str) -> Result<Prediction> {
        self.predict_text(text)
    }
}

/// Index of the largest value; first one wins on ties.
fn argmax(values: &[f32]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f32::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
        .0
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use burn::{
        backend::NdArray,
        data::dataloader::DataLoaderBuilder,
        lr_scheduler::linear::LinearLrSchedulerConfig,
        module::AutodiffModule,
        optim::AdamWConfig,
    };

    use crate::data::dataset::tests::test_tokenizer;
    use crate::ml::model::tests::tiny_config;
    use crate::ml::trainer::{
        run_epoch,
        tests::{toy_dataset, TrainBackend, NEGATIVE, POSITIVE},
        Mode,
    };

    fn untrained() -> Predictor<NdArray> {
        let corpus: Vec<&str> = POSITIVE.iter().chain(NEGATIVE.iter()).copied().collect();
        let enc = SequenceEncoder::new(test_tokenizer(&corpus), 6).unwrap();
        Predictor::new(Task::Sentiment, enc, tiny_config(32, 6, 2), Default::default())
    }

    /// Fit the tiny model on the toy set and hand over its inference copy
    fn trained() -> Predictor<NdArray> {
        let device = Default::default();
        let model: TransformerClassifier<TrainBackend> = tiny_config(32, 6, 2).init(&device);
        let mut optim = AdamWConfig::new().init();
        let mut sched = LinearLrSchedulerConfig::new(5e-3, 0.0, 1000).init().unwrap();
        let train = DataLoaderBuilder::new(ClfBatcher::<TrainBackend>::new(device))
            .batch_size(8)
            .shuffle(3)
            .num_workers(1)
            .build(toy_dataset(4, 6));

        let mut model = model;
        for _ in 0..20 {
            model = run_epoch(model, &*train, &mut optim, &mut sched, Mode::Train).0;
        }

        let mut predictor = untrained();
        predictor.promote(model.valid());
        predictor
    }

    #[test]
    fn test_predict_before_training_fails() {
        let p = untrained();
        assert!(matches!(p.predict("great film"), Err(ClfError::NotTrained)));
        assert!(matches!(p.predict_classes(&["great film"]), Err(ClfError::NotTrained)));
    }

    #[test]
    fn test_save_without_model_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(untrained().save(dir.path()), Err(ClfError::NotTrained)));
    }

    #[test]
    fn test_trained_model_classifies_toy_sentences() {
        let p = trained();

        let pos = p.predict("Great, WONDERFUL film!").unwrap();
        assert_eq!(pos.label, "positive");
        assert!(pos.confidence > 0.5);
        let total: f32 = pos.probabilities.values().sum();
        assert!((total - 1.0).abs() < 1e-4);

        let neg = p.predict("awful terrible film").unwrap();
        assert_eq!(neg.label, "negative");
    }

    #[test]
    fn test_save_load_roundtrip_keeps_predictions() {
        let dir = tempfile::tempdir().unwrap();
        let p   = trained();
        p.save(dir.path()).unwrap();

        let loaded = Predictor::<NdArray>::load(dir.path(), Default::default()).unwrap();
        assert_eq!(loaded.task(), Task::Sentiment);

        for text in ["great wonderful film", "awful terrible film"] {
            let a = p.predict(text).unwrap();
            let b = loaded.predict(text).unwrap();
            assert_eq!(a.label, b.label);
            assert!((a.confidence - b.confidence).abs() < 1e-2);
        }
        assert_eq!(
            p.predict_classes(&["great story", "boring terrible"]).unwrap(),
            loaded.predict_classes(&["great story", "boring terrible"]).unwrap(),
        );
    }

    #[test]
    fn test_argmax_prefers_first_on_ties() {
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.2]), 1);
    }
}
