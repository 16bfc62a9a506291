// ============================================================
// Layer 5 — Fine-tuning Objective
// ============================================================
// Connects the Tuner to Burn. For every hyperparameter draw:
//
//   1. Build a model: pretrained encoder (if configured) plus a
//      fresh classification head, or a randomly initialised one
//   2. AdamW (weight decay 0.01, eps 1e-8)
//   3. Linear decay from the drawn learning rate to 0 over
//      epochs × ceil(N_train / batch_size) optimizer steps
//   4. Shuffled train loader, ordered validation loader
//
// Each epoch = one Train pass + one Eval pass, scored by the
// Evaluator. Snapshots are taken with model.valid(), i.e. on
// the inner (non-autodiff) backend with dropout disabled.
//
// Reference: Burn Book §5 (Training)
//            Loshchilov & Hutter (2019) AdamW

use std::{path::PathBuf, sync::Arc};

use burn::{
    data::dataloader::{DataLoader, DataLoaderBuilder},
    data::dataset::Dataset,
    lr_scheduler::linear::{LinearLrScheduler, LinearLrSchedulerConfig},
    module::AutodiffModule,
    optim::{AdamWConfig, Optimizer},
    tensor::backend::AutodiffBackend,
};

use crate::data::{
    batcher::{ClfBatch, ClfBatcher},
    dataset::ClfDataset,
};
use crate::domain::error::{ClfError, Result};
use crate::domain::hyperparams::HyperparameterDraw;
use crate::infra::checkpoint::ArtifactStore;
use crate::ml::{
    evaluator::evaluate,
    model::{ClassifierConfig, TransformerClassifier},
    trainer::{run_epoch, Mode},
    tuner::{EpochReport, Objective, TrialSession},
};

const WEIGHT_DECAY: f32 = 0.01;
const ADAM_EPSILON: f32 = 1e-8;

pub struct FineTuneObjective<B: AutodiffBackend> {
    train:      ClfDataset,
    valid:      ClfDataset,
    model:      ClassifierConfig,
    epochs:     usize,
    pretrained: Option<PathBuf>,
    seed:       u64,
    device:     B::Device,
}

impl<B: AutodiffBackend> FineTuneObjective<B> {
    pub fn new(
        train:  ClfDataset,
        valid:  ClfDataset,
        model:  ClassifierConfig,
        epochs: usize,
        device: B::Device,
    ) -> Self {
        Self { train, valid, model, epochs, pretrained: None, seed: 42, device }
    }

    /// Start every trial from the encoder saved in `dir`.
    pub fn with_pretrained(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pretrained = Some(dir.into());
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn init_model(&self) -> Result<TransformerClassifier<B>> {
        match &self.pretrained {
            Some(dir) => {
                let encoder = ArtifactStore::new(dir).load_encoder::<B>(&self.model.encoder, &self.device)?;
                Ok(self.model.init_with_encoder(encoder, &self.device))
            }
            None => Ok(self.model.init(&self.device)),
        }
    }

    fn loader(&self, dataset: ClfDataset, batch_size: usize, shuffle: Option<u64>)
        -> Arc<dyn DataLoader<ClfBatch<B>>>
    {
        let builder = DataLoaderBuilder::new(ClfBatcher::<B>::new(self.device.clone()))
            .batch_size(batch_size)
            .num_workers(1);
        match shuffle {
            Some(seed) => builder.shuffle(seed).build(dataset),
            None       => builder.build(dataset),
        }
    }
}

impl<B: AutodiffBackend> Objective for FineTuneObjective<B> {
    type State = TransformerClassifier<B::InnerBackend>;

    fn begin(
        &mut self,
        trial: usize,
        draw:  &HyperparameterDraw,
    ) -> Result<Box<dyn TrialSession<State = Self::State>>> {
        let trial_seed = self.seed.wrapping_add(trial as u64);
        B::seed(trial_seed);

        let model = self.init_model()?;

        let steps_per_epoch = self.train.len().div_ceil(draw.batch_size);
        let total_steps     = (steps_per_epoch * self.epochs).max(1);

        let optimizer = AdamWConfig::new()
            .with_weight_decay(WEIGHT_DECAY)
            .with_epsilon(ADAM_EPSILON)
            .init::<B, TransformerClassifier<B>>();
        let scheduler = LinearLrSchedulerConfig::new(draw.learning_rate, 0.0, total_steps)
            .init()
            .map_err(ClfError::Config)?;

        tracing::debug!(
            "Trial {trial}: {} train / {} valid examples, {total_steps} optimizer steps",
            self.train.len(),
            self.valid.len()
        );

        Ok(session(
            model,
            optimizer,
            scheduler,
            self.loader(self.train.clone(), draw.batch_size, Some(trial_seed)),
            self.loader(self.valid.clone(), draw.batch_size, None),
            self.model.num_classes,
        ))
    }
}

fn session<B, O>(
    model:        TransformerClassifier<B>,
    optimizer:    O,
    scheduler:    LinearLrScheduler,
    train_loader: Arc<dyn DataLoader<ClfBatch<B>>>,
    valid_loader: Arc<dyn DataLoader<ClfBatch<B>>>,
    num_classes:  usize,
) -> Box<dyn TrialSession<State = TransformerClassifier<B::InnerBackend>>>
where
    B: AutodiffBackend,
    O: Optimizer<TransformerClassifier<B>, B> + 'static,
{
    Box::new(FineTuneSession { model, optimizer, scheduler, train_loader, valid_loader, num_classes })
}

/// Model, optimizer state and schedule of one trial. Dropped
/// when the trial ends.
struct FineTuneSession<B: AutodiffBackend, O> {
    model:        TransformerClassifier<B>,
    optimizer:    O,
    scheduler:    LinearLrScheduler,
    train_loader: Arc<dyn DataLoader<ClfBatch<B>>>,
    valid_loader: Arc<dyn DataLoader<ClfBatch<B>>>,
    num_classes:  usize,
}

impl<B, O> TrialSession for FineTuneSession<B, O>
where
    B: AutodiffBackend,
    O: Optimizer<TransformerClassifier<B>, B>,
{
    type State = TransformerClassifier<B::InnerBackend>;

    fn run_epoch(&mut self, _epoch: usize) -> Result<EpochReport> {
        // Module clones share parameter storage
        let model = self.model.clone();
        let (model, train) = run_epoch(model, &*self.train_loader, &mut self.optimizer, &mut self.scheduler, Mode::Train);
        let (model, valid) = run_epoch(model, &*self.valid_loader, &mut self.optimizer, &mut self.scheduler, Mode::Eval);
        self.model = model;

        let metrics = evaluate(&valid.predictions, &valid.targets, self.num_classes)?;
        Ok(EpochReport {
            train_loss: train.avg_loss(),
            val_loss:   valid.avg_loss(),
            metrics,
        })
    }

    fn snapshot(&self) -> Self::State {
        self.model.valid()
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    use crate::ml::model::tests::tiny_config;
    use crate::ml::trainer::tests::{toy_dataset, TrainBackend};
    use crate::ml::tuner::{NopPruner, TrialStatus, Tuner, TunerConfig};
    use crate::domain::hyperparams::SearchSpace;

    #[test]
    fn test_session_reports_metrics_per_epoch() {
        let device = Default::default();
        let mut objective = FineTuneObjective::<TrainBackend>::new(
            toy_dataset(2, 6),
            toy_dataset(1, 6),
            tiny_config(32, 6, 2),
            2,
            device,
        );
        let draw = HyperparameterDraw { batch_size: 4, learning_rate: 1e-3 };
        let mut session = objective.begin(0, &draw).unwrap();

        for epoch in 0..2 {
            let report = session.run_epoch(epoch).unwrap();
            assert!(report.train_loss.is_finite());
            assert!(report.val_loss.is_finite());
            assert!((0.0..=1.0).contains(&report.metrics.accuracy));
        }
        let snapshot = session.snapshot();
        assert_eq!(snapshot.head.weight.val().dims(), [16, 2]);
    }

    #[test]
    fn test_tuner_with_burn_objective_promotes_a_model() {
        let device = Default::default();
        let mut objective = FineTuneObjective::<TrainBackend>::new(
            toy_dataset(2, 6),
            toy_dataset(1, 6),
            tiny_config(32, 6, 2),
            2,
            device,
        )
        .with_seed(7);

        let space  = SearchSpace::new(vec![4, 8], 1e-4, 5e-3).unwrap();
        let config = TunerConfig { n_trials: 2, epochs_per_trial: 2, seed: 7 };
        let out    = Tuner::new(config, space, NopPruner).unwrap().run(&mut objective, &mut ()).unwrap();

        assert_eq!(out.history.len(), 2);
        assert!(out.history.iter().all(|t| t.status == TrialStatus::Completed));
        assert!(out.best.is_some());
        assert!(out.best_state.is_some());
    }

    #[test]
    fn test_missing_pretrained_dir_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let mut objective = FineTuneObjective::<TrainBackend>::new(
            toy_dataset(1, 6),
            toy_dataset(1, 6),
            tiny_config(32, 6, 2),
            1,
            Default::default(),
        )
        .with_pretrained(dir.path().join("missing"));

        let draw = HyperparameterDraw { batch_size: 4, learning_rate: 1e-3 };
        assert!(matches!(objective.begin(0, &draw), Err(ClfError::ResourceUnavailable(_))));
    }
}
