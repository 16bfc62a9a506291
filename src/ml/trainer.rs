// ============================================================
// Layer 5 — Epoch Loop
// ============================================================
// One pass over a data loader, in one of two modes:
//
//   Train — per batch: forward → loss.backward() → one scheduler
//           step → one optimizer step with that learning rate.
//           Burn hands back a fresh gradient set from every
//           backward call, so nothing accumulates across batches.
//   Eval  — model.valid() (inner backend, dropout off), forward
//           only; no optimizer or scheduler step.
//
// Both modes collect the summed loss plus predicted and true
// labels so the Evaluator can score the epoch.
//
// Reference: Burn Book §5, Loshchilov & Hutter (2019) AdamW

use burn::{
    data::dataloader::DataLoader,
    lr_scheduler::LrScheduler,
    module::AutodiffModule,
    optim::{GradientsParams, Optimizer},
    prelude::*,
    tensor::backend::AutodiffBackend,
};

use crate::data::batcher::ClfBatch;
use crate::ml::model::TransformerClassifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Train,
    Eval,
}

/// Everything one epoch produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EpochOutput {
    /// Sum of per-batch mean losses
    pub loss_sum:        f64,
    pub batches:         usize,
    pub optimizer_steps: usize,
    pub scheduler_steps: usize,
    pub predictions:     Vec<usize>,
    pub targets:         Vec<usize>,
}

impl EpochOutput {
    pub fn avg_loss(&self) -> f64 {
        if self.batches == 0 {
            return f64::NAN;
        }
        self.loss_sum / self.batches as f64
    }
}

/// Run one epoch over `batches`. The model is taken by value and
/// handed back because Burn's optimizer step consumes it.
pub fn run_epoch<B, O, S>(
    model:     TransformerClassifier<B>,
    batches:   &dyn DataLoader<ClfBatch<B>>,
    optimizer: &mut O,
    scheduler: &mut S,
    mode:      Mode,
) -> (TransformerClassifier<B>, EpochOutput)
where
    B: AutodiffBackend,
    O: Optimizer<TransformerClassifier<B>, B>,
    S: LrScheduler,
{
    match mode {
        Mode::Train => train_pass(model, batches, optimizer, scheduler),
        Mode::Eval  => {
            let out = eval_pass(&model.valid(), batches);
            (model, out)
        }
    }
}

fn train_pass<B, O, S>(
    mut model: TransformerClassifier<B>,
    batches:   &dyn DataLoader<ClfBatch<B>>,
    optimizer: &mut O,
    scheduler: &mut S,
) -> (TransformerClassifier<B>, EpochOutput)
where
    B: AutodiffBackend,
    O: Optimizer<TransformerClassifier<B>, B>,
    S: LrScheduler,
{
    let mut out = EpochOutput::default();

    for batch in batches.iter() {
        let output = model.forward_classification(batch);

        out.loss_sum += output.loss.clone().into_scalar().elem::<f64>();
        out.batches  += 1;
        collect_labels(&mut out, output.output.clone().inner(), output.targets.clone().inner());

        let grads = output.loss.backward();
        let grads = GradientsParams::from_grads(grads, &model);

        let lr = scheduler.step();
        out.scheduler_steps += 1;
        model = optimizer.step(lr, model, grads);
        out.optimizer_steps += 1;
    }

    tracing::debug!("Train pass: {} batches, avg loss {:.4}", out.batches, out.avg_loss());
    (model, out)
}

/// Inference-only pass. Takes the autodiff batches and strips them
/// down to the inner backend the validation model lives on.
pub fn eval_pass<B: AutodiffBackend>(
    model:   &TransformerClassifier<B::InnerBackend>,
    batches: &dyn DataLoader<ClfBatch<B>>,
) -> EpochOutput {
    let mut out = EpochOutput::default();

    for batch in batches.iter() {
        let inner = ClfBatch::<B::InnerBackend> {
            input_ids:      batch.input_ids.inner(),
            attention_mask: batch.attention_mask.inner(),
            labels:         batch.labels.inner(),
        };
        let output = model.forward_classification(inner);

        out.loss_sum += output.loss.into_scalar().elem::<f64>();
        out.batches  += 1;
        collect_labels(&mut out, output.output, output.targets);
    }

    tracing::debug!("Eval pass: {} batches, avg loss {:.4}", out.batches, out.avg_loss());
    out
}

fn collect_labels<B: Backend>(out: &mut EpochOutput, logits: Tensor<B, 2>, targets: Tensor<B, 1, Int>) {
    // argmax(1) returns shape [batch, 1] — flatten to [batch]
    let predicted = logits.argmax(1).flatten::<1>(0, 1);
    out.predictions.extend(predicted.into_data().iter::<i64>().map(|v| v as usize));
    out.targets.extend(targets.into_data().iter::<i64>().map(|v| v as usize));
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Arc;

    use burn::{
        backend::{Autodiff, NdArray},
        data::dataloader::DataLoaderBuilder,
        lr_scheduler::linear::LinearLrSchedulerConfig,
        optim::AdamWConfig,
    };

    use crate::data::{
        batcher::ClfBatcher,
        dataset::{tests::test_tokenizer, ClfDataset, SequenceEncoder},
    };
    use crate::domain::example::LabeledText;
    use crate::ml::model::tests::tiny_config;

    pub(crate) type TrainBackend = Autodiff<NdArray>;

    pub(crate) const POSITIVE: [&str; 4] = [
        "great wonderful film", "wonderful acting great", "great story", "brilliant wonderful",
    ];
    pub(crate) const NEGATIVE: [&str; 4] = [
        "awful terrible film", "terrible acting awful", "awful story", "boring terrible",
    ];

    /// A linearly separable toy sentiment set, repeated `copies` times
    pub(crate) fn toy_dataset(copies: usize, max_length: usize) -> ClfDataset {
        let corpus: Vec<&str> = POSITIVE.iter().chain(NEGATIVE.iter()).copied().collect();
        let enc = SequenceEncoder::new(test_tokenizer(&corpus), max_length).unwrap();

        let mut items = Vec::new();
        for _ in 0..copies {
            items.extend(POSITIVE.iter().map(|t| LabeledText { text: t.to_string(), label: 1 }));
            items.extend(NEGATIVE.iter().map(|t| LabeledText { text: t.to_string(), label: 0 }));
        }
        ClfDataset::new(items, enc)
    }

    fn loader(ds: ClfDataset, batch_size: usize) -> Arc<dyn DataLoader<ClfBatch<TrainBackend>>> {
        DataLoaderBuilder::new(ClfBatcher::<TrainBackend>::new(Default::default()))
            .batch_size(batch_size)
            .shuffle(1)
            .num_workers(1)
            .build(ds)
    }

    #[test]
    fn test_train_mode_steps_once_per_batch() {
        let device = Default::default();
        let ds     = toy_dataset(2, 6); // 16 examples
        let vocab  = 32;
        let model: TransformerClassifier<TrainBackend> = tiny_config(vocab, 6, 2).init(&device);
        let mut optim = AdamWConfig::new().init();
        let mut sched = LinearLrSchedulerConfig::new(1e-3, 0.0, 100).init().unwrap();

        let train = loader(ds, 5);
        let (_model, out) = run_epoch(model, &*train, &mut optim, &mut sched, Mode::Train);

        // ceil(16 / 5) = 4 batches, last one partial
        assert_eq!(out.batches, 4);
        assert_eq!(out.optimizer_steps, 4);
        assert_eq!(out.scheduler_steps, 4);
        assert_eq!(out.predictions.len(), 16);
        assert_eq!(out.targets.len(), 16);
        assert!(out.avg_loss().is_finite());
    }

    #[test]
    fn test_eval_mode_leaves_model_untouched() {
        let device = Default::default();
        let ds     = toy_dataset(1, 6);
        let model: TransformerClassifier<TrainBackend> = tiny_config(32, 6, 2).init(&device);
        let mut optim = AdamWConfig::new().init();
        let mut sched = LinearLrSchedulerConfig::new(1e-3, 0.0, 100).init().unwrap();
        let valid = loader(ds, 4);

        let (model, first)  = run_epoch(model, &*valid, &mut optim, &mut sched, Mode::Eval);
        let (_model, again) = run_epoch(model, &*valid, &mut optim, &mut sched, Mode::Eval);

        assert_eq!(first.optimizer_steps, 0);
        assert_eq!(first.scheduler_steps, 0);
        assert_eq!(first.batches, 2);
        // No parameter update → identical loss on the same data
        assert!((first.loss_sum - again.loss_sum).abs() < 1e-6);
    }

    #[test]
    fn test_training_reduces_loss_on_separable_data() {
        let device = Default::default();
        let model: TransformerClassifier<TrainBackend> = tiny_config(32, 6, 2).init(&device);
        let mut optim = AdamWConfig::new().init();
        let mut sched = LinearLrSchedulerConfig::new(5e-3, 0.0, 400).init().unwrap();

        let train = loader(toy_dataset(4, 6), 8);
        let valid = loader(toy_dataset(1, 6), 8);

        let (mut model, before) = run_epoch(model, &*valid, &mut optim, &mut sched, Mode::Eval);
        for _ in 0..15 {
            model = run_epoch(model, &*train, &mut optim, &mut sched, Mode::Train).0;
        }
        let (_model, after) = run_epoch(model, &*valid, &mut optim, &mut sched, Mode::Eval);

        assert!(after.avg_loss() < before.avg_loss());
    }
}
