//! Hyperparameter search with pruning and best-model tracking.
//!
//! ```text
//! Tuner
//!   ├── RandomSampler   (seeded draws from the SearchSpace)
//!   ├── PruningPolicy   (MedianPruner / NopPruner)
//!   └── per trial: Objective::begin → TrialSession::run_epoch × epochs
//! ```
//!
//! Each trial moves `Proposed → Running → {Completed | Pruned}`.
//! The pruning policy answers every epoch report with a
//! [`PruneSignal`]; a pruned trial stops at once and never
//! competes for best model. A completed trial's value is its best
//! epoch accuracy, and its snapshot of that epoch replaces the
//! run's best state only when strictly better, so on ties the
//! earliest trial wins.

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::domain::error::{ClfError, Result};
use crate::domain::hyperparams::{HyperparameterDraw, SearchSpace};
use crate::ml::evaluator::ClassificationMetrics;

// ═══════════════════════════════════════════════════════════════════════
// Trial records
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrialStatus {
    Proposed,
    Running,
    Completed,
    Pruned,
}

/// What one epoch of a trial produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpochReport {
    pub train_loss: f64,
    pub val_loss:   f64,
    pub metrics:    ClassificationMetrics,
}

/// One entry of the append-only trial history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialRecord {
    pub id:     usize,
    pub draw:   HyperparameterDraw,
    pub status: TrialStatus,
    /// Validation accuracy per epoch actually run
    pub accuracies: Vec<f64>,
    /// Best epoch accuracy; only set for completed trials
    pub value:      Option<f64>,
    pub best_epoch: Option<usize>,
}

impl TrialRecord {
    fn proposed(id: usize, draw: HyperparameterDraw) -> Self {
        Self {
            id,
            draw,
            status: TrialStatus::Proposed,
            accuracies: Vec::new(),
            value: None,
            best_epoch: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BestTrial {
    pub trial: usize,
    pub epoch: usize,
    pub draw:  HyperparameterDraw,
    pub value: f64,
}

/// Result of a tuning run. The best model state is handed back
/// here rather than kept anywhere global.
#[derive(Debug)]
pub struct TuneOutcome<S> {
    pub history:    Vec<TrialRecord>,
    pub best:       Option<BestTrial>,
    pub best_state: Option<S>,
}

// ═══════════════════════════════════════════════════════════════════════
// Traits
// ═══════════════════════════════════════════════════════════════════════

/// A running trial: owns its model, optimizer and schedule.
pub trait TrialSession {
    type State;

    /// Train for one epoch, then evaluate on the validation split.
    fn run_epoch(&mut self, epoch: usize) -> Result<EpochReport>;

    /// Copy of the current model state.
    fn snapshot(&self) -> Self::State;
}

/// Builds a fresh session for each hyperparameter draw.
pub trait Objective {
    type State;

    fn begin(
        &mut self,
        trial: usize,
        draw:  &HyperparameterDraw,
    ) -> Result<Box<dyn TrialSession<State = Self::State>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneSignal {
    Continue,
    Prune,
}

/// Decides, epoch by epoch, whether a trial is worth continuing.
pub trait PruningPolicy {
    fn report(&mut self, trial: usize, epoch: usize, value: f64) -> PruneSignal;

    /// Called once for every trial that ran all its epochs.
    fn complete(&mut self, trial: usize, trajectory: &[f64]);
}

/// Receives every epoch report, e.g. to log it.
pub trait TrialObserver {
    fn on_epoch(
        &mut self,
        trial:  usize,
        draw:   &HyperparameterDraw,
        epoch:  usize,
        report: &EpochReport,
    ) -> Result<()>;
}

impl TrialObserver for () {
    fn on_epoch(&mut self, _: usize, _: &HyperparameterDraw, _: usize, _: &EpochReport) -> Result<()> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Pruners
// ═══════════════════════════════════════════════════════════════════════

/// Prunes a trial whose best accuracy so far is below the median
/// of completed trials' accuracies at the same epoch.
#[derive(Debug, Clone)]
pub struct MedianPruner {
    /// Completed trials required before anything is pruned.
    n_startup_trials: usize,
    /// Epochs at the start of each trial that are never pruned.
    n_warmup_epochs:  usize,
    completed:        Vec<Vec<f64>>,
    current:          Option<(usize, f64)>,
}

impl MedianPruner {
    pub fn new(n_startup_trials: usize, n_warmup_epochs: usize) -> Self {
        Self { n_startup_trials, n_warmup_epochs, completed: Vec::new(), current: None }
    }
}

impl PruningPolicy for MedianPruner {
    fn report(&mut self, trial: usize, epoch: usize, value: f64) -> PruneSignal {
        let best_so_far = match self.current {
            Some((id, best)) if id == trial => best.max(value),
            _ => value,
        };
        self.current = Some((trial, best_so_far));

        if self.completed.len() < self.n_startup_trials || epoch < self.n_warmup_epochs {
            return PruneSignal::Continue;
        }

        let mut at_epoch: Vec<f64> = self
            .completed
            .iter()
            .filter_map(|t| t.get(epoch).copied())
            .collect();
        let Some(median) = median(&mut at_epoch) else {
            return PruneSignal::Continue;
        };

        if best_so_far < median {
            tracing::debug!(
                "Trial {trial} epoch {epoch}: best {best_so_far:.4} below median {median:.4}"
            );
            PruneSignal::Prune
        } else {
            PruneSignal::Continue
        }
    }

    fn complete(&mut self, _trial: usize, trajectory: &[f64]) {
        self.completed.push(trajectory.to_vec());
    }
}

fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    Some(if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    })
}

/// Never prunes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopPruner;

impl PruningPolicy for NopPruner {
    fn report(&mut self, _trial: usize, _epoch: usize, _value: f64) -> PruneSignal {
        PruneSignal::Continue
    }

    fn complete(&mut self, _trial: usize, _trajectory: &[f64]) {}
}

// ═══════════════════════════════════════════════════════════════════════
// Tuner
// ═══════════════════════════════════════════════════════════════════════

/// Seeded random search over the space.
pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        Self { rng: StdRng::seed_from_u64(seed) }
    }

    pub fn sample(&mut self, space: &SearchSpace) -> HyperparameterDraw {
        space.sample(&mut self.rng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunerConfig {
    pub n_trials:         usize,
    pub epochs_per_trial: usize,
    pub seed:             u64,
}

pub struct Tuner<P: PruningPolicy> {
    config:  TunerConfig,
    space:   SearchSpace,
    sampler: RandomSampler,
    pruner:  P,
}

impl<P: PruningPolicy> Tuner<P> {
    pub fn new(config: TunerConfig, space: SearchSpace, pruner: P) -> Result<Self> {
        if config.n_trials == 0 {
            return Err(ClfError::Config("trial budget must be > 0".to_string()));
        }
        if config.epochs_per_trial == 0 {
            return Err(ClfError::Config("epochs per trial must be > 0".to_string()));
        }
        space.validate()?;

        let sampler = RandomSampler::new(config.seed);
        Ok(Self { config, space, sampler, pruner })
    }

    /// Run the whole trial budget. Errors from any trial abort the run.
    pub fn run<O: Objective>(
        &mut self,
        objective: &mut O,
        observer:  &mut dyn TrialObserver,
    ) -> Result<TuneOutcome<O::State>> {
        let mut history    = Vec::with_capacity(self.config.n_trials);
        let mut best: Option<BestTrial> = None;
        let mut best_state = None;

        for id in 0..self.config.n_trials {
            let draw       = self.sampler.sample(&self.space);
            let mut record = TrialRecord::proposed(id, draw);

            tracing::info!(
                "Trial {}/{}: batch_size={} lr={:.3e}",
                id + 1, self.config.n_trials, draw.batch_size, draw.learning_rate
            );

            let mut session = objective.begin(id, &draw)?;
            record.status   = TrialStatus::Running;

            // Best epoch of this trial: (accuracy, epoch, snapshot)
            let mut trial_best: Option<(f64, usize, O::State)> = None;

            for epoch in 0..self.config.epochs_per_trial {
                let report = session.run_epoch(epoch)?;
                observer.on_epoch(id, &draw, epoch, &report)?;

                let accuracy = report.metrics.accuracy;
                record.accuracies.push(accuracy);

                tracing::info!(
                    "Trial {} epoch {}/{} | train_loss={:.4} | val_loss={:.4} | acc={:.2}% | f1={:.4}",
                    id + 1, epoch + 1, self.config.epochs_per_trial,
                    report.train_loss, report.val_loss,
                    accuracy * 100.0, report.metrics.f1,
                );

                if self.pruner.report(id, epoch, accuracy) == PruneSignal::Prune {
                    record.status = TrialStatus::Pruned;
                    tracing::info!("Trial {} pruned after epoch {}", id + 1, epoch + 1);
                    break;
                }

                if trial_best.as_ref().map_or(true, |(b, _, _)| accuracy > *b) {
                    trial_best = Some((accuracy, epoch, session.snapshot()));
                }
            }

            if record.status == TrialStatus::Running {
                record.status = TrialStatus::Completed;
                self.pruner.complete(id, &record.accuracies);

                if let Some((value, epoch, state)) = trial_best {
                    record.value      = Some(value);
                    record.best_epoch = Some(epoch);

                    if best.map_or(true, |b| value > b.value) {
                        tracing::info!("New best: trial {} epoch {} acc={:.4}", id + 1, epoch + 1, value);
                        best       = Some(BestTrial { trial: id, epoch, draw, value });
                        best_state = Some(state);
                    }
                }
            }

            // Session (model, optimizer, schedule) is dropped here
            history.push(record);
        }

        Ok(TuneOutcome { history, best, best_state })
    }
}
