// ============================================================
// Layer 5 — Evaluator
// ============================================================
// Scores predicted vs. true labels for one validation pass.
//
//   accuracy  = matches / N
//   precision = TP / (TP + FP)
//   recall    = TP / (TP + FN)
//   F1        = 2PR / (P + R)
//
// Two classes: binary scores for the positive class (id 1).
// More classes: macro average — each class scored one-vs-rest,
// then the unweighted mean over the classes that occur in either
// the targets or the predictions. A ratio with a zero denominator
// counts as 0.0.

use serde::{Deserialize, Serialize};

use crate::domain::error::{ClfError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy:  f64,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl Counts {
    fn occurs(&self) -> bool {
        self.tp + self.fp + self.fn_ > 0
    }

    fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }

    fn f1(&self) -> f64 {
        let (p, r) = (self.precision(), self.recall());
        if p + r == 0.0 { 0.0 } else { 2.0 * p * r / (p + r) }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

pub fn evaluate(predictions: &[usize], targets: &[usize], num_classes: usize) -> Result<ClassificationMetrics> {
    if predictions.len() != targets.len() {
        return Err(ClfError::MetricInput(format!(
            "{} predictions but {} targets",
            predictions.len(),
            targets.len()
        )));
    }
    if predictions.is_empty() {
        return Err(ClfError::MetricInput("no labels to score".to_string()));
    }
    if num_classes < 2 {
        return Err(ClfError::MetricInput(format!("need at least 2 classes, got {num_classes}")));
    }

    let mut counts = vec![Counts::default(); num_classes];
    let mut matches = 0usize;

    for (&p, &t) in predictions.iter().zip(targets) {
        if p >= num_classes || t >= num_classes {
            return Err(ClfError::MetricInput(format!(
                "label out of range for {num_classes} classes: predicted {p}, true {t}"
            )));
        }
        if p == t {
            matches += 1;
            counts[t].tp += 1;
        } else {
            counts[p].fp  += 1;
            counts[t].fn_ += 1;
        }
    }

    let accuracy = ratio(matches, predictions.len());

    let (precision, recall, f1) = if num_classes == 2 {
        let pos = counts[1];
        (pos.precision(), pos.recall(), pos.f1())
    } else {
        // Non-empty input means at least one class occurs
        let present: Vec<Counts> = counts.into_iter().filter(Counts::occurs).collect();
        let n = present.len() as f64;
        (
            present.iter().map(Counts::precision).sum::<f64>() / n,
            present.iter().map(Counts::recall).sum::<f64>() / n,
            present.iter().map(Counts::f1).sum::<f64>() / n,
        )
    };

    Ok(ClassificationMetrics { accuracy, precision, recall, f1 })
}
