// ============================================================
// Layer 6 — Trial Logger
// ============================================================
// Records every epoch of every trial to a CSV file, and the
// final trial history to JSON.
//
// Output files:
//   <dir>/metrics.csv  — one row per (trial, epoch)
//   <dir>/trials.json  — status, accuracies and value per trial
//
// Example CSV output:
//   trial,epoch,batch_size,learning_rate,train_loss,val_loss,accuracy,precision,recall,f1
//   0,1,16,0.000031,0.684512,0.671020,0.604000,0.611000,0.590000,0.600000
//
// A pruned trial simply stops contributing rows.
//
// Reference: Rust Book §12 (I/O and File Handling)

use std::{fs::{self, File}, path::{Path, PathBuf}};

use serde::Serialize;

use crate::domain::error::Result;
use crate::domain::hyperparams::HyperparameterDraw;
use crate::ml::tuner::{EpochReport, TrialObserver, TrialRecord};

pub const METRICS_FILE: &str = "metrics.csv";
pub const TRIALS_FILE: &str  = "trials.json";

/// One CSV row
#[derive(Debug, Clone, Serialize)]
struct EpochRow {
    trial:         usize,
    /// Starts at 1
    epoch:         usize,
    batch_size:    usize,
    learning_rate: f64,
    train_loss:    f64,
    val_loss:      f64,
    accuracy:      f64,
    precision:     f64,
    recall:        f64,
    f1:            f64,
}

pub struct TrialLogger {
    dir:    PathBuf,
    writer: csv::Writer<File>,
}

impl TrialLogger {
    /// Start a fresh metrics.csv in `dir`, replacing any previous run's.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let writer = csv::Writer::from_path(dir.join(METRICS_FILE))?;
        tracing::debug!("Logging epoch metrics to '{}'", dir.join(METRICS_FILE).display());
        Ok(Self { dir, writer })
    }

    pub fn write_history(&self, history: &[TrialRecord]) -> Result<()> {
        let path = self.dir.join(TRIALS_FILE);
        fs::write(&path, serde_json::to_string_pretty(history)?)?;
        tracing::debug!("Wrote trial history to '{}'", path.display());
        Ok(())
    }
}

impl TrialObserver for TrialLogger {
    fn on_epoch(
        &mut self,
        trial:  usize,
        draw:   &HyperparameterDraw,
        epoch:  usize,
        report: &EpochReport,
    ) -> Result<()> {
        self.writer.serialize(EpochRow {
            trial,
            epoch:         epoch + 1,
            batch_size:    draw.batch_size,
            learning_rate: draw.learning_rate,
            train_loss:    report.train_loss,
            val_loss:      report.val_loss,
            accuracy:      report.metrics.accuracy,
            precision:     report.metrics.precision,
            recall:        report.metrics.recall,
            f1:            report.metrics.f1,
        })?;
        // Flush per row so a crashed run still leaves its curve
        self.writer.flush()?;
        Ok(())
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::evaluator::ClassificationMetrics;
    use crate::ml::tuner::TrialStatus;

    fn report(accuracy: f64) -> EpochReport {
        EpochReport {
            train_loss: 0.7,
            val_loss:   0.6,
            metrics:    ClassificationMetrics { accuracy, precision: 0.5, recall: 0.5, f1: 0.5 },
        }
    }

    #[test]
    fn test_rows_appended_per_epoch() {
        let dir  = tempfile::tempdir().unwrap();
        let draw = HyperparameterDraw { batch_size: 16, learning_rate: 3e-5 };
        let mut logger = TrialLogger::new(dir.path()).unwrap();

        logger.on_epoch(0, &draw, 0, &report(0.6)).unwrap();
        logger.on_epoch(0, &draw, 1, &report(0.7)).unwrap();

        let text  = fs::read_to_string(dir.path().join(METRICS_FILE)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("trial,epoch,batch_size,learning_rate"));
        assert!(lines[2].starts_with("0,2,16,"));
    }

    #[test]
    fn test_history_written_as_json() {
        let dir    = tempfile::tempdir().unwrap();
        let logger = TrialLogger::new(dir.path()).unwrap();
        let record = TrialRecord {
            id:         0,
            draw:       HyperparameterDraw { batch_size: 8, learning_rate: 1e-5 },
            status:     TrialStatus::Pruned,
            accuracies: vec![0.4],
            value:      None,
            best_epoch: None,
        };
        logger.write_history(&[record.clone()]).unwrap();

        let json = fs::read_to_string(dir.path().join(TRIALS_FILE)).unwrap();
        assert!(json.contains("\"pruned\""));
        let back: Vec<TrialRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vec![record]);
    }
}
