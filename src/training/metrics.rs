//! Loss history and classification metrics

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::data::Signal;
use crate::error::Result;

/// Per-epoch losses recorded during training
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingMetrics {
    /// Training loss per epoch (before that epoch's update)
    pub train_losses: Vec<f64>,
    /// Held-out loss per epoch (after that epoch's update)
    pub test_losses: Vec<f64>,
}

impl TrainingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_epoch(&mut self, train_loss: f64, test_loss: f64) {
        self.train_losses.push(train_loss);
        self.test_losses.push(test_loss);
    }

    pub fn num_epochs(&self) -> usize {
        self.train_losses.len()
    }

    pub fn latest_train_loss(&self) -> Option<f64> {
        self.train_losses.last().copied()
    }

    pub fn latest_test_loss(&self) -> Option<f64> {
        self.test_losses.last().copied()
    }

    /// 1-based epoch with the lowest test loss
    pub fn best_test_epoch(&self) -> Option<(usize, f64)> {
        self.test_losses
            .iter()
            .copied()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, loss)| (i + 1, loss))
    }

    /// Save metrics to CSV file
    pub fn save_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(["epoch", "train_loss", "test_loss"])?;

        for i in 0..self.num_epochs() {
            writer.write_record([
                (i + 1).to_string(),
                self.train_losses[i].to_string(),
                self.test_losses[i].to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Load metrics from CSV file
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut metrics = Self::new();

        for (row, result) in reader.records().enumerate() {
            let record = result?;
            let parse = |idx: usize, column: &str| -> Result<f64> {
                let value = record.get(idx).unwrap_or_default();
                value.parse().map_err(|_| crate::Error::Parse {
                    row: row + 1,
                    column: column.to_string(),
                    value: value.to_string(),
                })
            };
            let train = parse(1, "train_loss")?;
            let test = parse(2, "test_loss")?;
            metrics.record_epoch(train, test);
        }

        Ok(metrics)
    }
}

/// Accuracy and confusion matrix on a labelled set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Fraction of exact label matches
    pub accuracy: f64,
    /// `confusion[actual][predicted]`, classes in buy / hold / sell order
    pub confusion: [[usize; Signal::NUM_CLASSES]; Signal::NUM_CLASSES],
    pub num_examples: usize,
}

impl EvaluationReport {
    /// Build from class indices; out-of-range indices count as misses
    pub fn from_predictions(targets: &[i64], predictions: &[i64]) -> Self {
        let mut confusion = [[0usize; Signal::NUM_CLASSES]; Signal::NUM_CLASSES];
        let mut correct = 0usize;

        for (&t, &p) in targets.iter().zip(predictions) {
            if t == p {
                correct += 1;
            }
            let in_range = |c: i64| (0..Signal::NUM_CLASSES as i64).contains(&c);
            if in_range(t) && in_range(p) {
                confusion[t as usize][p as usize] += 1;
            }
        }

        let num_examples = targets.len().min(predictions.len());
        let accuracy = if num_examples > 0 {
            correct as f64 / num_examples as f64
        } else {
            0.0
        };

        Self {
            accuracy,
            confusion,
            num_examples,
        }
    }

    /// Precision for one class, `None` when it was never predicted
    pub fn precision(&self, signal: Signal) -> Option<f64> {
        let c = signal.class_index() as usize;
        let predicted: usize = self.confusion.iter().map(|row| row[c]).sum();
        (predicted > 0).then(|| self.confusion[c][c] as f64 / predicted as f64)
    }

    /// Recall for one class, `None` when it never occurs
    pub fn recall(&self, signal: Signal) -> Option<f64> {
        let c = signal.class_index() as usize;
        let actual: usize = self.confusion[c].iter().sum();
        (actual > 0).then(|| self.confusion[c][c] as f64 / actual as f64)
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy: {:.4} ({} examples)", self.accuracy, self.num_examples)?;
        writeln!(f, "{:<8} {:>8} {:>8} {:>8}", "actual", "buy", "hold", "sell")?;
        for signal in Signal::all() {
            let row = &self.confusion[signal.class_index() as usize];
            writeln!(f, "{:<8} {:>8} {:>8} {:>8}", signal.to_string(), row[0], row[1], row[2])?;
        }
        for signal in Signal::all() {
            let fmt_opt = |v: Option<f64>| v.map_or("-".to_string(), |x| format!("{x:.3}"));
            writeln!(
                f,
                "{:<8} precision={} recall={}",
                signal.to_string(),
                fmt_opt(self.precision(signal)),
                fmt_opt(self.recall(signal))
            )?;
        }
        Ok(())
    }
}
