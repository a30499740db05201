//! Saving the artifacts of a training run
//!
//! A run leaves behind the weights, the fitted scaler, the per-epoch losses
//! and a JSON summary that records the architecture the weights belong to.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tch::nn::VarStore;

use super::config::{Config, PathsConfig};
use crate::data::StandardScaler;
use crate::error::Result;
use crate::model::ModelConfig;
use crate::training::{EvaluationReport, TrainingMetrics};

/// Summary of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Architecture of the saved weights
    pub model: ModelConfig,
    pub sequence_length: usize,
    pub epochs: usize,
    pub learning_rate: f64,
    pub final_train_loss: f64,
    pub final_test_loss: f64,
    pub train_examples: usize,
    pub test_examples: usize,
    pub evaluation: EvaluationReport,
    /// RFC 3339 time the run finished
    pub timestamp: String,
}

impl RunSummary {
    pub fn new(
        config: &Config,
        metrics: &TrainingMetrics,
        evaluation: &EvaluationReport,
        train_examples: usize,
        test_examples: usize,
    ) -> Self {
        Self {
            model: config.model.clone(),
            sequence_length: config.training.sequence_length,
            epochs: metrics.num_epochs(),
            learning_rate: config.training.learning_rate,
            final_train_loss: metrics.latest_train_loss().unwrap_or(0.0),
            final_test_loss: metrics.latest_test_loss().unwrap_or(0.0),
            train_examples,
            test_examples,
            evaluation: evaluation.clone(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Write weights, scaler, losses and summary to the configured paths
pub fn save_run(
    vs: &VarStore,
    scaler: &StandardScaler,
    metrics: &TrainingMetrics,
    summary: &RunSummary,
    paths: &PathsConfig,
) -> Result<()> {
    for path in [&paths.weights, &paths.scaler, &paths.metrics, &paths.summary] {
        ensure_parent_dir(path)?;
    }

    vs.save(&paths.weights)?;
    scaler.save_json(&paths.scaler)?;
    metrics.save_csv(&paths.metrics)?;
    summary.save_json(&paths.summary)?;

    tracing::info!(
        "Saved weights to {}, scaler to {}, losses to {}",
        paths.weights,
        paths.scaler,
        paths.metrics
    );
    Ok(())
}

/// Create the parent directory of `path` if it has one
pub fn ensure_parent_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_summary_serialization() {
        let mut metrics = TrainingMetrics::new();
        metrics.record_epoch(1.1, 1.0);
        let report = EvaluationReport::from_predictions(&[0, 1, 2], &[0, 1, 1]);

        let summary = RunSummary::new(&Config::default(), &metrics, &report, 80, 20);
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.json");
        summary.save_json(&path).unwrap();

        let loaded = RunSummary::load_json(&path).unwrap();
        assert_eq!(loaded.epochs, 1);
        assert_eq!(loaded.model, summary.model);
        assert_eq!(loaded.evaluation, report);
        assert_eq!(loaded.final_test_loss, 1.0);
    }

    #[test]
    fn test_ensure_parent_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("weights.ot");
        ensure_parent_dir(&path).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
        ensure_parent_dir("weights.ot").unwrap();
    }
}
