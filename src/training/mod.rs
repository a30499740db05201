//! Training module for the signal classifier
//!
//! This module provides:
//! - Tensor datasets for windows and single rows
//! - Full-batch training loop with per-epoch test loss
//! - Loss history and classification metrics
//! - The end-to-end training run used by the CLI

mod dataset;
mod metrics;
mod pipeline;
mod trainer;

pub use dataset::TensorDataset;
pub use metrics::{EvaluationReport, TrainingMetrics};
pub use pipeline::{run_training, train_on_series, write_features, TrainingOutcome};
pub use trainer::{Trainer, TrainingConfig};
