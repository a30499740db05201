//! Full-batch training loop for the signal classifier
//!
//! Every epoch runs one forward/backward pass over the whole training set,
//! then scores the held-out set without gradients.

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tch::nn::{self, ModuleT, OptimizerConfig};
use tch::{Device, Kind, Tensor};
use tracing::{debug, info};

use super::dataset::TensorDataset;
use super::metrics::{EvaluationReport, TrainingMetrics};
use crate::error::{Error, Result};
use crate::model::SignalNet;

/// Training configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of training epochs
    pub epochs: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Log a loss line every N epochs
    pub log_every: usize,
    /// Draw a progress bar on stderr
    pub show_progress: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.001,
            log_every: 1,
            show_progress: true,
        }
    }
}

/// Signal classifier trainer
pub struct Trainer {
    config: TrainingConfig,
    metrics: TrainingMetrics,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> Self {
        Self {
            config,
            metrics: TrainingMetrics::new(),
        }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Train `model`, whose parameters live in `vs`
    ///
    /// The recorded train loss is the one computed before that epoch's
    /// update; the test loss is computed after it.
    ///
    /// # Errors
    ///
    /// `InsufficientData` when either dataset is empty, `NonFiniteLoss` as
    /// soon as a loss turns NaN or infinite.
    pub fn fit(
        &mut self,
        model: &SignalNet,
        vs: &nn::VarStore,
        train: &TensorDataset,
        test: &TensorDataset,
    ) -> Result<&TrainingMetrics> {
        if train.is_empty() {
            return Err(Error::InsufficientData("training set is empty".into()));
        }
        if test.is_empty() {
            return Err(Error::InsufficientData("test set is empty".into()));
        }

        let mut opt = nn::Adam::default().build(vs, self.config.learning_rate)?;
        let epochs = self.config.epochs;
        let log_every = self.config.log_every.max(1);

        info!(
            "Starting {:?} training for {} epochs ({} train / {} test examples)",
            model.kind(),
            epochs,
            train.len(),
            test.len()
        );

        let pb = if self.config.show_progress {
            let pb = ProgressBar::new(epochs as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("##-"),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        for epoch in 1..=epochs {
            let logits = model.forward_t(&train.inputs, true);
            let loss = logits.cross_entropy_for_logits(&train.targets);
            opt.backward_step(&loss);
            let train_loss = loss.f_double_value(&[])?;

            let test_loss = tch::no_grad(|| {
                model
                    .forward_t(&test.inputs, false)
                    .cross_entropy_for_logits(&test.targets)
            })
            .f_double_value(&[])?;

            check_finite(train_loss, epoch, "train")?;
            check_finite(test_loss, epoch, "test")?;
            self.metrics.record_epoch(train_loss, test_loss);

            if epoch % log_every == 0 || epoch == epochs {
                info!(
                    "Epoch [{}/{}], Train Loss: {:.4}, Test Loss: {:.4}",
                    epoch, epochs, train_loss, test_loss
                );
            }

            pb.set_message(format!("train={:.4} test={:.4}", train_loss, test_loss));
            pb.inc(1);
        }

        pb.finish_with_message("done");

        if let Some((epoch, loss)) = self.metrics.best_test_epoch() {
            debug!("Lowest test loss {:.4} at epoch {}", loss, epoch);
        }

        Ok(&self.metrics)
    }

    /// Score `model` on a dataset in eval mode
    pub fn evaluate(&self, model: &SignalNet, dataset: &TensorDataset) -> Result<EvaluationReport> {
        let predictions = model.predict_classes(&dataset.inputs);
        let predicted = to_class_vec(&predictions)?;
        let targets = to_class_vec(&dataset.targets)?;

        Ok(EvaluationReport::from_predictions(&targets, &predicted))
    }
}

fn check_finite(loss: f64, epoch: usize, phase: &str) -> Result<()> {
    if loss.is_finite() {
        Ok(())
    } else {
        Err(Error::NonFiniteLoss {
            epoch,
            phase: phase.to_string(),
        })
    }
}

fn to_class_vec(tensor: &Tensor) -> Result<Vec<i64>> {
    let flat = tensor.flatten(0, -1).to_kind(Kind::Int64).to_device(Device::Cpu);
    Ok(Vec::<i64>::try_from(&flat)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Signal;
    use crate::model::ModelConfig;
    use ndarray::Array2;

    /// Rows whose first feature decides the class
    fn separable(n: usize) -> (Array2<f64>, Vec<Signal>) {
        let rows = Array2::from_shape_fn((n, 4), |(i, j)| {
            let level = (i % 3) as f64 - 1.0;
            if j == 0 {
                -2.0 * level
            } else {
                0.1 * ((i * 7 + j) % 5) as f64
            }
        });
        let labels = (0..n)
            .map(|i| Signal::from_class_index((i % 3) as i64).unwrap())
            .collect();
        (rows, labels)
    }

    fn quiet(epochs: usize, lr: f64) -> TrainingConfig {
        TrainingConfig {
            epochs,
            learning_rate: lr,
            log_every: 10,
            show_progress: false,
        }
    }

    #[test]
    fn test_mlp_learns_separable_rows() {
        tch::manual_seed(7);
        let (rows, labels) = separable(90);
        let train = TensorDataset::from_rows(&rows, &labels, Device::Cpu);
        let test = TensorDataset::from_rows(&rows, &labels, Device::Cpu);

        let vs = nn::VarStore::new(Device::Cpu);
        let config = ModelConfig::mlp().with_mlp_hidden(vec![32, 16]).with_dropout(0.0);
        let model = SignalNet::new(&vs.root(), &config);

        let mut trainer = Trainer::new(quiet(60, 0.01));
        let metrics = trainer.fit(&model, &vs, &train, &test).unwrap();

        assert_eq!(metrics.num_epochs(), 60);
        assert!(metrics.latest_train_loss().unwrap() < metrics.train_losses[0]);

        let report = trainer.evaluate(&model, &test).unwrap();
        assert_eq!(report.num_examples, 90);
        assert!(report.accuracy > 0.9);
    }

    #[test]
    fn test_lstm_records_every_epoch() {
        tch::manual_seed(11);
        let (rows, labels) = separable(40);
        let train = TensorDataset::for_model(crate::model::ModelKind::Lstm, &rows, &labels, 5, Device::Cpu).unwrap();

        let vs = nn::VarStore::new(Device::Cpu);
        let config = ModelConfig::lstm().with_hidden_size(8).with_layers(1);
        let model = SignalNet::new(&vs.root(), &config);

        let mut trainer = Trainer::new(quiet(3, 0.001));
        let metrics = trainer.fit(&model, &vs, &train, &train).unwrap();

        assert_eq!(metrics.train_losses.len(), 3);
        assert_eq!(metrics.test_losses.len(), 3);
        assert!(metrics.train_losses.iter().all(|l| l.is_finite()));
    }

    #[test]
    fn test_empty_dataset_rejected() {
        let (rows, labels) = separable(6);
        let train = TensorDataset::from_rows(&rows, &labels, Device::Cpu);
        let empty = TensorDataset::from_rows(&Array2::zeros((0, 4)), &[], Device::Cpu);

        let vs = nn::VarStore::new(Device::Cpu);
        let model = SignalNet::new(&vs.root(), &ModelConfig::mlp().with_mlp_hidden(vec![4]));

        let mut trainer = Trainer::new(quiet(1, 0.001));
        let err = trainer.fit(&model, &vs, &train, &empty).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
    }

    #[test]
    fn test_nan_inputs_stop_training() {
        let (mut rows, labels) = separable(9);
        rows[[0, 0]] = f64::NAN;
        let train = TensorDataset::from_rows(&rows, &labels, Device::Cpu);

        let vs = nn::VarStore::new(Device::Cpu);
        let model = SignalNet::new(&vs.root(), &ModelConfig::mlp().with_mlp_hidden(vec![4]));

        let mut trainer = Trainer::new(quiet(5, 0.001));
        let err = trainer.fit(&model, &vs, &train, &train).unwrap_err();
        assert!(matches!(err, Error::NonFiniteLoss { epoch: 1, .. }));
    }
}
