//! End-to-end training run: CSV → features → split → scale → train → save

use std::path::Path;

use tch::{nn, Device};
use tracing::info;

use super::dataset::TensorDataset;
use super::metrics::{EvaluationReport, TrainingMetrics};
use super::trainer::Trainer;
use crate::data::{build_features, train_test_split, PairSeries, StandardScaler, FEATURE_NAMES};
use crate::error::{Error, Result};
use crate::model::SignalNet;
use crate::utils::{save_run, Config, RunSummary};

/// Everything a finished run produced
#[derive(Debug)]
pub struct TrainingOutcome {
    pub metrics: TrainingMetrics,
    pub report: EvaluationReport,
    pub scaler: StandardScaler,
    pub summary: RunSummary,
}

/// Load the pair CSV named in `config` and train on it
pub fn run_training(config: &Config) -> Result<TrainingOutcome> {
    config.validate()?;
    let series = PairSeries::load_csv(
        &config.data.path,
        &config.data.price_column,
        &config.data.pair_column,
    )?;
    info!("Loaded {} rows from {}", series.len(), config.data.path);

    train_on_series(&series, config, config.get_device())
}

/// Train on an already loaded series and write every artifact in `config.paths`
///
/// The scaler is fitted on the training rows only. For the LSTM each side of
/// the split is windowed separately after scaling.
pub fn train_on_series(series: &PairSeries, config: &Config, device: Device) -> Result<TrainingOutcome> {
    config.validate()?;
    if config.model.input_size != FEATURE_NAMES.len() as i64 {
        return Err(Error::Config(format!(
            "model input_size must be {}, got {}",
            FEATURE_NAMES.len(),
            config.model.input_size
        )));
    }

    let frame = build_features(series, &config.features)?;
    let labels = frame.labels(config.labels.threshold);
    info!(
        "Built {} feature rows ({} dropped during warm-up or as non-finite)",
        frame.len(),
        series.len() - frame.len()
    );

    let split = train_test_split(&frame.to_matrix(), &labels, &config.split_config())?;
    let scaler = StandardScaler::fit(&split.x_train)?.with_feature_names(&FEATURE_NAMES)?;
    let x_train = scaler.transform(&split.x_train)?;
    let x_test = scaler.transform(&split.x_test)?;

    let seq_len = config.training.sequence_length;
    let kind = config.model.kind;
    let train = TensorDataset::for_model(kind, &x_train, &split.y_train, seq_len, device)?;
    let test = TensorDataset::for_model(kind, &x_test, &split.y_test, seq_len, device)?;
    info!(
        "{} train / {} test examples, train class counts (buy/hold/sell) {:?}",
        train.len(),
        test.len(),
        train.class_counts()?
    );

    tch::manual_seed(config.training.seed as i64);
    let vs = nn::VarStore::new(device);
    let model = SignalNet::new(&vs.root(), &config.model);

    let mut trainer = Trainer::new(config.training_config());
    trainer.fit(&model, &vs, &train, &test)?;
    let report = trainer.evaluate(&model, &test)?;
    info!("Test accuracy: {:.4}", report.accuracy);

    let metrics = trainer.metrics().clone();
    let summary = RunSummary::new(config, &metrics, &report, train.len(), test.len());
    save_run(&vs, &scaler, &metrics, &summary, &config.paths)?;

    Ok(TrainingOutcome {
        metrics,
        report,
        scaler,
        summary,
    })
}

/// Write the feature table with labels to CSV
pub fn write_features<P: AsRef<Path>>(series: &PairSeries, config: &Config, output: P) -> Result<usize> {
    let frame = build_features(series, &config.features)?;
    frame.save_csv(&output, config.labels.threshold)?;
    info!("Wrote {} feature rows to {}", frame.len(), output.as_ref().display());
    Ok(frame.len())
}
