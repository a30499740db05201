//! Signal prediction with an exported TorchScript module
//!
//! The predictor takes raw (unscaled) feature rows, applies the saved scaler
//! parameters and runs the traced network. The LSTM expects a window of
//! `sequence_length` rows, the MLP a single row.

use std::path::Path;

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tch::{CModule, Device, Kind, Tensor};

use crate::data::{ScalerParams, Signal};
use crate::error::{Error, Result};
use crate::model::ModelKind;

/// Predicted signal with its class probabilities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub signal: Signal,
    /// Softmax over (buy, hold, sell)
    pub probabilities: Vec<f64>,
}

impl Prediction {
    /// Probability of the predicted class
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .get(self.signal.class_index() as usize)
            .copied()
            .unwrap_or(0.0)
    }
}

pub struct SignalPredictor {
    module: CModule,
    params: ScalerParams,
    kind: ModelKind,
    /// Window length the LSTM was trained on
    sequence_length: usize,
    device: Device,
}

impl SignalPredictor {
    /// Load a traced module and its scaler parameters
    pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
        module_path: P,
        params_path: Q,
        kind: ModelKind,
        sequence_length: usize,
        device: Device,
    ) -> Result<Self> {
        let mut module = CModule::load_on_device(module_path, device)?;
        module.set_eval();
        let params = ScalerParams::load_json(params_path)?;
        Ok(Self::new(module, params, kind, sequence_length, device))
    }

    pub fn new(
        module: CModule,
        params: ScalerParams,
        kind: ModelKind,
        sequence_length: usize,
        device: Device,
    ) -> Self {
        Self {
            module,
            params,
            kind,
            sequence_length,
            device,
        }
    }

    pub fn sequence_length(&self) -> usize {
        self.sequence_length
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn params(&self) -> &ScalerParams {
        &self.params
    }

    /// Predict from one raw feature row (MLP only)
    pub fn predict_row(&self, row: &[f64]) -> Result<Prediction> {
        if self.kind != ModelKind::Mlp {
            return Err(Error::Config("the LSTM predictor needs a window, not a single row".into()));
        }
        let scaled = self.params.apply(row)?;
        self.run(&scaled, &[1, scaled.len() as i64])
    }

    /// Predict from a window of raw feature rows, oldest first (LSTM only)
    ///
    /// The window must have exactly `sequence_length` rows.
    pub fn predict_window(&self, window: &Array2<f64>) -> Result<Prediction> {
        if self.kind != ModelKind::Lstm {
            return Err(Error::Config("the MLP predictor takes a single row".into()));
        }
        if window.nrows() != self.sequence_length {
            return Err(Error::length_mismatch("window rows", self.sequence_length, window.nrows()));
        }

        let mut scaled = Vec::with_capacity(window.len());
        for row in window.rows() {
            scaled.extend(self.params.apply(&row.to_vec())?);
        }
        self.run(&scaled, &[1, window.nrows() as i64, window.ncols() as i64])
    }

    /// Predict from the latest rows of a feature matrix
    ///
    /// Uses the last `sequence_length` rows for the LSTM and the last row
    /// for the MLP.
    pub fn predict_latest(&self, features: &Array2<f64>) -> Result<Prediction> {
        let n = features.nrows();
        let sequence_length = self.sequence_length;
        match self.kind {
            ModelKind::Lstm => {
                if n < sequence_length {
                    return Err(Error::InsufficientData(format!(
                        "need {sequence_length} feature rows, got {n}"
                    )));
                }
                let window = features.slice(ndarray::s![n - sequence_length.., ..]).to_owned();
                self.predict_window(&window)
            }
            ModelKind::Mlp => {
                let last = n
                    .checked_sub(1)
                    .ok_or_else(|| Error::InsufficientData("no feature rows".into()))?;
                self.predict_row(&features.row(last).to_vec())
            }
        }
    }

    fn run(&self, scaled: &[f64], shape: &[i64]) -> Result<Prediction> {
        let values: Vec<f32> = scaled.iter().map(|&v| v as f32).collect();
        let input = Tensor::from_slice(&values).reshape(shape).to_device(self.device);

        let logits = tch::no_grad(|| self.module.forward_ts(&[input]))?;
        let probs = logits
            .softmax(-1, Kind::Float)
            .flatten(0, -1)
            .to_kind(Kind::Double)
            .to_device(Device::Cpu);
        let probabilities = Vec::<f64>::try_from(&probs)?;

        let best = probabilities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i as i64)
            .ok_or_else(|| Error::InsufficientData("model returned no outputs".into()))?;
        let signal = Signal::from_class_index(best)
            .ok_or_else(|| Error::Config(format!("model returned {} classes", probabilities.len())))?;

        Ok(Prediction { signal, probabilities })
    }
}
