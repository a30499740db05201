//! Standard scaler: zero mean, unit variance per feature
//!
//! The fitted scaler is stored next to the trained weights; its `mean` and
//! `scale` vectors are later extracted into [`ScalerParams`] for inference.

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Fitted standard scaler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Names of the scaled columns
    pub feature_names: Vec<String>,
    /// Per-feature mean
    pub mean: Vec<f64>,
    /// Per-feature population variance
    pub var: Vec<f64>,
    /// Per-feature divisor (std, or 1.0 for constant columns)
    pub scale: Vec<f64>,
    /// Number of rows the scaler was fit on
    pub n_samples_seen: usize,
}

impl StandardScaler {
    /// Fit on a (rows, features) matrix
    pub fn fit(data: &Array2<f64>) -> Result<Self> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::InsufficientData("cannot fit scaler on zero rows".into()));
        }

        let mean: Vec<f64> = data
            .mean_axis(Axis(0))
            .map(|m| m.to_vec())
            .unwrap_or_default();

        let var: Vec<f64> = data
            .columns()
            .into_iter()
            .zip(&mean)
            .map(|(col, &m)| col.iter().map(|x| (x - m).powi(2)).sum::<f64>() / n as f64)
            .collect();

        let scale = var
            .iter()
            .map(|&v| {
                let std = v.sqrt();
                if std > f64::EPSILON {
                    std
                } else {
                    1.0
                }
            })
            .collect();

        let feature_names = (0..data.ncols()).map(|i| format!("x{i}")).collect();

        Ok(Self {
            feature_names,
            mean,
            var,
            scale,
            n_samples_seen: n,
        })
    }

    /// Attach column names
    pub fn with_feature_names<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        if names.len() != self.n_features() {
            return Err(Error::length_mismatch("feature names", self.n_features(), names.len()));
        }
        self.feature_names = names.iter().map(|n| n.as_ref().to_string()).collect();
        Ok(self)
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Scale a matrix with the fitted statistics
    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data)?;
        let mut out = data.clone();
        for mut row in out.rows_mut() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = (*v - self.mean[j]) / self.scale[j];
            }
        }
        Ok(out)
    }

    /// Undo [`StandardScaler::transform`]
    pub fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_width(data)?;
        let mut out = data.clone();
        for mut row in out.rows_mut() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = *v * self.scale[j] + self.mean[j];
            }
        }
        Ok(out)
    }

    /// Fit and transform in one step
    pub fn fit_transform(data: &Array2<f64>) -> Result<(Self, Array2<f64>)> {
        let scaler = Self::fit(data)?;
        let scaled = scaler.transform(data)?;
        Ok((scaler, scaled))
    }

    /// Inference-side parameters
    pub fn params(&self) -> ScalerParams {
        ScalerParams {
            mean: self.mean.clone(),
            scale: self.scale.clone(),
        }
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let scaler: StandardScaler = serde_json::from_str(&content)?;
        scaler.params().validate()?;
        Ok(scaler)
    }

    fn check_width(&self, data: &Array2<f64>) -> Result<()> {
        if data.ncols() != self.n_features() {
            return Err(Error::length_mismatch("feature columns", self.n_features(), data.ncols()));
        }
        Ok(())
    }
}

/// Mean and scale vectors consumed at inference time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerParams {
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Both vectors must have the same length
    pub fn validate(&self) -> Result<()> {
        if self.mean.len() != self.scale.len() {
            return Err(Error::length_mismatch("scale", self.mean.len(), self.scale.len()));
        }
        Ok(())
    }

    /// Scale one raw feature vector
    pub fn apply(&self, input: &[f64]) -> Result<Vec<f64>> {
        if input.len() != self.n_features() {
            return Err(Error::length_mismatch("input features", self.n_features(), input.len()));
        }
        Ok(input
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (m, s))| (x - m) / s)
            .collect())
    }

    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.validate()?;
        let content = serde_json::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let params: ScalerParams = serde_json::from_str(&content)?;
        params.validate()?;
        Ok(params)
    }
}
