//! Spread and rolling z-score features
//!
//! The spread is the difference of the two instruments' `lag`-period price
//! ratios:
//!
//! ```text
//! spread[i] = close[i] / close[i - lag] - close2[i] / close2[i - lag]
//! ```
//!
//! Its trailing mean and sample standard deviation over `window` periods give
//! the z-score used for labelling. Rows where any of these columns is not
//! finite (warm-up rows, gaps in the input, flat windows) are dropped.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::labels::{label_zscores, Signal};
use super::pair::PairSeries;
use crate::error::{Error, Result};

/// Feature column names, in matrix column order
pub const FEATURE_NAMES: [&str; 4] = ["Spread", "Spread_Mean", "Spread_Std", "Zscore"];

/// Configuration for the spread features
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadFeatureConfig {
    /// Number of periods for the price ratio
    pub lag: usize,
    /// Rolling window for mean / std
    pub window: usize,
}

impl Default for SpreadFeatureConfig {
    fn default() -> Self {
        Self { lag: 2, window: 20 }
    }
}

impl SpreadFeatureConfig {
    pub fn validate(&self) -> Result<()> {
        if self.lag == 0 {
            return Err(Error::Config("spread lag must be >= 1".into()));
        }
        if self.window < 2 {
            return Err(Error::Config("rolling window must be >= 2".into()));
        }
        Ok(())
    }

    /// Number of leading rows that can never have a complete feature row
    pub fn warmup_rows(&self) -> usize {
        self.lag + self.window - 1
    }
}

/// Feature rows surviving the NaN drop
#[derive(Debug, Clone, Default)]
pub struct FeatureFrame {
    pub timestamps: Vec<String>,
    pub spread: Vec<f64>,
    pub spread_mean: Vec<f64>,
    pub spread_std: Vec<f64>,
    pub zscore: Vec<f64>,
}

impl FeatureFrame {
    pub fn len(&self) -> usize {
        self.zscore.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zscore.is_empty()
    }

    /// Feature matrix of shape (rows, 4) in [`FEATURE_NAMES`] order
    pub fn to_matrix(&self) -> Array2<f64> {
        let mut matrix = Array2::<f64>::zeros((self.len(), FEATURE_NAMES.len()));
        for i in 0..self.len() {
            matrix[[i, 0]] = self.spread[i];
            matrix[[i, 1]] = self.spread_mean[i];
            matrix[[i, 2]] = self.spread_std[i];
            matrix[[i, 3]] = self.zscore[i];
        }
        matrix
    }

    /// One label per row
    pub fn labels(&self, threshold: f64) -> Vec<Signal> {
        label_zscores(&self.zscore, threshold)
    }

    /// Write features plus label to CSV
    pub fn save_csv<P: AsRef<Path>>(&self, path: P, threshold: f64) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record([
            "Datetime",
            FEATURE_NAMES[0],
            FEATURE_NAMES[1],
            FEATURE_NAMES[2],
            FEATURE_NAMES[3],
            "Signal",
        ])?;

        for (i, label) in self.labels(threshold).iter().enumerate() {
            writer.write_record([
                self.timestamps[i].clone(),
                self.spread[i].to_string(),
                self.spread_mean[i].to_string(),
                self.spread_std[i].to_string(),
                self.zscore[i].to_string(),
                label.class_index().to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Relative spread of two price series over `lag` periods
///
/// The first `lag` values are `NaN`.
pub fn lagged_spread(close: &[f64], close2: &[f64], lag: usize) -> Vec<f64> {
    let n = close.len().min(close2.len());
    (0..n)
        .map(|i| {
            if i < lag {
                f64::NAN
            } else {
                close[i] / close[i - lag] - close2[i] / close2[i - lag]
            }
        })
        .collect()
}

/// Trailing mean over `window` values; `NaN` until the window is full or
/// while it contains a non-finite value
pub fn rolling_mean(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |w| w.iter().sum::<f64>() / w.len() as f64)
}

/// Trailing sample standard deviation (ddof = 1) over `window` values
pub fn rolling_std(values: &[f64], window: usize) -> Vec<f64> {
    rolling(values, window, |w| {
        let n = w.len() as f64;
        let mean = w.iter().sum::<f64>() / n;
        let var = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
        var.sqrt()
    })
}

fn rolling<F>(values: &[f64], window: usize, stat: F) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    if window == 0 {
        return vec![f64::NAN; values.len()];
    }

    (0..values.len())
        .map(|i| {
            if i + 1 < window {
                return f64::NAN;
            }
            let w = &values[i + 1 - window..=i];
            if w.iter().all(|v| v.is_finite()) {
                stat(w)
            } else {
                f64::NAN
            }
        })
        .collect()
}

/// Compute the feature frame for a price pair
pub fn build_features(series: &PairSeries, config: &SpreadFeatureConfig) -> Result<FeatureFrame> {
    config.validate()?;

    let close = series.close();
    let close2 = series.close2();

    let spread = lagged_spread(&close, &close2, config.lag);
    let spread_mean = rolling_mean(&spread, config.window);
    let spread_std = rolling_std(&spread, config.window);

    let mut frame = FeatureFrame::default();
    for i in 0..spread.len() {
        let zscore = (spread[i] - spread_mean[i]) / spread_std[i];
        let row = [spread[i], spread_mean[i], spread_std[i], zscore];
        if row.iter().all(|v| v.is_finite()) {
            frame.timestamps.push(series.data[i].timestamp.clone());
            frame.spread.push(spread[i]);
            frame.spread_mean.push(spread_mean[i]);
            frame.spread_std.push(spread_std[i]);
            frame.zscore.push(zscore);
        }
    }

    tracing::debug!(
        "Built {} feature rows from {} input rows ({} dropped)",
        frame.len(),
        series.len(),
        series.len() - frame.len()
    );
    Ok(frame)
}
