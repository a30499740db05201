//! # Spread Signal Classifier
//!
//! Trains a three-class (buy / hold / sell) classifier on the z-score of the
//! relative spread between two price series, exports the trained network to
//! TorchScript and converts the fitted feature scaler into a plain JSON file
//! for the inference side.
//!
//! ## Modules
//!
//! - `data`: CSV loading, spread features, labels, windows, split, scaler
//! - `model`: LSTM and deep feed-forward classifiers
//! - `training`: Training loop and metrics
//! - `export`: TorchScript tracing and scaler conversion
//! - `inference`: Running an exported model on raw features
//! - `utils`: Configuration and run artifacts
//!
//! ## Example
//!
//! ```rust,no_run
//! use rust_spread_signal::data::{build_features, create_sequences, PairSeries, SpreadFeatureConfig};
//!
//! fn main() -> rust_spread_signal::Result<()> {
//!     let series = PairSeries::load_csv("data/SP500_DJIA_2m_clean.csv", "Close", "Close2")?;
//!     let frame = build_features(&series, &SpreadFeatureConfig::default())?;
//!     let labels = frame.labels(1.0);
//!     let (windows, targets) = create_sequences(&frame.to_matrix(), &labels, 20)?;
//!     println!("{} windows, {} targets", windows.shape()[0], targets.len());
//!     Ok(())
//! }
//! ```

pub mod data;
pub mod error;
pub mod export;
pub mod inference;
pub mod model;
pub mod training;
pub mod utils;

pub use data::{FeatureFrame, PairSeries, ScalerParams, Signal, StandardScaler};
pub use error::{Error, Result};
pub use export::{convert_scaler, export_traced, ExportJob};
pub use inference::{Prediction, SignalPredictor};
pub use model::{ModelConfig, ModelKind, SignalNet};
pub use training::{EvaluationReport, Trainer, TrainingConfig, TrainingMetrics};
pub use utils::Config;
