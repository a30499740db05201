//! Data module for loading price pairs and preparing training examples
//!
//! This module provides:
//! - CSV loader for two aligned price series
//! - Spread / rolling z-score features and buy / hold / sell labels
//! - Sliding window sequences for the LSTM
//! - Seeded train/test split and a standard scaler

mod features;
mod labels;
mod pair;
mod scaler;
mod sequences;
mod split;

pub use features::{
    build_features, lagged_spread, rolling_mean, rolling_std, FeatureFrame, SpreadFeatureConfig,
    FEATURE_NAMES,
};
pub use labels::{label_zscores, Signal};
pub use pair::{PairSeries, PricePoint};
pub use scaler::{ScalerParams, StandardScaler};
pub use sequences::create_sequences;
pub use split::{split_indices, train_test_split, SplitConfig, SplitIndices, TrainTestSplit};
