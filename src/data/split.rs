//! Seeded train/test split over feature rows

use ndarray::{Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::labels::Signal;
use crate::error::{Error, Result};

/// Split configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows held out for testing
    pub test_size: f64,
    /// Seed for the row permutation
    pub seed: u64,
    /// Shuffle rows before splitting; `false` keeps the last rows as test set
    pub shuffle: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
            shuffle: true,
        }
    }
}

/// Row indices for each side of the split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split features and labels
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_train: Vec<Signal>,
    pub y_test: Vec<Signal>,
}

/// Compute train/test indices for `num_rows` rows
///
/// The test side gets `ceil(test_size * num_rows)` rows. With shuffling the
/// first rows of the seeded permutation form the test set.
pub fn split_indices(num_rows: usize, config: &SplitConfig) -> Result<SplitIndices> {
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(Error::Config(format!(
            "test_size must be in (0, 1), got {}",
            config.test_size
        )));
    }

    let num_test = (config.test_size * num_rows as f64).ceil() as usize;
    let num_train = num_rows.saturating_sub(num_test);
    if num_test == 0 || num_train == 0 {
        return Err(Error::InsufficientData(format!(
            "{} rows cannot be split with test_size {}",
            num_rows, config.test_size
        )));
    }

    let mut indices: Vec<usize> = (0..num_rows).collect();
    if config.shuffle {
        let mut rng = StdRng::seed_from_u64(config.seed);
        indices.shuffle(&mut rng);
        let train = indices.split_off(num_test);
        Ok(SplitIndices {
            train,
            test: indices,
        })
    } else {
        let test = indices.split_off(num_train);
        Ok(SplitIndices {
            train: indices,
            test,
        })
    }
}

/// Split a feature matrix and its labels
pub fn train_test_split(
    features: &Array2<f64>,
    labels: &[Signal],
    config: &SplitConfig,
) -> Result<TrainTestSplit> {
    if labels.len() != features.nrows() {
        return Err(Error::length_mismatch("labels", features.nrows(), labels.len()));
    }

    let SplitIndices { train, test } = split_indices(features.nrows(), config)?;

    Ok(TrainTestSplit {
        x_train: features.select(Axis(0), &train),
        x_test: features.select(Axis(0), &test),
        y_train: train.iter().map(|&i| labels[i]).collect(),
        y_test: test.iter().map(|&i| labels[i]).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sizes() {
        let split = split_indices(1000, &SplitConfig::default()).unwrap();
        assert_eq!(split.test.len(), 200);
        assert_eq!(split.train.len(), 800);

        let split = split_indices(11, &SplitConfig::default()).unwrap();
        assert_eq!(split.test.len(), 3); // ceil(2.2)
        assert_eq!(split.train.len(), 8);
    }

    #[test]
    fn test_split_is_reproducible() {
        let config = SplitConfig::default();
        let a = split_indices(500, &config).unwrap();
        let b = split_indices(500, &config).unwrap();
        assert_eq!(a, b);

        let other = SplitConfig {
            seed: 7,
            ..SplitConfig::default()
        };
        let c = split_indices(500, &other).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_split_is_partition() {
        let split = split_indices(97, &SplitConfig::default()).unwrap();
        let mut all: Vec<usize> = split.train.iter().chain(split.test.iter()).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..97).collect::<Vec<_>>());
    }

    #[test]
    fn test_chronological_split() {
        let config = SplitConfig {
            shuffle: false,
            ..SplitConfig::default()
        };
        let split = split_indices(10, &config).unwrap();
        assert_eq!(split.train, (0..8).collect::<Vec<_>>());
        assert_eq!(split.test, vec![8, 9]);
    }

    #[test]
    fn test_split_keeps_rows_with_labels() {
        let features = Array2::from_shape_fn((20, 2), |(i, j)| (i * 2 + j) as f64);
        let labels: Vec<Signal> = (0..20)
            .map(|i| Signal::from_class_index((i % 3) as i64).unwrap())
            .collect();

        let split = train_test_split(&features, &labels, &SplitConfig::default()).unwrap();
        assert_eq!(split.x_train.nrows(), 16);
        assert_eq!(split.x_test.nrows(), 4);

        for (row, label) in split.x_test.rows().into_iter().zip(&split.y_test) {
            let original = (row[0] / 2.0) as usize;
            assert_eq!(*label, labels[original]);
        }
    }

    #[test]
    fn test_invalid_test_size() {
        let config = SplitConfig {
            test_size: 1.0,
            ..SplitConfig::default()
        };
        assert!(split_indices(10, &config).is_err());
        assert!(split_indices(1, &SplitConfig::default()).is_err());
    }
}
