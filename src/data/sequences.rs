//! Sliding window sequences for the LSTM

use ndarray::{s, Array2, Array3};

use super::labels::Signal;
use crate::error::{Error, Result};

/// Create overlapping windows paired with the label that follows them
///
/// # Arguments
///
/// * `features` - 2D array of shape (num_rows, num_features)
/// * `labels` - One label per feature row
/// * `sequence_length` - Window length `L`
///
/// # Returns
///
/// Windows of shape (num_rows - L, L, num_features) and their targets; window
/// `i` covers rows `i..i + L` and is labelled with row `i + L`. When there are
/// no more than `L` rows the result is empty.
pub fn create_sequences(
    features: &Array2<f64>,
    labels: &[Signal],
    sequence_length: usize,
) -> Result<(Array3<f64>, Vec<Signal>)> {
    if sequence_length == 0 {
        return Err(Error::Config("sequence length must be > 0".into()));
    }

    let num_rows = features.nrows();
    if labels.len() != num_rows {
        return Err(Error::length_mismatch("labels", num_rows, labels.len()));
    }

    let num_features = features.ncols();
    let num_sequences = num_rows.saturating_sub(sequence_length);

    let mut windows = Array3::<f64>::zeros((num_sequences, sequence_length, num_features));
    let mut targets = Vec::with_capacity(num_sequences);

    for i in 0..num_sequences {
        windows
            .slice_mut(s![i, .., ..])
            .assign(&features.slice(s![i..i + sequence_length, ..]));
        targets.push(labels[i + sequence_length]);
    }

    Ok((windows, targets))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn ramp(rows: usize, cols: usize) -> Array2<f64> {
        Array2::from_shape_fn((rows, cols), |(i, j)| (i * 10 + j) as f64)
    }

    fn cycle_labels(n: usize) -> Vec<Signal> {
        (0..n)
            .map(|i| Signal::from_class_index((i % 3) as i64).unwrap())
            .collect()
    }

    #[test]
    fn test_window_count_and_contents() {
        let data = ramp(30, 4);
        let labels = cycle_labels(30);
        let (windows, targets) = create_sequences(&data, &labels, 20).unwrap();

        assert_eq!(windows.shape(), &[10, 20, 4]);
        assert_eq!(targets.len(), 10);
        for i in 0..10 {
            assert_eq!(targets[i], labels[i + 20]);
            assert_eq!(windows[[i, 0, 0]], data[[i, 0]]);
            assert_eq!(windows[[i, 19, 3]], data[[i + 19, 3]]);
        }
    }

    #[test]
    fn test_windows_overlap_by_length_minus_one() {
        let data = ramp(8, 2);
        let labels = cycle_labels(8);
        let (windows, _) = create_sequences(&data, &labels, 3).unwrap();

        for i in 0..windows.shape()[0] - 1 {
            for t in 1..3 {
                assert_eq!(windows[[i, t, 1]], windows[[i + 1, t - 1, 1]]);
            }
        }
    }

    #[test]
    fn test_too_few_rows_is_empty() {
        let data = ramp(20, 4);
        let labels = cycle_labels(20);
        let (windows, targets) = create_sequences(&data, &labels, 20).unwrap();

        assert_eq!(windows.shape(), &[0, 20, 4]);
        assert!(targets.is_empty());
    }

    #[test]
    fn test_label_length_mismatch() {
        let data = ramp(10, 4);
        let labels = cycle_labels(9);
        assert!(create_sequences(&data, &labels, 3).is_err());
    }

    #[test]
    fn test_zero_length_rejected() {
        let data = ramp(10, 4);
        let labels = cycle_labels(10);
        assert!(create_sequences(&data, &labels, 0).is_err());
    }
}
