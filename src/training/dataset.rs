//! Tensor datasets built from scaled feature rows

use ndarray::{Array2, Array3};
use tch::{Device, Kind, Tensor};

use crate::data::{create_sequences, Signal};
use crate::error::Result;
use crate::model::ModelKind;

/// Inputs and class targets held as tensors on the training device
#[derive(Debug)]
pub struct TensorDataset {
    /// (n, L, F) windows or (n, F) rows, float32
    pub inputs: Tensor,
    /// (n,) class indices, int64
    pub targets: Tensor,
}

impl TensorDataset {
    /// Dataset of windows for the LSTM
    pub fn from_windows(windows: &Array3<f64>, labels: &[Signal], device: Device) -> Self {
        let (n, seq_len, n_feat) = windows.dim();
        let values: Vec<f32> = windows.iter().map(|&v| v as f32).collect();
        let inputs = Tensor::from_slice(&values)
            .reshape([n as i64, seq_len as i64, n_feat as i64])
            .to_device(device);

        Self {
            inputs,
            targets: targets_tensor(labels, device),
        }
    }

    /// Dataset of single rows for the feed-forward network
    pub fn from_rows(rows: &Array2<f64>, labels: &[Signal], device: Device) -> Self {
        let (n, n_feat) = rows.dim();
        let values: Vec<f32> = rows.iter().map(|&v| v as f32).collect();
        let inputs = Tensor::from_slice(&values)
            .reshape([n as i64, n_feat as i64])
            .to_device(device);

        Self {
            inputs,
            targets: targets_tensor(labels, device),
        }
    }

    /// Build the dataset shape a model kind expects
    ///
    /// The LSTM gets windows of `sequence_length` rows labelled with the row
    /// that follows each window; the MLP gets every row with its own label.
    pub fn for_model(
        kind: ModelKind,
        rows: &Array2<f64>,
        labels: &[Signal],
        sequence_length: usize,
        device: Device,
    ) -> Result<Self> {
        match kind {
            ModelKind::Lstm => {
                let (windows, targets) = create_sequences(rows, labels, sequence_length)?;
                Ok(Self::from_windows(&windows, &targets, device))
            }
            ModelKind::Mlp => {
                if labels.len() != rows.nrows() {
                    return Err(crate::Error::length_mismatch("labels", rows.nrows(), labels.len()));
                }
                Ok(Self::from_rows(rows, labels, device))
            }
        }
    }

    pub fn len(&self) -> usize {
        self.targets.size()[0] as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of examples per class (buy, hold, sell)
    pub fn class_counts(&self) -> Result<[usize; Signal::NUM_CLASSES]> {
        let targets = Vec::<i64>::try_from(&self.targets.to_device(Device::Cpu).to_kind(Kind::Int64))?;
        let mut counts = [0usize; Signal::NUM_CLASSES];
        for t in targets {
            if let Some(count) = counts.get_mut(t as usize) {
                *count += 1;
            }
        }
        Ok(counts)
    }
}

fn targets_tensor(labels: &[Signal], device: Device) -> Tensor {
    let targets: Vec<i64> = labels.iter().map(|s| s.class_index()).collect();
    Tensor::from_slice(&targets).to_device(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn labels(n: usize) -> Vec<Signal> {
        (0..n)
            .map(|i| Signal::from_class_index((i % 3) as i64).unwrap())
            .collect()
    }

    #[test]
    fn test_window_dataset_shapes() {
        let rows = Array2::from_shape_fn((30, 4), |(i, j)| (i + j) as f64);
        let ds = TensorDataset::for_model(ModelKind::Lstm, &rows, &labels(30), 20, Device::Cpu).unwrap();

        assert_eq!(ds.inputs.size(), vec![10, 20, 4]);
        assert_eq!(ds.targets.size(), vec![10]);
        assert_eq!(ds.inputs.kind(), Kind::Float);
        assert_eq!(ds.targets.kind(), Kind::Int64);
        assert_eq!(ds.len(), 10);
    }

    #[test]
    fn test_row_dataset_shapes() {
        let rows = Array2::from_shape_fn((12, 4), |(i, j)| (i * j) as f64);
        let ds = TensorDataset::for_model(ModelKind::Mlp, &rows, &labels(12), 20, Device::Cpu).unwrap();

        assert_eq!(ds.inputs.size(), vec![12, 4]);
        assert_eq!(ds.class_counts().unwrap(), [4, 4, 4]);
    }

    #[test]
    fn test_values_preserved() {
        let rows = Array2::from_shape_fn((5, 2), |(i, j)| (i * 2 + j) as f64);
        let ds = TensorDataset::from_rows(&rows, &labels(5), Device::Cpu);

        assert_eq!(ds.inputs.double_value(&[3, 1]), 7.0);
        assert_eq!(ds.targets.int64_value(&[4]), 1);
    }
}
