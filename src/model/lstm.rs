//! Stacked LSTM classifier
//!
//! Runs the LSTM over a window of feature rows, takes the last time step's
//! hidden output, applies dropout and maps it to class logits.

use tch::nn::{self, Module, RNN};
use tch::Tensor;

use super::config::ModelConfig;

#[derive(Debug)]
pub struct LstmClassifier {
    lstm: nn::LSTM,
    fc: nn::Linear,
    dropout: f64,
}

impl LstmClassifier {
    pub fn new(vs: &nn::Path, config: &ModelConfig) -> Self {
        let lstm_config = nn::RNNConfig {
            num_layers: config.num_layers,
            batch_first: true,
            ..Default::default()
        };

        let lstm = nn::lstm(vs / "lstm", config.input_size, config.hidden_size, lstm_config);
        let fc = nn::linear(vs / "fc", config.hidden_size, config.output_size, Default::default());

        Self {
            lstm,
            fc,
            dropout: config.dropout,
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    ///
    /// * `xs` - Tensor of shape (batch_size, sequence_length, input_size)
    /// * `train` - Whether dropout is active
    ///
    /// # Returns
    ///
    /// Logits of shape (batch_size, output_size)
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        // zero initial hidden and cell state
        let (out, _) = self.lstm.seq(xs);
        let last = out.select(1, -1);
        let last = last.dropout(self.dropout, train);
        self.fc.forward(&last)
    }
}

impl nn::ModuleT for LstmClassifier {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        LstmClassifier::forward_t(self, xs, train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    #[test]
    fn test_lstm_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let config = ModelConfig::lstm().with_hidden_size(16).with_layers(2);
        let model = LstmClassifier::new(&vs.root(), &config);

        let input = Tensor::randn([5, 20, 4], (Kind::Float, Device::Cpu));
        let output = model.forward_t(&input, false);

        assert_eq!(output.size(), vec![5, 3]);
    }

    #[test]
    fn test_eval_forward_is_deterministic() {
        let vs = VarStore::new(Device::Cpu);
        let config = ModelConfig::lstm().with_hidden_size(8).with_layers(1);
        let model = LstmClassifier::new(&vs.root(), &config);

        let input = Tensor::randn([2, 10, 4], (Kind::Float, Device::Cpu));
        let a = model.forward_t(&input, false);
        let b = model.forward_t(&input, false);

        assert!(a.allclose(&b, 1e-6, 1e-6, false));
    }
}
