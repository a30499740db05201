//! Model configuration shared by training and export

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which network to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Stacked LSTM over windows of feature rows
    Lstm,
    /// Deep feed-forward network over single feature rows
    Mlp,
}

impl ModelKind {
    /// Whether examples are windows (true) or single rows (false)
    pub fn is_sequential(self) -> bool {
        matches!(self, ModelKind::Lstm)
    }
}

impl std::str::FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lstm" | "rnn" => Ok(ModelKind::Lstm),
            "mlp" | "dnn" => Ok(ModelKind::Mlp),
            other => Err(Error::Config(format!("unknown model kind `{other}`"))),
        }
    }
}

/// Architecture of the classifier
///
/// Export rebuilds the network from this configuration, so it must match the
/// one used for training exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// Number of input features per time step / row
    pub input_size: i64,
    /// LSTM hidden size
    pub hidden_size: i64,
    /// Number of stacked LSTM layers
    pub num_layers: i64,
    /// Hidden layer widths of the feed-forward network
    pub mlp_hidden: Vec<i64>,
    /// Number of output classes
    pub output_size: i64,
    /// Dropout probability before the output head (and between MLP layers)
    pub dropout: f64,
}

impl ModelConfig {
    /// LSTM: 4 inputs, 128 hidden, 4 layers, 3 classes
    pub fn lstm() -> Self {
        Self {
            kind: ModelKind::Lstm,
            input_size: 4,
            hidden_size: 128,
            num_layers: 4,
            mlp_hidden: vec![512, 512, 256, 128],
            output_size: 3,
            dropout: 0.5,
        }
    }

    /// Feed-forward: 4 → 512 → 512 → 256 → 128 → 3
    pub fn mlp() -> Self {
        Self {
            kind: ModelKind::Mlp,
            ..Self::lstm()
        }
    }

    pub fn with_hidden_size(mut self, hidden_size: i64) -> Self {
        self.hidden_size = hidden_size;
        self
    }

    pub fn with_layers(mut self, num_layers: i64) -> Self {
        self.num_layers = num_layers;
        self
    }

    pub fn with_mlp_hidden(mut self, widths: Vec<i64>) -> Self {
        self.mlp_hidden = widths;
        self
    }

    pub fn with_dropout(mut self, dropout: f64) -> Self {
        self.dropout = dropout;
        self
    }

    /// Shape of a single-example input batch
    pub fn example_input_shape(&self, sequence_length: i64) -> Vec<i64> {
        match self.kind {
            ModelKind::Lstm => vec![1, sequence_length, self.input_size],
            ModelKind::Mlp => vec![1, self.input_size],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_size <= 0 || self.output_size <= 0 {
            return Err(Error::Config("input and output sizes must be > 0".into()));
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(Error::Config(format!("dropout must be in [0, 1), got {}", self.dropout)));
        }
        match self.kind {
            ModelKind::Lstm if self.hidden_size <= 0 || self.num_layers <= 0 => Err(Error::Config(
                "LSTM hidden size and layer count must be > 0".into(),
            )),
            ModelKind::Mlp if self.mlp_hidden.is_empty() || self.mlp_hidden.iter().any(|&w| w <= 0) => {
                Err(Error::Config("MLP needs at least one hidden layer of width > 0".into()))
            }
            _ => Ok(()),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::lstm()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let lstm = ModelConfig::lstm();
        assert_eq!(lstm.hidden_size, 128);
        assert_eq!(lstm.num_layers, 4);
        assert_eq!(lstm.output_size, 3);
        assert!(lstm.validate().is_ok());

        let mlp = ModelConfig::mlp();
        assert_eq!(mlp.kind, ModelKind::Mlp);
        assert_eq!(mlp.mlp_hidden, vec![512, 512, 256, 128]);
        assert!(mlp.validate().is_ok());
    }

    #[test]
    fn test_example_input_shape() {
        assert_eq!(ModelConfig::lstm().example_input_shape(20), vec![1, 20, 4]);
        assert_eq!(ModelConfig::mlp().example_input_shape(20), vec![1, 4]);
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("LSTM".parse::<ModelKind>().unwrap(), ModelKind::Lstm);
        assert_eq!("mlp".parse::<ModelKind>().unwrap(), ModelKind::Mlp);
        assert!("gru".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_validation() {
        assert!(ModelConfig::lstm().with_dropout(1.0).validate().is_err());
        assert!(ModelConfig::lstm().with_layers(0).validate().is_err());
        assert!(ModelConfig::mlp().with_mlp_hidden(vec![]).validate().is_err());
    }
}
