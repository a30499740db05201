//! Deep feed-forward classifier over single feature rows

use tch::nn::{self, Module, ModuleT};
use tch::Tensor;

use super::config::ModelConfig;

/// Linear → BatchNorm → ReLU → Dropout blocks followed by a linear head
///
/// Variables are named `fc1`/`bn1` ... `fcN` so the store layout reads like
/// the layer diagram.
#[derive(Debug)]
pub struct DeepMlp {
    blocks: Vec<(nn::Linear, nn::BatchNorm)>,
    head: nn::Linear,
    dropout: f64,
}

impl DeepMlp {
    pub fn new(vs: &nn::Path, config: &ModelConfig) -> Self {
        let mut blocks = Vec::with_capacity(config.mlp_hidden.len());
        let mut in_dim = config.input_size;

        for (i, &width) in config.mlp_hidden.iter().enumerate() {
            let fc = nn::linear(vs / format!("fc{}", i + 1), in_dim, width, Default::default());
            let bn = nn::batch_norm1d(vs / format!("bn{}", i + 1), width, Default::default());
            blocks.push((fc, bn));
            in_dim = width;
        }

        let head_name = format!("fc{}", config.mlp_hidden.len() + 1);
        let head = nn::linear(vs / head_name, in_dim, config.output_size, Default::default());

        Self {
            blocks,
            head,
            dropout: config.dropout,
        }
    }

    /// Forward pass on a (batch_size, input_size) tensor
    ///
    /// Batch norm uses batch statistics when `train` is set, so training needs
    /// more than one row per batch.
    pub fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        let mut x = xs.shallow_clone();
        for (fc, bn) in &self.blocks {
            x = bn.forward_t(&fc.forward(&x), train).relu();
            x = x.dropout(self.dropout, train);
        }
        self.head.forward(&x)
    }
}

impl ModuleT for DeepMlp {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        DeepMlp::forward_t(self, xs, train)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device, Kind};

    #[test]
    fn test_mlp_output_shape() {
        let vs = VarStore::new(Device::Cpu);
        let model = DeepMlp::new(&vs.root(), &ModelConfig::mlp());

        let input = Tensor::randn([8, 4], (Kind::Float, Device::Cpu));
        assert_eq!(model.forward_t(&input, true).size(), vec![8, 3]);
        assert_eq!(model.forward_t(&input, false).size(), vec![8, 3]);
    }

    #[test]
    fn test_variable_names() {
        let vs = VarStore::new(Device::Cpu);
        let config = ModelConfig::mlp().with_mlp_hidden(vec![16, 8]);
        let _model = DeepMlp::new(&vs.root(), &config);

        let names = vs.variables();
        assert!(names.contains_key("fc1.weight"));
        assert!(names.contains_key("bn2.weight"));
        assert!(names.contains_key("fc3.bias"));
        assert!(!names.contains_key("fc4.weight"));
    }
}
