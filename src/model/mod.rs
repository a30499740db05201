//! Model module containing the signal classifiers
//!
//! This module provides:
//! - `LstmClassifier` over windows of feature rows
//! - `DeepMlp` over single feature rows
//! - `SignalNet`, which builds either one from a `ModelConfig`

mod config;
mod lstm;
mod mlp;

pub use config::{ModelConfig, ModelKind};
pub use lstm::LstmClassifier;
pub use mlp::DeepMlp;

use tch::nn::{self, ModuleT};
use tch::{Kind, Tensor};

/// Classifier of either kind behind one forward interface
#[derive(Debug)]
pub enum SignalNet {
    Lstm(LstmClassifier),
    Mlp(DeepMlp),
}

impl SignalNet {
    /// Build the network described by `config` under `vs`
    pub fn new(vs: &nn::Path, config: &ModelConfig) -> Self {
        match config.kind {
            ModelKind::Lstm => SignalNet::Lstm(LstmClassifier::new(vs, config)),
            ModelKind::Mlp => SignalNet::Mlp(DeepMlp::new(vs, config)),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            SignalNet::Lstm(_) => ModelKind::Lstm,
            SignalNet::Mlp(_) => ModelKind::Mlp,
        }
    }

    /// Predicted class index per example (eval mode, no gradient)
    pub fn predict_classes(&self, xs: &Tensor) -> Tensor {
        tch::no_grad(|| self.forward_t(xs, false).argmax(-1, false))
    }

    /// Class probabilities per example (eval mode, no gradient)
    pub fn predict_proba(&self, xs: &Tensor) -> Tensor {
        tch::no_grad(|| self.forward_t(xs, false).softmax(-1, Kind::Float))
    }
}

impl ModuleT for SignalNet {
    fn forward_t(&self, xs: &Tensor, train: bool) -> Tensor {
        match self {
            SignalNet::Lstm(model) => model.forward_t(xs, train),
            SignalNet::Mlp(model) => model.forward_t(xs, train),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::{nn::VarStore, Device};

    #[test]
    fn test_builds_requested_kind() {
        let vs = VarStore::new(Device::Cpu);
        let lstm = SignalNet::new(&vs.root(), &ModelConfig::lstm().with_hidden_size(8).with_layers(1));
        assert_eq!(lstm.kind(), ModelKind::Lstm);

        let vs = VarStore::new(Device::Cpu);
        let mlp = SignalNet::new(&vs.root(), &ModelConfig::mlp().with_mlp_hidden(vec![8]));
        assert_eq!(mlp.kind(), ModelKind::Mlp);
    }

    #[test]
    fn test_predict_proba_sums_to_one() {
        let vs = VarStore::new(Device::Cpu);
        let model = SignalNet::new(&vs.root(), &ModelConfig::mlp().with_mlp_hidden(vec![8]));

        let input = Tensor::randn([6, 4], (Kind::Float, Device::Cpu));
        let probs = model.predict_proba(&input);
        let total = probs.sum(Kind::Float).double_value(&[]);

        assert_eq!(probs.size(), vec![6, 3]);
        assert!((total - 6.0).abs() < 1e-4);
        assert!(probs.min().double_value(&[]) >= 0.0);
        assert_eq!(model.predict_classes(&input).size(), vec![6]);
    }
}
