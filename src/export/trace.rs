//! TorchScript export of trained weights
//!
//! Rebuilds the network from its configuration, loads the saved weights,
//! traces one eval-mode forward pass on a random example and writes the
//! resulting module. Loading fails when the configuration does not match the
//! layout of the saved weights.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tch::nn::{self, ModuleT};
use tch::{CModule, Device, Kind, Tensor};
use tracing::info;

use crate::error::{Error, Result};
use crate::model::{ModelConfig, SignalNet};
use crate::utils::{ensure_parent_dir, Config};

/// One export: which architecture, which weights, where to write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    pub model: ModelConfig,
    pub weights_path: PathBuf,
    pub output_path: PathBuf,
    /// Window length of the example input (ignored for the MLP)
    pub sequence_length: i64,
}

impl ExportJob {
    pub fn new(model: ModelConfig, weights_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            model,
            weights_path: weights_path.into(),
            output_path: output_path.into(),
            sequence_length: 20,
        }
    }

    pub fn with_sequence_length(mut self, sequence_length: i64) -> Self {
        self.sequence_length = sequence_length;
        self
    }

    /// Export the weights and architecture named in `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.model.clone(), &config.paths.weights, &config.paths.traced)
            .with_sequence_length(config.training.sequence_length as i64)
    }
}

/// Trace the network described by `job` and save it
///
/// Returns the traced module, already written to `job.output_path`. The
/// LSTM's initial state is sized from the example, so traced LSTM modules
/// take one window per call.
pub fn export_traced(job: &ExportJob, device: Device) -> Result<CModule> {
    job.model.validate()?;

    let mut vs = nn::VarStore::new(device);
    let model = SignalNet::new(&vs.root(), &job.model);
    load_strict(&mut vs, &job.weights_path)?;
    vs.freeze();

    let shape = job.model.example_input_shape(job.sequence_length.max(1));
    let example = Tensor::randn(shape.as_slice(), (Kind::Float, device));

    let mut forward = |inputs: &[Tensor]| vec![model.forward_t(&inputs[0], false)];
    let module = CModule::create_by_tracing("SignalNet", "forward", &[example], &mut forward)?;

    ensure_parent_dir(&job.output_path)?;
    module.save(&job.output_path)?;

    info!(
        "Exported {:?} model from {} to {}",
        job.model.kind,
        job.weights_path.display(),
        job.output_path.display()
    );
    Ok(module)
}

/// Load `path` into `vs`, rejecting files with tensors `vs` does not own
///
/// `VarStore::load` only fills the store's own variables, so weights of a
/// deeper network would otherwise load into a shallower one.
pub fn load_strict<P: AsRef<Path>>(vs: &mut nn::VarStore, path: P) -> Result<()> {
    let path = path.as_ref();
    vs.load(path)?;

    let saved = match path.extension().and_then(|ext| ext.to_str()) {
        Some("safetensors") => Tensor::read_safetensors(path)?,
        _ => Tensor::load_multi(path)?,
    };

    let variables = vs.variables();
    let mut unexpected: Vec<String> = saved
        .into_iter()
        .map(|(name, _)| name)
        .filter(|name| !variables.contains_key(name))
        .collect();

    if unexpected.is_empty() {
        Ok(())
    } else {
        unexpected.sort();
        Err(Error::ArchitectureMismatch(format!(
            "{} holds tensors the model does not have: {}",
            path.display(),
            unexpected.join(", ")
        )))
    }
}
