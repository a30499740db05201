//! Configuration management
//!
//! Provides unified configuration for the training and export pipeline.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::data::{SpreadFeatureConfig, SplitConfig};
use crate::error::{Error, Result};
use crate::model::ModelConfig;
use crate::training::TrainingConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input data
    pub data: DataConfig,
    /// Spread feature parameters
    pub features: SpreadFeatureConfig,
    /// Z-score labelling
    pub labels: LabelConfig,
    /// Network architecture
    pub model: ModelConfig,
    /// Training parameters
    pub training: TrainingConfigFile,
    /// Artifact locations
    pub paths: PathsConfig,
}

/// Data-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV with a timestamp column and two price columns
    pub path: String,
    /// Column holding the primary price
    pub price_column: String,
    /// Column holding the paired price
    pub pair_column: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: "data/SP500_DJIA_2m_clean.csv".to_string(),
            price_column: "Close".to_string(),
            pair_column: "Close2".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelConfig {
    /// |z-score| above which a row is labelled buy or sell
    pub threshold: f64,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self { threshold: 1.0 }
    }
}

/// Training-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfigFile {
    /// Number of epochs
    pub epochs: usize,
    /// Adam learning rate
    pub learning_rate: f64,
    /// Window length for the LSTM
    pub sequence_length: usize,
    /// Fraction of rows held out
    pub test_size: f64,
    /// Seed for the split and weight initialisation
    pub seed: u64,
    /// Shuffle rows before splitting
    pub shuffle: bool,
    /// Log a loss line every N epochs
    pub log_every: usize,
    /// Draw a progress bar
    pub show_progress: bool,
    /// Device: "cpu", "cuda", "mps" or "auto"
    pub device: String,
}

impl Default for TrainingConfigFile {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 0.001,
            sequence_length: 20,
            test_size: 0.2,
            seed: 42,
            shuffle: true,
            log_every: 1,
            show_progress: true,
            device: "auto".to_string(),
        }
    }
}

/// Where each artifact is written
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Trained weights (VarStore)
    pub weights: String,
    /// Fitted scaler with variance and sample count
    pub scaler: String,
    /// Plain `{mean, scale}` scaler for inference
    pub scaler_params: String,
    /// TorchScript module
    pub traced: String,
    /// Per-epoch losses
    pub metrics: String,
    /// Run summary
    pub summary: String,
    /// Feature table dump
    pub features: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            weights: "models/rnn_model.ot".to_string(),
            scaler: "models/rnn_scaler.json".to_string(),
            scaler_params: "models/scaler_params.json".to_string(),
            traced: "models/rnn_model.pt".to_string(),
            metrics: "models/training_metrics.csv".to_string(),
            summary: "models/run_summary.json".to_string(),
            features: "data/features.csv".to_string(),
        }
    }
}

impl Config {
    /// Create a new default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from TOML file
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from JSON file
    pub fn from_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load by extension: `.toml` as TOML, anything else as JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        if is_toml(path.as_ref()) {
            Self::from_toml(path)
        } else {
            Self::from_json(path)
        }
    }

    /// Save by extension: `.toml` as TOML, anything else as JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if is_toml(path.as_ref()) {
            self.save_toml(path)
        } else {
            self.save_json(path)
        }
    }

    /// Get device from configuration
    pub fn get_device(&self) -> tch::Device {
        parse_device(&self.training.device)
    }

    pub fn split_config(&self) -> SplitConfig {
        SplitConfig {
            test_size: self.training.test_size,
            seed: self.training.seed,
            shuffle: self.training.shuffle,
        }
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            epochs: self.training.epochs,
            learning_rate: self.training.learning_rate,
            log_every: self.training.log_every,
            show_progress: self.training.show_progress,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.features.validate()?;
        self.model.validate()?;

        if !self.labels.threshold.is_finite() || self.labels.threshold < 0.0 {
            return Err(Error::Config("label threshold must be finite and >= 0".into()));
        }
        if self.training.sequence_length == 0 {
            return Err(Error::Config("sequence length must be > 0".into()));
        }
        if self.training.epochs == 0 {
            return Err(Error::Config("number of epochs must be > 0".into()));
        }
        if !(self.training.learning_rate > 0.0) {
            return Err(Error::Config("learning rate must be > 0".into()));
        }
        if !(self.training.test_size > 0.0 && self.training.test_size < 1.0) {
            return Err(Error::Config("test_size must be in (0, 1)".into()));
        }
        Ok(())
    }
}

/// Map a device name to a device, falling back to CPU when unavailable
pub fn parse_device(name: &str) -> tch::Device {
    match name.to_lowercase().as_str() {
        "cuda" | "gpu" => {
            if tch::Cuda::is_available() {
                tch::Device::Cuda(0)
            } else {
                tracing::warn!("CUDA requested but not available, falling back to CPU");
                tch::Device::Cpu
            }
        }
        "mps" => {
            if tch::utils::has_mps() {
                tch::Device::Mps
            } else {
                tracing::warn!("MPS requested but not available, falling back to CPU");
                tch::Device::Cpu
            }
        }
        "auto" => {
            if tch::Cuda::is_available() {
                tch::Device::Cuda(0)
            } else if tch::utils::has_mps() {
                tch::Device::Mps
            } else {
                tch::Device::Cpu
            }
        }
        _ => tch::Device::Cpu,
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

/// Create default configuration file if it doesn't exist
pub fn ensure_config_exists<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if path.exists() {
        Config::load(path)
    } else {
        let config = Config::default();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        config.save(path)?;
        tracing::info!("Wrote default configuration to {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelKind;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.data.price_column, "Close");
        assert_eq!(config.features.window, 20);
        assert_eq!(config.model.hidden_size, 128);
        assert_eq!(config.training.sequence_length, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.model = ModelConfig::mlp();
        config.training.epochs = 7;
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.model.kind, ModelKind::Mlp);
        assert_eq!(loaded.training.epochs, 7);
        assert_eq!(loaded.model, config.model);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let loaded: Config = serde_json::from_str(&json).unwrap();

        assert_eq!(config.paths.traced, loaded.paths.traced);
        assert_eq!(config.labels.threshold, loaded.labels.threshold);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        config.training.sequence_length = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.training.test_size = 1.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.features.window = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ensure_config_exists_writes_default() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let created = ensure_config_exists(&path).unwrap();
        assert!(path.exists());

        let loaded = ensure_config_exists(&path).unwrap();
        assert_eq!(created.paths.weights, loaded.paths.weights);
    }

    #[test]
    fn test_cpu_device() {
        assert_eq!(parse_device("cpu"), tch::Device::Cpu);
        assert_eq!(parse_device("unknown"), tch::Device::Cpu);
    }
}
