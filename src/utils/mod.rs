//! Utility module with helper functions
//!
//! This module provides:
//! - Configuration handling
//! - Run artifact saving

mod artifacts;
mod config;

pub use artifacts::{ensure_parent_dir, save_run, RunSummary};
pub use config::{
    ensure_config_exists, parse_device, Config, DataConfig, LabelConfig, PathsConfig, TrainingConfigFile,
};
