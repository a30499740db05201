//! Spread signal classifier
//!
//! Main entry point providing CLI interface for:
//! - Building the spread feature table
//! - Training the LSTM or MLP classifier
//! - Exporting trained weights to TorchScript
//! - Converting the fitted scaler for inference
//! - Predicting the latest signal with an exported model

use std::path::Path;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use rust_spread_signal::{
    convert_scaler,
    data::{build_features, PairSeries},
    export_traced,
    training::{run_training, write_features},
    utils::{ensure_config_exists, Config},
    ExportJob, ModelConfig, ModelKind, SignalPredictor,
};

/// Spread signal classifier
#[derive(Parser)]
#[command(name = "spread_signal")]
#[command(author = "ML Trading Examples")]
#[command(version = "0.1.0")]
#[command(about = "Train and export a buy/hold/sell classifier on a price-pair spread")]
struct Cli {
    /// Path to configuration file (.toml or .json)
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Verbosity level
    #[arg(short, long, default_value = "info")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build features and labels and write them to CSV
    Features {
        /// Input price-pair CSV
        #[arg(short, long)]
        data: Option<String>,

        /// Output CSV path
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Train the classifier and save weights, scaler and losses
    Train {
        /// Input price-pair CSV
        #[arg(short, long)]
        data: Option<String>,

        /// Number of epochs
        #[arg(short, long)]
        epochs: Option<usize>,

        /// Architecture: lstm or mlp
        #[arg(short, long)]
        model: Option<ModelKind>,
    },

    /// Trace saved weights into a TorchScript module
    Export {
        /// Architecture of the saved weights: lstm or mlp
        #[arg(short, long)]
        model: Option<ModelKind>,

        /// Saved weights
        #[arg(short, long)]
        weights: Option<String>,

        /// Output TorchScript path
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Convert the saved scaler into mean/scale JSON
    ConvertScaler {
        /// Saved scaler JSON
        #[arg(short, long)]
        input: Option<String>,

        /// Output parameters JSON
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Predict the signal for the latest rows of a price-pair CSV
    Predict {
        /// Input price-pair CSV
        #[arg(short, long)]
        data: Option<String>,

        /// Architecture of the exported module: lstm or mlp
        #[arg(short, long)]
        model: Option<ModelKind>,
    },

    /// Initialize default configuration file
    Init {
        /// Output configuration file path
        #[arg(short, long, default_value = "config.toml")]
        output: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = match cli.verbosity.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Features { data, output } => {
            let mut config = load_config(&cli.config)?;
            if let Some(data) = data {
                config.data.path = data;
            }
            let output = output.unwrap_or_else(|| config.paths.features.clone());
            features(&config, &output)?;
        }
        Commands::Train { data, epochs, model } => {
            let mut config = load_config(&cli.config)?;
            if let Some(data) = data {
                config.data.path = data;
            }
            if let Some(epochs) = epochs {
                config.training.epochs = epochs;
            }
            if let Some(kind) = model {
                config.model = preset(kind);
            }
            train(&config)?;
        }
        Commands::Export { model, weights, output } => {
            let mut config = load_config(&cli.config)?;
            if let Some(kind) = model {
                config.model = preset(kind);
            }
            if let Some(weights) = weights {
                config.paths.weights = weights;
            }
            if let Some(output) = output {
                config.paths.traced = output;
            }
            export(&config)?;
        }
        Commands::ConvertScaler { input, output } => {
            let config = load_config(&cli.config)?;
            let input = input.unwrap_or_else(|| config.paths.scaler.clone());
            let output = output.unwrap_or_else(|| config.paths.scaler_params.clone());
            convert_scaler(&input, &output).with_context(|| format!("converting scaler {input}"))?;
        }
        Commands::Predict { data, model } => {
            let mut config = load_config(&cli.config)?;
            if let Some(data) = data {
                config.data.path = data;
            }
            if let Some(kind) = model {
                config.model = preset(kind);
            }
            predict(&config)?;
        }
        Commands::Init { output } => {
            let config = ensure_config_exists(&output)?;
            info!("Configuration at {} ({:?} model)", output, config.model.kind);
        }
    }

    Ok(())
}

/// Load the configuration file, or defaults when it does not exist
fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::load(path).with_context(|| format!("reading configuration {path}"))
    } else {
        info!("Config file {} not found, using defaults", path);
        Ok(Config::default())
    }
}

fn preset(kind: ModelKind) -> ModelConfig {
    match kind {
        ModelKind::Lstm => ModelConfig::lstm(),
        ModelKind::Mlp => ModelConfig::mlp(),
    }
}

fn load_series(config: &Config) -> Result<PairSeries> {
    PairSeries::load_csv(
        &config.data.path,
        &config.data.price_column,
        &config.data.pair_column,
    )
    .with_context(|| format!("loading {}", config.data.path))
}

fn features(config: &Config, output: &str) -> Result<()> {
    let series = load_series(config)?;
    if let Some(parent) = Path::new(output).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_features(&series, config, output)?;
    Ok(())
}

fn train(config: &Config) -> Result<()> {
    info!("Using device: {:?}", config.get_device());
    let outcome = run_training(config).context("training failed")?;

    info!(
        "Training complete. Final train loss: {:.4}, test loss: {:.4}",
        outcome.metrics.latest_train_loss().unwrap_or(0.0),
        outcome.metrics.latest_test_loss().unwrap_or(0.0)
    );
    println!("{}", outcome.report);
    Ok(())
}

fn export(config: &Config) -> Result<()> {
    let job = ExportJob::from_config(config);
    export_traced(&job, config.get_device())
        .with_context(|| format!("exporting {}", job.weights_path.display()))?;
    Ok(())
}

fn predict(config: &Config) -> Result<()> {
    let device = config.get_device();
    let predictor = SignalPredictor::load(
        &config.paths.traced,
        &config.paths.scaler_params,
        config.model.kind,
        config.training.sequence_length,
        device,
    )
    .with_context(|| format!("loading {}", config.paths.traced))?;

    let series = load_series(config)?;
    let frame = build_features(&series, &config.features)?;
    let prediction = predictor.predict_latest(&frame.to_matrix())?;

    let timestamp = frame.timestamps.last().cloned().unwrap_or_default();
    info!(
        "{}: {} (confidence {:.3}, probabilities {:?})",
        timestamp,
        prediction.signal,
        prediction.confidence(),
        prediction.probabilities
    );
    println!("{}", prediction.signal);
    Ok(())
}
