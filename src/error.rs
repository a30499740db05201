//! Error types for the spread signal library

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reading/writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Array shape error
    #[error("Shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    /// libtorch error (shape mismatch, missing variable, bad file, ...)
    #[error("Torch error: {0}")]
    Torch(#[from] tch::TchError),

    /// A required column is absent from the input header
    #[error("Missing column `{0}` in input header")]
    MissingColumn(String),

    /// A cell could not be parsed as a number
    #[error("Cannot parse `{value}` in column `{column}` at row {row}")]
    Parse {
        row: usize,
        column: String,
        value: String,
    },

    /// Not enough rows/examples to proceed
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Two aligned inputs have different lengths
    #[error("Length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    /// Loss became NaN or infinite
    #[error("Non-finite {phase} loss at epoch {epoch}")]
    NonFiniteLoss { epoch: usize, phase: String },

    /// Saved weights do not fit the requested architecture
    #[error("Architecture mismatch: {0}")]
    ArchitectureMismatch(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Shorthand for a length mismatch
    pub fn length_mismatch(what: &str, expected: usize, actual: usize) -> Self {
        Error::LengthMismatch {
            what: what.to_string(),
            expected,
            actual,
        }
    }
}
