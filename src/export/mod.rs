//! Export of trained artifacts for the inference side
//!
//! This module provides:
//! - TorchScript tracing of saved weights for either architecture
//! - Conversion of the fitted scaler into plain `{mean, scale}` JSON

mod scaler;
mod trace;

pub use scaler::convert_scaler;
pub use trace::{export_traced, load_strict, ExportJob};
