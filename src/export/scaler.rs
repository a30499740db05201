//! Conversion of a fitted scaler into inference parameters

use std::path::Path;

use tracing::info;

use crate::data::{ScalerParams, StandardScaler};
use crate::error::Result;
use crate::utils::ensure_parent_dir;

/// Read a saved `StandardScaler` and write its `{mean, scale}` JSON
pub fn convert_scaler<P: AsRef<Path>, Q: AsRef<Path>>(scaler_path: P, output_path: Q) -> Result<ScalerParams> {
    let scaler = StandardScaler::load_json(&scaler_path)?;
    let params = scaler.params();

    ensure_parent_dir(&output_path)?;
    params.save_json(&output_path)?;

    info!(
        "Converted scaler {} ({} features) to {}",
        scaler_path.as_ref().display(),
        params.n_features(),
        output_path.as_ref().display()
    );
    Ok(params)
}
