use crate::error::{CliError, Result};
use mlpforge::engine::config::DisplacementStyle;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileSamplerConfig {
    pub target_count: Option<usize>,
    pub attempt_multiplier: Option<usize>,
    pub threshold_factor: Option<f64>,
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FilePerturbationConfig {
    pub cell_pert_fraction: Option<f64>,
    pub atom_pert_distance: Option<f64>,
    pub atom_pert_style: Option<DisplacementStyle>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileQcConfig {
    pub min_distance: Option<f64>,
    pub max_force: Option<f64>,
    pub sigma_n: Option<f64>,
    pub reference: Option<PathBuf>,
    pub report_dir: Option<PathBuf>,
}

/// Every table of a configuration file is optional.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub sampler: Option<FileSamplerConfig>,
    pub perturbation: Option<FilePerturbationConfig>,
    pub qc: Option<FileQcConfig>,
    /// Per-element radius overrides in Å.
    pub radii: Option<HashMap<String, f64>>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Reading configuration file {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::parsing(path, e))
    }
}
