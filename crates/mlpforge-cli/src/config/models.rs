use mlpforge::core::radii::RadiusTable;
use mlpforge::engine::config::{QcConfig, SamplerConfig};
use std::path::PathBuf;

#[derive(Debug)]
pub struct SampleAppConfig {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub seed: Option<u64>,
    pub radii: RadiusTable,
    pub sampler: SamplerConfig,
}

/// `qc` settings; the reference baseline is resolved later, once the file is read.
#[derive(Debug)]
pub struct QcAppConfig {
    pub input_paths: Vec<PathBuf>,
    pub output_path: PathBuf,
    pub report_dir: PathBuf,
    pub reference_path: Option<PathBuf>,
    pub qc: QcConfig,
}
