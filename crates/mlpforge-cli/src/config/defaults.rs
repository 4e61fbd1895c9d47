use mlpforge::engine::config::{DisplacementStyle, PerturbationConfig, QcConfig, SamplerConfig};
use std::path::PathBuf;

pub struct DefaultsConfig {
    pub attempt_multiplier: usize,
    pub threshold_factor: f64,
    pub cell_pert_fraction: f64,
    pub atom_pert_distance: f64,
    pub atom_pert_style: DisplacementStyle,
    pub min_distance: f64,
    pub max_force: f64,
    pub sigma_n: f64,
    pub report_dir: PathBuf,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        let perturbation = PerturbationConfig::default();
        Self {
            attempt_multiplier: SamplerConfig::DEFAULT_ATTEMPT_MULTIPLIER,
            threshold_factor: SamplerConfig::DEFAULT_THRESHOLD_FACTOR,
            cell_pert_fraction: perturbation.cell_pert_fraction,
            atom_pert_distance: perturbation.atom_pert_distance,
            atom_pert_style: perturbation.atom_pert_style,
            min_distance: QcConfig::DEFAULT_MIN_DISTANCE,
            max_force: QcConfig::DEFAULT_MAX_FORCE,
            sigma_n: QcConfig::DEFAULT_SIGMA_N,
            report_dir: PathBuf::from("."),
        }
    }
}
