use super::tasks::energy_outlier::EnergyBaseline;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Parameter '{name}' = {value} is out of range: must be {constraint}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        constraint: &'static str,
    },
    #[error("Unknown displacement style '{0}' (expected 'normal', 'uniform' or 'const')")]
    UnknownStyle(String),
}

fn require_positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            constraint: "positive and finite",
        })
    }
}

fn require_non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            constraint: "non-negative and finite",
        })
    }
}

/// Shape of the random atomic displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplacementStyle {
    /// Each Cartesian component is drawn from `N(0, d / sqrt(3))`.
    #[default]
    Normal,
    /// Uniform inside a ball of radius `d`.
    Uniform,
    /// Random direction, length exactly `d`.
    Const,
}

impl FromStr for DisplacementStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "uniform" => Ok(Self::Uniform),
            "const" => Ok(Self::Const),
            _ => Err(ConfigError::UnknownStyle(s.to_string())),
        }
    }
}

impl fmt::Display for DisplacementStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Uniform => "uniform",
            Self::Const => "const",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerturbationConfig {
    pub cell_pert_fraction: f64,
    pub atom_pert_distance: f64,
    pub atom_pert_style: DisplacementStyle,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            cell_pert_fraction: 0.03,
            atom_pert_distance: 0.1,
            atom_pert_style: DisplacementStyle::Normal,
        }
    }
}

impl PerturbationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_negative("cell_pert_fraction", self.cell_pert_fraction)?;
        require_non_negative("atom_pert_distance", self.atom_pert_distance)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    pub target_count: usize,
    pub attempt_multiplier: usize,
    pub threshold_factor: f64,
    pub perturbation: PerturbationConfig,
}

impl SamplerConfig {
    pub const DEFAULT_ATTEMPT_MULTIPLIER: usize = 10;
    pub const DEFAULT_THRESHOLD_FACTOR: f64 = 0.5;

    /// Total number of draws allowed in one run, `K × M`.
    pub fn attempt_budget(&self) -> usize {
        self.target_count.saturating_mul(self.attempt_multiplier)
    }
}

#[derive(Default)]
pub struct SamplerConfigBuilder {
    target_count: Option<usize>,
    attempt_multiplier: Option<usize>,
    threshold_factor: Option<f64>,
    perturbation: Option<PerturbationConfig>,
}

impl SamplerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target_count(mut self, count: usize) -> Self {
        self.target_count = Some(count);
        self
    }
    pub fn attempt_multiplier(mut self, multiplier: usize) -> Self {
        self.attempt_multiplier = Some(multiplier);
        self
    }
    pub fn threshold_factor(mut self, factor: f64) -> Self {
        self.threshold_factor = Some(factor);
        self
    }
    pub fn perturbation(mut self, config: PerturbationConfig) -> Self {
        self.perturbation = Some(config);
        self
    }

    pub fn build(self) -> Result<SamplerConfig, ConfigError> {
        let target_count = self
            .target_count
            .ok_or(ConfigError::MissingParameter("target_count"))?;
        let attempt_multiplier = self
            .attempt_multiplier
            .unwrap_or(SamplerConfig::DEFAULT_ATTEMPT_MULTIPLIER);
        if attempt_multiplier == 0 {
            return Err(ConfigError::OutOfRange {
                name: "attempt_multiplier",
                value: 0.0,
                constraint: "at least 1",
            });
        }
        let threshold_factor = require_positive(
            "threshold_factor",
            self.threshold_factor
                .unwrap_or(SamplerConfig::DEFAULT_THRESHOLD_FACTOR),
        )?;
        let perturbation = self.perturbation.unwrap_or_default();
        perturbation.validate()?;

        Ok(SamplerConfig {
            target_count,
            attempt_multiplier,
            threshold_factor,
            perturbation,
        })
    }
}

/// Where the energy-outlier check takes its mean and standard deviation from.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum BaselineSource {
    /// Frozen statistics of the frames still valid when the check starts.
    #[default]
    ValidPopulation,
    /// Statistics computed beforehand from a separate reference batch.
    Reference(EnergyBaseline),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QcConfig {
    pub min_distance: f64,
    pub max_force: f64,
    pub sigma_n: f64,
    pub energy_baseline: BaselineSource,
}

impl QcConfig {
    pub const DEFAULT_MIN_DISTANCE: f64 = 0.8;
    pub const DEFAULT_MAX_FORCE: f64 = 50.0;
    pub const DEFAULT_SIGMA_N: f64 = 3.0;

    /// Re-checks the ranges [`QcConfigBuilder::build`] enforces, for configs
    /// assembled directly from their public fields.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require_positive("min_distance", self.min_distance)?;
        require_positive("max_force", self.max_force)?;
        require_positive("sigma_n", self.sigma_n)?;
        Ok(())
    }
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            min_distance: Self::DEFAULT_MIN_DISTANCE,
            max_force: Self::DEFAULT_MAX_FORCE,
            sigma_n: Self::DEFAULT_SIGMA_N,
            energy_baseline: BaselineSource::ValidPopulation,
        }
    }
}

#[derive(Default)]
pub struct QcConfigBuilder {
    min_distance: Option<f64>,
    max_force: Option<f64>,
    sigma_n: Option<f64>,
    energy_baseline: Option<BaselineSource>,
}

impl QcConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_distance(mut self, distance: f64) -> Self {
        self.min_distance = Some(distance);
        self
    }
    pub fn max_force(mut self, force: f64) -> Self {
        self.max_force = Some(force);
        self
    }
    pub fn sigma_n(mut self, sigma_n: f64) -> Self {
        self.sigma_n = Some(sigma_n);
        self
    }
    pub fn energy_baseline(mut self, source: BaselineSource) -> Self {
        self.energy_baseline = Some(source);
        self
    }

    pub fn build(self) -> Result<QcConfig, ConfigError> {
        let config = QcConfig {
            min_distance: self.min_distance.unwrap_or(QcConfig::DEFAULT_MIN_DISTANCE),
            max_force: self.max_force.unwrap_or(QcConfig::DEFAULT_MAX_FORCE),
            sigma_n: self.sigma_n.unwrap_or(QcConfig::DEFAULT_SIGMA_N),
            energy_baseline: self.energy_baseline.unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }
}
