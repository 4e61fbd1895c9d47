use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::{QcAppConfig, SampleAppConfig};
use crate::cli::{QcArgs, SampleArgs};
use crate::error::{CliError, Result};
use mlpforge::core::radii::RadiusTable;
use mlpforge::engine::config::{PerturbationConfig, QcConfigBuilder, SamplerConfigBuilder};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

fn load_file_config(path: Option<&Path>, set_values: &[String]) -> Result<FileConfig> {
    let file_config = match path {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    apply_set_values(file_config, set_values)
}

/// Merges CLI flags over `--set` values over the config file over built-in defaults.
pub fn build_sample_config(args: &SampleArgs) -> Result<SampleAppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(args.config.as_deref(), &args.set_values)?;

    let sampler_file = file_config.sampler.take().unwrap_or_default();
    let pert_file = file_config.perturbation.take().unwrap_or_default();

    let target_count = args
        .target_count
        .or(sampler_file.target_count)
        .ok_or_else(|| {
            CliError::Argument(
                "the number of structures must be given with -n or sampler.target-count"
                    .to_string(),
            )
        })?;

    let perturbation = PerturbationConfig {
        cell_pert_fraction: args
            .cell_pert_fraction
            .or(pert_file.cell_pert_fraction)
            .unwrap_or(defaults.cell_pert_fraction),
        atom_pert_distance: args
            .atom_pert_distance
            .or(pert_file.atom_pert_distance)
            .unwrap_or(defaults.atom_pert_distance),
        atom_pert_style: args
            .atom_pert_style
            .or(pert_file.atom_pert_style)
            .unwrap_or(defaults.atom_pert_style),
    };

    let sampler = SamplerConfigBuilder::new()
        .target_count(target_count)
        .attempt_multiplier(
            args.attempt_multiplier
                .or(sampler_file.attempt_multiplier)
                .unwrap_or(defaults.attempt_multiplier),
        )
        .threshold_factor(
            args.threshold_factor
                .or(sampler_file.threshold_factor)
                .unwrap_or(defaults.threshold_factor),
        )
        .perturbation(perturbation)
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    let base_radii = match &args.radii {
        Some(path) => RadiusTable::load(path)?,
        None => RadiusTable::covalent(),
    };
    let radii = match &file_config.radii {
        Some(overrides) => base_radii.with_overrides(overrides)?,
        None => base_radii,
    };

    debug!(?sampler, "Sampler configuration resolved.");

    Ok(SampleAppConfig {
        input_path: args.input.clone(),
        output_path: args.output.clone(),
        seed: args.seed.or(sampler_file.seed),
        radii,
        sampler,
    })
}

pub fn build_qc_config(args: &QcArgs) -> Result<QcAppConfig> {
    let defaults = DefaultsConfig::default();
    let mut file_config = load_file_config(args.config.as_deref(), &args.set_values)?;
    let qc_file = file_config.qc.take().unwrap_or_default();

    let qc = QcConfigBuilder::new()
        .min_distance(
            args.min_distance
                .or(qc_file.min_distance)
                .unwrap_or(defaults.min_distance),
        )
        .max_force(
            args.max_force
                .or(qc_file.max_force)
                .unwrap_or(defaults.max_force),
        )
        .sigma_n(args.sigma_n.or(qc_file.sigma_n).unwrap_or(defaults.sigma_n))
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;

    debug!(?qc, "Quality-control configuration resolved.");

    Ok(QcAppConfig {
        input_paths: args.inputs.clone(),
        output_path: args.output.clone(),
        report_dir: args
            .report_dir
            .clone()
            .or(qc_file.report_dir)
            .unwrap_or(defaults.report_dir),
        reference_path: args.reference.clone().or(qc_file.reference),
        qc,
    })
}

fn parse_value<T: FromStr>(key: &str, value: &str, kind: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid {kind} value for {key}: {value}")))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    for kv_pair in set_values {
        let Some((key, value)) = kv_pair.split_once('=') else {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{kv_pair}'. Expected KEY=VALUE."
            )));
        };
        let key = key.trim();

        match key {
            "sampler.target-count" => {
                config.sampler.get_or_insert_with(Default::default).target_count =
                    Some(parse_value(key, value, "integer")?);
            }
            "sampler.attempt-multiplier" => {
                config
                    .sampler
                    .get_or_insert_with(Default::default)
                    .attempt_multiplier = Some(parse_value(key, value, "integer")?);
            }
            "sampler.threshold-factor" => {
                config
                    .sampler
                    .get_or_insert_with(Default::default)
                    .threshold_factor = Some(parse_value(key, value, "float")?);
            }
            "sampler.seed" => {
                config.sampler.get_or_insert_with(Default::default).seed =
                    Some(parse_value(key, value, "integer")?);
            }
            "perturbation.cell-pert-fraction" => {
                config
                    .perturbation
                    .get_or_insert_with(Default::default)
                    .cell_pert_fraction = Some(parse_value(key, value, "float")?);
            }
            "perturbation.atom-pert-distance" => {
                config
                    .perturbation
                    .get_or_insert_with(Default::default)
                    .atom_pert_distance = Some(parse_value(key, value, "float")?);
            }
            "perturbation.atom-pert-style" => {
                config
                    .perturbation
                    .get_or_insert_with(Default::default)
                    .atom_pert_style = Some(parse_value(key, value, "style")?);
            }
            "qc.min-distance" => {
                config.qc.get_or_insert_with(Default::default).min_distance =
                    Some(parse_value(key, value, "float")?);
            }
            "qc.max-force" => {
                config.qc.get_or_insert_with(Default::default).max_force =
                    Some(parse_value(key, value, "float")?);
            }
            "qc.sigma-n" => {
                config.qc.get_or_insert_with(Default::default).sigma_n =
                    Some(parse_value(key, value, "float")?);
            }
            "qc.reference" => {
                config.qc.get_or_insert_with(Default::default).reference =
                    Some(value.trim().into());
            }
            "qc.report-dir" => {
                config.qc.get_or_insert_with(Default::default).report_dir =
                    Some(value.trim().into());
            }
            _ => match key.strip_prefix("radii.") {
                Some(element) if !element.is_empty() => {
                    let radius = parse_value(key, value, "float")?;
                    config
                        .radii
                        .get_or_insert_with(Default::default)
                        .insert(element.to_string(), radius);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{key}'"
                    )));
                }
            },
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mlpforge::engine::config::DisplacementStyle;
    use std::fs;
    use std::path::PathBuf;

    fn sample_args() -> SampleArgs {
        SampleArgs {
            input: PathBuf::from("base.xyz"),
            output: PathBuf::from("out.xyz"),
            target_count: Some(10),
            ..Default::default()
        }
    }

    fn qc_args() -> QcArgs {
        QcArgs {
            inputs: vec![PathBuf::from("a.xyz")],
            output: PathBuf::from("kept.xyz"),
            ..Default::default()
        }
    }

    fn write_config(dir: &Path, toml: &str) -> PathBuf {
        let path = dir.join("config.toml");
        fs::write(&path, toml).unwrap();
        path
    }

    #[test]
    fn sample_config_uses_defaults_without_file() {
        let config = build_sample_config(&sample_args()).unwrap();
        assert_eq!(config.sampler.target_count, 10);
        assert_eq!(config.sampler.attempt_multiplier, 10);
        assert_eq!(config.sampler.threshold_factor, 0.5);
        assert_eq!(config.sampler.perturbation, PerturbationConfig::default());
        assert_eq!(config.radii, RadiusTable::covalent());
        assert_eq!(config.seed, None);
    }

    #[test]
    fn sample_config_requires_a_target_count() {
        let mut args = sample_args();
        args.target_count = None;
        assert!(matches!(
            build_sample_config(&args),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    fn file_values_fill_in_and_cli_flags_win() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            [sampler]
            target-count = 99
            attempt-multiplier = 4
            seed = 11

            [perturbation]
            atom-pert-distance = 0.2
            atom-pert-style = "uniform"

            [radii]
            O = 0.7
            "#,
        );
        let mut args = sample_args();
        args.config = Some(path);
        args.atom_pert_distance = Some(0.05);

        let config = build_sample_config(&args).unwrap();

        assert_eq!(config.sampler.target_count, 10);
        assert_eq!(config.sampler.attempt_multiplier, 4);
        assert_eq!(config.sampler.perturbation.atom_pert_distance, 0.05);
        assert_eq!(
            config.sampler.perturbation.atom_pert_style,
            DisplacementStyle::Uniform
        );
        assert_eq!(config.seed, Some(11));
        assert_eq!(config.radii.radius("O").unwrap(), 0.7);
        assert_eq!(config.radii.radius("H").unwrap(), 0.31);
    }

    #[test]
    fn set_values_override_file_but_not_cli() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            [qc]
            sigma-n = 5.0
            max-force = 30.0
            "#,
        );
        let mut args = qc_args();
        args.config = Some(path);
        args.max_force = Some(80.0);
        args.set_values = vec!["qc.sigma-n=2.5".into(), "qc.max-force=10".into()];

        let config = build_qc_config(&args).unwrap();

        assert_eq!(config.qc.sigma_n, 2.5);
        assert_eq!(config.qc.max_force, 80.0);
        assert_eq!(config.qc.min_distance, 0.8);
        assert_eq!(config.report_dir, PathBuf::from("."));
    }

    #[test]
    fn set_values_accept_radius_overrides() {
        let mut args = sample_args();
        args.set_values = vec!["radii.Ca=2.0".into()];
        let config = build_sample_config(&args).unwrap();
        assert_eq!(config.radii.radius("Ca").unwrap(), 2.0);
    }

    #[test]
    fn malformed_and_unknown_set_values_are_errors() {
        for bad in ["qc.sigma-n", "qc.sigma-n=abc", "qc.unknown=1", "radii.=1.0"] {
            let mut args = qc_args();
            args.set_values = vec![bad.to_string()];
            assert!(
                matches!(build_qc_config(&args), Err(CliError::Config(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn out_of_range_values_surface_as_config_errors() {
        let mut args = qc_args();
        args.min_distance = Some(-1.0);
        assert!(matches!(build_qc_config(&args), Err(CliError::Config(_))));

        let mut args = sample_args();
        args.attempt_multiplier = Some(0);
        assert!(matches!(build_sample_config(&args), Err(CliError::Config(_))));
    }

    #[test]
    fn reference_and_report_dir_come_from_file_when_not_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
            [qc]
            reference = "ref.xyz"
            report-dir = "reports"
            "#,
        );
        let mut args = qc_args();
        args.config = Some(path);

        let config = build_qc_config(&args).unwrap();

        assert_eq!(config.reference_path, Some(PathBuf::from("ref.xyz")));
        assert_eq!(config.report_dir, PathBuf::from("reports"));
    }
}
