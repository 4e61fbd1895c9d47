use crate::cli::SampleArgs;
use crate::config::build_sample_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mlpforge::{
    core::io::{extxyz::ExtXyzFile, traits::ConfigurationFile},
    core::models::configuration::AtomicConfiguration,
    engine::perturbation::RandomPerturber,
    engine::progress::ProgressReporter,
    workflows::{self, sample::SamplingStatus},
};
use std::path::Path;
use tracing::{info, warn};

fn read_base_structure(path: &Path) -> Result<AtomicConfiguration> {
    let mut frames = ExtXyzFile::read_from_path(path).map_err(|e| CliError::parsing(path, e))?;
    if frames.len() > 1 {
        warn!(
            frames = frames.len(),
            "Base file holds several frames; only the first is perturbed."
        );
    }
    if frames.is_empty() {
        return Err(CliError::Argument(format!(
            "base structure file '{}' contains no frames",
            path.display()
        )));
    }
    Ok(frames.swap_remove(0).configuration)
}

pub fn run(args: SampleArgs, progress: &CliProgressHandler) -> Result<()> {
    let config = build_sample_config(&args)?;

    info!("Loading base structure from {:?}", &config.input_path);
    let base = read_base_structure(&config.input_path)?;

    let mut perturber = match config.seed {
        Some(seed) => {
            info!(seed, "Using a fixed seed.");
            RandomPerturber::seeded(seed)
        }
        None => RandomPerturber::from_entropy(),
    };
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    println!(
        "Sampling {} perturbed structures from {} atoms...",
        config.sampler.target_count,
        base.atom_count()
    );
    let outcome = workflows::sample::run(
        &base,
        &config.sampler,
        &config.radii,
        &mut perturber,
        &reporter,
    )?;

    ExtXyzFile::write_configurations_to_path(&outcome.accepted, &config.output_path)
        .map_err(|e| CliError::parsing(&config.output_path, e))?;

    match outcome.status {
        SamplingStatus::Succeeded => println!(
            "✓ {} structures accepted in {} attempts, written to: {}",
            outcome.accepted.len(),
            outcome.attempts,
            config.output_path.display()
        ),
        SamplingStatus::Exhausted => println!(
            "Warning: only {} of {} structures accepted after {} attempts; partial result written to: {}",
            outcome.accepted.len(),
            config.sampler.target_count,
            outcome.attempts,
            config.output_path.display()
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    const BASE: &str = r#"2
Lattice="4.8 0.0 0.0 0.0 4.8 0.0 0.0 0.0 4.8" Properties=species:S:1:pos:R:3 pbc="T T T"
Ca 0.0 0.0 0.0
O  2.4 2.4 2.4
"#;

    #[test]
    fn writes_requested_number_of_structures() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("base.xyz");
        let output = dir.path().join("out.xyz");
        fs::write(&input, BASE).unwrap();

        let args = SampleArgs {
            input,
            output: output.clone(),
            target_count: Some(3),
            seed: Some(1),
            ..Default::default()
        };
        run(args, &CliProgressHandler::hidden()).unwrap();

        let frames = ExtXyzFile::read_from_path(&output).unwrap();
        assert_eq!(frames.len(), 3);
        assert!(frames.iter().all(|f| !f.is_labeled()));
    }

    #[test]
    fn empty_base_file_is_an_argument_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.xyz");
        fs::write(&input, "").unwrap();

        let args = SampleArgs {
            input,
            output: PathBuf::from("unused.xyz"),
            target_count: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            run(args, &CliProgressHandler::hidden()),
            Err(CliError::Argument(_))
        ));
    }
}
