use crate::cli::QcArgs;
use crate::config::build_qc_config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mlpforge::{
    core::io::{extxyz::ExtXyzFile, traits::ConfigurationFile},
    engine::config::BaselineSource,
    engine::progress::ProgressReporter,
    engine::report::QcReport,
    engine::state::{FilteredBatch, QcOutcome},
    engine::tasks::energy_outlier::EnergyBaseline,
    workflows,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const REJECTED_LOG_FILE: &str = "qc_rejected_log.txt";
pub const SUMMARY_FILE: &str = "qc_summary.txt";

fn load_reference_baseline(path: &Path) -> Result<EnergyBaseline> {
    info!("Computing energy baseline from reference set {:?}", path);
    let reference =
        ExtXyzFile::read_batch_from_path(path).map_err(|e| CliError::parsing(path, e))?;
    EnergyBaseline::from_batch(&reference)?.ok_or_else(|| {
        CliError::Argument(format!(
            "reference file '{}' contains no frames",
            path.display()
        ))
    })
}

/// Writes the rejection log and the summary into `dir`, creating it if needed.
pub fn write_reports(
    dir: &Path,
    outcome: &QcOutcome,
    report: &QcReport,
) -> Result<(PathBuf, PathBuf)> {
    fs::create_dir_all(dir)?;

    let log_path = dir.join(REJECTED_LOG_FILE);
    let mut log = outcome.rejection_log.render();
    if !log.is_empty() {
        log.push('\n');
    }
    fs::write(&log_path, log)?;

    let summary_path = dir.join(SUMMARY_FILE);
    fs::write(&summary_path, report.to_string())?;

    Ok((log_path, summary_path))
}

pub fn run(args: QcArgs, progress: &CliProgressHandler) -> Result<()> {
    let mut config = build_qc_config(&args)?;
    let reporter = ProgressReporter::with_callback(progress.get_callback());

    if let Some(path) = &config.reference_path {
        config.qc.energy_baseline = BaselineSource::Reference(load_reference_baseline(path)?);
    }

    let collection = workflows::collect::run(&config.input_paths, &reporter);
    for item in collection.failures() {
        if let Err(reason) = &item.result {
            println!("Skipped {}: {}", item.path.display(), reason);
        }
    }
    let unreadable = collection.failure_count();
    if collection.batch.is_empty() {
        warn!("No frames could be read from the inputs.");
    }

    println!("Running quality control on {} frames...", collection.batch.len());
    let outcome = workflows::qc::run(collection.batch, &config.qc, &reporter)?;
    let report = QcReport::from_outcome(&outcome).with_unreadable_inputs(unreadable);

    let (log_path, summary_path) = write_reports(&config.report_dir, &outcome, &report)?;
    info!(log = ?log_path, summary = ?summary_path, "Reports written.");

    match &outcome.filtered {
        FilteredBatch::Retained(batch) => {
            ExtXyzFile::write_batch_to_path(batch, &config.output_path)
                .map_err(|e| CliError::parsing(&config.output_path, e))?;
            println!(
                "✓ {} frames written to: {}",
                batch.len(),
                config.output_path.display()
            );
        }
        FilteredBatch::Empty => {
            warn!("Every frame was rejected; no output file written.");
            println!("Warning: every frame was rejected; no output file written.");
        }
    }

    print!("{report}");
    Ok(())
}
