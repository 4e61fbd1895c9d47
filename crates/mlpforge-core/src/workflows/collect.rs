use crate::core::io::extxyz::ExtXyzFile;
use crate::core::io::traits::ConfigurationFile;
use crate::core::models::batch::ConfigurationBatch;
use crate::engine::progress::{Progress, ProgressReporter};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// What happened to one input file: its frame count, or why it was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemOutcome {
    pub path: PathBuf,
    pub result: Result<usize, String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectionOutcome {
    /// Frames of every readable file, concatenated in input order.
    pub batch: ConfigurationBatch,
    pub items: Vec<ItemOutcome>,
}

impl CollectionOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &ItemOutcome> {
        self.items.iter().filter(|item| item.result.is_err())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn success_count(&self) -> usize {
        self.items.len() - self.failure_count()
    }
}

/// Reads labeled extended XYZ files into one batch, skipping unreadable ones.
///
/// A file is skipped as a whole when any of its frames is malformed, so the
/// merged batch always passes [`ConfigurationBatch::validate`].
pub fn run<P: AsRef<Path>>(paths: &[P], reporter: &ProgressReporter) -> CollectionOutcome {
    run_with_format::<ExtXyzFile, P>(paths, reporter)
}

#[instrument(skip_all, name = "collect_workflow", fields(inputs = paths.len()))]
pub fn run_with_format<F: ConfigurationFile, P: AsRef<Path>>(
    paths: &[P],
    reporter: &ProgressReporter,
) -> CollectionOutcome {
    reporter.report(Progress::PhaseStart {
        name: "Reading Inputs",
    });
    reporter.report(Progress::TaskStart {
        total_steps: paths.len() as u64,
    });

    let mut outcome = CollectionOutcome::default();
    for path in paths {
        let path = path.as_ref();
        let result = match F::read_batch_from_path(path) {
            Ok(batch) if batch.is_empty() => Err("file contains no frames".to_string()),
            Ok(batch) => match batch.validate() {
                Ok(()) => {
                    let count = batch.len();
                    outcome.batch.extend(batch);
                    Ok(count)
                }
                Err((frame, e)) => Err(format!("frame {frame}: {e}")),
            },
            Err(e) => Err(e.to_string()),
        };
        if let Err(reason) = &result {
            warn!(path = %path.display(), %reason, "Skipping unreadable input.");
        }
        outcome.items.push(ItemOutcome {
            path: path.to_path_buf(),
            result,
        });
        reporter.report(Progress::TaskIncrement);
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    info!(
        frames = outcome.batch.len(),
        readable = outcome.success_count(),
        skipped = outcome.failure_count(),
        "Input collection complete."
    );
    outcome
}
