//! Per-frame quality-control checks.
//!
//! Each submodule implements one check of the filter pipeline. A check only
//! looks at frames that are still valid in the [`ValidityMask`], evaluates
//! them independently (in parallel when the `parallel` feature is enabled)
//! and then applies its rejections to the mask on the calling thread, in
//! frame order.

pub mod energy_outlier;
pub mod force_bound;
pub mod overlap;

use crate::core::models::batch::ConfigurationBatch;
use crate::core::models::configuration::LabeledConfiguration;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{RejectionReason, ValidityMask};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Runs `check` on every still-valid frame and records the rejections it returns.
///
/// Returns the number of frames rejected by this check.
pub(crate) fn apply_check<F>(
    batch: &ConfigurationBatch,
    mask: &mut ValidityMask,
    reporter: &ProgressReporter,
    check: F,
) -> Result<usize, EngineError>
where
    F: Fn(&LabeledConfiguration) -> Option<RejectionReason> + Sync,
{
    if mask.len() != batch.len() {
        return Err(EngineError::Internal(format!(
            "validity mask covers {} frames but the batch holds {}",
            mask.len(),
            batch.len()
        )));
    }

    let candidates = mask.valid_indices();
    let frames = batch.frames();

    reporter.report(Progress::TaskStart {
        total_steps: candidates.len() as u64,
    });

    #[cfg(not(feature = "parallel"))]
    let iterator = candidates.iter();

    #[cfg(feature = "parallel")]
    let iterator = candidates.par_iter();

    let decisions: Vec<(usize, RejectionReason)> = iterator
        .filter_map(|&index| {
            let decision = check(&frames[index]).map(|reason| (index, reason));
            reporter.report(Progress::TaskIncrement);
            decision
        })
        .collect();

    reporter.report(Progress::TaskFinish);

    let rejected = decisions.len();
    for (index, reason) in decisions {
        mask.reject(index, reason)?;
    }
    Ok(rejected)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::core::models::cell::Cell;
    use crate::core::models::configuration::{AtomicConfiguration, LabeledConfiguration};
    use nalgebra::{Point3, Vector3};

    /// Two-atom periodic frame in a 10 Å cube.
    pub fn dimer(separation: f64, force: f64, energy: f64) -> LabeledConfiguration {
        let cell = Cell::orthorhombic(10.0, 10.0, 10.0).unwrap();
        let configuration = AtomicConfiguration::periodic(
            vec![Point3::new(2.0, 2.0, 2.0), Point3::new(2.0 + separation, 2.0, 2.0)],
            vec!["Si".into(), "Si".into()],
            cell,
        );
        LabeledConfiguration::new(
            configuration,
            energy,
            vec![Vector3::new(force, 0.0, 0.0), Vector3::new(-force, 0.5, 0.0)],
        )
    }

    pub fn healthy(energy: f64) -> LabeledConfiguration {
        dimer(2.3, 1.0, energy)
    }
}
