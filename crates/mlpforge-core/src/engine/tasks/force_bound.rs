use super::apply_check;
use crate::core::models::batch::ConfigurationBatch;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::state::{RejectionReason, ValidityMask};
use tracing::{info, instrument};

/// Rejects frames with any force component larger in magnitude than `max_force` (eV/Å).
#[instrument(skip_all, name = "force_bound_task", fields(tolerance = max_force))]
pub fn run(
    batch: &ConfigurationBatch,
    mask: &mut ValidityMask,
    max_force: f64,
    reporter: &ProgressReporter,
) -> Result<usize, EngineError> {
    info!(frames = mask.valid_count(), "Checking force magnitudes.");

    let rejected = apply_check(batch, mask, reporter, |frame| {
        let largest = frame.max_force_component();
        (largest > max_force).then_some(RejectionReason::ExcessiveForce {
            max_force: largest,
            tolerance: max_force,
        })
    })?;

    info!(rejected, "Force check complete.");
    Ok(rejected)
}
