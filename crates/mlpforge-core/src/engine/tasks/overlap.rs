use super::apply_check;
use crate::core::models::batch::ConfigurationBatch;
use crate::core::utils::geometry::minimum_distance;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::state::{RejectionReason, ValidityMask};
use tracing::{info, instrument};

/// Rejects frames whose closest minimum-image pair is nearer than `min_distance` (Å).
#[instrument(skip_all, name = "overlap_check_task", fields(threshold = min_distance))]
pub fn run(
    batch: &ConfigurationBatch,
    mask: &mut ValidityMask,
    min_distance: f64,
    reporter: &ProgressReporter,
) -> Result<usize, EngineError> {
    info!(frames = mask.valid_count(), "Checking interatomic distances.");

    let rejected = apply_check(batch, mask, reporter, |frame| {
        let configuration = &frame.configuration;
        minimum_distance(&configuration.positions, configuration.cell.as_ref())
            .filter(|pair| pair.distance < min_distance)
            .map(|pair| RejectionReason::Overlap {
                min_distance: pair.distance,
                threshold: min_distance,
            })
    })?;

    info!(rejected, "Overlap check complete.");
    Ok(rejected)
}
