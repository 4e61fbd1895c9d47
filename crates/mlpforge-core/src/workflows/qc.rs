use crate::core::models::batch::ConfigurationBatch;
use crate::engine::config::QcConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{FilteredBatch, FrameStatus, QcOutcome, ValidityMask};
use crate::engine::tasks;
use tracing::{info, instrument, warn};

/// Screens `batch` with the overlap, force and energy checks, in that order.
///
/// Each check only sees frames that survived the previous ones, and a frame is
/// rejected by the first check it fails. The retained frames keep their
/// original order. Returns an error only if a threshold is out of range or a
/// frame is malformed.
#[instrument(skip_all, name = "qc_workflow", fields(frames = batch.len()))]
pub fn run(
    batch: ConfigurationBatch,
    config: &QcConfig,
    reporter: &ProgressReporter,
) -> Result<QcOutcome, EngineError> {
    config.validate()?;
    batch
        .validate()
        .map_err(|(frame, source)| EngineError::MalformedFrame { frame, source })?;

    info!(
        min_distance = config.min_distance,
        max_force = config.max_force,
        sigma_n = config.sigma_n,
        "Starting quality control."
    );

    let mut mask = ValidityMask::new(batch.len());

    reporter.report(Progress::PhaseStart {
        name: "Overlap Check",
    });
    tasks::overlap::run(&batch, &mut mask, config.min_distance, reporter)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Force Check",
    });
    tasks::force_bound::run(&batch, &mut mask, config.max_force, reporter)?;
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Energy Outlier Check",
    });
    let (_, energy_baseline) = tasks::energy_outlier::run(
        &batch,
        &mut mask,
        config.sigma_n,
        &config.energy_baseline,
        reporter,
    )?;
    reporter.report(Progress::PhaseFinish);

    let (statuses, rejection_log) = mask.into_parts();
    let retained =
        batch.retain_indices(|i| statuses.get(i).is_some_and(FrameStatus::is_valid));
    let filtered = FilteredBatch::from_batch(retained);

    if filtered.is_empty() && !statuses.is_empty() {
        warn!(frames = statuses.len(), "Every frame was rejected.");
    }
    info!(
        kept = filtered.len(),
        rejected = rejection_log.len(),
        "Quality control complete."
    );

    Ok(QcOutcome {
        statuses,
        rejection_log,
        filtered,
        energy_baseline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::config::{BaselineSource, QcConfigBuilder};
    use crate::engine::state::{RejectionCause, RejectionReason};
    use crate::engine::tasks::energy_outlier::EnergyBaseline;
    use crate::engine::tasks::fixtures::{dimer, healthy};

    fn defaults() -> QcConfig {
        QcConfig::default()
    }

    #[test]
    fn rejects_overlap_and_force_frames_out_of_ten() {
        let frames = (0..10)
            .map(|i| match i {
                3 => dimer(0.1, 1.0, -10.0),
                5 => dimer(2.3, 120.0, -10.0),
                _ => healthy(-10.0),
            })
            .collect();

        let outcome = run(frames, &defaults(), &ProgressReporter::new()).unwrap();

        assert_eq!(outcome.rejected_indices(), vec![3, 5]);
        assert_eq!(outcome.kept(), 8);
        assert_eq!(outcome.rejection_log.len(), 2);
        let lines: Vec<String> = outcome
            .rejection_log
            .entries()
            .iter()
            .map(|e| e.to_string())
            .collect();
        assert_eq!(lines[0], "Frame 3: Min dist 0.100 < 0.8");
        assert_eq!(lines[1], "Frame 5: Max force 120.00 > 50");
    }

    #[test]
    fn first_failing_check_wins_and_log_follows_check_order() {
        let frames = vec![
            healthy(-10.0),
            healthy(-10.0),
            dimer(2.3, 90.0, -10.0),
            healthy(-10.0),
            dimer(0.2, 90.0, -10.0),
        ]
        .into_iter()
        .collect();

        let outcome = run(frames, &defaults(), &ProgressReporter::new()).unwrap();

        assert_eq!(outcome.rejected_indices(), vec![4, 2]);
        assert_eq!(
            outcome.rejection_log.entries()[0].reason.cause(),
            RejectionCause::Overlap
        );
        assert!(matches!(
            outcome.statuses[2],
            FrameStatus::Rejected(RejectionReason::ExcessiveForce { .. })
        ));
    }

    #[test]
    fn reference_baseline_catches_ten_sigma_outlier() {
        let e = -4.0;
        let sigma = 0.02;
        let reference: ConfigurationBatch = (0..10)
            .map(|i| {
                let offset = if i % 2 == 0 { sigma } else { -sigma };
                healthy(2.0 * (e + offset))
            })
            .collect();
        let baseline = EnergyBaseline::from_batch(&reference).unwrap().unwrap();
        assert!((baseline.std - sigma).abs() < 1e-12);

        let mut frames: Vec<_> = (0..9).map(|_| healthy(2.0 * e)).collect();
        frames.push(healthy(2.0 * (e + 10.0 * sigma)));
        let config = QcConfigBuilder::new()
            .energy_baseline(BaselineSource::Reference(baseline))
            .build()
            .unwrap();

        let outcome = run(frames.into_iter().collect(), &config, &ProgressReporter::new()).unwrap();

        assert_eq!(outcome.rejected_indices(), vec![9]);
        assert_eq!(outcome.energy_baseline, Some(baseline));
    }

    #[test]
    fn identical_energies_keep_every_frame() {
        let frames = (0..10).map(|_| healthy(-7.5)).collect();
        let outcome = run(frames, &defaults(), &ProgressReporter::new()).unwrap();
        assert_eq!(outcome.kept(), 10);
        assert!(outcome.rejection_log.is_empty());
    }

    #[test]
    fn filtering_its_own_output_rejects_nothing_more() {
        let mut frames: Vec<_> = (0..10)
            .map(|i| healthy(2.0 * (-5.0 + 0.004 * i as f64 - 0.018)))
            .collect();
        frames.insert(4, dimer(0.3, 1.0, -10.0));
        frames.push(healthy(100.0));

        let first = run(frames.into_iter().collect(), &defaults(), &ProgressReporter::new()).unwrap();
        assert_eq!(first.rejected_indices(), vec![4, 11]);
        assert_eq!(first.kept(), 10);

        let second = run(
            first.filtered.into_batch(),
            &defaults(),
            &ProgressReporter::new(),
        )
        .unwrap();
        assert!(second.rejection_log.is_empty());
        assert_eq!(second.kept(), 10);
    }

    #[test]
    fn malformed_frame_is_reported_by_index() {
        let mut broken = healthy(-1.0);
        broken.configuration.elements.pop();
        let frames = vec![healthy(-1.0), healthy(-1.0), broken].into_iter().collect();

        let result = run(frames, &defaults(), &ProgressReporter::new());

        assert!(matches!(result, Err(EngineError::MalformedFrame { frame: 2, .. })));
    }

    #[test]
    fn all_rejected_yields_distinguished_empty_result() {
        let frames = vec![dimer(0.1, 1.0, -1.0), dimer(0.2, 1.0, -1.0)]
            .into_iter()
            .collect();
        let outcome = run(frames, &defaults(), &ProgressReporter::new()).unwrap();
        assert_eq!(outcome.filtered, FilteredBatch::Empty);
        assert_eq!(outcome.total(), 2);
    }

    #[test]
    fn out_of_range_thresholds_are_refused_before_screening() {
        let config = QcConfig {
            sigma_n: f64::NAN,
            ..defaults()
        };
        let frames = (0..3).map(|_| healthy(-1.0)).collect();

        let result = run(frames, &config, &ProgressReporter::new());

        assert!(matches!(result, Err(EngineError::Config(_))));
    }

    #[test]
    fn empty_batch_is_empty_result_not_error() {
        let outcome = run(ConfigurationBatch::new(), &defaults(), &ProgressReporter::new()).unwrap();
        assert!(outcome.filtered.is_empty());
        assert!(outcome.statuses.is_empty());
    }
}
