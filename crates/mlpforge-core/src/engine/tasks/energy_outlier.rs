use super::apply_check;
use crate::core::models::batch::ConfigurationBatch;
use crate::core::utils::statistics::mean_and_std;
use crate::engine::config::BaselineSource;
use crate::engine::error::EngineError;
use crate::engine::progress::ProgressReporter;
use crate::engine::state::{RejectionReason, ValidityMask};
use tracing::{debug, info, instrument};

const RELATIVE_VARIANCE_FLOOR: f64 = 1e-12;

/// Mean and population standard deviation of per-atom energy (eV/atom).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyBaseline {
    pub mean: f64,
    pub std: f64,
    pub population: usize,
}

impl EnergyBaseline {
    pub fn from_values(per_atom_energies: &[f64]) -> Option<Self> {
        let (mean, std) = mean_and_std(per_atom_energies)?;
        Some(Self {
            mean,
            std,
            population: per_atom_energies.len(),
        })
    }

    /// Baseline over every frame of `batch`, e.g. a separately curated reference set.
    pub fn from_batch(batch: &ConfigurationBatch) -> Result<Option<Self>, EngineError> {
        batch
            .validate()
            .map_err(|(frame, source)| EngineError::MalformedFrame { frame, source })?;
        let energies: Vec<f64> = batch.iter().map(|f| f.energy_per_atom()).collect();
        Ok(Self::from_values(&energies))
    }

    /// True when a z-score against this baseline carries no information.
    pub fn is_degenerate(&self) -> bool {
        self.population < 2 || self.std <= RELATIVE_VARIANCE_FLOOR * self.mean.abs().max(1.0)
    }

    pub fn z_score(&self, per_atom_energy: f64) -> f64 {
        (per_atom_energy - self.mean).abs() / self.std
    }

    fn is_outlier(&self, per_atom_energy: f64, sigma_n: f64) -> bool {
        (per_atom_energy - self.mean).abs() > sigma_n * self.std
    }
}

/// Resolves the baseline the check will use, before any frame is judged.
pub fn resolve_baseline(
    batch: &ConfigurationBatch,
    mask: &ValidityMask,
    source: &BaselineSource,
) -> Option<EnergyBaseline> {
    match source {
        BaselineSource::Reference(baseline) => Some(*baseline),
        BaselineSource::ValidPopulation => {
            let energies: Vec<f64> = mask
                .valid_indices()
                .into_iter()
                .filter_map(|i| batch.get(i))
                .map(|f| f.energy_per_atom())
                .collect();
            EnergyBaseline::from_values(&energies)
        }
    }
}

/// Rejects frames whose per-atom energy lies more than `sigma_n` standard
/// deviations from the baseline mean.
///
/// The baseline is frozen before the first rejection, so the order in which
/// frames are examined never changes the outcome. A degenerate baseline turns
/// the check into a no-op.
#[instrument(skip_all, name = "energy_outlier_task", fields(sigma_n = sigma_n))]
pub fn run(
    batch: &ConfigurationBatch,
    mask: &mut ValidityMask,
    sigma_n: f64,
    source: &BaselineSource,
    reporter: &ProgressReporter,
) -> Result<(usize, Option<EnergyBaseline>), EngineError> {
    let baseline = resolve_baseline(batch, mask, source);

    let Some(active) = baseline.filter(|b| !b.is_degenerate()) else {
        debug!(?baseline, "Energy baseline is degenerate; skipping outlier check.");
        return Ok((0, baseline));
    };

    info!(
        mean = active.mean,
        std = active.std,
        population = active.population,
        "Checking per-atom energies against baseline."
    );

    let rejected = apply_check(batch, mask, reporter, |frame| {
        let energy = frame.energy_per_atom();
        active
            .is_outlier(energy, sigma_n)
            .then(|| RejectionReason::EnergyOutlier {
                z_score: active.z_score(energy),
                sigma_n,
            })
    })?;

    info!(rejected, "Energy outlier check complete.");
    Ok((rejected, baseline))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::RejectionCause;
    use crate::engine::tasks::fixtures::healthy;

    #[test]
    fn baseline_uses_population_std() {
        let baseline = EnergyBaseline::from_values(&[1.0, 3.0]).unwrap();
        assert_eq!(baseline.mean, 2.0);
        assert_eq!(baseline.std, 1.0);
        assert_eq!(baseline.population, 2);
        assert!(!baseline.is_degenerate());
    }

    #[test]
    fn tiny_or_flat_populations_are_degenerate() {
        assert!(EnergyBaseline::from_values(&[5.0]).unwrap().is_degenerate());
        assert!(EnergyBaseline::from_values(&[-7.0; 4]).unwrap().is_degenerate());
        assert!(EnergyBaseline::from_values(&[]).is_none());
    }

    #[test]
    fn reference_baseline_rejects_frame_ten_sigma_away() {
        // Per-atom energy of a dimer is energy / 2.
        let e = -5.0;
        let sigma = 0.01;
        let mut frames: Vec<_> = (0..9).map(|_| healthy(2.0 * e)).collect();
        frames.push(healthy(2.0 * (e + 10.0 * sigma)));
        let batch = ConfigurationBatch::from_frames(frames);
        let mut mask = ValidityMask::new(batch.len());
        let source = BaselineSource::Reference(EnergyBaseline {
            mean: e,
            std: sigma,
            population: 100,
        });

        let (rejected, _) = run(&batch, &mut mask, 3.0, &source, &ProgressReporter::new()).unwrap();

        assert_eq!(rejected, 1);
        assert_eq!(mask.valid_count(), 9);
        assert!(!mask.is_valid(9));
        assert_eq!(mask.log().count(RejectionCause::Energy), 1);
    }

    #[test]
    fn identical_energies_reject_nothing() {
        let batch = ConfigurationBatch::from_frames((0..10).map(|_| healthy(-3.2)).collect());
        let mut mask = ValidityMask::new(batch.len());

        let (rejected, baseline) = run(
            &batch,
            &mut mask,
            3.0,
            &BaselineSource::ValidPopulation,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(rejected, 0);
        assert_eq!(mask.valid_count(), 10);
        assert!(baseline.unwrap().is_degenerate());
    }

    #[test]
    fn population_baseline_ignores_frames_rejected_earlier() {
        // The far-off frame was already rejected, so it must not inflate the std.
        let mut frames: Vec<_> = (0..20)
            .map(|i| healthy(-10.0 + if i % 2 == 0 { 0.01 } else { -0.01 }))
            .collect();
        frames.push(healthy(5000.0));
        frames.push(healthy(-9.0));
        let batch = ConfigurationBatch::from_frames(frames);
        let mut mask = ValidityMask::new(batch.len());
        mask.reject(
            20,
            RejectionReason::ExcessiveForce {
                max_force: 80.0,
                tolerance: 50.0,
            },
        )
        .unwrap();

        let (rejected, baseline) = run(
            &batch,
            &mut mask,
            3.0,
            &BaselineSource::ValidPopulation,
            &ProgressReporter::new(),
        )
        .unwrap();

        assert_eq!(baseline.unwrap().population, 21);
        assert_eq!(rejected, 1);
        assert!(!mask.is_valid(21));
    }

    #[test]
    fn reference_batch_baseline_checks_frames() {
        let mut bad = healthy(-1.0);
        bad.forces.pop();
        let batch = ConfigurationBatch::from_frames(vec![healthy(-1.0), bad]);
        assert!(matches!(
            EnergyBaseline::from_batch(&batch),
            Err(EngineError::MalformedFrame { frame: 1, .. })
        ));
    }
}
