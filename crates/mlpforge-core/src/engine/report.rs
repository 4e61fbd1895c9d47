use super::state::{QcOutcome, RejectionCause};
use super::tasks::energy_outlier::EnergyBaseline;
use crate::core::utils::statistics::{Summary, summarize};
use std::fmt;

/// Read-only summary of a quality-control run.
#[derive(Debug, Clone, PartialEq)]
pub struct QcReport {
    pub total: usize,
    pub kept: usize,
    pub rejected: usize,
    pub overlap: usize,
    pub force: usize,
    pub energy: usize,
    /// Input files that could not be read; zero unless set by the caller.
    pub unreadable_inputs: usize,
    pub energy_baseline: Option<EnergyBaseline>,
    /// Per-atom energy of the retained frames (eV/atom).
    pub retained_energy: Option<Summary>,
    /// Largest absolute force component of each retained frame (eV/Å).
    pub retained_max_force: Option<Summary>,
}

impl QcReport {
    pub fn from_outcome(outcome: &QcOutcome) -> Self {
        let log = &outcome.rejection_log;
        let (energies, forces): (Vec<f64>, Vec<f64>) = outcome
            .filtered
            .batch()
            .map(|batch| {
                batch
                    .iter()
                    .map(|f| (f.energy_per_atom(), f.max_force_component()))
                    .unzip()
            })
            .unwrap_or_default();

        Self {
            total: outcome.total(),
            kept: outcome.kept(),
            rejected: outcome.rejected(),
            overlap: log.count(RejectionCause::Overlap),
            force: log.count(RejectionCause::Force),
            energy: log.count(RejectionCause::Energy),
            unreadable_inputs: 0,
            energy_baseline: outcome.energy_baseline,
            retained_energy: summarize(&energies),
            retained_max_force: summarize(&forces),
        }
    }

    pub fn with_unreadable_inputs(mut self, count: usize) -> Self {
        self.unreadable_inputs = count;
        self
    }

    pub fn count(&self, cause: RejectionCause) -> usize {
        match cause {
            RejectionCause::Overlap => self.overlap,
            RejectionCause::Force => self.force,
            RejectionCause::Energy => self.energy,
        }
    }

    /// Percentage of processed frames that were rejected.
    pub fn rejection_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            100.0 * self.rejected as f64 / self.total as f64
        }
    }
}

impl fmt::Display for QcReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Original {} frames -> kept {} (rejected {:.1}%)",
            self.total,
            self.kept,
            self.rejection_rate()
        )?;
        for cause in RejectionCause::ALL {
            writeln!(f, "  {cause}: {}", self.count(cause))?;
        }
        if self.unreadable_inputs > 0 {
            writeln!(f, "  unreadable inputs: {}", self.unreadable_inputs)?;
        }
        if let Some(b) = &self.energy_baseline {
            writeln!(
                f,
                "Energy baseline: mean {:.6} eV/atom, std {:.6} eV/atom over {} frames",
                b.mean, b.std, b.population
            )?;
        }
        if let Some(s) = &self.retained_energy {
            writeln!(
                f,
                "Retained energy/atom: min {:.6} max {:.6} mean {:.6}",
                s.min, s.max, s.mean
            )?;
        }
        if let Some(s) = &self.retained_max_force {
            writeln!(
                f,
                "Retained max |F|: min {:.4} max {:.4} mean {:.4}",
                s.min, s.max, s.mean
            )?;
        }
        Ok(())
    }
}
