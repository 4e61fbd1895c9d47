use crate::core::models::configuration::AtomicConfiguration;
use crate::core::radii::RadiusTable;
use crate::engine::config::SamplerConfig;
use crate::engine::error::EngineError;
use crate::engine::perturbation::Perturber;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::validator::{StructureValidator, Verdict};
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingStatus {
    /// The target count was reached.
    Succeeded,
    /// The attempt budget ran out first.
    Exhausted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingOutcome {
    pub accepted: Vec<AtomicConfiguration>,
    pub attempts: usize,
    pub status: SamplingStatus,
}

impl SamplingOutcome {
    pub fn acceptance_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.accepted.len() as f64 / self.attempts as f64
        }
    }
}

/// Draws perturbed candidates from `base` until `config.target_count` pass the
/// distance check or `config.attempt_budget()` draws have been made.
///
/// Candidates are judged against `radii` scaled by `config.threshold_factor`.
///
/// Every attempt draws exactly one candidate. Running out of attempts is
/// reported through [`SamplingStatus::Exhausted`] with the partial result;
/// only malformed input or a failing perturber produce an error.
#[instrument(skip_all, name = "sampling_workflow", fields(target = config.target_count))]
pub fn run<P: Perturber + ?Sized>(
    base: &AtomicConfiguration,
    config: &SamplerConfig,
    radii: &RadiusTable,
    perturber: &mut P,
    reporter: &ProgressReporter,
) -> Result<SamplingOutcome, EngineError> {
    let target = config.target_count;
    let budget = config.attempt_budget();

    config.perturbation.validate()?;
    let validator = StructureValidator::new(radii, config.threshold_factor)?;
    if let Verdict::Rejected(violation) = validator.validate(base)? {
        warn!(%violation, "Base structure already fails the distance check.");
    }

    info!(
        target,
        budget,
        threshold_factor = validator.threshold_factor(),
        "Starting perturbation sampling."
    );
    reporter.report(Progress::PhaseStart {
        name: "Perturbation Sampling",
    });
    reporter.report(Progress::TaskStart {
        total_steps: target as u64,
    });

    let mut accepted = Vec::with_capacity(target);
    let mut attempts = 0;
    while accepted.len() < target && attempts < budget {
        attempts += 1;
        let candidate = perturber
            .perturb(base, &config.perturbation)
            .map_err(|e| EngineError::Perturbation {
                attempt: attempts,
                message: e.to_string(),
            })?;

        match validator.validate(&candidate)? {
            Verdict::Accepted => {
                accepted.push(candidate);
                reporter.report(Progress::TaskIncrement);
            }
            Verdict::Rejected(violation) => {
                debug!(attempt = attempts, %violation, "Candidate rejected.");
            }
        }
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);

    let status = if accepted.len() == target {
        info!(attempts, "Sampling complete.");
        SamplingStatus::Succeeded
    } else {
        warn!(
            accepted = accepted.len(),
            target, attempts, "Attempt budget exhausted before reaching the target count."
        );
        reporter.message(format!(
            "Only {} of {} structures accepted after {} attempts",
            accepted.len(),
            target,
            attempts
        ));
        SamplingStatus::Exhausted
    };

    Ok(SamplingOutcome {
        accepted,
        attempts,
        status,
    })
}
