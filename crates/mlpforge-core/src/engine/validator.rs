use super::error::EngineError;
use crate::core::models::configuration::AtomicConfiguration;
use crate::core::radii::RadiusTable;
use crate::core::utils::geometry::minimum_image_distance_matrix;
use std::fmt;
use tracing::trace;

/// The closest pair of atoms relative to their summed reference radii.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlapViolation {
    pub atom_a: usize,
    pub atom_b: usize,
    pub element_a: String,
    pub element_b: String,
    pub distance: f64,
    pub radius_a: f64,
    pub radius_b: f64,
    pub threshold_factor: f64,
}

impl OverlapViolation {
    pub fn limit(&self) -> f64 {
        self.threshold_factor * (self.radius_a + self.radius_b)
    }
}

impl fmt::Display for OverlapViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Atoms {} ({}) and {} ({}): distance {:.3} < {:.3} ({} × ({} + {}))",
            self.atom_a,
            self.element_a,
            self.atom_b,
            self.element_b,
            self.distance,
            self.limit(),
            self.threshold_factor,
            self.radius_a,
            self.radius_b
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Accepted,
    Rejected(OverlapViolation),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn reason(&self) -> String {
        match self {
            Self::Accepted => "OK".to_string(),
            Self::Rejected(violation) => violation.to_string(),
        }
    }
}

/// Accepts or rejects candidate structures by a radius-scaled minimum-distance test.
///
/// A pair `(a, b)` overlaps when its minimum-image distance is below
/// `threshold_factor × (r_a + r_b)`. The validator holds no mutable state and
/// can be shared across threads.
#[derive(Debug, Clone, Copy)]
pub struct StructureValidator<'a> {
    radii: &'a RadiusTable,
    threshold_factor: f64,
}

impl<'a> StructureValidator<'a> {
    pub fn new(radii: &'a RadiusTable, threshold_factor: f64) -> Result<Self, EngineError> {
        if !(threshold_factor.is_finite() && threshold_factor > 0.0) {
            return Err(super::config::ConfigError::OutOfRange {
                name: "threshold_factor",
                value: threshold_factor,
                constraint: "positive and finite",
            }
            .into());
        }
        Ok(Self {
            radii,
            threshold_factor,
        })
    }

    pub fn threshold_factor(&self) -> f64 {
        self.threshold_factor
    }

    pub fn validate(&self, configuration: &AtomicConfiguration) -> Result<Verdict, EngineError> {
        configuration.validate()?;

        let radii: Vec<f64> = configuration
            .elements
            .iter()
            .enumerate()
            .map(|(atom, element)| {
                self.radii
                    .radius(element)
                    .map_err(|_| EngineError::UnknownElement {
                        atom,
                        element: element.clone(),
                    })
            })
            .collect::<Result<_, _>>()?;

        let distances =
            minimum_image_distance_matrix(&configuration.positions, configuration.cell.as_ref());

        let n = configuration.atom_count();
        let mut worst: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            for j in (i + 1)..n {
                let ratio = distances[(i, j)] / (radii[i] + radii[j]);
                if worst.is_none_or(|(_, _, r)| ratio < r) {
                    worst = Some((i, j, ratio));
                }
            }
        }

        match worst {
            Some((i, j, ratio)) if ratio < self.threshold_factor => {
                let violation = OverlapViolation {
                    atom_a: i,
                    atom_b: j,
                    element_a: configuration.elements[i].clone(),
                    element_b: configuration.elements[j].clone(),
                    distance: distances[(i, j)],
                    radius_a: radii[i],
                    radius_b: radii[j],
                    threshold_factor: self.threshold_factor,
                };
                trace!(%violation, "Structure rejected.");
                Ok(Verdict::Rejected(violation))
            }
            _ => Ok(Verdict::Accepted),
        }
    }

    /// Tuple form of [`validate`](Self::validate): `(accepted, reason)`.
    pub fn is_acceptable(
        &self,
        configuration: &AtomicConfiguration,
    ) -> Result<(bool, String), EngineError> {
        let verdict = self.validate(configuration)?;
        Ok((verdict.is_accepted(), verdict.reason()))
    }
}
