use super::config::{DisplacementStyle, PerturbationConfig};
use super::error::EngineError;
use crate::core::models::configuration::AtomicConfiguration;
use nalgebra::{Matrix3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal, UnitBall, UnitSphere};

/// Produces one randomly perturbed candidate from a base structure.
pub trait Perturber {
    fn perturb(
        &mut self,
        base: &AtomicConfiguration,
        config: &PerturbationConfig,
    ) -> Result<AtomicConfiguration, EngineError>;
}

/// Cell strain plus per-atom displacement, drawn from `R`.
///
/// The cell is deformed by a symmetric strain matrix whose six independent
/// components are uniform in `[-f, f]` (diagonal `1 + e_i`, off-diagonal
/// `e / 2`), and the atoms follow the cell affinely. Every atom is then
/// displaced according to [`DisplacementStyle`]. Non-periodic frames skip the
/// strain step.
#[derive(Debug, Clone)]
pub struct RandomPerturber<R: Rng> {
    rng: R,
}

impl RandomPerturber<StdRng> {
    /// Reproducible generator: the same seed yields the same candidate sequence.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Non-reproducible generator seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomPerturber<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn strain_matrix(&mut self, fraction: f64) -> Matrix3<f64> {
        if fraction == 0.0 {
            return Matrix3::identity();
        }
        let mut e = [0.0; 6];
        for component in e.iter_mut() {
            *component = self.rng.gen_range(-fraction..=fraction);
        }
        Matrix3::new(
            1.0 + e[0],
            0.5 * e[5],
            0.5 * e[4],
            0.5 * e[5],
            1.0 + e[1],
            0.5 * e[3],
            0.5 * e[4],
            0.5 * e[3],
            1.0 + e[2],
        )
    }

    fn displacement(
        &mut self,
        distance: f64,
        style: DisplacementStyle,
        normal: Option<&Normal<f64>>,
    ) -> Vector3<f64> {
        if distance == 0.0 {
            return Vector3::zeros();
        }
        match (style, normal) {
            (DisplacementStyle::Normal, Some(normal)) => Vector3::new(
                normal.sample(&mut self.rng),
                normal.sample(&mut self.rng),
                normal.sample(&mut self.rng),
            ),
            (DisplacementStyle::Normal, None) => Vector3::zeros(),
            (DisplacementStyle::Uniform, _) => {
                let [x, y, z]: [f64; 3] = UnitBall.sample(&mut self.rng);
                Vector3::new(x, y, z) * distance
            }
            (DisplacementStyle::Const, _) => {
                let [x, y, z]: [f64; 3] = UnitSphere.sample(&mut self.rng);
                Vector3::new(x, y, z) * distance
            }
        }
    }
}

impl<R: Rng> Perturber for RandomPerturber<R> {
    fn perturb(
        &mut self,
        base: &AtomicConfiguration,
        config: &PerturbationConfig,
    ) -> Result<AtomicConfiguration, EngineError> {
        config.validate()?;

        let mut candidate = base.clone();

        if let Some(cell) = &base.cell {
            let strain = self.strain_matrix(config.cell_pert_fraction);
            candidate.cell = Some(cell.transformed(&strain)?);
            let column_strain = strain.transpose();
            for position in candidate.positions.iter_mut() {
                position.coords = column_strain * position.coords;
            }
        }

        let distance = config.atom_pert_distance;
        let normal = match config.atom_pert_style {
            DisplacementStyle::Normal if distance > 0.0 => Some(
                Normal::new(0.0, distance / 3.0_f64.sqrt())
                    .map_err(|e| EngineError::Internal(format!("normal distribution: {e}")))?,
            ),
            _ => None,
        };
        for position in candidate.positions.iter_mut() {
            *position += self.displacement(distance, config.atom_pert_style, normal.as_ref());
        }

        Ok(candidate)
    }
}
