use super::cell::Cell;
use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ShapeError {
    #[error("{positions} positions but {elements} element identifiers")]
    ElementCount { positions: usize, elements: usize },
    #[error("{positions} positions but {forces} force vectors")]
    ForceCount { positions: usize, forces: usize },
    #[error("atom {atom} has a non-finite position")]
    NonFinitePosition { atom: usize },
    #[error("atom {atom} has a non-finite force")]
    NonFiniteForce { atom: usize },
    #[error("atom {atom} has an empty element identifier")]
    EmptyElement { atom: usize },
    #[error("configuration has no atoms")]
    Empty,
    #[error("energy is not finite ({0})")]
    NonFiniteEnergy(f64),
}

/// One snapshot of atom positions, optionally inside a periodic cell.
///
/// A configuration without a cell is treated as an isolated cluster and all
/// distances are plain Euclidean distances.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomicConfiguration {
    pub positions: Vec<Point3<f64>>,
    pub elements: Vec<String>,
    pub cell: Option<Cell>,
}

impl AtomicConfiguration {
    pub fn new(positions: Vec<Point3<f64>>, elements: Vec<String>, cell: Option<Cell>) -> Self {
        Self {
            positions,
            elements,
            cell,
        }
    }

    pub fn periodic(positions: Vec<Point3<f64>>, elements: Vec<String>, cell: Cell) -> Self {
        Self::new(positions, elements, Some(cell))
    }

    pub fn atom_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn is_periodic(&self) -> bool {
        self.cell.is_some()
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        if self.positions.len() != self.elements.len() {
            return Err(ShapeError::ElementCount {
                positions: self.positions.len(),
                elements: self.elements.len(),
            });
        }
        if let Some(atom) = self
            .positions
            .iter()
            .position(|p| p.iter().any(|v| !v.is_finite()))
        {
            return Err(ShapeError::NonFinitePosition { atom });
        }
        if let Some(atom) = self.elements.iter().position(|e| e.trim().is_empty()) {
            return Err(ShapeError::EmptyElement { atom });
        }
        Ok(())
    }
}

/// A configuration together with its simulated total energy and per-atom forces.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledConfiguration {
    pub configuration: AtomicConfiguration,
    pub energy: f64,
    pub forces: Vec<Vector3<f64>>,
}

impl LabeledConfiguration {
    pub fn new(configuration: AtomicConfiguration, energy: f64, forces: Vec<Vector3<f64>>) -> Self {
        Self {
            configuration,
            energy,
            forces,
        }
    }

    pub fn atom_count(&self) -> usize {
        self.configuration.atom_count()
    }

    /// Total energy divided by the number of atoms.
    ///
    /// Callers must run [`validate`](Self::validate) first; an empty frame has no
    /// per-atom energy.
    pub fn energy_per_atom(&self) -> f64 {
        self.energy / self.atom_count() as f64
    }

    /// Largest absolute force component over all atoms and all three axes.
    pub fn max_force_component(&self) -> f64 {
        self.forces
            .iter()
            .flat_map(|f| f.iter())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        self.configuration.validate()?;
        if self.configuration.is_empty() {
            return Err(ShapeError::Empty);
        }
        if self.forces.len() != self.atom_count() {
            return Err(ShapeError::ForceCount {
                positions: self.atom_count(),
                forces: self.forces.len(),
            });
        }
        if let Some(atom) = self
            .forces
            .iter()
            .position(|f| f.iter().any(|v| !v.is_finite()))
        {
            return Err(ShapeError::NonFiniteForce { atom });
        }
        if !self.energy.is_finite() {
            return Err(ShapeError::NonFiniteEnergy(self.energy));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn water() -> AtomicConfiguration {
        AtomicConfiguration::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.96, 0.0, 0.0),
                Point3::new(-0.24, 0.93, 0.0),
            ],
            vec!["O".into(), "H".into(), "H".into()],
            None,
        )
    }

    #[test]
    fn validate_accepts_consistent_configuration() {
        assert_eq!(water().validate(), Ok(()));
    }

    #[test]
    fn validate_reports_element_count_mismatch() {
        let mut config = water();
        config.elements.pop();
        assert_eq!(
            config.validate(),
            Err(ShapeError::ElementCount {
                positions: 3,
                elements: 2
            })
        );
    }

    #[test]
    fn validate_reports_non_finite_position() {
        let mut config = water();
        config.positions[2].y = f64::INFINITY;
        assert_eq!(
            config.validate(),
            Err(ShapeError::NonFinitePosition { atom: 2 })
        );
    }

    #[test]
    fn labeled_validate_reports_force_count_mismatch() {
        let frame = LabeledConfiguration::new(water(), -14.2, vec![Vector3::zeros(); 2]);
        assert_eq!(
            frame.validate(),
            Err(ShapeError::ForceCount {
                positions: 3,
                forces: 2
            })
        );
    }

    #[test]
    fn labeled_validate_rejects_empty_frame() {
        let empty = AtomicConfiguration::new(vec![], vec![], None);
        let frame = LabeledConfiguration::new(empty, 0.0, vec![]);
        assert_eq!(frame.validate(), Err(ShapeError::Empty));
    }

    #[test]
    fn labeled_validate_rejects_non_finite_energy() {
        let frame = LabeledConfiguration::new(water(), f64::INFINITY, vec![Vector3::zeros(); 3]);
        assert_eq!(
            frame.validate(),
            Err(ShapeError::NonFiniteEnergy(f64::INFINITY))
        );
        let nan = LabeledConfiguration::new(water(), f64::NAN, vec![Vector3::zeros(); 3]);
        assert!(matches!(nan.validate(), Err(ShapeError::NonFiniteEnergy(e)) if e.is_nan()));
    }

    #[test]
    fn max_force_component_uses_absolute_values() {
        let frame = LabeledConfiguration::new(
            water(),
            -14.2,
            vec![
                Vector3::new(1.0, -2.0, 0.5),
                Vector3::new(0.0, 0.0, -7.5),
                Vector3::new(3.0, 0.0, 0.0),
            ],
        );
        assert_eq!(frame.max_force_component(), 7.5);
    }

    #[test]
    fn energy_per_atom_divides_by_atom_count() {
        let frame = LabeledConfiguration::new(water(), -15.0, vec![Vector3::zeros(); 3]);
        assert_eq!(frame.energy_per_atom(), -5.0);
    }
}
