use nalgebra::{Matrix3, Point3, Vector3};
use thiserror::Error;

const MIN_CELL_VOLUME: f64 = 1e-6;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Cell has zero or near-zero volume (determinant {determinant:.3e})")]
    DegenerateCell { determinant: f64 },
    #[error("Cell matrix is not invertible")]
    NotInvertible,
    #[error("Cell contains a non-finite component")]
    NonFinite,
}

/// A periodic simulation cell.
///
/// The rows of the matrix are the lattice vectors `a`, `b` and `c`, so a
/// fractional row vector `f` maps to Cartesian coordinates as `f · M`.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    matrix: Matrix3<f64>,
    inverse: Matrix3<f64>,
}

impl Cell {
    pub fn new(matrix: Matrix3<f64>) -> Result<Self, GeometryError> {
        if matrix.iter().any(|v| !v.is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        let determinant = matrix.determinant();
        if determinant.abs() < MIN_CELL_VOLUME {
            return Err(GeometryError::DegenerateCell { determinant });
        }
        let inverse = matrix.try_inverse().ok_or(GeometryError::NotInvertible)?;
        Ok(Self { matrix, inverse })
    }

    pub fn from_rows(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> Result<Self, GeometryError> {
        Self::new(Matrix3::new(
            a[0], a[1], a[2], //
            b[0], b[1], b[2], //
            c[0], c[1], c[2],
        ))
    }

    pub fn orthorhombic(a: f64, b: f64, c: f64) -> Result<Self, GeometryError> {
        Self::new(Matrix3::from_diagonal(&Vector3::new(a, b, c)))
    }

    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.matrix
    }

    pub fn lattice_vector(&self, axis: usize) -> Vector3<f64> {
        self.matrix.row(axis).transpose()
    }

    pub fn volume(&self) -> f64 {
        self.matrix.determinant().abs()
    }

    /// Distance between adjacent lattice planes along each axis, `V / |a_j × a_k|`.
    pub fn plane_spacings(&self) -> Vector3<f64> {
        let volume = self.volume();
        let a = self.lattice_vector(0);
        let b = self.lattice_vector(1);
        let c = self.lattice_vector(2);
        Vector3::new(
            volume / b.cross(&c).norm(),
            volume / c.cross(&a).norm(),
            volume / a.cross(&b).norm(),
        )
    }

    pub fn to_fractional(&self, cartesian: &Vector3<f64>) -> Vector3<f64> {
        self.inverse.transpose() * cartesian
    }

    pub fn to_cartesian(&self, fractional: &Vector3<f64>) -> Vector3<f64> {
        self.matrix.transpose() * fractional
    }

    pub fn wrap(&self, position: &Point3<f64>) -> Point3<f64> {
        let frac = self.to_fractional(&position.coords);
        let wrapped = frac.map(|f| f - f.floor());
        Point3::from(self.to_cartesian(&wrapped))
    }

    /// Returns the cell obtained by right-multiplying the lattice rows by `transform`.
    pub fn transformed(&self, transform: &Matrix3<f64>) -> Result<Self, GeometryError> {
        Self::new(self.matrix * transform)
    }

    /// Flattened row-major lattice, in the order used by the extended XYZ `Lattice` key.
    pub fn to_flat(&self) -> [f64; 9] {
        let m = &self.matrix;
        [
            m[(0, 0)],
            m[(0, 1)],
            m[(0, 2)],
            m[(1, 0)],
            m[(1, 1)],
            m[(1, 2)],
            m[(2, 0)],
            m[(2, 1)],
            m[(2, 2)],
        ]
    }

    pub fn from_flat(values: &[f64; 9]) -> Result<Self, GeometryError> {
        Self::new(Matrix3::from_row_slice(values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-10;

    #[test]
    fn new_rejects_degenerate_matrix() {
        let flat = Matrix3::new(1.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        assert!(matches!(
            Cell::new(flat),
            Err(GeometryError::DegenerateCell { .. })
        ));
    }

    #[test]
    fn new_rejects_non_finite_matrix() {
        let bad = Matrix3::new(f64::NAN, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
        assert_eq!(Cell::new(bad), Err(GeometryError::NonFinite));
    }

    #[test]
    fn fractional_round_trip_in_triclinic_cell() {
        let cell = Cell::from_rows([4.0, 0.0, 0.0], [1.5, 3.8, 0.0], [0.7, 0.9, 5.1]).unwrap();
        let cart = Vector3::new(1.23, -0.45, 2.2);
        let back = cell.to_cartesian(&cell.to_fractional(&cart));
        assert!((back - cart).norm() < EPS);
    }

    #[test]
    fn lattice_vector_maps_to_unit_fraction() {
        let cell = Cell::from_rows([4.0, 0.0, 0.0], [1.5, 3.8, 0.0], [0.7, 0.9, 5.1]).unwrap();
        let frac = cell.to_fractional(&cell.lattice_vector(1));
        assert!((frac - Vector3::new(0.0, 1.0, 0.0)).norm() < EPS);
    }

    #[test]
    fn plane_spacings_of_orthorhombic_cell_are_edge_lengths() {
        let cell = Cell::orthorhombic(3.0, 4.0, 5.0).unwrap();
        let h = cell.plane_spacings();
        assert!((h - Vector3::new(3.0, 4.0, 5.0)).norm() < EPS);
        assert!((cell.volume() - 60.0).abs() < EPS);
    }

    #[test]
    fn wrap_brings_position_into_cell() {
        let cell = Cell::orthorhombic(10.0, 10.0, 10.0).unwrap();
        let wrapped = cell.wrap(&Point3::new(-1.0, 12.5, 3.0));
        assert!((wrapped - Point3::new(9.0, 2.5, 3.0)).norm() < EPS);
    }

    #[test]
    fn flat_round_trip_preserves_row_order() {
        let cell = Cell::from_rows([4.0, 0.1, 0.2], [1.5, 3.8, 0.3], [0.7, 0.9, 5.1]).unwrap();
        let flat = cell.to_flat();
        assert_eq!(flat[1], 0.1);
        assert_eq!(flat[3], 1.5);
        assert_eq!(Cell::from_flat(&flat).unwrap(), cell);
    }

    #[test]
    fn transformed_applies_strain_to_rows() {
        let cell = Cell::orthorhombic(2.0, 2.0, 2.0).unwrap();
        let strain = Matrix3::from_diagonal(&Vector3::new(1.1, 1.0, 0.9));
        let strained = cell.transformed(&strain).unwrap();
        assert!((strained.lattice_vector(0) - Vector3::new(2.2, 0.0, 0.0)).norm() < EPS);
        assert!((strained.lattice_vector(2) - Vector3::new(0.0, 0.0, 1.8)).norm() < EPS);
    }
}
