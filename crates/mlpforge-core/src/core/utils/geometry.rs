use crate::core::models::cell::Cell;
use nalgebra::{DMatrix, Point3, Vector3};

const SEARCH_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairDistance {
    pub i: usize,
    pub j: usize,
    pub distance: f64,
}

/// Shortest vector from `from` to any periodic image of `to`.
///
/// The fractional difference is first wrapped into `[-0.5, 0.5]`. The length
/// `r0` of that candidate bounds the answer, and any image no longer than `r0`
/// has a fractional component along axis `i` of at most `r0 / h_i`, where `h_i`
/// is the interplanar spacing. Enumerating every integer shift inside those
/// bounds therefore finds the true minimum image for any non-degenerate cell,
/// including strongly skewed ones where the 26 neighbor replicas are not enough.
pub fn minimum_image_vector(
    from: &Point3<f64>,
    to: &Point3<f64>,
    cell: Option<&Cell>,
) -> Vector3<f64> {
    let delta = to - from;
    match cell {
        None => delta,
        Some(cell) => periodic_minimum_image(&delta, cell, &cell.plane_spacings()),
    }
}

pub fn minimum_image_distance(from: &Point3<f64>, to: &Point3<f64>, cell: Option<&Cell>) -> f64 {
    minimum_image_vector(from, to, cell).norm()
}

fn periodic_minimum_image(delta: &Vector3<f64>, cell: &Cell, spacings: &Vector3<f64>) -> Vector3<f64> {
    let frac = cell.to_fractional(delta);
    let wrapped = frac.map(|f| f - f.round());
    let first_guess = cell.to_cartesian(&wrapped);
    let r0 = first_guess.norm();

    let range = |axis: usize| {
        let bound = r0 / spacings[axis] + SEARCH_TOLERANCE;
        let lo = (-bound - wrapped[axis]).ceil() as i64;
        let hi = (bound - wrapped[axis]).floor() as i64;
        lo..=hi
    };

    let mut best = first_guess;
    let mut best_sq = first_guess.norm_squared();
    for na in range(0) {
        for nb in range(1) {
            for nc in range(2) {
                if na == 0 && nb == 0 && nc == 0 {
                    continue;
                }
                let shift = Vector3::new(na as f64, nb as f64, nc as f64);
                let candidate = cell.to_cartesian(&(wrapped + shift));
                let candidate_sq = candidate.norm_squared();
                if candidate_sq < best_sq {
                    best = candidate;
                    best_sq = candidate_sq;
                }
            }
        }
    }
    best
}

/// Symmetric matrix of pairwise minimum-image distances.
///
/// The diagonal holds `+inf` so that minimum reductions never pick a
/// self-distance.
pub fn minimum_image_distance_matrix(positions: &[Point3<f64>], cell: Option<&Cell>) -> DMatrix<f64> {
    let n = positions.len();
    let mut distances = DMatrix::from_element(n, n, f64::INFINITY);
    let spacings = cell.map(Cell::plane_spacings);

    for i in 0..n {
        for j in (i + 1)..n {
            let delta = positions[j] - positions[i];
            let d = match (cell, &spacings) {
                (Some(cell), Some(h)) => periodic_minimum_image(&delta, cell, h).norm(),
                _ => delta.norm(),
            };
            distances[(i, j)] = d;
            distances[(j, i)] = d;
        }
    }
    distances
}

/// Closest pair in a distance matrix, or `None` when it has fewer than two atoms.
pub fn closest_pair(distances: &DMatrix<f64>) -> Option<PairDistance> {
    let n = distances.nrows();
    let mut best: Option<PairDistance> = None;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = distances[(i, j)];
            if best.is_none_or(|b| d < b.distance) {
                best = Some(PairDistance { i, j, distance: d });
            }
        }
    }
    best
}

pub fn minimum_distance(positions: &[Point3<f64>], cell: Option<&Cell>) -> Option<PairDistance> {
    closest_pair(&minimum_image_distance_matrix(positions, cell))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn brute_force_distance(a: &Point3<f64>, b: &Point3<f64>, cell: &Cell, reach: i64) -> f64 {
        let mut best = f64::INFINITY;
        for na in -reach..=reach {
            for nb in -reach..=reach {
                for nc in -reach..=reach {
                    let shift = cell.to_cartesian(&Vector3::new(na as f64, nb as f64, nc as f64));
                    best = best.min((b - a + shift).norm());
                }
            }
        }
        best
    }

    #[test]
    fn large_orthogonal_cell_matches_euclidean_for_close_atoms() {
        let cell = Cell::orthorhombic(20.0, 22.0, 25.0).unwrap();
        let positions = [
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(3.5, 2.0, 0.5),
            Point3::new(5.0, 6.0, 4.0),
        ];
        let matrix = minimum_image_distance_matrix(&positions, Some(&cell));
        for i in 0..3 {
            for j in 0..3 {
                if i == j {
                    continue;
                }
                let euclid = (positions[j] - positions[i]).norm();
                assert!(euclid < 10.0);
                assert!((matrix[(i, j)] - euclid).abs() < EPS);
            }
        }
    }

    #[test]
    fn atoms_across_boundary_use_wrapped_distance() {
        let cell = Cell::orthorhombic(10.0, 10.0, 10.0).unwrap();
        let d = minimum_image_distance(
            &Point3::new(0.2, 5.0, 5.0),
            &Point3::new(9.9, 5.0, 5.0),
            Some(&cell),
        );
        assert!((d - 0.3).abs() < EPS);
    }

    #[test]
    fn skewed_cell_matches_brute_force_enumeration() {
        let cell = Cell::from_rows([5.0, 0.0, 0.0], [4.6, 1.2, 0.0], [4.4, 0.9, 1.1]).unwrap();
        let points = [
            Point3::new(0.1, 0.2, 0.3),
            Point3::new(4.9, 1.0, 0.9),
            Point3::new(2.5, 0.4, 0.1),
            Point3::new(8.3, 2.1, 1.0),
            Point3::new(-3.0, 0.7, 0.55),
        ];
        for a in &points {
            for b in &points {
                let fast = minimum_image_distance(a, b, Some(&cell));
                let slow = brute_force_distance(a, b, &cell, 8);
                assert!(
                    (fast - slow).abs() < EPS,
                    "fast {fast} vs brute force {slow} for {a:?} -> {b:?}"
                );
            }
        }
    }

    #[test]
    fn skewed_cell_needs_more_than_naive_wrapping() {
        let cell = Cell::from_rows([5.0, 0.0, 0.0], [4.6, 1.2, 0.0], [0.0, 0.0, 6.0]).unwrap();
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(4.8, 1.1, 0.0);
        let frac = cell.to_fractional(&(b - a));
        let naive = cell.to_cartesian(&frac.map(|f| f - f.round())).norm();
        let exact = minimum_image_distance(&a, &b, Some(&cell));
        let slow = brute_force_distance(&a, &b, &cell, 8);
        assert!((exact - slow).abs() < EPS);
        assert!(exact <= naive + EPS);
    }

    #[test]
    fn distance_matrix_is_symmetric_with_infinite_diagonal() {
        let cell = Cell::from_rows([4.0, 0.0, 0.0], [1.0, 4.0, 0.0], [0.5, 0.5, 4.0]).unwrap();
        let positions = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(3.9, 3.9, 3.9),
        ];
        let m = minimum_image_distance_matrix(&positions, Some(&cell));
        for i in 0..3 {
            assert!(m[(i, i)].is_infinite());
            for j in 0..3 {
                assert_eq!(m[(i, j)], m[(j, i)]);
            }
        }
    }

    #[test]
    fn minimum_distance_ignores_self_distance() {
        let positions = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.5, 0.0, 0.0)];
        let pair = minimum_distance(&positions, None).unwrap();
        assert_eq!((pair.i, pair.j), (0, 1));
        assert!((pair.distance - 1.5).abs() < EPS);
    }

    #[test]
    fn minimum_distance_is_none_for_single_atom() {
        let cell = Cell::orthorhombic(3.0, 3.0, 3.0).unwrap();
        assert!(minimum_distance(&[Point3::origin()], Some(&cell)).is_none());
    }

    #[test]
    fn non_periodic_distance_is_plain_euclidean() {
        let d = minimum_image_distance(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(30.0, 40.0, 0.0),
            None,
        );
        assert!((d - 50.0).abs() < EPS);
    }
}
