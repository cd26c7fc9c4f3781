//! Lazy enumeration of lattice points inside an axis-aligned rectangle.

use glam::{DMat2, DVec2};

/// Enumerates all points `B·(i, j)` with integer `i, j` that fall inside a
/// given rectangle in the plane.
///
/// The rectangle's corners are mapped through the inverse basis to get an
/// integer bounding box in lattice coordinates; that box is generally a
/// superset, so each candidate is mapped back and filtered against the
/// original rectangle. Containment is closed: points exactly on the
/// rectangle boundary are emitted.
///
/// The integer counters are kept as exact `f64`s so the enumerator stays
/// valid for rectangles far from the origin.
pub(crate) struct LatticePointEnumerator {
    basis: DMat2,
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    i_min: f64,
    i_max: f64,
    j_min: f64,
    j_max: f64,
    i: f64,
    j: f64,
}

impl LatticePointEnumerator {
    pub(crate) fn new(
        basis: DMat2,
        inverse_basis: DMat2,
        x0: f64,
        y0: f64,
        width: f64,
        height: f64,
    ) -> Self {
        let (x1, y1) = (x0 + width, y0 + height);

        // Bounding box of the rectangle in the lattice's basis.
        let mut min = DVec2::splat(f64::MAX);
        let mut max = DVec2::splat(f64::MIN);
        for corner in [
            DVec2::new(x0, y0),
            DVec2::new(x1, y0),
            DVec2::new(x0, y1),
            DVec2::new(x1, y1),
        ] {
            let q = inverse_basis * corner;
            min = min.min(q);
            max = max.max(q);
        }

        let (i_min, i_max) = (min.x.ceil(), max.x.floor());
        let (j_min, j_max) = (min.y.ceil(), max.y.floor());

        Self {
            basis,
            x0,
            y0,
            x1,
            y1,
            i_min,
            i_max,
            j_min,
            j_max,
            i: i_min,
            j: j_min,
        }
    }

    /// Rewind to the first lattice point; a restarted enumerator reproduces
    /// the same sequence.
    pub(crate) fn restart(&mut self) {
        self.i = self.i_min;
        self.j = self.j_min;
    }
}

impl Iterator for LatticePointEnumerator {
    type Item = DVec2;

    fn next(&mut self) -> Option<DVec2> {
        while self.i <= self.i_max {
            while self.j <= self.j_max {
                let p = self.basis * DVec2::new(self.i, self.j);
                self.j += 1.0;
                if p.x >= self.x0 && p.x <= self.x1 && p.y >= self.y0 && p.y <= self.y1 {
                    return Some(p);
                }
            }
            self.j = self.j_min;
            self.i += 1.0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zero_search::invert_lattice_basis;

    fn enumerate(basis: DMat2, rect: (f64, f64, f64, f64)) -> Vec<DVec2> {
        let inverse = invert_lattice_basis(basis).unwrap();
        LatticePointEnumerator::new(basis, inverse, rect.0, rect.1, rect.2, rect.3).collect()
    }

    #[test]
    fn unit_square_includes_boundary_points() {
        let points = enumerate(DMat2::IDENTITY, (0.0, 0.0, 1.0, 1.0));
        assert_eq!(points.len(), 4);
        for expected in [
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
        ] {
            assert!(points.contains(&expected), "missing {:?}", expected);
        }
    }

    #[test]
    fn rectangle_between_lattice_points_is_empty() {
        let points = enumerate(DMat2::IDENTITY, (0.2, 0.2, 0.5, 0.5));
        assert!(points.is_empty());
    }

    #[test]
    fn skewed_basis_filters_bounding_box_overshoot() {
        // Basis vectors (1, 0) and (0.5, 1): lattice points are (i + j/2, j).
        let basis = DMat2::from_cols(DVec2::new(1.0, 0.0), DVec2::new(0.5, 1.0));
        let points = enumerate(basis, (0.0, 0.0, 1.0, 1.0));
        assert_eq!(points.len(), 3);
        assert!(points.contains(&DVec2::new(0.5, 1.0)));
        for p in &points {
            assert!(p.x >= 0.0 && p.x <= 1.0 && p.y >= 0.0 && p.y <= 1.0);
        }
    }

    #[test]
    fn far_from_origin_stays_exact() {
        let points = enumerate(DMat2::IDENTITY, (1e9, 1e9, 2.0, 2.0));
        assert_eq!(points.len(), 9);
    }

    #[test]
    fn restart_reproduces_sequence() {
        let basis = DMat2::from_cols(DVec2::new(1.0, 0.2), DVec2::new(-0.3, 1.1));
        let inverse = invert_lattice_basis(basis).unwrap();
        let mut enumerator =
            LatticePointEnumerator::new(basis, inverse, -2.0, -2.0, 4.0, 4.0);
        let first: Vec<DVec2> = enumerator.by_ref().collect();
        enumerator.restart();
        let second: Vec<DVec2> = enumerator.collect();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
