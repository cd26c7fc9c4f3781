use glam::{DMat2, DVec2};

use crate::error::GridCodeError;

/// A grid-cell module: a linear projection from the N-dimensional domain to
/// a plane, plus the 2D lattice read out on that plane.
///
/// The module's grid code is zero at a domain point whenever the projected
/// point falls within the readout disk around some lattice point.
#[derive(Debug, Clone)]
pub struct GridModule {
    /// Row-major 2×N domain-to-plane map.
    domain_to_plane: [Vec<f64>; 2],
    /// Columns are the two primitive lattice vectors.
    lattice_basis: DMat2,
}

impl GridModule {
    /// Build a module from the two rows of its domain-to-plane map and its
    /// two lattice basis vectors.
    ///
    /// Rejects empty or ragged rows with [`GridCodeError::InvalidShape`].
    /// Singularity of the lattice basis is checked later, when a search
    /// prepares its cached inverses.
    pub fn new(
        domain_to_plane: [Vec<f64>; 2],
        lattice_basis: [[f64; 2]; 2],
    ) -> Result<Self, GridCodeError> {
        let [row0, row1] = &domain_to_plane;
        if row0.is_empty() {
            return Err(GridCodeError::InvalidShape(
                "domain-to-plane map has zero columns".to_string(),
            ));
        }
        if row0.len() != row1.len() {
            return Err(GridCodeError::InvalidShape(format!(
                "domain-to-plane rows differ in length ({} vs {})",
                row0.len(),
                row1.len()
            )));
        }

        Ok(Self {
            domain_to_plane,
            lattice_basis: DMat2::from_cols(
                DVec2::from_array(lattice_basis[0]),
                DVec2::from_array(lattice_basis[1]),
            ),
        })
    }

    /// Number of domain dimensions this module projects from.
    #[inline]
    pub fn num_dims(&self) -> usize {
        self.domain_to_plane[0].len()
    }

    /// Project a domain point onto the module's plane.
    ///
    /// The two output coordinates are independent dot products over the two
    /// rows of the map. `point` must have length `num_dims()`.
    pub fn project(&self, point: &[f64]) -> [f64; 2] {
        self.project_vec(point).to_array()
    }

    #[inline]
    pub(crate) fn project_vec(&self, point: &[f64]) -> DVec2 {
        let mut out = DVec2::ZERO;
        for (col, &p) in self.domain_to_plane[0].iter().zip(point) {
            out.x += col * p;
        }
        for (col, &p) in self.domain_to_plane[1].iter().zip(point) {
            out.y += col * p;
        }
        out
    }

    /// The lattice basis; columns are the primitive lattice vectors.
    #[inline]
    pub(crate) fn lattice_basis(&self) -> DMat2 {
        self.lattice_basis
    }

    /// The two lattice basis vectors.
    #[inline]
    pub fn lattice_vectors(&self) -> [[f64; 2]; 2] {
        [
            self.lattice_basis.col(0).to_array(),
            self.lattice_basis.col(1).to_array(),
        ]
    }

    /// The two rows of the domain-to-plane map.
    #[inline]
    pub fn domain_to_plane(&self) -> &[Vec<f64>; 2] {
        &self.domain_to_plane
    }
}
