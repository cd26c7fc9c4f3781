//! Recursive branch-and-bound search for joint grid-code zeros inside an
//! axis-aligned hyperrectangle.
//!
//! A box is decided by one of two certificates ([`certify`]): a positive one
//! that inspects corners and a negative one that inspects a conservative
//! bounding box of each module's projection. Undecided boxes are split in
//! half along their widest dimension. Cancellation is cooperative: an atomic
//! flag checked at the top of every frame, never a blocking call.

pub(crate) mod certify;
pub(crate) mod constants;
pub(crate) mod lattice;
pub(crate) mod vertices;

use std::sync::atomic::{AtomicBool, Ordering};

use glam::DMat2;

use crate::error::GridCodeError;
use crate::types::GridModule;
use certify::{try_find_grid_code_zero, try_prove_grid_code_zero_impossible};
use constants::{MAX_DIMS, SINGULAR_DET_TOL};

/// Closed-form 2×2 inverse, rejecting near-singular bases.
pub(crate) fn invert_lattice_basis(basis: DMat2) -> Result<DMat2, GridCodeError> {
    let det = basis.determinant();
    if det.abs() < SINGULAR_DET_TOL {
        return Err(GridCodeError::SingularMatrix(det));
    }
    Ok(basis.inverse())
}

/// A module set validated and prepared for searching: shapes checked once,
/// lattice basis inverses cached once per top-level call.
///
/// Everything in here is read-only during the search and safe to share
/// across worker threads without synchronization.
pub(crate) struct SearchSpace<'a> {
    pub(crate) modules: &'a [GridModule],
    pub(crate) inverse_bases: Vec<DMat2>,
    pub(crate) num_dims: usize,
    pub(crate) readout_resolution: f64,
}

impl<'a> SearchSpace<'a> {
    pub(crate) fn prepare(
        modules: &'a [GridModule],
        readout_resolution: f64,
    ) -> Result<Self, GridCodeError> {
        let first = modules.first().ok_or_else(|| {
            GridCodeError::InvalidShape("module set is empty".to_string())
        })?;
        let num_dims = first.num_dims();
        if num_dims > MAX_DIMS {
            return Err(GridCodeError::TooManyDimensions(num_dims));
        }
        for (i, module) in modules.iter().enumerate() {
            if module.num_dims() != num_dims {
                return Err(GridCodeError::InvalidShape(format!(
                    "module {} projects from {} dimensions, expected {}",
                    i,
                    module.num_dims(),
                    num_dims
                )));
            }
        }

        let inverse_bases = modules
            .iter()
            .map(|module| invert_lattice_basis(module.lattice_basis()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            modules,
            inverse_bases,
            num_dims,
            readout_resolution,
        })
    }
}

#[inline]
fn widest_dim(dims: &[f64]) -> usize {
    let mut widest = 0;
    for (i, &d) in dims.iter().enumerate().skip(1) {
        if d > dims[widest] {
            widest = i;
        }
    }
    widest
}

/// Recursive core. Mutates `x0` and `dims` in place while descending and
/// restores both scalars on every return path; on a true result the witness
/// corner is left in `vertex_buffer`.
pub(crate) fn find_zero_in(
    space: &SearchSpace<'_>,
    x0: &mut [f64],
    dims: &mut [f64],
    vertex_buffer: &mut [f64],
    should_continue: &AtomicBool,
) -> bool {
    if !should_continue.load(Ordering::Relaxed) {
        return false;
    }

    if try_find_grid_code_zero(space, x0, dims, vertex_buffer) {
        return true;
    }

    if try_prove_grid_code_zero_impossible(space, x0, dims, vertex_buffer) {
        return false;
    }

    let widest = widest_dim(dims);
    let saved_dim = dims[widest];
    dims[widest] = saved_dim / 2.0;

    let mut found = find_zero_in(space, x0, dims, vertex_buffer, should_continue);
    if !found {
        let saved_x0 = x0[widest];
        x0[widest] = saved_x0 + dims[widest];
        found = find_zero_in(space, x0, dims, vertex_buffer, should_continue);
        x0[widest] = saved_x0;
    }

    dims[widest] = saved_dim;
    found
}

/// Single-box entry point; see [`crate::find_grid_code_zero`] for the
/// public contract.
pub(crate) fn find_grid_code_zero(
    modules: &[GridModule],
    x0: &[f64],
    dims: &[f64],
    readout_resolution: f64,
    witness_out: Option<&mut [f64]>,
) -> Result<bool, GridCodeError> {
    let space = SearchSpace::prepare(modules, readout_resolution)?;

    if x0.len() != space.num_dims || dims.len() != space.num_dims {
        return Err(GridCodeError::InvalidShape(format!(
            "query box has {}/{} coordinates, expected {}",
            x0.len(),
            dims.len(),
            space.num_dims
        )));
    }

    let mut default_buffer;
    let vertex_buffer: &mut [f64] = match witness_out {
        Some(buffer) => {
            if buffer.len() != space.num_dims {
                return Err(GridCodeError::InvalidShape(format!(
                    "witness buffer has length {}, expected {}",
                    buffer.len(),
                    space.num_dims
                )));
            }
            buffer
        }
        None => {
            default_buffer = vec![0.0; space.num_dims];
            &mut default_buffer
        }
    };

    // Unshared copies the recursion can mutate in place.
    let mut x0 = x0.to_vec();
    let mut dims = dims.to_vec();
    let should_continue = AtomicBool::new(true);

    Ok(find_zero_in(
        &space,
        &mut x0,
        &mut dims,
        vertex_buffer,
        &should_continue,
    ))
}
