//! Joint-zero search for two-dimensional grid-cell modules over an
//! N-dimensional domain.
//!
//! A *module* projects the domain onto a plane and reads out a 2D lattice
//! there; its grid code is zero wherever the projection lands within a disk
//! of radius `readout_resolution / 2` around a lattice point. This crate
//! answers two questions about a set of such modules:
//!
//! - does an axis-aligned hyperrectangle contain a point whose grid code is
//!   zero in *every* module at once ([`find_grid_code_zero`]), and
//! - how far can an origin-centred hypercube grow before such a point
//!   appears, bounding the side of a grid-code-unique region
//!   ([`compute_grid_uniqueness_hypercube`]).
//!
//! Both are driven by a recursive branch-and-bound search with a pair of
//! complementary certificates; the hypercube computation fans the outward
//! expansion across worker threads.
//!
//! # Example
//!
//! ```
//! use grid_uniqueness::{find_grid_code_zero, GridModule};
//!
//! // One module: identity projection onto a unit square lattice.
//! let module = GridModule::new(
//!     [vec![1.0, 0.0], vec![0.0, 1.0]],
//!     [[1.0, 0.0], [0.0, 1.0]],
//! )?;
//!
//! // A small box around the origin contains the lattice zero at (0, 0).
//! let mut witness = vec![0.0; 2];
//! let found = find_grid_code_zero(
//!     &[module],
//!     &[-0.1, -0.1],
//!     &[0.2, 0.2],
//!     0.1,
//!     Some(&mut witness),
//! )?;
//! assert!(found);
//! assert!(witness.iter().all(|c| c.abs() <= 0.1));
//! # Ok::<(), grid_uniqueness::GridCodeError>(())
//! ```

pub mod bases;
mod error;
mod expansion;
mod types;

// Internal search machinery.
pub(crate) mod zero_search;

pub use error::GridCodeError;
pub use expansion::request_interrupt;
pub use types::GridModule;

use zero_search::SearchSpace;

/// Result of a uniqueness-hypercube computation.
#[derive(Debug, Clone)]
pub struct UniquenessOutput {
    /// Baseline half-side of the ring in which the tightest joint zero was
    /// found: an upper bound on the half-side of a grid-code-unique
    /// hypercube, accurate to the ring growth factor.
    pub upper_bound: f64,
    /// A domain point whose grid code is zero in every module.
    pub witness: Vec<f64>,
}

/// Configuration for [`compute_grid_uniqueness_hypercube_with`].
#[derive(Debug, Clone)]
pub struct ExpansionConfig {
    /// Diameter of the readout zero-disk; the disk radius is half this.
    pub readout_resolution: f64,
    /// Half-side of the central hypercube excluded from the search; also
    /// seeds the per-dimension expansion progress.
    pub ignored_center_diameter: f64,
    /// Worker thread count; defaults to the available parallelism. A single
    /// worker makes task order (and therefore the witness) deterministic.
    pub num_threads: Option<usize>,
}

/// Search one axis-aligned hyperrectangle `[x0, x0 + dims]` for a point with
/// grid code zero in every module.
///
/// On a true result, the witness point is written into `witness_out` when
/// provided (it must have length N). Module shapes are validated once at
/// entry; lattice basis inverses are computed once per call.
///
/// # Errors
///
/// [`GridCodeError::InvalidShape`] on empty module sets, mismatched
/// dimension counts or wrong buffer lengths;
/// [`GridCodeError::SingularMatrix`] when a lattice basis is not
/// invertible; [`GridCodeError::TooManyDimensions`] when N exceeds the
/// vertex enumerator's counter width.
pub fn find_grid_code_zero(
    modules: &[GridModule],
    x0: &[f64],
    dims: &[f64],
    readout_resolution: f64,
    witness_out: Option<&mut [f64]>,
) -> Result<bool, GridCodeError> {
    zero_search::find_grid_code_zero(modules, x0, dims, readout_resolution, witness_out)
}

/// Compute the smallest hypercube half-side at which the module set produces
/// a joint grid-code zero outside the ignored centre, with default settings.
///
/// Equivalent to [`compute_grid_uniqueness_hypercube_with`] using all
/// available parallelism.
///
/// # Errors
///
/// Shape and basis errors as for [`find_grid_code_zero`];
/// [`GridCodeError::Interrupted`] when [`request_interrupt`] is observed
/// during the run (the quit flag is cleared again before returning, so the
/// engine can be re-entered).
pub fn compute_grid_uniqueness_hypercube(
    modules: &[GridModule],
    readout_resolution: f64,
    ignored_center_diameter: f64,
) -> Result<UniquenessOutput, GridCodeError> {
    compute_grid_uniqueness_hypercube_with(
        modules,
        &ExpansionConfig {
            readout_resolution,
            ignored_center_diameter,
            num_threads: None,
        },
    )
}

/// Compute the uniqueness hypercube with explicit configuration.
pub fn compute_grid_uniqueness_hypercube_with(
    modules: &[GridModule],
    config: &ExpansionConfig,
) -> Result<UniquenessOutput, GridCodeError> {
    let space = SearchSpace::prepare(modules, config.readout_resolution)?;
    let num_threads = config.num_threads.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    expansion::run_expansion(&space, config.ignored_center_diameter, num_threads)
}
