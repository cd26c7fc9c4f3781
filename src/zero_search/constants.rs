//! Shared constants for the grid-code zero search.

/// Safety margin added to the positive certificate's disk radius.
///
/// The negative certificate tests lattice disks of radius exactly
/// `readout_resolution / 2`. Widening the positive test by this margin
/// guarantees that any vertex the negative certificate counts as
/// zero-overlapping is also accepted here, so subdivision always bottoms
/// out in one of the two certificates.
pub(crate) const VERTEX_RADIUS_EPSILON: f64 = 1e-9;

/// Determinant magnitude below which a lattice basis is rejected as singular.
pub(crate) const SINGULAR_DET_TOL: f64 = 1e-12;

/// Highest supported domain dimension: the vertex enumerator counts corners
/// in a `u64`, and `1 << num_dims` must not overflow it.
pub(crate) const MAX_DIMS: usize = u64::BITS as usize - 1;
