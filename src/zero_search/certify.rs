//! The two complementary certificates that prune the branch-and-bound
//! search.
//!
//! The positive certificate examines only the corners of a hyperrectangle
//! and can declare "this box contains a joint zero". The negative
//! certificate examines a conservative bounding box of each module's
//! projection and can declare "no point of this box can be a zero". Boxes
//! where neither fires get subdivided by the caller.

use glam::DVec2;

use super::constants::VERTEX_RADIUS_EPSILON;
use super::lattice::LatticePointEnumerator;
use super::vertices::HyperrectVertices;
use super::SearchSpace;

/// Positive certificate: returns true iff some corner of the hyperrectangle
/// has grid code zero in every module. On success the qualifying corner is
/// left in `vertex_buffer`.
///
/// The disk radius is widened by [`VERTEX_RADIUS_EPSILON`] so that any
/// corner the negative certificate would count as overlapping is accepted
/// here; without the margin, floating-point disagreement between the two
/// certificates can leave a box that neither ever decides.
pub(crate) fn try_find_grid_code_zero(
    space: &SearchSpace<'_>,
    x0: &[f64],
    dims: &[f64],
    vertex_buffer: &mut [f64],
) -> bool {
    let r = space.readout_resolution / 2.0 + VERTEX_RADIUS_EPSILON;
    let r_squared = r * r;

    let mut vertices = HyperrectVertices::new(x0, dims);
    while vertices.next_into(vertex_buffer) {
        let mut vertex_disqualified = false;

        for (module, &inverse) in space.modules.iter().zip(&space.inverse_bases) {
            let on_plane = module.project_vec(vertex_buffer);

            let mut lattice_points = LatticePointEnumerator::new(
                module.lattice_basis(),
                inverse,
                on_plane.x - r,
                on_plane.y - r,
                2.0 * r,
                2.0 * r,
            );
            let is_zero =
                lattice_points.any(|p| p.distance_squared(on_plane) <= r_squared);

            if !is_zero {
                vertex_disqualified = true;
                break;
            }
        }

        if !vertex_disqualified {
            return true;
        }
    }

    false
}

/// Negative certificate: returns true iff some module's projection of the
/// entire hyperrectangle misses every lattice disk of radius
/// `readout_resolution / 2`.
///
/// The projected region is a zonotope; its axis-aligned bounding box is used
/// instead. The overestimate can only make this certificate fail to fire,
/// never fire wrongly.
pub(crate) fn try_prove_grid_code_zero_impossible(
    space: &SearchSpace<'_>,
    x0: &[f64],
    dims: &[f64],
    vertex_buffer: &mut [f64],
) -> bool {
    let r = space.readout_resolution / 2.0;
    let r_squared = r * r;

    let mut vertices = HyperrectVertices::new(x0, dims);
    for (module, &inverse) in space.modules.iter().zip(&space.inverse_bases) {
        let mut min = DVec2::splat(f64::MAX);
        let mut max = DVec2::splat(f64::MIN);
        vertices.restart();
        while vertices.next_into(vertex_buffer) {
            let phase = module.project_vec(vertex_buffer);
            min = min.min(phase);
            max = max.max(phase);
        }

        let mut lattice_points = LatticePointEnumerator::new(
            module.lattice_basis(),
            inverse,
            min.x - r,
            min.y - r,
            (max.x - min.x) + 2.0 * r,
            (max.y - min.y) + 2.0 * r,
        );
        let found_collision = lattice_points.any(|p| {
            // Nearest point of the bounding box to this lattice disk.
            let nearest = p.clamp(min, max);
            p.distance_squared(nearest) < r_squared
        });

        if !found_collision {
            // This module stays away from grid code zero everywhere in the
            // box, so the box cannot contain a joint zero.
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GridModule;

    const IDENTITY_BASIS: [[f64; 2]; 2] = [[1.0, 0.0], [0.0, 1.0]];

    fn identity_module() -> GridModule {
        GridModule::new([vec![1.0, 0.0], vec![0.0, 1.0]], IDENTITY_BASIS).unwrap()
    }

    fn space_for(modules: &[GridModule], readout_resolution: f64) -> SearchSpace<'_> {
        SearchSpace::prepare(modules, readout_resolution).unwrap()
    }

    #[test]
    fn positive_certificate_accepts_corner_on_lattice_point() {
        let modules = [identity_module()];
        let space = space_for(&modules, 0.1);
        let mut buffer = [0.0; 2];
        assert!(try_find_grid_code_zero(
            &space,
            &[1.0, 0.0],
            &[0.25, 0.25],
            &mut buffer
        ));
        assert_eq!(buffer, [1.0, 0.0]);
    }

    #[test]
    fn positive_certificate_accepts_distance_exactly_r() {
        // Corner at distance exactly readout_resolution / 2 from the origin
        // lattice point; the epsilon margin keeps the comparison inclusive.
        let modules = [identity_module()];
        let space = space_for(&modules, 0.1);
        let mut buffer = [0.0; 2];
        assert!(try_find_grid_code_zero(
            &space,
            &[0.05, 0.0],
            &[0.2, 0.2],
            &mut buffer
        ));
        assert_eq!(buffer, [0.05, 0.0]);
    }

    #[test]
    fn positive_certificate_ignores_interior_zeros() {
        // The box straddles the origin but no corner is near a lattice point.
        let modules = [identity_module()];
        let space = space_for(&modules, 0.1);
        let mut buffer = [0.0; 2];
        assert!(!try_find_grid_code_zero(
            &space,
            &[-0.25, -0.25],
            &[0.5, 0.5],
            &mut buffer
        ));
    }

    #[test]
    fn negative_certificate_proves_gap_between_disks() {
        let modules = [identity_module()];
        let space = space_for(&modules, 0.1);
        let mut buffer = [0.0; 2];
        assert!(try_prove_grid_code_zero_impossible(
            &space,
            &[0.3, 0.3],
            &[0.4, 0.4],
            &mut buffer
        ));
    }

    #[test]
    fn negative_certificate_refuses_box_touching_a_disk() {
        let modules = [identity_module()];
        let space = space_for(&modules, 0.1);
        let mut buffer = [0.0; 2];
        assert!(!try_prove_grid_code_zero_impossible(
            &space,
            &[-0.2, -0.2],
            &[0.4, 0.4],
            &mut buffer
        ));
    }

    #[test]
    fn negative_certificate_is_sound_under_dense_sampling() {
        // Wherever the negative certificate fires, dense sampling must find
        // no point whose projection lies within a readout disk.
        let modules = [identity_module()];
        let readout_resolution = 0.1;
        let space = space_for(&modules, readout_resolution);
        let r = readout_resolution / 2.0;
        let mut buffer = [0.0; 2];

        let boxes = [
            ([0.3, 0.3], [0.4, 0.4]),
            ([0.1, 0.55], [0.3, 0.3]),
            ([-0.45, 0.2], [0.2, 0.5]),
        ];
        for (x0, dims) in boxes {
            if !try_prove_grid_code_zero_impossible(&space, &x0, &dims, &mut buffer) {
                continue;
            }
            let steps = 50;
            for ix in 0..=steps {
                for iy in 0..=steps {
                    let point = [
                        x0[0] + dims[0] * ix as f64 / steps as f64,
                        x0[1] + dims[1] * iy as f64 / steps as f64,
                    ];
                    let phase = modules[0].project(&point);
                    let nearest = [phase[0].round(), phase[1].round()];
                    let dist_sq = (phase[0] - nearest[0]).powi(2)
                        + (phase[1] - nearest[1]).powi(2);
                    assert!(
                        dist_sq >= r * r,
                        "sampled zero at {:?} inside a proven-impossible box",
                        point
                    );
                }
            }
        }
    }

    #[test]
    fn epsilon_keeps_certificates_consistent() {
        // A corner the negative certificate counts as overlapping (strict
        // compare at radius r) must be accepted by the positive certificate
        // (non-strict compare at r + epsilon).
        let modules = [identity_module()];
        let space = space_for(&modules, 0.1);
        let mut buffer = [0.0; 2];

        // Corner just inside the disk boundary.
        let x0 = [0.05 - 1e-12, 0.0];
        let dims = [0.3, 0.3];
        assert!(!try_prove_grid_code_zero_impossible(&space, &x0, &dims, &mut buffer));
        assert!(try_find_grid_code_zero(&space, &x0, &dims, &mut buffer));
    }
}
