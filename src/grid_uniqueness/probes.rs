//! The two complementary probes driving the branch-and-bound search.
//!
//! The existence probe samples the corners of a hyperrectangle and succeeds
//! if one of them is a grid-code-zero point. The disqualification probe
//! proves that some module's image of the hyperrectangle stays clear of
//! every lattice-point disk, so the whole region can be rejected. A region
//! that passes neither probe gets split and both probes run again on the
//! halves.

use glam::DVec2;

use crate::grid_uniqueness::enumerate::{LatticePoints, RectangleVertices};
use crate::grid_uniqueness::geometry::PhaseModule;

/// Slack added to the readout radius by the existence probe.
///
/// The disqualification probe uses the exact radius. Without the slack,
/// floating point rounding could leave a vertex inside a lattice disk for
/// the disqualification probe yet outside it here, producing a region that
/// neither probe can decide and recursion that never bottoms out. With it,
/// any vertex the disqualification probe counts as in-disk is in-disk here
/// too.
const EXISTENCE_SLACK: f64 = 1e-9;

/// Check the vertices of a hyperrectangle for a grid-code-zero point.
///
/// Returns true as soon as some vertex projects within the readout radius of
/// a lattice point in every module; that vertex is left in `vertex_buffer`.
pub fn try_find_grid_code_zero(
    modules: &[PhaseModule],
    x0: &[f64],
    dims: &[f64],
    readout_resolution: f64,
    vertex_buffer: &mut [f64],
) -> bool {
    let r = readout_resolution / 2.0 + EXISTENCE_SLACK;
    let r_squared = r * r;

    let mut vertices = RectangleVertices::new(x0, dims);
    while vertices.next_vertex(vertex_buffer) {
        let mut vertex_disqualified = false;

        for module in modules {
            let point_on_plane = module.domain_to_plane.project(vertex_buffer);

            let lattice_points = LatticePoints::new(
                module.lattice_basis,
                module.inverse_lattice_basis,
                point_on_plane.x - r,
                point_on_plane.y - r,
                2.0 * r,
                2.0 * r,
            );

            let is_zero = lattice_points
                .into_iter()
                .any(|lattice_point| {
                    lattice_point.distance_squared(point_on_plane) <= r_squared
                });

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

/// Prove that a hyperrectangle cannot contain a grid-code-zero point.
///
/// For each module the 2^N vertices are projected to the phase plane and
/// their axis-aligned bounding box is taken. The image of the
/// hyperrectangle is a zonotope inside that box, so if no lattice disk of
/// the module touches the box, none touches the image either, and the
/// region is disqualified. The test is conservative: it may fail to reject
/// a rejectable region, but it never rejects one that contains a
/// grid-code-zero point.
///
/// Returns true on the first module that excludes every lattice disk.
pub fn try_prove_grid_code_zero_impossible(
    modules: &[PhaseModule],
    x0: &[f64],
    dims: &[f64],
    readout_resolution: f64,
    vertex_buffer: &mut [f64],
) -> bool {
    let mut vertices = RectangleVertices::new(x0, dims);

    for module in modules {
        let mut min = DVec2::splat(f64::MAX);
        let mut max = DVec2::splat(f64::MIN);
        vertices.restart();
        while vertices.next_vertex(vertex_buffer) {
            let phase = module.domain_to_plane.project(vertex_buffer);
            min = min.min(phase);
            max = max.max(phase);
        }

        let r = readout_resolution / 2.0;
        let r_squared = r * r;
        let lattice_points = LatticePoints::new(
            module.lattice_basis,
            module.inverse_lattice_basis,
            min.x - r,
            min.y - r,
            (max.x - min.x) + 2.0 * r,
            (max.y - min.y) + 2.0 * r,
        );

        let found_lattice_collision = lattice_points.into_iter().any(|lattice_point| {
            // Nearest point of the bounding box to this lattice point; the
            // disk overlaps the box iff that point is inside the disk.
            let nearest = lattice_point.clamp(min, max);
            lattice_point.distance_squared(nearest) < r_squared
        });

        if !found_lattice_collision {
            // This module never comes near grid code zero anywhere in the
            // queried region, so the region cannot contain one.
            return true;
        }
    }

    false
}
