//! Recursive branch-and-bound over hyperrectangles.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::grid_uniqueness::geometry::PhaseModule;
use crate::grid_uniqueness::probes::{
    try_find_grid_code_zero, try_prove_grid_code_zero_impossible,
};

/// Decide whether a hyperrectangle contains a grid-code-zero point.
///
/// Probes the region; if neither probe decides it, halves the widest axis
/// and recurses on both halves. `x0` and `dims` are mutated in place to
/// describe the current half and restored before returning, so the whole
/// recursion reuses the caller's two buffers plus `vertex_buffer` and never
/// allocates. On success the witness vertex is left in `vertex_buffer`.
///
/// `should_continue` is polled at every level; once it reads false the
/// search unwinds with "not found" regardless of what remains unexplored.
pub fn find_grid_code_zero_recursive(
    modules: &[PhaseModule],
    x0: &mut [f64],
    dims: &mut [f64],
    readout_resolution: f64,
    vertex_buffer: &mut [f64],
    should_continue: &AtomicBool,
) -> bool {
    if !should_continue.load(Ordering::Relaxed) {
        return false;
    }

    if try_find_grid_code_zero(modules, x0, dims, readout_resolution, vertex_buffer) {
        return true;
    }

    if try_prove_grid_code_zero_impossible(modules, x0, dims, readout_resolution, vertex_buffer)
    {
        return false;
    }

    let widest = widest_dim(dims);
    let full_width = dims[widest];
    let half_width = full_width / 2.0;

    dims[widest] = half_width;
    let mut found = find_grid_code_zero_recursive(
        modules,
        x0,
        dims,
        readout_resolution,
        vertex_buffer,
        should_continue,
    );

    if !found {
        let lower_edge = x0[widest];
        x0[widest] = lower_edge + half_width;
        found = find_grid_code_zero_recursive(
            modules,
            x0,
            dims,
            readout_resolution,
            vertex_buffer,
            should_continue,
        );
        x0[widest] = lower_edge;
    }

    dims[widest] = full_width;
    found
}

fn widest_dim(dims: &[f64]) -> usize {
    let mut widest = 0;
    for (i, &d) in dims.iter().enumerate() {
        if d > dims[widest] {
            widest = i;
        }
    }
    widest
}
