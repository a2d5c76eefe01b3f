//! Search for grid-code-zero points of a multi-module grid code.
//!
//! Each module projects the N-dimensional domain onto a 2D phase plane and
//! reads the result modulo a lattice. A domain point has *grid code zero*
//! when its phase in every module lies within half the readout resolution
//! of a lattice point; away from the origin, such a point is where the
//! combined code stops distinguishing locations. The search runs in two
//! layers:
//!
//! 1. **Branch and bound over hyperrectangles.** A cheap existence probe
//!    tests the corners of a region; a conservative disqualification probe
//!    bounds each module's image of the region and proves no lattice disk
//!    can touch it. Regions that pass neither test are split along their
//!    widest axis and both halves are retried.
//!
//! 2. **Hypercube expansion.** Starting from an ignored center region, a
//!    hypercube around the origin grows shell by shell; each shell is cut
//!    into per-axis slabs and dispatched to worker threads running the
//!    branch-and-bound search, until some slab yields a witness.
//!
//! The search is sound in both directions but has no termination guarantee:
//! lattice geometries admitting unbounded witness-free expansion will keep
//! the expansion running until the [`interrupt`] bridge fires.

pub mod enumerate;
pub mod error;
pub mod expansion;
pub mod geometry;
pub mod interrupt;
pub mod probes;
pub mod search;


pub use error::UniquenessError;
pub use geometry::{PhaseModule, PlaneProjection};

use std::sync::atomic::AtomicBool;

use search::find_grid_code_zero_recursive;

/// Validate the shared preconditions of both operations and return the
/// domain dimensionality.
fn validate_modules(
    modules: &[PhaseModule],
    readout_resolution: f64,
) -> Result<usize, UniquenessError> {
    let first = modules.first().ok_or_else(|| {
        UniquenessError::InvalidInput("at least one module is required".to_string())
    })?;

    let num_dims = first.num_dims();
    for (i, module) in modules.iter().enumerate() {
        if module.num_dims() != num_dims {
            return Err(UniquenessError::InvalidInput(format!(
                "module {} projects from {} dimensions, expected {}",
                i,
                module.num_dims(),
                num_dims
            )));
        }
    }

    // Vertex enumeration walks a 2^N bitmask in a machine integer.
    if num_dims >= u64::BITS as usize {
        return Err(UniquenessError::InvalidInput(format!(
            "unsupported number of dimensions: {}",
            num_dims
        )));
    }

    if !(readout_resolution > 0.0) {
        return Err(UniquenessError::InvalidInput(format!(
            "readout resolution must be positive, got {}",
            readout_resolution
        )));
    }

    Ok(num_dims)
}

/// Decide whether a hyperrectangle contains a grid-code-zero point.
///
/// The region is `[x0[i], x0[i] + dims[i]]` per axis. Runs synchronously on
/// the calling thread. When a witness exists, returns `Ok(true)` and writes
/// the witness into `point_with_grid_code_zero` if a buffer of length N was
/// supplied (a missing buffer just discards the witness).
///
/// N = 1 is accepted; the probes and the splitting rule degenerate to an
/// interval search.
///
/// # Errors
///
/// [`UniquenessError::InvalidInput`] when no module is given, the modules
/// disagree on N, `x0`/`dims` or a supplied witness buffer have the wrong
/// length, some `dims[i]` is not positive, the readout resolution is not
/// positive, or N is too large for vertex enumeration.
pub fn find_grid_code_zero(
    modules: &[PhaseModule],
    x0: &[f64],
    dims: &[f64],
    readout_resolution: f64,
    point_with_grid_code_zero: Option<&mut Vec<f64>>,
) -> Result<bool, UniquenessError> {
    let num_dims = validate_modules(modules, readout_resolution)?;

    if x0.len() != num_dims || dims.len() != num_dims {
        return Err(UniquenessError::InvalidInput(format!(
            "query has x0 of length {} and dims of length {}, expected {}",
            x0.len(),
            dims.len(),
            num_dims
        )));
    }
    if let Some(&d) = dims.iter().find(|&&d| !(d > 0.0)) {
        return Err(UniquenessError::InvalidInput(format!(
            "every dimension of the query must be positive, got {}",
            d
        )));
    }

    // The recursion mutates the region in place; give it private copies.
    let mut x0 = x0.to_vec();
    let mut dims = dims.to_vec();

    let mut default_buffer;
    let vertex_buffer = match point_with_grid_code_zero {
        Some(buffer) => {
            if buffer.len() != num_dims {
                return Err(UniquenessError::InvalidInput(format!(
                    "witness buffer has length {}, expected {}",
                    buffer.len(),
                    num_dims
                )));
            }
            buffer
        }
        None => {
            default_buffer = vec![0.0; num_dims];
            &mut default_buffer
        }
    };

    let should_continue = AtomicBool::new(true);
    Ok(find_grid_code_zero_recursive(
        modules,
        &mut x0,
        &mut dims,
        readout_resolution,
        vertex_buffer,
        &should_continue,
    ))
}

/// Find the largest origin-centered hypercube free of grid-code-zero points.
///
/// Expands a hypercube outward from `ignored_center_diameter` across as many
/// worker threads as the hardware offers, and returns once some shell slab
/// contains a grid-code-zero point: the result is the hypercube half-side
/// that witness pins, together with the witness itself. Progress is logged
/// through the [`log`] facade every few seconds.
///
/// The call blocks until a witness is found or [`interrupt::request_stop`]
/// fires; lattice geometries with no grid-code-zero point anywhere will
/// expand forever, so long-running callers should wire an interrupt source.
///
/// N = 1 is accepted; by antipodal symmetry only the positive half-axis is
/// expanded.
///
/// # Errors
///
/// [`UniquenessError::InvalidInput`] for the same malformed inputs as
/// [`find_grid_code_zero`], or a non-positive `ignored_center_diameter`.
/// [`UniquenessError::Interrupted`] when the interrupt bridge fired; the
/// flag is reset before returning and the search may be invoked again.
pub fn compute_grid_uniqueness_hypercube(
    modules: &[PhaseModule],
    readout_resolution: f64,
    ignored_center_diameter: f64,
) -> Result<(f64, Vec<f64>), UniquenessError> {
    validate_modules(modules, readout_resolution)?;

    if !(ignored_center_diameter > 0.0) {
        return Err(UniquenessError::InvalidInput(format!(
            "ignored center diameter must be positive, got {}",
            ignored_center_diameter
        )));
    }

    expansion::run(modules, readout_resolution, ignored_center_diameter)
}
