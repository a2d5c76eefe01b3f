//! Geometric analysis of multi-module grid codes.
//!
//! A population of grid cell modules assigns each point of an N-dimensional
//! space a set of 2D phases, one per module. This crate answers the question
//! of how far that combined code stays unique: it searches for points whose
//! phase in every module returns to the origin of the module's lattice, up
//! to a readout resolution.
//!
//! The two operations are [`find_grid_code_zero`], which decides a single
//! hyperrectangle, and [`compute_grid_uniqueness_hypercube`], which expands
//! a hypercube outward from the origin across worker threads until a
//! grid-code-zero point is found just outside it.

pub mod grid_uniqueness;

pub use grid_uniqueness::{
    compute_grid_uniqueness_hypercube, find_grid_code_zero, interrupt, PhaseModule,
    PlaneProjection, UniquenessError,
};
