//! Module geometry: the linear maps that tie the N-dimensional domain to
//! each module's 2D phase plane.
//!
//! Each module is described by a 2×N projection onto its phase plane and a
//! 2×2 lattice basis whose columns span the module's firing lattice. The
//! basis inverse is precomputed once; both probes and the lattice-point
//! enumerator share it.

use glam::{DMat2, DVec2};

use crate::grid_uniqueness::error::UniquenessError;

/// A 2×N linear map from the domain onto a phase plane, stored column-wise.
#[derive(Clone, Debug)]
pub struct PlaneProjection {
    cols: Vec<DVec2>,
}

impl PlaneProjection {
    /// Build a projection from its two rows.
    ///
    /// Fails unless exactly two rows of equal, nonzero length are given.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, UniquenessError> {
        if rows.len() != 2 {
            return Err(UniquenessError::InvalidInput(format!(
                "domain-to-plane matrix must have two rows, got {}",
                rows.len()
            )));
        }
        if rows[0].len() != rows[1].len() {
            return Err(UniquenessError::InvalidInput(format!(
                "domain-to-plane rows differ in length: {} vs {}",
                rows[0].len(),
                rows[1].len()
            )));
        }
        if rows[0].is_empty() {
            return Err(UniquenessError::InvalidInput(
                "domain-to-plane matrix has no columns".to_string(),
            ));
        }

        let cols = rows[0]
            .iter()
            .zip(&rows[1])
            .map(|(&a, &b)| DVec2::new(a, b))
            .collect();
        Ok(Self { cols })
    }

    /// Number of domain dimensions this projection accepts.
    pub fn num_dims(&self) -> usize {
        self.cols.len()
    }

    /// Project a domain point onto the phase plane.
    ///
    /// `point` must have length `num_dims()`.
    #[inline]
    pub fn project(&self, point: &[f64]) -> DVec2 {
        debug_assert_eq!(point.len(), self.cols.len());
        let mut out = DVec2::ZERO;
        for (col, &x) in self.cols.iter().zip(point) {
            out += *col * x;
        }
        out
    }
}

/// Immutable geometry of one grid cell module.
#[derive(Clone, Debug)]
pub struct PhaseModule {
    pub(crate) domain_to_plane: PlaneProjection,
    pub(crate) lattice_basis: DMat2,
    pub(crate) inverse_lattice_basis: DMat2,
}

impl PhaseModule {
    /// Assemble a module from its projection and lattice basis.
    ///
    /// The basis columns are the lattice basis vectors on the phase plane.
    /// A singular basis is rejected; its inverse is computed here, once,
    /// rather than on every query.
    pub fn new(
        domain_to_plane: PlaneProjection,
        lattice_basis: DMat2,
    ) -> Result<Self, UniquenessError> {
        if lattice_basis.determinant() == 0.0 {
            return Err(UniquenessError::DegenerateLattice);
        }
        let inverse_lattice_basis = lattice_basis.inverse();
        Ok(Self {
            domain_to_plane,
            lattice_basis,
            inverse_lattice_basis,
        })
    }

    pub fn num_dims(&self) -> usize {
        self.domain_to_plane.num_dims()
    }
}
