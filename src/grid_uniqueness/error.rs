//! Error types for the grid uniqueness search.

#[derive(Debug, thiserror::Error)]
pub enum UniquenessError {
    /// The module geometry or query is malformed (wrong matrix shape,
    /// mismatched dimensionality, non-positive extent, oversized N).
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// A lattice basis with determinant zero cannot be inverted.
    #[error("Lattice basis is singular (determinant is zero)")]
    DegenerateLattice,
    /// The external interrupt flag fired during a uniqueness search. The
    /// flag has been reset; the caller may invoke the search again.
    #[error("Caught interrupt signal")]
    Interrupted,
}
