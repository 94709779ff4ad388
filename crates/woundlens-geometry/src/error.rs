/// An error type for the geometry module.
///
/// Both variants describing numerical degeneracy are recoverable by picking
/// the correspondence points again.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The correspondences do not define a unique homography.
    #[error("Cannot solve homography; degenerate point configuration")]
    DegenerateConfiguration,

    /// The matrix has no inverse.
    #[error("Matrix is singular (determinant {0:e})")]
    SingularMatrix(f64),

    /// A homography needs exactly four correspondences per side.
    #[error("Expected {expected} correspondence points, got {actual}")]
    InvalidCorrespondenceCount {
        /// Number of points required.
        expected: usize,
        /// Number of points provided.
        actual: usize,
    },
}
