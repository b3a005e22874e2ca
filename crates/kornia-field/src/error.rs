/// An error type for the field module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FieldError {
    /// Error when the grid geometry is not valid.
    #[error("Invalid grid geometry: {0}")]
    InvalidGeometry(String),

    /// Error when the data length does not match the grid size.
    #[error("Data length ({0}) does not match the number of voxels ({1})")]
    InvalidDataLength(usize, usize),

    /// Error when a matrix that must be inverted is singular.
    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// Error when a physical point maps outside the field extent.
    #[error("Point {0:?} is outside the field extent")]
    PointOutsideField([f64; 3]),
}
