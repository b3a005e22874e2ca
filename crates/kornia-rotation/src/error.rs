use kornia_field::FieldError;

/// An error type for the rotation module.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RotationError {
    /// Error when a rotation axis has a near-zero norm.
    #[error("Cannot compute a rotation from a zero-norm axis")]
    InvalidAxis,

    /// Error when a rotation angle is NaN or infinite.
    #[error("Rotation angle must be finite, got {0}")]
    InvalidAngle(f64),

    /// Error when too few samples are available for a local fit.
    #[error("Local affine fit requires at least {required} samples, got {actual}")]
    InsufficientSamples {
        /// Minimum number of samples required by the fit.
        required: usize,
        /// Actual number of samples provided.
        actual: usize,
    },

    /// Error when the sample points are affinely dependent.
    #[error("Local affine fit is degenerate (singular value ratio {ratio:e})")]
    DegenerateFit {
        /// Smallest over largest singular value of the centered source points.
        ratio: f64,
    },

    /// Error when no voxel of the neighborhood lies inside the field.
    #[error("Neighborhood of radius {radius} around {point:?} is outside the field")]
    OutOfBounds {
        /// The physical query point.
        point: [f64; 3],
        /// The neighborhood radius in voxels.
        radius: usize,
    },

    /// Error when neither a displacement field nor a transform is given.
    #[error("At least one of a displacement field or a transform is required")]
    MissingInput,

    /// Error raised by the field library.
    #[error(transparent)]
    Field(#[from] FieldError),
}
