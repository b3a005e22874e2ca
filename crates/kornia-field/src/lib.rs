#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Error types for the field module.
pub mod error;

/// Dense displacement fields sampled on a reference grid.
pub mod field;

/// Regular lattice geometry in physical space.
pub mod grid;

/// Small fixed-size 3x3 matrix helpers.
pub mod mat3;

/// Spatial transforms with a Jacobian-at-point query.
pub mod transform;

pub use error::FieldError;
pub use field::DisplacementField;
pub use grid::ReferenceGrid;
pub use transform::{AffineTransform, DisplacementFieldTransform, RigidTransform, Transform3d};
