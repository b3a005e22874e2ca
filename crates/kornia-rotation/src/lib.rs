#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Kornia Rotation
//!
//! Recover the local rotation implied by a spatial transform at a point.
//!
//! - [`axis_angle`] — conversions between rotation matrices and axis-angle pairs
//! - [`polar`] — nearest proper rotation of an arbitrary 3x3 matrix
//! - [`local_affine`] — least-squares affine fit over a displacement field neighborhood
//! - [`ground_truth`] — synthetic rotations and their displacement fields
//! - [`local_rotation`] — end-to-end queries combining the above
//!
//! ## Example
//!
//! ```no_run
//! use kornia_rotation::{ground_truth, local_rotation};
//!
//! let fixture = ground_truth::generate_seeded(Some([0.0, 0.0, 1.0]), Some(30.0), Some(42)).unwrap();
//! let center = fixture.field.grid().center();
//! let estimate =
//!     local_rotation::estimate_local_rotation_from_field(&fixture.field, &center, 2).unwrap();
//! println!("{estimate}");
//! ```

/// Rotation matrix and axis-angle conversions.
pub mod axis_angle;

/// Error types for the rotation module.
pub mod error;

/// Synthetic ground truth rotations and displacement fields.
pub mod ground_truth;

/// Local affine estimation from displacement field samples.
pub mod local_affine;

/// Local rotation queries on fields and transforms.
pub mod local_rotation;

/// Polar decomposition of 3x3 matrices.
pub mod polar;

pub use axis_angle::AxisAngle;
pub use error::RotationError;
