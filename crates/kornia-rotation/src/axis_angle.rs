use std::fmt;

use kornia_field::mat3;
use serde::Serialize;

use crate::error::RotationError;

/// Rotations with an angle below this value (radians) are treated as the identity.
const ZERO_ANGLE_EPS: f64 = 1e-6;

/// Axes with a norm below this value are rejected.
const ZERO_AXIS_EPS: f64 = 1e-10;

/// Below this norm the skew part carries no axis information (angle close to 180 degrees).
const SKEW_EPS: f64 = 1e-9;

/// The axis reported for a rotation with zero angle.
pub const DEFAULT_AXIS: [f64; 3] = [0.0, 0.0, 1.0];

/// A rotation given as a unit axis and a signed angle in degrees (right-hand rule).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisAngle {
    /// The unit rotation axis.
    pub axis: [f64; 3],
    /// The rotation angle in degrees.
    pub angle_deg: f64,
}

impl AxisAngle {
    /// Create an axis-angle pair, normalizing the axis and wrapping the angle into
    /// `(-180, 180]` degrees.
    ///
    /// # Errors
    ///
    /// Returns [`RotationError::InvalidAxis`] if the axis has a near-zero norm and
    /// [`RotationError::InvalidAngle`] if the angle is not finite.
    pub fn new(axis: [f64; 3], angle_deg: f64) -> Result<Self, RotationError> {
        Ok(Self {
            axis: normalize_axis(&axis)?,
            angle_deg: wrap_angle_deg(angle_deg)?,
        })
    }

    /// The rotation angle in radians.
    pub fn angle_rad(&self) -> f64 {
        self.angle_deg.to_radians()
    }

    /// The rotation matrix of this axis-angle pair.
    pub fn to_rotation_matrix(&self) -> Result<[[f64; 3]; 3], RotationError> {
        rotation_matrix_from_axis_angle(&self.axis, self.angle_rad())
    }

    /// The angle in degrees of the relative rotation between `self` and `other`.
    ///
    /// Unlike comparing axes and angles directly, this is insensitive to the sign ambiguity
    /// of the axis-angle representation.
    pub fn angular_distance_deg(&self, other: &AxisAngle) -> Result<f64, RotationError> {
        let r_a = self.to_rotation_matrix()?;
        let r_b = other.to_rotation_matrix()?;
        let relative = mat3::matmul33(&mat3::transpose33(&r_a), &r_b);
        Ok(rotation_angle(&relative).to_degrees())
    }
}

impl fmt::Display for AxisAngle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  Rotation Axis : [{:.6}, {:.6}, {:.6}]",
            self.axis[0], self.axis[1], self.axis[2]
        )?;
        write!(f, "  Rotation Angle: {:.6} degrees", self.angle_deg)
    }
}

/// Wrap an angle in degrees into `(-180, 180]`.
pub fn wrap_angle_deg(angle_deg: f64) -> Result<f64, RotationError> {
    if !angle_deg.is_finite() {
        return Err(RotationError::InvalidAngle(angle_deg));
    }
    let wrapped = angle_deg % 360.0;
    Ok(if wrapped > 180.0 {
        wrapped - 360.0
    } else if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    })
}

fn normalize_axis(axis: &[f64; 3]) -> Result<[f64; 3], RotationError> {
    let magnitude = mat3::norm3(axis);
    if magnitude < ZERO_AXIS_EPS || !magnitude.is_finite() {
        return Err(RotationError::InvalidAxis);
    }
    Ok([
        axis[0] / magnitude,
        axis[1] / magnitude,
        axis[2] / magnitude,
    ])
}

// acos of the trace with the argument clamped against rounding drift
fn rotation_angle(rotation: &[[f64; 3]; 3]) -> f64 {
    let trace = rotation[0][0] + rotation[1][1] + rotation[2][2];
    ((trace - 1.0) / 2.0).clamp(-1.0, 1.0).acos()
}

/// Compute the skew-symmetric cross-product matrix of a vector.
///
/// `skew_matrix(v) * w == v × w` for any `w`.
pub fn skew_matrix(v: &[f64; 3]) -> [[f64; 3]; 3] {
    [[0.0, -v[2], v[1]], [v[2], 0.0, -v[0]], [-v[1], v[0], 0.0]]
}

/// Compute the rotation matrix from an axis and angle using Rodrigues' formula.
///
/// # Arguments
///
/// * `axis` - The axis of rotation, normalized internally.
/// * `angle` - The angle of rotation in radians.
///
/// # Returns
///
/// The rotation matrix `I + sin(θ) K + (1 - cos(θ)) K²` with `K` the skew matrix of the axis.
///
/// # Errors
///
/// Returns [`RotationError::InvalidAxis`] if the axis has a near-zero norm.
///
/// Example:
///
/// ```no_run
/// use kornia_rotation::axis_angle::rotation_matrix_from_axis_angle;
///
/// let axis = [1.0, 0.0, 0.0];
/// let angle = std::f64::consts::PI / 2.0;
/// let rotation = rotation_matrix_from_axis_angle(&axis, angle).unwrap();
/// ```
pub fn rotation_matrix_from_axis_angle(
    axis: &[f64; 3],
    angle: f64,
) -> Result<[[f64; 3]; 3], RotationError> {
    let k = skew_matrix(&normalize_axis(axis)?);
    let k2 = mat3::matmul33(&k, &k);

    let s = angle.sin();
    let t = 1.0 - angle.cos();

    let mut rotation = mat3::IDENTITY33;
    for i in 0..3 {
        for j in 0..3 {
            rotation[i][j] += s * k[i][j] + t * k2[i][j];
        }
    }
    Ok(rotation)
}

/// Recover the axis and angle (degrees) of a rotation matrix.
///
/// Rotations with an angle below 1e-6 radians are reported as [`DEFAULT_AXIS`] with a zero
/// angle since the axis is undefined there. The returned angle lies in `[0, 180]`.
pub fn axis_angle_from_rotation_matrix(rotation: &[[f64; 3]; 3]) -> AxisAngle {
    let angle = rotation_angle(rotation);
    if angle.abs() < ZERO_ANGLE_EPS {
        return AxisAngle {
            axis: DEFAULT_AXIS,
            angle_deg: 0.0,
        };
    }

    let skew = [
        rotation[2][1] - rotation[1][2],
        rotation[0][2] - rotation[2][0],
        rotation[1][0] - rotation[0][1],
    ];

    let axis = match normalize_skew(&skew) {
        Some(axis) => axis,
        None => axis_from_symmetric_part(rotation),
    };

    AxisAngle {
        axis,
        angle_deg: angle.to_degrees(),
    }
}

fn normalize_skew(skew: &[f64; 3]) -> Option<[f64; 3]> {
    let magnitude = mat3::norm3(skew);
    (magnitude >= SKEW_EPS).then(|| [skew[0] / magnitude, skew[1] / magnitude, skew[2] / magnitude])
}

// at 180 degrees (R + I) / 2 = a aᵗ, any non-zero column is parallel to the axis
fn axis_from_symmetric_part(rotation: &[[f64; 3]; 3]) -> [f64; 3] {
    log::debug!("rotation close to 180 degrees, recovering axis from the symmetric part");
    let cols: [[f64; 3]; 3] = std::array::from_fn(|j| {
        std::array::from_fn(|i| {
            let eye = if i == j { 1.0 } else { 0.0 };
            0.5 * (rotation[i][j] + eye)
        })
    });

    let best = cols
        .iter()
        .max_by(|a, b| mat3::norm3(a).total_cmp(&mat3::norm3(b)))
        .copied()
        .unwrap_or(DEFAULT_AXIS);

    normalize_skew(&best).unwrap_or(DEFAULT_AXIS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn assert_axis_eq(a: &[f64; 3], b: &[f64; 3], eps: f64) {
        for i in 0..3 {
            assert_relative_eq!(a[i], b[i], epsilon = eps);
        }
    }

    #[test]
    fn test_rotation_matrix_from_axis_angle_x90() -> Result<(), RotationError> {
        let axis = [1.0, 0.0, 0.0];
        let angle = std::f64::consts::PI / 2.0;
        let rotation = rotation_matrix_from_axis_angle(&axis, angle)?;
        let expected = [[1.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rotation[i][j], expected[i][j], epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_rotation_matrix_unnormalized_axis() -> Result<(), RotationError> {
        let a = rotation_matrix_from_axis_angle(&[0.0, 0.0, 5.0], 0.3)?;
        let b = rotation_matrix_from_axis_angle(&[0.0, 0.0, 1.0], 0.3)?;
        for i in 0..3 {
            assert_axis_eq(&a[i], &b[i], 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_rotation_matrix_is_orthonormal() -> Result<(), RotationError> {
        let r = rotation_matrix_from_axis_angle(&[1.0, -2.0, 0.5], 1.1)?;
        let rtr = mat3::matmul33(&mat3::transpose33(&r), &r);
        for i in 0..3 {
            assert_axis_eq(&rtr[i], &mat3::IDENTITY33[i], 1e-12);
        }
        assert_relative_eq!(mat3::det33(&r), 1.0, epsilon = 1e-12);
        Ok(())
    }

    #[test]
    fn test_invalid_axis() {
        assert_eq!(
            rotation_matrix_from_axis_angle(&[0.0, 0.0, 0.0], 1.0),
            Err(RotationError::InvalidAxis)
        );
        assert_eq!(
            AxisAngle::new([1e-12, 0.0, 0.0], 10.0),
            Err(RotationError::InvalidAxis)
        );
    }

    #[test]
    fn test_angle_is_wrapped() -> Result<(), RotationError> {
        let z = [0.0, 0.0, 1.0];
        assert_relative_eq!(AxisAngle::new(z, 270.0)?.angle_deg, -90.0);
        assert_relative_eq!(AxisAngle::new(z, -180.0)?.angle_deg, 180.0);
        assert_relative_eq!(AxisAngle::new(z, 540.0)?.angle_deg, 180.0);
        assert_relative_eq!(AxisAngle::new(z, -390.0)?.angle_deg, -30.0);
        assert_relative_eq!(AxisAngle::new(z, 45.0)?.angle_deg, 45.0);

        // same rotation before and after wrapping
        let raw = rotation_matrix_from_axis_angle(&z, f64::to_radians(270.0))?;
        let wrapped = AxisAngle::new(z, 270.0)?.to_rotation_matrix()?;
        for i in 0..3 {
            assert_axis_eq(&raw[i], &wrapped[i], 1e-12);
        }
        Ok(())
    }

    #[test]
    fn test_non_finite_angle() {
        assert!(matches!(
            AxisAngle::new([1.0, 0.0, 0.0], f64::NAN),
            Err(RotationError::InvalidAngle(a)) if a.is_nan()
        ));
        assert_eq!(
            AxisAngle::new([1.0, 0.0, 0.0], f64::INFINITY),
            Err(RotationError::InvalidAngle(f64::INFINITY))
        );
    }

    #[test]
    fn test_identity_reports_default_axis() {
        let aa = axis_angle_from_rotation_matrix(&mat3::IDENTITY33);
        assert_eq!(aa.axis, DEFAULT_AXIS);
        assert_eq!(aa.angle_deg, 0.0);
    }

    #[test]
    fn test_roundtrip() -> Result<(), RotationError> {
        let axes = [
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.3, -0.4, 0.866],
            [-1.0, 2.0, 3.0],
        ];
        for axis in axes {
            let unit = AxisAngle::new(axis, 0.0)?.axis;
            for angle_deg in [0.5, 10.0, 45.0, 89.0, 120.0, 179.0] {
                let r = rotation_matrix_from_axis_angle(&axis, f64::to_radians(angle_deg))?;
                let aa = axis_angle_from_rotation_matrix(&r);
                assert_relative_eq!(aa.angle_deg, angle_deg, epsilon = 1e-4);
                assert_axis_eq(&aa.axis, &unit, 1e-4);
            }
        }
        Ok(())
    }

    #[test]
    fn test_negative_angle_flips_axis() -> Result<(), RotationError> {
        let r = rotation_matrix_from_axis_angle(&[0.0, 0.0, 1.0], f64::to_radians(-30.0))?;
        let aa = axis_angle_from_rotation_matrix(&r);
        assert_relative_eq!(aa.angle_deg, 30.0, epsilon = 1e-9);
        assert_axis_eq(&aa.axis, &[0.0, 0.0, -1.0], 1e-9);
        Ok(())
    }

    #[test]
    fn test_half_turn_axis_up_to_sign() -> Result<(), RotationError> {
        let axis = AxisAngle::new([1.0, 1.0, 0.0], 0.0)?.axis;
        let r = rotation_matrix_from_axis_angle(&axis, std::f64::consts::PI)?;
        let aa = axis_angle_from_rotation_matrix(&r);
        assert_relative_eq!(aa.angle_deg, 180.0, epsilon = 1e-5);
        let dot = mat3::dot_product3(&aa.axis, &axis);
        assert_relative_eq!(dot.abs(), 1.0, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_angular_distance() -> Result<(), RotationError> {
        let a = AxisAngle::new([0.0, 0.0, 1.0], 30.0)?;
        let b = AxisAngle::new([0.0, 0.0, -1.0], -30.0)?;
        assert_relative_eq!(a.angular_distance_deg(&b)?, 0.0, epsilon = 1e-5);

        let c = AxisAngle::new([0.0, 0.0, 1.0], 45.0)?;
        assert_relative_eq!(a.angular_distance_deg(&c)?, 15.0, epsilon = 1e-8);
        Ok(())
    }

    #[test]
    fn test_display() {
        let aa = AxisAngle {
            axis: [0.0, 0.0, 1.0],
            angle_deg: 30.0,
        };
        assert_eq!(
            aa.to_string(),
            "  Rotation Axis : [0.000000, 0.000000, 1.000000]\n  Rotation Angle: 30.000000 degrees"
        );
    }
}
