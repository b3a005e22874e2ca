use kornia_field::mat3;

/// Rotation and stretch factors of a 3x3 matrix, `J = R * S`.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarDecomposition {
    /// The nearest proper rotation, det = +1.
    pub rotation: [[f64; 3]; 3],
    /// The remaining factor `Rᵗ J`, symmetric for inputs with positive determinant.
    pub stretch: [[f64; 3]; 3],
}

fn faer_mat33_to_array(mat: faer::MatRef<'_, f64>) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for (i, row) in out.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = mat.read(i, j);
        }
    }
    out
}

/// Extract the nearest proper rotation of a 3x3 matrix.
///
/// Computes the SVD `J = U Σ Vᵗ` and returns `U Vᵗ`. If that product is a reflection the
/// last column of `U` is negated so that the result always has determinant +1.
///
/// # Arguments
///
/// * `jacobian` - Any 3x3 matrix, e.g. a local Jacobian or the linear part of an affine map.
///
/// # Returns
///
/// The rotation closest to `jacobian` in Frobenius norm among proper rotations.
///
/// Example:
///
/// ```no_run
/// use kornia_rotation::polar::nearest_rotation;
///
/// let scaled = [[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 2.0]];
/// let rotation = nearest_rotation(&scaled);
/// ```
pub fn nearest_rotation(jacobian: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mat = faer::Mat::<f64>::from_fn(3, 3, |i, j| jacobian[i][j]);
    let svd = mat.svd();

    let mut u = faer_mat33_to_array(svd.u());
    let vt = mat3::transpose33(&faer_mat33_to_array(svd.v()));

    let rotation = mat3::matmul33(&u, &vt);
    if mat3::det33(&rotation) >= 0.0 {
        return rotation;
    }

    // reflection: R = U * diag(1, 1, -1) * Vᵗ
    for row in u.iter_mut() {
        row[2] = -row[2];
    }
    mat3::matmul33(&u, &vt)
}

/// Factor a 3x3 matrix into its nearest rotation and the remaining stretch.
pub fn polar_decomposition(jacobian: &[[f64; 3]; 3]) -> PolarDecomposition {
    let rotation = nearest_rotation(jacobian);
    let stretch = mat3::matmul33(&mat3::transpose33(&rotation), jacobian);
    PolarDecomposition { rotation, stretch }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis_angle::rotation_matrix_from_axis_angle;
    use crate::error::RotationError;
    use approx::assert_relative_eq;

    fn assert_mat_eq(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3], eps: f64) {
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(a[i][j], b[i][j], epsilon = eps);
            }
        }
    }

    fn assert_proper_rotation(r: &[[f64; 3]; 3]) {
        let rtr = mat3::matmul33(&mat3::transpose33(r), r);
        assert_mat_eq(&rtr, &mat3::IDENTITY33, 1e-9);
        assert_relative_eq!(mat3::det33(r), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nearest_rotation_idempotent() -> Result<(), RotationError> {
        let r = rotation_matrix_from_axis_angle(&[0.2, 1.0, -0.7], 0.8)?;
        assert_mat_eq(&nearest_rotation(&r), &r, 1e-9);
        assert_mat_eq(&nearest_rotation(&mat3::IDENTITY33), &mat3::IDENTITY33, 1e-12);
        Ok(())
    }

    #[test]
    fn test_nearest_rotation_removes_scale() -> Result<(), RotationError> {
        let r = rotation_matrix_from_axis_angle(&[0.0, 0.0, 1.0], 0.5)?;
        let mut scaled = r;
        for row in scaled.iter_mut() {
            for val in row.iter_mut() {
                *val *= 3.0;
            }
        }
        assert_mat_eq(&nearest_rotation(&scaled), &r, 1e-9);
        Ok(())
    }

    #[test]
    fn test_nearest_rotation_removes_stretch() -> Result<(), RotationError> {
        let r = rotation_matrix_from_axis_angle(&[1.0, 1.0, 0.0], 0.4)?;
        let stretch = [[1.5, 0.2, 0.0], [0.2, 0.8, 0.1], [0.0, 0.1, 1.2]];
        let j = mat3::matmul33(&r, &stretch);

        let polar = polar_decomposition(&j);
        assert_mat_eq(&polar.rotation, &r, 1e-9);
        assert_mat_eq(&polar.stretch, &stretch, 1e-9);
        Ok(())
    }

    #[test]
    fn test_reflection_is_corrected() -> Result<(), RotationError> {
        let r = rotation_matrix_from_axis_angle(&[0.3, -0.5, 0.8], 1.2)?;
        let flip = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]];
        let reflective = mat3::matmul33(&r, &flip);
        assert!(mat3::det33(&reflective) < 0.0);
        assert_proper_rotation(&nearest_rotation(&reflective));

        let mirror = [[-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert_proper_rotation(&nearest_rotation(&mirror));

        let slightly_negative = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1e-8]];
        assert_proper_rotation(&nearest_rotation(&slightly_negative));
        Ok(())
    }

    #[test]
    fn test_near_singular_still_rotation() {
        let singular = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [1.0, 0.0, 1.0]];
        assert_proper_rotation(&nearest_rotation(&singular));

        let zeros = [[0.0; 3]; 3];
        assert_proper_rotation(&nearest_rotation(&zeros));
    }
}
