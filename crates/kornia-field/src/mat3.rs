use crate::error::FieldError;

/// The 3x3 identity matrix.
pub const IDENTITY33: [[f64; 3]; 3] = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Determinants with a magnitude below this value are treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// Compute the dot product of two 3d vectors.
pub fn dot_product3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Compute the euclidean norm of a 3d vector.
pub fn norm3(a: &[f64; 3]) -> f64 {
    dot_product3(a, a).sqrt()
}

/// Multiply two row-major 3x3 matrices.
///
/// # Arguments
///
/// * `a` - The left hand side matrix.
/// * `b` - The right hand side matrix.
///
/// # Returns
///
/// The product `a * b`.
pub fn matmul33(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut m = [[0.0; 3]; 3];
    for (i, row) in m.iter_mut().enumerate() {
        for (j, val) in row.iter_mut().enumerate() {
            *val = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    m
}

/// Multiply a row-major 3x3 matrix with a 3d column vector.
pub fn matvec33(a: &[[f64; 3]; 3], v: &[f64; 3]) -> [f64; 3] {
    [
        dot_product3(&a[0], v),
        dot_product3(&a[1], v),
        dot_product3(&a[2], v),
    ]
}

/// Transpose a 3x3 matrix.
pub fn transpose33(a: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    [
        [a[0][0], a[1][0], a[2][0]],
        [a[0][1], a[1][1], a[2][1]],
        [a[0][2], a[1][2], a[2][2]],
    ]
}

/// Compute the determinant of a 3x3 matrix.
pub fn det33(a: &[[f64; 3]; 3]) -> f64 {
    a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
        - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
        + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
}

/// Invert a 3x3 matrix using the adjugate.
///
/// # Errors
///
/// Returns [`FieldError::SingularMatrix`] if the determinant is close to zero.
pub fn inverse33(a: &[[f64; 3]; 3]) -> Result<[[f64; 3]; 3], FieldError> {
    let det = det33(a);
    if det.abs() < SINGULAR_EPS {
        return Err(FieldError::SingularMatrix);
    }
    let inv_det = 1.0 / det;

    Ok([
        [
            (a[1][1] * a[2][2] - a[1][2] * a[2][1]) * inv_det,
            (a[0][2] * a[2][1] - a[0][1] * a[2][2]) * inv_det,
            (a[0][1] * a[1][2] - a[0][2] * a[1][1]) * inv_det,
        ],
        [
            (a[1][2] * a[2][0] - a[1][0] * a[2][2]) * inv_det,
            (a[0][0] * a[2][2] - a[0][2] * a[2][0]) * inv_det,
            (a[0][2] * a[1][0] - a[0][0] * a[1][2]) * inv_det,
        ],
        [
            (a[1][0] * a[2][1] - a[1][1] * a[2][0]) * inv_det,
            (a[0][1] * a[2][0] - a[0][0] * a[2][1]) * inv_det,
            (a[0][0] * a[1][1] - a[0][1] * a[1][0]) * inv_det,
        ],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matmul33_identity() {
        let a = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        assert_eq!(matmul33(&a, &IDENTITY33), a);
        assert_eq!(matmul33(&IDENTITY33, &a), a);
    }

    #[test]
    fn test_det33() {
        let a = [[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]];
        assert_relative_eq!(det33(&a), 24.0);
        let rank2 = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        assert_relative_eq!(det33(&rank2), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_inverse33() -> Result<(), FieldError> {
        let a = [[2.0, 1.0, 0.0], [0.0, 1.0, 0.5], [1.0, 0.0, 3.0]];
        let a_inv = inverse33(&a)?;
        let eye = matmul33(&a, &a_inv);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(eye[i][j], IDENTITY33[i][j], epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_inverse33_singular() {
        let a = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]];
        assert_eq!(inverse33(&a), Err(FieldError::SingularMatrix));
    }

    #[test]
    fn test_matvec33_transpose() {
        let a = [[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]];
        let v = matvec33(&a, &[1.0, 0.0, 0.0]);
        assert_eq!(v, [0.0, 1.0, 0.0]);
        let back = matvec33(&transpose33(&a), &v);
        assert_eq!(back, [1.0, 0.0, 0.0]);
    }
}
