use serde::Serialize;

use crate::{error::FieldError, field::DisplacementField, mat3};

/// A spatial transform in 3d physical space.
pub trait Transform3d {
    /// Map a physical point through the transform.
    fn transform_point(&self, point: &[f64; 3]) -> [f64; 3];

    /// The Jacobian of the transform with respect to the position at `point`, row-major.
    fn jacobian_wrt_position(&self, point: &[f64; 3]) -> Result<[[f64; 3]; 3], FieldError>;

    /// The inverse of the Jacobian with respect to the position at `point`.
    fn inverse_jacobian_wrt_position(
        &self,
        point: &[f64; 3],
    ) -> Result<[[f64; 3]; 3], FieldError> {
        mat3::inverse33(&self.jacobian_wrt_position(point)?)
    }
}

/// A rigid transform rotating about a center, `T(p) = R (p - c) + c + t`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RigidTransform {
    /// The rotation matrix, row-major.
    pub matrix: [[f64; 3]; 3],
    /// The fixed point of the rotation.
    pub center: [f64; 3],
    /// The translation applied after the rotation.
    pub translation: [f64; 3],
}

impl RigidTransform {
    /// Create a pure rotation about `center`.
    pub fn from_rotation_center(matrix: [[f64; 3]; 3], center: [f64; 3]) -> Self {
        Self {
            matrix,
            center,
            translation: [0.0; 3],
        }
    }

    /// The inverse transform.
    ///
    /// PRECONDITION: `matrix` is orthonormal.
    pub fn inverse(&self) -> Self {
        let matrix = mat3::transpose33(&self.matrix);
        let rt = mat3::matvec33(&matrix, &self.translation);
        Self {
            matrix,
            center: self.center,
            translation: [-rt[0], -rt[1], -rt[2]],
        }
    }
}

impl Transform3d for RigidTransform {
    fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let rel = [
            point[0] - self.center[0],
            point[1] - self.center[1],
            point[2] - self.center[2],
        ];
        let rotated = mat3::matvec33(&self.matrix, &rel);
        [
            rotated[0] + self.center[0] + self.translation[0],
            rotated[1] + self.center[1] + self.translation[1],
            rotated[2] + self.center[2] + self.translation[2],
        ]
    }

    fn jacobian_wrt_position(&self, _point: &[f64; 3]) -> Result<[[f64; 3]; 3], FieldError> {
        Ok(self.matrix)
    }
}

/// A general affine transform, `T(p) = A p + t`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AffineTransform {
    /// The linear part, row-major.
    pub matrix: [[f64; 3]; 3],
    /// The translation.
    pub translation: [f64; 3],
}

impl AffineTransform {
    /// Create a new affine transform.
    pub fn new(matrix: [[f64; 3]; 3], translation: [f64; 3]) -> Self {
        Self {
            matrix,
            translation,
        }
    }

    /// The inverse transform.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::SingularMatrix`] if the linear part is not invertible.
    pub fn inverse(&self) -> Result<Self, FieldError> {
        let matrix = mat3::inverse33(&self.matrix)?;
        let at = mat3::matvec33(&matrix, &self.translation);
        Ok(Self {
            matrix,
            translation: [-at[0], -at[1], -at[2]],
        })
    }
}

impl From<&RigidTransform> for AffineTransform {
    fn from(rigid: &RigidTransform) -> Self {
        let rc = mat3::matvec33(&rigid.matrix, &rigid.center);
        Self {
            matrix: rigid.matrix,
            translation: [
                rigid.center[0] + rigid.translation[0] - rc[0],
                rigid.center[1] + rigid.translation[1] - rc[1],
                rigid.center[2] + rigid.translation[2] - rc[2],
            ],
        }
    }
}

impl Transform3d for AffineTransform {
    fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let ap = mat3::matvec33(&self.matrix, point);
        [
            ap[0] + self.translation[0],
            ap[1] + self.translation[1],
            ap[2] + self.translation[2],
        ]
    }

    fn jacobian_wrt_position(&self, _point: &[f64; 3]) -> Result<[[f64; 3]; 3], FieldError> {
        Ok(self.matrix)
    }
}

/// A non-rigid transform backed by a dense displacement field.
///
/// Points are mapped with the displacement of their nearest voxel; no interpolation is done.
#[derive(Debug, Clone)]
pub struct DisplacementFieldTransform<'a> {
    field: &'a DisplacementField,
}

impl<'a> DisplacementFieldTransform<'a> {
    /// Wrap a displacement field.
    pub fn new(field: &'a DisplacementField) -> Self {
        Self { field }
    }

    /// The wrapped field.
    pub fn field(&self) -> &DisplacementField {
        self.field
    }

    // derivative of the displacement along one index axis, central where possible
    fn index_derivative(&self, index: &[i64; 3], axis: usize) -> [f64; 3] {
        let mut prev = *index;
        prev[axis] -= 1;
        let mut next = *index;
        next[axis] += 1;

        let at = |idx: &[i64; 3]| self.field.get(idx);
        let diff = |a: [f64; 3], b: [f64; 3], h: f64| {
            [(a[0] - b[0]) / h, (a[1] - b[1]) / h, (a[2] - b[2]) / h]
        };

        match (at(&prev), at(index), at(&next)) {
            (Some(p), _, Some(n)) => diff(n, p, 2.0),
            (None, Some(c), Some(n)) => diff(n, c, 1.0),
            (Some(p), Some(c), None) => diff(c, p, 1.0),
            _ => [0.0; 3],
        }
    }
}

impl Transform3d for DisplacementFieldTransform<'_> {
    fn transform_point(&self, point: &[f64; 3]) -> [f64; 3] {
        let index = self.field.grid().physical_to_index(point);
        match self.field.get(&index) {
            Some(d) => [point[0] + d[0], point[1] + d[1], point[2] + d[2]],
            None => *point,
        }
    }

    /// Finite differences of the displacement on the grid at the nearest voxel,
    /// `J = I + dD/dx`, with one-sided differences at the grid boundary.
    fn jacobian_wrt_position(&self, point: &[f64; 3]) -> Result<[[f64; 3]; 3], FieldError> {
        let grid = self.field.grid();
        let index = grid.physical_to_index(point);
        if !grid.is_inside(&index) {
            return Err(FieldError::PointOutsideField(*point));
        }

        // columns are derivatives with respect to each index axis
        let mut d_didx = [[0.0; 3]; 3];
        for axis in 0..3 {
            let col = self.index_derivative(&index, axis);
            for (row, val) in d_didx.iter_mut().zip(col.iter()) {
                row[axis] = *val;
            }
        }

        // chain rule into physical space
        let d_dx = mat3::matmul33(&d_didx, &grid.physical_to_index_matrix());

        let mut jacobian = mat3::IDENTITY33;
        for (j_row, d_row) in jacobian.iter_mut().zip(d_dx.iter()) {
            for (j, d) in j_row.iter_mut().zip(d_row.iter()) {
                *j += d;
            }
        }
        Ok(jacobian)
    }
}
