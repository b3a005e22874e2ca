use crate::{error::FieldError, grid::ReferenceGrid, transform::Transform3d};

/// A dense displacement field sampled on a reference grid.
///
/// Every voxel holds a displacement vector `d` such that the voxel position `p`
/// maps to `p + d`.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplacementField {
    grid: ReferenceGrid,
    data: Vec<[f64; 3]>,
}

impl DisplacementField {
    /// Create a displacement field from raw vectors stored in x-fastest order.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidDataLength`] if the data length does not match the grid.
    pub fn new(grid: ReferenceGrid, data: Vec<[f64; 3]>) -> Result<Self, FieldError> {
        if data.len() != grid.num_voxels() {
            return Err(FieldError::InvalidDataLength(data.len(), grid.num_voxels()));
        }
        Ok(Self { grid, data })
    }

    /// Create a displacement field filled with zero vectors.
    pub fn zeros(grid: ReferenceGrid) -> Self {
        let data = vec![[0.0; 3]; grid.num_voxels()];
        Self { grid, data }
    }

    /// Create a displacement field by evaluating a function at the physical position of
    /// every voxel.
    pub fn from_fn(grid: ReferenceGrid, f: impl Fn([f64; 3]) -> [f64; 3]) -> Self {
        let data = grid
            .indices()
            .map(|[i, j, k]| f(grid.index_to_physical(&[i as f64, j as f64, k as f64])))
            .collect();
        Self { grid, data }
    }

    /// Materialize a transform as a displacement field, `d(p) = T(p) - p`.
    pub fn from_transform(grid: ReferenceGrid, transform: &dyn Transform3d) -> Self {
        log::debug!(
            "materializing displacement field of size {:?}",
            grid.size()
        );
        Self::from_fn(grid, |p| {
            let q = transform.transform_point(&p);
            [q[0] - p[0], q[1] - p[1], q[2] - p[2]]
        })
    }

    /// The geometry of the field.
    pub fn grid(&self) -> &ReferenceGrid {
        &self.grid
    }

    /// The raw displacement vectors in x-fastest order.
    pub fn as_slice(&self) -> &[[f64; 3]] {
        &self.data
    }

    /// Get the displacement at an integer index, `None` if the index is outside the grid.
    pub fn get(&self, index: &[i64; 3]) -> Option<[f64; 3]> {
        self.grid
            .checked_index(index)
            .map(|idx| self.data[self.grid.linear_index(&idx)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mat3, transform::AffineTransform};
    use approx::assert_relative_eq;

    fn small_grid() -> ReferenceGrid {
        ReferenceGrid::new([4, 3, 2], [1.0, 2.0, 1.0], [0.0; 3], mat3::IDENTITY33)
            .expect("valid grid")
    }

    #[test]
    fn test_new_invalid_length() {
        let res = DisplacementField::new(small_grid(), vec![[0.0; 3]; 5]);
        assert_eq!(res, Err(FieldError::InvalidDataLength(5, 24)));
    }

    #[test]
    fn test_get_bounds() -> Result<(), FieldError> {
        let data = (0..24).map(|i| [i as f64, 0.0, 0.0]).collect();
        let field = DisplacementField::new(small_grid(), data)?;
        assert_eq!(field.get(&[1, 1, 1]), Some([(1 + 4 * (1 + 3)) as f64, 0.0, 0.0]));
        assert_eq!(field.get(&[4, 0, 0]), None);
        assert_eq!(field.get(&[0, 0, -1]), None);
        Ok(())
    }

    #[test]
    fn test_from_transform_translation() {
        let translation = AffineTransform::new(mat3::IDENTITY33, [1.0, -2.0, 0.5]);
        let field = DisplacementField::from_transform(small_grid(), &translation);
        for d in field.as_slice() {
            assert_relative_eq!(d[0], 1.0);
            assert_relative_eq!(d[1], -2.0);
            assert_relative_eq!(d[2], 0.5);
        }
    }
}
