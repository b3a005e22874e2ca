use serde::Serialize;

use crate::{error::FieldError, mat3};

/// Geometry of a regular lattice in physical space.
///
/// A voxel with index `i` sits at the physical point `origin + direction * (i * spacing)`.
/// Indices are ordered `[x, y, z]` and the data layout is x-fastest.
///
/// The grid is immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceGrid {
    size: [usize; 3],
    spacing: [f64; 3],
    origin: [f64; 3],
    direction: [[f64; 3]; 3],
    #[serde(skip)]
    index_to_physical: [[f64; 3]; 3],
    #[serde(skip)]
    physical_to_index: [[f64; 3]; 3],
}

impl ReferenceGrid {
    /// Create a new reference grid.
    ///
    /// # Arguments
    ///
    /// * `size` - The number of voxels along each axis.
    /// * `spacing` - The physical distance between voxels along each axis.
    /// * `origin` - The physical position of the voxel with index zero.
    /// * `direction` - The direction cosines, row-major.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidGeometry`] if any size is zero, any spacing is not
    /// strictly positive, or the direction matrix is singular.
    pub fn new(
        size: [usize; 3],
        spacing: [f64; 3],
        origin: [f64; 3],
        direction: [[f64; 3]; 3],
    ) -> Result<Self, FieldError> {
        if size.iter().any(|&s| s == 0) {
            return Err(FieldError::InvalidGeometry(format!(
                "size must be non-zero, got {size:?}"
            )));
        }
        if spacing.iter().any(|&s| !(s > 0.0 && s.is_finite())) {
            return Err(FieldError::InvalidGeometry(format!(
                "spacing must be positive and finite, got {spacing:?}"
            )));
        }

        // direction * diag(spacing)
        let mut index_to_physical = direction;
        for row in index_to_physical.iter_mut() {
            for (val, s) in row.iter_mut().zip(spacing.iter()) {
                *val *= s;
            }
        }

        let physical_to_index = mat3::inverse33(&index_to_physical).map_err(|_| {
            FieldError::InvalidGeometry(format!("direction is singular: {direction:?}"))
        })?;

        Ok(Self {
            size,
            spacing,
            origin,
            direction,
            index_to_physical,
            physical_to_index,
        })
    }

    /// The grid used for synthetic fixtures: 64³ voxels, 1mm spacing, origin at (-2, -2, -2).
    pub fn default_fixture() -> Self {
        Self {
            size: [64, 64, 64],
            spacing: [1.0, 1.0, 1.0],
            origin: [-2.0, -2.0, -2.0],
            direction: mat3::IDENTITY33,
            index_to_physical: mat3::IDENTITY33,
            physical_to_index: mat3::IDENTITY33,
        }
    }

    /// The number of voxels along each axis.
    pub fn size(&self) -> [usize; 3] {
        self.size
    }

    /// The physical distance between voxels along each axis.
    pub fn spacing(&self) -> [f64; 3] {
        self.spacing
    }

    /// The physical position of the first voxel.
    pub fn origin(&self) -> [f64; 3] {
        self.origin
    }

    /// The direction cosines, row-major.
    pub fn direction(&self) -> [[f64; 3]; 3] {
        self.direction
    }

    /// The total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.size[0] * self.size[1] * self.size[2]
    }

    /// Map a continuous index to its physical position.
    pub fn index_to_physical(&self, index: &[f64; 3]) -> [f64; 3] {
        let offset = mat3::matvec33(&self.index_to_physical, index);
        [
            self.origin[0] + offset[0],
            self.origin[1] + offset[1],
            self.origin[2] + offset[2],
        ]
    }

    /// Map a physical point to its continuous index.
    pub fn physical_to_continuous_index(&self, point: &[f64; 3]) -> [f64; 3] {
        let rel = [
            point[0] - self.origin[0],
            point[1] - self.origin[1],
            point[2] - self.origin[2],
        ];
        mat3::matvec33(&self.physical_to_index, &rel)
    }

    /// Map a physical point to the nearest integer index.
    ///
    /// The returned index may lie outside the grid, see [`ReferenceGrid::is_inside`].
    pub fn physical_to_index(&self, point: &[f64; 3]) -> [i64; 3] {
        let cidx = self.physical_to_continuous_index(point);
        [
            cidx[0].round() as i64,
            cidx[1].round() as i64,
            cidx[2].round() as i64,
        ]
    }

    /// Jacobian of the physical to index mapping, `diag(1 / spacing) * direction⁻¹`.
    pub fn physical_to_index_matrix(&self) -> [[f64; 3]; 3] {
        self.physical_to_index
    }

    /// Check whether an integer index lies inside the grid.
    pub fn is_inside(&self, index: &[i64; 3]) -> bool {
        index
            .iter()
            .zip(self.size.iter())
            .all(|(&i, &s)| i >= 0 && (i as usize) < s)
    }

    /// Convert a signed index to an unsigned one if it lies inside the grid.
    pub fn checked_index(&self, index: &[i64; 3]) -> Option<[usize; 3]> {
        if self.is_inside(index) {
            Some([index[0] as usize, index[1] as usize, index[2] as usize])
        } else {
            None
        }
    }

    /// The offset of an index in x-fastest storage.
    ///
    /// PRECONDITION: the index lies inside the grid.
    pub fn linear_index(&self, index: &[usize; 3]) -> usize {
        index[0] + self.size[0] * (index[1] + self.size[1] * index[2])
    }

    /// The physical center of the grid, i.e. the midpoint between the first and last voxel.
    pub fn center(&self) -> [f64; 3] {
        let mid = [
            0.5 * (self.size[0] as f64 - 1.0),
            0.5 * (self.size[1] as f64 - 1.0),
            0.5 * (self.size[2] as f64 - 1.0),
        ];
        self.index_to_physical(&mid)
    }

    /// Iterate over all voxel indices in x-fastest order.
    pub fn indices(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        let [nx, ny, nz] = self.size;
        (0..nz).flat_map(move |k| (0..ny).flat_map(move |j| (0..nx).map(move |i| [i, j, k])))
    }
}

impl Default for ReferenceGrid {
    fn default() -> Self {
        Self::default_fixture()
    }
}
