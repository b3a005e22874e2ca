use faer::prelude::SpSolverLstsq;
use kornia_field::{mat3, DisplacementField};
use serde::{Deserialize, Serialize};

use crate::error::RotationError;

/// Number of unknowns per output coordinate of a 3d affine map.
const MIN_AFFINE_SAMPLES: usize = 4;

/// A point correspondence taken from a displacement field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DisplacementSample {
    /// The physical source point.
    pub source: [f64; 3],
    /// The source point moved by the field displacement.
    pub destination: [f64; 3],
}

impl DisplacementSample {
    /// Create a sample from a source point and its displacement.
    pub fn from_displacement(source: [f64; 3], displacement: [f64; 3]) -> Self {
        Self {
            source,
            destination: [
                source[0] + displacement[0],
                source[1] + displacement[1],
                source[2] + displacement[2],
            ],
        }
    }
}

/// Parameters of the local affine estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffineFitParams {
    /// Half size of the sampled voxel cube.
    pub radius: usize,
    /// Minimum number of samples for a fit, never less than 4.
    pub min_samples: usize,
    /// Smallest accepted ratio between the smallest and largest singular value of the
    /// centered source points.
    pub rank_tolerance: f64,
}

impl Default for AffineFitParams {
    fn default() -> Self {
        Self {
            radius: 2,
            min_samples: MIN_AFFINE_SAMPLES,
            rank_tolerance: 1e-9,
        }
    }
}

/// A local affine map, `q ≈ A p + t`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalAffineModel {
    /// The linear part `A`, row-major.
    pub linear: [[f64; 3]; 3],
    /// The translation `t`.
    pub translation: [f64; 3],
    /// Number of samples used by the fit.
    pub num_samples: usize,
}

impl LocalAffineModel {
    /// Map a point through the model.
    pub fn apply(&self, point: &[f64; 3]) -> [f64; 3] {
        let ap = mat3::matvec33(&self.linear, point);
        [
            ap[0] + self.translation[0],
            ap[1] + self.translation[1],
            ap[2] + self.translation[2],
        ]
    }

    /// Root mean square distance between the mapped sources and the destinations.
    pub fn rms_residual(&self, samples: &[DisplacementSample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = samples
            .iter()
            .map(|s| {
                let q = self.apply(&s.source);
                (0..3).map(|i| (q[i] - s.destination[i]).powi(2)).sum::<f64>()
            })
            .sum();
        (sum_sq / samples.len() as f64).sqrt()
    }
}

/// Collect the displacement samples in a voxel cube around a physical point.
///
/// The point is mapped to its nearest voxel and every offset in `[-radius, radius]³` that
/// lands inside the field is visited, x fastest. The cube is clamped to the grid before
/// iterating, so far away points and radii larger than the field stay bounded. The source
/// point of each sample is the voxel center, `index + 0.5`, in physical space.
///
/// # Arguments
///
/// * `field` - The displacement field.
/// * `point` - The physical query point.
/// * `radius` - Half size of the cube in voxels.
///
/// # Errors
///
/// Returns [`RotationError::OutOfBounds`] if no voxel of the cube lies inside the field, or if
/// the point is not finite.
pub fn sample_neighborhood(
    field: &DisplacementField,
    point: &[f64; 3],
    radius: usize,
) -> Result<Vec<DisplacementSample>, RotationError> {
    let out_of_bounds = RotationError::OutOfBounds {
        point: *point,
        radius,
    };
    if point.iter().any(|v| !v.is_finite()) {
        return Err(out_of_bounds);
    }

    let grid = field.grid();
    let center = grid.physical_to_index(point);
    let size = grid.size();
    let r = i64::try_from(radius).unwrap_or(i64::MAX);

    // inclusive index range of the cube intersected with [0, size) on each axis
    let mut ranges = [(0i64, 0i64); 3];
    for axis in 0..3 {
        let last = i64::try_from(size[axis]).unwrap_or(i64::MAX) - 1;
        let lo = center[axis].saturating_sub(r).max(0);
        let hi = center[axis].saturating_add(r).min(last);
        if lo > hi {
            return Err(out_of_bounds);
        }
        ranges[axis] = (lo, hi);
    }

    let num_inside = ranges
        .iter()
        .map(|&(lo, hi)| (hi - lo + 1) as usize)
        .product::<usize>();
    let mut samples = Vec::with_capacity(num_inside);

    for z in ranges[2].0..=ranges[2].1 {
        for y in ranges[1].0..=ranges[1].1 {
            for x in ranges[0].0..=ranges[0].1 {
                let index = [x, y, z];
                let Some(displacement) = field.get(&index) else {
                    continue;
                };
                let source = grid.index_to_physical(&[
                    x as f64 + 0.5,
                    y as f64 + 0.5,
                    z as f64 + 0.5,
                ]);
                samples.push(DisplacementSample::from_displacement(source, displacement));
            }
        }
    }

    if samples.is_empty() {
        return Err(out_of_bounds);
    }

    let side = radius.saturating_mul(2).saturating_add(1);
    let full = side.saturating_mul(side).saturating_mul(side);
    if samples.len() < full {
        log::debug!(
            "partial neighborhood at {:?}: {} of {} voxels inside the field",
            point,
            samples.len(),
            full
        );
    }

    Ok(samples)
}

/// Fit a 3d affine map to displacement samples by linear least squares.
///
/// Uses the default [`AffineFitParams`].
pub fn fit_affine(samples: &[DisplacementSample]) -> Result<LocalAffineModel, RotationError> {
    fit_affine_with_params(samples, &AffineFitParams::default())
}

/// Fit a 3d affine map to displacement samples by linear least squares.
///
/// Solves `[A | t] [p; 1] ≈ q` for all samples at once.
///
/// # Errors
///
/// * [`RotationError::InsufficientSamples`] if fewer than `params.min_samples` (at least 4)
///   samples are given.
/// * [`RotationError::DegenerateFit`] if the source points are affinely dependent.
pub fn fit_affine_with_params(
    samples: &[DisplacementSample],
    params: &AffineFitParams,
) -> Result<LocalAffineModel, RotationError> {
    let required = params.min_samples.max(MIN_AFFINE_SAMPLES);
    if samples.len() < required {
        return Err(RotationError::InsufficientSamples {
            required,
            actual: samples.len(),
        });
    }

    let ratio = spread_ratio(samples);
    if ratio.is_nan() || ratio < params.rank_tolerance {
        return Err(RotationError::DegenerateFit { ratio });
    }

    let n = samples.len();
    let mut mat_a = faer::Mat::<f64>::zeros(n, 4);
    let mut mat_b = faer::Mat::<f64>::zeros(n, 3);
    for (i, sample) in samples.iter().enumerate() {
        for k in 0..3 {
            mat_a.write(i, k, sample.source[k]);
            mat_b.write(i, k, sample.destination[k]);
        }
        mat_a.write(i, 3, 1.0);
    }

    // 4x3 solution, rows are the coefficients of [x, y, z, 1]
    let params_mat = mat_a.qr().solve_lstsq(mat_b);

    let mut linear = [[0.0; 3]; 3];
    let mut translation = [0.0; 3];
    for i in 0..3 {
        for j in 0..3 {
            linear[i][j] = params_mat.read(j, i);
        }
        translation[i] = params_mat.read(3, i);
    }

    let model = LocalAffineModel {
        linear,
        translation,
        num_samples: n,
    };
    log::debug!(
        "local affine fit on {} samples, rms residual {:.3e}",
        n,
        model.rms_residual(samples)
    );

    Ok(model)
}

// smallest over largest singular value of the centered source points
fn spread_ratio(samples: &[DisplacementSample]) -> f64 {
    let n = samples.len() as f64;
    let mut mean = [0.0; 3];
    for sample in samples {
        for k in 0..3 {
            mean[k] += sample.source[k] / n;
        }
    }

    let centered = faer::Mat::<f64>::from_fn(samples.len(), 3, |i, k| {
        samples[i].source[k] - mean[k]
    });
    let singular_values = centered.singular_values();

    let largest = singular_values.iter().copied().fold(0.0, f64::max);
    let smallest = singular_values.iter().copied().fold(f64::INFINITY, f64::min);
    if largest <= 0.0 {
        return 0.0;
    }
    smallest / largest
}
