use kornia_field::{DisplacementField, ReferenceGrid, RigidTransform};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

use crate::{
    axis_angle::{rotation_matrix_from_axis_angle, AxisAngle},
    error::RotationError,
};

/// Parameters of a synthetic rotation fixture.
#[derive(Debug, Clone)]
pub struct GroundTruthParams {
    /// Rotation axis, drawn uniformly on the sphere when `None`.
    pub axis: Option<[f64; 3]>,
    /// Rotation angle in degrees, drawn uniformly when `None`.
    pub angle_deg: Option<f64>,
    /// Bound of the random angle range, `[-max, max]` degrees.
    pub max_random_angle_deg: f64,
    /// The grid the displacement field is sampled on.
    pub grid: ReferenceGrid,
}

impl Default for GroundTruthParams {
    fn default() -> Self {
        Self {
            axis: None,
            angle_deg: None,
            // stays clear of the ±90° region where recovered axes become ambiguous
            max_random_angle_deg: 89.0,
            grid: ReferenceGrid::default_fixture(),
        }
    }
}

/// A known rotation together with its transform and displacement field.
#[derive(Debug, Clone)]
pub struct GroundTruth {
    /// The rotation as drawn or specified, angle wrapped into `(-180, 180]` degrees.
    pub axis_angle: AxisAngle,
    /// The rotation matrix.
    pub rotation: [[f64; 3]; 3],
    /// The rigid transform rotating about the grid center.
    pub transform: RigidTransform,
    /// The displacement field of `transform` over the grid.
    pub field: DisplacementField,
}

/// Draw a uniformly distributed unit vector.
pub fn random_axis<R: Rng + ?Sized>(rng: &mut R) -> [f64; 3] {
    loop {
        let v: [f64; 3] = [
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
            rng.sample(StandardNormal),
        ];
        if let Ok(aa) = AxisAngle::new(v, 0.0) {
            return aa.axis;
        }
    }
}

/// Generate a rotation fixture.
///
/// Axis and angle not given in `params` are drawn from `rng`. The rotation is applied about
/// the physical center of the grid and the displacement field holds `T(p) - p` for every
/// grid point `p`.
///
/// # Errors
///
/// Returns [`RotationError::InvalidAxis`] if the given axis has a near-zero norm and
/// [`RotationError::InvalidAngle`] if the given angle or the random angle bound is not finite.
pub fn generate<R: Rng + ?Sized>(
    params: &GroundTruthParams,
    rng: &mut R,
) -> Result<GroundTruth, RotationError> {
    if !params.max_random_angle_deg.is_finite() {
        return Err(RotationError::InvalidAngle(params.max_random_angle_deg));
    }

    let axis = match params.axis {
        Some(axis) => axis,
        None => random_axis(rng),
    };
    let angle_deg = match params.angle_deg {
        Some(angle) => angle,
        None => {
            let bound = params.max_random_angle_deg.abs();
            rng.random_range(-bound..=bound)
        }
    };

    let axis_angle = AxisAngle::new(axis, angle_deg)?;
    let rotation = rotation_matrix_from_axis_angle(&axis_angle.axis, axis_angle.angle_rad())?;

    let center = params.grid.center();
    let transform = RigidTransform::from_rotation_center(rotation, center);

    log::debug!(
        "ground truth rotation axis {:?} angle {:.6} deg about {:?}",
        axis_angle.axis,
        axis_angle.angle_deg,
        center
    );

    let field = DisplacementField::from_transform(params.grid.clone(), &transform);

    Ok(GroundTruth {
        axis_angle,
        rotation,
        transform,
        field,
    })
}

/// Generate a rotation fixture on the default grid.
///
/// The random draw is reproducible when `seed` is given and uses OS entropy otherwise.
pub fn generate_seeded(
    axis: Option<[f64; 3]>,
    angle_deg: Option<f64>,
    seed: Option<u64>,
) -> Result<GroundTruth, RotationError> {
    let params = GroundTruthParams {
        axis,
        angle_deg,
        ..Default::default()
    };
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    generate(&params, &mut rng)
}
