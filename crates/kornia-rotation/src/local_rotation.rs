use std::fmt;

use kornia_field::{mat3, DisplacementField, DisplacementFieldTransform, Transform3d};
use serde::Serialize;

use crate::{
    axis_angle::{axis_angle_from_rotation_matrix, AxisAngle},
    error::RotationError,
    local_affine::{fit_affine_with_params, sample_neighborhood, AffineFitParams},
    polar::nearest_rotation,
};

/// Which local linear map is reduced to a rotation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JacobianConvention {
    /// The Jacobian of the transform, reporting the rotation it applies.
    #[default]
    Forward,
    /// The inverse Jacobian, reporting the rotation that undoes the transform.
    Inverse,
}

/// Local rotations recovered from each supplied input.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LocalRotationReport {
    /// The rotation of the displacement field, if one was given.
    pub from_field: Option<AxisAngle>,
    /// The rotation of the transform, if one was given.
    pub from_transform: Option<AxisAngle>,
}

impl fmt::Display for LocalRotationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(aa) = &self.from_field {
            writeln!(f, "Displacement field rotation:")?;
            writeln!(f, "{aa}")?;
        }
        if let Some(aa) = &self.from_transform {
            writeln!(f, "Affine transform rotation:")?;
            writeln!(f, "{aa}")?;
        }
        Ok(())
    }
}

/// Reduce a local linear map to its axis-angle rotation.
pub fn rotation_of_linear_map(jacobian: &[[f64; 3]; 3]) -> AxisAngle {
    axis_angle_from_rotation_matrix(&nearest_rotation(jacobian))
}

fn jacobian_with_convention(
    transform: &dyn Transform3d,
    point: &[f64; 3],
    convention: JacobianConvention,
) -> Result<[[f64; 3]; 3], RotationError> {
    let jacobian = match convention {
        JacobianConvention::Forward => transform.jacobian_wrt_position(point)?,
        JacobianConvention::Inverse => transform.inverse_jacobian_wrt_position(point)?,
    };
    Ok(jacobian)
}

/// Recover the local rotation at a point from a displacement field and/or a transform.
///
/// The field path differentiates the field on its grid, the transform path uses the
/// transform Jacobian, e.g. the linear part of an affine transform. Each Jacobian is reduced
/// with [`nearest_rotation`] and reported as an axis-angle pair.
///
/// # Arguments
///
/// * `point` - The physical query point.
/// * `field` - An optional displacement field.
/// * `transform` - An optional transform.
/// * `convention` - Whether the forward or inverse Jacobian is reduced.
///
/// # Errors
///
/// Returns [`RotationError::MissingInput`] if neither input is given, or the field error if
/// the point is outside the field.
pub fn local_rotation_at(
    point: &[f64; 3],
    field: Option<&DisplacementField>,
    transform: Option<&dyn Transform3d>,
    convention: JacobianConvention,
) -> Result<LocalRotationReport, RotationError> {
    if field.is_none() && transform.is_none() {
        return Err(RotationError::MissingInput);
    }

    let from_field = field
        .map(|field| {
            let field_transform = DisplacementFieldTransform::new(field);
            jacobian_with_convention(&field_transform, point, convention)
        })
        .transpose()?
        .map(|jacobian| rotation_of_linear_map(&jacobian));

    let from_transform = transform
        .map(|transform| jacobian_with_convention(transform, point, convention))
        .transpose()?
        .map(|jacobian| rotation_of_linear_map(&jacobian));

    Ok(LocalRotationReport {
        from_field,
        from_transform,
    })
}

/// Estimate the local rotation of a displacement field by a local affine fit.
///
/// Samples the `(2 * radius + 1)³` voxel cube around `point`, fits an affine map by least
/// squares and reduces its linear part to a rotation.
///
/// Example:
///
/// ```no_run
/// use kornia_rotation::{ground_truth, local_rotation};
///
/// let gt = ground_truth::generate_seeded(Some([0.0, 0.0, 1.0]), Some(30.0), Some(42)).unwrap();
/// let point = [0.0, 0.0, 0.0];
/// let estimate = local_rotation::estimate_local_rotation_from_field(&gt.field, &point, 1).unwrap();
/// ```
pub fn estimate_local_rotation_from_field(
    field: &DisplacementField,
    point: &[f64; 3],
    radius: usize,
) -> Result<AxisAngle, RotationError> {
    let params = AffineFitParams {
        radius,
        ..Default::default()
    };
    estimate_local_rotation_with_params(field, point, &params)
}

/// Estimate the local rotation of a displacement field by a local affine fit.
pub fn estimate_local_rotation_with_params(
    field: &DisplacementField,
    point: &[f64; 3],
    params: &AffineFitParams,
) -> Result<AxisAngle, RotationError> {
    let samples = sample_neighborhood(field, point, params.radius)?;
    let model = fit_affine_with_params(&samples, params)?;

    let stretch_det = mat3::det33(&model.linear);
    if stretch_det <= 0.0 {
        log::warn!(
            "local affine fit at {:?} is not orientation preserving (det {:.3e})",
            point,
            stretch_det
        );
    }

    Ok(rotation_of_linear_map(&model.linear))
}
