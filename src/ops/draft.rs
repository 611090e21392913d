// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Draft (taper) along a pull direction

use crate::error::OperatorError;
use crate::geometry::Mesh;
use crate::utils::math::try_normalize;
use nalgebra::{Point3, Vector3};

/// Smallest cross-section scale a draft may produce
pub const MIN_TAPER: f64 = 0.05;

/// Steepest draft angle in degrees, either way
pub const MAX_ANGLE: f64 = 89.0;

/// Drafted mesh plus the angle actually applied
#[derive(Debug, Clone)]
pub struct Drafted {
    pub mesh: Mesh,
    /// Degrees; smaller in magnitude than the request when the taper
    /// would otherwise drop below [`MIN_TAPER`]
    pub applied_angle: f64,
}

/// Taper `mesh` by `angle` degrees along `direction`. Vertices at the
/// neutral plane (`p . direction == neutral`, by default the lowest point)
/// stay put; higher vertices move toward the central axis so the outermost
/// ones lean in by `angle`.
///
/// The angle is limited so no vertex scales below [`MIN_TAPER`] and never
/// exceeds [`MAX_ANGLE`].
pub fn draft(
    mesh: &Mesh,
    angle: f64,
    direction: &Vector3<f64>,
    neutral: Option<f64>,
) -> Result<Drafted, OperatorError> {
    let pull = try_normalize(direction).ok_or(OperatorError::ZeroDirection)?;
    if !angle.is_finite() {
        return Err(OperatorError::NonFinite("angle"));
    }
    if neutral.is_some_and(|n| !n.is_finite()) {
        return Err(OperatorError::NonFinite("neutral"));
    }
    let unchanged = || Drafted {
        mesh: mesh.clone(),
        applied_angle: angle,
    };
    if mesh.is_empty() {
        return Ok(unchanged());
    }

    let center = mesh.bounding_box().center();
    let radial = |p: &Point3<f64>| {
        let offset = p - center;
        offset - pull * offset.dot(&pull)
    };
    let reach = mesh
        .vertices()
        .iter()
        .map(|p| radial(p).norm())
        .fold(0.0, f64::max);
    if reach <= f64::EPSILON {
        return Ok(unchanged());
    }
    let neutral = neutral.unwrap_or_else(|| {
        mesh.vertices()
            .iter()
            .map(|p| p.coords.dot(&pull))
            .fold(f64::INFINITY, f64::min)
    });

    // Distance past the neutral plane on the side that narrows
    let lean = mesh
        .vertices()
        .iter()
        .map(|p| (p.coords.dot(&pull) - neutral) * angle.signum())
        .fold(0.0, f64::max);
    let mut limit = MAX_ANGLE;
    if lean > f64::EPSILON {
        limit = limit.min(((1.0 - MIN_TAPER) * reach / lean).atan().to_degrees());
    }
    let applied_angle = angle.clamp(-limit, limit);

    let slope = applied_angle.to_radians().tan() / reach;
    let taper = |p: &Point3<f64>| 1.0 - (p.coords.dot(&pull) - neutral) * slope;
    let mut drafted = mesh.clone();
    drafted.map(
        |p| p - radial(p) * (1.0 - taper(p).max(MIN_TAPER)),
        |n| *n,
    );
    drafted.recompute_normals();

    Ok(Drafted {
        mesh: drafted,
        applied_angle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::box_mesh;
    use approx::assert_relative_eq;

    #[test]
    fn test_draft_tapers_top() {
        let source = box_mesh(Vector3::new(2.0, 2.0, 2.0), Point3::origin());
        let result = draft(&source, 10.0, &Vector3::y(), None).unwrap();
        assert_eq!(result.applied_angle, 10.0);
        let factor = 1.0 - 2.0 * 10f64.to_radians().tan() / 2f64.sqrt();
        for v in result.mesh.vertices() {
            if v.y > 0.0 {
                assert_relative_eq!(v.x.abs(), factor, epsilon = 1e-12);
            } else {
                assert_relative_eq!(v.x.abs(), 1.0, epsilon = 1e-12);
            }
        }
        let top = 4.0 * factor * factor;
        let expected = 2.0 / 3.0 * (4.0 + top + (4.0 * top).sqrt());
        assert_relative_eq!(result.mesh.signed_volume(), expected, epsilon = 1e-9);
    }

    #[test]
    fn test_steep_draft_is_clamped() {
        let source = box_mesh(Vector3::new(1.0, 10.0, 1.0), Point3::origin());
        let result = draft(&source, 60.0, &Vector3::y(), None).unwrap();
        // tan(angle) * 10 / sqrt(0.5) must stay within 1 - MIN_TAPER
        let limit = ((1.0 - MIN_TAPER) * 0.5f64.sqrt() / 10.0).atan().to_degrees();
        assert_relative_eq!(result.applied_angle, limit, epsilon = 1e-12);
        assert!(!result.mesh.has_non_finite());
        assert!(result.mesh.signed_volume() > 0.0);
        let top = result
            .mesh
            .vertices()
            .iter()
            .filter(|v| v.y > 0.0)
            .map(|v| v.x.abs())
            .fold(0.0, f64::max);
        assert_relative_eq!(top, 0.5 * MIN_TAPER, epsilon = 1e-9);
    }

    #[test]
    fn test_right_angle_draft_is_limited() {
        let source = box_mesh(Vector3::new(2.0, 2.0, 2.0), Point3::origin());
        for angle in [90.0, -90.0, 1e6] {
            let result = draft(&source, angle, &Vector3::y(), Some(0.0)).unwrap();
            assert!(result.applied_angle.abs() < MAX_ANGLE + 1e-12);
            assert!(result.applied_angle.abs() < angle.abs());
            assert_eq!(result.applied_angle.signum(), angle.signum());
            assert!(!result.mesh.has_non_finite());
            assert!(result.mesh.signed_volume() > 0.0);
        }
    }

    #[test]
    fn test_explicit_neutral_plane() {
        let source = box_mesh(Vector3::new(2.0, 2.0, 2.0), Point3::origin());
        let result = draft(&source, 5.0, &Vector3::y(), Some(1.0)).unwrap();
        // The top sits on the neutral plane; the bottom flares out
        for v in result.mesh.vertices() {
            if v.y > 0.0 {
                assert_relative_eq!(v.z.abs(), 1.0, epsilon = 1e-12);
            } else {
                assert!(v.z.abs() > 1.0);
            }
        }
    }

    #[test]
    fn test_zero_direction_fails() {
        let source = box_mesh(Vector3::new(1.0, 1.0, 1.0), Point3::origin());
        assert_eq!(
            draft(&source, 5.0, &Vector3::zeros(), None).unwrap_err(),
            OperatorError::ZeroDirection
        );
    }
}
