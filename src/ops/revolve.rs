// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Revolve a planar profile about an axis
//!
//! Profile points are `[radial, axial]` coordinates in a half-plane that
//! contains the axis: `[x, y]` maps to `center + x * radial + y * axis`. The
//! radial direction is +X projected off the axis (+Z when the axis is X), so
//! the default +Y axis keeps the profile in the XY plane. The profile is
//! closed automatically. A full turn wraps around without caps; a partial
//! angle caps both ends with a triangulated copy of the profile.

use super::profile::{add_cap, edge_outward, prepare_profile};
use crate::error::OperatorError;
use crate::geometry::Mesh;
use crate::utils::math::{any_perpendicular, is_finite3, rotate_point, rotate_vector, try_normalize};
use nalgebra::{Point2, Point3, Vector3};

/// Angles within this many degrees of a full turn wrap without caps
const FULL_TURN_TOLERANCE: f64 = 1e-6;

/// Unit direction perpendicular to `axis` that profile x coordinates run along
pub fn radial_direction(axis: &Vector3<f64>) -> Vector3<f64> {
    [Vector3::x(), Vector3::z()]
        .iter()
        .find_map(|candidate| {
            let projected = candidate - axis * axis.dot(candidate);
            (projected.norm() > 1e-6).then(|| projected.normalize())
        })
        .unwrap_or_else(|| any_perpendicular(axis))
}

/// Revolve `profile` by `angle` degrees about `axis` through `center`.
/// `segments` is the number of steps for a full turn; partial angles use
/// a proportional share.
pub fn revolve(
    profile: &[Point2<f64>],
    axis: &Vector3<f64>,
    angle: f64,
    center: &Point3<f64>,
    segments: u32,
) -> Result<Mesh, OperatorError> {
    let axis = try_normalize(axis).ok_or(OperatorError::ZeroAxis)?;
    if !angle.is_finite() {
        return Err(OperatorError::NonFinite("angle"));
    }
    if !is_finite3(&center.coords) {
        return Err(OperatorError::NonFinite("center"));
    }
    let profile = prepare_profile(profile, 3)?;

    let sweep = angle.to_radians();
    let full = (angle.abs() - 360.0).abs() < FULL_TURN_TOLERANCE || angle.abs() > 360.0;
    let sweep = if full { std::f64::consts::TAU * sweep.signum() } else { sweep };
    if sweep == 0.0 {
        return Err(OperatorError::ZeroAngle);
    }
    let segments = segments.max(3);
    let steps = if full {
        segments
    } else {
        ((segments as f64 * sweep.abs() / std::f64::consts::TAU).ceil() as u32).max(1)
    };
    let rings = if full { steps } else { steps + 1 };
    let angle_at = |k: u32| sweep * k as f64 / steps as f64;

    let n = profile.len();
    let radial = radial_direction(&axis);
    let lift = |x: f64, y: f64| radial * x + axis * y;
    let placed: Vec<Point3<f64>> = profile.iter().map(|p| center + lift(p.x, p.y)).collect();
    let mut mesh = Mesh::with_capacity(2 * n * rings as usize + 2 * n, 2 * n * steps as usize);

    for i in 0..n {
        let (p, q) = (placed[i], placed[(i + 1) % n]);
        let face = edge_outward(&profile[i], &profile[(i + 1) % n]);
        let face = lift(face.x, face.y);
        let base = mesh.vertex_count() as u32;
        for k in 0..rings {
            let theta = angle_at(k);
            let normal = rotate_vector(&face, &axis, theta);
            mesh.add_vertex_with_normal(rotate_point(&p, center, &axis, theta), normal);
            mesh.add_vertex_with_normal(rotate_point(&q, center, &axis, theta), normal);
        }
        for k in 0..steps {
            let next = (k + 1) % rings;
            let quad = [base + 2 * k, base + 2 * k + 1, base + 2 * next + 1, base + 2 * next];
            let outward = rotate_vector(&face, &axis, (angle_at(k) + angle_at(k + 1)) / 2.0);
            mesh.add_quad_indexed_facing(quad, &outward);
        }
    }

    if !full {
        // Caps face against the direction of travel at the profile centroid
        let centroid = placed.iter().fold(Vector3::zeros(), |acc, p| acc + p.coords) / n as f64;
        let travel = try_normalize(&(axis.cross(&(centroid - center.coords)) * sweep.signum()))
            .unwrap_or_else(Vector3::z);
        add_cap(&mut mesh, &placed, &profile, &-travel)?;
        let end: Vec<Point3<f64>> = placed
            .iter()
            .map(|p| rotate_point(p, center, &axis, sweep))
            .collect();
        add_cap(&mut mesh, &end, &profile, &rotate_vector(&travel, &axis, sweep))?;
    }

    mesh.orient_outward();
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh_utils::is_watertight;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    fn ring_profile() -> Vec<Point2<f64>> {
        vec![
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 1.0),
            Point2::new(1.0, 1.0),
        ]
    }

    /// Area factor of an inscribed regular polygon relative to its circle
    fn polygon_factor(n: u32) -> f64 {
        n as f64 / 2.0 * (2.0 * PI / n as f64).sin() / PI
    }

    #[test]
    fn test_full_revolution_is_closed_annulus() {
        let mesh = revolve(&ring_profile(), &Vector3::y(), 360.0, &Point3::origin(), 64).unwrap();
        let expected = PI * (4.0 - 1.0) * polygon_factor(64);
        assert_relative_eq!(mesh.signed_volume(), expected, epsilon = 1e-9);
        assert!(is_watertight(&mesh, 1e-9));
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.max.y, 1.0);
        assert_relative_eq!(bbox.max.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_partial_revolution_is_capped() {
        let mesh = revolve(&ring_profile(), &Vector3::y(), 90.0, &Point3::origin(), 64).unwrap();
        assert!(is_watertight(&mesh, 1e-9));
        let quarter = PI * 3.0 / 4.0;
        assert!((mesh.signed_volume() - quarter).abs() / quarter < 0.01);
    }

    #[test]
    fn test_clockwise_profile_and_negative_angle() {
        let mut profile = ring_profile();
        profile.reverse();
        let mesh = revolve(&profile, &Vector3::y(), -180.0, &Point3::origin(), 32).unwrap();
        assert!(is_watertight(&mesh, 1e-9));
        assert!(mesh.signed_volume() > 0.0);
        // Rotating -180 degrees about +Y sweeps +X toward +Z
        assert!(mesh.bounding_box().max.z > 1.9);
    }

    #[test]
    fn test_profile_touching_axis() {
        let profile = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        let mesh = revolve(&profile, &Vector3::y(), 360.0, &Point3::origin(), 48).unwrap();
        // A cone of radius 1 and height 1
        let expected = PI / 3.0 * polygon_factor(48);
        assert_relative_eq!(mesh.signed_volume(), expected, epsilon = 1e-9);
        assert!(!mesh.has_non_finite());
    }

    #[test]
    fn test_axis_perpendicular_to_xy_plane() {
        let quarter = PI * 3.0 / 4.0;
        for axis in [Vector3::z(), Vector3::x(), Vector3::new(1.0, 1.0, 1.0)] {
            let mesh = revolve(&ring_profile(), &axis, 90.0, &Point3::origin(), 64).unwrap();
            assert!(is_watertight(&mesh, 1e-9), "{axis:?}");
            assert!(
                (mesh.signed_volume() - quarter).abs() / quarter < 0.01,
                "{axis:?}: {}",
                mesh.signed_volume()
            );
        }
    }

    #[test]
    fn test_profile_is_placed_relative_to_center() {
        let center = Point3::new(5.0, 0.0, -2.0);
        let mesh = revolve(&ring_profile(), &Vector3::z(), 360.0, &center, 32).unwrap();
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.center().x, 5.0, epsilon = 1e-9);
        assert_relative_eq!(bbox.min.z, -2.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.z, -1.0, epsilon = 1e-12);
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn test_radial_direction_is_perpendicular() {
        assert_eq!(radial_direction(&Vector3::y()), Vector3::x());
        assert_eq!(radial_direction(&Vector3::x()), Vector3::z());
        let axis = Vector3::new(1.0, 2.0, 3.0).normalize();
        let radial = radial_direction(&axis);
        assert_relative_eq!(radial.dot(&axis), 0.0, epsilon = 1e-12);
        assert_relative_eq!(radial.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_input() {
        let err = revolve(&ring_profile(), &Vector3::zeros(), 360.0, &Point3::origin(), 16)
            .unwrap_err();
        assert_eq!(err, OperatorError::ZeroAxis);
        let err = revolve(&ring_profile()[..2], &Vector3::y(), 360.0, &Point3::origin(), 16)
            .unwrap_err();
        assert!(matches!(err, OperatorError::ProfileTooShort { .. }));
    }
}
