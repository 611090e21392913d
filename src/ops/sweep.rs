// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Sweep a profile along a 3D path, and the helical tube built on it

use super::profile::{add_cap, edge_outward, prepare_profile};
use crate::error::OperatorError;
use crate::geometry::Mesh;
use crate::utils::math::{any_perpendicular, is_finite3, rotate_vector, try_normalize};
use nalgebra::{Point2, Point3, Vector3};
use std::f64::consts::TAU;

/// Path points closer than this are treated as one
const MIN_STEP: f64 = 1e-9;
/// Points around a helix tube cross-section
const TUBE_SEGMENTS: usize = 12;

/// Orthonormal frame carried along a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathFrame {
    pub origin: Point3<f64>,
    pub tangent: Vector3<f64>,
    pub normal: Vector3<f64>,
    pub binormal: Vector3<f64>,
}

/// Rotation-minimizing frames: each normal is the previous one rotated by
/// the turn between consecutive tangents
pub fn rotation_minimizing_frames(path: &[Point3<f64>]) -> Result<Vec<PathFrame>, OperatorError> {
    if path.iter().any(|p| !is_finite3(&p.coords)) {
        return Err(OperatorError::NonFinite("path"));
    }
    let mut points: Vec<Point3<f64>> = Vec::with_capacity(path.len());
    for p in path {
        if points.last().map_or(true, |last| (p - last).norm() > MIN_STEP) {
            points.push(*p);
        }
    }
    if points.len() < 2 {
        return Err(OperatorError::PathTooShort(points.len()));
    }

    let n = points.len();
    let tangents: Vec<Vector3<f64>> = (0..n)
        .map(|i| {
            let (a, b) = (points[i.saturating_sub(1)], points[(i + 1).min(n - 1)]);
            try_normalize(&(b - a)).unwrap_or_else(Vector3::z)
        })
        .collect();

    let mut frames = Vec::with_capacity(n);
    let mut normal = any_perpendicular(&tangents[0]);
    for i in 0..n {
        if i > 0 {
            let (prev, cur) = (tangents[i - 1], tangents[i]);
            if let Some(axis) = try_normalize(&prev.cross(&cur)) {
                let angle = prev.dot(&cur).clamp(-1.0, 1.0).acos();
                normal = rotate_vector(&normal, &axis, angle);
            }
            // Re-orthogonalize against drift
            normal = try_normalize(&(normal - cur * normal.dot(&cur)))
                .unwrap_or_else(|| any_perpendicular(&cur));
        }
        let tangent = tangents[i];
        frames.push(PathFrame {
            origin: points[i],
            tangent,
            normal,
            binormal: tangent.cross(&normal),
        });
    }
    Ok(frames)
}

impl PathFrame {
    fn place(&self, p: &Point2<f64>) -> Point3<f64> {
        self.origin + self.normal * p.x + self.binormal * p.y
    }

    fn direction(&self, x: f64, y: f64) -> Vector3<f64> {
        self.normal * x + self.binormal * y
    }
}

/// Sweep a closed 2D profile along `path`, capping both ends
pub fn sweep(profile: &[Point2<f64>], path: &[Point3<f64>]) -> Result<Mesh, OperatorError> {
    let profile = prepare_profile(profile, 3)?;
    let frames = rotation_minimizing_frames(path)?;

    let n = profile.len();
    let m = frames.len();
    let mut mesh = Mesh::with_capacity(2 * n * m + 2 * n, 2 * n * m);

    for i in 0..n {
        let (p, q) = (profile[i], profile[(i + 1) % n]);
        let face = edge_outward(&p, &q);
        let base = mesh.vertex_count() as u32;
        for frame in &frames {
            let normal = frame.direction(face.x, face.y);
            mesh.add_vertex_with_normal(frame.place(&p), normal);
            mesh.add_vertex_with_normal(frame.place(&q), normal);
        }
        for k in 0..m - 1 {
            let k = k as u32;
            let quad = [base + 2 * k, base + 2 * k + 1, base + 2 * k + 3, base + 2 * k + 2];
            let outward = frames[k as usize].direction(face.x, face.y)
                + frames[k as usize + 1].direction(face.x, face.y);
            mesh.add_quad_indexed_facing(quad, &outward);
        }
    }

    let (first, last) = (&frames[0], &frames[m - 1]);
    let start: Vec<Point3<f64>> = profile.iter().map(|p| first.place(p)).collect();
    let end: Vec<Point3<f64>> = profile.iter().map(|p| last.place(p)).collect();
    add_cap(&mut mesh, &start, &profile, &-first.tangent)?;
    add_cap(&mut mesh, &end, &profile, &last.tangent)?;
    Ok(mesh)
}

/// Parameters of a helical tube
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Helix {
    pub radius: f64,
    /// Rise per turn along +Y
    pub pitch: f64,
    pub turns: f64,
    pub tube_radius: f64,
    pub center: Point3<f64>,
    /// Path steps per turn
    pub segments: u32,
}

/// Centerline of a helix starting at `center + (radius, 0, 0)`
pub fn helix_path(helix: &Helix) -> Vec<Point3<f64>> {
    let steps = ((helix.segments.max(3) as f64) * helix.turns.abs()).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|i| {
            let t = i as f64 / steps as f64;
            let theta = TAU * helix.turns * t;
            helix.center
                + Vector3::new(
                    helix.radius * theta.cos(),
                    helix.pitch * helix.turns * t,
                    helix.radius * theta.sin(),
                )
        })
        .collect()
}

/// Circular tube swept along a helix
pub fn helix(helix: &Helix) -> Result<Mesh, OperatorError> {
    for (name, value) in [
        ("radius", helix.radius),
        ("pitch", helix.pitch),
        ("turns", helix.turns),
        ("tube_radius", helix.tube_radius),
    ] {
        if !value.is_finite() {
            return Err(OperatorError::NonFinite(name));
        }
    }
    let tube: Vec<Point2<f64>> = (0..TUBE_SEGMENTS)
        .map(|i| {
            let a = TAU * i as f64 / TUBE_SEGMENTS as f64;
            Point2::new(helix.tube_radius * a.cos(), helix.tube_radius * a.sin())
        })
        .collect();
    sweep(&tube, &helix_path(helix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh_utils::is_watertight;
    use approx::assert_relative_eq;

    fn unit_square() -> Vec<Point2<f64>> {
        vec![
            Point2::new(-0.5, -0.5),
            Point2::new(0.5, -0.5),
            Point2::new(0.5, 0.5),
            Point2::new(-0.5, 0.5),
        ]
    }

    #[test]
    fn test_straight_sweep_is_a_prism() {
        let path = [Point3::origin(), Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 3.0, 0.0)];
        let mesh = sweep(&unit_square(), &path).unwrap();
        assert_relative_eq!(mesh.signed_volume(), 3.0, epsilon = 1e-9);
        assert!(is_watertight(&mesh, 1e-9));
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.min.y, 0.0);
        assert_relative_eq!(bbox.max.y, 3.0);
    }

    #[test]
    fn test_frames_stay_orthonormal_around_bend() {
        let path = [
            Point3::origin(),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
            Point3::new(2.5, 1.5, 0.5),
        ];
        let frames = rotation_minimizing_frames(&path).unwrap();
        assert_eq!(frames.len(), 4);
        for f in &frames {
            assert_relative_eq!(f.tangent.norm(), 1.0, epsilon = 1e-12);
            assert_relative_eq!(f.normal.norm(), 1.0, epsilon = 1e-12);
            assert!(f.tangent.dot(&f.normal).abs() < 1e-9);
            assert!(f.binormal.dot(&f.normal).abs() < 1e-9);
        }
    }

    #[test]
    fn test_bent_sweep_is_closed() {
        let path = [
            Point3::origin(),
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(2.0, 4.0, 0.0),
        ];
        let mesh = sweep(&unit_square(), &path).unwrap();
        assert!(is_watertight(&mesh, 1e-9));
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn test_path_needs_two_points() {
        let err = sweep(&unit_square(), &[Point3::origin(), Point3::origin()]).unwrap_err();
        assert_eq!(err, OperatorError::PathTooShort(1));
    }

    #[test]
    fn test_helix_bounds() {
        let spec = Helix {
            radius: 2.0,
            pitch: 1.0,
            turns: 3.0,
            tube_radius: 0.2,
            center: Point3::origin(),
            segments: 24,
        };
        let path = helix_path(&spec);
        assert_eq!(path.len(), 73);
        assert_relative_eq!(path[72].y, 3.0, epsilon = 1e-12);

        let mesh = helix(&spec).unwrap();
        assert!(!mesh.has_non_finite());
        assert!(is_watertight(&mesh, 1e-9));
        let bbox = mesh.bounding_box();
        assert!(bbox.max.x > 2.1 && bbox.max.x < 2.25);
        assert!(mesh.signed_volume() > 0.0);
    }
}
