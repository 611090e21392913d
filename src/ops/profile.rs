// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! 2D profile helpers shared by the sweeping operators
//!
//! Profiles are closed polygons in a local `(u, v)` plane. Operators place
//! them in 3D through a [`ProfileFrame`] and either sweep them along a
//! straight axis ([`prism`]) or along rings and paths of their own.

use crate::error::OperatorError;
use crate::geometry::Mesh;
use crate::utils::math::normalize;
use nalgebra::{Point2, Point3, Vector2, Vector3};

/// Points closer than this are merged when cleaning a profile
const MERGE_DISTANCE: f64 = 1e-9;

/// Profile corner, optionally carrying a smooth shading normal in `(u, v)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfilePoint {
    pub position: Point2<f64>,
    pub normal: Option<Vector2<f64>>,
}

impl ProfilePoint {
    pub fn sharp(u: f64, v: f64) -> Self {
        Self {
            position: Point2::new(u, v),
            normal: None,
        }
    }

    pub fn smooth(u: f64, v: f64, normal: Vector2<f64>) -> Self {
        Self {
            position: Point2::new(u, v),
            normal: Some(normal),
        }
    }
}

/// Drop repeated points and an explicit closing point
pub fn clean_profile(points: &[Point2<f64>]) -> Vec<Point2<f64>> {
    let mut cleaned: Vec<Point2<f64>> = Vec::with_capacity(points.len());
    for p in points {
        if cleaned
            .last()
            .map_or(true, |last| (p - last).norm() > MERGE_DISTANCE)
        {
            cleaned.push(*p);
        }
    }
    while cleaned.len() > 1 && (cleaned[0] - cleaned[cleaned.len() - 1]).norm() <= MERGE_DISTANCE {
        cleaned.pop();
    }
    cleaned
}

/// Shoelace area, positive for counter-clockwise polygons
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum::<f64>()
        / 2.0
}

/// Clean a profile, require `min_points` and make it counter-clockwise
pub fn prepare_profile(
    points: &[Point2<f64>],
    min_points: usize,
) -> Result<Vec<Point2<f64>>, OperatorError> {
    if points
        .iter()
        .any(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        return Err(OperatorError::NonFinite("profile"));
    }
    let mut profile = clean_profile(points);
    if profile.len() < min_points {
        return Err(OperatorError::ProfileTooShort {
            required: min_points,
            provided: profile.len(),
        });
    }
    if signed_area(&profile) < 0.0 {
        profile.reverse();
    }
    Ok(profile)
}

/// Outward normal of the edge `a -> b` of a counter-clockwise polygon
pub fn edge_outward(a: &Point2<f64>, b: &Point2<f64>) -> Vector2<f64> {
    let d = b - a;
    let n = Vector2::new(d.y, -d.x);
    let len = n.norm();
    if len > 0.0 {
        n / len
    } else {
        n
    }
}

/// Triangulate a simple polygon; triangles are counter-clockwise
pub fn triangulate(points: &[Point2<f64>]) -> Result<Vec<[usize; 3]>, OperatorError> {
    if points.len() < 3 {
        return Err(OperatorError::ProfileTooShort {
            required: 3,
            provided: points.len(),
        });
    }
    let flat: Vec<f64> = points.iter().flat_map(|p| [p.x, p.y]).collect();
    let indices = earcutr::earcut(&flat, &[], 2)
        .map_err(|e| OperatorError::Triangulation(format!("{e:?}")))?;
    if indices.is_empty() {
        return Err(OperatorError::Triangulation("polygon has no area".into()));
    }

    Ok(indices
        .chunks_exact(3)
        .map(|t| {
            let [a, b, c] = [t[0], t[1], t[2]];
            let area = (points[b] - points[a]).perp(&(points[c] - points[a]));
            if area < 0.0 {
                [a, c, b]
            } else {
                [a, b, c]
            }
        })
        .collect())
}

/// Add a flat cap over `ring` (the 3D placement of `profile`) facing `outward`
pub fn add_cap(
    mesh: &mut Mesh,
    ring: &[Point3<f64>],
    profile: &[Point2<f64>],
    outward: &Vector3<f64>,
) -> Result<(), OperatorError> {
    let triangles = triangulate(profile)?;
    let normal = normalize(outward);
    let base = mesh.vertex_count() as u32;
    for p in ring {
        mesh.add_vertex_with_normal(*p, normal);
    }
    for [a, b, c] in triangles {
        mesh.add_triangle_indexed_facing(
            [base + a as u32, base + b as u32, base + c as u32],
            &normal,
        );
    }
    Ok(())
}

/// Orthonormal placement of a profile plane: `u`, `v` span the plane and
/// `axis = u x v` is the sweep direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileFrame {
    pub origin: Point3<f64>,
    pub u: Vector3<f64>,
    pub v: Vector3<f64>,
    pub axis: Vector3<f64>,
}

impl ProfileFrame {
    pub fn new(origin: Point3<f64>, u: Vector3<f64>, v: Vector3<f64>) -> Self {
        let u = normalize(&u);
        let v = normalize(&v);
        Self {
            origin,
            u,
            v,
            axis: u.cross(&v),
        }
    }

    pub fn place(&self, p: &Point2<f64>, w: f64) -> Point3<f64> {
        self.origin + self.u * p.x + self.v * p.y + self.axis * w
    }

    pub fn direction(&self, d: &Vector2<f64>) -> Vector3<f64> {
        self.u * d.x + self.v * d.y
    }
}

/// Sweep a counter-clockwise profile straight along the frame axis from
/// `-half_length` to `+half_length` with `layers` subdivisions, capping both
/// ends. Edges between two smooth points are shaded smoothly.
pub fn prism(
    profile: &[ProfilePoint],
    frame: &ProfileFrame,
    half_length: f64,
    layers: u32,
) -> Result<Mesh, OperatorError> {
    let n = profile.len();
    if n < 3 {
        return Err(OperatorError::ProfileTooShort {
            required: 3,
            provided: n,
        });
    }
    let layers = layers.max(1);
    let mut mesh = Mesh::with_capacity(n * 2 * (layers as usize + 1) + 2 * n, 2 * n * (layers as usize + 1));
    let w_at = |k: u32| -half_length + 2.0 * half_length * k as f64 / layers as f64;

    for i in 0..n {
        let (p, q) = (&profile[i], &profile[(i + 1) % n]);
        let face = edge_outward(&p.position, &q.position);
        let (np, nq) = match (p.normal, q.normal) {
            (Some(a), Some(b)) => (a, b),
            _ => (face, face),
        };
        let outward = frame.direction(&face);
        let base = mesh.vertex_count() as u32;
        for k in 0..=layers {
            let w = w_at(k);
            mesh.add_vertex_with_normal(frame.place(&p.position, w), frame.direction(&np));
            mesh.add_vertex_with_normal(frame.place(&q.position, w), frame.direction(&nq));
        }
        for k in 0..layers {
            let a = base + 2 * k;
            let (b, c, d) = (a + 1, a + 3, a + 2);
            mesh.add_quad_indexed_facing([a, b, c, d], &outward);
        }
    }

    let flat: Vec<Point2<f64>> = profile.iter().map(|p| p.position).collect();
    let top: Vec<Point3<f64>> = flat.iter().map(|p| frame.place(p, half_length)).collect();
    let bottom: Vec<Point3<f64>> = flat.iter().map(|p| frame.place(p, -half_length)).collect();
    add_cap(&mut mesh, &top, &flat, &frame.axis)?;
    add_cap(&mut mesh, &bottom, &flat, &-frame.axis)?;

    Ok(mesh)
}
