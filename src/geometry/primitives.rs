// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometric primitives generator
//!
//! All solids are centered on `center` with +Y as the up axis. Every
//! generated mesh is closed, wound counter-clockwise seen from outside and
//! carries vertex normals.

use super::Mesh;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::{PI, TAU};

/// Default number of circumferential segments
pub const DEFAULT_SEGMENTS: u32 = 32;
/// Default number of latitudinal bands on a sphere
pub const DEFAULT_RINGS: u32 = 16;

const MIN_SEGMENTS: u32 = 3;
const MIN_RINGS: u32 = 2;

/// Geometric primitives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Primitive {
    Box {
        size: Vector3<f64>,
        center: Point3<f64>,
    },
    Cylinder {
        radius: f64,
        height: f64,
        center: Point3<f64>,
        segments: u32,
    },
    Sphere {
        radius: f64,
        center: Point3<f64>,
        segments: u32,
        rings: u32,
    },
    Cone {
        radius: f64,
        #[serde(default, rename = "radiusTop")]
        radius_top: f64,
        height: f64,
        center: Point3<f64>,
        segments: u32,
    },
}

impl Primitive {
    pub fn cube(size: Vector3<f64>, center: Point3<f64>) -> Self {
        Self::Box { size, center }
    }

    pub fn cylinder(radius: f64, height: f64, center: Point3<f64>) -> Self {
        Self::Cylinder {
            radius,
            height,
            center,
            segments: DEFAULT_SEGMENTS,
        }
    }

    pub fn sphere(radius: f64, center: Point3<f64>) -> Self {
        Self::Sphere {
            radius,
            center,
            segments: DEFAULT_SEGMENTS,
            rings: DEFAULT_RINGS,
        }
    }

    pub fn cone(radius: f64, height: f64, center: Point3<f64>) -> Self {
        Self::Cone {
            radius,
            radius_top: 0.0,
            height,
            center,
            segments: DEFAULT_SEGMENTS,
        }
    }

    /// Short lowercase name of the shape
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Box { .. } => "box",
            Self::Cylinder { .. } => "cylinder",
            Self::Sphere { .. } => "sphere",
            Self::Cone { .. } => "cone",
        }
    }

    pub fn center(&self) -> Point3<f64> {
        match self {
            Self::Box { center, .. }
            | Self::Cylinder { center, .. }
            | Self::Sphere { center, .. }
            | Self::Cone { center, .. } => *center,
        }
    }

    /// Move the logical center
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        match self {
            Self::Box { center, .. }
            | Self::Cylinder { center, .. }
            | Self::Sphere { center, .. }
            | Self::Cone { center, .. } => *center += offset,
        }
    }

    /// All dimensions finite and the center finite
    pub fn is_finite(&self) -> bool {
        let center_ok = self.center().coords.iter().all(|c| c.is_finite());
        let dims_ok = match self {
            Self::Box { size, .. } => size.iter().all(|c| c.is_finite()),
            Self::Cylinder { radius, height, .. } => radius.is_finite() && height.is_finite(),
            Self::Sphere { radius, .. } => radius.is_finite(),
            Self::Cone {
                radius,
                radius_top,
                height,
                ..
            } => radius.is_finite() && radius_top.is_finite() && height.is_finite(),
        };
        center_ok && dims_ok
    }

    pub fn to_mesh(&self) -> Mesh {
        match self {
            Self::Box { size, center } => box_mesh(*size, *center),
            Self::Cylinder {
                radius,
                height,
                center,
                segments,
            } => cylinder_mesh(*radius, *height, *center, *segments),
            Self::Sphere {
                radius,
                center,
                segments,
                rings,
            } => sphere_mesh(*radius, *center, *segments, *rings),
            Self::Cone {
                radius,
                radius_top,
                height,
                center,
                segments,
            } => frustum_mesh(*radius, *radius_top, *height, *center, *segments),
        }
    }
}

/// Axis-aligned box: 8 shared vertices, 12 triangles
pub fn box_mesh(size: Vector3<f64>, center: Point3<f64>) -> Mesh {
    let h = size.abs() / 2.0;
    let mut mesh = Mesh::with_capacity(8, 12);

    // 8 corners, bit pattern (x, y, z) = (-,-,-) .. (+,+,+)
    let corners = [
        (-1.0, -1.0, -1.0),
        (1.0, -1.0, -1.0),
        (1.0, 1.0, -1.0),
        (-1.0, 1.0, -1.0),
        (-1.0, -1.0, 1.0),
        (1.0, -1.0, 1.0),
        (1.0, 1.0, 1.0),
        (-1.0, 1.0, 1.0),
    ];
    for (sx, sy, sz) in corners {
        mesh.add_vertex(center + Vector3::new(sx * h.x, sy * h.y, sz * h.z));
    }

    let faces: [[u32; 3]; 12] = [
        // Front (z+)
        [4, 5, 6],
        [4, 6, 7],
        // Back (z-)
        [1, 0, 3],
        [1, 3, 2],
        // Right (x+)
        [5, 1, 2],
        [5, 2, 6],
        // Left (x-)
        [0, 4, 7],
        [0, 7, 3],
        // Top (y+)
        [7, 6, 2],
        [7, 2, 3],
        // Bottom (y-)
        [0, 1, 5],
        [0, 5, 4],
    ];
    for [a, b, c] in faces {
        mesh.add_triangle(a, b, c);
    }

    mesh.recompute_normals();
    mesh
}

/// Cylinder along +Y
pub fn cylinder_mesh(radius: f64, height: f64, center: Point3<f64>, segments: u32) -> Mesh {
    frustum_mesh(radius, radius, height, center, segments)
}

/// Cone with its base at the bottom and the apex on top
pub fn cone_mesh(radius: f64, height: f64, center: Point3<f64>, segments: u32) -> Mesh {
    frustum_mesh(radius, 0.0, height, center, segments)
}

/// Truncated cone along +Y; a zero top radius collapses the top ring to an apex
pub fn frustum_mesh(
    radius_bottom: f64,
    radius_top: f64,
    height: f64,
    center: Point3<f64>,
    segments: u32,
) -> Mesh {
    let segments = segments.max(MIN_SEGMENTS);
    let half = height.abs() / 2.0;
    let rb = radius_bottom.abs();
    let rt = radius_top.abs();
    let n = segments as usize;
    let mut mesh = Mesh::with_capacity(2 * n + 2, 4 * n);

    let ring = |r: f64, y: f64, j: u32| {
        let theta = TAU * j as f64 / segments as f64;
        center + Vector3::new(r * theta.cos(), y, r * theta.sin())
    };

    let bottom_center = mesh.add_vertex(center + Vector3::new(0.0, -half, 0.0));
    let bottom: Vec<u32> = (0..segments)
        .map(|j| mesh.add_vertex(ring(rb, -half, j)))
        .collect();

    if rt <= f64::EPSILON {
        let apex = mesh.add_vertex(center + Vector3::new(0.0, half, 0.0));
        for j in 0..n {
            let next = (j + 1) % n;
            mesh.add_triangle(apex, bottom[next], bottom[j]);
        }
    } else {
        let top_center = mesh.add_vertex(center + Vector3::new(0.0, half, 0.0));
        let top: Vec<u32> = (0..segments)
            .map(|j| mesh.add_vertex(ring(rt, half, j)))
            .collect();
        for j in 0..n {
            let next = (j + 1) % n;
            // Top cap
            mesh.add_triangle(top_center, top[next], top[j]);
            // Side
            mesh.add_triangle(top[j], top[next], bottom[j]);
            mesh.add_triangle(top[next], bottom[next], bottom[j]);
        }
    }

    // Bottom cap
    for j in 0..n {
        let next = (j + 1) % n;
        mesh.add_triangle(bottom_center, bottom[j], bottom[next]);
    }

    mesh.recompute_normals();
    mesh
}

/// UV sphere with single pole vertices
pub fn sphere_mesh(radius: f64, center: Point3<f64>, segments: u32, rings: u32) -> Mesh {
    let segments = segments.max(MIN_SEGMENTS);
    let rings = rings.max(MIN_RINGS);
    let radius = radius.abs();
    let n = segments as usize;
    let mut mesh = Mesh::with_capacity(2 + (rings as usize - 1) * n, 2 * rings as usize * n);

    let north = mesh.add_vertex_with_normal(center + Vector3::y() * radius, Vector3::y());
    let mut bands: Vec<Vec<u32>> = Vec::with_capacity(rings as usize - 1);
    for i in 1..rings {
        let phi = PI * i as f64 / rings as f64;
        let band = (0..segments)
            .map(|j| {
                let theta = TAU * j as f64 / segments as f64;
                let dir = Vector3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
                mesh.add_vertex_with_normal(center + dir * radius, dir)
            })
            .collect();
        bands.push(band);
    }
    let south = mesh.add_vertex_with_normal(center - Vector3::y() * radius, -Vector3::y());

    let first = &bands[0];
    let last = &bands[bands.len() - 1];
    for j in 0..n {
        let next = (j + 1) % n;
        mesh.add_triangle(north, first[next], first[j]);
        mesh.add_triangle(last[j], last[next], south);
    }
    for pair in bands.windows(2) {
        let (upper, lower) = (&pair[0], &pair[1]);
        for j in 0..n {
            let next = (j + 1) % n;
            mesh.add_triangle(upper[j], upper[next], lower[j]);
            mesh.add_triangle(upper[next], lower[next], lower[j]);
        }
    }

    mesh
}

/// Smallest tube radius a torus is built with
pub const MIN_TUBE_RADIUS: f64 = 1e-3;

/// Radii a torus is actually built with: both taken by magnitude, the tube
/// at least [`MIN_TUBE_RADIUS`] and the ring at least as wide as the tube
pub fn torus_radii(major_radius: f64, minor_radius: f64) -> (f64, f64) {
    let small = minor_radius.abs().max(MIN_TUBE_RADIUS);
    (major_radius.abs().max(small), small)
}

/// Torus around the Y axis
pub fn torus_mesh(
    major_radius: f64,
    minor_radius: f64,
    center: Point3<f64>,
    segments: u32,
    tube_segments: u32,
) -> Mesh {
    let segments = segments.max(MIN_SEGMENTS);
    let tube_segments = tube_segments.max(MIN_SEGMENTS);
    let (big, small) = torus_radii(major_radius, minor_radius);
    let (n, m) = (segments as usize, tube_segments as usize);
    let mut mesh = Mesh::with_capacity(n * m, 2 * n * m);

    for j in 0..segments {
        let theta = TAU * j as f64 / segments as f64;
        let radial = Vector3::new(theta.cos(), 0.0, theta.sin());
        for k in 0..tube_segments {
            let v = TAU * k as f64 / tube_segments as f64;
            let normal = radial * v.cos() + Vector3::y() * v.sin();
            let position = center + radial * big + normal * small;
            mesh.add_vertex_with_normal(position, normal);
        }
    }

    let at = |j: usize, k: usize| ((j % n) * m + (k % m)) as u32;
    for j in 0..n {
        for k in 0..m {
            let (a, b, c, d) = (at(j, k), at(j + 1, k), at(j + 1, k + 1), at(j, k + 1));
            mesh.add_triangle(a, c, b);
            mesh.add_triangle(a, d, c);
        }
    }

    mesh.orient_outward();
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh_utils::{is_closed, is_manifold};
    use approx::assert_relative_eq;

    #[test]
    fn test_box_has_8_vertices_36_indices() {
        let mesh = box_mesh(Vector3::new(10.0, 4.0, 2.0), Point3::new(1.0, 2.0, 3.0));
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.indices().len(), 36);
        assert!(mesh.indices().iter().all(|&i| i < 8));
        assert!(is_closed(&mesh));
        assert_relative_eq!(mesh.signed_volume(), 80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_box_bounds_follow_center() {
        let mesh = box_mesh(Vector3::new(2.0, 2.0, 2.0), Point3::new(5.0, 0.0, 0.0));
        let bbox = mesh.bounding_box();
        assert_eq!(bbox.min, Point3::new(4.0, -1.0, -1.0));
        assert_eq!(bbox.max, Point3::new(6.0, 1.0, 1.0));
    }

    #[test]
    fn test_cylinder_is_closed_and_outward() {
        let mesh = cylinder_mesh(5.0, 10.0, Point3::origin(), 32);
        assert!(is_manifold(&mesh), "Cylinder mesh should be manifold");
        assert!(is_closed(&mesh), "Cylinder mesh should be closed");
        // 2 cap centers + 2 rims
        assert_eq!(mesh.vertex_count(), 2 + 2 * 32);
        let exact = PI * 25.0 * 10.0;
        let volume = mesh.signed_volume();
        assert!(volume > 0.0 && volume < exact);
        assert!((volume - exact).abs() / exact < 0.02);
    }

    #[test]
    fn test_cone_is_closed_and_outward() {
        let mesh = cone_mesh(3.0, 6.0, Point3::origin(), 24);
        assert!(is_closed(&mesh));
        assert_eq!(mesh.vertex_count(), 2 + 24);
        assert!(mesh.signed_volume() > 0.0);
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.max.y, 3.0);
        assert_relative_eq!(bbox.min.y, -3.0);
    }

    #[test]
    fn test_frustum_with_top_radius() {
        let mesh = frustum_mesh(3.0, 1.0, 2.0, Point3::origin(), 16);
        assert!(is_closed(&mesh));
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn test_sphere_is_closed_and_outward() {
        let mesh = sphere_mesh(2.0, Point3::new(1.0, 1.0, 1.0), 32, 16);
        assert!(is_closed(&mesh));
        assert_eq!(mesh.vertex_count(), 2 + 15 * 32);
        let exact = 4.0 / 3.0 * PI * 8.0;
        assert!((mesh.signed_volume() - exact).abs() / exact < 0.05);
        for (v, n) in mesh.vertices().iter().zip(mesh.normals().unwrap()) {
            assert_relative_eq!((v - Point3::new(1.0, 1.0, 1.0)).dot(n), 2.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_degenerate_torus_keeps_volume() {
        let mesh = torus_mesh(0.0, 0.0, Point3::origin(), 16, 8);
        assert!(mesh.signed_volume() > 0.0);
        assert!(mesh.vertices().iter().all(|p| p.coords.iter().all(|c| c.is_finite())));
        assert_eq!(torus_radii(0.5, -2.0), (2.0, 2.0));
        assert_eq!(torus_radii(-3.0, 1.0), (3.0, 1.0));
    }

    #[test]
    fn test_torus_volume() {
        let mesh = torus_mesh(3.0, 1.0, Point3::origin(), 48, 24);
        assert!(is_closed(&mesh));
        let exact = 2.0 * PI * PI * 3.0 * 1.0;
        assert!((mesh.signed_volume() - exact).abs() / exact < 0.05);
    }

    #[test]
    fn test_segments_are_clamped() {
        let mesh = cylinder_mesh(1.0, 1.0, Point3::origin(), 0);
        assert_eq!(mesh.vertex_count(), 2 + 2 * 3);
    }

    #[test]
    fn test_primitive_json_tag() {
        let json = serde_json::to_value(Primitive::cube(
            Vector3::new(1.0, 2.0, 3.0),
            Point3::origin(),
        ))
        .unwrap();
        assert_eq!(json["type"], "box");
        assert_eq!(json["size"], serde_json::json!([1.0, 2.0, 3.0]));
    }
}
