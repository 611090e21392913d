// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Hollowing operators
//!
//! Every variant keeps the outer surface, adds an inner surface offset by
//! the wall thickness with reversed winding, and bridges the two wherever a
//! face is left open.

use crate::error::OperatorError;
use crate::geometry::{FaceDirection, Mesh};
use nalgebra::{Point3, Vector3};
use std::f64::consts::{PI, TAU};

/// Largest thickness as a fraction of the limiting dimension
pub const THICKNESS_LIMIT: f64 = 0.9;
/// Default half-angle of a polar opening, in degrees
pub const DEFAULT_OPENING_ANGLE: f64 = 30.0;

/// Thickness used for a box of `size`
pub fn box_thickness(size: &Vector3<f64>, thickness: f64) -> f64 {
    thickness.clamp(0.0, (size.abs() / 2.0).min() * THICKNESS_LIMIT)
}

/// Thickness used for a cylinder
pub fn cylinder_thickness(radius: f64, height: f64, thickness: f64) -> f64 {
    thickness.clamp(0.0, radius.abs().min(height.abs() / 2.0) * THICKNESS_LIMIT)
}

/// Thickness used for a sphere
pub fn sphere_thickness(radius: f64, thickness: f64) -> f64 {
    thickness.clamp(0.0, radius.abs() * THICKNESS_LIMIT)
}

fn check_thickness(thickness: f64) -> Result<(), OperatorError> {
    if thickness.is_finite() {
        Ok(())
    } else {
        Err(OperatorError::NonFinite("thickness"))
    }
}

/// Hollow box with walls of `thickness`; faces in `open_faces` are removed
pub fn shell_box(
    size: &Vector3<f64>,
    center: &Point3<f64>,
    thickness: f64,
    open_faces: &[FaceDirection],
) -> Result<Mesh, OperatorError> {
    check_thickness(thickness)?;
    let t = box_thickness(size, thickness);
    let h = size.abs() / 2.0;
    let is_open = |face: FaceDirection| open_faces.contains(&face);

    // Inner cavity bounds, reaching the outer bound on open sides
    let mut inner_min = -h + Vector3::repeat(t);
    let mut inner_max = h - Vector3::repeat(t);
    for face in FaceDirection::ALL {
        if is_open(face) {
            let axis = face.axis();
            if face.sign() > 0.0 {
                inner_max[axis] = h[axis];
            } else {
                inner_min[axis] = -h[axis];
            }
        }
    }

    let mut mesh = Mesh::with_capacity(6 * 16, 6 * 8);
    for face in FaceDirection::ALL {
        let axis = face.axis();
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        let normal = face.normal();
        let rect = |plane: f64, (u0, u1): (f64, f64), (v0, v1): (f64, f64)| {
            [(u0, v0), (u1, v0), (u1, v1), (u0, v1)].map(|(pu, pv)| {
                let mut p = Vector3::zeros();
                p[axis] = plane;
                p[u] = pu;
                p[v] = pv;
                center + p
            })
        };
        let outer_plane = face.sign() * h[axis];
        let outer_u = (-h[u], h[u]);
        let outer_v = (-h[v], h[v]);
        let inner_u = (inner_min[u], inner_max[u]);
        let inner_v = (inner_min[v], inner_max[v]);

        if is_open(face) {
            // Rim between the outer outline and the cavity opening, one
            // trapezoid per side; sides flush with an adjacent opening vanish
            let outer = rect(outer_plane, outer_u, outer_v);
            let inner = rect(outer_plane, inner_u, inner_v);
            for i in 0..4 {
                let k = (i + 1) % 4;
                let corners = [outer[i], outer[k], inner[k], inner[i]];
                if quad_area(&corners) > f64::EPSILON {
                    mesh.add_quad_facing(corners, &normal);
                }
            }
        } else {
            mesh.add_quad_facing(rect(outer_plane, outer_u, outer_v), &normal);
            let inner_plane = if face.sign() > 0.0 {
                inner_max[axis]
            } else {
                inner_min[axis]
            };
            mesh.add_quad_facing(rect(inner_plane, inner_u, inner_v), &-normal);
        }
    }

    Ok(mesh)
}

fn quad_area(corners: &[Point3<f64>; 4]) -> f64 {
    let [a, b, c, d] = corners;
    ((b - a).cross(&(c - a)).norm() + (c - a).cross(&(d - a)).norm()) / 2.0
}

/// Hollow cylinder along +Y; open ends become annular rims
pub fn shell_cylinder(
    radius: f64,
    height: f64,
    center: &Point3<f64>,
    segments: u32,
    thickness: f64,
    open_top: bool,
    open_bottom: bool,
) -> Result<Mesh, OperatorError> {
    check_thickness(thickness)?;
    let t = cylinder_thickness(radius, height, thickness);
    let (r, half) = (radius.abs(), height.abs() / 2.0);
    let ri = r - t;
    let top_inner = if open_top { half } else { half - t };
    let bottom_inner = if open_bottom { -half } else { -half + t };
    let n = segments.max(3) as usize;

    let ring = |radius: f64, y: f64| -> Vec<Point3<f64>> {
        (0..n)
            .map(|j| {
                let theta = TAU * j as f64 / n as f64;
                center + Vector3::new(radius * theta.cos(), y, radius * theta.sin())
            })
            .collect()
    };
    let radial = |j: usize| {
        let theta = TAU * (j as f64 + 0.5) / n as f64;
        Vector3::new(theta.cos(), 0.0, theta.sin())
    };

    let mut mesh = Mesh::new();
    let wall = |mesh: &mut Mesh, lower: &[Point3<f64>], upper: &[Point3<f64>], sign: f64| {
        for j in 0..n {
            let k = (j + 1) % n;
            mesh.add_quad_facing([lower[j], lower[k], upper[k], upper[j]], &(radial(j) * sign));
        }
    };
    wall(&mut mesh, &ring(r, -half), &ring(r, half), 1.0);
    wall(&mut mesh, &ring(ri, bottom_inner), &ring(ri, top_inner), -1.0);

    for (y_outer, y_inner, open, up) in [
        (half, top_inner, open_top, Vector3::y()),
        (-half, bottom_inner, open_bottom, -Vector3::y()),
    ] {
        let outer = ring(r, y_outer);
        if open {
            let inner = ring(ri, y_outer);
            for j in 0..n {
                let k = (j + 1) % n;
                mesh.add_quad_facing([inner[j], outer[j], outer[k], inner[k]], &up);
            }
        } else {
            let inner = ring(ri, y_inner);
            let hub_outer = center + Vector3::new(0.0, y_outer, 0.0);
            let hub_inner = center + Vector3::new(0.0, y_inner, 0.0);
            for j in 0..n {
                let k = (j + 1) % n;
                mesh.add_triangle_facing([hub_outer, outer[j], outer[k]], &up);
                mesh.add_triangle_facing([hub_inner, inner[j], inner[k]], &-up);
            }
        }
    }

    Ok(mesh)
}

/// Hollow sphere, optionally opened around either pole by
/// `opening_angle` degrees
#[allow(clippy::too_many_arguments)]
pub fn shell_sphere(
    radius: f64,
    center: &Point3<f64>,
    segments: u32,
    rings: u32,
    thickness: f64,
    open_top: bool,
    open_bottom: bool,
    opening_angle: f64,
) -> Result<Mesh, OperatorError> {
    check_thickness(thickness)?;
    if !opening_angle.is_finite() {
        return Err(OperatorError::NonFinite("opening_angle"));
    }
    let t = sphere_thickness(radius, thickness);
    let r = radius.abs();
    let ri = r - t;
    let opening = opening_angle.to_radians().clamp(0.0, PI / 2.0 - 1e-3);
    let phi_start = if open_top { opening } else { 0.0 };
    let phi_end = if open_bottom { PI - opening } else { PI };
    let n = segments.max(3) as usize;
    let rows = rings.max(2) as usize;

    let dir = |phi: f64, theta: f64| {
        Vector3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin())
    };
    let phi_at = |i: usize| phi_start + (phi_end - phi_start) * i as f64 / rows as f64;
    let theta_at = |j: usize| TAU * j as f64 / n as f64;

    let mut mesh = Mesh::new();
    for (radius, sign) in [(r, 1.0), (ri, -1.0)] {
        let base = mesh.vertex_count() as u32;
        for i in 0..=rows {
            for j in 0..n {
                let d = dir(phi_at(i), theta_at(j));
                mesh.add_vertex_with_normal(center + d * radius, d * sign);
            }
        }
        let at = |i: usize, j: usize| base + (i * n + j % n) as u32;
        for i in 0..rows {
            let phi_mid = (phi_at(i) + phi_at(i + 1)) / 2.0;
            for j in 0..n {
                let outward = dir(phi_mid, TAU * (j as f64 + 0.5) / n as f64) * sign;
                mesh.add_quad_indexed_facing(
                    [at(i, j), at(i, j + 1), at(i + 1, j + 1), at(i + 1, j)],
                    &outward,
                );
            }
        }
    }

    // Conical rims across each opening
    for (open, phi, toward_pole) in [(open_top, phi_at(0), -1.0), (open_bottom, phi_at(rows), 1.0)] {
        if !open {
            continue;
        }
        for j in 0..n {
            let (t0, t1) = (theta_at(j), theta_at((j + 1) % n));
            let (d0, d1) = (dir(phi, t0), dir(phi, t1));
            let tm = TAU * (j as f64 + 0.5) / n as f64;
            // Tangent pointing out of the opening
            let outward = Vector3::new(phi.cos() * tm.cos(), -phi.sin(), phi.cos() * tm.sin())
                * toward_pole;
            mesh.add_quad_facing(
                [center + d0 * ri, center + d0 * r, center + d1 * r, center + d1 * ri],
                &outward,
            );
        }
    }

    Ok(mesh)
}

/// Approximate shell of an arbitrary mesh: the surface is offset inward
/// along its vertex normals and appended with reversed winding. Boundary
/// edges of open meshes are not bridged.
pub fn shell_mesh(mesh: &Mesh, thickness: f64) -> Result<Mesh, OperatorError> {
    check_thickness(thickness)?;
    let mut outer = mesh.clone();
    outer.ensure_normals();
    let normals = outer.normals().map(<[_]>::to_vec).unwrap_or_default();

    let mut inner = Mesh::with_capacity(outer.vertex_count(), outer.triangle_count());
    for (v, n) in outer.vertices().iter().zip(&normals) {
        inner.add_vertex_with_normal(v - n * thickness, -n);
    }
    for [a, b, c] in outer.triangles() {
        inner.add_triangle(a, c, b);
    }

    outer.merge(&inner);
    Ok(outer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh_utils::is_watertight;
    use crate::geometry::primitives::box_mesh;
    use approx::assert_relative_eq;

    #[test]
    fn test_closed_box_shell() {
        let mesh = shell_box(&Vector3::new(2.0, 2.0, 2.0), &Point3::origin(), 0.2, &[]).unwrap();
        assert!(mesh.vertex_count() > 0 && !mesh.indices().is_empty());
        assert!(mesh
            .indices()
            .iter()
            .all(|&i| (i as usize) < mesh.vertex_count()));
        assert_relative_eq!(mesh.signed_volume(), 8.0 - 1.6f64.powi(3), epsilon = 1e-9);
    }

    #[test]
    fn test_open_top_box_shell() {
        let mesh = shell_box(
            &Vector3::new(2.0, 2.0, 2.0),
            &Point3::origin(),
            0.2,
            &[FaceDirection::Top],
        )
        .unwrap();
        assert_relative_eq!(mesh.signed_volume(), 8.0 - 1.6 * 1.8 * 1.6, epsilon = 1e-9);
        assert!(is_watertight(&mesh, 1e-9));
        // No geometry spans the opening
        let mut top_vertices = mesh.vertices().iter().filter(|v| (v.y - 1.0).abs() < 1e-12);
        assert!(top_vertices.clone().count() > 0);
        assert!(top_vertices.all(|v| v.x.abs() > 0.8 - 1e-9 || v.z.abs() > 0.8 - 1e-9));
    }

    #[test]
    fn test_two_adjacent_open_faces() {
        let mesh = shell_box(
            &Vector3::new(2.0, 2.0, 2.0),
            &Point3::origin(),
            0.2,
            &[FaceDirection::Top, FaceDirection::Front],
        )
        .unwrap();
        assert_relative_eq!(mesh.signed_volume(), 8.0 - 1.6 * 1.8 * 1.8, epsilon = 1e-9);
        assert!(is_watertight(&mesh, 1e-9));
    }

    #[test]
    fn test_box_thickness_clamp() {
        let size = Vector3::new(2.0, 2.0, 2.0);
        assert_relative_eq!(box_thickness(&size, 10.0), 0.9);
        let mesh = shell_box(&size, &Point3::origin(), 10.0, &[]).unwrap();
        assert!(!mesh.has_non_finite());
        assert!(mesh.signed_volume() > 0.0);
    }

    #[test]
    fn test_cylinder_shell() {
        let closed = shell_cylinder(1.0, 2.0, &Point3::origin(), 64, 0.1, false, false).unwrap();
        let polygon = |r: f64| 0.5 * 64.0 * r * r * (TAU / 64.0).sin();
        let expected = polygon(1.0) * 2.0 - polygon(0.9) * 1.8;
        assert_relative_eq!(closed.signed_volume(), expected, epsilon = 1e-9);
        assert!(is_watertight(&closed, 1e-9));

        let open = shell_cylinder(1.0, 2.0, &Point3::origin(), 64, 0.1, true, true).unwrap();
        let expected = (polygon(1.0) - polygon(0.9)) * 2.0;
        assert_relative_eq!(open.signed_volume(), expected, epsilon = 1e-9);
        assert!(is_watertight(&open, 1e-9));
    }

    #[test]
    fn test_sphere_shell() {
        let closed = shell_sphere(1.0, &Point3::origin(), 48, 24, 0.2, false, false, 30.0).unwrap();
        let exact = 4.0 / 3.0 * PI * (1.0 - 0.8f64.powi(3));
        assert!((closed.signed_volume() - exact).abs() / exact < 0.02);

        let open = shell_sphere(1.0, &Point3::origin(), 48, 24, 0.2, true, false, 30.0).unwrap();
        assert!(open.signed_volume() < closed.signed_volume());
        assert!(open.signed_volume() > 0.0);
        assert!(is_watertight(&open, 1e-9));
        // Nothing above the opening rim
        let rim_y = (30.0f64).to_radians().cos();
        assert!(open.vertices().iter().all(|v| v.y <= rim_y + 1e-9));
    }

    #[test]
    fn test_generic_mesh_shell() {
        let source = box_mesh(Vector3::new(2.0, 2.0, 2.0), Point3::origin());
        let mesh = shell_mesh(&source, 0.1).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.triangle_count(), 24);
        let volume = mesh.signed_volume();
        assert!(volume > 0.0 && volume < 8.0);
    }
}
