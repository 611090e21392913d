// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge rounding for boxes
//!
//! A single-edge fillet sweeps the box cross-section, with the corner at the
//! edge replaced by a quarter circle, along the edge. Rounding all edges
//! builds a rounded box: eight sphere octants at the corners joined by
//! quarter cylinders and inset flat faces.

use super::profile::{prism, ProfileFrame, ProfilePoint};
use crate::error::OperatorError;
use crate::geometry::descriptors::box_edge;
use crate::geometry::Mesh;
use nalgebra::{Point3, Vector2, Vector3};
use std::f64::consts::FRAC_PI_2;

/// Largest radius as a fraction of the smallest half extent
pub const RADIUS_LIMIT: f64 = 0.9;
/// Default number of angular segments on the rounded surface
pub const DEFAULT_FILLET_SEGMENTS: u32 = 8;
/// Subdivisions along a filleted edge
pub const LENGTH_SEGMENTS: u32 = 4;

/// Radius actually used for a box of `size`
pub fn effective_radius(size: &Vector3<f64>, radius: f64) -> f64 {
    let max = (size.abs() / 2.0).min() * RADIUS_LIMIT;
    radius.clamp(0.0, max)
}

/// Round one box edge
pub fn fillet_box_edge(
    size: &Vector3<f64>,
    center: &Point3<f64>,
    edge_index: i64,
    radius: f64,
    segments: u32,
) -> Result<Mesh, OperatorError> {
    if !radius.is_finite() {
        return Err(OperatorError::NonFinite("radius"));
    }
    let r = effective_radius(size, radius);
    if r <= 0.0 {
        return Ok(crate::geometry::box_mesh(*size, *center));
    }

    let (edge, _) = box_edge(size, center, edge_index);
    let (n1, n2) = (edge.face_normals[0], edge.face_normals[1]);
    let h = size.abs() / 2.0;
    let a = h.dot(&n1.abs());
    let b = h.dot(&n2.abs());
    let frame = ProfileFrame::new(*center, n1, n2);
    let half_length = h.dot(&frame.axis.abs());

    let segments = segments.max(1);
    let mut profile = vec![ProfilePoint::sharp(-a, -b), ProfilePoint::sharp(a, -b)];
    for k in 0..=segments {
        let angle = FRAC_PI_2 * k as f64 / segments as f64;
        let (sin, cos) = angle.sin_cos();
        profile.push(ProfilePoint::smooth(
            a - r + r * cos,
            b - r + r * sin,
            Vector2::new(cos, sin),
        ));
    }
    profile.push(ProfilePoint::sharp(-a, b));

    prism(&profile, &frame, half_length, LENGTH_SEGMENTS)
}

/// Round all twelve edges of a box
pub fn fillet_box_all(
    size: &Vector3<f64>,
    center: &Point3<f64>,
    radius: f64,
    segments: u32,
) -> Result<Mesh, OperatorError> {
    if !radius.is_finite() {
        return Err(OperatorError::NonFinite("radius"));
    }
    let r = effective_radius(size, radius);
    if r <= 0.0 {
        return Ok(crate::geometry::box_mesh(*size, *center));
    }

    let m = segments.max(1) as usize;
    let inner = size.abs() / 2.0 - Vector3::repeat(r);
    // Quadrant sign patterns in (x, z), in order of increasing azimuth
    const QUADRANTS: [(f64, f64); 4] = [(1.0, 1.0), (-1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];

    let columns = 4 * (m + 1);
    let rows = 2 * (m + 1);
    let mut mesh = Mesh::with_capacity(rows * columns + 8, 2 * rows * columns + 4);

    let mut directions = Vec::with_capacity(rows * columns);
    for row in 0..rows {
        let (hemisphere, local) = (row / (m + 1), row % (m + 1));
        let phi = FRAC_PI_2 * (hemisphere as f64 + local as f64 / m as f64);
        let sy = if hemisphere == 0 { 1.0 } else { -1.0 };
        for column in 0..columns {
            let (quadrant, local) = (column / (m + 1), column % (m + 1));
            let theta = FRAC_PI_2 * (quadrant as f64 + local as f64 / m as f64);
            let dir = Vector3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            let (sx, sz) = QUADRANTS[quadrant];
            let corner = Vector3::new(sx * inner.x, sy * inner.y, sz * inner.z);
            mesh.add_vertex_with_normal(center + corner + dir * r, dir);
            directions.push(dir);
        }
    }

    let at = |row: usize, column: usize| (row * columns + column % columns) as u32;
    for row in 0..rows - 1 {
        for column in 0..columns {
            let quad = [
                at(row, column),
                at(row, column + 1),
                at(row + 1, column + 1),
                at(row + 1, column),
            ];
            let outward = directions[row * columns + column]
                + directions[row * columns + (column + 1) % columns]
                + directions[(row + 1) * columns + column]
                + directions[(row + 1) * columns + (column + 1) % columns];
            mesh.add_quad_indexed_facing(quad, &outward);
        }
    }

    // Flat top and bottom faces span the pole rows
    for (sy, outward) in [(1.0, Vector3::y()), (-1.0, -Vector3::y())] {
        let y = sy * (inner.y + r);
        let corners = QUADRANTS.map(|(sx, sz)| center + Vector3::new(sx * inner.x, y, sz * inner.z));
        mesh.add_quad_facing(corners, &outward);
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh_utils::is_watertight;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_single_edge_fillet_volume() {
        let size = Vector3::new(2.0, 2.0, 2.0);
        let r = 0.3;
        let mesh = fillet_box_edge(&size, &Point3::origin(), 0, r, 64).unwrap();
        // One corner of the cross-section loses (1 - pi/4) r^2 along the edge
        let expected = 8.0 - (1.0 - PI / 4.0) * r * r * 2.0;
        assert_relative_eq!(mesh.signed_volume(), expected, epsilon = 1e-3);
        assert!(is_watertight(&mesh, 1e-9));
        assert!(mesh.vertex_count() > 8);
    }

    #[test]
    fn test_huge_radius_is_clamped() {
        let size = Vector3::new(2.0, 4.0, 6.0);
        let mesh = fillet_box_edge(&size, &Point3::origin(), 5, 1000.0, 8).unwrap();
        assert!(!mesh.has_non_finite());
        assert_relative_eq!(effective_radius(&size, 1000.0), 0.9);
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.max.y, 2.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.min.x, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_every_edge_rounds_its_own_corner() {
        let size = Vector3::new(2.0, 2.0, 2.0);
        for index in 0..12 {
            let mesh = fillet_box_edge(&size, &Point3::origin(), index, 0.5, 16).unwrap();
            assert!(mesh.signed_volume() < 8.0 - 1e-3, "edge {index}");
            assert!(mesh.signed_volume() > 7.5, "edge {index}");
            // The filleted edge's midpoint is no longer on the surface
            let (edge, _) = box_edge(&size, &Point3::origin(), index);
            let m = edge.midpoint();
            assert!(mesh
                .vertices()
                .iter()
                .all(|v| (v - m).norm() > 0.1), "edge {index}");
        }
    }

    #[test]
    fn test_zero_radius_returns_box() {
        let mesh = fillet_box_edge(&Vector3::new(1.0, 1.0, 1.0), &Point3::origin(), 0, 0.0, 8).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
    }

    #[test]
    fn test_rounded_box_volume() {
        let size = Vector3::new(2.0, 3.0, 4.0);
        let r = 0.5;
        let mesh = fillet_box_all(&size, &Point3::new(1.0, 0.0, -1.0), r, 24).unwrap();
        let (a, b, c) = (2.0 - 2.0 * r, 3.0 - 2.0 * r, 4.0 - 2.0 * r);
        let expected = a * b * c
            + 2.0 * r * (a * b + b * c + a * c)
            + PI * r * r * (a + b + c)
            + 4.0 / 3.0 * PI * r * r * r;
        assert!((mesh.signed_volume() - expected).abs() / expected < 0.01);
        assert!(is_watertight(&mesh, 1e-9));
        let bbox = mesh.bounding_box();
        assert_relative_eq!(bbox.min.y, -1.5, epsilon = 1e-9);
        assert_relative_eq!(bbox.max.x, 2.0, epsilon = 1e-9);
    }
}
