// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge bevels for boxes

use super::profile::{prism, ProfileFrame, ProfilePoint};
use crate::error::OperatorError;
use crate::geometry::descriptors::box_edge;
use crate::geometry::Mesh;
use nalgebra::{Point3, Vector3};

/// Largest single-edge distance as a fraction of the smallest half extent
pub const EDGE_LIMIT: f64 = 0.9;
/// Tighter limit when every edge is beveled, so corner cuts cannot overlap
pub const ALL_EDGES_LIMIT: f64 = 0.45;

/// Distance actually used for a box of `size`
pub fn effective_distance(size: &Vector3<f64>, distance: f64, all_edges: bool) -> f64 {
    let limit = if all_edges { ALL_EDGES_LIMIT } else { EDGE_LIMIT };
    distance.clamp(0.0, (size.abs() / 2.0).min() * limit)
}

/// Bevel one box edge with a flat face at 45 degrees
pub fn chamfer_box_edge(
    size: &Vector3<f64>,
    center: &Point3<f64>,
    edge_index: i64,
    distance: f64,
) -> Result<Mesh, OperatorError> {
    if !distance.is_finite() {
        return Err(OperatorError::NonFinite("distance"));
    }
    let d = effective_distance(size, distance, false);
    if d <= 0.0 {
        return Ok(crate::geometry::box_mesh(*size, *center));
    }

    let (edge, _) = box_edge(size, center, edge_index);
    let (n1, n2) = (edge.face_normals[0], edge.face_normals[1]);
    let h = size.abs() / 2.0;
    let (a, b) = (h.dot(&n1.abs()), h.dot(&n2.abs()));
    let frame = ProfileFrame::new(*center, n1, n2);

    let profile = [
        ProfilePoint::sharp(-a, -b),
        ProfilePoint::sharp(a, -b),
        ProfilePoint::sharp(a, b - d),
        ProfilePoint::sharp(a - d, b),
        ProfilePoint::sharp(-a, b),
    ];
    prism(&profile, &frame, h.dot(&frame.axis.abs()), 1)
}

/// Bevel all twelve edges: six inset faces, twelve bevels, eight corner
/// triangles
pub fn chamfer_box_all(
    size: &Vector3<f64>,
    center: &Point3<f64>,
    distance: f64,
) -> Result<Mesh, OperatorError> {
    if !distance.is_finite() {
        return Err(OperatorError::NonFinite("distance"));
    }
    let d = effective_distance(size, distance, true);
    let h = size.abs() / 2.0;
    if d <= 0.0 {
        return Ok(crate::geometry::box_mesh(*size, *center));
    }

    // Corner (sx, sy, sz) touches face `axis` at this point
    let point = |s: [f64; 3], axis: usize| {
        let mut p = Vector3::zeros();
        for i in 0..3 {
            p[i] = s[i] * if i == axis { h[i] } else { h[i] - d };
        }
        center + p
    };
    let sign = |bit: bool| if bit { 1.0 } else { -1.0 };

    let mut mesh = Mesh::with_capacity(24 * 3, 44);

    // Inset faces
    for axis in 0..3 {
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        for side in [-1.0, 1.0] {
            let corners = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)].map(|(su, sv)| {
                let mut s = [0.0; 3];
                s[axis] = side;
                s[u] = su;
                s[v] = sv;
                point(s, axis)
            });
            let mut outward = Vector3::zeros();
            outward[axis] = side;
            mesh.add_quad_facing(corners, &outward);
        }
    }

    // Bevels along each edge: the edge runs along `axis`
    for axis in 0..3 {
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
            let corner = |along: f64| {
                let mut s = [0.0; 3];
                s[axis] = along;
                s[u] = su;
                s[v] = sv;
                s
            };
            let corners = [
                point(corner(-1.0), u),
                point(corner(1.0), u),
                point(corner(1.0), v),
                point(corner(-1.0), v),
            ];
            let mut outward = Vector3::zeros();
            outward[u] = su;
            outward[v] = sv;
            mesh.add_quad_facing(corners, &outward);
        }
    }

    // Corner triangles
    for bits in 0..8u8 {
        let s = [sign(bits & 1 != 0), sign(bits & 2 != 0), sign(bits & 4 != 0)];
        let outward = Vector3::new(s[0], s[1], s[2]);
        mesh.add_triangle_facing([point(s, 0), point(s, 1), point(s, 2)], &outward);
    }

    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh_utils::is_watertight;
    use approx::assert_relative_eq;

    #[test]
    fn test_single_edge_chamfer_volume() {
        let size = Vector3::new(2.0, 2.0, 2.0);
        let mesh = chamfer_box_edge(&size, &Point3::origin(), 8, 0.4).unwrap();
        // Removes a right prism with legs 0.4 along a length-2 edge
        assert_relative_eq!(mesh.signed_volume(), 8.0 - 0.08 * 2.0, epsilon = 1e-9);
        assert!(is_watertight(&mesh, 1e-9));
    }

    #[test]
    fn test_bevel_normal_is_average_of_faces() {
        let size = Vector3::new(2.0, 2.0, 2.0);
        let mesh = chamfer_box_edge(&size, &Point3::origin(), 0, 0.5).unwrap();
        let (edge, _) = box_edge(&size, &Point3::origin(), 0);
        let expected = (edge.face_normals[0] + edge.face_normals[1]).normalize();
        assert!(mesh
            .normals()
            .unwrap()
            .iter()
            .any(|n| (n - expected).norm() < 1e-9));
    }

    #[test]
    fn test_chamfer_distance_clamps() {
        let size = Vector3::new(2.0, 2.0, 2.0);
        assert_relative_eq!(effective_distance(&size, 5.0, false), 0.9);
        assert_relative_eq!(effective_distance(&size, 5.0, true), 0.45);
        let mesh = chamfer_box_edge(&size, &Point3::origin(), 3, 5.0).unwrap();
        assert!(!mesh.has_non_finite());
    }

    #[test]
    fn test_all_edges_chamfer() {
        let size = Vector3::new(2.0, 2.0, 2.0);
        let d = 0.2;
        let mesh = chamfer_box_all(&size, &Point3::origin(), d).unwrap();
        assert_eq!(mesh.triangle_count(), 6 * 2 + 12 * 2 + 8);
        // Edge prisms between the corner cubes, plus 5/6 of each corner cube
        let expected = 8.0 - 12.0 * d * d * (1.0 - d) - 8.0 * 5.0 / 6.0 * d * d * d;
        assert_relative_eq!(mesh.signed_volume(), expected, epsilon = 1e-9);
        assert!(is_watertight(&mesh, 1e-9));
    }
}
