// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Pattern operators
//!
//! Each pattern places rigid copies of a source mesh and concatenates them
//! into one mesh. A count below one produces an empty mesh.

use crate::error::OperatorError;
use crate::geometry::Mesh;
use crate::utils::math::{reflect_point, reflect_vector, rotate_point, rotate_vector, try_normalize};
use nalgebra::{Point3, Vector3};

/// Angles within this many degrees of a full turn count as a full turn
const FULL_TURN_TOLERANCE: f64 = 1e-6;

/// Spacing between consecutive copies of a circular pattern, in degrees
pub fn circular_step(angle: f64, count: usize) -> f64 {
    if (angle.abs() - 360.0).abs() < FULL_TURN_TOLERANCE {
        angle / count.max(1) as f64
    } else if count > 1 {
        angle / (count - 1) as f64
    } else {
        0.0
    }
}

fn translated(mesh: &Mesh, offset: &Vector3<f64>) -> Mesh {
    let mut copy = mesh.clone();
    copy.translate(offset);
    copy
}

fn rotated(mesh: &Mesh, center: &Point3<f64>, axis: &Vector3<f64>, angle: f64) -> Mesh {
    let mut copy = mesh.clone();
    copy.map(
        |p| rotate_point(p, center, axis, angle),
        |n| rotate_vector(n, axis, angle),
    );
    copy
}

/// `count` copies spaced by `spacing` along `direction`
pub fn linear_pattern(
    mesh: &Mesh,
    direction: &Vector3<f64>,
    count: usize,
    spacing: f64,
) -> Result<Mesh, OperatorError> {
    let direction = try_normalize(direction).ok_or(OperatorError::ZeroDirection)?;
    if !spacing.is_finite() {
        return Err(OperatorError::NonFinite("spacing"));
    }
    let copies: Vec<Mesh> = (0..count)
        .map(|i| translated(mesh, &(direction * spacing * i as f64)))
        .collect();
    Ok(Mesh::concat(&copies))
}

/// `count` copies rotated about `axis` through `center`, spanning `angle`
/// degrees
pub fn circular_pattern(
    mesh: &Mesh,
    axis: &Vector3<f64>,
    center: &Point3<f64>,
    count: usize,
    angle: f64,
) -> Result<Mesh, OperatorError> {
    let axis = try_normalize(axis).ok_or(OperatorError::ZeroAxis)?;
    if !angle.is_finite() {
        return Err(OperatorError::NonFinite("angle"));
    }
    let step = circular_step(angle, count).to_radians();
    let copies: Vec<Mesh> = (0..count)
        .map(|i| rotated(mesh, center, &axis, step * i as f64))
        .collect();
    Ok(Mesh::concat(&copies))
}

/// Cartesian product of two linear patterns
pub fn grid_pattern(
    mesh: &Mesh,
    (direction1, count1, spacing1): (&Vector3<f64>, usize, f64),
    (direction2, count2, spacing2): (&Vector3<f64>, usize, f64),
) -> Result<Mesh, OperatorError> {
    let row = linear_pattern(mesh, direction1, count1, spacing1)?;
    linear_pattern(&row, direction2, count2, spacing2)
}

/// Reflect across the plane through `point` with normal `normal`,
/// optionally keeping the original alongside the reflection
pub fn mirror(
    mesh: &Mesh,
    normal: &Vector3<f64>,
    point: &Point3<f64>,
    keep_original: bool,
) -> Result<Mesh, OperatorError> {
    let normal = try_normalize(normal).ok_or(OperatorError::ZeroDirection)?;
    let mut mirrored = mesh.clone();
    mirrored.map(
        |p| reflect_point(p, point, &normal),
        |n| reflect_vector(n, &normal),
    );
    // Reflected normals are already outward; only the winding turns
    mirrored.flip_triangles();

    if keep_original {
        let mut result = mesh.clone();
        result.merge(&mirrored);
        Ok(result)
    } else {
        Ok(mirrored)
    }
}

/// Parameters of a spiral pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spiral {
    pub axis: Vector3<f64>,
    pub center: Point3<f64>,
    pub count: usize,
    /// Degrees between consecutive copies
    pub angle: f64,
    /// Offset along the axis per copy
    pub pitch: f64,
    /// Radial offset away from the axis per copy
    pub radius_growth: f64,
}

/// Circular pattern whose copies also climb the axis and move outward
pub fn spiral_pattern(mesh: &Mesh, spiral: &Spiral) -> Result<Mesh, OperatorError> {
    let axis = try_normalize(&spiral.axis).ok_or(OperatorError::ZeroAxis)?;
    for (name, value) in [
        ("angle", spiral.angle),
        ("pitch", spiral.pitch),
        ("radius_growth", spiral.radius_growth),
    ] {
        if !value.is_finite() {
            return Err(OperatorError::NonFinite(name));
        }
    }

    // Radial direction from the axis toward the source
    let offset = mesh.bounding_box().center() - spiral.center;
    let radial = try_normalize(&(offset - axis * offset.dot(&axis)))
        .unwrap_or_else(|| crate::utils::math::any_perpendicular(&axis));

    let copies: Vec<Mesh> = (0..spiral.count)
        .map(|i| {
            let i = i as f64;
            let mut copy = translated(mesh, &(radial * spiral.radius_growth * i));
            copy = rotated(&copy, &spiral.center, &axis, (spiral.angle * i).to_radians());
            copy.translate(&(axis * spiral.pitch * i));
            copy
        })
        .collect();
    Ok(Mesh::concat(&copies))
}
