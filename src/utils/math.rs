// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Math utilities

use nalgebra::{Point3, Vector3};

/// Lengths below this are treated as zero.
pub const EPSILON: f64 = 1e-12;

/// Normalize a vector, returning the zero vector for zero-length input
pub fn normalize(v: &Vector3<f64>) -> Vector3<f64> {
    let len = v.norm();
    if len > EPSILON && len.is_finite() {
        v / len
    } else {
        Vector3::zeros()
    }
}

/// Normalize a vector, or `None` when it has no direction
pub fn try_normalize(v: &Vector3<f64>) -> Option<Vector3<f64>> {
    let len = v.norm();
    if len > EPSILON && len.is_finite() {
        Some(v / len)
    } else {
        None
    }
}

/// Calculate the (unnormalized) normal of a triangle given three vertices
pub fn triangle_normal(p0: &Point3<f64>, p1: &Point3<f64>, p2: &Point3<f64>) -> Vector3<f64> {
    (p1 - p0).cross(&(p2 - p0))
}

/// Rotate `v` about the unit axis `k` by `angle` radians (Rodrigues' rotation formula)
pub fn rotate_vector(v: &Vector3<f64>, k: &Vector3<f64>, angle: f64) -> Vector3<f64> {
    let (sin, cos) = angle.sin_cos();
    v * cos + k.cross(v) * sin + k * (k.dot(v) * (1.0 - cos))
}

/// Rotate a point about an axis through `center`
pub fn rotate_point(
    p: &Point3<f64>,
    center: &Point3<f64>,
    axis: &Vector3<f64>,
    angle: f64,
) -> Point3<f64> {
    center + rotate_vector(&(p - center), axis, angle)
}

/// Reflect a point across the plane through `origin` with unit normal `n`
pub fn reflect_point(p: &Point3<f64>, origin: &Point3<f64>, n: &Vector3<f64>) -> Point3<f64> {
    p - n * (2.0 * (p - origin).dot(n))
}

/// Reflect a direction across a plane with unit normal `n`
pub fn reflect_vector(v: &Vector3<f64>, n: &Vector3<f64>) -> Vector3<f64> {
    v - n * (2.0 * v.dot(n))
}

/// Any unit vector perpendicular to `v` (which must be non-zero)
pub fn any_perpendicular(v: &Vector3<f64>) -> Vector3<f64> {
    let helper = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    normalize(&v.cross(&helper))
}

/// Check if two floats are approximately equal
pub fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() < epsilon
}

/// Linear interpolation
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Convert degrees to radians
pub fn deg_to_rad(deg: f64) -> f64 {
    deg * std::f64::consts::PI / 180.0
}

/// True if every component is finite
pub fn is_finite3(v: &Vector3<f64>) -> bool {
    v.iter().all(|c| c.is_finite())
}
