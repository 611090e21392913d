// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Rigid and scaling transforms

use crate::error::OperatorError;
use crate::geometry::{Mesh, Primitive};
use crate::utils::math::{is_finite3, rotate_point, rotate_vector, try_normalize};
use nalgebra::{Matrix4, Point3, Vector3};

/// Transform operation
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOp {
    Translate(Vector3<f64>),
    /// Axis, angle in degrees, pivot
    Rotate(Vector3<f64>, f64, Point3<f64>),
    /// Per-axis factors about a pivot
    Scale(Vector3<f64>, Point3<f64>),
}

impl TransformOp {
    /// Convert to transformation matrix
    pub fn to_matrix(&self) -> Result<Matrix4<f64>, OperatorError> {
        match self {
            TransformOp::Translate(v) => {
                if !is_finite3(v) {
                    return Err(OperatorError::NonFinite("offset"));
                }
                Ok(Matrix4::new_translation(v))
            }
            TransformOp::Rotate(axis, angle, pivot) => {
                let axis = try_normalize(axis).ok_or(OperatorError::ZeroAxis)?;
                if !angle.is_finite() {
                    return Err(OperatorError::NonFinite("angle"));
                }
                let rotation = Matrix4::from_axis_angle(
                    &nalgebra::Unit::new_unchecked(axis),
                    angle.to_radians(),
                );
                Ok(about(pivot, rotation))
            }
            TransformOp::Scale(factor, pivot) => {
                if !is_finite3(factor) {
                    return Err(OperatorError::NonFinite("factor"));
                }
                if factor.iter().any(|f| f.abs() < f64::EPSILON) {
                    return Err(OperatorError::ZeroScale);
                }
                Ok(about(pivot, Matrix4::new_nonuniform_scaling(factor)))
            }
        }
    }
}

fn about(pivot: &Point3<f64>, m: Matrix4<f64>) -> Matrix4<f64> {
    Matrix4::new_translation(&pivot.coords) * m * Matrix4::new_translation(&-pivot.coords)
}

/// Apply a transform to a mesh in place
pub fn apply(mesh: &mut Mesh, op: &TransformOp) -> Result<(), OperatorError> {
    match op {
        TransformOp::Translate(offset) => {
            if !is_finite3(offset) {
                return Err(OperatorError::NonFinite("offset"));
            }
            mesh.translate(offset);
        }
        TransformOp::Rotate(axis, angle, pivot) => {
            let axis = try_normalize(axis).ok_or(OperatorError::ZeroAxis)?;
            if !angle.is_finite() {
                return Err(OperatorError::NonFinite("angle"));
            }
            let radians = angle.to_radians();
            mesh.map(
                |p| rotate_point(p, pivot, &axis, radians),
                |n| rotate_vector(n, &axis, radians),
            );
        }
        TransformOp::Scale(..) => {
            let matrix = op.to_matrix()?;
            mesh.transform(&matrix);
        }
    }
    Ok(())
}

/// Logical shape after the transform, when it is still a primitive.
/// Rotations never are; scaling keeps boxes, round shapes only when their
/// cross-section stays circular.
pub fn transform_primitive(primitive: &Primitive, op: &TransformOp) -> Option<Primitive> {
    match op {
        TransformOp::Translate(offset) => {
            let mut moved = primitive.clone();
            moved.translate(offset);
            Some(moved)
        }
        TransformOp::Rotate(..) => None,
        TransformOp::Scale(factor, pivot) => {
            let scale_point = |c: &Point3<f64>| pivot + (c - pivot).component_mul(factor);
            let f = factor.abs();
            let uniform_xz = (f.x - f.z).abs() < 1e-12;
            match primitive {
                Primitive::Box { size, center } => Some(Primitive::Box {
                    size: size.component_mul(&f),
                    center: scale_point(center),
                }),
                Primitive::Cylinder {
                    radius,
                    height,
                    center,
                    segments,
                } if uniform_xz => Some(Primitive::Cylinder {
                    radius: radius * f.x,
                    height: height * f.y,
                    center: scale_point(center),
                    segments: *segments,
                }),
                Primitive::Cone {
                    radius,
                    radius_top,
                    height,
                    center,
                    segments,
                } if uniform_xz && factor.y > 0.0 => Some(Primitive::Cone {
                    radius: radius * f.x,
                    radius_top: radius_top * f.x,
                    height: height * f.y,
                    center: scale_point(center),
                    segments: *segments,
                }),
                Primitive::Sphere {
                    radius,
                    center,
                    segments,
                    rings,
                } if uniform_xz && (f.x - f.y).abs() < 1e-12 => Some(Primitive::Sphere {
                    radius: radius * f.x,
                    center: scale_point(center),
                    segments: *segments,
                    rings: *rings,
                }),
                _ => None,
            }
        }
    }
}
