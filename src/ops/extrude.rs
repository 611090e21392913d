// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Face extrusion on primitives
//!
//! Extruding a face moves it along its normal and grows (or, for negative
//! distances, shrinks) the primitive. The logical primitive is rewritten so
//! later operations on the same id see the new dimensions.

use crate::error::OperatorError;
use crate::geometry::{FaceDirection, Primitive};

/// Smallest extent a face can be pulled back to
pub const MIN_EXTENT: f64 = 1e-3;

/// Result of extruding a primitive face
#[derive(Debug, Clone, PartialEq)]
pub struct Extrusion {
    pub primitive: Primitive,
    /// Distance actually applied after keeping the extent positive
    pub applied: f64,
}

fn grow(extent: f64, distance: f64) -> (f64, f64) {
    let target = (extent + distance).max(MIN_EXTENT);
    (target, target - extent)
}

/// Pull `face` of `primitive` outward by `distance`
pub fn extrude(
    primitive: &Primitive,
    face: FaceDirection,
    distance: f64,
) -> Result<Extrusion, OperatorError> {
    if !distance.is_finite() {
        return Err(OperatorError::NonFinite("distance"));
    }
    let unsupported = || OperatorError::UnsupportedTarget {
        operation: "extrude",
        target: format!("{} face `{}`", primitive.kind(), face),
    };

    let mut result = primitive.clone();
    let applied = match &mut result {
        Primitive::Box { size, center } => {
            let axis = face.axis();
            let (extent, applied) = grow(size[axis].abs(), distance);
            size[axis] = extent;
            center[axis] += face.sign() * applied / 2.0;
            applied
        }
        Primitive::Cylinder { height, center, .. } | Primitive::Cone { height, center, .. } => {
            if !matches!(face, FaceDirection::Top | FaceDirection::Bottom) {
                return Err(unsupported());
            }
            let (extent, applied) = grow(height.abs(), distance);
            *height = extent;
            center.y += face.sign() * applied / 2.0;
            applied
        }
        Primitive::Sphere { .. } => return Err(unsupported()),
    };

    Ok(Extrusion {
        primitive: result,
        applied,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_extrude_box_top() {
        let cube = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), Point3::origin());
        let out = extrude(&cube, FaceDirection::Top, 1.0).unwrap();
        assert_relative_eq!(out.applied, 1.0);
        assert_eq!(
            out.primitive,
            Primitive::cube(Vector3::new(2.0, 3.0, 2.0), Point3::new(0.0, 0.5, 0.0))
        );
        let bbox = out.primitive.to_mesh().bounding_box();
        assert_relative_eq!(bbox.max.y, 2.0);
        assert_relative_eq!(bbox.min.y, -1.0);
    }

    #[test]
    fn test_extrude_box_left_moves_min_face() {
        let cube = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), Point3::origin());
        let out = extrude(&cube, FaceDirection::Left, 0.5).unwrap();
        let bbox = out.primitive.to_mesh().bounding_box();
        assert_relative_eq!(bbox.min.x, -1.5);
        assert_relative_eq!(bbox.max.x, 1.0);
    }

    #[test]
    fn test_negative_extrude_clamps() {
        let cube = Primitive::cube(Vector3::new(2.0, 2.0, 2.0), Point3::origin());
        let out = extrude(&cube, FaceDirection::Front, -5.0).unwrap();
        assert_relative_eq!(out.applied, MIN_EXTENT - 2.0);
        let bbox = out.primitive.to_mesh().bounding_box();
        // The back face stays put
        assert_relative_eq!(bbox.min.z, -1.0, epsilon = 1e-12);
        assert_relative_eq!(bbox.max.z, -1.0 + MIN_EXTENT, epsilon = 1e-12);
    }

    #[test]
    fn test_extrude_cylinder_bottom() {
        let cyl = Primitive::cylinder(1.0, 2.0, Point3::origin());
        let out = extrude(&cyl, FaceDirection::Bottom, 1.0).unwrap();
        match out.primitive {
            Primitive::Cylinder { height, center, .. } => {
                assert_relative_eq!(height, 3.0);
                assert_relative_eq!(center.y, -0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_targets() {
        let cyl = Primitive::cylinder(1.0, 2.0, Point3::origin());
        assert!(matches!(
            extrude(&cyl, FaceDirection::Right, 1.0),
            Err(OperatorError::UnsupportedTarget { .. })
        ));
        let sphere = Primitive::sphere(1.0, Point3::origin());
        assert!(matches!(
            extrude(&sphere, FaceDirection::Top, 1.0),
            Err(OperatorError::UnsupportedTarget { .. })
        ));
    }
}
