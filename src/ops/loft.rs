// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Loft between horizontal sections stacked along +Y

use super::profile::{add_cap, clean_profile, edge_outward, signed_area};
use crate::error::OperatorError;
use crate::geometry::Mesh;
use nalgebra::{Point2, Point3, Vector2, Vector3};

fn lift(p: &Point2<f64>, height: f64) -> Point3<f64> {
    Point3::new(p.x, height, p.y)
}

fn lift_direction(d: &Vector2<f64>) -> Vector3<f64> {
    Vector3::new(d.x, 0.0, d.y)
}

/// Smallest distance kept between consecutive section heights
pub const MIN_SECTION_GAP: f64 = 1e-3;

/// `heights` pushed apart so each one lies at least [`MIN_SECTION_GAP`]
/// past the previous, in the direction from the first to the last
pub fn separated_heights(heights: &[f64]) -> Vec<f64> {
    let Some((&first, rest)) = heights.split_first() else {
        return Vec::new();
    };
    let rising = rest.last().map_or(true, |&last| last >= first);
    let mut previous = first;
    let mut separated = Vec::with_capacity(heights.len());
    separated.push(first);
    for &height in rest {
        previous = if rising {
            height.max(previous + MIN_SECTION_GAP)
        } else {
            height.min(previous - MIN_SECTION_GAP)
        };
        separated.push(previous);
    }
    separated
}

/// Connect `sections` (each an `[x, z]` polygon) placed at `heights`.
/// Point `i` of one section joins point `i` of the next, so every section
/// needs the same number of points. Coincident or backtracking heights are
/// first spread out with [`separated_heights`].
pub fn loft(sections: &[Vec<Point2<f64>>], heights: &[f64]) -> Result<Mesh, OperatorError> {
    if sections.len() < 2 {
        return Err(OperatorError::TooFewSections(sections.len()));
    }
    if heights.len() != sections.len() {
        return Err(OperatorError::HeightCountMismatch {
            sections: sections.len(),
            heights: heights.len(),
        });
    }
    if heights.iter().any(|h| !h.is_finite())
        || sections
            .iter()
            .flatten()
            .any(|p| !(p.x.is_finite() && p.y.is_finite()))
    {
        return Err(OperatorError::NonFinite("section"));
    }

    let mut sections: Vec<Vec<Point2<f64>>> = sections.iter().map(|s| clean_profile(s)).collect();
    let expected = sections[0].len();
    if expected < 3 {
        return Err(OperatorError::ProfileTooShort {
            required: 3,
            provided: expected,
        });
    }
    if let Some(found) = sections.iter().map(Vec::len).find(|&len| len != expected) {
        return Err(OperatorError::SectionMismatch { expected, found });
    }
    // Reverse all sections together so point correspondence survives
    if signed_area(&sections[0]) < 0.0 {
        for section in &mut sections {
            section.reverse();
        }
    }

    let heights = separated_heights(heights);
    let n = expected;
    let levels = sections.len();
    let mut mesh = Mesh::with_capacity(2 * n * levels + 2 * n, 2 * n * levels);

    for i in 0..n {
        let j = (i + 1) % n;
        let faces: Vec<Vector3<f64>> = sections
            .iter()
            .map(|s| lift_direction(&edge_outward(&s[i], &s[j])))
            .collect();
        let base = mesh.vertex_count() as u32;
        for (level, section) in sections.iter().enumerate() {
            mesh.add_vertex_with_normal(lift(&section[i], heights[level]), faces[level]);
            mesh.add_vertex_with_normal(lift(&section[j], heights[level]), faces[level]);
        }
        for level in 0..levels - 1 {
            let k = level as u32;
            let quad = [base + 2 * k, base + 2 * k + 1, base + 2 * k + 3, base + 2 * k + 2];
            mesh.add_quad_indexed_facing(quad, &(faces[level] + faces[level + 1]));
        }
    }

    let rising = heights[levels - 1] >= heights[0];
    let up = if rising { Vector3::y() } else { -Vector3::y() };
    let bottom: Vec<Point3<f64>> = sections[0].iter().map(|p| lift(p, heights[0])).collect();
    let top: Vec<Point3<f64>> = sections[levels - 1]
        .iter()
        .map(|p| lift(p, heights[levels - 1]))
        .collect();
    add_cap(&mut mesh, &bottom, &sections[0], &-up)?;
    add_cap(&mut mesh, &top, &sections[levels - 1], &up)?;

    mesh.orient_outward();
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::mesh_utils::is_watertight;
    use approx::assert_relative_eq;

    fn square(half: f64) -> Vec<Point2<f64>> {
        vec![
            Point2::new(-half, -half),
            Point2::new(half, -half),
            Point2::new(half, half),
            Point2::new(-half, half),
        ]
    }

    #[test]
    fn test_loft_of_equal_squares_is_a_box() {
        let mesh = loft(&[square(1.0), square(1.0)], &[0.0, 3.0]).unwrap();
        assert_relative_eq!(mesh.signed_volume(), 12.0, epsilon = 1e-9);
        assert!(is_watertight(&mesh, 1e-9));
    }

    #[test]
    fn test_coincident_heights_are_separated() {
        let mesh = loft(&[square(1.0), square(1.0)], &[2.0, 2.0]).unwrap();
        assert_relative_eq!(mesh.signed_volume(), 4.0 * MIN_SECTION_GAP, epsilon = 1e-12);
        assert!(is_watertight(&mesh, 1e-9));

        let rising = separated_heights(&[0.0, 1.0, 0.5, 3.0]);
        for (got, want) in rising.iter().zip([0.0, 1.0, 1.001, 3.0]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        let falling = separated_heights(&[0.0, -2.0, -2.0]);
        for (got, want) in falling.iter().zip([0.0, -2.0, -2.001]) {
            assert_relative_eq!(*got, want, epsilon = 1e-12);
        }
        assert!(separated_heights(&[]).is_empty());
    }

    #[test]
    fn test_loft_frustum_volume() {
        // Square frustum from side 2 to side 1 over height 3
        let mesh = loft(&[square(1.0), square(0.5), square(0.25)], &[0.0, 3.0, 4.0]).unwrap();
        let first = 3.0 / 3.0 * (4.0 + 1.0 + 2.0);
        let second = 1.0 / 3.0 * (1.0 + 0.25 + 0.5);
        assert_relative_eq!(mesh.signed_volume(), first + second, epsilon = 1e-9);
        assert!(is_watertight(&mesh, 1e-9));
        assert_relative_eq!(mesh.bounding_box().max.y, 4.0);
    }

    #[test]
    fn test_clockwise_sections_and_descending_heights() {
        let mut a = square(1.0);
        let mut b = square(0.5);
        a.reverse();
        b.reverse();
        let mesh = loft(&[a, b], &[0.0, -2.0]).unwrap();
        assert!(mesh.signed_volume() > 0.0);
        assert!(is_watertight(&mesh, 1e-9));
    }

    #[test]
    fn test_loft_validation() {
        assert_eq!(
            loft(&[square(1.0)], &[0.0]).unwrap_err(),
            OperatorError::TooFewSections(1)
        );
        assert_eq!(
            loft(&[square(1.0), square(1.0)], &[0.0]).unwrap_err(),
            OperatorError::HeightCountMismatch {
                sections: 2,
                heights: 1
            }
        );
        let triangle = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.0, 1.0),
        ];
        assert_eq!(
            loft(&[square(1.0), triangle], &[0.0, 1.0]).unwrap_err(),
            OperatorError::SectionMismatch {
                expected: 4,
                found: 3
            }
        );
    }
}
