// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Property tests over primitives, edge descriptors and edge operators

use kcl_engine::geometry::{box_mesh, get_box_edges};
use kcl_engine::ops::fillet::effective_radius;
use kcl_engine::ops::fillet_box_edge;
use kcl_engine::utils::normalize;
use kcl_engine::{parse_script, Kernel};
use nalgebra::{Point3, Vector3};
use proptest::prelude::*;

fn size() -> impl Strategy<Value = Vector3<f64>> {
    (0.01..100.0f64, 0.01..100.0f64, 0.01..100.0f64).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

fn center() -> impl Strategy<Value = Point3<f64>> {
    (-50.0..50.0f64, -50.0..50.0f64, -50.0..50.0f64).prop_map(|(x, y, z)| Point3::new(x, y, z))
}

#[test]
fn test_normalize_zero_vector() {
    let n = normalize(&Vector3::zeros());
    assert_eq!(n, Vector3::zeros());
}

proptest! {
    #[test]
    fn box_has_eight_vertices_and_36_indices(size in size(), center in center()) {
        let mesh = box_mesh(size, center);
        prop_assert_eq!(mesh.vertex_count(), 8);
        prop_assert_eq!(mesh.indices().len(), 36);
        prop_assert!(mesh.indices().iter().all(|&i| i < 8));
    }

    #[test]
    fn normalize_never_produces_nan(x in -1e6..1e6f64, y in -1e6..1e6f64, z in -1e6..1e6f64) {
        let n = normalize(&Vector3::new(x, y, z));
        prop_assert!(n.iter().all(|c| c.is_finite()));
        let norm = n.norm();
        prop_assert!(norm == 0.0 || (norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn box_edges_report_axis_lengths(size in size(), center in center()) {
        let edges = get_box_edges(&size, &center);
        prop_assert_eq!(edges.len(), 12);
        let tolerance = 1e-9 * (1.0 + center.coords.abs().max());
        for (indices, expected) in [
            ([0, 2, 4, 6], size.x),
            ([1, 3, 5, 7], size.z),
            ([8, 9, 10, 11], size.y),
        ] {
            for i in indices {
                prop_assert!((edges[i].length - expected).abs() < tolerance);
            }
        }
    }

    #[test]
    fn oversized_fillet_stays_finite(
        size in size(),
        edge in 0..12i64,
        radius in 0.0..1e4f64,
    ) {
        let applied = effective_radius(&size, radius);
        prop_assert!(applied <= (size / 2.0).min() * 0.9 + 1e-12);

        let mesh = fillet_box_edge(&size, &Point3::origin(), edge, radius, 8).unwrap();
        prop_assert!(mesh
            .vertices()
            .iter()
            .all(|p| p.coords.iter().all(|c| c.is_finite())));
        let bbox = mesh.bounding_box();
        let half = size / 2.0;
        for axis in 0..3 {
            prop_assert!(bbox.max[axis] <= half[axis] * (1.0 + 1e-9));
            prop_assert!(bbox.min[axis] >= -half[axis] * (1.0 + 1e-9));
        }
    }

    #[test]
    fn arbitrary_text_never_panics(source in ".{0,200}") {
        let _ = parse_script(&source);
        let result = Kernel::new().run(&source);
        prop_assert!(result.preview.is_some());
    }
}
