// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Boolean operations on meshes
//!
//! The volumetric work is done by a [`VolumetricBoolean`] backend operating
//! on polygon solids. [`BooleanAdapter`] only converts between [`Mesh`]
//! buffers and the backend's representation.

use super::csg::{CsgVertex, Polygon, Solid};
use super::Mesh;
use crate::error::OperatorError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanKind {
    Union,
    Subtract,
    Intersect,
}

impl BooleanKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Union => "union",
            Self::Subtract => "subtract",
            Self::Intersect => "intersect",
        }
    }
}

impl fmt::Display for BooleanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Volumetric boolean evaluator. Implementations must not keep references
/// to the solids they are given.
pub trait VolumetricBoolean: Send + Sync {
    fn evaluate(&self, a: &Solid, b: &Solid, kind: BooleanKind) -> Result<Solid, OperatorError>;
}

/// BSP-tree evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct BspBoolean;

impl VolumetricBoolean for BspBoolean {
    fn evaluate(&self, a: &Solid, b: &Solid, kind: BooleanKind) -> Result<Solid, OperatorError> {
        Ok(match kind {
            BooleanKind::Union => a.union(b),
            BooleanKind::Subtract => a.subtract(b),
            BooleanKind::Intersect => a.intersect(b),
        })
    }
}

/// Converts meshes to and from a backend's solids
pub struct BooleanAdapter {
    backend: Box<dyn VolumetricBoolean>,
}

impl Default for BooleanAdapter {
    fn default() -> Self {
        Self::new(Box::new(BspBoolean))
    }
}

impl fmt::Debug for BooleanAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BooleanAdapter").finish_non_exhaustive()
    }
}

impl BooleanAdapter {
    pub fn new(backend: Box<dyn VolumetricBoolean>) -> Self {
        Self { backend }
    }

    /// Perform boolean operation between two meshes
    pub fn apply(&self, a: &Mesh, b: &Mesh, kind: BooleanKind) -> Result<Mesh, OperatorError> {
        let solid_a = mesh_to_solid(a);
        let solid_b = mesh_to_solid(b);
        let result = self.backend.evaluate(&solid_a, &solid_b, kind)?;
        let mesh = solid_to_mesh(&result);
        mesh.validate()?;
        Ok(mesh)
    }
}

/// Convert mesh to polygons, computing vertex normals when absent.
/// Degenerate triangles are dropped.
pub fn mesh_to_solid(mesh: &Mesh) -> Solid {
    let mut with_normals;
    let source = if mesh.normals().is_some() {
        mesh
    } else {
        with_normals = mesh.clone();
        with_normals.recompute_normals();
        &with_normals
    };
    let normals = source.normals().unwrap_or_default();

    let polygons = source
        .triangles()
        .filter_map(|tri| {
            let vertices = tri
                .iter()
                .map(|&i| {
                    let i = i as usize;
                    CsgVertex::new(source.vertices()[i], normals[i])
                })
                .collect();
            Polygon::new(vertices)
        })
        .collect();
    Solid::from_polygons(polygons)
}

/// Convert polygons back to mesh by fanning each polygon
pub fn solid_to_mesh(solid: &Solid) -> Mesh {
    let mut mesh = Mesh::new();
    for polygon in solid.polygons() {
        let base = mesh.vertex_count() as u32;
        for v in polygon.vertices() {
            mesh.add_vertex_with_normal(v.position, crate::utils::normalize(&v.normal));
        }
        for i in 1..polygon.vertices().len() as u32 - 1 {
            mesh.add_triangle(base, base + i, base + i + 1);
        }
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::primitives::{box_mesh, sphere_mesh};
    use nalgebra::{Point3, Vector3};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_union_volume() {
        let a = box_mesh(Vector3::new(2.0, 2.0, 2.0), Point3::origin());
        let b = box_mesh(Vector3::new(2.0, 2.0, 2.0), Point3::new(1.0, 1.0, 1.0));
        let result = BooleanAdapter::default()
            .apply(&a, &b, BooleanKind::Union)
            .unwrap();
        assert!((result.signed_volume() - 15.0).abs() < 1e-6);
        assert!(result.normals().is_some());
    }

    #[test]
    fn test_difference_with_sphere() {
        let a = box_mesh(Vector3::new(20.0, 20.0, 20.0), Point3::origin());
        let b = sphere_mesh(10.0, Point3::new(10.0, 10.0, 10.0), 16, 8);
        let result = BooleanAdapter::default()
            .apply(&a, &b, BooleanKind::Subtract)
            .unwrap();
        // One octant of the sphere is removed
        let volume = result.signed_volume();
        assert!(volume > 7300.0 && volume < 7700.0, "volume {volume}");
        assert!(!result.has_non_finite());
    }

    #[test]
    fn test_intersection_of_disjoint_is_empty() {
        let a = box_mesh(Vector3::new(1.0, 1.0, 1.0), Point3::origin());
        let b = box_mesh(Vector3::new(1.0, 1.0, 1.0), Point3::new(5.0, 0.0, 0.0));
        let result = BooleanAdapter::default()
            .apply(&a, &b, BooleanKind::Intersect)
            .unwrap();
        assert!(result.is_empty());
    }

    struct CountingBackend(Arc<AtomicUsize>);

    impl VolumetricBoolean for CountingBackend {
        fn evaluate(&self, a: &Solid, _b: &Solid, _kind: BooleanKind) -> Result<Solid, OperatorError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(a.clone())
        }
    }

    #[test]
    fn test_injected_backend_receives_both_meshes() {
        let calls = Arc::new(AtomicUsize::new(0));
        let adapter = BooleanAdapter::new(Box::new(CountingBackend(calls.clone())));
        let a = box_mesh(Vector3::new(1.0, 1.0, 1.0), Point3::origin());
        let result = adapter.apply(&a, &a, BooleanKind::Union).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.triangle_count(), 12);
    }

    #[test]
    fn test_normals_computed_when_absent() {
        let mut a = box_mesh(Vector3::new(1.0, 1.0, 1.0), Point3::origin());
        a.clear_normals();
        let solid = mesh_to_solid(&a);
        assert_eq!(solid.polygons().len(), 12);
        for polygon in solid.polygons() {
            for v in polygon.vertices() {
                assert!((v.normal.norm() - 1.0).abs() < 1e-9);
            }
        }
    }
}
