// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh validation utilities

use super::Mesh;
use ahash::AHashMap;
use serde::Serialize;

/// Undirected edge, smaller index first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub v0: u32,
    pub v1: u32,
}

impl Edge {
    pub fn new(v0: u32, v1: u32) -> Self {
        if v0 < v1 {
            Self { v0, v1 }
        } else {
            Self { v0: v1, v1: v0 }
        }
    }
}

fn triangle_edges(t: [u32; 3]) -> [(u32, u32); 3] {
    [(t[0], t[1]), (t[1], t[2]), (t[2], t[0])]
}

/// Build edge count map for a mesh
pub fn build_edge_counts(mesh: &Mesh) -> AHashMap<Edge, u32> {
    let mut edge_counts = AHashMap::new();
    for tri in mesh.triangles() {
        for (a, b) in triangle_edges(tri) {
            *edge_counts.entry(Edge::new(a, b)).or_insert(0) += 1;
        }
    }
    edge_counts
}

/// Check if mesh is manifold (each edge shared by at most 2 triangles)
pub fn is_manifold(mesh: &Mesh) -> bool {
    build_edge_counts(mesh).values().all(|&count| count <= 2)
}

/// Check if mesh is closed (each edge shared by exactly 2 triangles)
pub fn is_closed(mesh: &Mesh) -> bool {
    build_edge_counts(mesh).values().all(|&count| count == 2)
}

/// Closed after welding coincident positions; faceted meshes duplicate
/// vertices along creases so [`is_closed`] alone rejects them
pub fn is_watertight(mesh: &Mesh, epsilon: f64) -> bool {
    let mut welded = mesh.clone();
    welded.weld_vertices(epsilon);
    let degenerate_free = strip_degenerate(&welded);
    is_closed(&degenerate_free)
}

/// Every directed edge is traversed once in each direction
pub fn has_consistent_winding(mesh: &Mesh) -> bool {
    let mut directed: AHashMap<(u32, u32), i32> = AHashMap::new();
    for tri in mesh.triangles() {
        for (a, b) in triangle_edges(tri) {
            if a == b {
                continue;
            }
            *directed.entry((a, b)).or_insert(0) += 1;
        }
    }
    directed
        .iter()
        .all(|(&(a, b), &count)| count == 1 && directed.get(&(b, a)).copied().unwrap_or(0) <= 1)
}

/// Find all boundary edges (edges shared by exactly 1 triangle)
pub fn find_boundary_edges(mesh: &Mesh) -> Vec<Edge> {
    let mut edges: Vec<Edge> = build_edge_counts(mesh)
        .into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(edge, _)| edge)
        .collect();
    edges.sort_by_key(|e| (e.v0, e.v1));
    edges
}

/// Copy of the mesh without triangles that repeat an index
fn strip_degenerate(mesh: &Mesh) -> Mesh {
    let indices: Vec<u32> = mesh
        .triangles()
        .filter(|t| t[0] != t[1] && t[1] != t[2] && t[0] != t[2])
        .flatten()
        .collect();
    Mesh::from_buffers(mesh.vertices().to_vec(), indices, None).unwrap_or_default()
}

/// Mesh validation report
#[derive(Debug, Clone, Serialize)]
pub struct MeshValidation {
    pub is_manifold: bool,
    pub is_closed: bool,
    pub has_consistent_winding: bool,
    pub edge_count: usize,
    pub boundary_edge_count: usize,
}

pub fn validate_mesh(mesh: &Mesh) -> MeshValidation {
    let edge_counts = build_edge_counts(mesh);
    MeshValidation {
        is_manifold: edge_counts.values().all(|&count| count <= 2),
        is_closed: edge_counts.values().all(|&count| count == 2),
        has_consistent_winding: has_consistent_winding(mesh),
        edge_count: edge_counts.len(),
        boundary_edge_count: edge_counts.values().filter(|&&count| count == 1).count(),
    }
}
