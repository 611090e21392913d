// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Mesh representation and utilities
//!
//! A [`Mesh`] is a triangle soup stored in flat, contiguous buffers:
//! one position per vertex, a flat index buffer whose length is a multiple
//! of three, and an optional normal buffer parallel to the positions.
//! The invariants are checked by [`Mesh::from_buffers`] and preserved by
//! every mutating method.

use super::BoundingBox;
use crate::error::MeshError;
use crate::utils::math::{normalize, triangle_normal};
use nalgebra::{Matrix4, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Triangular mesh
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawMesh")]
pub struct Mesh {
    vertices: Vec<Point3<f64>>,
    indices: Vec<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    normals: Option<Vec<Vector3<f64>>>,
}

#[derive(Deserialize)]
struct RawMesh {
    vertices: Vec<Point3<f64>>,
    indices: Vec<u32>,
    #[serde(default)]
    normals: Option<Vec<Vector3<f64>>>,
}

impl TryFrom<RawMesh> for Mesh {
    type Error = MeshError;

    fn try_from(raw: RawMesh) -> Result<Self, Self::Error> {
        Mesh::from_buffers(raw.vertices, raw.indices, raw.normals)
    }
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self::new()
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            indices: Vec::with_capacity(triangle_count * 3),
            normals: None,
        }
    }

    /// Build a mesh from raw buffers, checking every invariant
    pub fn from_buffers(
        vertices: Vec<Point3<f64>>,
        indices: Vec<u32>,
        normals: Option<Vec<Vector3<f64>>>,
    ) -> Result<Self, MeshError> {
        let mesh = Self {
            vertices,
            indices,
            normals,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Check the buffer invariants
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.indices.len() % 3 != 0 {
            return Err(MeshError::RaggedIndices(self.indices.len()));
        }
        let vertex_count = self.vertices.len();
        if let Some(&index) = self
            .indices
            .iter()
            .find(|&&i| i as usize >= vertex_count)
        {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }
        if let Some(normals) = &self.normals {
            if normals.len() != vertex_count {
                return Err(MeshError::NormalCountMismatch {
                    normals: normals.len(),
                    vertices: vertex_count,
                });
            }
        }
        if let Some(pos) = self
            .vertices
            .iter()
            .position(|v| !v.coords.iter().all(|c| c.is_finite()))
        {
            return Err(MeshError::NonFiniteVertex(pos));
        }
        Ok(())
    }

    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn normals(&self) -> Option<&[Vector3<f64>]> {
        self.normals.as_deref()
    }

    /// Get vertex count
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get triangle count
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over triangles as index triples
    pub fn triangles(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Positions of a triangle's corners
    pub fn triangle_points(&self, tri: [u32; 3]) -> [Point3<f64>; 3] {
        [
            self.vertices[tri[0] as usize],
            self.vertices[tri[1] as usize],
            self.vertices[tri[2] as usize],
        ]
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, position: Point3<f64>) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        if let Some(normals) = &mut self.normals {
            normals.push(Vector3::zeros());
        }
        index
    }

    /// Add a vertex carrying an explicit normal
    pub fn add_vertex_with_normal(&mut self, position: Point3<f64>, normal: Vector3<f64>) -> u32 {
        let index = self.vertices.len() as u32;
        let normals = self
            .normals
            .get_or_insert_with(|| vec![Vector3::zeros(); index as usize]);
        normals.push(normal);
        self.vertices.push(position);
        index
    }

    /// Add a triangle over existing vertices
    pub fn try_add_triangle(&mut self, a: u32, b: u32, c: u32) -> Result<(), MeshError> {
        let index = a.max(b).max(c);
        if index as usize >= self.vertices.len() {
            return Err(MeshError::IndexOutOfRange {
                index,
                vertex_count: self.vertices.len(),
            });
        }
        self.indices.extend_from_slice(&[a, b, c]);
        Ok(())
    }

    /// Add a triangle over existing vertices.
    ///
    /// # Panics
    ///
    /// Panics when an index does not refer to an existing vertex.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        if let Err(err) = self.try_add_triangle(a, b, c) {
            panic!("{err}");
        }
    }

    /// Add a flat quad `p0 p1 p2 p3` (counter-clockwise seen from its front)
    pub fn add_quad(&mut self, corners: [Point3<f64>; 4], normal: Vector3<f64>) {
        let i: Vec<u32> = corners
            .iter()
            .map(|p| self.add_vertex_with_normal(*p, normal))
            .collect();
        self.add_triangle(i[0], i[1], i[2]);
        self.add_triangle(i[0], i[2], i[3]);
    }

    /// Add a flat quad whose winding is chosen so its front faces `outward`
    pub fn add_quad_facing(&mut self, mut corners: [Point3<f64>; 4], outward: &Vector3<f64>) {
        let n = triangle_normal(&corners[0], &corners[1], &corners[2])
            + triangle_normal(&corners[0], &corners[2], &corners[3]);
        if n.dot(outward) < 0.0 {
            corners.reverse();
        }
        self.add_quad(corners, normalize(outward));
    }

    /// Add a triangle whose winding is chosen so its front faces `outward`
    pub fn add_triangle_facing(&mut self, mut corners: [Point3<f64>; 3], outward: &Vector3<f64>) {
        if triangle_normal(&corners[0], &corners[1], &corners[2]).dot(outward) < 0.0 {
            corners.swap(1, 2);
        }
        let normal = normalize(outward);
        let a = self.add_vertex_with_normal(corners[0], normal);
        let b = self.add_vertex_with_normal(corners[1], normal);
        let c = self.add_vertex_with_normal(corners[2], normal);
        self.add_triangle(a, b, c);
    }

    /// Add a triangle over existing vertices, flipped when needed so its front
    /// faces `outward`. Zero-area triangles are dropped.
    pub fn add_triangle_indexed_facing(&mut self, tri: [u32; 3], outward: &Vector3<f64>) {
        let [a, b, c] = tri;
        let n = triangle_normal(
            &self.vertices[a as usize],
            &self.vertices[b as usize],
            &self.vertices[c as usize],
        );
        if n.norm() <= 1e-14 {
            return;
        }
        if n.dot(outward) < 0.0 {
            self.add_triangle(a, c, b);
        } else {
            self.add_triangle(a, b, c);
        }
    }

    /// Quad `a b c d` over existing vertices, split along `a c`
    pub fn add_quad_indexed_facing(&mut self, quad: [u32; 4], outward: &Vector3<f64>) {
        let [a, b, c, d] = quad;
        self.add_triangle_indexed_facing([a, b, c], outward);
        self.add_triangle_indexed_facing([a, c, d], outward);
    }

    /// Append another mesh, offsetting its indices by the current vertex count.
    /// When only one side carries normals, the other side's are computed.
    pub fn merge(&mut self, other: &Mesh) {
        let offset = self.vertices.len() as u32;
        match (self.normals.is_some(), &other.normals) {
            (true, Some(theirs)) => {
                if let Some(mine) = &mut self.normals {
                    mine.extend_from_slice(theirs);
                }
            }
            (true, None) => {
                let mut computed = other.clone();
                computed.recompute_normals();
                if let (Some(mine), Some(theirs)) = (&mut self.normals, &computed.normals) {
                    mine.extend_from_slice(theirs);
                }
            }
            (false, Some(theirs)) => {
                self.recompute_normals();
                if let Some(mine) = &mut self.normals {
                    mine.extend_from_slice(theirs);
                }
            }
            (false, None) => {}
        }
        self.vertices.extend_from_slice(&other.vertices);
        self.indices.extend(other.indices.iter().map(|i| i + offset));
    }

    /// Concatenate meshes in order
    pub fn concat<'a>(meshes: impl IntoIterator<Item = &'a Mesh>) -> Mesh {
        let mut result = Mesh::new();
        for mesh in meshes {
            result.merge(mesh);
        }
        result
    }

    /// Apply a point map to positions and a direction map to normals
    pub fn map(
        &mut self,
        point: impl Fn(&Point3<f64>) -> Point3<f64>,
        direction: impl Fn(&Vector3<f64>) -> Vector3<f64>,
    ) {
        for v in &mut self.vertices {
            *v = point(v);
        }
        if let Some(normals) = &mut self.normals {
            for n in normals.iter_mut() {
                *n = normalize(&direction(n));
            }
        }
    }

    /// Transform all vertices by a matrix
    pub fn transform(&mut self, matrix: &Matrix4<f64>) {
        // Normals use the inverse transpose
        let normal_matrix = matrix
            .try_inverse()
            .map(|m| m.transpose())
            .unwrap_or(*matrix);
        self.map(
            |p| matrix.transform_point(p),
            |n| normal_matrix.transform_vector(n),
        );
        // Normals are already mapped; only the triangle order changes
        if matrix.fixed_view::<3, 3>(0, 0).clone_owned().determinant() < 0.0 {
            self.flip_triangles();
        }
    }

    pub fn translate(&mut self, offset: &Vector3<f64>) {
        for v in &mut self.vertices {
            *v += offset;
        }
    }

    /// Reverse the vertex order of every triangle, leaving normals alone
    pub fn flip_triangles(&mut self) {
        for tri in self.indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    /// Flip every triangle (and normal) to face the other way
    pub fn reverse_winding(&mut self) {
        self.flip_triangles();
        if let Some(normals) = &mut self.normals {
            for n in normals.iter_mut() {
                *n = -*n;
            }
        }
    }

    /// Compute bounding box
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(&self.vertices)
    }

    /// True if any coordinate is NaN or infinite
    pub fn has_non_finite(&self) -> bool {
        self.vertices
            .iter()
            .any(|v| !v.coords.iter().all(|c| c.is_finite()))
    }

    /// Signed enclosed volume (positive for outward-wound closed meshes)
    pub fn signed_volume(&self) -> f64 {
        self.triangles()
            .map(|t| {
                let [a, b, c] = self.triangle_points(t);
                a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
            })
            .sum()
    }

    /// Reverse the winding if the mesh encloses negative volume
    pub fn orient_outward(&mut self) {
        if self.signed_volume() < 0.0 {
            self.reverse_winding();
        }
    }

    /// Compute normals only when the mesh has none
    pub fn ensure_normals(&mut self) {
        if self.normals.is_none() {
            self.recompute_normals();
        }
    }

    /// Recompute vertex normals from triangle geometry
    /// This calculates face normals and averages them at shared vertices
    pub fn recompute_normals(&mut self) {
        let mut normal_sums: Vec<Vector3<f64>> = vec![Vector3::zeros(); self.vertices.len()];

        for tri in self.indices.chunks_exact(3) {
            let a = &self.vertices[tri[0] as usize];
            let b = &self.vertices[tri[1] as usize];
            let c = &self.vertices[tri[2] as usize];
            // Area weighted
            let face_normal = triangle_normal(a, b, c);
            if face_normal.norm() > 1e-14 {
                for &idx in tri {
                    normal_sums[idx as usize] += face_normal;
                }
            }
        }

        self.normals = Some(
            normal_sums
                .iter()
                .map(|sum| {
                    let n = normalize(sum);
                    if n == Vector3::zeros() {
                        Vector3::y()
                    } else {
                        n
                    }
                })
                .collect(),
        );
    }

    /// Drop the normal buffer
    pub fn clear_normals(&mut self) {
        self.normals = None;
    }

    /// Weld vertices that are within epsilon distance of each other
    /// Returns the number of vertices removed
    pub fn weld_vertices(&mut self, epsilon: f64) -> usize {
        let original_count = self.vertices.len();
        if original_count == 0 {
            return 0;
        }
        let inv = 1.0 / epsilon.max(1e-12);
        let mut lookup: ahash::AHashMap<(i64, i64, i64), u32> = ahash::AHashMap::new();
        let mut remap = Vec::with_capacity(original_count);
        let mut new_vertices = Vec::new();

        for v in &self.vertices {
            let key = (
                (v.x * inv).round() as i64,
                (v.y * inv).round() as i64,
                (v.z * inv).round() as i64,
            );
            let index = *lookup.entry(key).or_insert_with(|| {
                new_vertices.push(*v);
                (new_vertices.len() - 1) as u32
            });
            remap.push(index);
        }

        for i in &mut self.indices {
            *i = remap[*i as usize];
        }
        self.vertices = new_vertices;
        if self.normals.is_some() {
            self.recompute_normals();
        }
        original_count - self.vertices.len()
    }
}
