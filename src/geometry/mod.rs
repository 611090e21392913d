// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Geometry module - mesh representation and operations

pub mod bbox;
pub mod boolean;
pub mod csg;
pub mod descriptors;
pub mod mesh;
pub mod mesh_utils;
pub mod primitives;

pub use bbox::BoundingBox;
pub use boolean::{BooleanAdapter, BooleanKind, BspBoolean, VolumetricBoolean};
pub use descriptors::{get_box_edges, get_box_faces, EdgeDescriptor, FaceDescriptor, FaceDirection};
pub use mesh::Mesh;
pub use primitives::{box_mesh, cone_mesh, cylinder_mesh, sphere_mesh, torus_mesh, torus_radii, Primitive};
