// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Edge and face descriptors of rectangular solids
//!
//! Descriptors are derived on demand from a box's size and center. Edge
//! indices are stable:
//!
//! | index | edge               | runs along |
//! |-------|--------------------|------------|
//! | 0-3   | bottom loop        | X, Z, X, Z |
//! | 4-7   | top loop           | X, Z, X, Z |
//! | 8-11  | vertical edges     | Y          |

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of edges on a box
pub const BOX_EDGE_COUNT: usize = 12;

/// One of the six axis-aligned faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceDirection {
    Top,
    Bottom,
    Left,
    Right,
    Front,
    Back,
}

impl FaceDirection {
    pub const ALL: [FaceDirection; 6] = [
        FaceDirection::Right,
        FaceDirection::Left,
        FaceDirection::Top,
        FaceDirection::Bottom,
        FaceDirection::Front,
        FaceDirection::Back,
    ];

    /// Axis index (0 = X, 1 = Y, 2 = Z)
    pub fn axis(self) -> usize {
        match self {
            Self::Left | Self::Right => 0,
            Self::Top | Self::Bottom => 1,
            Self::Front | Self::Back => 2,
        }
    }

    /// +1 for the positive side of the axis
    pub fn sign(self) -> f64 {
        match self {
            Self::Right | Self::Top | Self::Front => 1.0,
            Self::Left | Self::Bottom | Self::Back => -1.0,
        }
    }

    pub fn normal(self) -> Vector3<f64> {
        let mut n = Vector3::zeros();
        n[self.axis()] = self.sign();
        n
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Left => "left",
            Self::Right => "right",
            Self::Front => "front",
            Self::Back => "back",
        }
    }
}

impl fmt::Display for FaceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaceDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top" | "up" | "+y" => Ok(Self::Top),
            "bottom" | "down" | "-y" => Ok(Self::Bottom),
            "left" | "-x" => Ok(Self::Left),
            "right" | "+x" => Ok(Self::Right),
            "front" | "+z" => Ok(Self::Front),
            "back" | "-z" => Ok(Self::Back),
            other => Err(format!("unknown face `{other}`")),
        }
    }
}

/// A straight edge of a box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeDescriptor {
    pub index: usize,
    pub start: Point3<f64>,
    pub end: Point3<f64>,
    /// Unit vector from `start` to `end`
    pub direction: Vector3<f64>,
    pub length: f64,
    /// Outward normals of the two faces meeting at this edge
    pub face_normals: [Vector3<f64>; 2],
    pub faces: [FaceDirection; 2],
    pub name: String,
}

impl EdgeDescriptor {
    pub fn midpoint(&self) -> Point3<f64> {
        nalgebra::center(&self.start, &self.end)
    }
}

/// A planar face of a box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FaceDescriptor {
    pub direction: FaceDirection,
    pub normal: Vector3<f64>,
    pub center: Point3<f64>,
    /// Half extents of the face along its two in-plane axes, in axis order
    pub half_extents: [f64; 2],
}

// Corner sign patterns of the bottom loop
const LOOP: [(f64, f64); 4] = [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)];
const LOOP_FACES: [FaceDirection; 4] = [
    FaceDirection::Back,
    FaceDirection::Right,
    FaceDirection::Front,
    FaceDirection::Left,
];
const VERTICAL_FACES: [[FaceDirection; 2]; 4] = [
    [FaceDirection::Left, FaceDirection::Back],
    [FaceDirection::Right, FaceDirection::Back],
    [FaceDirection::Right, FaceDirection::Front],
    [FaceDirection::Left, FaceDirection::Front],
];

fn corner(h: &Vector3<f64>, center: &Point3<f64>, (sx, sz): (f64, f64), sy: f64) -> Point3<f64> {
    center + Vector3::new(sx * h.x, sy * h.y, sz * h.z)
}

fn edge(
    index: usize,
    start: Point3<f64>,
    end: Point3<f64>,
    faces: [FaceDirection; 2],
) -> EdgeDescriptor {
    let delta = end - start;
    let length = delta.norm();
    EdgeDescriptor {
        index,
        start,
        end,
        direction: crate::utils::normalize(&delta),
        length,
        face_normals: [faces[0].normal(), faces[1].normal()],
        faces,
        name: format!("{}-{}", faces[0], faces[1]),
    }
}

/// All 12 edges of a box
pub fn get_box_edges(size: &Vector3<f64>, center: &Point3<f64>) -> Vec<EdgeDescriptor> {
    let h = size.abs() / 2.0;
    let mut edges = Vec::with_capacity(BOX_EDGE_COUNT);

    for (level, (sy, cap)) in [(-1.0, FaceDirection::Bottom), (1.0, FaceDirection::Top)]
        .into_iter()
        .enumerate()
    {
        for i in 0..4 {
            let start = corner(&h, center, LOOP[i], sy);
            let end = corner(&h, center, LOOP[(i + 1) % 4], sy);
            edges.push(edge(level * 4 + i, start, end, [cap, LOOP_FACES[i]]));
        }
    }
    for i in 0..4 {
        let start = corner(&h, center, LOOP[i], -1.0);
        let end = corner(&h, center, LOOP[i], 1.0);
        edges.push(edge(8 + i, start, end, VERTICAL_FACES[i]));
    }

    edges
}

/// Resolve an edge index; out-of-range indices fall back to edge 0.
/// The flag reports whether the fallback was taken.
pub fn box_edge(size: &Vector3<f64>, center: &Point3<f64>, index: i64) -> (EdgeDescriptor, bool) {
    let in_range = (0..BOX_EDGE_COUNT as i64).contains(&index);
    let resolved = if in_range { index as usize } else { 0 };
    let mut edges = get_box_edges(size, center);
    (edges.swap_remove(resolved), !in_range)
}

/// All 6 faces of a box
pub fn get_box_faces(size: &Vector3<f64>, center: &Point3<f64>) -> Vec<FaceDescriptor> {
    let h = size.abs() / 2.0;
    FaceDirection::ALL
        .iter()
        .map(|&direction| {
            let axis = direction.axis();
            let mut offset = Vector3::zeros();
            offset[axis] = direction.sign() * h[axis];
            let others: Vec<f64> = (0..3).filter(|&a| a != axis).map(|a| h[a]).collect();
            FaceDescriptor {
                direction,
                normal: direction.normal(),
                center: center + offset,
                half_extents: [others[0], others[1]],
            }
        })
        .collect()
}
