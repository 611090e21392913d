// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Modifier operators
//!
//! Operators take meshes (or primitive records) and return new meshes. They
//! never touch the artifact graph; the evaluator decides where results go.

pub mod chamfer;
pub mod draft;
pub mod extrude;
pub mod fillet;
pub mod loft;
pub mod pattern;
pub mod profile;
pub mod revolve;
pub mod shell;
pub mod sweep;
pub mod transform;

pub use chamfer::{chamfer_box_all, chamfer_box_edge};
pub use draft::{draft, Drafted};
pub use extrude::{extrude, Extrusion};
pub use fillet::{fillet_box_all, fillet_box_edge};
pub use loft::loft;
pub use pattern::{circular_pattern, grid_pattern, linear_pattern, mirror, spiral_pattern, Spiral};
pub use revolve::revolve;
pub use shell::{shell_box, shell_cylinder, shell_mesh, shell_sphere};
pub use sweep::{helix, sweep, Helix};
pub use transform::{transform_primitive, TransformOp};
