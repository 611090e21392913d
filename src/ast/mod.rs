// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Typed script records and their evaluation
//!
//! Defines the [`Specification`] produced by the parser and the evaluator
//! that turns it into an [`ArtifactGraph`].

mod artifact;
mod dependency_graph;
mod diagnostics;
mod evaluator;
mod node;

pub use artifact::{ArtifactGraph, ArtifactNode, ArtifactType};
pub use dependency_graph::{DependencyGraph, NodeId, TopologicalOrder};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use evaluator::{evaluate, Evaluation, Evaluator};
pub use node::{
    BooleanParams, Category, ChamferParams, CircularPatternParams, DraftParams, EdgeSelector,
    Entry, ExtrudeParams, FilletParams, GridPatternParams, HelixParams, LinearPatternParams,
    LoftParams, MirrorParams, Operation, OperationKind, RevolveParams, RotateParams, ScaleParams,
    ShellParams, Specification, SpiralPatternParams, SweepParams, TorusParams, TranslateParams,
};
