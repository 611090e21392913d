// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! KCL geometry engine
//!
//! Parses KCL modeling scripts into a typed [`Specification`], evaluates it
//! into an [`ArtifactGraph`] of named triangle meshes, and reports every
//! skipped, clamped or failed operation as a structured [`Diagnostic`].

pub mod ast;
pub mod config;
pub mod error;
pub mod geometry;
pub mod io;
pub mod kernel;
pub mod ops;
pub mod utils;

pub use ast::{
    ArtifactGraph, ArtifactNode, Diagnostic, DiagnosticKind, Evaluation, Severity, Specification,
};
pub use config::{EngineConfig, EvaluationOrder};
pub use error::{ConfigError, GraphError, MeshError, OperatorError, ParseError};
pub use geometry::{Mesh, Primitive};
pub use io::{build_graph_from_value, parse_script, parse_script_with_diagnostics};
pub use kernel::{Kernel, Preview, RunResult};

use anyhow::{Context, Result};
use std::path::Path;

/// Parse and evaluate a script with the default configuration
pub fn run(source: &str) -> RunResult {
    Kernel::new().run(source)
}

/// Evaluate a parsed specification with the default configuration
pub fn evaluate(spec: &Specification) -> Evaluation {
    Kernel::new().evaluate(spec)
}

/// Run a script file
pub fn run_file(path: impl AsRef<Path>, config: EngineConfig) -> Result<RunResult> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    Ok(Kernel::with_config(config).run(&source))
}
