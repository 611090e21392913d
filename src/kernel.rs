// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Kernel API for hosts that re-evaluate on every edit

use crate::ast::{Evaluation, Evaluator, Severity, Specification};
use crate::config::EngineConfig;
use crate::geometry::{BooleanAdapter, VolumetricBoolean};
use crate::io::parse_script_with_config;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::instrument;

/// Geometry summary for a front end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    /// Visible artifact ids in order
    pub artifacts: Vec<String>,
    /// `(xmin, ymin, zmin, xmax, ymax, zmax)` over visible geometry, absent
    /// when nothing is visible
    pub bbox: Option<[f64; 6]>,
}

/// JSON contract of the `kcl-run` executable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub ok: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    pub preview: Option<Preview>,
}

impl RunResult {
    /// Result for a run that never reached evaluation
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            errors: vec![message.into()],
            preview: None,
        }
    }

    pub fn from_evaluation(evaluation: &Evaluation) -> Self {
        let errors: Vec<String> = evaluation
            .diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(ToString::to_string)
            .collect();
        let bbox = evaluation.graph.bounding_box();
        Self {
            ok: errors.is_empty(),
            errors,
            preview: Some(Preview {
                artifacts: evaluation.graph.artifacts.clone(),
                bbox: (!bbox.is_empty()).then(|| bbox.to_array()),
            }),
        }
    }
}

/// Main kernel: configuration plus the shared boolean backend
///
/// The backend is built on the first boolean and reused by every later
/// evaluation; nothing else survives between calls.
#[derive(Debug, Default)]
pub struct Kernel {
    config: EngineConfig,
    booleans: OnceLock<BooleanAdapter>,
}

impl Kernel {
    /// Create a kernel with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            booleans: OnceLock::new(),
        }
    }

    /// Use `backend` for volumetric booleans instead of the built-in BSP
    /// evaluator
    pub fn with_backend(config: EngineConfig, backend: Box<dyn VolumetricBoolean>) -> Self {
        let booleans = OnceLock::new();
        let _ = booleans.set(BooleanAdapter::new(backend));
        Self { config, booleans }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Evaluate an already parsed specification
    pub fn evaluate(&self, spec: &Specification) -> Evaluation {
        Evaluator::new(&self.config, &self.booleans).evaluate(spec)
    }

    /// Parse and evaluate a script. Parse rejections come first in the
    /// diagnostics, followed by evaluation diagnostics.
    #[instrument(skip_all, fields(bytes = source.len()))]
    pub fn evaluate_script(&self, source: &str) -> Evaluation {
        let (spec, mut diagnostics) = parse_script_with_config(source, &self.config);
        let mut evaluation = self.evaluate(&spec);
        diagnostics.append(&mut evaluation.diagnostics);
        evaluation.diagnostics = diagnostics;
        evaluation
    }

    /// Parse, evaluate and summarize a script
    pub fn run(&self, source: &str) -> RunResult {
        RunResult::from_evaluation(&self.evaluate_script(source))
    }
}
