// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Structured, non-fatal diagnostics collected while parsing and evaluating

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What went wrong
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// Statement dropped by the parser
    ParseRejection,
    /// Operation skipped because a referenced id does not resolve. `forward`
    /// is set when the id exists but is only produced later.
    MissingReference { reference: String, forward: bool },
    /// A parameter was moved to keep the geometry valid
    DegenerateParameterClamp {
        parameter: String,
        requested: f64,
        applied: f64,
    },
    /// A box was rebuilt from its primitive, dropping an earlier edge
    /// treatment
    RebuiltFromPrimitive { discarded: String },
    /// Edge index outside 0..=11, edge 0 used instead
    EdgeIndexOutOfRange { index: i64 },
    /// The operation does not apply to the referenced shape
    UnsupportedTarget,
    /// The operator failed; the graph keeps its previous state
    OperatorFailure,
    /// Entries that reference each other; evaluated in declaration order
    DependencyCycle { ids: Vec<String> },
}

impl DiagnosticKind {
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticKind::DegenerateParameterClamp { .. }
            | DiagnosticKind::RebuiltFromPrimitive { .. } => Severity::Info,
            DiagnosticKind::EdgeIndexOutOfRange { .. } | DiagnosticKind::DependencyCycle { .. } => {
                Severity::Warning
            }
            DiagnosticKind::MissingReference { .. } => Severity::Warning,
            DiagnosticKind::ParseRejection
            | DiagnosticKind::UnsupportedTarget
            | DiagnosticKind::OperatorFailure => Severity::Error,
        }
    }
}

/// One reported condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    /// Id of the entry concerned, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry: Option<String>,
    /// 1-based script line, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            entry: None,
            line: None,
            message: message.into(),
        }
    }

    pub fn for_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = (line > 0).then_some(line);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{severity}")?;
        if let Some(line) = self.line {
            write!(f, " [line {line}]")?;
        }
        if let Some(entry) = &self.entry {
            write!(f, " {entry}")?;
        }
        write!(f, ": {}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_display() {
        let d = Diagnostic::new(
            DiagnosticKind::MissingReference {
                reference: "box9".into(),
                forward: false,
            },
            "unknown id `box9`",
        )
        .for_entry("box9_fillet")
        .at_line(4);
        assert_eq!(d.to_string(), "warning [line 4] box9_fillet: unknown id `box9`");
        assert!(!d.is_error());
    }

    #[test]
    fn test_serializes_flat() {
        let d = Diagnostic::new(
            DiagnosticKind::DegenerateParameterClamp {
                parameter: "radius".into(),
                requested: 5.0,
                applied: 0.9,
            },
            "radius clamped",
        );
        let value = serde_json::to_value(&d).unwrap();
        assert_eq!(value["kind"], json!("degenerateParameterClamp"));
        assert_eq!(value["severity"], json!("info"));
        assert_eq!(value["applied"], json!(0.9));
        assert!(value.get("line").is_none());
    }

    #[test]
    fn test_line_zero_is_unknown() {
        let d = Diagnostic::new(DiagnosticKind::OperatorFailure, "boom").at_line(0);
        assert_eq!(d.line, None);
        assert!(d.is_error());
    }
}
