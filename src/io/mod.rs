// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! I/O module - script parsing and graph payloads

mod parser;

pub use parser::{parse_script, parse_script_with_config, parse_script_with_diagnostics};

use crate::ast::ArtifactGraph;
use crate::error::GraphError;

/// Build an artifact graph from a JSON payload produced by a previous
/// evaluation. A non-object root is rejected with
/// [`GraphError::InvalidGraphInput`].
pub fn build_graph_from_value(value: &serde_json::Value) -> Result<ArtifactGraph, GraphError> {
    ArtifactGraph::from_value(value)
}

/// Same as [`build_graph_from_value`], from JSON text
pub fn build_graph_from_str(json: &str) -> Result<ArtifactGraph, GraphError> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    build_graph_from_value(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_graph_is_rejected() {
        let err = build_graph_from_value(&json!(null)).unwrap_err();
        assert!(matches!(err, GraphError::InvalidGraphInput("null")));
        assert!(err.to_string().contains("null"));
    }

    #[test]
    fn test_graph_from_str() {
        let graph = build_graph_from_str(r#"{ "artifacts": [], "nodes": {} }"#).unwrap();
        assert!(graph.artifacts.is_empty());
        assert!(matches!(
            build_graph_from_str("{ not json"),
            Err(GraphError::Malformed(_))
        ));
        assert!(matches!(
            build_graph_from_str("[1, 2]"),
            Err(GraphError::InvalidGraphInput("array"))
        ));
    }
}
