// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Error types

use thiserror::Error;

/// Violations of the mesh buffer invariants
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MeshError {
    #[error("index buffer length {0} is not a multiple of 3")]
    RaggedIndices(usize),
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("normal count {normals} does not match vertex count {vertices}")]
    NormalCountMismatch { normals: usize, vertices: usize },
    #[error("vertex {0} has a non-finite coordinate")]
    NonFiniteVertex(usize),
}

/// Failure inside a single modifier operator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OperatorError {
    #[error("axis vector has zero length")]
    ZeroAxis,
    #[error("direction vector has zero length")]
    ZeroDirection,
    #[error("profile needs at least {required} points, got {provided}")]
    ProfileTooShort { required: usize, provided: usize },
    #[error("path needs at least 2 distinct points, got {0}")]
    PathTooShort(usize),
    #[error("loft needs at least 2 sections, got {0}")]
    TooFewSections(usize),
    #[error("loft sections have mismatched point counts ({expected} vs {found})")]
    SectionMismatch { expected: usize, found: usize },
    #[error("loft needs one height per section ({sections} sections, {heights} heights)")]
    HeightCountMismatch { sections: usize, heights: usize },
    #[error("polygon triangulation failed: {0}")]
    Triangulation(String),
    #[error("revolution angle is zero")]
    ZeroAngle,
    #[error("scale factor has a zero component")]
    ZeroScale,
    #[error("non-finite parameter `{0}`")]
    NonFinite(&'static str),
    #[error("{operation} cannot target {target}")]
    UnsupportedTarget {
        operation: &'static str,
        target: String,
    },
    #[error("boolean evaluation failed: {0}")]
    Boolean(String),
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Why a script statement was dropped
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("syntax error: {0}")]
    Syntax(String),
    #[error("unknown statement `{0}`")]
    UnknownStatement(String),
    #[error("`{statement}` is missing argument `{argument}`")]
    MissingArgument {
        statement: String,
        argument: &'static str,
    },
    #[error("argument `{argument}` must be {expected}")]
    InvalidArgument {
        argument: &'static str,
        expected: &'static str,
    },
    #[error("non-finite number literal `{0}`")]
    NonFinite(String),
}

/// Fatal errors of the graph-parsing entry points
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("graph payload must be a JSON object, got {0}")]
    InvalidGraphInput(&'static str),
    #[error("malformed graph payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("artifact `{0}` is listed as visible but has no node")]
    UnknownArtifact(String),
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid value `{value}` for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Name of a JSON value's type, for error messages
pub(crate) fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
