// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Artifact graph: named solids plus the ordered list of visible ones

use crate::error::{json_type_name, GraphError};
use crate::geometry::{BoundingBox, Mesh, Primitive};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    #[default]
    Solid,
}

/// One named solid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: ArtifactType,
    pub geometry: Option<Mesh>,
    /// Originating primitive, kept while the node is still one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec: Option<Primitive>,
}

impl ArtifactNode {
    pub fn solid(id: impl Into<String>, geometry: Mesh) -> Self {
        Self {
            id: id.into(),
            kind: ArtifactType::Solid,
            geometry: Some(geometry),
            spec: None,
        }
    }

    pub fn from_primitive(id: impl Into<String>, primitive: Primitive, geometry: Mesh) -> Self {
        Self {
            spec: Some(primitive),
            ..Self::solid(id, geometry)
        }
    }
}

/// Id-to-node map plus the visible ids in creation order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactGraph {
    pub artifacts: Vec<String>,
    pub nodes: BTreeMap<String, ArtifactNode>,
}

impl ArtifactGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a graph payload. A non-object root is rejected outright.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, GraphError> {
        if !value.is_object() {
            return Err(GraphError::InvalidGraphInput(json_type_name(value)));
        }
        let graph: ArtifactGraph = serde_json::from_value(value.clone())?;
        if let Some(missing) = graph
            .artifacts
            .iter()
            .find(|id| !graph.nodes.contains_key(*id))
        {
            return Err(GraphError::UnknownArtifact(missing.clone()));
        }
        Ok(graph)
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Add (or replace) a node and show it
    pub fn insert_visible(&mut self, node: ArtifactNode) {
        let id = node.id.clone();
        self.nodes.insert(id.clone(), node);
        if !self.artifacts.contains(&id) {
            self.artifacts.push(id);
        }
    }

    /// Remove `id` from the visible list; the node stays addressable
    pub fn hide(&mut self, id: &str) {
        self.artifacts.retain(|a| a != id);
    }

    pub fn get(&self, id: &str) -> Option<&ArtifactNode> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ArtifactNode> {
        self.nodes.get_mut(id)
    }

    /// Geometry of `id`, if the node exists and has any
    pub fn mesh(&self, id: &str) -> Option<&Mesh> {
        self.nodes.get(id).and_then(|n| n.geometry.as_ref())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.artifacts.iter().any(|a| a == id)
    }

    /// Visible nodes in order
    pub fn visible(&self) -> impl Iterator<Item = &ArtifactNode> + '_ {
        self.artifacts.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Bounds of all visible geometry
    pub fn bounding_box(&self) -> BoundingBox {
        self.visible()
            .filter_map(|n| n.geometry.as_ref())
            .filter(|m| !m.is_empty())
            .fold(BoundingBox::empty(), |acc, m| acc.union(&m.bounding_box()))
    }
}
