// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Dependency graph between script entries

use super::Operation;
use ahash::AHashMap;
use std::collections::BTreeSet;

/// Position of an entry in declaration order
pub type NodeId = usize;

/// Dependency graph tracking which entries must run before which
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Maps an entry to the entries that depend on it
    children: AHashMap<NodeId, Vec<NodeId>>,
    /// Maps an entry to the entries it depends on
    parents: AHashMap<NodeId, Vec<NodeId>>,
    nodes: BTreeSet<NodeId>,
}

/// Result of ordering the graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopologicalOrder {
    /// Entries whose dependencies could all be satisfied
    pub order: Vec<NodeId>,
    /// Entries left on a cycle, in declaration order
    pub cyclic: Vec<NodeId>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph for entries given in declaration order.
    ///
    /// For every artifact id, the entry producing it comes first, then every
    /// other entry touching it follows in declaration order.
    pub fn from_operations(operations: &[Operation<'_>]) -> Self {
        let mut graph = Self::new();
        let mut touching: AHashMap<&str, Vec<NodeId>> = AHashMap::new();
        let mut producers: AHashMap<&str, NodeId> = AHashMap::new();

        for (index, op) in operations.iter().enumerate() {
            graph.nodes.insert(index);
            if op.category().is_generative() {
                producers.entry(op.id).or_insert(index);
            }
            for source in op.sources() {
                let users = touching.entry(source).or_default();
                if !users.contains(&index) {
                    users.push(index);
                }
            }
        }

        for (id, users) in &touching {
            let mut previous = producers.get(id).copied();
            for &user in users {
                if let Some(before) = previous {
                    graph.add_edge(before, user);
                }
                previous = Some(user);
            }
        }
        graph
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId) {
        if from == to {
            return;
        }
        let children = self.children.entry(from).or_default();
        if children.contains(&to) {
            return;
        }
        children.push(to);
        self.parents.entry(to).or_default().push(from);
    }

    /// Entries `id` directly depends on
    pub fn parents(&self, id: NodeId) -> &[NodeId] {
        self.parents.get(&id).map_or(&[], Vec::as_slice)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Kahn's algorithm, always taking the earliest-declared ready entry
    pub fn topological_order(&self) -> TopologicalOrder {
        let mut pending: AHashMap<NodeId, usize> = self
            .nodes
            .iter()
            .map(|&id| (id, self.parents(id).len()))
            .collect();
        let mut ready: BTreeSet<NodeId> = pending
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(id) = ready.pop_first() {
            pending.remove(&id);
            order.push(id);
            for child in self.children.get(&id).map_or(&[][..], Vec::as_slice) {
                if let Some(count) = pending.get_mut(child) {
                    *count -= 1;
                    if *count == 0 {
                        ready.insert(*child);
                    }
                }
            }
        }

        let mut cyclic: Vec<NodeId> = pending.into_keys().collect();
        cyclic.sort_unstable();
        TopologicalOrder { order, cyclic }
    }
}
