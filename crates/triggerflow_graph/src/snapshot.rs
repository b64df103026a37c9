// SPDX-License-Identifier: MIT OR Apache-2.0
//! Immutable result of one graph rebuild.

use crate::builder;
use crate::fingerprint::{self, ChangeCheck, Fingerprint};
use crate::layers::{self, BuildError, Layers};
use crate::node::{Node, NodeId, NodeKind};
use crate::source::{ObjectId, SceneSource};
use serde::{Deserialize, Serialize};

/// A fully built and ordered trigger graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphSnapshot {
    nodes: Vec<Node>,
    roots: Vec<NodeId>,
    layers: Layers,
    fingerprint: Fingerprint,
}

impl GraphSnapshot {
    /// Build, layer and order the graph of `source`
    pub fn build<S: SceneSource + ?Sized>(source: &S) -> Result<Self, BuildError> {
        let output = builder::build(source);
        let mut layers = layers::assign(&output.triggers, &output.targets)?;
        layers::order(&mut layers, &output.nodes);

        let snapshot = Self {
            nodes: output.nodes,
            roots: output.roots,
            layers,
            fingerprint: output.fingerprint,
        };
        tracing::debug!(
            "Rebuilt trigger graph: {} nodes, {} edges, {} layers, fingerprint {}",
            snapshot.node_count(),
            snapshot.edge_count(),
            snapshot.layers.len(),
            snapshot.fingerprint,
        );
        Ok(snapshot)
    }

    /// Get a node by ID
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of source → target edges
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.targets.len()).sum()
    }

    /// Top-level trigger nodes
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Ordered layers
    pub fn layers(&self) -> &Layers {
        &self.layers
    }

    /// Deepest layer index
    pub fn max_depth(&self) -> usize {
        self.layers.max_depth()
    }

    /// Fingerprint of the references the graph was built from
    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Every trigger component in the graph, in traversal order
    pub fn trigger_components(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Trigger)
            .flat_map(|n| n.components.iter().map(|c| c.object))
    }

    /// Compare the source's live references against this snapshot
    pub fn check_for_changes<S: SceneSource + ?Sized>(&self, source: &S) -> ChangeCheck {
        fingerprint::check(source, self.trigger_components(), self.fingerprint)
    }
}

#[cfg(test)]
impl GraphSnapshot {
    /// Copy with `node` missing from the layers but still referenced by edges
    pub(crate) fn without_layout_for(&self, node: NodeId) -> Self {
        let mut broken = self.clone();
        broken.layers.remove(node);
        broken
    }
}
