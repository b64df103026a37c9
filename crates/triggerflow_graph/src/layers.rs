// SPDX-License-Identifier: MIT OR Apache-2.0
//! Depth layers and within-layer ordering.
//!
//! Layers are ordered in a single forward pass. Each layer inherits a
//! priority from the positions of the nodes in shallower layers that point at
//! it, then is refined by links between its own members.

use crate::node::{Node, NodeId, TraversedNode};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashMap;

/// Nodes grouped by depth; index `d` holds every node of depth `d`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layers {
    by_depth: Vec<Vec<NodeId>>,
}

impl Layers {
    /// Deepest depth present
    pub fn max_depth(&self) -> usize {
        self.by_depth.len().saturating_sub(1)
    }

    /// Members at `depth`, empty if none
    pub fn at_depth(&self, depth: usize) -> &[NodeId] {
        self.by_depth.get(depth).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Non-empty layers with their depth, shallowest first
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[NodeId])> + '_ {
        self.by_depth
            .iter()
            .enumerate()
            .filter(|(_, layer)| !layer.is_empty())
            .map(|(depth, layer)| (depth, layer.as_slice()))
    }

    /// Number of non-empty layers
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no layer has members
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Depth of the layer containing `node`
    pub fn depth_of(&self, node: NodeId) -> Option<usize> {
        self.by_depth.iter().position(|layer| layer.contains(&node))
    }
}

#[cfg(test)]
impl Layers {
    /// Drop `node` from whichever layer holds it
    pub(crate) fn remove(&mut self, node: NodeId) {
        for layer in &mut self.by_depth {
            layer.retain(|id| *id != node);
        }
    }
}

/// Error while grouping nodes into layers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// No trigger was found anywhere in the source
    #[error("Nothing to display: no triggers found")]
    EmptyGraph,
}

/// Group traversed trigger and target nodes by depth.
///
/// Within a depth, triggers come first in traversal order, then targets.
pub fn assign(triggers: &[TraversedNode], targets: &[TraversedNode]) -> Result<Layers, BuildError> {
    let max_depth = triggers
        .iter()
        .chain(targets)
        .map(|t| t.depth)
        .max()
        .ok_or(BuildError::EmptyGraph)?;

    let mut by_depth = vec![Vec::new(); max_depth + 1];
    for visited in triggers.iter().chain(targets) {
        by_depth[visited.depth].push(visited.node);
    }
    Ok(Layers { by_depth })
}

/// Order every layer in place, shallowest first.
///
/// The first non-empty layer gets one extra refinement up front, since no
/// shallower layer feeds it priorities. Then every layer, the first included,
/// is sorted by inherited priority (descending, missing entries count as
/// zero) and refined. Both sorts are stable.
pub fn order(layers: &mut Layers, nodes: &[Node]) {
    if let Some(first) = layers.by_depth.iter_mut().find(|layer| !layer.is_empty()) {
        refine(first, nodes);
    }

    let mut priorities: HashMap<NodeId, i64> = HashMap::new();
    for layer in layers.by_depth.iter_mut().filter(|layer| !layer.is_empty()) {
        sort_by_priority(layer, &priorities);
        refine(layer, nodes);
        record_priorities(layer, nodes, &mut priorities);
    }
}

/// Stable sort by inherited priority, highest first
pub fn sort_by_priority(layer: &mut [NodeId], priorities: &HashMap<NodeId, i64>) {
    layer.sort_by_key(|id| Reverse(priorities.get(id).copied().unwrap_or(0)));
}

/// Stable sort by the position of each node's in-layer link, highest first.
///
/// A node's link is its first child, or its first target when it has no
/// children. The key is the link's current position if the link shares the
/// layer, otherwise zero, so unlinked nodes tie with nodes linked to the front.
pub fn refine(layer: &mut [NodeId], nodes: &[Node]) {
    let positions: HashMap<NodeId, usize> = layer.iter().enumerate().map(|(i, id)| (*id, i)).collect();

    layer.sort_by_cached_key(|id| {
        let node = &nodes[id.0];
        let link = node.children.first().or_else(|| node.targets.first());
        Reverse(link.and_then(|link| positions.get(link)).copied().unwrap_or(0))
    });
}

/// Map every target and child of the layer's nodes to their source's position
fn record_priorities(layer: &[NodeId], nodes: &[Node], priorities: &mut HashMap<NodeId, i64>) {
    for (position, id) in layer.iter().enumerate() {
        let node = &nodes[id.0];
        for linked in node.targets.iter().chain(&node.children) {
            priorities.insert(*linked, position as i64);
        }
    }
}
