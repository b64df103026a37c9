// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph construction from a [`SceneSource`].
//!
//! The hierarchy is walked depth first. Every object carrying trigger
//! components becomes a node holding all of them; objects without triggers are
//! transparent and their nearest trigger descendants are lifted to the closest
//! trigger ancestor (or to the root list). Referenced objects become target
//! nodes, one per distinct object.

use crate::fingerprint::Fingerprint;
use crate::node::{Component, Node, NodeId, NodeKind, TraversedNode};
use crate::source::{ObjectId, SceneSource};
use indexmap::IndexMap;

/// Result of walking a source
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Every node, indexed by [`NodeId`]
    pub nodes: Vec<Node>,
    /// Top-level trigger nodes
    pub roots: Vec<NodeId>,
    /// Trigger nodes in depth-first pre-order
    pub triggers: Vec<TraversedNode>,
    /// Target nodes in first-reference order
    pub targets: Vec<TraversedNode>,
    /// XOR of every referenced object's identity
    pub fingerprint: Fingerprint,
}

/// Walks a source and accumulates nodes
pub struct GraphBuilder<'a, S: SceneSource + ?Sized> {
    source: &'a S,
    nodes: Vec<Node>,
    target_nodes: IndexMap<ObjectId, NodeId>,
    fingerprint: Fingerprint,
}

impl<'a, S: SceneSource + ?Sized> GraphBuilder<'a, S> {
    /// Create a builder reading from `source`
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            nodes: Vec::new(),
            target_nodes: IndexMap::new(),
            fingerprint: Fingerprint::default(),
        }
    }

    /// Build trigger and target nodes for every root of the source
    pub fn build(mut self) -> BuildOutput {
        let mut roots = Vec::new();
        for root in self.source.roots() {
            roots.extend(self.collect(root, 0));
        }

        let triggers = traverse(&self.nodes, &roots);
        for visited in &triggers {
            self.resolve_targets(visited.node);
        }

        let targets = self
            .target_nodes
            .values()
            .map(|id| TraversedNode { node: *id, depth: self.nodes[id.0].depth })
            .collect();

        BuildOutput {
            nodes: self.nodes,
            roots,
            triggers,
            targets,
            fingerprint: self.fingerprint,
        }
    }

    /// Nearest trigger nodes at or below `object`
    fn collect(&mut self, object: ObjectId, depth: usize) -> Vec<NodeId> {
        let triggers = self.source.trigger_components(object);
        if triggers.is_empty() {
            let mut lifted = Vec::new();
            for child in self.source.children(object) {
                lifted.extend(self.collect(child, depth + 1));
            }
            return lifted;
        }

        let id = NodeId(self.nodes.len());
        let components = triggers
            .into_iter()
            .map(|component| Component {
                object: component,
                owner: self.source.owner(component),
                is_trigger: true,
            })
            .collect();
        self.nodes.push(Node {
            id,
            kind: NodeKind::Trigger,
            components,
            children: Vec::new(),
            targets: Vec::new(),
            depth,
            label: self.source.display_name(object),
        });

        let mut children = Vec::new();
        for child in self.source.children(object) {
            children.extend(self.collect(child, depth + 1));
        }
        self.nodes[id.0].children = children;

        vec![id]
    }

    fn resolve_targets(&mut self, node: NodeId) {
        let triggers: Vec<ObjectId> = self.nodes[node.0].components.iter().map(|c| c.object).collect();
        let mut targets = Vec::new();
        for trigger in triggers {
            for referenced in self.source.outbound_references(trigger).into_iter().flatten() {
                self.fingerprint.accumulate(self.source.instance_identity(referenced));
                let target = self.target_node(referenced);
                if !targets.contains(&target) {
                    targets.push(target);
                }
            }
        }
        self.nodes[node.0].targets = targets;
    }

    fn target_node(&mut self, object: ObjectId) -> NodeId {
        if let Some(id) = self.target_nodes.get(&object) {
            return *id;
        }

        let owner = self.source.owner(object);
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind: NodeKind::Target,
            components: vec![Component {
                object,
                owner,
                is_trigger: self.source.is_trigger_component(object),
            }],
            children: Vec::new(),
            targets: Vec::new(),
            depth: self.source.containment_depth(object),
            label: self.source.display_name(owner),
        });
        self.target_nodes.insert(object, id);
        id
    }
}

/// Depth-first pre-order walk of the trigger forest
pub fn traverse(nodes: &[Node], roots: &[NodeId]) -> Vec<TraversedNode> {
    let mut order = Vec::with_capacity(nodes.len());
    let mut stack: Vec<NodeId> = roots.iter().rev().copied().collect();
    while let Some(id) = stack.pop() {
        let node = &nodes[id.0];
        order.push(TraversedNode { node: id, depth: node.depth });
        stack.extend(node.children.iter().rev().copied());
    }
    order
}

/// Build nodes for every root of `source`
pub fn build<S: SceneSource + ?Sized>(source: &S) -> BuildOutput {
    GraphBuilder::new(source).build()
}
