// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph vertices.

use crate::source::ObjectId;
use serde::{Deserialize, Serialize};

/// Index of a node inside its [`GraphSnapshot`](crate::GraphSnapshot)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

/// How a node came to be in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Created at a hierarchy position carrying trigger components
    Trigger,
    /// Created for an object referenced by some trigger event
    Target,
}

/// An underlying host object attached to a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Host handle
    pub object: ObjectId,
    /// Hierarchy object owning the component
    pub owner: ObjectId,
    /// Whether the component is a trigger
    pub is_trigger: bool,
}

/// A vertex of the trigger graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Identity within the snapshot
    pub id: NodeId,
    /// Origin of the node
    pub kind: NodeKind,
    /// Underlying objects sharing this position
    pub components: Vec<Component>,
    /// Nearest descendant trigger nodes in the hierarchy
    pub children: Vec<NodeId>,
    /// Nodes this node's events reference, without duplicates
    pub targets: Vec<NodeId>,
    /// Containment distance from the top of the hierarchy
    pub depth: usize,
    /// Name of the first component's owner
    pub label: String,
}

impl Node {
    /// Owner of the first component, if any
    pub fn owner(&self) -> Option<ObjectId> {
        self.components.first().map(|c| c.owner)
    }

    /// Object selected when the node is activated
    pub fn primary_object(&self) -> Option<ObjectId> {
        self.components.first().map(|c| c.object)
    }

    /// Whether the node stands for a plain referenced object.
    ///
    /// True when exactly one component is attached and it is not a trigger.
    pub fn is_plain_target(&self) -> bool {
        matches!(self.components.as_slice(), [only] if !only.is_trigger)
    }

    /// Label shown on the node's box
    pub fn display_label(&self) -> &str {
        if self.components.is_empty() {
            "?"
        } else {
            &self.label
        }
    }
}

/// A node paired with the depth it was visited at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraversedNode {
    /// Visited node
    pub node: NodeId,
    /// Containment depth
    pub depth: usize,
}
