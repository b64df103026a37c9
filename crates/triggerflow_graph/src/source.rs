// SPDX-License-Identifier: MIT OR Apache-2.0
//! Interface to the host object model the graph is read from.

use serde::{Deserialize, Serialize};

/// Handle to a host object (a hierarchy object or a component on one)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub i64);

impl ObjectId {
    /// Raw identity value
    pub fn raw(self) -> i64 {
        self.0
    }
}

/// Read access to a live object hierarchy.
///
/// Objects and components share the [`ObjectId`] handle space. A component's
/// [`owner`](SceneSource::owner) is the hierarchy object it is attached to; a
/// hierarchy object owns itself.
pub trait SceneSource {
    /// Top-level objects, in hierarchy order
    fn roots(&self) -> Vec<ObjectId>;

    /// Trigger components attached directly to `object`
    fn trigger_components(&self, object: ObjectId) -> Vec<ObjectId>;

    /// Direct hierarchical children of `object`
    fn children(&self, object: ObjectId) -> Vec<ObjectId>;

    /// Container parent of a hierarchy object, `None` for roots
    fn container_parent(&self, object: ObjectId) -> Option<ObjectId>;

    /// Objects referenced by the parameters of every event a trigger fires.
    ///
    /// Unset or dangling parameters are reported as `None`.
    fn outbound_references(&self, trigger: ObjectId) -> Vec<Option<ObjectId>>;

    /// Whether `component` is a trigger component
    fn is_trigger_component(&self, component: ObjectId) -> bool;

    /// Hierarchy object a component belongs to
    fn owner(&self, object: ObjectId) -> ObjectId;

    /// Human readable name of an object
    fn display_name(&self, object: ObjectId) -> String;

    /// Stable per-object identity used for fingerprinting
    fn instance_identity(&self, object: ObjectId) -> i64 {
        object.raw()
    }

    /// Number of container edges between `object`'s owner and the top of its hierarchy
    fn containment_depth(&self, object: ObjectId) -> usize {
        let mut depth = 0;
        let mut current = self.owner(object);
        while let Some(parent) = self.container_parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }
}
