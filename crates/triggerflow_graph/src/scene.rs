// SPDX-License-Identifier: MIT OR Apache-2.0
//! In-memory object hierarchy implementing [`SceneSource`].
//!
//! Objects form a forest. Each object may carry plain components and trigger
//! components; triggers hold a list of events whose parameters optionally
//! reference other objects or components.

use crate::source::{ObjectId, SceneSource};
use indexmap::IndexMap;

/// A hierarchy object
#[derive(Debug, Clone)]
pub struct SceneObject {
    /// Display name
    pub name: String,
    /// Container parent
    pub parent: Option<ObjectId>,
    /// Contained children, in order
    pub children: Vec<ObjectId>,
    /// Attached components, in order
    pub components: Vec<ObjectId>,
}

/// A component attached to a hierarchy object
#[derive(Debug, Clone)]
pub struct SceneComponent {
    /// Component name (type name in most hosts)
    pub name: String,
    /// Object the component is attached to
    pub owner: ObjectId,
    /// Configured events, `None` for non-trigger components
    pub events: Option<Vec<TriggerEvent>>,
}

/// One configured event of a trigger
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerEvent {
    /// Object parameters; `None` marks an unset slot
    pub parameters: Vec<Option<ObjectId>>,
}

#[derive(Debug, Clone)]
enum Entry {
    Object(SceneObject),
    Component(SceneComponent),
}

/// Errors raised while editing a [`MemoryScene`]
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Handle does not name a live object
    #[error("Unknown object: {0:?}")]
    UnknownObject(ObjectId),

    /// Handle names a component where a hierarchy object was expected
    #[error("Not a hierarchy object: {0:?}")]
    NotAnObject(ObjectId),

    /// Handle does not name a trigger component
    #[error("Not a trigger component: {0:?}")]
    NotATrigger(ObjectId),

    /// Event index out of range
    #[error("Trigger {trigger:?} has no event {index}")]
    NoSuchEvent {
        /// Trigger component
        trigger: ObjectId,
        /// Requested event index
        index: usize,
    },
}

/// Mutable in-memory scene
#[derive(Debug, Clone)]
pub struct MemoryScene {
    entries: IndexMap<ObjectId, Entry>,
    roots: Vec<ObjectId>,
    next_id: i64,
}

impl MemoryScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    fn allocate(&mut self) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a top-level object
    pub fn add_root(&mut self, name: impl Into<String>) -> ObjectId {
        let id = self.allocate();
        self.entries.insert(
            id,
            Entry::Object(SceneObject {
                name: name.into(),
                parent: None,
                children: Vec::new(),
                components: Vec::new(),
            }),
        );
        self.roots.push(id);
        id
    }

    /// Add an object contained in `parent`
    pub fn add_child(&mut self, parent: ObjectId, name: impl Into<String>) -> Result<ObjectId, SceneError> {
        self.object(parent)?;
        let id = self.allocate();
        self.entries.insert(
            id,
            Entry::Object(SceneObject {
                name: name.into(),
                parent: Some(parent),
                children: Vec::new(),
                components: Vec::new(),
            }),
        );
        self.object_mut(parent)?.children.push(id);
        Ok(id)
    }

    /// Attach a plain (non-trigger) component
    pub fn add_component(&mut self, owner: ObjectId, name: impl Into<String>) -> Result<ObjectId, SceneError> {
        self.attach(owner, name.into(), None)
    }

    /// Attach a trigger component with no events
    pub fn add_trigger(&mut self, owner: ObjectId, name: impl Into<String>) -> Result<ObjectId, SceneError> {
        self.attach(owner, name.into(), Some(Vec::new()))
    }

    fn attach(
        &mut self,
        owner: ObjectId,
        name: String,
        events: Option<Vec<TriggerEvent>>,
    ) -> Result<ObjectId, SceneError> {
        self.object(owner)?;
        let id = self.allocate();
        self.entries.insert(id, Entry::Component(SceneComponent { name, owner, events }));
        self.object_mut(owner)?.components.push(id);
        Ok(id)
    }

    /// Append an event to a trigger
    pub fn add_event(
        &mut self,
        trigger: ObjectId,
        parameters: impl IntoIterator<Item = Option<ObjectId>>,
    ) -> Result<(), SceneError> {
        self.events_mut(trigger)?.push(TriggerEvent {
            parameters: parameters.into_iter().collect(),
        });
        Ok(())
    }

    /// Replace the parameters of an existing event
    pub fn set_event(
        &mut self,
        trigger: ObjectId,
        index: usize,
        parameters: impl IntoIterator<Item = Option<ObjectId>>,
    ) -> Result<(), SceneError> {
        let event = self
            .events_mut(trigger)?
            .get_mut(index)
            .ok_or(SceneError::NoSuchEvent { trigger, index })?;
        event.parameters = parameters.into_iter().collect();
        Ok(())
    }

    /// Remove every event of a trigger
    pub fn clear_events(&mut self, trigger: ObjectId) -> Result<(), SceneError> {
        self.events_mut(trigger)?.clear();
        Ok(())
    }

    /// Remove an object (with its subtree and components) or a single component.
    ///
    /// Returns `false` if the handle was not live.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        let Some(entry) = self.entries.shift_remove(&id) else {
            return false;
        };
        match entry {
            Entry::Component(component) => {
                if let Some(Entry::Object(owner)) = self.entries.get_mut(&component.owner) {
                    owner.components.retain(|c| *c != id);
                }
            }
            Entry::Object(object) => {
                match object.parent {
                    Some(parent) => {
                        if let Some(Entry::Object(parent)) = self.entries.get_mut(&parent) {
                            parent.children.retain(|c| *c != id);
                        }
                    }
                    None => self.roots.retain(|r| *r != id),
                }
                for component in object.components {
                    self.entries.shift_remove(&component);
                }
                for child in object.children {
                    self.remove(child);
                }
            }
        }
        true
    }

    /// Whether the handle names a live object or component
    pub fn contains(&self, id: ObjectId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of live objects and components
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the scene holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a hierarchy object
    pub fn object(&self, id: ObjectId) -> Result<&SceneObject, SceneError> {
        match self.entries.get(&id) {
            Some(Entry::Object(object)) => Ok(object),
            Some(Entry::Component(_)) => Err(SceneError::NotAnObject(id)),
            None => Err(SceneError::UnknownObject(id)),
        }
    }

    fn object_mut(&mut self, id: ObjectId) -> Result<&mut SceneObject, SceneError> {
        match self.entries.get_mut(&id) {
            Some(Entry::Object(object)) => Ok(object),
            Some(Entry::Component(_)) => Err(SceneError::NotAnObject(id)),
            None => Err(SceneError::UnknownObject(id)),
        }
    }

    /// Look up a component
    pub fn component(&self, id: ObjectId) -> Option<&SceneComponent> {
        match self.entries.get(&id) {
            Some(Entry::Component(component)) => Some(component),
            _ => None,
        }
    }

    fn events_mut(&mut self, trigger: ObjectId) -> Result<&mut Vec<TriggerEvent>, SceneError> {
        match self.entries.get_mut(&trigger) {
            Some(Entry::Component(SceneComponent { events: Some(events), .. })) => Ok(events),
            Some(_) => Err(SceneError::NotATrigger(trigger)),
            None => Err(SceneError::UnknownObject(trigger)),
        }
    }

    /// Find an object by a `/`-separated path of names from a root
    pub fn find_path(&self, path: &str) -> Option<ObjectId> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        let first = segments.next()?;
        let mut current = self
            .roots
            .iter()
            .copied()
            .find(|id| self.name_of(*id) == Some(first))?;
        for segment in segments {
            current = self
                .object(current)
                .ok()?
                .children
                .iter()
                .copied()
                .find(|id| self.name_of(*id) == Some(segment))?;
        }
        Some(current)
    }

    /// Find a component on `owner` by name
    pub fn find_component(&self, owner: ObjectId, name: &str) -> Option<ObjectId> {
        self.object(owner)
            .ok()?
            .components
            .iter()
            .copied()
            .find(|id| self.name_of(*id) == Some(name))
    }

    fn name_of(&self, id: ObjectId) -> Option<&str> {
        match self.entries.get(&id)? {
            Entry::Object(object) => Some(&object.name),
            Entry::Component(component) => Some(&component.name),
        }
    }
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneSource for MemoryScene {
    fn roots(&self) -> Vec<ObjectId> {
        self.roots.clone()
    }

    fn trigger_components(&self, object: ObjectId) -> Vec<ObjectId> {
        self.object(object)
            .map(|o| {
                o.components
                    .iter()
                    .copied()
                    .filter(|c| self.is_trigger_component(*c))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn children(&self, object: ObjectId) -> Vec<ObjectId> {
        self.object(object).map(|o| o.children.clone()).unwrap_or_default()
    }

    fn container_parent(&self, object: ObjectId) -> Option<ObjectId> {
        self.object(object).ok()?.parent
    }

    fn outbound_references(&self, trigger: ObjectId) -> Vec<Option<ObjectId>> {
        let Some(SceneComponent { events: Some(events), .. }) = self.component(trigger) else {
            return Vec::new();
        };
        events
            .iter()
            .flat_map(|event| event.parameters.iter())
            .map(|param| param.filter(|id| self.contains(*id)))
            .collect()
    }

    fn is_trigger_component(&self, component: ObjectId) -> bool {
        matches!(self.component(component), Some(SceneComponent { events: Some(_), .. }))
    }

    fn owner(&self, object: ObjectId) -> ObjectId {
        self.component(object).map_or(object, |c| c.owner)
    }

    fn display_name(&self, object: ObjectId) -> String {
        self.name_of(object).unwrap_or("?").to_string()
    }
}
