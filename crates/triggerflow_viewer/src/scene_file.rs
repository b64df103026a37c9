// SPDX-License-Identifier: MIT OR Apache-2.0
//! RON scene descriptions.
//!
//! A scene file lists root objects with their components and children.
//! Trigger events name their parameters by path:
//! - `"Hall/Door"` addresses an object by the names from its root down
//! - `"Hall/Door#Animator"` addresses a component on that object
//! - `None` is an unset parameter
//!
//! Paths are resolved after the whole hierarchy exists, so an event may refer
//! to objects declared later in the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use triggerflow_graph::scene::SceneError;
use triggerflow_graph::{MemoryScene, ObjectId};

/// Scene shown when no file is given on the command line
pub const DEMO_SCENE: &str = include_str!("../assets/demo_scene.ron");

/// Scene file errors
#[derive(Debug, Error)]
pub enum SceneFileError {
    /// Reading the file failed
    #[error("Failed to read scene {}: {source}", path.display())]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// The document is not valid RON for a scene
    #[error("Invalid scene description: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// An event parameter names nothing in the scene
    #[error("Trigger '{trigger}' references unknown path '{path}'")]
    UnknownReference {
        /// Path of the trigger component holding the event
        trigger: String,
        /// Unresolved parameter path
        path: String,
    },

    /// The hierarchy could not be assembled
    #[error("Scene construction failed: {0}")]
    Scene(#[from] SceneError),
}

/// Root of a scene description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneFile {
    /// Top-level objects, in display order
    pub roots: Vec<ObjectSpec>,
}

/// One object of the hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectSpec {
    /// Object name, unique among its siblings for path lookup
    pub name: String,
    /// Components attached to the object
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    /// Contained objects
    #[serde(default)]
    pub children: Vec<ObjectSpec>,
}

/// A component on an object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ComponentSpec {
    /// A component that fires no events
    Plain(String),
    /// A trigger component with its events' parameter paths
    Trigger {
        /// Component name
        name: String,
        /// One parameter list per event
        #[serde(default)]
        events: Vec<Vec<Option<String>>>,
    },
}

/// Trigger whose events still need their paths resolved
struct PendingTrigger<'a> {
    id: ObjectId,
    path: String,
    events: &'a [Vec<Option<String>>],
}

impl SceneFile {
    /// Parse a scene description
    pub fn parse(text: &str) -> Result<Self, SceneFileError> {
        Ok(ron::from_str(text)?)
    }

    /// Read and build the scene at `path`
    pub fn load(path: &Path) -> Result<MemoryScene, SceneFileError> {
        let text = std::fs::read_to_string(path).map_err(|source| SceneFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let scene = Self::parse(&text)?.to_scene()?;
        tracing::info!("Loaded scene {} ({} entries)", path.display(), scene.len());
        Ok(scene)
    }

    /// Build the built-in demonstration scene
    pub fn demo() -> Result<MemoryScene, SceneFileError> {
        Self::parse(DEMO_SCENE)?.to_scene()
    }

    /// Build a [`MemoryScene`] from this description
    pub fn to_scene(&self) -> Result<MemoryScene, SceneFileError> {
        let mut scene = MemoryScene::new();
        let mut pending = Vec::new();
        for root in &self.roots {
            let id = scene.add_root(root.name.as_str());
            add_object(&mut scene, id, root, &root.name, &mut pending)?;
        }

        for trigger in pending {
            for event in trigger.events {
                let parameters = event
                    .iter()
                    .map(|parameter| match parameter {
                        Some(path) => resolve(&scene, path).map(Some).ok_or_else(|| {
                            SceneFileError::UnknownReference {
                                trigger: trigger.path.clone(),
                                path: path.clone(),
                            }
                        }),
                        None => Ok(None),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                scene.add_event(trigger.id, parameters)?;
            }
        }
        Ok(scene)
    }
}

fn add_object<'a>(
    scene: &mut MemoryScene,
    id: ObjectId,
    object: &'a ObjectSpec,
    path: &str,
    pending: &mut Vec<PendingTrigger<'a>>,
) -> Result<(), SceneFileError> {
    for component in &object.components {
        match component {
            ComponentSpec::Plain(name) => {
                scene.add_component(id, name.as_str())?;
            }
            ComponentSpec::Trigger { name, events } => {
                let trigger = scene.add_trigger(id, name.as_str())?;
                pending.push(PendingTrigger {
                    id: trigger,
                    path: format!("{path}#{name}"),
                    events,
                });
            }
        }
    }
    for child in &object.children {
        let child_id = scene.add_child(id, child.name.as_str())?;
        add_object(scene, child_id, child, &format!("{path}/{}", child.name), pending)?;
    }
    Ok(())
}

/// Resolve `"Object/Path"` or `"Object/Path#Component"`
fn resolve(scene: &MemoryScene, path: &str) -> Option<ObjectId> {
    match path.split_once('#') {
        Some((object, component)) => scene.find_component(scene.find_path(object)?, component),
        None => scene.find_path(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triggerflow_graph::{GraphSnapshot, SceneSource};

    #[test]
    fn test_demo_scene_builds_graph() {
        let scene = SceneFile::demo().unwrap();
        let snapshot = GraphSnapshot::build(&scene).unwrap();
        assert!(snapshot.node_count() > 3);
        assert!(snapshot.edge_count() > 0);
    }

    #[test]
    fn test_forward_reference() {
        let text = r#"
            SceneFile(roots: [
                ObjectSpec(name: "Switch", components: [
                    Trigger(name: "OnFlip", events: [[Some("Lamp"), None]]),
                ]),
                ObjectSpec(name: "Lamp", components: [Plain("Light")]),
            ])
        "#;
        let scene = SceneFile::parse(text).unwrap().to_scene().unwrap();
        let switch = scene.find_path("Switch").unwrap();
        let lamp = scene.find_path("Lamp").unwrap();
        let trigger = scene.find_component(switch, "OnFlip").unwrap();
        assert!(scene.is_trigger_component(trigger));
        assert_eq!(scene.outbound_references(trigger), vec![Some(lamp), None]);
    }

    #[test]
    fn test_component_path() {
        let text = r#"
            SceneFile(roots: [
                ObjectSpec(name: "Door", components: [
                    Plain("Animator"),
                    Trigger(name: "OnOpen", events: [[Some("Door#Animator")]]),
                ]),
            ])
        "#;
        let scene = SceneFile::parse(text).unwrap().to_scene().unwrap();
        let door = scene.find_path("Door").unwrap();
        let animator = scene.find_component(door, "Animator").unwrap();
        let trigger = scene.find_component(door, "OnOpen").unwrap();
        assert_eq!(scene.outbound_references(trigger), vec![Some(animator)]);
    }

    #[test]
    fn test_nested_path() {
        let text = r#"
            SceneFile(roots: [
                ObjectSpec(name: "Plate", components: [
                    Trigger(name: "OnStep", events: [[Some("Hall/Vault/Alarm")]]),
                ]),
                ObjectSpec(name: "Hall", children: [
                    ObjectSpec(name: "Vault", children: [ObjectSpec(name: "Alarm")]),
                ]),
            ])
        "#;
        let scene = SceneFile::parse(text).unwrap().to_scene().unwrap();
        let alarm = scene.find_path("Hall/Vault/Alarm").unwrap();
        assert_eq!(scene.containment_depth(alarm), 2);
    }

    #[test]
    fn test_unknown_reference() {
        let text = r#"
            SceneFile(roots: [
                ObjectSpec(name: "Switch", components: [
                    Trigger(name: "OnFlip", events: [[Some("Nowhere/Lamp")]]),
                ]),
            ])
        "#;
        let err = SceneFile::parse(text).unwrap().to_scene().unwrap_err();
        match err {
            SceneFileError::UnknownReference { trigger, path } => {
                assert_eq!(trigger, "Switch#OnFlip");
                assert_eq!(path, "Nowhere/Lamp");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            SceneFile::parse("SceneFile(roots: 3)"),
            Err(SceneFileError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("triggerflow_missing_scene.ron");
        assert!(matches!(SceneFile::load(&path), Err(SceneFileError::Io { .. })));
    }
}
