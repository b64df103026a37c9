// SPDX-License-Identifier: MIT OR Apache-2.0
//! Layered layout and drawing of trigger event graphs.
//!
//! Given a forest of objects in which some carry *trigger* components, and each
//! trigger fires events that reference other objects, this crate builds a
//! directed graph from triggers to their targets, arranges it into depth
//! layers, orders every layer to keep related nodes close, and draws it with
//! egui as boxes joined by curved edges.
//!
//! ## Architecture
//!
//! The pipeline runs on every rebuild:
//! - [`builder`] walks a [`SceneSource`] and produces trigger and target nodes
//! - [`layers`] groups nodes by depth and orders each layer
//! - [`snapshot`] holds the immutable result ([`GraphSnapshot`])
//! - [`fingerprint`] decides when the snapshot is stale
//! - [`canvas`] and [`ui`] position and paint the snapshot
//!
//! [`Visualizer`] ties these together behind the host-facing events
//! (`on_source_changed`, `on_tick`, `ui`).

pub mod source;
pub mod scene;
pub mod node;
pub mod builder;
pub mod layers;
pub mod snapshot;
pub mod fingerprint;
pub mod style;
pub mod canvas;
pub mod ui;
pub mod visualizer;

pub use node::{Component, Node, NodeId, NodeKind};
pub use source::{ObjectId, SceneSource};
pub use scene::MemoryScene;
pub use snapshot::GraphSnapshot;
pub use style::{GraphStyle, LayoutDirection};
pub use visualizer::Visualizer;
