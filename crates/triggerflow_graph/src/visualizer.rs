// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host-facing controller.
//!
//! The host delivers events; the visualizer never polls on its own:
//! - [`Visualizer::on_source_changed`] after a structural change in the source
//! - [`Visualizer::on_tick`] once per host tick, to catch reference edits
//! - [`Visualizer::ui`] whenever the graph should be drawn

use crate::canvas::RenderError;
use crate::fingerprint::ChangeCheck;
use crate::layers::BuildError;
use crate::node::Node;
use crate::snapshot::GraphSnapshot;
use crate::source::SceneSource;
use crate::style::GraphStyle;
use crate::ui::{self, GraphView, RenderOutcome};

/// Current graph, or why there is none
#[derive(Debug, Clone)]
pub enum GraphState {
    /// Nothing to display
    Empty(BuildError),
    /// A built snapshot
    Ready(GraphSnapshot),
}

/// Callback invoked with the node whose box was clicked
pub type ActivationCallback = Box<dyn FnMut(&Node)>;

/// Owns a source, its current snapshot and the view drawing it
pub struct Visualizer<S: SceneSource> {
    source: S,
    state: GraphState,
    style: GraphStyle,
    view: GraphView,
    last_error: Option<RenderError>,
    selected: Option<String>,
    redraw_requested: bool,
    on_node_activated: Option<ActivationCallback>,
}

impl<S: SceneSource> Visualizer<S> {
    /// Create a visualizer and build the initial snapshot
    pub fn new(source: S, style: GraphStyle) -> Self {
        let mut visualizer = Self {
            source,
            state: GraphState::Empty(BuildError::EmptyGraph),
            style,
            view: GraphView::new(),
            last_error: None,
            selected: None,
            redraw_requested: false,
            on_node_activated: None,
        };
        visualizer.rebuild();
        visualizer
    }

    /// Register the activation callback
    pub fn set_on_node_activated(&mut self, callback: impl FnMut(&Node) + 'static) {
        self.on_node_activated = Some(Box::new(callback));
    }

    /// The source being visualized
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Mutable access to the source; call [`Self::on_source_changed`] after structural edits
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Swap in a new source without rebuilding
    pub fn replace_source(&mut self, source: S) -> S {
        std::mem::replace(&mut self.source, source)
    }

    /// Current graph state
    pub fn state(&self) -> &GraphState {
        &self.state
    }

    /// Current snapshot, if any
    pub fn snapshot(&self) -> Option<&GraphSnapshot> {
        match &self.state {
            GraphState::Ready(snapshot) => Some(snapshot),
            GraphState::Empty(_) => None,
        }
    }

    /// Drawing style
    pub fn style(&self) -> &GraphStyle {
        &self.style
    }

    /// Replace the drawing style
    pub fn set_style(&mut self, style: GraphStyle) {
        self.style = style;
        self.redraw_requested = true;
    }

    /// Failure of the most recent render pass
    pub fn last_render_error(&self) -> Option<&RenderError> {
        self.last_error.as_ref()
    }

    /// Label of the last activated node
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Whether a redraw was requested since the last call; clears the request
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Rebuild the snapshot from scratch
    pub fn on_source_changed(&mut self) {
        self.rebuild();
    }

    /// Rebuild if the live references no longer match the snapshot.
    ///
    /// Returns whether a rebuild happened.
    pub fn on_tick(&mut self) -> bool {
        let GraphState::Ready(snapshot) = &self.state else {
            return false;
        };
        match snapshot.check_for_changes(&self.source) {
            ChangeCheck::Unchanged => false,
            ChangeCheck::Changed { stored, current } => {
                tracing::debug!("Trigger references changed ({stored} -> {current}), rebuilding");
                self.rebuild();
                true
            }
        }
    }

    fn rebuild(&mut self) {
        self.state = match GraphSnapshot::build(&self.source) {
            Ok(snapshot) => GraphState::Ready(snapshot),
            Err(reason) => {
                tracing::debug!("No trigger graph: {reason}");
                GraphState::Empty(reason)
            }
        };
        self.last_error = None;
        self.redraw_requested = true;
    }

    /// Draw the current state
    pub fn ui(&mut self, ui: &mut egui::Ui) -> RenderOutcome {
        let snapshot = match &self.state {
            GraphState::Ready(snapshot) => snapshot,
            GraphState::Empty(reason) => {
                ui::empty_placeholder(ui, reason);
                return RenderOutcome {
                    scroll: self.view.scroll,
                    ..RenderOutcome::default()
                };
            }
        };

        if let Some(error) = &self.last_error {
            ui::error_panel(ui, error);
        }

        let outcome = self.view.ui(ui, snapshot, &self.style);
        if outcome.error.is_some() && self.last_error.is_none() {
            ui.ctx().request_repaint();
        }
        self.last_error.clone_from(&outcome.error);

        if let Some(node) = outcome.activated.and_then(|id| snapshot.node(id)) {
            tracing::debug!("Activated {}", node.display_label());
            self.selected = Some(node.display_label().to_string());
            if let Some(callback) = &mut self.on_node_activated {
                callback(node);
            }
        }
        outcome
    }

    /// Draw the one-line status summary
    pub fn status_bar(&self, ui: &mut egui::Ui) {
        ui::status_bar(ui, self.snapshot(), self.selected());
    }
}

impl<S: SceneSource + std::fmt::Debug> std::fmt::Debug for Visualizer<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Visualizer")
            .field("source", &self.source)
            .field("state", &self.state)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{self, EdgeKind, RectCache};
    use crate::scene::MemoryScene;
    use crate::source::ObjectId;
    use egui::{Pos2, Vec2};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn measure(label: &str) -> Vec2 {
        Vec2::new(label.len() as f32 * 8.0, 14.0)
    }

    fn routes(snapshot: &GraphSnapshot) -> Vec<canvas::EdgeRoute> {
        let style = GraphStyle::default();
        let mut rects = RectCache::new();
        canvas::layout(snapshot, &style, Pos2::ZERO, measure, &mut rects);
        canvas::route_edges(snapshot, &rects, style.direction).unwrap()
    }

    fn switch_and_lamp() -> (MemoryScene, ObjectId) {
        let mut scene = MemoryScene::new();
        let switch = scene.add_root("Switch");
        let lamp = scene.add_root("Lamp");
        let trigger = scene.add_trigger(switch, "OnFlip").unwrap();
        scene.add_event(trigger, [Some(lamp)]).unwrap();
        (scene, trigger)
    }

    /// Run one headless egui pass drawing `visualizer` in a central panel
    fn frame(
        ctx: &egui::Context,
        visualizer: &mut Visualizer<MemoryScene>,
        events: Vec<egui::Event>,
    ) -> (RenderOutcome, egui::FullOutput) {
        let input = egui::RawInput {
            events,
            ..Default::default()
        };
        let mut outcome = RenderOutcome::default();
        let output = ctx.run(input, |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                outcome = visualizer.ui(ui);
            });
        });
        (outcome, output)
    }

    fn button(pos: Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        }
    }

    fn shows_text(output: &egui::FullOutput, needle: &str) -> bool {
        output.shapes.iter().any(|clipped| {
            matches!(&clipped.shape, egui::Shape::Text(text) if text.galley.text().contains(needle))
        })
    }

    #[test]
    fn test_trigger_without_targets() {
        let mut scene = MemoryScene::new();
        let root = scene.add_root("Idle");
        scene.add_trigger(root, "OnIdle").unwrap();

        let visualizer = Visualizer::new(scene, GraphStyle::default());
        let snapshot = visualizer.snapshot().unwrap();
        assert_eq!(snapshot.layers().len(), 1);
        assert_eq!(snapshot.node_count(), 1);
        assert_eq!(snapshot.edge_count(), 0);
    }

    #[test]
    fn test_sibling_root_target_shares_layer() {
        let mut scene = MemoryScene::new();
        let a = scene.add_root("A");
        let b = scene.add_root("B");
        let trigger = scene.add_trigger(a, "OnUse").unwrap();
        scene.add_event(trigger, [Some(b)]).unwrap();

        let visualizer = Visualizer::new(scene, GraphStyle::default());
        let snapshot = visualizer.snapshot().unwrap();
        assert_eq!(snapshot.layers().len(), 1);
        assert_eq!(snapshot.layers().at_depth(0).len(), 2);

        let routes = routes(snapshot);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].kind, EdgeKind::Action);
    }

    #[test]
    fn test_nested_target_gets_own_layer() {
        let mut scene = MemoryScene::new();
        let a = scene.add_root("A");
        let holder = scene.add_root("Holder");
        let b = scene.add_child(holder, "B").unwrap();
        let trigger = scene.add_trigger(a, "OnUse").unwrap();
        scene.add_event(trigger, [Some(b)]).unwrap();

        let visualizer = Visualizer::new(scene, GraphStyle::default());
        assert_eq!(visualizer.snapshot().unwrap().layers().len(), 2);
    }

    #[test]
    fn test_self_reference_is_self_action() {
        let mut scene = MemoryScene::new();
        let door = scene.add_root("Door");
        let animator = scene.add_component(door, "Animator").unwrap();
        let trigger = scene.add_trigger(door, "OnOpen").unwrap();
        scene.add_event(trigger, [Some(animator)]).unwrap();

        let visualizer = Visualizer::new(scene, GraphStyle::default());
        let snapshot = visualizer.snapshot().unwrap();
        let routes = routes(snapshot);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].kind, EdgeKind::SelfAction);
    }

    #[test]
    fn test_duplicate_reference_single_target() {
        let mut scene = MemoryScene::new();
        let a = scene.add_root("A");
        let lamp = scene.add_root("Lamp");
        let trigger = scene.add_trigger(a, "OnUse").unwrap();
        scene.add_event(trigger, [Some(lamp)]).unwrap();
        scene.add_event(trigger, [Some(lamp)]).unwrap();

        let visualizer = Visualizer::new(scene, GraphStyle::default());
        let snapshot = visualizer.snapshot().unwrap();
        let source = snapshot.roots()[0];
        assert_eq!(snapshot.node(source).unwrap().targets.len(), 1);
    }

    #[test]
    fn test_removing_all_triggers_empties_graph() {
        let mut scene = MemoryScene::new();
        let a = scene.add_root("A");
        let trigger = scene.add_trigger(a, "OnUse").unwrap();

        let mut visualizer = Visualizer::new(scene, GraphStyle::default());
        assert!(visualizer.snapshot().is_some());

        visualizer.source_mut().remove(trigger);
        visualizer.on_source_changed();
        assert!(matches!(visualizer.state(), GraphState::Empty(BuildError::EmptyGraph)));
        assert!(!visualizer.on_tick());
    }

    #[test]
    fn test_tick_rebuilds_only_on_reference_change() {
        let mut scene = MemoryScene::new();
        let a = scene.add_root("A");
        let lamp = scene.add_root("Lamp");
        let fan = scene.add_root("Fan");
        let trigger = scene.add_trigger(a, "OnUse").unwrap();
        scene.add_event(trigger, [Some(lamp)]).unwrap();

        let mut visualizer = Visualizer::new(scene, GraphStyle::default());
        assert!(visualizer.take_redraw_request());
        assert!(!visualizer.on_tick());
        assert!(!visualizer.take_redraw_request());

        visualizer.source_mut().set_event(trigger, 0, [Some(fan)]).unwrap();
        assert!(visualizer.on_tick());
        assert!(visualizer.take_redraw_request());

        let snapshot = visualizer.snapshot().unwrap();
        let target = snapshot.node(snapshot.node(snapshot.roots()[0]).unwrap().targets[0]).unwrap();
        assert_eq!(target.primary_object(), Some(fan));
        assert!(!visualizer.on_tick());
    }

    #[test]
    fn test_replace_source_keeps_snapshot_until_changed() {
        let mut scene = MemoryScene::new();
        let a = scene.add_root("A");
        scene.add_trigger(a, "OnUse").unwrap();

        let mut visualizer = Visualizer::new(scene, GraphStyle::default());
        visualizer.replace_source(MemoryScene::new());
        assert!(visualizer.snapshot().is_some());

        visualizer.on_source_changed();
        assert!(visualizer.snapshot().is_none());
        assert_eq!(visualizer.source().len(), 0);
    }

    #[test]
    fn test_trigger_targeting_own_object_is_self_action() {
        let mut scene = MemoryScene::new();
        let door = scene.add_root("Door");
        let trigger = scene.add_trigger(door, "OnOpen").unwrap();
        scene.add_event(trigger, [Some(door)]).unwrap();

        let visualizer = Visualizer::new(scene, GraphStyle::default());
        let snapshot = visualizer.snapshot().unwrap();
        assert_eq!(snapshot.node_count(), 2);
        let routes = routes(snapshot);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].kind, EdgeKind::SelfAction);
        let target = snapshot.node(routes[0].target).unwrap();
        assert_eq!(target.owner(), Some(door));
    }

    #[test]
    fn test_click_fires_activation_callback() {
        let (scene, trigger) = switch_and_lamp();
        let mut visualizer = Visualizer::new(scene, GraphStyle::default());
        let activated = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&activated);
        visualizer.set_on_node_activated(move |node| sink.borrow_mut().push(node.primary_object()));

        let ctx = egui::Context::default();
        frame(&ctx, &mut visualizer, Vec::new());

        let switch = visualizer.snapshot().unwrap().roots()[0];
        let label = visualizer.snapshot().unwrap().node(switch).unwrap().display_label().to_string();
        let pos = visualizer.view.rects().get(switch).unwrap().center();

        frame(&ctx, &mut visualizer, vec![egui::Event::PointerMoved(pos), button(pos, true)]);
        let (outcome, _) = frame(&ctx, &mut visualizer, vec![button(pos, false)]);

        assert_eq!(outcome.activated, Some(switch));
        assert_eq!(visualizer.selected(), Some(label.as_str()));
        assert_eq!(*activated.borrow(), vec![Some(trigger)]);
    }

    #[test]
    fn test_render_failure_reported_then_recovered() {
        let (scene, _) = switch_and_lamp();
        let mut visualizer = Visualizer::new(scene, GraphStyle::default());
        let snapshot = visualizer.snapshot().unwrap().clone();
        let lamp = snapshot.node(snapshot.roots()[0]).unwrap().targets[0];
        visualizer.state = GraphState::Ready(snapshot.without_layout_for(lamp));

        let ctx = egui::Context::default();
        let (outcome, _) = frame(&ctx, &mut visualizer, Vec::new());
        assert!(outcome.error.is_some());
        assert!(matches!(
            visualizer.last_render_error(),
            Some(RenderError::MissingLayoutRectangle { missing, .. }) if *missing == lamp
        ));
        assert!(visualizer.view.rects().is_empty());

        let (_, output) = frame(&ctx, &mut visualizer, Vec::new());
        assert!(shows_text(&output, "Graph render failed"));

        visualizer.on_source_changed();
        assert!(visualizer.last_render_error().is_none());
        let (outcome, output) = frame(&ctx, &mut visualizer, Vec::new());
        assert!(outcome.error.is_none());
        assert!(!shows_text(&output, "Graph render failed"));
        assert_eq!(visualizer.view.rects().len(), snapshot.node_count());
    }

    #[test]
    fn test_empty_graph_shows_placeholder() {
        let mut scene = MemoryScene::new();
        scene.add_root("Nothing");
        let mut visualizer = Visualizer::new(scene, GraphStyle::default());

        let ctx = egui::Context::default();
        let (outcome, output) = frame(&ctx, &mut visualizer, Vec::new());
        assert!(outcome.error.is_none());
        assert!(outcome.activated.is_none());
        assert!(shows_text(&output, "Nothing to display"));
        assert!(visualizer.view.rects().is_empty());
    }
}
