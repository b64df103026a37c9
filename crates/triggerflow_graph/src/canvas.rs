// SPDX-License-Identifier: MIT OR Apache-2.0
//! Canvas geometry: box placement, the per-pass rectangle cache and edge routes.
//!
//! Layers advance along the main axis (x for [`LayoutDirection::LeftToRight`],
//! y for [`LayoutDirection::TopToBottom`]); the boxes of one layer are stacked
//! along the cross axis and the stack is centered against the tallest layer.

use crate::node::NodeId;
use crate::snapshot::GraphSnapshot;
use crate::style::{GraphStyle, LayoutDirection};
use egui::{Pos2, Rect, Vec2};
use std::collections::HashMap;

/// Screen rectangles of the boxes drawn in the current pass
#[derive(Debug, Clone, Default)]
pub struct RectCache {
    rects: HashMap<NodeId, Rect>,
}

impl RectCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every rectangle
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Record the rectangle of a node
    pub fn insert(&mut self, node: NodeId, rect: Rect) {
        self.rects.insert(node, rect);
    }

    /// Rectangle of a node, if drawn this pass
    pub fn get(&self, node: NodeId) -> Option<Rect> {
        self.rects.get(&node).copied()
    }

    /// Number of recorded rectangles
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Node whose box contains `pos`
    pub fn node_at(&self, pos: Pos2) -> Option<NodeId> {
        self.rects
            .iter()
            .find(|(_, rect)| rect.contains(pos))
            .map(|(id, _)| *id)
    }
}

/// Error raised while resolving edges against the rectangle cache
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// An edge endpoint was never laid out in this pass
    #[error("No layout rectangle for node {missing:?} on edge {from:?} -> {to:?}")]
    MissingLayoutRectangle {
        /// Edge source
        from: NodeId,
        /// Edge target
        to: NodeId,
        /// Endpoint without a rectangle
        missing: NodeId,
    },
}

/// Edge semantics, used to pick the stroke color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    /// Source and target belong to different objects
    Action,
    /// Source and target belong to the same object
    SelfAction,
}

/// A resolved edge between two laid-out boxes
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRoute {
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Anchor on the source box
    pub from: Pos2,
    /// Anchor on the target box
    pub to: Pos2,
    /// Edge semantics
    pub kind: EdgeKind,
}

fn along(direction: LayoutDirection, main: f32, cross: f32) -> Vec2 {
    match direction {
        LayoutDirection::LeftToRight => Vec2::new(main, cross),
        LayoutDirection::TopToBottom => Vec2::new(cross, main),
    }
}

fn split(direction: LayoutDirection, size: Vec2) -> (f32, f32) {
    match direction {
        LayoutDirection::LeftToRight => (size.x, size.y),
        LayoutDirection::TopToBottom => (size.y, size.x),
    }
}

/// Place every box of `snapshot`, refilling `cache`.
///
/// `measure` returns the size of a label. Returns the canvas size including
/// margins.
pub fn layout(
    snapshot: &GraphSnapshot,
    style: &GraphStyle,
    origin: Pos2,
    mut measure: impl FnMut(&str) -> Vec2,
    cache: &mut RectCache,
) -> Vec2 {
    cache.clear();
    let direction = style.direction;
    let padding = Vec2::new(style.box_padding[0], style.box_padding[1]) * 2.0;

    // (node, box size) per layer, plus the layer's main thickness and cross length
    let mut columns = Vec::new();
    for (_, layer) in snapshot.layers().iter() {
        let boxes: Vec<(NodeId, Vec2)> = layer
            .iter()
            .filter_map(|id| snapshot.node(*id))
            .map(|node| (node.id, measure(node.display_label()) + padding))
            .collect();
        let thickness = boxes
            .iter()
            .map(|(_, size)| split(direction, *size).0)
            .fold(0.0, f32::max);
        let length = boxes.iter().map(|(_, size)| split(direction, *size).1).sum::<f32>()
            + style.node_spacing * boxes.len().saturating_sub(1) as f32;
        columns.push((boxes, thickness, length));
    }

    let cross_extent = columns.iter().map(|(_, _, length)| *length).fold(0.0, f32::max);
    let mut main = style.margin;
    for (boxes, thickness, length) in &columns {
        let mut cross = style.margin + (cross_extent - length) / 2.0;
        for (id, size) in boxes {
            let (box_main, box_cross) = split(direction, *size);
            let min = origin + along(direction, main + (thickness - box_main) / 2.0, cross);
            cache.insert(*id, Rect::from_min_size(min, *size));
            cross += box_cross + style.node_spacing;
        }
        main += thickness + style.layer_spacing;
    }

    let main_extent = (main - style.layer_spacing).max(style.margin) + style.margin;
    along(direction, main_extent, cross_extent + style.margin * 2.0)
}

/// Anchor points where edges leave and enter a box
pub fn anchors(direction: LayoutDirection, rect: Rect) -> (Pos2, Pos2) {
    match direction {
        LayoutDirection::LeftToRight => (rect.right_center(), rect.left_center()),
        LayoutDirection::TopToBottom => (rect.center_bottom(), rect.center_top()),
    }
}

/// Resolve every edge of `snapshot` against the rectangles of this pass
pub fn route_edges(
    snapshot: &GraphSnapshot,
    cache: &RectCache,
    direction: LayoutDirection,
) -> Result<Vec<EdgeRoute>, RenderError> {
    let mut routes = Vec::with_capacity(snapshot.edge_count());
    for node in snapshot.nodes().filter(|n| !n.targets.is_empty()) {
        for target_id in &node.targets {
            let missing = |missing| RenderError::MissingLayoutRectangle {
                from: node.id,
                to: *target_id,
                missing,
            };
            let source_rect = cache.get(node.id).ok_or_else(|| missing(node.id))?;
            let target_rect = cache.get(*target_id).ok_or_else(|| missing(*target_id))?;

            let target_owner = snapshot.node(*target_id).and_then(|t| t.owner());
            let kind = if node.owner().is_some() && node.owner() == target_owner {
                EdgeKind::SelfAction
            } else {
                EdgeKind::Action
            };

            routes.push(EdgeRoute {
                source: node.id,
                target: *target_id,
                from: anchors(direction, source_rect).0,
                to: anchors(direction, target_rect).1,
                kind,
            });
        }
    }
    Ok(routes)
}

/// Points along the edge curve between two anchors
pub fn curve_points(from: Pos2, to: Pos2, direction: LayoutDirection, curvature: f32, segments: usize) -> Vec<Pos2> {
    let (distance, _) = split(direction, to - from);
    let offset = (distance.abs() * 0.5).max(curvature * 0.5).min(curvature);
    let pull = along(direction, offset, 0.0);
    bezier_points(from, from + pull, to - pull, to, segments.max(1))
}

/// Generate points along a cubic bezier curve
fn bezier_points(p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2, segments: usize) -> Vec<Pos2> {
    let mut points = Vec::with_capacity(segments + 1);
    for i in 0..=segments {
        let t = i as f32 / segments as f32;
        let t2 = t * t;
        let t3 = t2 * t;
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let mt3 = mt2 * mt;

        let x = mt3 * p0.x + 3.0 * mt2 * t * p1.x + 3.0 * mt * t2 * p2.x + t3 * p3.x;
        let y = mt3 * p0.y + 3.0 * mt2 * t * p1.y + 3.0 * mt * t2 * p2.y + t3 * p3.y;

        points.push(Pos2::new(x, y));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;

    /// Every label is 10 points per character by 10 points
    fn measure(label: &str) -> Vec2 {
        Vec2::new(label.len() as f32 * 10.0, 10.0)
    }

    fn style(direction: LayoutDirection) -> GraphStyle {
        GraphStyle {
            direction,
            box_padding: [0.0, 0.0],
            layer_spacing: 100.0,
            node_spacing: 10.0,
            margin: 0.0,
            ..GraphStyle::default()
        }
    }

    /// Two root triggers in layer zero pointing at a nested target
    fn two_columns() -> (MemoryScene, GraphSnapshot) {
        let mut scene = MemoryScene::new();
        let a = scene.add_root("AA");
        let b = scene.add_root("BBBB");
        let holder = scene.add_root("Holder");
        let lamp = scene.add_child(holder, "Lamp").unwrap();
        for owner in [a, b] {
            let trigger = scene.add_trigger(owner, "OnUse").unwrap();
            scene.add_event(trigger, [Some(lamp)]).unwrap();
        }
        let snapshot = GraphSnapshot::build(&scene).unwrap();
        (scene, snapshot)
    }

    #[test]
    fn test_layers_become_columns() {
        let (_, snapshot) = two_columns();
        let mut cache = RectCache::new();
        let size = layout(&snapshot, &style(LayoutDirection::LeftToRight), Pos2::ZERO, measure, &mut cache);

        assert_eq!(cache.len(), 3);
        let first = snapshot.layers().at_depth(0);
        let a = cache.get(first[0]).unwrap();
        let b = cache.get(first[1]).unwrap();
        let lamp = cache.get(snapshot.layers().at_depth(1)[0]).unwrap();

        // Column zero is as wide as its widest box; narrower boxes are centered
        assert_eq!(b.width(), 40.0);
        assert_eq!(a.center().x, b.center().x);
        assert_eq!(b.top() - a.bottom(), 10.0);
        // Column one starts after the spacing and its single box is centered
        assert_eq!(lamp.left(), 140.0);
        assert_eq!(lamp.center().y, 15.0);
        assert_eq!(size, Vec2::new(180.0, 30.0));
    }

    #[test]
    fn test_top_to_bottom_swaps_axes() {
        let (_, snapshot) = two_columns();
        let mut cache = RectCache::new();
        layout(&snapshot, &style(LayoutDirection::TopToBottom), Pos2::ZERO, measure, &mut cache);

        let first = snapshot.layers().at_depth(0);
        let a = cache.get(first[0]).unwrap();
        let b = cache.get(first[1]).unwrap();
        let lamp = cache.get(snapshot.layers().at_depth(1)[0]).unwrap();
        assert_eq!(a.top(), b.top());
        assert!(b.left() > a.right());
        assert_eq!(lamp.top(), 110.0);
    }

    #[test]
    fn test_cache_is_refilled() {
        let (_, snapshot) = two_columns();
        let mut cache = RectCache::new();
        cache.insert(NodeId(99), Rect::from_min_size(Pos2::ZERO, Vec2::splat(5.0)));
        layout(&snapshot, &style(LayoutDirection::LeftToRight), Pos2::ZERO, measure, &mut cache);
        assert!(cache.get(NodeId(99)).is_none());
        assert_eq!(cache.len(), snapshot.node_count());
    }

    #[test]
    fn test_routes_use_side_anchors() {
        let (_, snapshot) = two_columns();
        let mut cache = RectCache::new();
        layout(&snapshot, &style(LayoutDirection::LeftToRight), Pos2::ZERO, measure, &mut cache);
        let routes = route_edges(&snapshot, &cache, LayoutDirection::LeftToRight).unwrap();

        assert_eq!(routes.len(), 2);
        for route in &routes {
            assert_eq!(route.from, cache.get(route.source).unwrap().right_center());
            assert_eq!(route.to, cache.get(route.target).unwrap().left_center());
            assert_eq!(route.kind, EdgeKind::Action);
        }
    }

    #[test]
    fn test_missing_rectangle_is_reported() {
        let (_, snapshot) = two_columns();
        let mut cache = RectCache::new();
        layout(&snapshot, &style(LayoutDirection::LeftToRight), Pos2::ZERO, measure, &mut cache);

        let lamp = snapshot.layers().at_depth(1)[0];
        let mut partial = RectCache::new();
        for node in snapshot.nodes().filter(|n| n.id != lamp) {
            partial.insert(node.id, cache.get(node.id).unwrap());
        }

        let err = route_edges(&snapshot, &partial, LayoutDirection::LeftToRight).unwrap_err();
        assert!(matches!(err, RenderError::MissingLayoutRectangle { missing, .. } if missing == lamp));
    }

    #[test]
    fn test_node_at() {
        let (_, snapshot) = two_columns();
        let mut cache = RectCache::new();
        layout(&snapshot, &style(LayoutDirection::LeftToRight), Pos2::ZERO, measure, &mut cache);

        let lamp = snapshot.layers().at_depth(1)[0];
        let center = cache.get(lamp).unwrap().center();
        assert_eq!(cache.node_at(center), Some(lamp));
        assert_eq!(cache.node_at(Pos2::new(-1.0, -1.0)), None);
    }

    #[test]
    fn test_curve_endpoints() {
        let from = Pos2::new(0.0, 0.0);
        let to = Pos2::new(200.0, 50.0);
        let points = curve_points(from, to, LayoutDirection::LeftToRight, 50.0, 16);
        assert_eq!(points.len(), 17);
        assert_eq!(points[0], from);
        assert!((points[16] - to).length() < 1e-3);
    }
}
