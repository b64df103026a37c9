// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph painting with egui.
//!
//! Features:
//! - Layered boxes sized to their labels
//! - Edge curves with an outline underlay, colored by edge kind
//! - Click-to-activate on boxes
//! - Scrollable canvas
//! - Empty-graph placeholder and render failure panel

use crate::canvas::{self, EdgeKind, EdgeRoute, RectCache, RenderError};
use crate::layers::BuildError;
use crate::node::NodeId;
use crate::snapshot::GraphSnapshot;
use crate::style::GraphStyle;
use egui::{Color32, Pos2, Rect, Shape, Stroke, Vec2};

/// Arrow head size relative to the edge width
const ARROW_SCALE: f32 = 4.0;

/// Result of one render pass
#[derive(Debug, Clone, Default)]
pub struct RenderOutcome {
    /// Scroll offset after the pass
    pub scroll: Vec2,
    /// Node clicked during the pass
    pub activated: Option<NodeId>,
    /// Failure that aborted the pass
    pub error: Option<RenderError>,
}

/// Per-view drawing state
#[derive(Debug, Default)]
pub struct GraphView {
    /// Canvas scroll offset
    pub scroll: Vec2,
    /// Rectangles of the last pass
    rects: RectCache,
    /// Node under the pointer in the last pass
    hovered: Option<NodeId>,
}

impl GraphView {
    /// Create a new view
    pub fn new() -> Self {
        Self::default()
    }

    /// Rectangles recorded by the last pass
    pub fn rects(&self) -> &RectCache {
        &self.rects
    }

    /// Draw `snapshot` into a scroll area filling the available space
    pub fn ui(&mut self, ui: &mut egui::Ui, snapshot: &GraphSnapshot, style: &GraphStyle) -> RenderOutcome {
        let output = egui::ScrollArea::both()
            .id_salt("trigger_graph_canvas")
            .auto_shrink([false, false])
            .scroll_offset(self.scroll)
            .show(ui, |ui| self.draw(ui, snapshot, style));
        self.scroll = output.state.offset;

        match output.inner {
            Ok(activated) => RenderOutcome {
                scroll: self.scroll,
                activated,
                error: None,
            },
            Err(error) => {
                tracing::error!("Render pass aborted: {error}");
                self.rects.clear();
                RenderOutcome {
                    scroll: self.scroll,
                    activated: None,
                    error: Some(error),
                }
            }
        }
    }

    fn draw(
        &mut self,
        ui: &mut egui::Ui,
        snapshot: &GraphSnapshot,
        style: &GraphStyle,
    ) -> Result<Option<NodeId>, RenderError> {
        let font = egui::FontId::proportional(style.font_size);
        let origin = ui.cursor().min;
        let size = canvas::layout(
            snapshot,
            style,
            origin,
            |label| {
                ui.fonts(|fonts| {
                    fonts
                        .layout_no_wrap(label.to_owned(), font.clone(), Color32::WHITE)
                        .size()
                })
            },
            &mut self.rects,
        );
        let (_, response) = ui.allocate_exact_size(size, egui::Sense::click());

        // Resolve every edge before painting anything so a failed pass draws nothing
        let routes = canvas::route_edges(snapshot, &self.rects, style.direction)?;

        self.hovered = response.hover_pos().and_then(|pos| self.rects.node_at(pos));
        if self.hovered.is_some() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
        }

        let painter = ui.painter();
        for route in &routes {
            draw_edge(painter, route, style);
        }
        for node in snapshot.nodes() {
            if let Some(rect) = self.rects.get(node.id) {
                let fill = if node.is_plain_target() {
                    GraphStyle::color(style.target_color)
                } else {
                    GraphStyle::color(style.trigger_color)
                };
                self.draw_box(painter, rect, node.id, node.display_label(), fill, &font, style);
            }
        }

        let activated = if response.clicked() {
            response.interact_pointer_pos().and_then(|pos| self.rects.node_at(pos))
        } else {
            None
        };
        Ok(activated)
    }

    fn draw_box(
        &self,
        painter: &egui::Painter,
        rect: Rect,
        node: NodeId,
        label: &str,
        fill: Color32,
        font: &egui::FontId,
        style: &GraphStyle,
    ) {
        painter.rect_filled(rect, style.box_rounding, fill);
        if self.hovered == Some(node) {
            painter.rect_stroke(rect, style.box_rounding, Stroke::new(2.0, Color32::from_rgb(100, 150, 255)));
        }
        painter.text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            label,
            font.clone(),
            GraphStyle::color(style.text_color),
        );
    }
}

/// Paint one edge: outline passes first, then colored passes on top
fn draw_edge(painter: &egui::Painter, route: &EdgeRoute, style: &GraphStyle) {
    let color = match route.kind {
        EdgeKind::Action => GraphStyle::color(style.action_color),
        EdgeKind::SelfAction => GraphStyle::color(style.self_action_color),
    };
    let points = canvas::curve_points(route.from, route.to, style.direction, style.curvature, style.curve_segments);
    for pass in stroke_passes(style, color) {
        painter.add(Shape::line(points.clone(), pass));
    }

    if let [.., before, tip] = points.as_slice() {
        paint_arrow_head(painter, *tip, *tip - *before, style.edge_width * ARROW_SCALE, color);
    }
}

/// Strokes of one edge in paint order: every outline pass, then every colored pass
fn stroke_passes(style: &GraphStyle, color: Color32) -> Vec<Stroke> {
    let outline = Stroke::new(style.outline_width, GraphStyle::color(style.outline_color));
    let stroke = Stroke::new(style.edge_width, color);
    let repeats = style.stroke_repeats as usize;
    std::iter::repeat(outline)
        .take(repeats)
        .chain(std::iter::repeat(stroke).take(repeats))
        .collect()
}

fn paint_arrow_head(painter: &egui::Painter, tip: Pos2, direction: Vec2, size: f32, color: Color32) {
    let dir = direction.normalized();
    if dir == Vec2::ZERO || !dir.is_finite() {
        return;
    }
    let back = tip - dir * size;
    let side = dir.rot90() * (size * 0.5);
    painter.add(Shape::convex_polygon(vec![tip, back + side, back - side], color, Stroke::NONE));
}

/// Centered message shown when there is nothing to draw
pub fn empty_placeholder(ui: &mut egui::Ui, reason: &BuildError) {
    ui.centered_and_justified(|ui| {
        ui.label(egui::RichText::new(reason.to_string()).color(Color32::from_gray(150)));
    });
}

/// Inline panel describing a failed render pass
pub fn error_panel(ui: &mut egui::Ui, error: &RenderError) {
    egui::Frame::group(ui.style())
        .fill(Color32::from_rgb(60, 20, 20))
        .stroke(Stroke::new(1.0, Color32::from_rgb(200, 80, 80)))
        .show(ui, |ui| {
            ui.colored_label(Color32::from_rgb(255, 120, 120), "Graph render failed");
            ui.label(error.to_string());
        });
}

/// One-line summary of the snapshot
pub fn status_bar(ui: &mut egui::Ui, snapshot: Option<&GraphSnapshot>, selected: Option<&str>) {
    let summary = match snapshot {
        Some(snapshot) => format!(
            "Nodes: {} | Edges: {} | Layers: {} | Fingerprint: {} | Selected: {}",
            snapshot.node_count(),
            snapshot.edge_count(),
            snapshot.layers().len(),
            snapshot.fingerprint(),
            selected.unwrap_or("-"),
        ),
        None => "No graph".to_string(),
    };
    ui.label(
        egui::RichText::new(summary)
            .size(11.0)
            .color(Color32::from_gray(150)),
    );
}
