// SPDX-License-Identifier: MIT OR Apache-2.0
//! Visual parameters for drawing a trigger graph.

use egui::Color32;
use serde::{Deserialize, Serialize};

/// Axis along which layers advance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LayoutDirection {
    /// Layers are columns, edges leave boxes on the right
    #[default]
    LeftToRight,
    /// Layers are rows, edges leave boxes at the bottom
    TopToBottom,
}

/// Colors, spacing and stroke settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphStyle {
    /// Layer axis
    pub direction: LayoutDirection,
    /// Box fill for trigger nodes
    pub trigger_color: [u8; 3],
    /// Box fill for plain target nodes
    pub target_color: [u8; 3],
    /// Edge color between different objects
    pub action_color: [u8; 3],
    /// Edge color when source and target share an owner
    pub self_action_color: [u8; 3],
    /// Edge underlay color
    pub outline_color: [u8; 3],
    /// Label color
    pub text_color: [u8; 3],
    /// Label font size in points
    pub font_size: f32,
    /// Space between label and box edge
    pub box_padding: [f32; 2],
    /// Box corner radius
    pub box_rounding: f32,
    /// Gap between consecutive layers
    pub layer_spacing: f32,
    /// Gap between boxes of one layer
    pub node_spacing: f32,
    /// Empty border around the canvas
    pub margin: f32,
    /// Width of the edge underlay
    pub outline_width: f32,
    /// Width of the colored edge stroke
    pub edge_width: f32,
    /// How many times each edge stroke is painted
    pub stroke_repeats: u32,
    /// Control point offset of edge curves
    pub curvature: f32,
    /// Line segments per edge curve
    pub curve_segments: usize,
}

impl Default for GraphStyle {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::LeftToRight,
            trigger_color: [70, 100, 130],
            target_color: [90, 120, 70],
            action_color: [230, 180, 60],
            self_action_color: [110, 200, 230],
            outline_color: [0, 0, 0],
            text_color: [255, 255, 255],
            font_size: 12.0,
            box_padding: [10.0, 6.0],
            box_rounding: 4.0,
            layer_spacing: 80.0,
            node_spacing: 12.0,
            margin: 24.0,
            outline_width: 4.0,
            edge_width: 2.0,
            stroke_repeats: 3,
            curvature: 50.0,
            curve_segments: 32,
        }
    }
}

impl GraphStyle {
    /// Convert a stored RGB triple
    pub fn color(rgb: [u8; 3]) -> Color32 {
        let [r, g, b] = rgb;
        Color32::from_rgb(r, g, b)
    }
}
