//! Tunables for the three views. Every struct deserializes with defaults so a
//! host can override single fields.

use serde::Deserialize;

use crate::components::viewport::ScaleExtent;

/// Shared viewport behaviour.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
	/// Share of the viewport a fitted bounding box fills.
	pub fit_fill: f64,
	/// Factor of one keyboard zoom step.
	pub zoom_step: f64,
	/// Length of animated zooms.
	pub zoom_ms: f64,
	/// Screen height kept free for page chrome in fullscreen.
	pub reserved_chrome: f64,
	/// Padding of the fullscreen container, on every side.
	pub fullscreen_padding: f64,
}

impl Default for ViewportConfig {
	fn default() -> Self {
		Self {
			fit_fill: 0.85,
			zoom_step: 1.2,
			zoom_ms: 500.0,
			reserved_chrome: 100.0,
			fullscreen_padding: 16.0,
		}
	}
}

/// Force-directed relationship graph.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	/// Rest length of every link.
	pub link_distance: f64,
	/// Many-body strength; negative repels.
	pub repulsion: f64,
	/// Added to the kind radius for collisions.
	pub collision_padding: f64,
	/// Zoom limits.
	pub zoom: ScaleExtent,
	/// Radius multiplier of the hovered node.
	pub hover_radius_factor: f64,
	/// Opacity of nodes outside the hover neighbourhood.
	pub dim_node_opacity: f64,
	/// Opacity of edges outside the hover neighbourhood.
	pub dim_edge_opacity: f64,
	/// Length of the highlight fade.
	pub hover_ms: f64,
	/// Narrowest inline canvas.
	pub min_width: f64,
	/// Canvas height outside fullscreen.
	pub inline_height: f64,
	/// Fit, keyboard zoom and fullscreen sizing.
	pub viewport: ViewportConfig,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			link_distance: 80.0,
			repulsion: -200.0,
			collision_padding: 8.0,
			zoom: ScaleExtent::DEFAULT,
			hover_radius_factor: 1.3,
			dim_node_opacity: 0.2,
			dim_edge_opacity: 0.1,
			hover_ms: 200.0,
			min_width: 500.0,
			inline_height: 400.0,
			viewport: ViewportConfig::default(),
		}
	}
}

/// Collapsible hierarchy tree.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
	/// Distance between depth levels.
	pub depth_spacing: f64,
	/// Distance between adjacent leaves.
	pub sibling_spacing: f64,
	/// Gap between the canvas edge and the root.
	pub margin_left: f64,
	/// Length of expand and collapse animations.
	pub transition_ms: f64,
	/// Zoom limits.
	pub zoom: ScaleExtent,
	/// Narrowest inline canvas.
	pub min_width: f64,
	/// Canvas height outside fullscreen.
	pub inline_height: f64,
	/// Fit, keyboard zoom and fullscreen sizing.
	pub viewport: ViewportConfig,
}

impl Default for TreeConfig {
	fn default() -> Self {
		Self {
			depth_spacing: 150.0,
			sibling_spacing: 24.0,
			margin_left: 90.0,
			transition_ms: 750.0,
			zoom: ScaleExtent::DEFAULT,
			min_width: 600.0,
			inline_height: 500.0,
			viewport: ViewportConfig::default(),
		}
	}
}

/// Effect distribution donut. Not zoomable.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
	/// Widest the chart canvas grows.
	pub max_width: f64,
	/// Canvas height.
	pub height: f64,
	/// Space between the donut and the canvas edge.
	pub margin: f64,
	/// Inner radius as a share of the outer one.
	pub hole: f64,
	/// Radial growth of a hovered slice.
	pub hover_grow: f64,
	/// Length of the slice hover animation.
	pub hover_ms: f64,
	/// Length of the initial sweep.
	pub intro_ms: f64,
}

impl Default for ChartConfig {
	fn default() -> Self {
		Self {
			max_width: 400.0,
			height: 300.0,
			margin: 40.0,
			hole: 0.5,
			hover_grow: 10.0,
			hover_ms: 200.0,
			intro_ms: 800.0,
		}
	}
}
