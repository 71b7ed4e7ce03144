use std::collections::HashMap;
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};

use super::forces;
use crate::components::scene::Point;
use crate::components::viewport::Bounds;
use crate::config::GraphConfig;
use crate::policy::GraphModel;

const ALPHA_MIN: f64 = 0.001;
const DRAG_ALPHA_TARGET: f64 = 0.3;
const RESIZE_ALPHA: f64 = 0.5;
const CENTER_STRENGTH: f64 = 0.1;
const COLLIDE_STRENGTH: f64 = 0.7;

#[derive(Clone, Debug, Default)]
pub struct BodyInfo {
	/// Index into [`GraphModel::nodes`].
	pub index: usize,
}

/// Positions produced by one simulation step, indexed like the model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LayoutFrame {
	pub nodes: Vec<Point>,
	pub edges: Vec<(Point, Point)>,
}

/// Force-directed placement of a [`GraphModel`].
///
/// `force_graph` integrates charge repulsion, velocity and damping; the
/// passes in [`forces`] add rest-length springs, centering and collisions.
/// Energy is tracked as a d3-style `alpha` that cools towards a target and
/// scales every pass, so the layout settles on its own.
pub struct ForceLayout {
	graph: ForceGraph<BodyInfo, ()>,
	handles: Vec<DefaultNodeIdx>,
	links: Vec<(usize, usize)>,
	radii: Vec<f64>,
	positions: Vec<Point>,
	pins: HashMap<usize, Point>,
	alpha: f64,
	alpha_target: f64,
	alpha_decay: f64,
	center: Point,
	link_distance: f64,
	stopped: bool,
}

impl ForceLayout {
	pub fn new(model: &GraphModel, width: f64, height: f64, config: &GraphConfig) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: config.repulsion.abs() as f32,
			// springs with a rest length are applied in forces::link
			force_spring: 0.0,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let center = Point::new(width / 2.0, height / 2.0);
		let n = model.nodes.len();
		let ring = 100.0_f64.max(n as f64 * 4.0);

		let mut handles = Vec::with_capacity(n);
		let mut positions = Vec::with_capacity(n);
		for i in 0..n {
			let angle = (i as f64) * 2.0 * PI / n as f64;
			let p = Point::new(
				center.x + ring * angle.cos(),
				center.y + ring * angle.sin(),
			);
			handles.push(graph.add_node(NodeData {
				x: p.x as f32,
				y: p.y as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: BodyInfo { index: i },
			}));
			positions.push(p);
		}

		let links = model.edges.iter().map(|e| (e.source, e.target)).collect();
		let radii = model
			.nodes
			.iter()
			.map(|node| node.kind.radius() + config.collision_padding)
			.collect();

		info!("force layout: {} bodies", n);
		Self {
			graph,
			handles,
			links,
			radii,
			positions,
			pins: HashMap::new(),
			alpha: 1.0,
			alpha_target: 0.0,
			alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
			center,
			link_distance: config.link_distance,
			stopped: false,
		}
	}

	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.handles.len()
	}

	pub fn is_empty(&self) -> bool {
		self.handles.is_empty()
	}

	#[cfg(test)]
	pub fn alpha(&self) -> f64 {
		self.alpha
	}

	/// Whether another `step` would move anything.
	pub fn is_running(&self) -> bool {
		!self.stopped && !self.is_empty() && (self.alpha >= ALPHA_MIN || !self.pins.is_empty())
	}

	/// Permanently halt the simulation. Called before the model is replaced.
	pub fn stop(&mut self) {
		self.stopped = true;
	}

	#[cfg(test)]
	pub fn is_stopped(&self) -> bool {
		self.stopped
	}

	/// Advance one tick and report positions. A settled or stopped layout
	/// returns its last positions unchanged.
	pub fn step(&mut self, dt: f32) -> LayoutFrame {
		if self.is_running() {
			self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
			self.graph.update(dt * self.alpha as f32);
			self.read_positions();

			let pinned = self.pinned_mask();
			forces::link(
				&mut self.positions,
				&self.links,
				self.link_distance,
				self.alpha,
				&pinned,
			);
			forces::center(&mut self.positions, self.center, CENTER_STRENGTH, &pinned);
			forces::collide(&mut self.positions, &self.radii, COLLIDE_STRENGTH, &pinned);
			for (&i, &p) in &self.pins {
				self.positions[i] = p;
			}
			self.write_positions();
		}
		self.frame()
	}

	pub fn frame(&self) -> LayoutFrame {
		LayoutFrame {
			nodes: self.positions.clone(),
			edges: self
				.links
				.iter()
				.map(|&(s, t)| (self.positions[s], self.positions[t]))
				.collect(),
		}
	}

	pub fn position(&self, node: usize) -> Option<Point> {
		self.positions.get(node).copied()
	}

	/// Topmost node whose circle contains `p` (world space).
	pub fn node_at(&self, p: Point) -> Option<usize> {
		self.positions
			.iter()
			.zip(&self.radii)
			.enumerate()
			.rev()
			.find(|(_, (pos, r))| pos.distance(p) <= **r)
			.map(|(i, _)| i)
	}

	/// World-space box around every body.
	pub fn content_bounds(&self) -> Bounds {
		Bounds::around_circles(self.positions.iter().copied().zip(self.radii.iter().copied()))
	}

	/// Pin `node` where it is and keep the simulation warm while dragged.
	pub fn drag_start(&mut self, node: usize) {
		let Some(p) = self.position(node) else {
			return;
		};
		debug!("drag start {node}");
		self.pins.insert(node, p);
		self.set_anchor(node, true);
		self.alpha_target = DRAG_ALPHA_TARGET;
		self.alpha = self.alpha.max(DRAG_ALPHA_TARGET);
	}

	pub fn drag_move(&mut self, node: usize, p: Point) {
		if let Some(pin) = self.pins.get_mut(&node) {
			*pin = p;
			self.positions[node] = p;
			self.write_positions();
		}
	}

	/// Release the pin; the node rejoins the simulation.
	pub fn drag_end(&mut self, node: usize) {
		if self.pins.remove(&node).is_none() {
			return;
		}
		debug!("drag end {node}");
		self.set_anchor(node, false);
		if self.pins.is_empty() {
			self.alpha_target = 0.0;
		}
	}

	#[cfg(test)]
	pub fn is_pinned(&self, node: usize) -> bool {
		self.pins.contains_key(&node)
	}

	/// Recenter on a new viewport and reheat.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.center = Point::new(width / 2.0, height / 2.0);
		self.alpha = self.alpha.max(RESIZE_ALPHA);
	}

	fn pinned_mask(&self) -> Vec<bool> {
		let mut mask = vec![false; self.positions.len()];
		for &i in self.pins.keys() {
			mask[i] = true;
		}
		mask
	}

	fn set_anchor(&mut self, node: usize, anchored: bool) {
		let handle = self.handles[node];
		self.graph.visit_nodes_mut(|body| {
			if body.index() == handle {
				body.data.is_anchor = anchored;
			}
		});
	}

	fn read_positions(&mut self) {
		let positions = &mut self.positions;
		self.graph.visit_nodes(|body| {
			positions[body.data.user_data.index] = Point::new(body.x() as f64, body.y() as f64);
		});
	}

	fn write_positions(&mut self) {
		let positions = &self.positions;
		self.graph.visit_nodes_mut(|body| {
			let p = positions[body.data.user_data.index];
			body.data.x = p.x as f32;
			body.data.y = p.y as f32;
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::{Effect, PolicyDocument, Statement, build_graph_model};

	fn layout() -> ForceLayout {
		let doc = PolicyDocument::new(vec![
			Statement::new(Effect::Allow)
				.with_actions(["s3:GetObject", "s3:PutObject"])
				.with_resources(["arn:aws:s3:::b"]),
			Statement::new(Effect::Deny).with_actions(["s3:GetObject"]),
		]);
		ForceLayout::new(&build_graph_model(&doc), 600.0, 400.0, &GraphConfig::default())
	}

	#[test]
	fn empty_model_never_runs() {
		let mut layout = ForceLayout::new(&GraphModel::default(), 600.0, 400.0, &GraphConfig::default());
		assert!(!layout.is_running());
		assert_eq!(layout.step(0.016), LayoutFrame::default());
		assert!(layout.content_bounds().is_degenerate());
	}

	#[test]
	fn frame_matches_model_shape() {
		let mut layout = layout();
		let frame = layout.step(0.016);
		assert_eq!(frame.nodes.len(), 5);
		assert_eq!(frame.edges.len(), 4);
	}

	#[test]
	fn cools_down_and_settles() {
		let mut layout = layout();
		let mut steps = 0;
		while layout.is_running() && steps < 1000 {
			layout.step(0.016);
			steps += 1;
		}
		assert!(!layout.is_running());
		assert!(steps < 400, "took {steps} steps");
	}

	#[test]
	fn drag_pins_then_releases() {
		let mut layout = layout();
		layout.drag_start(1);
		let target = Point::new(42.0, 24.0);
		layout.drag_move(1, target);
		for _ in 0..20 {
			let frame = layout.step(0.016);
			assert_eq!(frame.nodes[1], target);
		}
		assert!(layout.alpha() >= DRAG_ALPHA_TARGET);

		layout.drag_end(1);
		assert!(!layout.is_pinned(1));
		while layout.is_running() {
			layout.step(0.016);
		}
		assert!(layout.alpha() < ALPHA_MIN);
	}

	#[test]
	fn drag_keeps_a_settled_layout_alive() {
		let mut layout = layout();
		while layout.is_running() {
			layout.step(0.016);
		}
		layout.drag_start(0);
		assert!(layout.is_running());
	}

	#[test]
	fn stop_freezes_positions() {
		let mut layout = layout();
		layout.step(0.016);
		layout.stop();
		let before = layout.frame();
		assert_eq!(layout.step(0.016), before);
		layout.drag_start(0);
		assert!(!layout.is_running());
	}

	#[test]
	fn hit_test_uses_kind_radius() {
		let layout = layout();
		let p = layout.position(0).unwrap();
		assert_eq!(layout.node_at(p), Some(0));
		assert_eq!(layout.node_at(Point::new(-1e6, -1e6)), None);
	}
}
