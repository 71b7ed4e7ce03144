use log::{debug, info};

use super::highlight::Highlighter;
use super::simulation::{ForceLayout, LayoutFrame};
use crate::components::canvas::CanvasView;
use crate::components::scene::{Point, Primitive, Scene, Stroke, TextAlign, node_color, palette};
use crate::components::viewport::{Bounds, KeyBindings, Viewport};
use crate::config::GraphConfig;
use crate::policy::{EdgeKind, GraphModel, KindFilter, truncate};

const LABEL_CHARS: usize = 15;
/// Pointer travel below which a press counts as a click, in pixels.
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub node: Option<usize>,
	pub start: Point,
	pub node_start: Point,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub last: Point,
}

/// Everything the graph canvas needs between frames.
pub struct PolicyGraphState {
	model: GraphModel,
	layout: ForceLayout,
	pub viewport: Viewport,
	highlight: Highlighter,
	filter: KindFilter,
	pub drag: DragState,
	pub pan: PanState,
	pointer: Option<Point>,
	frame: LayoutFrame,
}

impl PolicyGraphState {
	pub fn new(model: GraphModel, width: f64, height: f64, config: &GraphConfig) -> Self {
		let layout = ForceLayout::new(&model, width, height, config);
		let frame = layout.frame();
		info!(
			"graph view: {} nodes, {} edges",
			model.nodes.len(),
			model.edges.len()
		);
		Self {
			model,
			layout,
			viewport: Viewport::new(
				width,
				height,
				config.zoom,
				KeyBindings::GRAPH,
				config.viewport.clone(),
			),
			highlight: Highlighter::new(config),
			filter: KindFilter::All,
			drag: DragState::default(),
			pan: PanState::default(),
			pointer: None,
			frame,
		}
	}

	#[cfg(test)]
	pub fn model(&self) -> &GraphModel {
		&self.model
	}

	#[cfg(test)]
	pub fn layout(&self) -> &ForceLayout {
		&self.layout
	}

	/// Changing the filter only changes opacities; the layout keeps running
	/// on the same bodies.
	pub fn set_filter(&mut self, filter: KindFilter) {
		debug!("graph filter: {filter}");
		self.filter = filter;
	}

	pub fn stop(&mut self) {
		self.layout.stop();
	}

	pub fn tick(&mut self, dt: f32) {
		self.frame = self.layout.step(dt);
		let dt_ms = dt as f64 * 1000.0;
		self.highlight.tick(dt_ms);
		self.viewport.tick(dt_ms);
	}

	pub fn screen_to_graph(&self, p: Point) -> Point {
		self.viewport.transform().invert(p)
	}

	pub fn node_at_position(&self, p: Point) -> Option<usize> {
		self.layout.node_at(self.screen_to_graph(p))
	}
}

impl CanvasView for PolicyGraphState {
	const NAME: &'static str = "graph";

	fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	fn viewport_mut(&mut self) -> &mut Viewport {
		&mut self.viewport
	}

	fn pointer_down(&mut self, p: Point) {
		match self.node_at_position(p) {
			Some(idx) => {
				self.drag = DragState {
					node: Some(idx),
					start: p,
					node_start: self.layout.position(idx).unwrap_or_default(),
				};
				self.layout.drag_start(idx);
			}
			None => {
				self.pan = PanState {
					active: true,
					last: p,
				};
			}
		}
	}

	fn pointer_move(&mut self, p: Point) {
		self.pointer = Some(p);
		if let Some(idx) = self.drag.node {
			let k = self.viewport.transform().k;
			let to = Point::new(
				self.drag.node_start.x + (p.x - self.drag.start.x) / k,
				self.drag.node_start.y + (p.y - self.drag.start.y) / k,
			);
			self.layout.drag_move(idx, to);
			return;
		}
		if self.pan.active {
			self.viewport.pan_by(p.x - self.pan.last.x, p.y - self.pan.last.y);
			self.pan.last = p;
			return;
		}
		let hovered = self.node_at_position(p);
		self.highlight.focus(&self.model, hovered);
	}

	/// Returns the node when the press was a click rather than a drag.
	fn pointer_up(&mut self, p: Point) -> Option<usize> {
		self.pan.active = false;
		let idx = self.drag.node.take()?;
		self.layout.drag_end(idx);
		let clicked = self.drag.start.distance(p) < CLICK_SLOP;
		if clicked {
			debug!("graph click: {}", self.model.nodes[idx].id);
		}
		clicked.then_some(idx)
	}

	fn pointer_leave(&mut self) {
		if let Some(idx) = self.drag.node.take() {
			self.layout.drag_end(idx);
		}
		self.pan.active = false;
		self.pointer = None;
		self.highlight.clear();
	}

	fn content_bounds(&self) -> Bounds {
		self.layout.content_bounds()
	}

	/// New canvas size: recenter the simulation and reheat it.
	fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
		self.layout.resize(width, height);
	}
}

impl PolicyGraphState {
	pub fn scene(&self) -> Scene {
		let (width, height) = self.viewport.size();
		if self.model.is_empty() {
			return Scene::empty_state(width, height, "Upload a policy to see the relationship network");
		}

		let mut scene = Scene::default();
		for (i, (edge, &(from, to))) in self.model.edges.iter().zip(&self.frame.edges).enumerate() {
			let base = self.filter.edge_opacity(
				self.model.nodes[edge.source].kind,
				self.model.nodes[edge.target].kind,
			);
			let style = self.highlight.edge_style(i, base);
			scene.world.push(Primitive::Line {
				from,
				to,
				stroke: Stroke {
					color: style.color,
					width: (edge.weight as f64).sqrt() + 1.0,
				},
				opacity: style.opacity,
				dash: (edge.kind == EdgeKind::Has).then_some([4.0, 3.0]),
			});
		}

		// emphasized nodes last so they sit on top
		let mut order: Vec<usize> = (0..self.model.nodes.len()).collect();
		order.sort_by_key(|&i| self.highlight.node_style(i, 1.0, 1.0).glow > 0.0);

		for i in order {
			let node = &self.model.nodes[i];
			let center = self.frame.nodes[i];
			let style =
				self.highlight
					.node_style(i, self.filter.node_opacity(node.kind), node.kind.radius());
			if style.glow > 0.0 {
				scene.world.push(Primitive::Glow {
					center,
					inner: style.radius * 0.3,
					outer: style.radius * if style.focused { 2.2 } else { 1.6 },
					alpha: style.glow,
				});
			}
			scene.world.push(Primitive::Circle {
				center,
				radius: style.radius,
				fill: node_color(node.kind),
				stroke: Some(Stroke {
					color: palette::WHITE,
					width: if style.focused { 3.0 } else { 2.0 },
				}),
				opacity: style.opacity,
			});
			scene.world.push(Primitive::Text {
				at: Point::new(center.x, center.y + style.radius + 15.0),
				text: truncate(&node.label, LABEL_CHARS),
				size: 10.0,
				fill: palette::TEXT,
				align: TextAlign::Middle,
				bold: false,
				opacity: style.opacity,
			});
		}

		if let (Some(idx), Some(pointer)) = (self.highlight.focused(), self.pointer) {
			scene.overlay.push(Primitive::Tooltip {
				at: Point::new(pointer.x + 10.0, pointer.y - 10.0),
				lines: vec![self.model.nodes[idx].tooltip()],
			});
		}
		scene
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::{Effect, NodeKind, PolicyDocument, Statement, build_graph_model};

	fn state() -> PolicyGraphState {
		let doc = PolicyDocument::new(vec![
			Statement::new(Effect::Allow)
				.with_actions(["s3:GetObject"])
				.with_resources(["arn:aws:s3:::b"]),
			Statement::new(Effect::Deny)
				.with_actions(["s3:GetObject"])
				.with_resources(["arn:aws:s3:::b/*"])
				.with_principal("*"),
		]);
		PolicyGraphState::new(build_graph_model(&doc), 800.0, 400.0, &GraphConfig::default())
	}

	fn circles(scene: &Scene) -> Vec<(&'static str, f64)> {
		scene
			.world
			.iter()
			.filter_map(|p| match p {
				Primitive::Circle { fill, opacity, .. } => Some((*fill, *opacity)),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn filter_dims_without_removing() {
		let mut state = state();
		state.tick(0.016);
		let before = state.model().nodes.len();
		state.set_filter(KindFilter::Only(NodeKind::Resource));
		state.tick(0.016);
		assert_eq!(state.model().nodes.len(), before);
		assert_eq!(state.layout().len(), before);

		let drawn = circles(&state.scene());
		assert_eq!(drawn.len(), before);
		for (fill, opacity) in drawn {
			let expected = if fill == palette::RESOURCE { 1.0 } else { 0.2 };
			assert_eq!(opacity, expected, "{fill}");
		}
	}

	#[test]
	fn hover_shows_tooltip_and_leave_clears() {
		let mut state = state();
		let stmt = state.layout().position(0).unwrap();
		let screen = state.viewport.transform().apply(stmt);
		state.pointer_move(screen);
		state.tick(0.2);
		let scene = state.scene();
		assert!(matches!(
			scene.overlay.first(),
			Some(Primitive::Tooltip { lines, .. }) if lines[0] == "Statement: Allow"
		));
		state.pointer_leave();
		assert!(state.scene().overlay.is_empty());
	}

	#[test]
	fn dragging_pins_node_under_pointer() {
		let mut state = state();
		let start = state.viewport.transform().apply(state.layout().position(1).unwrap());
		state.pointer_down(start);
		state.pointer_move(Point::new(start.x + 30.0, start.y + 40.0));
		state.tick(0.016);
		let moved = state.layout().position(1).unwrap();
		let expected = state.screen_to_graph(Point::new(start.x + 30.0, start.y + 40.0));
		assert!(moved.distance(expected) < 1e-3);
		assert_eq!(state.pointer_up(Point::new(start.x + 30.0, start.y + 40.0)), None);
		assert!(!state.layout().is_pinned(1));
	}

	#[test]
	fn background_drag_pans() {
		let mut state = state();
		state.pointer_down(Point::new(-500.0, -500.0));
		state.pointer_move(Point::new(-480.0, -490.0));
		state.pointer_up(Point::new(-480.0, -490.0));
		let t = state.viewport.transform();
		assert_eq!((t.x, t.y), (20.0, 10.0));
	}

	#[test]
	fn empty_model_draws_empty_state() {
		let state = PolicyGraphState::new(GraphModel::default(), 800.0, 400.0, &GraphConfig::default());
		let scene = state.scene();
		assert!(scene.world.is_empty());
		assert_eq!(scene.overlay.len(), 1);
	}
}
