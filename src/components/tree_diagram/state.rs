use std::collections::HashMap;

use log::debug;

use super::layout::{DrawnNode, NodeId, TreeLayout, node_radius};
use crate::components::canvas::CanvasView;
use crate::components::scene::{
	Point, Primitive, Scene, Stroke, TextAlign, palette, tree_node_color,
};
use crate::components::viewport::{Bounds, KeyBindings, ViewCommand, Viewport};
use crate::config::TreeConfig;
use crate::policy::{TreeModel, TreeNodeKind, truncate};

const LABEL_CHARS: usize = 20;
const LABEL_GAP: f64 = 13.0;
const CLICK_SLOP: f64 = 3.0;

#[derive(Clone, Copy, Debug, Default)]
struct Press {
	start: Point,
	last: Point,
}

pub struct TreeDiagramState {
	layout: TreeLayout,
	pub viewport: Viewport,
	hovered: Option<NodeId>,
	pointer: Option<Point>,
	press: Option<Press>,
}

impl TreeDiagramState {
	pub fn new(model: &TreeModel, width: f64, height: f64, config: &TreeConfig) -> Self {
		Self::with_layout(TreeLayout::new(model, height, config), width, height, config)
	}

	/// State for a new document whose nodes animate on from where
	/// `previous` drew them. Pan and zoom start over.
	pub fn rebuild(
		previous: &TreeDiagramState,
		model: &TreeModel,
		width: f64,
		height: f64,
		config: &TreeConfig,
	) -> Self {
		let layout = TreeLayout::rebuild(&previous.layout, model, height, config);
		Self::with_layout(layout, width, height, config)
	}

	fn with_layout(layout: TreeLayout, width: f64, height: f64, config: &TreeConfig) -> Self {
		Self {
			layout,
			viewport: Viewport::new(
				width,
				height,
				config.zoom,
				KeyBindings::TREE,
				config.viewport.clone(),
			),
			hovered: None,
			pointer: None,
			press: None,
		}
	}

	#[cfg(test)]
	pub fn layout(&self) -> &TreeLayout {
		&self.layout
	}

	pub fn tick(&mut self, dt_ms: f64) {
		self.layout.tick(dt_ms);
		self.viewport.tick(dt_ms);
	}

	pub fn node_at_position(&self, p: Point) -> Option<NodeId> {
		self.layout.node_at(self.viewport.transform().invert(p))
	}
}

impl CanvasView for TreeDiagramState {
	const NAME: &'static str = "tree";

	fn viewport(&self) -> &Viewport {
		&self.viewport
	}

	fn viewport_mut(&mut self) -> &mut Viewport {
		&mut self.viewport
	}

	/// Pressing anywhere starts a pan; a press released in place is a click.
	fn pointer_down(&mut self, p: Point) {
		self.press = Some(Press { start: p, last: p });
	}

	fn pointer_move(&mut self, p: Point) {
		self.pointer = Some(p);
		if let Some(press) = self.press.as_mut() {
			self.viewport.pan_by(p.x - press.last.x, p.y - press.last.y);
			press.last = p;
			return;
		}
		self.hovered = self.node_at_position(p);
	}

	/// Toggles the node under a click. Returns it when something toggled.
	fn pointer_up(&mut self, p: Point) -> Option<NodeId> {
		let press = self.press.take()?;
		if press.start.distance(p) >= CLICK_SLOP {
			return None;
		}
		let id = self.node_at_position(p)?;
		self.layout.toggle(id).then_some(id)
	}

	fn pointer_leave(&mut self) {
		self.press = None;
		self.pointer = None;
		self.hovered = None;
	}

	fn content_bounds(&self) -> Bounds {
		self.layout.content_bounds()
	}

	fn view_command(&mut self, command: ViewCommand) {
		match command {
			ViewCommand::ExpandAll => {
				debug!("tree: expand all");
				self.layout.expand_all();
			}
			ViewCommand::CollapseAll => {
				debug!("tree: collapse all");
				self.layout.collapse_all();
			}
			_ => {}
		}
	}

	fn resize(&mut self, width: f64, height: f64) {
		self.viewport.resize(width, height);
		self.layout.resize(height);
	}
}

impl TreeDiagramState {
	pub fn scene(&self) -> Scene {
		let (width, height) = self.viewport.size();
		if self.layout.is_empty() {
			return Scene::empty_state(
				width,
				height,
				"Upload a policy to see the hierarchical structure",
			);
		}

		let drawn = self.layout.drawn_nodes();
		let at: HashMap<NodeId, &DrawnNode> = drawn.iter().map(|d| (d.id, d)).collect();
		let mut scene = Scene::default();

		for d in &drawn {
			let Some(parent) = self.layout.node(d.id).and_then(|n| n.parent) else {
				continue;
			};
			let Some(p) = at.get(&parent) else {
				continue;
			};
			let mid = (d.at.x + p.at.x) / 2.0;
			scene.world.push(Primitive::Curve {
				from: d.at,
				c1: Point::new(mid, d.at.y),
				c2: Point::new(mid, p.at.y),
				to: p.at,
				stroke: Stroke {
					color: palette::LINK,
					width: 2.0,
				},
				opacity: 1.0,
			});
		}

		for d in &drawn {
			let Some(node) = self.layout.node(d.id) else {
				continue;
			};
			scene.world.push(Primitive::Circle {
				center: d.at,
				radius: node_radius(node.kind) * d.scale,
				fill: tree_node_color(node.kind, &node.meta),
				stroke: Some(Stroke {
					color: if node.is_collapsed() {
						palette::HIGHLIGHT
					} else {
						palette::TEXT
					},
					width: 2.0,
				}),
				opacity: 1.0,
			});

			// labels sit before branches and after leaves
			let (dx, align) = if node.has_children() {
				(-LABEL_GAP, TextAlign::End)
			} else {
				(LABEL_GAP, TextAlign::Start)
			};
			scene.world.push(Primitive::Text {
				at: Point::new(d.at.x + dx, d.at.y),
				text: truncate(&node.name, LABEL_CHARS),
				size: 12.0,
				fill: palette::TEXT,
				align,
				bold: node.kind == TreeNodeKind::Root,
				opacity: d.scale,
			});
		}

		if let (Some(id), Some(pointer)) = (self.hovered, self.pointer) {
			if let Some(node) = self.layout.node(id) {
				scene.overlay.push(Primitive::Tooltip {
					at: Point::new(pointer.x + 10.0, pointer.y - 10.0),
					lines: vec![node.tooltip.clone()],
				});
			}
		}
		scene
	}
}
