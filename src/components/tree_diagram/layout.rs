//! Tidy layout of the collapsible policy tree.
//!
//! The tree is flattened once into an arena in preorder; a node's index is
//! its [`NodeId`] for the life of the layout, so every re-layout can move a
//! node from where it was drawn instead of jumping. Depth runs left to
//! right and breadth top to bottom.

use log::{debug, info};

use crate::components::scene::Point;
use crate::components::transition::Transition;
use crate::components::viewport::Bounds;
use crate::config::TreeConfig;
use crate::policy::{TreeMeta, TreeModel, TreeNode, TreeNodeKind};

/// Preorder index of a node in its layout's arena.
pub type NodeId = usize;

/// Extra hit radius around small tree nodes, in world units.
const HIT_SLOP: f64 = 4.0;

/// Drawn radius of a node of `kind`, in world units.
pub fn node_radius(kind: TreeNodeKind) -> f64 {
	match kind {
		TreeNodeKind::Root => 8.0,
		TreeNodeKind::Statement => 6.0,
		TreeNodeKind::ActionsGroup | TreeNodeKind::ResourcesGroup => 5.0,
		_ => 4.0,
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Motion {
	from: Point,
	to: Point,
	scale_from: f64,
	scale_to: f64,
}

impl Motion {
	fn rest(at: Point) -> Self {
		Self {
			from: at,
			to: at,
			scale_from: 0.0,
			scale_to: 0.0,
		}
	}

	fn at(&self, t: f64) -> (Point, f64) {
		(
			self.from.lerp(self.to, t),
			self.scale_from + (self.scale_to - self.scale_from) * t,
		)
	}
}

/// One tree node in the arena.
#[derive(Clone, Debug)]
pub struct ArenaNode {
	/// Label drawn beside the node.
	pub name: String,
	/// Role of the node.
	pub kind: TreeNodeKind,
	/// Colour and tooltip data.
	pub meta: TreeMeta,
	/// Hover text, computed once on flattening.
	pub tooltip: String,
	/// `None` for the root only.
	pub parent: Option<NodeId>,
	/// Child ids in document order.
	pub children: Vec<NodeId>,
	/// Distance from the root.
	pub depth: usize,
	collapsed: bool,
	motion: Motion,
}

impl ArenaNode {
	/// Whether the children are hidden.
	pub fn is_collapsed(&self) -> bool {
		self.collapsed
	}

	/// True for branches, false for leaves.
	pub fn has_children(&self) -> bool {
		!self.children.is_empty()
	}
}

/// A node as drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawnNode {
	/// Arena id of the node.
	pub id: NodeId,
	/// Interpolated world position.
	pub at: Point,
	/// 0 while entering from or exiting into a parent, 1 at rest.
	pub scale: f64,
}

/// Arena of a flattened [`TreeModel`] plus its running expand or collapse
/// transition.
pub struct TreeLayout {
	nodes: Vec<ArenaNode>,
	transition: Transition,
	depth_spacing: f64,
	sibling_spacing: f64,
	margin_left: f64,
	transition_ms: f64,
	height: f64,
}

impl TreeLayout {
	fn empty(height: f64, config: &TreeConfig) -> Self {
		Self {
			nodes: Vec::new(),
			transition: Transition::finished(),
			depth_spacing: config.depth_spacing,
			sibling_spacing: config.sibling_spacing,
			margin_left: config.margin_left,
			transition_ms: config.transition_ms,
			height,
		}
	}

	/// Flatten and lay out `model`, keeping the collapse flags it carries.
	pub fn new(model: &TreeModel, height: f64, config: &TreeConfig) -> Self {
		let mut layout = Self::empty(height, config);
		if let Some(root) = &model.root {
			layout.nodes = flatten(root, layout.origin());
			info!("tree layout: {} nodes", layout.nodes.len());
			layout.relayout(0);
		}
		layout
	}

	/// Lay out `model` as a continuation of `previous`. A node whose preorder
	/// id still names the same kind, name and parent moves on from where
	/// `previous` drew it; every other node enters from the root's old
	/// position. Collapse flags come from `model`.
	pub fn rebuild(previous: &TreeLayout, model: &TreeModel, height: f64, config: &TreeConfig) -> Self {
		let mut layout = Self::empty(height, config);
		let Some(root) = &model.root else {
			return layout;
		};
		layout.nodes = flatten(root, layout.origin());

		let t = previous.transition.eased();
		let mut carried = 0;
		for (node, old) in layout.nodes.iter_mut().zip(&previous.nodes) {
			if old.kind != node.kind || old.name != node.name || old.parent != node.parent {
				continue;
			}
			let (at, scale) = old.motion.at(t);
			node.motion = Motion {
				from: at,
				to: at,
				scale_from: scale,
				scale_to: scale,
			};
			carried += 1;
		}
		info!(
			"tree layout: {} nodes, {carried} carried over",
			layout.nodes.len()
		);
		layout.relayout(0);
		layout
	}

	fn origin(&self) -> Point {
		Point::new(self.margin_left, self.height / 2.0)
	}

	/// Number of nodes, hidden ones included.
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// True for an empty document.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Arena node `id`, if it exists.
	pub fn node(&self, id: NodeId) -> Option<&ArenaNode> {
		self.nodes.get(id)
	}

	/// All children of `id`, collapsed or not. Empty for unknown ids.
	pub fn children(&self, id: NodeId) -> &[NodeId] {
		match self.nodes.get(id) {
			Some(node) => &node.children,
			None => &[],
		}
	}

	/// False for unknown ids.
	pub fn is_collapsed(&self, id: NodeId) -> bool {
		self.nodes.get(id).is_some_and(|n| n.collapsed)
	}

	/// Nodes reachable through expanded ancestors, in preorder.
	pub fn visible_nodes(&self) -> Vec<NodeId> {
		let mut visible = Vec::new();
		if self.nodes.is_empty() {
			return visible;
		}
		let mut stack = vec![0];
		while let Some(id) = stack.pop() {
			visible.push(id);
			let node = &self.nodes[id];
			if !node.collapsed {
				stack.extend(node.children.iter().rev());
			}
		}
		visible
	}

	/// Where `id` settles once the running transition ends. `None` when
	/// hidden.
	pub fn target(&self, id: NodeId) -> Option<Point> {
		self.nodes
			.get(id)
			.filter(|n| n.motion.scale_to > 0.0)
			.map(|n| n.motion.to)
	}

	/// Flip `id` between expanded and collapsed and re-lay-out with it as
	/// the transition source. Leaves do nothing.
	pub fn toggle(&mut self, id: NodeId) -> bool {
		let Some(node) = self.nodes.get_mut(id) else {
			return false;
		};
		if !node.has_children() {
			return false;
		}
		node.collapsed = !node.collapsed;
		debug!("tree toggle {id}: collapsed={}", node.collapsed);
		self.relayout(id);
		true
	}

	/// Expand every branch.
	pub fn expand_all(&mut self) {
		self.set_all_collapsed(false);
	}

	/// Collapse every branch, the root included.
	pub fn collapse_all(&mut self) {
		self.set_all_collapsed(true);
	}

	fn set_all_collapsed(&mut self, collapsed: bool) {
		if self.nodes.is_empty() {
			return;
		}
		let mut stack = vec![0];
		while let Some(id) = stack.pop() {
			let node = &mut self.nodes[id];
			node.collapsed = collapsed && node.has_children();
			stack.extend(node.children.iter().copied());
		}
		self.relayout(0);
	}

	/// New canvas height: the tree re-centres vertically.
	pub fn resize(&mut self, height: f64) {
		self.height = height;
		if !self.nodes.is_empty() {
			self.relayout(0);
		}
	}

	/// True while an expand or collapse is moving nodes.
	pub fn is_animating(&self) -> bool {
		self.transition.is_running()
	}

	/// Advance the transition. Returns whether it is still running.
	pub fn tick(&mut self, dt_ms: f64) -> bool {
		self.transition.advance(dt_ms)
	}

	fn open_children(&self, id: NodeId) -> &[NodeId] {
		let node = &self.nodes[id];
		if node.collapsed {
			return &[];
		}
		&node.children
	}

	fn is_drawn(&self, node: &ArenaNode) -> bool {
		node.motion.scale_to > 0.0 || (self.transition.is_running() && node.motion.scale_from > 0.0)
	}

	/// Every node on screen this frame, exiting ones included, in preorder.
	pub fn drawn_nodes(&self) -> Vec<DrawnNode> {
		let t = self.transition.eased();
		self.nodes
			.iter()
			.enumerate()
			.filter(|(_, node)| self.is_drawn(node))
			.map(|(id, node)| {
				let (at, scale) = node.motion.at(t);
				DrawnNode { id, at, scale }
			})
			.collect()
	}

	/// Topmost drawn node under `p` (world space).
	pub fn node_at(&self, p: Point) -> Option<NodeId> {
		self.drawn_nodes()
			.into_iter()
			.rev()
			.find(|d| {
				d.scale > 0.0
					&& d.at.distance(p) <= node_radius(self.nodes[d.id].kind) * d.scale + HIT_SLOP
			})
			.map(|d| d.id)
	}

	/// Box around the settled positions of the visible nodes.
	pub fn content_bounds(&self) -> Bounds {
		Bounds::around_circles(self.visible_nodes().into_iter().filter_map(|id| {
			self.target(id)
				.map(|p| (p, node_radius(self.nodes[id].kind)))
		}))
	}

	/// Recompute targets and start a transition. Entering nodes grow out of
	/// `source`'s previous position, leaving ones shrink into its new one.
	fn relayout(&mut self, source: NodeId) {
		let visible = self.visible_nodes();
		let targets = self.tidy(&visible);
		let t = self.transition.eased();
		let source_old = self.nodes[source].motion.to;
		let source_new = targets[source].unwrap_or(source_old);

		for id in 0..self.nodes.len() {
			let drawn = self.is_drawn(&self.nodes[id]);
			let node = &mut self.nodes[id];
			let (now, scale_now) = node.motion.at(t);
			node.motion = match (targets[id], drawn) {
				(Some(to), true) => Motion {
					from: now,
					to,
					scale_from: scale_now,
					scale_to: 1.0,
				},
				(Some(to), false) => Motion {
					from: source_old,
					to,
					scale_from: 0.0,
					scale_to: 1.0,
				},
				(None, true) => Motion {
					from: now,
					to: source_new,
					scale_from: scale_now,
					scale_to: 0.0,
				},
				(None, false) => Motion::rest(source_new),
			};
		}
		self.transition = Transition::new(self.transition_ms);
	}

	/// Contour-based tidy placement of the visible subtree. Siblings are
	/// packed left to right against the accumulated right contour, then each
	/// parent is centred over its first and last child.
	fn tidy(&self, visible: &[NodeId]) -> Vec<Option<Point>> {
		let n = self.nodes.len();
		let mut positions = vec![None; n];
		if visible.is_empty() {
			return positions;
		}

		// (left, right) breadth extent per relative depth, relative to the
		// subtree root
		let mut contours: Vec<Vec<(f64, f64)>> = vec![Vec::new(); n];
		let mut offsets = vec![0.0; n];

		// reverse preorder visits children before parents
		for &id in visible.iter().rev() {
			let children = self.open_children(id);
			if children.is_empty() {
				contours[id] = vec![(0.0, 0.0)];
				continue;
			}

			let mut merged: Vec<(f64, f64)> = Vec::new();
			for (i, &child) in children.iter().enumerate() {
				let contour = std::mem::take(&mut contours[child]);
				let shift = if i == 0 {
					0.0
				} else {
					merged
						.iter()
						.zip(&contour)
						.map(|(&(_, right), &(left, _))| right - left + self.sibling_spacing)
						.fold(f64::MIN, f64::max)
				};
				offsets[child] = shift;
				for (depth, &(left, right)) in contour.iter().enumerate() {
					let (left, right) = (left + shift, right + shift);
					match merged.get_mut(depth) {
						Some(level) => level.1 = right,
						None => merged.push((left, right)),
					}
				}
			}

			let first = offsets[children[0]];
			let last = offsets[children[children.len() - 1]];
			let mid = (first + last) / 2.0;
			for &child in children {
				offsets[child] -= mid;
			}
			let mut contour = Vec::with_capacity(merged.len() + 1);
			contour.push((0.0, 0.0));
			contour.extend(merged.into_iter().map(|(l, r)| (l - mid, r - mid)));
			contours[id] = contour;
		}

		// preorder resolves absolute breadth from the parent's
		let mut breadth = vec![0.0; n];
		let origin = self.origin();
		for &id in visible {
			let node = &self.nodes[id];
			if let Some(parent) = node.parent {
				breadth[id] = breadth[parent] + offsets[id];
			}
			positions[id] = Some(Point::new(
				origin.x + node.depth as f64 * self.depth_spacing,
				origin.y + breadth[id],
			));
		}
		positions
	}
}

/// Preorder flattening with an explicit stack; a child's id is always
/// greater than its parent's.
fn flatten(root: &TreeNode, origin: Point) -> Vec<ArenaNode> {
	let mut arena: Vec<ArenaNode> = Vec::new();
	let mut stack: Vec<(&TreeNode, Option<NodeId>, usize)> = vec![(root, None, 0)];
	while let Some((node, parent, depth)) = stack.pop() {
		let id = arena.len();
		arena.push(ArenaNode {
			name: node.name.clone(),
			kind: node.kind,
			meta: node.meta.clone(),
			tooltip: node.tooltip(),
			parent,
			children: Vec::with_capacity(node.children.len()),
			depth,
			collapsed: node.collapsed && !node.is_leaf(),
			motion: Motion::rest(origin),
		});
		if let Some(parent) = parent {
			arena[parent].children.push(id);
		}
		for child in node.children.iter().rev() {
			stack.push((child, Some(id), depth + 1));
		}
	}
	arena
}
