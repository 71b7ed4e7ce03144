use std::collections::HashSet;

use crate::components::scene::palette;
use crate::components::transition::ease_out_cubic;
use crate::config::GraphConfig;
use crate::policy::GraphModel;

/// Nodes and edges induced by focusing one node: the node, its direct
/// neighbours in either direction and the edges touching it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HighlightSet {
	pub focus: usize,
	pub nodes: HashSet<usize>,
	pub edges: HashSet<usize>,
}

impl HighlightSet {
	pub fn compute(model: &GraphModel, focus: usize) -> Self {
		let mut set = Self {
			focus,
			nodes: HashSet::from([focus]),
			edges: HashSet::new(),
		};
		for (i, edge) in model.edges.iter().enumerate() {
			if edge.source == focus || edge.target == focus {
				set.edges.insert(i);
				set.nodes.insert(edge.source);
				set.nodes.insert(edge.target);
			}
		}
		set
	}
}

fn mix(from: f64, to: f64, t: f64) -> f64 {
	from * (1.0 - t) + to * t
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeStyle {
	pub opacity: f64,
	pub radius: f64,
	pub focused: bool,
	/// Glow strength, 0 when not emphasized.
	pub glow: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeStyle {
	pub opacity: f64,
	pub color: &'static str,
}

/// Pointer focus with a short fade in and out.
#[derive(Clone, Debug)]
pub struct Highlighter {
	active: Option<HighlightSet>,
	/// Set being faded out after pointer-leave.
	fading: Option<HighlightSet>,
	t: f64,
	hover_ms: f64,
	radius_factor: f64,
	dim_node: f64,
	dim_edge: f64,
}

impl Highlighter {
	pub fn new(config: &GraphConfig) -> Self {
		Self {
			active: None,
			fading: None,
			t: 0.0,
			hover_ms: config.hover_ms,
			radius_factor: config.hover_radius_factor,
			dim_node: config.dim_node_opacity,
			dim_edge: config.dim_edge_opacity,
		}
	}

	pub fn focused(&self) -> Option<usize> {
		self.active.as_ref().map(|s| s.focus)
	}

	/// Pointer entered `node`, or left every node with `None`.
	pub fn focus(&mut self, model: &GraphModel, node: Option<usize>) {
		if self.focused() == node {
			return;
		}
		match node {
			Some(idx) => {
				// moving between nodes swaps the set without fading through zero
				self.fading = None;
				self.active = Some(HighlightSet::compute(model, idx));
			}
			None => self.clear(),
		}
	}

	pub fn clear(&mut self) {
		if let Some(set) = self.active.take() {
			self.fading = Some(set);
		}
	}

	pub fn tick(&mut self, dt_ms: f64) {
		let step = if self.hover_ms > 0.0 { dt_ms / self.hover_ms } else { 1.0 };
		if self.active.is_some() {
			self.t = (self.t + step).min(1.0);
		} else {
			self.t = (self.t - step).max(0.0);
			if self.t == 0.0 {
				self.fading = None;
			}
		}
	}

	fn current(&self) -> Option<&HighlightSet> {
		self.active.as_ref().or(self.fading.as_ref())
	}

	fn eased(&self) -> f64 {
		ease_out_cubic(self.t)
	}

	#[cfg(test)]
	pub fn has_active_highlight(&self) -> bool {
		self.current().is_some() && self.t > 0.0
	}

	pub fn node_style(&self, node: usize, base_opacity: f64, base_radius: f64) -> NodeStyle {
		let t = self.eased();
		let Some(set) = self.current().filter(|_| t > 0.0) else {
			return NodeStyle {
				opacity: base_opacity,
				radius: base_radius,
				focused: false,
				glow: 0.0,
			};
		};
		let focused = set.focus == node;
		if set.nodes.contains(&node) {
			NodeStyle {
				opacity: mix(base_opacity, 1.0, t),
				radius: if focused {
					mix(base_radius, base_radius * self.radius_factor, t)
				} else {
					base_radius
				},
				focused,
				glow: if focused { 0.35 * t } else { 0.2 * t },
			}
		} else {
			NodeStyle {
				opacity: mix(base_opacity, self.dim_node.min(base_opacity), t),
				radius: base_radius,
				focused: false,
				glow: 0.0,
			}
		}
	}

	pub fn edge_style(&self, edge: usize, base_opacity: f64) -> EdgeStyle {
		let t = self.eased();
		match self.current().filter(|_| t > 0.0) {
			Some(set) if set.edges.contains(&edge) => EdgeStyle {
				opacity: mix(base_opacity, 1.0, t),
				color: palette::HIGHLIGHT,
			},
			Some(_) => EdgeStyle {
				opacity: mix(base_opacity, self.dim_edge.min(base_opacity), t),
				color: palette::LINK,
			},
			None => EdgeStyle {
				opacity: base_opacity,
				color: palette::LINK,
			},
		}
	}
}
