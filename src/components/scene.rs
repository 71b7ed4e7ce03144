//! Drawable primitives the layout engines emit each frame. The painter in
//! [`super::render`] only reads them.

use crate::policy::{Effect, NodeKind, TreeMeta, TreeNodeKind};

pub mod palette {
	pub const STATEMENT: &str = "#232f3e";
	pub const ACTION: &str = "#0073bb";
	pub const RESOURCE: &str = "#1d8102";
	pub const PRINCIPAL: &str = "#b7791f";
	pub const ALLOW: &str = "#1d8102";
	pub const DENY: &str = "#d13212";
	pub const UNKNOWN: &str = "#879596";
	pub const CONDITIONS: &str = "#ff9900";
	pub const HIGHLIGHT: &str = "#ff9900";
	pub const ACTION_LEAF: &str = "#e7f3ff";
	pub const RESOURCE_LEAF: &str = "#d4eecd";
	pub const NEUTRAL: &str = "#f2f3f3";
	pub const LINK: &str = "#d5dbdb";
	pub const TEXT: &str = "#232f3e";
	pub const MUTED_TEXT: &str = "#545b64";
	pub const WHITE: &str = "#ffffff";
}

pub fn node_color(kind: NodeKind) -> &'static str {
	match kind {
		NodeKind::Statement => palette::STATEMENT,
		NodeKind::Action => palette::ACTION,
		NodeKind::Resource => palette::RESOURCE,
		NodeKind::Principal => palette::PRINCIPAL,
	}
}

pub fn effect_color(effect: Effect) -> &'static str {
	match effect {
		Effect::Allow => palette::ALLOW,
		Effect::Deny => palette::DENY,
		Effect::Unknown => palette::UNKNOWN,
	}
}

pub fn tree_node_color(kind: TreeNodeKind, meta: &TreeMeta) -> &'static str {
	match (kind, meta) {
		(TreeNodeKind::Root, _) => palette::STATEMENT,
		(TreeNodeKind::Statement, TreeMeta::Statement { effect, .. }) => match effect {
			Effect::Allow => palette::ALLOW,
			_ => palette::DENY,
		},
		(TreeNodeKind::ActionsGroup, _) => palette::ACTION,
		(TreeNodeKind::ResourcesGroup, _) => palette::RESOURCE,
		(TreeNodeKind::Principal, _) => palette::PRINCIPAL,
		(TreeNodeKind::Conditions, _) => palette::CONDITIONS,
		(TreeNodeKind::Action, _) => palette::ACTION_LEAF,
		(TreeNodeKind::Resource, _) => palette::RESOURCE_LEAF,
		_ => palette::NEUTRAL,
	}
}

/// A 2D position, in world or screen space depending on context.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	/// Horizontal coordinate.
	pub x: f64,
	/// Vertical coordinate.
	pub y: f64,
}

impl Point {
	/// Point at `(x, y)`.
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Linear interpolation towards `to`; `t = 0` is `self`.
	pub fn lerp(self, to: Point, t: f64) -> Point {
		Point::new(self.x + (to.x - self.x) * t, self.y + (to.y - self.y) * t)
	}

	/// Euclidean distance.
	pub fn distance(self, other: Point) -> f64 {
		(self.x - other.x).hypot(self.y - other.y)
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
	pub color: &'static str,
	pub width: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
	Start,
	Middle,
	End,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Primitive {
	Circle {
		center: Point,
		radius: f64,
		fill: &'static str,
		stroke: Option<Stroke>,
		opacity: f64,
	},
	/// Soft highlight halo behind an emphasized node.
	Glow {
		center: Point,
		inner: f64,
		outer: f64,
		alpha: f64,
	},
	Line {
		from: Point,
		to: Point,
		stroke: Stroke,
		opacity: f64,
		dash: Option<[f64; 2]>,
	},
	/// Cubic bezier.
	Curve {
		from: Point,
		c1: Point,
		c2: Point,
		to: Point,
		stroke: Stroke,
		opacity: f64,
	},
	/// Ring segment; angles run clockwise from twelve o'clock.
	Arc {
		center: Point,
		inner: f64,
		outer: f64,
		start: f64,
		end: f64,
		fill: &'static str,
		stroke: Option<Stroke>,
		opacity: f64,
	},
	Rect {
		origin: Point,
		width: f64,
		height: f64,
		fill: &'static str,
		stroke: Option<Stroke>,
	},
	Text {
		at: Point,
		text: String,
		size: f64,
		fill: &'static str,
		align: TextAlign,
		bold: bool,
		opacity: f64,
	},
	Tooltip {
		at: Point,
		lines: Vec<String>,
	},
}

impl Primitive {
	pub fn text(at: Point, text: impl Into<String>, size: f64, fill: &'static str) -> Self {
		Self::Text {
			at,
			text: text.into(),
			size,
			fill,
			align: TextAlign::Middle,
			bold: false,
			opacity: 1.0,
		}
	}
}

/// One frame. `world` is drawn under the viewport transform, `overlay` in
/// screen space on top.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
	pub world: Vec<Primitive>,
	pub overlay: Vec<Primitive>,
}

impl Scene {
	/// Frame shown when a view has no data.
	pub fn empty_state(width: f64, height: f64, message: &str) -> Self {
		Self {
			world: Vec::new(),
			overlay: vec![Primitive::text(
				Point::new(width / 2.0, height / 2.0),
				message,
				14.0,
				palette::MUTED_TEXT,
			)],
		}
	}

	#[cfg(test)]
	pub fn is_empty(&self) -> bool {
		self.world.is_empty() && self.overlay.is_empty()
	}
}
