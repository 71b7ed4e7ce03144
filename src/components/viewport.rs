//! Pan/zoom state shared by the graph and tree views.

use log::{debug, info, warn};
use serde::Deserialize;

use super::scene::Point;
use super::transition::Transition;
use crate::config::ViewportConfig;

/// Maps world coordinates to screen: `screen = world * k + (x, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportTransform {
	/// Horizontal translation in screen pixels.
	pub x: f64,
	/// Vertical translation in screen pixels.
	pub y: f64,
	/// Scale factor.
	pub k: f64,
}

impl Default for ViewportTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewportTransform {
	/// No pan, unit scale.
	pub const IDENTITY: Self = Self {
		x: 0.0,
		y: 0.0,
		k: 1.0,
	};

	/// World to screen.
	pub fn apply(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	/// Screen to world.
	pub fn invert(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
	}

	fn lerp(&self, to: &Self, t: f64) -> Self {
		Self {
			x: self.x + (to.x - self.x) * t,
			y: self.y + (to.y - self.y) * t,
			k: self.k + (to.k - self.k) * t,
		}
	}

	/// Scale by `factor` keeping `anchor` (screen space) fixed.
	fn scaled_about(&self, factor: f64, anchor: Point, extent: ScaleExtent) -> Self {
		let k = extent.clamp(self.k * factor);
		let ratio = k / self.k;
		Self {
			x: anchor.x - (anchor.x - self.x) * ratio,
			y: anchor.y - (anchor.y - self.y) * ratio,
			k,
		}
	}
}

/// Allowed zoom range. Clamping always goes through [`ScaleExtent::ordered`].
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct ScaleExtent {
	/// Smallest scale.
	pub min: f64,
	/// Largest scale.
	pub max: f64,
}

impl ScaleExtent {
	/// Zoom range of the graph and tree views.
	pub const DEFAULT: Self = Self::new(0.1, 5.0);

	/// Extent as given. Use [`ScaleExtent::ordered`] to sanitize it.
	pub const fn new(min: f64, max: f64) -> Self {
		Self { min, max }
	}

	/// Bounds in ascending order. Swapped bounds are flipped; a non-finite
	/// or non-positive bound yields [`ScaleExtent::DEFAULT`].
	pub fn ordered(self) -> Self {
		let (lo, hi) = (self.min.min(self.max), self.min.max(self.max));
		if !(self.min.is_finite() && self.max.is_finite()) || lo <= 0.0 {
			return Self::DEFAULT;
		}
		Self { min: lo, max: hi }
	}

	/// Clamp `k` into the ordered range. A non-finite `k` maps to 1 clamped
	/// into the range.
	pub fn clamp(&self, k: f64) -> f64 {
		let Self { min, max } = self.ordered();
		if !k.is_finite() {
			return min.max(1.0_f64.min(max));
		}
		k.clamp(min, max)
	}
}

/// Axis-aligned box in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
	/// Top-left corner.
	pub min: Point,
	/// Bottom-right corner.
	pub max: Point,
}

impl Bounds {
	/// Box around circles given as (center, radius). Zero-sized when empty.
	pub fn around_circles(circles: impl IntoIterator<Item = (Point, f64)>) -> Self {
		let mut circles = circles.into_iter();
		let Some((c, r)) = circles.next() else {
			return Self::default();
		};
		let mut bounds = Self {
			min: Point::new(c.x - r, c.y - r),
			max: Point::new(c.x + r, c.y + r),
		};
		for (c, r) in circles {
			bounds.min.x = bounds.min.x.min(c.x - r);
			bounds.min.y = bounds.min.y.min(c.y - r);
			bounds.max.x = bounds.max.x.max(c.x + r);
			bounds.max.y = bounds.max.y.max(c.y + r);
		}
		bounds
	}

	/// Horizontal extent.
	pub fn width(&self) -> f64 {
		self.max.x - self.min.x
	}

	/// Vertical extent.
	pub fn height(&self) -> f64 {
		self.max.y - self.min.y
	}

	/// Midpoint of the box.
	pub fn center(&self) -> Point {
		self.min.lerp(self.max, 0.5)
	}

	/// Nothing to fit: zero or negative area, or NaN from a broken layout.
	pub fn is_degenerate(&self) -> bool {
		!(self.width() > 0.0 && self.height() > 0.0)
	}
}

/// What a key or toolbar button asks a view to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewCommand {
	/// Enter or leave fullscreen.
	ToggleFullscreen,
	/// Leave fullscreen; ignored inline.
	ExitFullscreen,
	/// Zoom in one step about the center.
	ZoomIn,
	/// Zoom out one step about the center.
	ZoomOut,
	/// Animate back to the identity transform.
	ResetZoom,
	/// Frame the visible content.
	FitToContent,
	/// Open every tree branch.
	ExpandAll,
	/// Close every tree branch.
	CollapseAll,
}

/// Which keys a view answers to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyBindings {
	/// `e`/`c` expand and collapse the tree.
	pub tree_shortcuts: bool,
}

impl KeyBindings {
	/// Viewport keys only.
	pub const GRAPH: Self = Self {
		tree_shortcuts: false,
	};
	/// Viewport keys plus expand and collapse.
	pub const TREE: Self = Self {
		tree_shortcuts: true,
	};

	/// Map a `KeyboardEvent.key` value to a command.
	pub fn resolve(&self, key: &str) -> Option<ViewCommand> {
		match key {
			"Escape" | "Esc" => Some(ViewCommand::ExitFullscreen),
			"+" | "=" => Some(ViewCommand::ZoomIn),
			"-" => Some(ViewCommand::ZoomOut),
			"0" => Some(ViewCommand::ResetZoom),
			"f" | "F" => Some(ViewCommand::FitToContent),
			"e" | "E" if self.tree_shortcuts => Some(ViewCommand::ExpandAll),
			"c" | "C" if self.tree_shortcuts => Some(ViewCommand::CollapseAll),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug)]
struct ZoomAnimation {
	from: ViewportTransform,
	to: ViewportTransform,
	clock: Transition,
}

/// Transform, size and fullscreen state of one view.
#[derive(Clone, Debug)]
pub struct Viewport {
	transform: ViewportTransform,
	animation: Option<ZoomAnimation>,
	extent: ScaleExtent,
	width: f64,
	height: f64,
	inline_size: (f64, f64),
	fullscreen: bool,
	bindings: KeyBindings,
	config: ViewportConfig,
}

impl Viewport {
	/// Inline viewport of the given size. An unusable extent is replaced by
	/// its ordered form.
	pub fn new(
		width: f64,
		height: f64,
		extent: ScaleExtent,
		bindings: KeyBindings,
		config: ViewportConfig,
	) -> Self {
		let ordered = extent.ordered();
		if ordered != extent {
			warn!("zoom extent {extent:?} unusable, using {ordered:?}");
		}
		Self {
			transform: ViewportTransform {
				k: ordered.clamp(1.0),
				..ViewportTransform::IDENTITY
			},
			animation: None,
			extent: ordered,
			width,
			height,
			inline_size: (width, height),
			fullscreen: false,
			bindings,
			config,
		}
	}

	/// Current, possibly mid-animation, transform.
	pub fn transform(&self) -> ViewportTransform {
		self.transform
	}

	/// The ordered zoom range in effect.
	pub fn extent(&self) -> ScaleExtent {
		self.extent
	}

	/// Canvas size in CSS pixels.
	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	/// Whether the view fills the screen.
	pub fn is_fullscreen(&self) -> bool {
		self.fullscreen
	}

	/// True while an animated zoom runs.
	pub fn is_animating(&self) -> bool {
		self.animation.is_some()
	}

	/// Where an in-flight zoom ends, or the current transform.
	fn settled(&self) -> ViewportTransform {
		self.animation.map(|a| a.to).unwrap_or(self.transform)
	}

	fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	/// Animated zoom about the viewport center.
	pub fn zoom_by(&mut self, factor: f64) {
		let target = self.settled().scaled_about(factor, self.center(), self.extent);
		self.zoom_to(target);
	}

	/// Immediate zoom about a screen point, as the wheel does.
	pub fn zoom_at(&mut self, factor: f64, anchor: Point) {
		self.animation = None;
		self.transform = self.transform.scaled_about(factor, anchor, self.extent);
	}

	/// Animate towards `target`, its scale clamped to the extent.
	pub fn zoom_to(&mut self, target: ViewportTransform) {
		let target = ViewportTransform {
			k: self.extent.clamp(target.k),
			..target
		};
		self.animation = Some(ZoomAnimation {
			from: self.transform,
			to: target,
			clock: Transition::new(self.config.zoom_ms),
		});
	}

	/// Jump to `target` without animating.
	pub fn set_transform(&mut self, target: ViewportTransform) {
		self.animation = None;
		self.transform = ViewportTransform {
			k: self.extent.clamp(target.k),
			..target
		};
	}

	/// Translate by a screen-space delta, cancelling any animated zoom.
	pub fn pan_by(&mut self, dx: f64, dy: f64) {
		self.animation = None;
		self.transform.x += dx;
		self.transform.y += dy;
	}

	/// Animate back to the identity transform.
	pub fn reset_zoom(&mut self) {
		self.zoom_to(ViewportTransform::IDENTITY);
	}

	/// Scale and center `bounds` to fill the viewport. Returns `false` and
	/// leaves the transform untouched for degenerate bounds.
	pub fn fit_to_content(&mut self, bounds: Bounds) -> bool {
		if bounds.is_degenerate() || self.width <= 0.0 || self.height <= 0.0 {
			debug!("fit to content skipped: degenerate bounds {bounds:?}");
			return false;
		}
		let k = self.extent.clamp(
			self.config.fit_fill * (self.width / bounds.width()).min(self.height / bounds.height()),
		);
		let c = bounds.center();
		self.zoom_to(ViewportTransform {
			x: self.width / 2.0 - c.x * k,
			y: self.height / 2.0 - c.y * k,
			k,
		});
		true
	}

	/// Switch fullscreen and return the new canvas size. Entering takes the
	/// screen width less the container padding on both sides and the screen
	/// height less the reserved chrome; leaving restores the inline size.
	/// The owner must re-lay-out afterwards.
	pub fn toggle_fullscreen(&mut self, screen_width: f64, screen_height: f64) -> (f64, f64) {
		self.fullscreen = !self.fullscreen;
		let (w, h) = if self.fullscreen {
			self.inline_size = (self.width, self.height);
			(
				(screen_width - 2.0 * self.config.fullscreen_padding).max(1.0),
				(screen_height - self.config.reserved_chrome).max(1.0),
			)
		} else {
			self.inline_size
		};
		info!("fullscreen {}: {w}x{h}", if self.fullscreen { "on" } else { "off" });
		self.resize(w, h);
		(w, h)
	}

	/// Set the canvas size without touching the transform.
	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	/// Key shortcuts only apply in fullscreen.
	pub fn handle_key(&self, key: &str) -> Option<ViewCommand> {
		if !self.fullscreen {
			return None;
		}
		self.bindings.resolve(key)
	}

	/// Zoom step for the in/out commands.
	pub fn zoom_step(&self) -> f64 {
		self.config.zoom_step
	}

	/// Advance an animated zoom. Returns whether it is still running.
	pub fn tick(&mut self, dt_ms: f64) -> bool {
		let Some(mut animation) = self.animation else {
			return false;
		};
		let running = animation.clock.advance(dt_ms);
		self.transform = if running {
			animation.from.lerp(&animation.to, animation.clock.eased())
		} else {
			animation.to
		};
		self.animation = running.then_some(animation);
		running
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn viewport() -> Viewport {
		Viewport::new(
			800.0,
			400.0,
			ScaleExtent::new(0.1, 5.0),
			KeyBindings::TREE,
			ViewportConfig::default(),
		)
	}

	fn settle(v: &mut Viewport) {
		while v.tick(16.0) {}
	}

	#[test]
	fn zoom_clamps_to_extent() {
		let mut v = viewport();
		v.zoom_by(100.0);
		settle(&mut v);
		assert_eq!(v.transform().k, 5.0);

		v.zoom_by(1e-6);
		settle(&mut v);
		assert_eq!(v.transform().k, 0.1);

		v.zoom_to(ViewportTransform {
			x: 3.0,
			y: 4.0,
			k: 42.0,
		});
		settle(&mut v);
		assert_eq!(v.transform().k, 5.0);
		assert_eq!(v.transform().x, 3.0);
	}

	#[test]
	fn swapped_extent_is_reordered() {
		let mut v = Viewport::new(
			800.0,
			400.0,
			ScaleExtent::new(5.0, 0.1),
			KeyBindings::GRAPH,
			ViewportConfig::default(),
		);
		assert_eq!(v.extent(), ScaleExtent::new(0.1, 5.0));
		v.zoom_by(2.0);
		settle(&mut v);
		assert_eq!(v.transform().k, 2.0);
		v.zoom_by(100.0);
		settle(&mut v);
		assert_eq!(v.transform().k, 5.0);

		// clamping straight through a bad extent never panics either
		assert_eq!(ScaleExtent::new(3.0, 0.5).clamp(10.0), 3.0);
		assert_eq!(ScaleExtent::new(f64::NAN, 2.0).clamp(9.0), 5.0);
		assert_eq!(ScaleExtent::new(0.0, 2.0).ordered(), ScaleExtent::DEFAULT);
	}

	#[test]
	fn repeated_zoom_steps_accumulate_on_target() {
		let mut v = viewport();
		v.zoom_by(2.0);
		v.zoom_by(2.0);
		settle(&mut v);
		assert!((v.transform().k - 4.0).abs() < 1e-9);
	}

	#[test]
	fn zoom_at_keeps_anchor_fixed() {
		let mut v = viewport();
		let anchor = Point::new(200.0, 100.0);
		let world = v.transform().invert(anchor);
		v.zoom_at(1.5, anchor);
		let back = v.transform().apply(world);
		assert!(back.distance(anchor) < 1e-9);
	}

	#[test]
	fn fit_centers_and_fills() {
		let mut v = viewport();
		let bounds = Bounds {
			min: Point::new(0.0, 0.0),
			max: Point::new(200.0, 100.0),
		};
		assert!(v.fit_to_content(bounds));
		settle(&mut v);
		let t = v.transform();
		assert!((t.k - 0.85 * 4.0).abs() < 1e-9);
		let center = t.apply(bounds.center());
		assert!(center.distance(Point::new(400.0, 200.0)) < 1e-9);
	}

	#[test]
	fn fit_on_degenerate_bounds_is_noop() {
		let mut v = viewport();
		v.set_transform(ViewportTransform {
			x: 10.0,
			y: 20.0,
			k: 2.0,
		});
		let before = v.transform();
		assert!(!v.fit_to_content(Bounds::default()));
		let flat = Bounds {
			min: Point::new(5.0, 5.0),
			max: Point::new(50.0, 5.0),
		};
		assert!(!v.fit_to_content(flat));
		assert!(!v.is_animating());
		assert_eq!(v.transform(), before);
	}

	#[test]
	fn reset_returns_to_identity() {
		let mut v = viewport();
		v.pan_by(30.0, -12.0);
		v.zoom_by(3.0);
		settle(&mut v);
		v.reset_zoom();
		settle(&mut v);
		assert_eq!(v.transform(), ViewportTransform::IDENTITY);
	}

	#[test]
	fn fullscreen_resizes_and_restores() {
		let mut v = viewport();
		assert_eq!(v.toggle_fullscreen(1920.0, 1080.0), (1888.0, 980.0));
		assert!(v.is_fullscreen());
		assert_eq!(v.toggle_fullscreen(1920.0, 1080.0), (800.0, 400.0));
		assert_eq!(v.size(), (800.0, 400.0));
	}

	#[test]
	fn fullscreen_canvas_fits_inside_padding() {
		let config = ViewportConfig {
			fullscreen_padding: 24.0,
			..ViewportConfig::default()
		};
		let mut v = Viewport::new(800.0, 400.0, ScaleExtent::DEFAULT, KeyBindings::GRAPH, config);
		let (w, _) = v.toggle_fullscreen(1280.0, 720.0);
		assert_eq!(w + 2.0 * 24.0, 1280.0);

		let mut tiny = viewport();
		assert_eq!(tiny.toggle_fullscreen(20.0, 50.0), (1.0, 1.0));
	}

	#[test]
	fn keys_only_in_fullscreen() {
		let mut v = viewport();
		assert_eq!(v.handle_key("+"), None);
		v.toggle_fullscreen(1000.0, 800.0);
		assert_eq!(v.handle_key("+"), Some(ViewCommand::ZoomIn));
		assert_eq!(v.handle_key("="), Some(ViewCommand::ZoomIn));
		assert_eq!(v.handle_key("-"), Some(ViewCommand::ZoomOut));
		assert_eq!(v.handle_key("0"), Some(ViewCommand::ResetZoom));
		assert_eq!(v.handle_key("F"), Some(ViewCommand::FitToContent));
		assert_eq!(v.handle_key("Escape"), Some(ViewCommand::ExitFullscreen));
		assert_eq!(v.handle_key("e"), Some(ViewCommand::ExpandAll));
		assert_eq!(v.handle_key("C"), Some(ViewCommand::CollapseAll));
		assert_eq!(v.handle_key("x"), None);
	}

	#[test]
	fn graph_bindings_skip_tree_keys() {
		assert_eq!(KeyBindings::GRAPH.resolve("e"), None);
		assert_eq!(KeyBindings::GRAPH.resolve("c"), None);
		assert_eq!(KeyBindings::GRAPH.resolve("f"), Some(ViewCommand::FitToContent));
	}
}
