//! Browser plumbing shared by the canvas components.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::html::Canvas;
use leptos::prelude::*;
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent};

use super::scene::Point;
use super::viewport::{Bounds, ViewCommand, Viewport};
use crate::error::{Error, Result};

/// Longest frame delta handed to a view, in milliseconds. Keeps a
/// backgrounded tab from making the simulation jump.
const MAX_FRAME_MS: f64 = 100.0;

const INLINE_STYLE: &str = "position: relative; border: 1px solid #d5dbdb; border-radius: 4px;";

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// A view's state as the component holds it: empty until the first document.
pub type SharedView<V> = Rc<RefCell<Option<V>>>;

/// Pointer, wheel and command handling of a pannable, zoomable view.
pub trait CanvasView: 'static {
	/// Prefix of the view's log lines.
	const NAME: &'static str;

	fn viewport(&self) -> &Viewport;
	fn viewport_mut(&mut self) -> &mut Viewport;

	fn pointer_down(&mut self, p: Point);
	fn pointer_move(&mut self, p: Point);
	/// End a press. Returns the node a click acted on, if any.
	fn pointer_up(&mut self, p: Point) -> Option<usize>;
	fn pointer_leave(&mut self);

	/// New canvas size, already applied to the element.
	fn resize(&mut self, width: f64, height: f64);

	/// World-space box around everything drawn.
	fn content_bounds(&self) -> Bounds;

	/// Commands beyond pan and zoom.
	fn view_command(&mut self, _command: ViewCommand) {}

	fn wheel(&mut self, delta_y: f64, p: Point) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		self.viewport_mut().zoom_at(factor, p);
	}

	/// Apply a toolbar or keyboard command. Fullscreen changes are answered
	/// by [`dispatch`], which owns the canvas size.
	fn apply(&mut self, command: ViewCommand) {
		match command {
			ViewCommand::ZoomIn => {
				let step = self.viewport().zoom_step();
				self.viewport_mut().zoom_by(step);
			}
			ViewCommand::ZoomOut => {
				let step = self.viewport().zoom_step();
				self.viewport_mut().zoom_by(1.0 / step);
			}
			ViewCommand::ResetZoom => self.viewport_mut().reset_zoom(),
			ViewCommand::FitToContent => {
				let bounds = self.content_bounds();
				self.viewport_mut().fit_to_content(bounds);
			}
			ViewCommand::ToggleFullscreen | ViewCommand::ExitFullscreen => {}
			other => self.view_command(other),
		}
	}
}

/// A `requestAnimationFrame` loop guarded by a generation token.
///
/// Every [`FrameLoop::start`] bumps the token; a callback from an older
/// generation returns without rescheduling, so at most one loop per
/// component ever delivers a tick. The loop also ends once the canvas is
/// detached from the document.
#[derive(Clone, Default)]
pub struct FrameLoop {
	generation: Rc<Cell<u64>>,
}

impl FrameLoop {
	pub fn new() -> Self {
		Self::default()
	}

	/// Invalidate the running loop, if any.
	pub fn stop(&self) {
		self.generation.set(self.generation.get() + 1);
	}

	/// Start a fresh loop calling `frame(dt_ms)` once per animation frame.
	pub fn start(&self, canvas: HtmlCanvasElement, mut frame: impl FnMut(f64) + 'static) {
		self.stop();
		let generation = self.generation.get();
		let current = self.generation.clone();

		let callback: FrameCallback = Rc::new(RefCell::new(None));
		let reschedule = callback.clone();
		let mut last: Option<f64> = None;
		*callback.borrow_mut() = Some(Closure::new(move |now: f64| {
			// the closure is left in place rather than dropped while running
			if current.get() != generation {
				debug!("frame loop {generation} superseded");
				return;
			}
			if !canvas.is_connected() {
				debug!("frame loop {generation} ended: canvas detached");
				return;
			}
			let dt = last.map_or(16.0, |last| (now - last).clamp(0.0, MAX_FRAME_MS));
			last = Some(now);
			frame(dt);
			if let Some(cb) = reschedule.borrow().as_ref() {
				request_frame(cb);
			}
		}));
		if let Some(cb) = callback.borrow().as_ref() {
			request_frame(cb);
		}
	}
}

fn request_frame(cb: &Closure<dyn FnMut(f64)>) {
	if let Some(window) = web_sys::window() {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> Result<CanvasRenderingContext2d> {
	canvas
		.get_context("2d")
		.ok()
		.flatten()
		.and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
		.ok_or(Error::CanvasContext)
}

/// Pointer position relative to the canvas' top-left corner.
pub fn canvas_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Width available to an inline canvas, never below `min_width`.
pub fn inline_width(canvas: &HtmlCanvasElement, min_width: f64) -> f64 {
	canvas
		.parent_element()
		.map(|p| p.client_width() as f64)
		.filter(|w| *w > 0.0)
		.unwrap_or(800.0)
		.max(min_width)
}

pub fn window_size() -> (f64, f64) {
	let Some(window) = web_sys::window() else {
		return (800.0, 600.0);
	};
	let dim = |v: std::result::Result<JsValue, JsValue>, fallback: f64| {
		v.ok().and_then(|v| v.as_f64()).unwrap_or(fallback)
	};
	(dim(window.inner_width(), 800.0), dim(window.inner_height(), 600.0))
}

pub fn set_canvas_size(canvas: &HtmlCanvasElement, width: f64, height: f64) {
	canvas.set_width(width.max(1.0) as u32);
	canvas.set_height(height.max(1.0) as u32);
}

/// Flip `viewport` in or out of fullscreen and size the canvas to match.
/// Returns the new size for the owner's re-layout.
fn toggle_fullscreen(canvas: &HtmlCanvasElement, viewport: &mut Viewport) -> (f64, f64) {
	let (screen_width, screen_height) = window_size();
	let (width, height) = viewport.toggle_fullscreen(screen_width, screen_height);
	set_canvas_size(canvas, width, height);
	(width, height)
}

/// Inline style of a view's outer container. The fullscreen container
/// keeps its padding inside the viewport and never scrolls.
pub fn container_style(fullscreen: bool, padding: f64) -> String {
	if !fullscreen {
		return INLINE_STYLE.to_string();
	}
	format!(
		"position: fixed; inset: 0; z-index: 1000; background: #ffffff; padding: {padding}px; \
		 box-sizing: border-box; overflow: hidden;"
	)
}

/// Run a toolbar or keyboard command. Returns whether the view ends up
/// fullscreen, or `None` before the first document arrived.
pub fn dispatch<V: CanvasView>(
	state: &RefCell<Option<V>>,
	canvas: Option<HtmlCanvasElement>,
	command: ViewCommand,
) -> Option<bool> {
	let mut slot = state.borrow_mut();
	let view = slot.as_mut()?;
	match command {
		ViewCommand::ExitFullscreen if !view.viewport().is_fullscreen() => {}
		ViewCommand::ToggleFullscreen | ViewCommand::ExitFullscreen => {
			let canvas = canvas?;
			let (w, h) = toggle_fullscreen(&canvas, view.viewport_mut());
			view.resize(w, h);
		}
		other => view.apply(other),
	}
	Some(view.viewport().is_fullscreen())
}

/// Toolbar callback running `dispatch` and mirroring the fullscreen flag.
pub fn command_runner<V: CanvasView>(
	state: SharedView<V>,
	canvas_ref: NodeRef<Canvas>,
	set_fullscreen: WriteSignal<bool>,
) -> Rc<dyn Fn(ViewCommand)> {
	Rc::new(move |command| {
		if let Some(on) = dispatch::<V>(&state, canvas_ref.get_untracked(), command) {
			set_fullscreen.set(on);
		}
	})
}

/// Route window `keydown` events to the view. The listener is removed when
/// the owning component is cleaned up.
pub fn bind_view_keys<V: CanvasView>(
	state: SharedView<V>,
	canvas_ref: NodeRef<Canvas>,
	set_fullscreen: WriteSignal<bool>,
) {
	let handle = window_event_listener(leptos::ev::keydown, move |ev: KeyboardEvent| {
		let command = state
			.borrow()
			.as_ref()
			.and_then(|view| view.viewport().handle_key(&ev.key()));
		let Some(command) = command else {
			return;
		};
		ev.prevent_default();
		debug!("{} key {command:?}", V::NAME);
		if let Some(on) = dispatch::<V>(&state, canvas_ref.get_untracked(), command) {
			set_fullscreen.set(on);
		}
	});
	on_cleanup(move || handle.remove());
}

/// Canvas mouse and wheel handlers forwarding to a [`CanvasView`].
pub struct PointerHandlers<V> {
	state: SharedView<V>,
	canvas_ref: NodeRef<Canvas>,
}

impl<V: CanvasView> PointerHandlers<V> {
	pub fn new(state: SharedView<V>, canvas_ref: NodeRef<Canvas>) -> Self {
		Self { state, canvas_ref }
	}

	fn forward(&self, action: fn(&mut V, Point)) -> impl Fn(MouseEvent) + use<V> {
		let (state, canvas_ref) = (self.state.clone(), self.canvas_ref);
		move |ev: MouseEvent| {
			let Some(canvas) = canvas_ref.get_untracked() else {
				return;
			};
			if let Some(view) = state.borrow_mut().as_mut() {
				action(view, canvas_point(&canvas, &ev));
			}
		}
	}

	pub fn down(&self) -> impl Fn(MouseEvent) + use<V> {
		self.forward(V::pointer_down)
	}

	pub fn moved(&self) -> impl Fn(MouseEvent) + use<V> {
		self.forward(V::pointer_move)
	}

	pub fn up(&self) -> impl Fn(MouseEvent) + use<V> {
		self.forward(|view, p| {
			view.pointer_up(p);
		})
	}

	pub fn leave(&self) -> impl Fn(MouseEvent) + use<V> {
		let state = self.state.clone();
		move |_: MouseEvent| {
			if let Some(view) = state.borrow_mut().as_mut() {
				view.pointer_leave();
			}
		}
	}

	pub fn wheel(&self) -> impl Fn(WheelEvent) + use<V> {
		let (state, canvas_ref) = (self.state.clone(), self.canvas_ref);
		move |ev: WheelEvent| {
			ev.prevent_default();
			let Some(canvas) = canvas_ref.get_untracked() else {
				return;
			};
			if let Some(view) = state.borrow_mut().as_mut() {
				view.wheel(ev.delta_y(), canvas_point(&canvas, &ev));
			}
		}
	}
}
