use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;
use web_sys::MouseEvent;

use super::state::SummaryChartState;
use crate::components::canvas::{
	FrameLoop, SharedView, canvas_point, context_2d, inline_width, set_canvas_size,
};
use crate::components::render::render;
use crate::components::viewport::ViewportTransform;
use crate::config::ChartConfig;
use crate::policy::{PolicyDocument, build_chart_model};

/// Donut of statements per effect.
#[component]
pub fn SummaryChartCanvas(
	/// Policy whose statements are counted.
	#[prop(into)]
	document: Signal<PolicyDocument>,
	/// Size and animation tunables.
	#[prop(optional)]
	config: ChartConfig,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedView<SummaryChartState> = Rc::new(RefCell::new(None));
	let frames = FrameLoop::new();

	let state_doc = state.clone();
	Effect::new(move |_| {
		let doc = document.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let ctx = match context_2d(&canvas) {
			Ok(ctx) => ctx,
			Err(err) => {
				error!("summary chart: {err}");
				return;
			}
		};

		frames.stop();
		let next = SummaryChartState::new(build_chart_model(&doc), inline_width(&canvas, 0.0), &config);
		let (w, h) = next.size();
		set_canvas_size(&canvas, w, h);
		*state_doc.borrow_mut() = Some(next);

		let state_frame = state_doc.clone();
		frames.start(canvas, move |dt_ms| {
			if let Some(ref mut s) = *state_frame.borrow_mut() {
				s.tick(dt_ms);
				let (w, h) = s.size();
				render(&ctx, &s.scene(), &ViewportTransform::IDENTITY, w, h);
			}
		});
	});

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get_untracked() else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(canvas_point(&canvas, &ev));
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	view! {
		<div class="summary-chart">
			<div class="view-header">
				<h3>"Statement Breakdown"</h3>
				<p class="subtitle">"Distribution of Allow vs Deny statements"</p>
			</div>
			<canvas
				node_ref=canvas_ref
				class="summary-chart-canvas"
				on:mousemove=on_mousemove
				on:mouseleave=on_mouseleave
				style="display: block; cursor: pointer;"
			/>
		</div>
	}
}
