use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{error, warn};

use super::state::PolicyGraphState;
use crate::components::canvas::{
	FrameLoop, PointerHandlers, SharedView, bind_view_keys, command_runner, container_style,
	context_2d, inline_width, set_canvas_size,
};
use crate::components::render::render;
use crate::components::scene::node_color;
use crate::components::viewport::ViewCommand;
use crate::config::GraphConfig;
use crate::policy::{KindFilter, NodeKind, PolicyDocument, build_graph_model};

/// Force-directed relationship network of statements, actions, resources
/// and principals.
#[component]
pub fn PolicyGraphCanvas(
	/// Policy to draw. Every change rebuilds the graph.
	#[prop(into)]
	document: Signal<PolicyDocument>,
	/// Layout, zoom and sizing tunables.
	#[prop(optional)]
	config: GraphConfig,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedView<PolicyGraphState> = Rc::new(RefCell::new(None));
	let padding = config.viewport.fullscreen_padding;
	let frames = FrameLoop::new();
	let (filter, set_filter) = signal(KindFilter::All);
	let (fullscreen, set_fullscreen) = signal(false);
	let (is_empty, set_is_empty) = signal(true);

	// a new document replaces the state wholesale; the old loop is
	// invalidated before the new one is scheduled
	let (state_doc, frames_doc) = (state.clone(), frames.clone());
	Effect::new(move |_| {
		let doc = document.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let ctx = match context_2d(&canvas) {
			Ok(ctx) => ctx,
			Err(err) => {
				error!("graph view: {err}");
				return;
			}
		};

		frames_doc.stop();
		if let Some(mut previous) = state_doc.borrow_mut().take() {
			previous.stop();
		}

		let model = build_graph_model(&doc);
		set_is_empty.set(model.is_empty());
		let (w, h) = (inline_width(&canvas, config.min_width), config.inline_height);
		set_canvas_size(&canvas, w, h);
		let mut next = PolicyGraphState::new(model, w, h, &config);
		next.set_filter(filter.get_untracked());
		*state_doc.borrow_mut() = Some(next);
		set_fullscreen.set(false);

		let state_frame = state_doc.clone();
		frames_doc.start(canvas, move |dt_ms| {
			if let Some(ref mut s) = *state_frame.borrow_mut() {
				s.tick((dt_ms / 1000.0) as f32);
				let (w, h) = s.viewport.size();
				render(&ctx, &s.scene(), &s.viewport.transform(), w, h);
			}
		});
	});

	let state_filter = state.clone();
	Effect::new(move |_| {
		let filter = filter.get();
		if let Some(ref mut s) = *state_filter.borrow_mut() {
			s.set_filter(filter);
		}
	});

	let run = command_runner(state.clone(), canvas_ref, set_fullscreen);
	bind_view_keys(state.clone(), canvas_ref, set_fullscreen);
	let pointer = PointerHandlers::new(state.clone(), canvas_ref);

	let on_filter = move |ev: web_sys::Event| match event_target_value(&ev).parse::<KindFilter>() {
		Ok(next) => set_filter.set(next),
		Err(err) => warn!("{err}"),
	};

	let button = move |label: &'static str, title: &'static str, command: ViewCommand| {
		let run = run.clone();
		view! {
			<button class="view-button" title=title on:click=move |_| run(command)>
				{label}
			</button>
		}
	};

	view! {
		<div
			class="policy-graph"
			style=move || container_style(fullscreen.get(), padding)
		>
			<div class="view-header">
				<h3>"Policy Relationship Graph"</h3>
				<p class="subtitle">
					{move || {
						if is_empty.get() {
							"No policy loaded"
						} else {
							"Drag nodes to reposition. Scroll to zoom. Drag the background to pan."
						}
					}}
				</p>
				<div class="view-toolbar">
					<label>
						"Show: "
						<select on:change=on_filter>
							<option value="all">"All nodes"</option>
							{NodeKind::ALL
								.into_iter()
								.map(|kind| view! { <option value=kind.as_str()>{kind.label()}</option> })
								.collect_view()}
						</select>
					</label>
					{button("+", "Zoom in", ViewCommand::ZoomIn)}
					{button("-", "Zoom out", ViewCommand::ZoomOut)}
					{button("Reset", "Reset zoom", ViewCommand::ResetZoom)}
					{button("Fit", "Fit to content", ViewCommand::FitToContent)}
					{button("Fullscreen", "Toggle fullscreen (Esc to exit)", ViewCommand::ToggleFullscreen)}
				</div>
			</div>
			<canvas
				node_ref=canvas_ref
				class="policy-graph-canvas"
				on:mousedown=pointer.down()
				on:mousemove=pointer.moved()
				on:mouseup=pointer.up()
				on:mouseleave=pointer.leave()
				on:wheel=pointer.wheel()
				style="display: block; cursor: grab;"
			/>
			<div class="view-legend">
				{NodeKind::ALL
					.into_iter()
					.map(|kind| {
						view! {
							<span class="legend-item">
								<span
									class="legend-swatch"
									style=format!(
										"display: inline-block; width: 10px; height: 10px; border-radius: 50%; background: {};",
										node_color(kind),
									)
								/>
								{kind.label()}
							</span>
						}
					})
					.collect_view()}
			</div>
		</div>
	}
}
