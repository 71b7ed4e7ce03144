use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::error;

use super::state::TreeDiagramState;
use crate::components::canvas::{
	FrameLoop, PointerHandlers, SharedView, bind_view_keys, command_runner, container_style,
	context_2d, inline_width, set_canvas_size,
};
use crate::components::render::render;
use crate::components::scene::palette;
use crate::components::viewport::ViewCommand;
use crate::config::TreeConfig;
use crate::policy::{PolicyDocument, build_tree_model};

const LEGEND: [(&str, &str); 4] = [
	(palette::ALLOW, "Allow Statement"),
	(palette::DENY, "Deny Statement"),
	(palette::ACTION, "Actions"),
	(palette::RESOURCE, "Resources"),
];

/// Collapsible statement hierarchy. Click a branch to expand or collapse it.
#[component]
pub fn PolicyTreeCanvas(
	/// Policy to draw. A new document animates on from the current tree.
	#[prop(into)]
	document: Signal<PolicyDocument>,
	/// Spacing, animation and sizing tunables.
	#[prop(optional)]
	config: TreeConfig,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedView<TreeDiagramState> = Rc::new(RefCell::new(None));
	let padding = config.viewport.fullscreen_padding;
	let frames = FrameLoop::new();
	let (fullscreen, set_fullscreen) = signal(false);
	let (is_empty, set_is_empty) = signal(true);

	let (state_doc, frames_doc) = (state.clone(), frames.clone());
	Effect::new(move |_| {
		let doc = document.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let ctx = match context_2d(&canvas) {
			Ok(ctx) => ctx,
			Err(err) => {
				error!("tree view: {err}");
				return;
			}
		};

		// the old loop ends before the new state is built from the old one
		frames_doc.stop();
		let previous = state_doc.borrow_mut().take();

		let model = build_tree_model(&doc);
		set_is_empty.set(model.is_empty());
		let (w, h) = (inline_width(&canvas, config.min_width), config.inline_height);
		set_canvas_size(&canvas, w, h);
		let next = match &previous {
			Some(previous) => TreeDiagramState::rebuild(previous, &model, w, h, &config),
			None => TreeDiagramState::new(&model, w, h, &config),
		};
		*state_doc.borrow_mut() = Some(next);
		set_fullscreen.set(false);

		let state_frame = state_doc.clone();
		frames_doc.start(canvas, move |dt_ms| {
			if let Some(ref mut s) = *state_frame.borrow_mut() {
				s.tick(dt_ms);
				let (w, h) = s.viewport.size();
				render(&ctx, &s.scene(), &s.viewport.transform(), w, h);
			}
		});
	});

	let run = command_runner(state.clone(), canvas_ref, set_fullscreen);
	bind_view_keys(state.clone(), canvas_ref, set_fullscreen);
	let pointer = PointerHandlers::new(state.clone(), canvas_ref);

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
			class="policy-tree"
			style=move || container_style(fullscreen.get(), padding)
		>
			<div class="view-header">
				<h3>"Policy Structure Tree"</h3>
				<p class="subtitle">
					{move || {
						if is_empty.get() {
							"No policy data available"
						} else {
							"Click nodes to expand or collapse. Hover for details."
						}
					}}
				</p>
				<div class="view-toolbar">
					{button("Expand all", "Expand every branch (e)", ViewCommand::ExpandAll)}
					{button("Collapse all", "Collapse every branch (c)", ViewCommand::CollapseAll)}
					{button("+", "Zoom in", ViewCommand::ZoomIn)}
					{button("-", "Zoom out", ViewCommand::ZoomOut)}
					{button("Reset", "Reset zoom", ViewCommand::ResetZoom)}
					{button("Fit", "Fit to content", ViewCommand::FitToContent)}
					{button("Fullscreen", "Toggle fullscreen (Esc to exit)", ViewCommand::ToggleFullscreen)}
				</div>
			</div>
			<canvas
				node_ref=canvas_ref
				class="policy-tree-canvas"
				on:mousedown=pointer.down()
				on:mousemove=pointer.moved()
				on:mouseup=pointer.up()
				on:mouseleave=pointer.leave()
				on:wheel=pointer.wheel()
				style="display: block; cursor: pointer;"
			/>
			<div class="view-legend">
				{LEGEND
					.into_iter()
					.map(|(color, label)| {
						view! {
							<span class="legend-item">
								<span
									class="legend-swatch"
									style=format!(
										"display: inline-block; width: 10px; height: 10px; border-radius: 50%; background: {color};",
									)
								/>
								{label}
							</span>
						}
					})
					.collect_view()}
			</div>
		</div>
	}
}
