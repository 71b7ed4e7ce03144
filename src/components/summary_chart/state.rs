use std::f64::consts::TAU;

use log::info;

use crate::components::scene::{
	Point, Primitive, Scene, Stroke, TextAlign, effect_color, palette,
};
use crate::components::transition::Transition;
use crate::config::ChartConfig;
use crate::policy::ChartModel;

/// Percentage labels fade in once the sweep has finished.
const LABEL_DELAY_MS: f64 = 800.0;
const CENTER_DELAY_MS: f64 = 1000.0;
const FADE_MS: f64 = 400.0;

const LEGEND_INSET: f64 = 100.0;
const LEGEND_ROW: f64 = 25.0;
const SWATCH: f64 = 15.0;

/// Angular span of one slice, clockwise from twelve o'clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SliceGeometry {
	pub start: f64,
	pub end: f64,
}

impl SliceGeometry {
	fn mid(&self) -> f64 {
		(self.start + self.end) / 2.0
	}

	fn contains(&self, angle: f64) -> bool {
		angle >= self.start && angle < self.end
	}
}

/// Point at `radius` and `angle` (clockwise from twelve o'clock).
fn polar(center: Point, radius: f64, angle: f64) -> Point {
	Point::new(center.x + radius * angle.sin(), center.y - radius * angle.cos())
}

fn fade(elapsed_ms: f64, delay_ms: f64) -> f64 {
	((elapsed_ms - delay_ms) / FADE_MS).clamp(0.0, 1.0)
}

/// Effect distribution donut. Not zoomable; it only sweeps in once and
/// reacts to hover.
pub struct SummaryChartState {
	model: ChartModel,
	width: f64,
	height: f64,
	config: ChartConfig,
	slices: Vec<SliceGeometry>,
	intro: Transition,
	elapsed_ms: f64,
	/// Current radial growth per slice.
	grow: Vec<f64>,
	hovered: Option<usize>,
	pointer: Option<Point>,
}

impl SummaryChartState {
	pub fn new(model: ChartModel, width: f64, config: &ChartConfig) -> Self {
		let width = width.min(config.max_width);
		let count: usize = model.slices.iter().map(|s| s.count).sum();
		let mut slices = Vec::with_capacity(model.slices.len());
		let mut start = 0.0;
		for slice in &model.slices {
			let end = if count == 0 {
				start
			} else {
				start + slice.count as f64 / count as f64 * TAU
			};
			slices.push(SliceGeometry { start, end });
			start = end;
		}
		info!("summary chart: {} slices, {} statements", slices.len(), model.total);
		Self {
			grow: vec![0.0; slices.len()],
			model,
			width,
			height: config.height,
			config: config.clone(),
			slices,
			intro: Transition::new(config.intro_ms),
			elapsed_ms: 0.0,
			hovered: None,
			pointer: None,
		}
	}

	#[cfg(test)]
	pub fn model(&self) -> &ChartModel {
		&self.model
	}

	pub fn size(&self) -> (f64, f64) {
		(self.width, self.height)
	}

	#[cfg(test)]
	pub fn slices(&self) -> &[SliceGeometry] {
		&self.slices
	}

	#[cfg(test)]
	pub fn hovered(&self) -> Option<usize> {
		self.hovered
	}

	fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}

	pub fn radius(&self) -> f64 {
		(self.width.min(self.height) / 2.0 - self.config.margin).max(0.0)
	}

	fn inner_radius(&self) -> f64 {
		self.radius() * self.config.hole
	}

	/// Whether anything still moves.
	#[cfg(test)]
	pub fn is_animating(&self) -> bool {
		let target = |i: usize| {
			if Some(i) == self.hovered { self.config.hover_grow } else { 0.0 }
		};
		self.intro.is_running()
			|| self.elapsed_ms < CENTER_DELAY_MS + FADE_MS
			|| self.grow.iter().enumerate().any(|(i, g)| *g != target(i))
	}

	pub fn tick(&mut self, dt_ms: f64) {
		self.intro.advance(dt_ms);
		self.elapsed_ms += dt_ms;
		let step = if self.config.hover_ms > 0.0 {
			self.config.hover_grow * dt_ms / self.config.hover_ms
		} else {
			f64::INFINITY
		};
		for (i, grow) in self.grow.iter_mut().enumerate() {
			let target = if Some(i) == self.hovered { self.config.hover_grow } else { 0.0 };
			*grow = if *grow < target {
				(*grow + step).min(target)
			} else {
				(*grow - step).max(target)
			};
		}
	}

	/// Slice under `p`, counting its hover growth.
	pub fn slice_at(&self, p: Point) -> Option<usize> {
		let c = self.center();
		let (dx, dy) = (p.x - c.x, p.y - c.y);
		let distance = dx.hypot(dy);
		if distance < self.inner_radius() {
			return None;
		}
		let angle = dx.atan2(-dy).rem_euclid(TAU);
		self.slices
			.iter()
			.position(|s| s.contains(angle))
			.filter(|&i| distance <= self.radius() + self.grow[i])
	}

	pub fn pointer_move(&mut self, p: Point) {
		self.pointer = Some(p);
		self.hovered = self.slice_at(p);
	}

	pub fn pointer_leave(&mut self) {
		self.pointer = None;
		self.hovered = None;
	}

	pub fn scene(&self) -> Scene {
		if self.model.is_empty() {
			return Scene::empty_state(self.width, self.height, "No statements to chart");
		}

		let center = self.center();
		let (inner, outer) = (self.inner_radius(), self.radius());
		let sweep = self.intro.eased();
		let mut scene = Scene::default();

		for ((slice, geometry), grow) in self.model.slices.iter().zip(&self.slices).zip(&self.grow) {
			scene.world.push(Primitive::Arc {
				center,
				inner,
				outer: outer + grow,
				start: geometry.start * sweep,
				end: geometry.end * sweep,
				fill: effect_color(slice.effect),
				stroke: Some(Stroke {
					color: palette::WHITE,
					width: 2.0,
				}),
				opacity: 1.0,
			});
		}

		let label_opacity = fade(self.elapsed_ms, LABEL_DELAY_MS);
		for (slice, geometry) in self.model.slices.iter().zip(&self.slices) {
			scene.world.push(Primitive::Text {
				at: polar(center, (inner + outer) / 2.0, geometry.mid()),
				text: format!("{:.1}%", self.model.percentage(slice)),
				size: 14.0,
				fill: palette::WHITE,
				align: TextAlign::Middle,
				bold: true,
				opacity: label_opacity,
			});
		}

		let center_opacity = fade(self.elapsed_ms, CENTER_DELAY_MS);
		scene.world.push(Primitive::Text {
			at: Point::new(center.x, center.y - 8.0),
			text: self.model.total.to_string(),
			size: 24.0,
			fill: palette::TEXT,
			align: TextAlign::Middle,
			bold: true,
			opacity: center_opacity,
		});
		scene.world.push(Primitive::Text {
			at: Point::new(center.x, center.y + 14.0),
			text: "Total Statements".into(),
			size: 12.0,
			fill: palette::MUTED_TEXT,
			align: TextAlign::Middle,
			bold: false,
			opacity: center_opacity,
		});

		let legend = Point::new(self.width - LEGEND_INSET, 20.0);
		for (i, slice) in self.model.slices.iter().enumerate() {
			let y = legend.y + i as f64 * LEGEND_ROW;
			scene.world.push(Primitive::Rect {
				origin: Point::new(legend.x, y),
				width: SWATCH,
				height: SWATCH,
				fill: effect_color(slice.effect),
				stroke: Some(Stroke {
					color: palette::LINK,
					width: 1.0,
				}),
			});
			scene.world.push(Primitive::Text {
				at: Point::new(legend.x + 20.0, y + SWATCH / 2.0),
				text: format!("{} ({})", slice.label, slice.count),
				size: 12.0,
				fill: palette::TEXT,
				align: TextAlign::Start,
				bold: false,
				opacity: 1.0,
			});
		}

		if let (Some(i), Some(pointer)) = (self.hovered, self.pointer) {
			let slice = &self.model.slices[i];
			scene.overlay.push(Primitive::Tooltip {
				at: Point::new(pointer.x + 10.0, pointer.y - 10.0),
				lines: vec![
					slice.label.clone(),
					format!("Statements: {}", slice.count),
					format!("Percentage: {:.1}%", self.model.percentage(slice)),
				],
			});
		}
		scene
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::{Effect, PolicyDocument, Statement, build_chart_model};

	fn state() -> SummaryChartState {
		let doc = PolicyDocument::new(vec![
			Statement::new(Effect::Deny),
			Statement::new(Effect::Allow),
			Statement::new(Effect::Allow),
			Statement::new(Effect::Allow),
		]);
		SummaryChartState::new(build_chart_model(&doc), 600.0, &ChartConfig::default())
	}

	fn arcs(scene: &Scene) -> Vec<(f64, f64, f64)> {
		scene
			.world
			.iter()
			.filter_map(|p| match p {
				Primitive::Arc { start, end, outer, .. } => Some((*start, *end, *outer)),
				_ => None,
			})
			.collect()
	}

	#[test]
	fn geometry_follows_first_appearance() {
		let state = state();
		assert_eq!(state.size(), (400.0, 300.0));
		assert_eq!(state.radius(), 110.0);
		let slices = state.slices();
		assert_eq!(slices[0].start, 0.0);
		assert!((slices[0].end - TAU / 4.0).abs() < 1e-9);
		assert!((slices[1].end - TAU).abs() < 1e-9);
	}

	#[test]
	fn intro_sweeps_from_zero() {
		let mut state = state();
		assert!(arcs(&state.scene()).iter().all(|&(s, e, _)| s == 0.0 && e == 0.0));
		state.tick(800.0);
		let swept = arcs(&state.scene());
		assert!((swept[1].1 - TAU).abs() < 1e-9);
	}

	#[test]
	fn hover_grows_slice_and_shows_tooltip() {
		let mut state = state();
		state.tick(2000.0);
		// right of the centre lies in the second quarter, the Allow slice
		let p = Point::new(200.0 + 80.0, 150.0);
		state.pointer_move(p);
		assert_eq!(state.hovered(), Some(1));
		state.tick(100.0);
		assert!(state.is_animating());
		state.tick(100.0);
		assert_eq!(arcs(&state.scene())[1].2, 120.0);

		let scene = state.scene();
		let Some(Primitive::Tooltip { lines, .. }) = scene.overlay.first() else {
			panic!("no tooltip");
		};
		assert_eq!(lines, &["Allow", "Statements: 3", "Percentage: 75.0%"]);

		state.pointer_leave();
		state.tick(200.0);
		assert_eq!(arcs(&state.scene())[1].2, 110.0);
		assert!(!state.is_animating());
	}

	#[test]
	fn hole_and_outside_miss() {
		let state = state();
		assert_eq!(state.slice_at(Point::new(200.0, 150.0)), None);
		assert_eq!(state.slice_at(Point::new(200.0, 150.0 - 200.0)), None);
		assert_eq!(state.slice_at(Point::new(200.0 + 10.0, 150.0 - 90.0)), Some(0));
	}

	#[test]
	fn legend_lists_effects_with_counts() {
		let scene = state().scene();
		let texts: Vec<&str> = scene
			.world
			.iter()
			.filter_map(|p| match p {
				Primitive::Text { text, align: TextAlign::Start, .. } => Some(text.as_str()),
				_ => None,
			})
			.collect();
		assert_eq!(texts, ["Deny (1)", "Allow (3)"]);
	}

	#[test]
	fn empty_chart_draws_empty_state() {
		let state = SummaryChartState::new(ChartModel::default(), 600.0, &ChartConfig::default());
		assert!(state.scene().world.is_empty());
		assert_eq!(state.slice_at(Point::new(200.0, 60.0)), None);
	}
}
