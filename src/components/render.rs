use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::scene::{Point, Primitive, Scene, Stroke, TextAlign, palette};
use super::viewport::ViewportTransform;

/// Paint one frame. Never touches layout state.
pub fn render(
	ctx: &CanvasRenderingContext2d,
	scene: &Scene,
	transform: &ViewportTransform,
	width: f64,
	height: f64,
) {
	ctx.set_fill_style_str(palette::WHITE);
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let _ = ctx.translate(transform.x, transform.y);
	let _ = ctx.scale(transform.k, transform.k);
	for primitive in &scene.world {
		draw(ctx, primitive);
	}
	ctx.restore();
	for primitive in &scene.overlay {
		draw(ctx, primitive);
	}
}

fn set_stroke(ctx: &CanvasRenderingContext2d, stroke: &Stroke) {
	ctx.set_stroke_style_str(stroke.color);
	ctx.set_line_width(stroke.width);
}

fn draw(ctx: &CanvasRenderingContext2d, primitive: &Primitive) {
	match primitive {
		Primitive::Circle {
			center,
			radius,
			fill,
			stroke,
			opacity,
		} => {
			ctx.set_global_alpha(*opacity);
			ctx.begin_path();
			let _ = ctx.arc(center.x, center.y, radius.max(0.0), 0.0, 2.0 * PI);
			ctx.set_fill_style_str(fill);
			ctx.fill();
			if let Some(stroke) = stroke {
				set_stroke(ctx, stroke);
				ctx.stroke();
			}
			ctx.set_global_alpha(1.0);
		}
		Primitive::Glow {
			center,
			inner,
			outer,
			alpha,
		} => draw_glow(ctx, *center, *inner, *outer, *alpha),
		Primitive::Line {
			from,
			to,
			stroke,
			opacity,
			dash,
		} => {
			ctx.set_global_alpha(*opacity);
			set_stroke(ctx, stroke);
			if let Some([on, off]) = dash {
				let _ = ctx.set_line_dash(&js_sys::Array::of2(
					&JsValue::from_f64(*on),
					&JsValue::from_f64(*off),
				));
			}
			ctx.begin_path();
			ctx.move_to(from.x, from.y);
			ctx.line_to(to.x, to.y);
			ctx.stroke();
			let _ = ctx.set_line_dash(&js_sys::Array::new());
			ctx.set_global_alpha(1.0);
		}
		Primitive::Curve {
			from,
			c1,
			c2,
			to,
			stroke,
			opacity,
		} => {
			ctx.set_global_alpha(*opacity);
			set_stroke(ctx, stroke);
			ctx.begin_path();
			ctx.move_to(from.x, from.y);
			ctx.bezier_curve_to(c1.x, c1.y, c2.x, c2.y, to.x, to.y);
			ctx.stroke();
			ctx.set_global_alpha(1.0);
		}
		Primitive::Arc {
			center,
			inner,
			outer,
			start,
			end,
			fill,
			stroke,
			opacity,
		} => {
			// scene angles start at twelve o'clock, canvas angles at three
			let (a0, a1) = (start - PI / 2.0, end - PI / 2.0);
			ctx.set_global_alpha(*opacity);
			ctx.begin_path();
			let _ = ctx.arc(center.x, center.y, *outer, a0, a1);
			let _ = ctx.arc_with_anticlockwise(center.x, center.y, *inner, a1, a0, true);
			ctx.close_path();
			ctx.set_fill_style_str(fill);
			ctx.fill();
			if let Some(stroke) = stroke {
				set_stroke(ctx, stroke);
				ctx.stroke();
			}
			ctx.set_global_alpha(1.0);
		}
		Primitive::Rect {
			origin,
			width,
			height,
			fill,
			stroke,
		} => {
			ctx.set_fill_style_str(fill);
			ctx.fill_rect(origin.x, origin.y, *width, *height);
			if let Some(stroke) = stroke {
				set_stroke(ctx, stroke);
				ctx.stroke_rect(origin.x, origin.y, *width, *height);
			}
		}
		Primitive::Text {
			at,
			text,
			size,
			fill,
			align,
			bold,
			opacity,
		} => {
			ctx.set_global_alpha(*opacity);
			ctx.set_fill_style_str(fill);
			ctx.set_font(&format!(
				"{}{}px sans-serif",
				if *bold { "600 " } else { "" },
				size
			));
			ctx.set_text_align(match align {
				TextAlign::Start => "start",
				TextAlign::Middle => "center",
				TextAlign::End => "end",
			});
			ctx.set_text_baseline("middle");
			let _ = ctx.fill_text(text, at.x, at.y);
			ctx.set_global_alpha(1.0);
		}
		Primitive::Tooltip { at, lines } => draw_tooltip(ctx, *at, lines),
	}
}

fn draw_glow(ctx: &CanvasRenderingContext2d, center: Point, inner: f64, outer: f64, alpha: f64) {
	let Ok(gradient) = ctx.create_radial_gradient(center.x, center.y, inner, center.x, center.y, outer)
	else {
		return;
	};
	let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 153, 0, {})", alpha));
	let _ = gradient.add_color_stop(0.6, &format!("rgba(255, 200, 120, {})", alpha * 0.3));
	let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
	ctx.begin_path();
	let _ = ctx.arc(center.x, center.y, outer, 0.0, 2.0 * PI);
	#[allow(deprecated)]
	ctx.set_fill_style(&gradient);
	ctx.fill();
}

fn draw_tooltip(ctx: &CanvasRenderingContext2d, at: Point, lines: &[String]) {
	const PAD: f64 = 8.0;
	const LINE: f64 = 16.0;
	ctx.set_font("12px sans-serif");
	let width = lines
		.iter()
		.filter_map(|l| ctx.measure_text(l).ok())
		.map(|m| m.width())
		.fold(0.0, f64::max);
	let height = lines.len() as f64 * LINE;

	ctx.set_fill_style_str("rgba(0, 0, 0, 0.8)");
	ctx.fill_rect(at.x, at.y, width + 2.0 * PAD, height + PAD);
	ctx.set_fill_style_str(palette::WHITE);
	ctx.set_text_align("start");
	ctx.set_text_baseline("middle");
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, at.x + PAD, at.y + PAD / 2.0 + LINE * (i as f64 + 0.5));
	}
}
