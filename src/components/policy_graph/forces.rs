//! Position-based force passes run after each `force_graph` integration
//! step. Pinned bodies are never moved.

use std::f64::consts::PI;

use crate::components::scene::Point;

/// Unit direction for bodies sitting on top of each other, stable per pair.
fn jiggle(a: usize, b: usize) -> (f64, f64) {
	let angle = (a * 31 + b * 17) as f64 * PI * (3.0 - 5f64.sqrt());
	(angle.cos(), angle.sin())
}

/// Springs with a rest length. Each link is corrected towards `distance`
/// by `alpha / min(degree)`, split by endpoint degree.
pub fn link(
	positions: &mut [Point],
	links: &[(usize, usize)],
	distance: f64,
	alpha: f64,
	pinned: &[bool],
) {
	let mut degree = vec![0usize; positions.len()];
	for &(s, t) in links {
		degree[s] += 1;
		degree[t] += 1;
	}

	for &(s, t) in links {
		if s == t {
			continue;
		}
		let (ps, pt) = (positions[s], positions[t]);
		let (mut dx, mut dy) = (pt.x - ps.x, pt.y - ps.y);
		let mut len = dx.hypot(dy);
		if len < 1e-9 {
			(dx, dy) = jiggle(s, t);
			len = 1.0;
		}
		let strength = 1.0 / degree[s].min(degree[t]) as f64;
		let f = (len - distance) / len * alpha * strength;
		let (fx, fy) = (dx * f, dy * f);
		let bias = degree[s] as f64 / (degree[s] + degree[t]) as f64;

		match (pinned[s], pinned[t]) {
			(true, true) => {}
			(true, false) => {
				positions[t].x -= fx;
				positions[t].y -= fy;
			}
			(false, true) => {
				positions[s].x += fx;
				positions[s].y += fy;
			}
			(false, false) => {
				positions[t].x -= fx * bias;
				positions[t].y -= fy * bias;
				positions[s].x += fx * (1.0 - bias);
				positions[s].y += fy * (1.0 - bias);
			}
		}
	}
}

/// Shift free bodies so the layout's mean sits on `center`.
pub fn center(positions: &mut [Point], center: Point, strength: f64, pinned: &[bool]) {
	if positions.is_empty() {
		return;
	}
	let n = positions.len() as f64;
	let (sx, sy) = positions
		.iter()
		.fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
	let (dx, dy) = ((center.x - sx / n) * strength, (center.y - sy / n) * strength);
	for (p, _) in positions.iter_mut().zip(pinned).filter(|(_, pinned)| !**pinned) {
		p.x += dx;
		p.y += dy;
	}
}

/// Push overlapping circles apart. A free body facing a pinned one takes
/// the whole correction.
pub fn collide(positions: &mut [Point], radii: &[f64], strength: f64, pinned: &[bool]) {
	let n = positions.len();
	for i in 0..n {
		for j in (i + 1)..n {
			if pinned[i] && pinned[j] {
				continue;
			}
			let reach = radii[i] + radii[j];
			let (dx, dy) = (positions[j].x - positions[i].x, positions[j].y - positions[i].y);
			let len = dx.hypot(dy);
			if len >= reach {
				continue;
			}
			let (ux, uy) = if len < 1e-9 {
				jiggle(i, j)
			} else {
				(dx / len, dy / len)
			};
			let push = (reach - len) * strength;
			let (share_i, share_j) = match (pinned[i], pinned[j]) {
				(true, _) => (0.0, 1.0),
				(_, true) => (1.0, 0.0),
				_ => (0.5, 0.5),
			};
			positions[i].x -= ux * push * share_i;
			positions[i].y -= uy * push * share_i;
			positions[j].x += ux * push * share_j;
			positions[j].y += uy * push * share_j;
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn link_restores_rest_length() {
		let mut pos = vec![Point::new(0.0, 0.0), Point::new(200.0, 0.0)];
		link(&mut pos, &[(0, 1)], 80.0, 1.0, &[false, false]);
		assert!((pos[0].distance(pos[1]) - 80.0).abs() < 1e-9);
		assert!((pos[0].x - 60.0).abs() < 1e-9);
	}

	#[test]
	fn link_moves_only_free_end() {
		let mut pos = vec![Point::new(0.0, 0.0), Point::new(0.0, 100.0)];
		link(&mut pos, &[(0, 1)], 80.0, 1.0, &[true, false]);
		assert_eq!(pos[0], Point::new(0.0, 0.0));
		assert!((pos[1].y - 80.0).abs() < 1e-9);
	}

	#[test]
	fn center_moves_mean() {
		let mut pos = vec![Point::new(0.0, 0.0), Point::new(10.0, 20.0)];
		center(&mut pos, Point::new(100.0, 100.0), 1.0, &[false, false]);
		let mean = pos[0].lerp(pos[1], 0.5);
		assert!(mean.distance(Point::new(100.0, 100.0)) < 1e-9);
	}

	#[test]
	fn collide_separates_overlaps() {
		let mut pos = vec![Point::new(0.0, 0.0), Point::new(5.0, 0.0)];
		collide(&mut pos, &[10.0, 10.0], 1.0, &[false, false]);
		assert!((pos[0].distance(pos[1]) - 20.0).abs() < 1e-9);
	}

	#[test]
	fn collide_splits_coincident_bodies() {
		let mut pos = vec![Point::new(3.0, 3.0), Point::new(3.0, 3.0)];
		collide(&mut pos, &[6.0, 6.0], 1.0, &[false, true]);
		assert_eq!(pos[1], Point::new(3.0, 3.0));
		assert!(pos[0].distance(pos[1]) > 11.0);
	}
}
