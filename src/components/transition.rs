/// Eased approach used for hover fades.
pub fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Default easing of zooms and tree re-layouts.
pub fn ease_cubic_in_out(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

/// Fixed-length clock advanced by frame deltas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
	elapsed_ms: f64,
	duration_ms: f64,
}

impl Transition {
	pub fn new(duration_ms: f64) -> Self {
		Self {
			elapsed_ms: 0.0,
			duration_ms: duration_ms.max(0.0),
		}
	}

	pub fn finished() -> Self {
		Self {
			elapsed_ms: 0.0,
			duration_ms: 0.0,
		}
	}

	/// Returns whether the transition is still running afterwards.
	pub fn advance(&mut self, dt_ms: f64) -> bool {
		self.elapsed_ms = (self.elapsed_ms + dt_ms).min(self.duration_ms);
		self.is_running()
	}

	pub fn is_running(&self) -> bool {
		self.elapsed_ms < self.duration_ms
	}

	pub fn progress(&self) -> f64 {
		if self.duration_ms <= 0.0 {
			return 1.0;
		}
		(self.elapsed_ms / self.duration_ms).clamp(0.0, 1.0)
	}

	pub fn eased(&self) -> f64 {
		ease_cubic_in_out(self.progress())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn runs_for_its_duration() {
		let mut t = Transition::new(300.0);
		assert!(t.advance(100.0));
		assert!((t.progress() - 1.0 / 3.0).abs() < 1e-9);
		assert!(!t.advance(250.0));
		assert_eq!(t.progress(), 1.0);
		assert_eq!(t.eased(), 1.0);
	}

	#[test]
	fn zero_length_is_done() {
		assert!(!Transition::finished().is_running());
		assert_eq!(Transition::new(0.0).progress(), 1.0);
	}

	#[test]
	fn easing_endpoints() {
		assert_eq!(ease_cubic_in_out(0.0), 0.0);
		assert_eq!(ease_cubic_in_out(0.5), 0.5);
		assert_eq!(ease_out_cubic(1.0), 1.0);
	}
}
