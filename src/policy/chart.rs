use super::document::{Effect, PolicyDocument};

/// One donut slice: the statements sharing an effect.
#[derive(Clone, Debug, PartialEq)]
pub struct ChartSlice {
	/// Legend text.
	pub label: String,
	/// Effect the slice counts, which also picks its colour.
	pub effect: Effect,
	/// Number of statements with this effect.
	pub count: usize,
}

/// Statement counts per effect, in first-appearance order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ChartModel {
	/// Slices in first-appearance order.
	pub slices: Vec<ChartSlice>,
	/// Statements counted, the denominator of every percentage.
	pub total: usize,
}

impl ChartModel {
	/// True when there are no slices.
	pub fn is_empty(&self) -> bool {
		self.slices.is_empty()
	}

	/// Share of `slice` in percent, `0.0` for an empty chart.
	pub fn percentage(&self, slice: &ChartSlice) -> f64 {
		if self.total == 0 {
			return 0.0;
		}
		slice.count as f64 / self.total as f64 * 100.0
	}
}

/// Group statements by effect. Order is never re-sorted: legend and donut
/// read the slices in the same order.
pub fn build_chart_model(doc: &PolicyDocument) -> ChartModel {
	let mut slices: Vec<ChartSlice> = Vec::new();
	for statement in &doc.statements {
		match slices.iter_mut().find(|s| s.effect == statement.effect) {
			Some(slice) => slice.count += 1,
			None => slices.push(ChartSlice {
				label: statement.effect.to_string(),
				effect: statement.effect,
				count: 1,
			}),
		}
	}
	ChartModel {
		slices,
		total: doc.total_statements,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::Statement;

	#[test]
	fn keeps_first_seen_order() {
		let doc = PolicyDocument::new(vec![
			Statement::new(Effect::Deny),
			Statement::new(Effect::Allow),
			Statement::new(Effect::Deny),
			Statement::default(),
		]);
		let chart = build_chart_model(&doc);
		let labels: Vec<_> = chart.slices.iter().map(|s| (s.label.as_str(), s.count)).collect();
		assert_eq!(labels, [("Deny", 2), ("Allow", 1), ("Unknown", 1)]);
		assert_eq!(chart.percentage(&chart.slices[0]), 50.0);
	}

	#[test]
	fn empty_chart() {
		let chart = build_chart_model(&PolicyDocument::default());
		assert!(chart.is_empty());
		assert_eq!(chart.total, 0);
	}
}
