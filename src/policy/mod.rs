//! Policy summaries and the pure projections drawn from them.
//!
//! Every builder takes the analyzer's [`PolicyDocument`] and returns a fresh
//! model; nothing here renders or holds layout state.

mod chart;
mod document;
mod graph;
mod tree;

pub use chart::{ChartModel, ChartSlice, build_chart_model};
pub use document::{Effect, PolicyDocument, Statement};
pub use graph::{
	EdgeKind, GraphEdge, GraphModel, GraphNode, KindFilter, NodeKind, NodePayload, build_graph_model,
};
pub use tree::{TreeMeta, TreeModel, TreeNode, TreeNodeKind, build_tree_model};

/// Shorten `text` to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
	match text.char_indices().nth(max) {
		Some((cut, _)) => format!("{}...", &text[..cut]),
		None => text.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::truncate;

	#[test]
	fn truncate_counts_chars() {
		assert_eq!(truncate("s3:GetObject", 15), "s3:GetObject");
		assert_eq!(truncate("arn:aws:s3:::bucket/key", 10), "arn:aws:s3...");
		assert_eq!(truncate("ééééé", 2), "éé...");
	}
}
