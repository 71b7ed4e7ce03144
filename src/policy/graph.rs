use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;

use super::document::{Effect, PolicyDocument};
use crate::error::Error;

/// What a graph node stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
	/// One per policy statement.
	Statement,
	/// A distinct action name.
	Action,
	/// A distinct resource ARN or pattern.
	Resource,
	/// A distinct principal summary.
	Principal,
}

impl NodeKind {
	/// Legend order.
	pub const ALL: [NodeKind; 4] = [Self::Statement, Self::Action, Self::Resource, Self::Principal];

	/// Drawn and collision radius.
	pub fn radius(&self) -> f64 {
		match self {
			Self::Statement => 12.0,
			Self::Resource => 10.0,
			Self::Principal => 9.0,
			Self::Action => 8.0,
		}
	}

	/// Lowercase name used in ids and filter values.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Statement => "statement",
			Self::Action => "action",
			Self::Resource => "resource",
			Self::Principal => "principal",
		}
	}

	/// Plural legend label.
	pub fn label(&self) -> &'static str {
		match self {
			Self::Statement => "Statements",
			Self::Action => "Actions",
			Self::Resource => "Resources",
			Self::Principal => "Principals",
		}
	}
}

/// Relationship carried by an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeKind {
	/// Statement → Action.
	Allows,
	/// Statement → Resource.
	Affects,
	/// Principal → Statement.
	Has,
}

/// Kind-specific data kept on a node for tooltips.
#[derive(Clone, Debug, PartialEq)]
pub enum NodePayload {
	/// Source index, effect and sid of a statement node.
	Statement {
		index: usize,
		effect: Effect,
		sid: Option<String>,
	},
	/// Full action name.
	Action(String),
	/// Full resource string.
	Resource(String),
	/// Full principal summary.
	Principal(String),
}

/// A node of the policy graph.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// Content-addressed: equal content always yields the same id.
	pub id: String,
	/// What the node stands for.
	pub kind: NodeKind,
	/// Short text drawn next to the node.
	pub label: String,
	/// Tooltip data.
	pub payload: NodePayload,
}

impl GraphNode {
	/// Hover text for the node.
	pub fn tooltip(&self) -> String {
		match &self.payload {
			NodePayload::Statement { effect, sid, .. } => match sid {
				Some(sid) => format!("Statement: {effect} ({sid})"),
				None => format!("Statement: {effect}"),
			},
			NodePayload::Action(name) => format!("Action: {name}"),
			NodePayload::Resource(arn) => format!("Resource: {arn}"),
			NodePayload::Principal(summary) => format!("Principal: {summary}"),
		}
	}
}

/// A directed, weighted edge between two nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	/// Index of the source node in [`GraphModel::nodes`].
	pub source: usize,
	/// Index of the target node.
	pub target: usize,
	/// Relationship the edge carries.
	pub kind: EdgeKind,
	/// How many statement entries produced this edge.
	pub weight: u32,
}

/// Nodes in first-seen order plus the edges between them.
#[derive(Clone, Debug, Default)]
pub struct GraphModel {
	/// Unique nodes, first-seen order.
	pub nodes: Vec<GraphNode>,
	/// Merged edges; duplicates bump the weight.
	pub edges: Vec<GraphEdge>,
	by_id: HashMap<String, usize>,
}

impl GraphModel {
	/// True when the document had no statements.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}

	/// Look a node up by id.
	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.index_of(id).map(|idx| &self.nodes[idx])
	}

	/// Position of a node in `nodes`.
	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.by_id.get(id).copied()
	}

	/// Number of nodes of one kind.
	pub fn count(&self, kind: NodeKind) -> usize {
		self.nodes.iter().filter(|n| n.kind == kind).count()
	}

	fn add_node(&mut self, id: String, kind: NodeKind, label: String, payload: NodePayload) -> usize {
		if let Some(&idx) = self.by_id.get(&id) {
			return idx;
		}
		let idx = self.nodes.len();
		self.by_id.insert(id.clone(), idx);
		self.nodes.push(GraphNode {
			id,
			kind,
			label,
			payload,
		});
		idx
	}

	fn add_edge(&mut self, source: usize, target: usize, kind: EdgeKind) {
		// a statement listing the same action twice thickens one edge
		if let Some(edge) = self
			.edges
			.iter_mut()
			.rev()
			.find(|e| e.source == source && e.target == target && e.kind == kind)
		{
			edge.weight += 1;
			return;
		}
		self.edges.push(GraphEdge {
			source,
			target,
			kind,
			weight: 1,
		});
	}
}

/// Project a document into its relationship graph.
pub fn build_graph_model(doc: &PolicyDocument) -> GraphModel {
	let mut model = GraphModel::default();

	for statement in &doc.statements {
		let stmt = model.add_node(
			format!("stmt-{}", statement.index),
			NodeKind::Statement,
			format!("Statement {}", statement.index + 1),
			NodePayload::Statement {
				index: statement.index,
				effect: statement.effect,
				sid: statement.sid.clone(),
			},
		);

		for action in &statement.actions {
			let node = model.add_node(
				format!("action-{action}"),
				NodeKind::Action,
				action.clone(),
				NodePayload::Action(action.clone()),
			);
			model.add_edge(stmt, node, EdgeKind::Allows);
		}

		for resource in &statement.resources {
			let node = model.add_node(
				format!("resource-{resource}"),
				NodeKind::Resource,
				resource.clone(),
				NodePayload::Resource(resource.clone()),
			);
			model.add_edge(stmt, node, EdgeKind::Affects);
		}

		if let Some(principal) = &statement.principal_summary {
			let node = model.add_node(
				format!("principal-{principal}"),
				NodeKind::Principal,
				principal.clone(),
				NodePayload::Principal(principal.clone()),
			);
			model.add_edge(node, stmt, EdgeKind::Has);
		}
	}

	debug!(
		"graph model: {} nodes, {} edges",
		model.nodes.len(),
		model.edges.len()
	);
	model
}

/// Node-kind filter of the graph view. Applied as an opacity mask, never by
/// removing nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KindFilter {
	/// Show every kind at full opacity.
	#[default]
	All,
	/// Keep one kind bright and dim the rest.
	Only(NodeKind),
}

impl KindFilter {
	/// Opacity of a node the filter excludes.
	pub const DIM_NODE: f64 = 0.2;
	/// Opacity of a visible edge.
	pub const EDGE: f64 = 0.8;
	/// Opacity of an edge whose ends are both excluded.
	pub const DIM_EDGE: f64 = 0.1;

	/// Whether nodes of `kind` pass the filter.
	pub fn matches(&self, kind: NodeKind) -> bool {
		match self {
			Self::All => true,
			Self::Only(only) => *only == kind,
		}
	}

	/// Draw opacity of a node of `kind`.
	pub fn node_opacity(&self, kind: NodeKind) -> f64 {
		if self.matches(kind) { 1.0 } else { Self::DIM_NODE }
	}

	/// An edge stays visible when either endpoint passes the filter.
	pub fn edge_opacity(&self, source: NodeKind, target: NodeKind) -> f64 {
		if self.matches(source) || self.matches(target) {
			Self::EDGE
		} else {
			Self::DIM_EDGE
		}
	}
}

impl FromStr for KindFilter {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s == "all" {
			return Ok(Self::All);
		}
		NodeKind::ALL
			.into_iter()
			.find(|kind| kind.as_str() == s)
			.map(Self::Only)
			.ok_or_else(|| Error::UnknownFilter(s.to_string()))
	}
}

impl fmt::Display for KindFilter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::All => f.write_str("all"),
			Self::Only(kind) => f.write_str(kind.as_str()),
		}
	}
}
