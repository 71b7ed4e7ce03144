use log::debug;

use super::document::{Effect, PolicyDocument};
use super::truncate;

/// Role of a node in the statement hierarchy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TreeNodeKind {
	/// The policy itself.
	Root,
	/// One statement, labelled with its number and effect.
	Statement,
	/// Groups a statement's actions.
	ActionsGroup,
	/// Groups a statement's resources.
	ResourcesGroup,
	/// A single action leaf.
	Action,
	/// A single resource leaf.
	Resource,
	/// The statement's principal summary.
	Principal,
	/// Marker shown when a statement carries conditions.
	Conditions,
}

/// Kind-specific data kept for tooltips and colouring.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeMeta {
	/// Group nodes carry nothing extra.
	None,
	/// Statement count shown on the root tooltip.
	Root { total: usize },
	/// Source index, effect and sid.
	Statement {
		index: usize,
		effect: Effect,
		sid: Option<String>,
	},
	/// Untruncated value of a leaf whose name may be shortened.
	Value(String),
}

/// A node of the statement hierarchy, owning its children.
#[derive(Clone, Debug, PartialEq)]
pub struct TreeNode {
	/// Label drawn beside the node.
	pub name: String,
	/// Role of the node.
	pub kind: TreeNodeKind,
	/// Children in document order.
	pub children: Vec<TreeNode>,
	/// Initial collapse state for the layout.
	pub collapsed: bool,
	/// Tooltip and colour data.
	pub meta: TreeMeta,
}

impl TreeNode {
	fn new(name: impl Into<String>, kind: TreeNodeKind, meta: TreeMeta) -> Self {
		Self {
			name: name.into(),
			kind,
			children: Vec::new(),
			collapsed: false,
			meta,
		}
	}

	fn leaf(name: impl Into<String>, kind: TreeNodeKind, value: &str) -> Self {
		Self::new(name, kind, TreeMeta::Value(value.to_string()))
	}

	/// True when the node has no children.
	pub fn is_leaf(&self) -> bool {
		self.children.is_empty()
	}

	/// Hover text for the node.
	pub fn tooltip(&self) -> String {
		match (&self.kind, &self.meta) {
			(TreeNodeKind::Root, TreeMeta::Root { total }) => {
				format!("IAM Policy with {total} statements")
			}
			(TreeNodeKind::Statement, TreeMeta::Statement { effect, sid, .. }) => match sid {
				Some(sid) => format!("{effect} statement (ID: {sid})"),
				None => format!("{effect} statement"),
			},
			(TreeNodeKind::Action, TreeMeta::Value(v)) => format!("Action: {v}"),
			(TreeNodeKind::Resource, TreeMeta::Value(v)) => format!("Resource: {v}"),
			(TreeNodeKind::Principal, TreeMeta::Value(v)) => format!("Principal: {v}"),
			(TreeNodeKind::Conditions, _) => "This statement has additional conditions".into(),
			_ => self.name.clone(),
		}
	}
}

/// Rooted hierarchy of a document. `root` is `None` when there is nothing
/// to draw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeModel {
	/// The policy node, absent for an empty document.
	pub root: Option<TreeNode>,
}

impl TreeModel {
	/// True when there is no root.
	pub fn is_empty(&self) -> bool {
		self.root.is_none()
	}
}

/// Project a document into the statement hierarchy.
///
/// Branches at depth two and below start collapsed, so the first render
/// shows the root, its statements and their direct groups.
pub fn build_tree_model(doc: &PolicyDocument) -> TreeModel {
	if doc.is_empty() {
		return TreeModel::default();
	}

	let mut root = TreeNode::new(
		format!("IAM Policy ({} statements)", doc.total_statements),
		TreeNodeKind::Root,
		TreeMeta::Root {
			total: doc.total_statements,
		},
	);

	for statement in &doc.statements {
		let mut node = TreeNode::new(
			format!("Statement {} ({})", statement.index + 1, statement.effect),
			TreeNodeKind::Statement,
			TreeMeta::Statement {
				index: statement.index,
				effect: statement.effect,
				sid: statement.sid.clone(),
			},
		);

		if !statement.actions.is_empty() {
			let mut group = TreeNode::new(
				format!("Actions ({})", statement.actions.len()),
				TreeNodeKind::ActionsGroup,
				TreeMeta::None,
			);
			group.children = statement
				.actions
				.iter()
				.map(|action| TreeNode::leaf(action.clone(), TreeNodeKind::Action, action))
				.collect();
			node.children.push(group);
		}

		if !statement.resources.is_empty() {
			let mut group = TreeNode::new(
				format!("Resources ({})", statement.resources.len()),
				TreeNodeKind::ResourcesGroup,
				TreeMeta::None,
			);
			group.children = statement
				.resources
				.iter()
				.map(|resource| TreeNode::leaf(truncate(resource, 30), TreeNodeKind::Resource, resource))
				.collect();
			node.children.push(group);
		}

		if let Some(principal) = &statement.principal_summary {
			node.children.push(TreeNode::leaf(
				format!("Principal: {}", truncate(principal, 20)),
				TreeNodeKind::Principal,
				principal,
			));
		}

		if statement.has_conditions {
			node.children.push(TreeNode::new(
				"Has Conditions",
				TreeNodeKind::Conditions,
				TreeMeta::None,
			));
		}

		root.children.push(node);
	}

	collapse_below(&mut root, 2);
	debug!("tree model: {} statements", root.children.len());
	TreeModel { root: Some(root) }
}

fn collapse_below(root: &mut TreeNode, min_depth: usize) {
	let mut stack = vec![(root, 0usize)];
	while let Some((node, depth)) = stack.pop() {
		node.collapsed = depth >= min_depth && !node.is_leaf();
		for child in node.children.iter_mut() {
			stack.push((child, depth + 1));
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::policy::Statement;

	fn sample() -> PolicyDocument {
		PolicyDocument::new(vec![
			Statement::new(Effect::Allow)
				.with_sid("Read")
				.with_actions(["s3:GetObject", "s3:ListBucket"])
				.with_resources(["arn:aws:s3:::a-very-long-bucket-name-that-keeps-going/*"])
				.with_principal("arn:aws:iam::123456789012:role/reader")
				.with_conditions(),
			Statement::new(Effect::Deny).with_resources(["*"]),
		])
	}

	#[test]
	fn statements_hang_off_root_in_order() {
		let model = build_tree_model(&sample());
		let root = model.root.unwrap();
		assert_eq!(root.name, "IAM Policy (2 statements)");
		assert_eq!(root.children.len(), 2);
		assert_eq!(root.children[0].name, "Statement 1 (Allow)");
		assert_eq!(root.children[1].name, "Statement 2 (Deny)");
	}

	#[test]
	fn groups_and_markers() {
		let root = build_tree_model(&sample()).root.unwrap();
		let kinds: Vec<_> = root.children[0].children.iter().map(|c| c.kind).collect();
		assert_eq!(
			kinds,
			[
				TreeNodeKind::ActionsGroup,
				TreeNodeKind::ResourcesGroup,
				TreeNodeKind::Principal,
				TreeNodeKind::Conditions
			]
		);
		assert_eq!(root.children[0].children[0].name, "Actions (2)");
		assert_eq!(root.children[0].children[2].name, "Principal: arn:aws:iam::1234567...");

		let resource = &root.children[0].children[1].children[0];
		assert!(resource.name.ends_with("..."));
		assert_eq!(
			resource.tooltip(),
			"Resource: arn:aws:s3:::a-very-long-bucket-name-that-keeps-going/*"
		);
	}

	#[test]
	fn collapsed_only_below_first_level() {
		let root = build_tree_model(&sample()).root.unwrap();
		assert!(!root.collapsed);
		assert!(root.children.iter().all(|s| !s.collapsed));
		let groups = &root.children[0].children;
		assert!(groups[0].collapsed && groups[1].collapsed);
		// leaves have nothing to hide
		assert!(!groups[2].collapsed && !groups[3].collapsed);
	}

	#[test]
	fn tooltips() {
		let root = build_tree_model(&sample()).root.unwrap();
		assert_eq!(root.tooltip(), "IAM Policy with 2 statements");
		assert_eq!(root.children[0].tooltip(), "Allow statement (ID: Read)");
		assert_eq!(root.children[1].tooltip(), "Deny statement");
		assert_eq!(
			root.children[0].children[3].tooltip(),
			"This statement has additional conditions"
		);
	}
}
