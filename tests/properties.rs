//! Property-based checks of the projections and the viewport over generated
//! analyzer payloads, including empty, duplicated and missing fields.

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::{Map, Value, json};

use policy_graph_canvas::components::Point;
use policy_graph_canvas::components::tree_diagram::TreeLayout;
use policy_graph_canvas::components::viewport::{
	Bounds, KeyBindings, ScaleExtent, Viewport, ViewportTransform,
};
use policy_graph_canvas::config::{TreeConfig, ViewportConfig};
use policy_graph_canvas::policy::{
	NodeKind, PolicyDocument, TreeNodeKind, build_chart_model, build_graph_model, build_tree_model,
};

const ACTIONS: &[&str] = &["s3:GetObject", "s3:PutObject", "s3:*", "iam:PassRole", "ec2:*"];
const RESOURCES: &[&str] = &["*", "arn:aws:s3:::logs", "arn:aws:s3:::logs/*", "arn:aws:iam::1:role/x"];
const PRINCIPALS: &[&str] = &["*", "arn:aws:iam::111122223333:root", "ec2.amazonaws.com"];

/// Missing, `null`, or a list drawn with repetition from `pool`.
fn list_field(pool: &'static [&'static str]) -> impl Strategy<Value = Option<Value>> {
	prop_oneof![
		Just(None),
		Just(Some(Value::Null)),
		prop::collection::vec(prop::sample::select(pool), 0..5).prop_map(|v| Some(json!(v))),
	]
}

fn effect_field() -> impl Strategy<Value = Option<Value>> {
	prop_oneof![
		Just(None),
		Just(Some(json!("Allow"))),
		Just(Some(json!("Deny"))),
		Just(Some(json!("Maybe"))),
		Just(Some(Value::Null)),
		(0i64..10).prop_map(|n| Some(json!(n))),
	]
}

fn statement_json() -> impl Strategy<Value = Value> {
	(
		effect_field(),
		list_field(ACTIONS),
		list_field(RESOURCES),
		prop::option::of(prop::sample::select(PRINCIPALS)),
		prop::option::of(any::<bool>()),
		prop::option::of("[A-Za-z]{1,8}"),
	)
		.prop_map(|(effect, actions, resources, principal, conditions, sid)| {
			let mut statement = Map::new();
			if let Some(effect) = effect {
				statement.insert("effect".into(), effect);
			}
			if let Some(actions) = actions {
				statement.insert("actions".into(), actions);
			}
			if let Some(resources) = resources {
				statement.insert("resources".into(), resources);
			}
			if let Some(principal) = principal {
				statement.insert("principalSummary".into(), json!(principal));
			}
			if let Some(conditions) = conditions {
				statement.insert("hasConditions".into(), json!(conditions));
			}
			if let Some(sid) = sid {
				statement.insert("sid".into(), json!(sid));
			}
			Value::Object(statement)
		})
}

/// Analyzer payload whose `totalStatements` is arbitrary and whose
/// `statements` may be absent.
fn document_json() -> impl Strategy<Value = String> {
	(prop::collection::vec(statement_json(), 0..8), any::<bool>(), 0usize..20).prop_map(
		|(statements, omit_empty, total)| {
			let mut doc = json!({ "policyVersion": "2012-10-17", "totalStatements": total });
			if !(omit_empty && statements.is_empty()) {
				doc["statements"] = Value::Array(statements);
			}
			doc.to_string()
		},
	)
}

fn document(json: &str) -> PolicyDocument {
	PolicyDocument::from_json(json).unwrap()
}

#[derive(Clone, Debug)]
enum ZoomOp {
	By(f64),
	At(f64, Point),
	Fit(Bounds),
	Set(f64),
	Reset,
	Tick(f64),
}

fn zoom_op() -> impl Strategy<Value = ZoomOp> {
	prop_oneof![
		(0.01f64..100.0).prop_map(ZoomOp::By),
		(0.01f64..100.0, 0.0f64..800.0, 0.0f64..400.0)
			.prop_map(|(factor, x, y)| ZoomOp::At(factor, Point::new(x, y))),
		(-1e3f64..1e3, -1e3f64..1e3, 0.0f64..500.0, 0.0f64..500.0).prop_map(|(x, y, w, h)| {
			ZoomOp::Fit(Bounds {
				min: Point::new(x, y),
				max: Point::new(x + w, y + h),
			})
		}),
		(-10.0f64..1e3).prop_map(ZoomOp::Set),
		Just(ZoomOp::Reset),
		(0.0f64..600.0).prop_map(ZoomOp::Tick),
	]
}

proptest! {
	#![proptest_config(ProptestConfig::with_cases(256))]

	#[test]
	fn graph_ids_are_content_addressed(json in document_json()) {
		let doc = document(&json);
		let graph = build_graph_model(&doc);

		let ids: HashSet<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
		prop_assert_eq!(ids.len(), graph.nodes.len());
		for edge in &graph.edges {
			prop_assert!(edge.source < graph.nodes.len() && edge.target < graph.nodes.len());
			prop_assert!(edge.weight >= 1);
		}

		let actions: HashSet<&String> = doc.statements.iter().flat_map(|s| &s.actions).collect();
		let resources: HashSet<&String> = doc.statements.iter().flat_map(|s| &s.resources).collect();
		prop_assert_eq!(graph.count(NodeKind::Statement), doc.statements.len());
		prop_assert_eq!(graph.count(NodeKind::Action), actions.len());
		prop_assert_eq!(graph.count(NodeKind::Resource), resources.len());
	}

	#[test]
	fn chart_counts_sum_to_total(json in document_json()) {
		let doc = document(&json);
		let chart = build_chart_model(&doc);
		let sum: usize = chart.slices.iter().map(|s| s.count).sum();
		prop_assert_eq!(sum, doc.total_statements);
		prop_assert_eq!(doc.total_statements, doc.statements.len());
		prop_assert_eq!(chart.is_empty(), doc.is_empty());
	}

	#[test]
	fn tree_root_has_one_child_per_statement(json in document_json()) {
		let doc = document(&json);
		let tree = build_tree_model(&doc);
		let Some(root) = tree.root else {
			prop_assert!(doc.is_empty());
			return Ok(());
		};
		prop_assert_eq!(root.children.len(), doc.statements.len());
		for (i, (child, statement)) in root.children.iter().zip(&doc.statements).enumerate() {
			prop_assert_eq!(&child.name, &format!("Statement {} ({})", i + 1, statement.effect));
			let has_actions = child.children.iter().any(|c| c.kind == TreeNodeKind::ActionsGroup);
			prop_assert_eq!(has_actions, !statement.actions.is_empty());
			let has_resources = child.children.iter().any(|c| c.kind == TreeNodeKind::ResourcesGroup);
			prop_assert_eq!(has_resources, !statement.resources.is_empty());
		}
	}

	#[test]
	fn collapse_then_expand_restores_visible_nodes(
		json in document_json(),
		expanded in any::<bool>(),
		pick in any::<prop::sample::Index>(),
	) {
		let doc = document(&json);
		let mut layout = TreeLayout::new(&build_tree_model(&doc), 500.0, &TreeConfig::default());
		if expanded {
			layout.expand_all();
		}
		let branches: Vec<usize> = layout
			.visible_nodes()
			.into_iter()
			.filter(|&id| !layout.children(id).is_empty())
			.collect();
		prop_assume!(!branches.is_empty());
		let id = branches[pick.index(branches.len())];

		let visible = layout.visible_nodes();
		let children: Vec<Vec<usize>> = (0..layout.len()).map(|n| layout.children(n).to_vec()).collect();
		prop_assert!(layout.toggle(id));
		prop_assert!(layout.toggle(id));
		prop_assert_eq!(layout.visible_nodes(), visible);
		for (n, before) in children.iter().enumerate() {
			prop_assert_eq!(layout.children(n), before.as_slice());
		}
	}

	#[test]
	fn zoom_stays_inside_extent(
		a in 0.05f64..10.0,
		b in 0.05f64..10.0,
		ops in prop::collection::vec(zoom_op(), 1..24),
	) {
		let mut viewport = Viewport::new(
			800.0,
			400.0,
			ScaleExtent::new(a, b),
			KeyBindings::GRAPH,
			ViewportConfig::default(),
		);
		let extent = viewport.extent();
		prop_assert!(extent.min <= extent.max);

		for op in ops {
			match op {
				ZoomOp::By(factor) => viewport.zoom_by(factor),
				ZoomOp::At(factor, anchor) => viewport.zoom_at(factor, anchor),
				ZoomOp::Fit(bounds) => {
					viewport.fit_to_content(bounds);
				}
				ZoomOp::Set(k) => viewport.set_transform(ViewportTransform { k, ..ViewportTransform::IDENTITY }),
				ZoomOp::Reset => viewport.reset_zoom(),
				ZoomOp::Tick(dt) => {
					viewport.tick(dt);
				}
			}
			let k = viewport.transform().k;
			prop_assert!(k >= extent.min - 1e-9 && k <= extent.max + 1e-9, "k {} outside {:?}", k, extent);
		}
	}
}
