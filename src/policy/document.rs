use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer};

use crate::error::Result;

/// Outcome of a statement as classified by the analyzer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Effect {
	/// Grants the listed actions.
	Allow,
	/// Refuses the listed actions.
	Deny,
	/// Absent or unrecognized effect. Still counted and rendered.
	#[default]
	Unknown,
}

impl Effect {
	/// Classify a raw effect string. Anything but `Allow`/`Deny` is `Unknown`.
	pub fn parse(raw: Option<&str>) -> Self {
		match raw.map(str::trim) {
			Some("Allow") => Self::Allow,
			Some("Deny") => Self::Deny,
			_ => Self::Unknown,
		}
	}

	/// Display name, also used as the chart slice label.
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Allow => "Allow",
			Self::Deny => "Deny",
			Self::Unknown => "Unknown",
		}
	}
}

impl fmt::Display for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl<'de> Deserialize<'de> for Effect {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		// numbers, arrays and the like are unrecognized, not malformed
		let raw = serde_json::Value::deserialize(deserializer)?;
		Ok(Self::parse(raw.as_str()))
	}
}

/// One permission rule, already flattened by the analyzer.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statement {
	/// Position in the source policy. Assigned on load, never read from input.
	#[serde(skip)]
	pub index: usize,
	/// Allow, Deny or Unknown.
	#[serde(default)]
	pub effect: Effect,
	/// Optional statement id from the policy.
	#[serde(default)]
	pub sid: Option<String>,
	/// Actions in policy order, duplicates kept.
	#[serde(default, deserialize_with = "null_as_default")]
	pub actions: Vec<String>,
	/// Resource ARNs or patterns in policy order.
	#[serde(default, deserialize_with = "null_as_default")]
	pub resources: Vec<String>,
	/// One-line principal description, when the statement names one.
	#[serde(default)]
	pub principal_summary: Option<String>,
	/// Whether a `Condition` block is attached.
	#[serde(default, deserialize_with = "null_as_default")]
	pub has_conditions: bool,
}

/// Analyzer output for one policy. Immutable once loaded.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
	/// Statements in source order.
	#[serde(default, deserialize_with = "null_as_default")]
	pub statements: Vec<Statement>,
	/// Statement count. Always equals `statements.len()` after loading.
	#[serde(default)]
	pub total_statements: usize,
	/// Distinct actions across all statements.
	#[serde(default, deserialize_with = "null_as_default")]
	pub unique_actions: BTreeSet<String>,
	/// Distinct resources across all statements.
	#[serde(default, deserialize_with = "null_as_default")]
	pub unique_resources: BTreeSet<String>,
	/// Distinct principal summaries.
	#[serde(default, deserialize_with = "null_as_default")]
	pub principals: BTreeSet<String>,
	/// The policy's `Version` field.
	#[serde(default)]
	pub policy_version: Option<String>,
}

impl PolicyDocument {
	/// Build a document from statements, deriving the summary sets the
	/// analyzer would normally provide.
	pub fn new(statements: Vec<Statement>) -> Self {
		let mut doc = Self {
			statements,
			..Self::default()
		};
		for statement in &doc.statements {
			doc.unique_actions.extend(statement.actions.iter().cloned());
			doc.unique_resources.extend(statement.resources.iter().cloned());
			if let Some(principal) = &statement.principal_summary {
				doc.principals.insert(principal.clone());
			}
		}
		doc.normalize();
		doc
	}

	/// Parse the analyzer's JSON summary.
	pub fn from_json(json: &str) -> Result<Self> {
		let mut doc: Self = serde_json::from_str(json)?;
		doc.normalize();
		Ok(doc)
	}

	/// Set the policy version.
	pub fn with_version(mut self, version: impl Into<String>) -> Self {
		self.policy_version = Some(version.into());
		self
	}

	/// True when there is nothing to draw.
	pub fn is_empty(&self) -> bool {
		self.statements.is_empty()
	}

	fn normalize(&mut self) {
		for (index, statement) in self.statements.iter_mut().enumerate() {
			statement.index = index;
		}
		// the total is what percentages divide by; it must match what we draw
		self.total_statements = self.statements.len();
	}
}

impl Statement {
	/// Empty statement with the given effect.
	pub fn new(effect: Effect) -> Self {
		Self {
			effect,
			..Self::default()
		}
	}

	/// Set the statement id.
	pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
		self.sid = Some(sid.into());
		self
	}

	/// Replace the action list.
	pub fn with_actions<I, S>(mut self, actions: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.actions = actions.into_iter().map(Into::into).collect();
		self
	}

	/// Replace the resource list.
	pub fn with_resources<I, S>(mut self, resources: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.resources = resources.into_iter().map(Into::into).collect();
		self
	}

	/// Set the principal summary.
	pub fn with_principal(mut self, principal: impl Into<String>) -> Self {
		self.principal_summary = Some(principal.into());
		self
	}

	/// Mark the statement as conditional.
	pub fn with_conditions(mut self) -> Self {
		self.has_conditions = true;
		self
	}
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_analyzer_summary() {
		let doc = PolicyDocument::from_json(
			r#"{
				"policyVersion": "2012-10-17",
				"totalStatements": 2,
				"uniqueActions": ["s3:GetObject"],
				"uniqueResources": ["arn:aws:s3:::b"],
				"principals": [],
				"statements": [
					{"sid": "Read", "effect": "Allow", "actions": ["s3:GetObject"],
					 "resources": ["arn:aws:s3:::b"], "principalSummary": null, "hasConditions": false},
					{"effect": "Deny", "actions": null, "resources": ["arn:aws:s3:::b"], "hasConditions": true}
				]
			}"#,
		)
		.unwrap();

		assert_eq!(doc.policy_version.as_deref(), Some("2012-10-17"));
		assert_eq!(doc.total_statements, 2);
		assert_eq!(doc.statements[0].sid.as_deref(), Some("Read"));
		assert_eq!(doc.statements[1].index, 1);
		assert_eq!(doc.statements[1].effect, Effect::Deny);
		assert!(doc.statements[1].actions.is_empty());
		assert!(doc.statements[1].has_conditions);
	}

	#[test]
	fn missing_or_odd_effect_is_unknown() {
		let doc = PolicyDocument::from_json(
			r#"{"statements": [{"actions": ["a"]}, {"effect": "Maybe"}, {"effect": null}]}"#,
		)
		.unwrap();
		assert!(doc.statements.iter().all(|s| s.effect == Effect::Unknown));
		assert_eq!(doc.total_statements, 3);
	}

	#[test]
	fn non_string_effect_is_unknown() {
		let doc = PolicyDocument::from_json(
			r#"{"statements": [{"effect": 3}, {"effect": ["Allow"]}, {"effect": {"v": "Deny"}}, {"effect": "Deny"}]}"#,
		)
		.unwrap();
		let effects: Vec<Effect> = doc.statements.iter().map(|s| s.effect).collect();
		assert_eq!(effects, [Effect::Unknown, Effect::Unknown, Effect::Unknown, Effect::Deny]);
	}

	#[test]
	fn absent_statements_is_empty() {
		let doc = PolicyDocument::from_json(r#"{"totalStatements": 4}"#).unwrap();
		assert!(doc.is_empty());
		assert_eq!(doc.total_statements, 0);
	}

	#[test]
	fn rejects_malformed_json() {
		assert!(PolicyDocument::from_json("{statements").is_err());
	}

	#[test]
	fn new_derives_summary_sets() {
		let doc = PolicyDocument::new(vec![
			Statement::new(Effect::Allow)
				.with_actions(["s3:GetObject", "s3:PutObject"])
				.with_principal("*"),
			Statement::new(Effect::Deny).with_actions(["s3:GetObject"]),
		]);
		assert_eq!(doc.unique_actions.len(), 2);
		assert_eq!(doc.principals.len(), 1);
		assert_eq!(doc.statements[1].index, 1);
	}
}
