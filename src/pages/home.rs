use leptos::prelude::*;
use log::{error, info};

use crate::components::{PolicyGraphCanvas, PolicyTreeCanvas, SummaryChartCanvas};
use crate::error::Result;
use crate::policy::PolicyDocument;

/// Bundled analyzer output used by the demo page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Sample {
	ReadOnly,
	CrossAccount,
}

impl Sample {
	const ALL: [Sample; 2] = [Self::ReadOnly, Self::CrossAccount];

	fn label(&self) -> &'static str {
		match self {
			Self::ReadOnly => "S3 read-only",
			Self::CrossAccount => "Cross-account bucket",
		}
	}

	fn json(&self) -> &'static str {
		match self {
			Self::ReadOnly => include_str!("../../demos/s3_read_only.json"),
			Self::CrossAccount => include_str!("../../demos/cross_account_bucket.json"),
		}
	}

	fn load(&self) -> Result<PolicyDocument> {
		let doc = PolicyDocument::from_json(self.json())?;
		info!("loaded sample `{}`: {} statements", self.label(), doc.total_statements);
		Ok(doc)
	}
}

fn describe(doc: &PolicyDocument) -> String {
	format!(
		"Version {} | {} statements | {} unique actions | {} unique resources | {} principals",
		doc.policy_version.as_deref().unwrap_or("unknown"),
		doc.total_statements,
		doc.unique_actions.len(),
		doc.unique_resources.len(),
		doc.principals.len(),
	)
}

/// Demo page: the three views of one policy, switchable between samples.
#[component]
pub fn Home() -> impl IntoView {
	let (sample, set_sample) = signal(Sample::CrossAccount);

	// a broken sample leaves the views empty; the boundary below reports why
	let document = Signal::derive(move || match sample.get().load() {
		Ok(doc) => doc,
		Err(err) => {
			error!("{err}");
			PolicyDocument::default()
		}
	});

	view! {
		<div class="policy-page">
			<h1>"IAM Policy Visualizer"</h1>
			<div class="sample-switch">
				{Sample::ALL
					.into_iter()
					.map(|s| {
						view! {
							<button
								class="view-button"
								class:active=move || sample.get() == s
								on:click=move |_| set_sample.set(s)
							>
								{s.label()}
							</button>
						}
					})
					.collect_view()}
			</div>

			<ErrorBoundary fallback=|errors| {
				view! {
					<h2>"Could not load the policy summary"</h2>
					<ul>
						{move || {
							errors
								.get()
								.into_iter()
								.map(|(_, e)| view! { <li>{e.to_string()}</li> })
								.collect_view()
						}}
					</ul>
				}
			}>
				<p class="policy-meta">
					{move || sample.get().load().map(|doc| describe(&doc))}
				</p>
			</ErrorBoundary>

			<section class="policy-views">
				<SummaryChartCanvas document=document />
				<PolicyGraphCanvas document=document />
				<PolicyTreeCanvas document=document />
			</section>
		</div>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bundled_samples_parse() {
		for sample in Sample::ALL {
			let doc = sample.load().unwrap();
			assert!(!doc.is_empty(), "{}", sample.label());
			assert_eq!(doc.total_statements, doc.statements.len());
		}
	}

	#[test]
	fn description_counts_summary_sets() {
		let doc = Sample::CrossAccount.load().unwrap();
		assert_eq!(
			describe(&doc),
			"Version 2012-10-17 | 4 statements | 5 unique actions | 2 unique resources | 2 principals"
		);
	}
}
