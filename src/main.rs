use leptos::prelude::*;

fn main() {
	policy_graph_canvas::init_logging();
	mount_to_body(policy_graph_canvas::App)
}
