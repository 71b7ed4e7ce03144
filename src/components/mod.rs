//! Canvas views of a policy and the plumbing they share.

mod canvas;
mod policy_graph;
mod render;
mod scene;
mod summary_chart;
mod transition;
pub mod tree_diagram;
pub mod viewport;

pub use policy_graph::PolicyGraphCanvas;
pub use scene::Point;
pub use summary_chart::SummaryChartCanvas;
pub use tree_diagram::PolicyTreeCanvas;
