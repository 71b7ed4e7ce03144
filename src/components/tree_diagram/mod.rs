//! Collapsible statement hierarchy: the layout engine and its canvas view.

mod component;
pub mod layout;
mod state;

pub use component::PolicyTreeCanvas;
pub use layout::{ArenaNode, DrawnNode, NodeId, TreeLayout};
