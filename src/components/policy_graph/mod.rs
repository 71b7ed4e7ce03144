mod component;
mod forces;
mod highlight;
mod simulation;
mod state;

pub use component::PolicyGraphCanvas;
