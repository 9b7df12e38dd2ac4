//! Document builders for the linear action list and the canvas graph

pub mod graph;
pub mod linear;

pub use graph::{Connection, GraphBuilder, NodeDataPatch};
pub use linear::ActionListBuilder;
