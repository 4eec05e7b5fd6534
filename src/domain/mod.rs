pub mod graph;
pub mod node;

pub use graph::*;
pub use node::*;
