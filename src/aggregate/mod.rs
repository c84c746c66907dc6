//! Content graph read-side aggregates

pub mod node;
pub mod node_aggregate;

pub use node::*;
pub use node_aggregate::*;
