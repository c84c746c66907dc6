//! Content graph queries
//!
//! Queries provide read-only access to the content graph. They operate on
//! immutable snapshots of the projection, so a query never observes a
//! half-applied event.

mod content_graph;
mod content_subgraph;

pub use content_graph::ContentGraph;
pub use content_subgraph::ContentSubgraph;
