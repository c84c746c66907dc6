//! Content repository domain events
//!
//! Events are the only source of truth. Workspace lifecycle events live in
//! the `workspaces` stream, everything else in the stream of the content
//! stream it concerns.

mod dimension_events;
mod node_events;
mod workspace_events;

pub use dimension_events::*;
pub use node_events::*;
pub use workspace_events::*;

/// Common behaviour of every event payload
pub trait DomainEvent {
    /// Stable type name used in stored and exported events
    fn event_type(&self) -> &'static str;

    /// Human readable subject, e.g. `content-stream.<id>.node-aggregate.<id>`
    fn subject(&self) -> String;
}

pub(crate) fn node_subject(
    content_stream_id: &crate::value_objects::ContentStreamId,
    node_aggregate_id: &crate::value_objects::NodeAggregateId,
) -> String {
    format!("content-stream.{content_stream_id}.node-aggregate.{node_aggregate_id}")
}
