//! Content repository projections
//!
//! Projections fold the global event order into read models. They are
//! plain in-memory folds, so applying an event is synchronous.

pub mod content_graph;
pub mod workspace;

pub use content_graph::*;
pub use workspace::*;

use crate::infrastructure::EventEnvelope;
use crate::value_objects::{ContentStreamId, NodeAggregateId, OriginDimensionSpacePoint, WorkspaceName};

/// Errors raised while applying events to a read model
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProjectionError {
    #[error("Unknown content stream \"{0}\"")]
    UnknownContentStream(ContentStreamId),

    #[error("Unknown workspace \"{0}\"")]
    UnknownWorkspace(WorkspaceName),

    #[error("Unknown node aggregate \"{node_aggregate_id}\" in content stream \"{content_stream_id}\"")]
    UnknownNodeAggregate {
        content_stream_id: ContentStreamId,
        node_aggregate_id: NodeAggregateId,
    },

    #[error("Node aggregate \"{node_aggregate_id}\" has no variant at {origin}")]
    UnknownNode {
        node_aggregate_id: NodeAggregateId,
        origin: OriginDimensionSpacePoint,
    },
}

pub type ProjectionResult<T> = Result<T, ProjectionError>;

/// A read model built from the event stream
pub trait Projection: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Incorporate one event
    fn apply(&mut self, envelope: &EventEnvelope) -> ProjectionResult<()>;
}

/// All read models of one content repository plus the position they reflect
#[derive(Debug, Clone, Default)]
pub struct ContentRepositoryProjections {
    pub workspaces: WorkspaceProjection,
    pub content_graph: ContentGraphProjection,
    /// Sequence number of the last applied event
    pub checkpoint: u64,
}

impl ContentRepositoryProjections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply events in order; on failure nothing is applied
    ///
    /// Works on a copy that replaces `self` only once every event went
    /// through. Content stream graphs are shared between the copies until
    /// an event touches them.
    pub fn apply_all(&mut self, envelopes: &[EventEnvelope]) -> ProjectionResult<()> {
        let mut next = self.clone();
        for envelope in envelopes {
            next.apply_one(envelope)?;
        }
        *self = next;
        Ok(())
    }

    fn apply_one(&mut self, envelope: &EventEnvelope) -> ProjectionResult<()> {
        if envelope.sequence_number <= self.checkpoint {
            return Ok(());
        }
        self.workspaces.apply(envelope)?;
        self.content_graph.apply(envelope)?;
        self.checkpoint = envelope.sequence_number;
        Ok(())
    }
}
