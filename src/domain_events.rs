//! Domain events enum for the content repository

use crate::events::*;
use crate::value_objects::ContentStreamId;
use serde::{Deserialize, Serialize};

/// Enum wrapper for content repository events
///
/// Serialized adjacently tagged as `{"type": ..., "payload": ...}`, which is
/// also the shape of an exported event line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ContentRepositoryEvent {
    RootWorkspaceWasCreated(RootWorkspaceWasCreated),
    WorkspaceWasCreated(WorkspaceWasCreated),
    WorkspaceWasDiscarded(WorkspaceWasDiscarded),
    ContentStreamWasCreated(ContentStreamWasCreated),
    ContentStreamWasForked(ContentStreamWasForked),
    ContentStreamWasRemoved(ContentStreamWasRemoved),
    RootNodeAggregateWithNodeWasCreated(RootNodeAggregateWithNodeWasCreated),
    NodeAggregateWithNodeWasCreated(NodeAggregateWithNodeWasCreated),
    NodeVariantWasCreated(NodeVariantWasCreated),
    NodePropertiesWereSet(NodePropertiesWereSet),
    NodeAggregateTypeWasChanged(NodeAggregateTypeWasChanged),
    NodeAggregateNameWasChanged(NodeAggregateNameWasChanged),
    NodeAggregateWasMoved(NodeAggregateWasMoved),
    NodeAggregateWasRemoved(NodeAggregateWasRemoved),
    DimensionShineThroughWasAdded(DimensionShineThroughWasAdded),
    DimensionSpacePointWasMoved(DimensionSpacePointWasMoved),
    RootNodeAggregateDimensionsWereUpdated(RootNodeAggregateDimensionsWereUpdated),
}

macro_rules! for_each_event {
    ($self:ident, $event:ident => $body:expr) => {
        match $self {
            Self::RootWorkspaceWasCreated($event) => $body,
            Self::WorkspaceWasCreated($event) => $body,
            Self::WorkspaceWasDiscarded($event) => $body,
            Self::ContentStreamWasCreated($event) => $body,
            Self::ContentStreamWasForked($event) => $body,
            Self::ContentStreamWasRemoved($event) => $body,
            Self::RootNodeAggregateWithNodeWasCreated($event) => $body,
            Self::NodeAggregateWithNodeWasCreated($event) => $body,
            Self::NodeVariantWasCreated($event) => $body,
            Self::NodePropertiesWereSet($event) => $body,
            Self::NodeAggregateTypeWasChanged($event) => $body,
            Self::NodeAggregateNameWasChanged($event) => $body,
            Self::NodeAggregateWasMoved($event) => $body,
            Self::NodeAggregateWasRemoved($event) => $body,
            Self::DimensionShineThroughWasAdded($event) => $body,
            Self::DimensionSpacePointWasMoved($event) => $body,
            Self::RootNodeAggregateDimensionsWereUpdated($event) => $body,
        }
    };
}

impl DomainEvent for ContentRepositoryEvent {
    fn event_type(&self) -> &'static str {
        for_each_event!(self, e => e.event_type())
    }

    fn subject(&self) -> String {
        for_each_event!(self, e => e.subject())
    }
}

impl ContentRepositoryEvent {
    /// The content stream a graph event applies to; `None` for lifecycle events
    pub fn content_stream_id(&self) -> Option<&ContentStreamId> {
        match self {
            Self::RootNodeAggregateWithNodeWasCreated(e) => Some(&e.content_stream_id),
            Self::NodeAggregateWithNodeWasCreated(e) => Some(&e.content_stream_id),
            Self::NodeVariantWasCreated(e) => Some(&e.content_stream_id),
            Self::NodePropertiesWereSet(e) => Some(&e.content_stream_id),
            Self::NodeAggregateTypeWasChanged(e) => Some(&e.content_stream_id),
            Self::NodeAggregateNameWasChanged(e) => Some(&e.content_stream_id),
            Self::NodeAggregateWasMoved(e) => Some(&e.content_stream_id),
            Self::NodeAggregateWasRemoved(e) => Some(&e.content_stream_id),
            Self::DimensionShineThroughWasAdded(e) => Some(&e.content_stream_id),
            Self::DimensionSpacePointWasMoved(e) => Some(&e.content_stream_id),
            Self::RootNodeAggregateDimensionsWereUpdated(e) => Some(&e.content_stream_id),
            _ => None,
        }
    }

    /// True for events that change the graph of a content stream
    pub fn is_graph_event(&self) -> bool {
        self.content_stream_id().is_some()
    }

    /// Rewrite the content stream of a graph event; lifecycle events are returned as they are
    pub fn with_content_stream_id(mut self, content_stream_id: &ContentStreamId) -> Self {
        let target = match &mut self {
            Self::RootNodeAggregateWithNodeWasCreated(e) => Some(&mut e.content_stream_id),
            Self::NodeAggregateWithNodeWasCreated(e) => Some(&mut e.content_stream_id),
            Self::NodeVariantWasCreated(e) => Some(&mut e.content_stream_id),
            Self::NodePropertiesWereSet(e) => Some(&mut e.content_stream_id),
            Self::NodeAggregateTypeWasChanged(e) => Some(&mut e.content_stream_id),
            Self::NodeAggregateNameWasChanged(e) => Some(&mut e.content_stream_id),
            Self::NodeAggregateWasMoved(e) => Some(&mut e.content_stream_id),
            Self::NodeAggregateWasRemoved(e) => Some(&mut e.content_stream_id),
            Self::DimensionShineThroughWasAdded(e) => Some(&mut e.content_stream_id),
            Self::DimensionSpacePointWasMoved(e) => Some(&mut e.content_stream_id),
            Self::RootNodeAggregateDimensionsWereUpdated(e) => Some(&mut e.content_stream_id),
            _ => None,
        };
        if let Some(target) = target {
            *target = content_stream_id.clone();
        }
        self
    }
}
