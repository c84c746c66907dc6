//! Events changing how content maps onto the dimension space

use serde::{Deserialize, Serialize};

use super::{node_subject, DomainEvent};
use crate::value_objects::{ContentStreamId, DimensionSpacePoint, DimensionSpacePointSet, NodeAggregateId};

/// Everything visible at `source` became visible at `target` as well
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionShineThroughWasAdded {
    pub content_stream_id: ContentStreamId,
    pub source: DimensionSpacePoint,
    pub target: DimensionSpacePoint,
}

/// Every occurrence of `source` was relabelled as `target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionSpacePointWasMoved {
    pub content_stream_id: ContentStreamId,
    pub source: DimensionSpacePoint,
    pub target: DimensionSpacePoint,
}

/// A root aggregate now covers exactly the given points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootNodeAggregateDimensionsWereUpdated {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub covered_dimension_space_points: DimensionSpacePointSet,
}

impl DomainEvent for DimensionShineThroughWasAdded {
    fn event_type(&self) -> &'static str {
        "DimensionShineThroughWasAdded"
    }

    fn subject(&self) -> String {
        format!("content-stream.{}.dimension-space-point.{}", self.content_stream_id, self.target.hash())
    }
}

impl DomainEvent for DimensionSpacePointWasMoved {
    fn event_type(&self) -> &'static str {
        "DimensionSpacePointWasMoved"
    }

    fn subject(&self) -> String {
        format!("content-stream.{}.dimension-space-point.{}", self.content_stream_id, self.target.hash())
    }
}

impl DomainEvent for RootNodeAggregateDimensionsWereUpdated {
    fn event_type(&self) -> &'static str {
        "RootNodeAggregateDimensionsWereUpdated"
    }

    fn subject(&self) -> String {
        node_subject(&self.content_stream_id, &self.node_aggregate_id)
    }
}
