//! Node aggregate events

use serde::{Deserialize, Serialize};

use super::{node_subject, DomainEvent};
use crate::value_objects::{
    ContentStreamId, DimensionSpacePointSet, NodeAggregateClassification, NodeAggregateId, NodeName,
    NodeTypeName, OriginDimensionSpacePoint, SerializedPropertyValues,
};

/// A root node aggregate was created, covering the given points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootNodeAggregateWithNodeWasCreated {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub node_type_name: NodeTypeName,
    pub covered_dimension_space_points: DimensionSpacePointSet,
    pub node_aggregate_classification: NodeAggregateClassification,
}

/// A regular node aggregate was created with its first variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAggregateWithNodeWasCreated {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub node_type_name: NodeTypeName,
    pub origin_dimension_space_point: OriginDimensionSpacePoint,
    pub covered_dimension_space_points: DimensionSpacePointSet,
    pub parent_node_aggregate_id: NodeAggregateId,
    pub node_name: Option<NodeName>,
    pub initial_property_values: SerializedPropertyValues,
    pub node_aggregate_classification: NodeAggregateClassification,
}

/// A further variant of an existing aggregate was created from a source variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeVariantWasCreated {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub source_origin: OriginDimensionSpacePoint,
    pub target_origin: OriginDimensionSpacePoint,
    /// Points the new variant takes over
    pub covered_dimension_space_points: DimensionSpacePointSet,
    /// Parent at points the aggregate did not cover before
    pub parent_node_aggregate_id: NodeAggregateId,
}

/// Properties of exactly one variant were set or unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodePropertiesWereSet {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub origin_dimension_space_point: OriginDimensionSpacePoint,
    pub properties_to_set: SerializedPropertyValues,
    #[serde(default)]
    pub properties_to_unset: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAggregateTypeWasChanged {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub new_node_type_name: NodeTypeName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAggregateNameWasChanged {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub new_node_name: NodeName,
}

/// The aggregate was placed below a new parent at the affected points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAggregateWasMoved {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub new_parent_node_aggregate_id: NodeAggregateId,
    pub affected_covered_dimension_space_points: DimensionSpacePointSet,
}

/// Coverage and variants of the aggregate were removed, descendants included
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAggregateWasRemoved {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub affected_occupied_dimension_space_points: Vec<OriginDimensionSpacePoint>,
    pub affected_covered_dimension_space_points: DimensionSpacePointSet,
}

impl DomainEvent for RootNodeAggregateWithNodeWasCreated {
    fn event_type(&self) -> &'static str {
        "RootNodeAggregateWithNodeWasCreated"
    }

    fn subject(&self) -> String {
        node_subject(&self.content_stream_id, &self.node_aggregate_id)
    }
}

impl DomainEvent for NodeAggregateWithNodeWasCreated {
    fn event_type(&self) -> &'static str {
        "NodeAggregateWithNodeWasCreated"
    }

    fn subject(&self) -> String {
        node_subject(&self.content_stream_id, &self.node_aggregate_id)
    }
}

impl DomainEvent for NodeVariantWasCreated {
    fn event_type(&self) -> &'static str {
        "NodeVariantWasCreated"
    }

    fn subject(&self) -> String {
        node_subject(&self.content_stream_id, &self.node_aggregate_id)
    }
}

impl DomainEvent for NodePropertiesWereSet {
    fn event_type(&self) -> &'static str {
        "NodePropertiesWereSet"
    }

    fn subject(&self) -> String {
        node_subject(&self.content_stream_id, &self.node_aggregate_id)
    }
}

impl DomainEvent for NodeAggregateTypeWasChanged {
    fn event_type(&self) -> &'static str {
        "NodeAggregateTypeWasChanged"
    }

    fn subject(&self) -> String {
        node_subject(&self.content_stream_id, &self.node_aggregate_id)
    }
}

impl DomainEvent for NodeAggregateNameWasChanged {
    fn event_type(&self) -> &'static str {
        "NodeAggregateNameWasChanged"
    }

    fn subject(&self) -> String {
        node_subject(&self.content_stream_id, &self.node_aggregate_id)
    }
}

impl DomainEvent for NodeAggregateWasMoved {
    fn event_type(&self) -> &'static str {
        "NodeAggregateWasMoved"
    }

    fn subject(&self) -> String {
        node_subject(&self.content_stream_id, &self.node_aggregate_id)
    }
}

impl DomainEvent for NodeAggregateWasRemoved {
    fn event_type(&self) -> &'static str {
        "NodeAggregateWasRemoved"
    }

    fn subject(&self) -> String {
        node_subject(&self.content_stream_id, &self.node_aggregate_id)
    }
}
