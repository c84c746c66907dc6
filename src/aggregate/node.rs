//! A single dimension variant of a node aggregate

use serde::{Deserialize, Serialize};

use crate::value_objects::{
    ContentStreamId, NodeAggregateClassification, NodeAggregateId, NodeName, NodeTypeName,
    OriginDimensionSpacePoint, SerializedPropertyValue, SerializedPropertyValues,
};

/// One variant of a node aggregate, authored at its origin dimension space point
///
/// Property reads only look at this variant's own bag; they never fall back
/// to other variants of the same aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Content stream the variant was read from
    pub content_stream_id: ContentStreamId,
    /// Identity of the aggregate this variant belongs to
    pub node_aggregate_id: NodeAggregateId,
    /// The point the variant was created at; the write target for property changes
    pub origin_dimension_space_point: OriginDimensionSpacePoint,
    /// Type of the owning aggregate
    pub node_type_name: NodeTypeName,
    /// Name of the owning aggregate
    pub node_name: Option<NodeName>,
    pub classification: NodeAggregateClassification,
    properties: SerializedPropertyValues,
}

impl Node {
    pub(crate) fn new(
        content_stream_id: ContentStreamId,
        node_aggregate_id: NodeAggregateId,
        origin_dimension_space_point: OriginDimensionSpacePoint,
        node_type_name: NodeTypeName,
        node_name: Option<NodeName>,
        classification: NodeAggregateClassification,
        properties: SerializedPropertyValues,
    ) -> Self {
        Self {
            content_stream_id,
            node_aggregate_id,
            origin_dimension_space_point,
            node_type_name,
            node_name,
            classification,
            properties,
        }
    }

    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains(name)
    }

    pub fn property(&self, name: &str) -> Option<&SerializedPropertyValue> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &SerializedPropertyValues {
        &self.properties
    }

    pub(crate) fn set_properties(&mut self, properties: SerializedPropertyValues) {
        self.properties = properties;
    }
}
