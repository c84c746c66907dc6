//! Aggregate level queries over one content stream

use std::sync::Arc;

use super::ContentSubgraph;
use crate::aggregate::NodeAggregate;
use crate::projections::ContentStreamGraph;
use crate::value_objects::{ContentStreamId, DimensionSpacePoint, NodeAggregateId, NodeName, NodeTypeName};

/// Snapshot of the node aggregates of one content stream
#[derive(Debug, Clone)]
pub struct ContentGraph {
    content_stream_id: ContentStreamId,
    graph: Arc<ContentStreamGraph>,
}

impl ContentGraph {
    pub(crate) fn new(content_stream_id: ContentStreamId, graph: Arc<ContentStreamGraph>) -> Self {
        Self {
            content_stream_id,
            graph,
        }
    }

    pub fn content_stream_id(&self) -> &ContentStreamId {
        &self.content_stream_id
    }

    /// Aggregates shared with a fork still carry the source stream's id
    fn localized(&self, aggregate: &NodeAggregate) -> NodeAggregate {
        let mut aggregate = aggregate.clone();
        if aggregate.content_stream_id != self.content_stream_id {
            aggregate.set_content_stream_id(&self.content_stream_id);
        }
        aggregate
    }

    pub(crate) fn raw_aggregate(&self, node_aggregate_id: &NodeAggregateId) -> Option<&NodeAggregate> {
        self.graph.node_aggregates.get(node_aggregate_id)
    }

    pub(crate) fn raw_child_ids(&self, parent: &NodeAggregateId) -> &[NodeAggregateId] {
        self.graph
            .children
            .get(parent)
            .map(|children| children.as_slice())
            .unwrap_or(&[])
    }

    pub fn find_node_aggregate_by_id(&self, node_aggregate_id: &NodeAggregateId) -> Option<NodeAggregate> {
        self.raw_aggregate(node_aggregate_id).map(|a| self.localized(a))
    }

    /// All aggregates, in creation order
    pub fn find_node_aggregates(&self) -> Vec<NodeAggregate> {
        self.graph.node_aggregates.values().map(|a| self.localized(a)).collect()
    }

    pub fn find_node_aggregates_by_type(&self, node_type_name: &NodeTypeName) -> Vec<NodeAggregate> {
        self.graph
            .node_aggregates
            .values()
            .filter(|a| &a.node_type_name == node_type_name)
            .map(|a| self.localized(a))
            .collect()
    }

    /// Distinct node type names in use, in order of first use
    pub fn find_used_node_type_names(&self) -> Vec<NodeTypeName> {
        let mut names: Vec<NodeTypeName> = Vec::new();
        for aggregate in self.graph.node_aggregates.values() {
            if !names.contains(&aggregate.node_type_name) {
                names.push(aggregate.node_type_name.clone());
            }
        }
        names
    }

    /// The unique root aggregate of the given type
    pub fn find_root_node_aggregate_by_type(&self, node_type_name: &NodeTypeName) -> Option<NodeAggregate> {
        self.graph
            .node_aggregates
            .values()
            .find(|a| a.is_root() && &a.node_type_name == node_type_name)
            .map(|a| self.localized(a))
    }

    pub fn find_root_node_aggregates(&self) -> Vec<NodeAggregate> {
        self.graph
            .node_aggregates
            .values()
            .filter(|a| a.is_root())
            .map(|a| self.localized(a))
            .collect()
    }

    pub fn find_parent_node_aggregates(&self, child: &NodeAggregateId) -> Vec<NodeAggregate> {
        self.raw_aggregate(child)
            .map(|aggregate| {
                aggregate
                    .parent_node_aggregate_ids()
                    .iter()
                    .filter_map(|parent| self.find_node_aggregate_by_id(parent))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn find_child_node_aggregates(&self, parent: &NodeAggregateId) -> Vec<NodeAggregate> {
        self.raw_child_ids(parent)
            .iter()
            .filter_map(|child| self.find_node_aggregate_by_id(child))
            .collect()
    }

    pub fn find_child_node_aggregates_by_name(&self, parent: &NodeAggregateId, name: &NodeName) -> Vec<NodeAggregate> {
        self.find_child_node_aggregates(parent)
            .into_iter()
            .filter(|child| child.node_name.as_ref() == Some(name))
            .collect()
    }

    /// Ids of all aggregates below `ancestor` in any dimension space point
    pub fn find_descendant_node_aggregate_ids(&self, ancestor: &NodeAggregateId) -> Vec<NodeAggregateId> {
        let mut descendants: Vec<NodeAggregateId> = Vec::new();
        let mut pending: Vec<NodeAggregateId> = self.raw_child_ids(ancestor).to_vec();
        while let Some(next) = pending.pop() {
            if descendants.contains(&next) {
                continue;
            }
            pending.extend(self.raw_child_ids(&next).iter().cloned());
            descendants.push(next);
        }
        descendants
    }

    pub fn count_node_aggregates(&self) -> usize {
        self.graph.node_aggregates.len()
    }

    /// View of the graph as seen at one dimension space point
    pub fn subgraph(&self, dimension_space_point: DimensionSpacePoint) -> ContentSubgraph {
        ContentSubgraph::new(self.clone(), dimension_space_point)
    }
}
