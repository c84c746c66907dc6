//! Node level queries at one dimension space point

use super::ContentGraph;
use crate::aggregate::Node;
use crate::value_objects::{DimensionSpacePoint, NodeAggregateId, NodeName};

/// The content graph as visible at one dimension space point
#[derive(Debug, Clone)]
pub struct ContentSubgraph {
    graph: ContentGraph,
    dimension_space_point: DimensionSpacePoint,
}

impl ContentSubgraph {
    pub(crate) fn new(graph: ContentGraph, dimension_space_point: DimensionSpacePoint) -> Self {
        Self {
            graph,
            dimension_space_point,
        }
    }

    pub fn dimension_space_point(&self) -> &DimensionSpacePoint {
        &self.dimension_space_point
    }

    pub fn find_node_by_id(&self, node_aggregate_id: &NodeAggregateId) -> Option<Node> {
        let aggregate = self.graph.raw_aggregate(node_aggregate_id)?;
        let mut node = aggregate
            .node_by_covered_dimension_space_point(&self.dimension_space_point)?
            .clone();
        node.content_stream_id = self.graph.content_stream_id().clone();
        Some(node)
    }

    fn visible_child_ids(&self, parent: &NodeAggregateId) -> Vec<NodeAggregateId> {
        self.graph
            .raw_child_ids(parent)
            .iter()
            .filter(|child| {
                self.graph
                    .raw_aggregate(child)
                    .and_then(|a| a.parent_at(&self.dimension_space_point))
                    == Some(parent)
            })
            .cloned()
            .collect()
    }

    pub fn find_child_nodes(&self, parent: &NodeAggregateId) -> Vec<Node> {
        self.visible_child_ids(parent)
            .iter()
            .filter_map(|child| self.find_node_by_id(child))
            .collect()
    }

    pub fn find_child_node_by_name(&self, parent: &NodeAggregateId, name: &NodeName) -> Option<Node> {
        self.find_child_nodes(parent)
            .into_iter()
            .find(|child| child.node_name.as_ref() == Some(name))
    }

    pub fn find_parent_node(&self, child: &NodeAggregateId) -> Option<Node> {
        let parent = self
            .graph
            .raw_aggregate(child)?
            .parent_at(&self.dimension_space_point)?
            .clone();
        self.find_node_by_id(&parent)
    }

    fn siblings(&self, node_aggregate_id: &NodeAggregateId) -> Option<(Vec<NodeAggregateId>, usize)> {
        let parent = self
            .graph
            .raw_aggregate(node_aggregate_id)?
            .parent_at(&self.dimension_space_point)?
            .clone();
        let siblings = self.visible_child_ids(&parent);
        let position = siblings.iter().position(|s| s == node_aggregate_id)?;
        Some((siblings, position))
    }

    /// Siblings before the node, nearest first
    pub fn find_preceding_sibling_nodes(&self, node_aggregate_id: &NodeAggregateId) -> Vec<Node> {
        match self.siblings(node_aggregate_id) {
            Some((siblings, position)) => siblings[..position]
                .iter()
                .rev()
                .filter_map(|s| self.find_node_by_id(s))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn find_succeeding_sibling_nodes(&self, node_aggregate_id: &NodeAggregateId) -> Vec<Node> {
        match self.siblings(node_aggregate_id) {
            Some((siblings, position)) => siblings[position + 1..]
                .iter()
                .filter_map(|s| self.find_node_by_id(s))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Follow a path of node names starting at `start`
    pub fn find_node_by_path(&self, start: &NodeAggregateId, path: &[NodeName]) -> Option<Node> {
        let mut current = self.find_node_by_id(start)?;
        for segment in path {
            current = self.find_child_node_by_name(&current.node_aggregate_id, segment)?;
        }
        Some(current)
    }

    /// Number of nodes visible at this point
    pub fn count_nodes(&self) -> usize {
        self.graph
            .find_node_aggregates()
            .iter()
            .filter(|a| a.covers(&self.dimension_space_point))
            .count()
    }
}
