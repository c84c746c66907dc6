//! All variants of one conceptual node within one content stream

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::Node;
use crate::value_objects::{
    ContentStreamId, DimensionSpacePoint, DimensionSpacePointSet, NodeAggregateClassification,
    NodeAggregateId, NodeName, NodeTypeName, OriginDimensionSpacePoint,
};

/// Which variant is visible at a covered point, and below which parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub dimension_space_point: DimensionSpacePoint,
    pub occupant: OriginDimensionSpacePoint,
    /// `None` only for root aggregates
    pub parent: Option<NodeAggregateId>,
}

/// The set of all node variants sharing one node aggregate id
///
/// Variants are keyed by the origin they occupy; coverage maps each
/// visible dimension space point to the occupying variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeAggregate {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub classification: NodeAggregateClassification,
    pub node_type_name: NodeTypeName,
    pub node_name: Option<NodeName>,
    nodes: IndexMap<String, Node>,
    coverage: IndexMap<String, Coverage>,
}

impl NodeAggregate {
    pub(crate) fn new(
        content_stream_id: ContentStreamId,
        node_aggregate_id: NodeAggregateId,
        classification: NodeAggregateClassification,
        node_type_name: NodeTypeName,
        node_name: Option<NodeName>,
    ) -> Self {
        Self {
            content_stream_id,
            node_aggregate_id,
            classification,
            node_type_name,
            node_name,
            nodes: IndexMap::new(),
            coverage: IndexMap::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.classification.is_root()
    }

    /// Origins of all variants
    pub fn occupied_dimension_space_points(&self) -> Vec<OriginDimensionSpacePoint> {
        self.nodes
            .values()
            .map(|node| node.origin_dimension_space_point.clone())
            .collect()
    }

    pub fn occupies(&self, origin: &OriginDimensionSpacePoint) -> bool {
        self.nodes.contains_key(origin.hash())
    }

    /// Every point at which some variant is visible
    pub fn covered_dimension_space_points(&self) -> DimensionSpacePointSet {
        self.coverage
            .values()
            .map(|c| c.dimension_space_point.clone())
            .collect()
    }

    pub fn covers(&self, point: &DimensionSpacePoint) -> bool {
        self.coverage.contains_key(point.hash())
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_by_occupied_dimension_space_point(&self, origin: &OriginDimensionSpacePoint) -> Option<&Node> {
        self.nodes.get(origin.hash())
    }

    /// The variant visible at `point`
    pub fn node_by_covered_dimension_space_point(&self, point: &DimensionSpacePoint) -> Option<&Node> {
        self.occupation_by_covered(point)
            .and_then(|origin| self.nodes.get(origin.hash()))
    }

    /// Points at which the variant authored at `origin` is visible
    pub fn coverage_by_occupant(&self, origin: &OriginDimensionSpacePoint) -> DimensionSpacePointSet {
        self.coverage
            .values()
            .filter(|c| &c.occupant == origin)
            .map(|c| c.dimension_space_point.clone())
            .collect()
    }

    pub fn occupation_by_covered(&self, point: &DimensionSpacePoint) -> Option<&OriginDimensionSpacePoint> {
        self.coverage.get(point.hash()).map(|c| &c.occupant)
    }

    /// Parent aggregate at a covered point
    pub fn parent_at(&self, point: &DimensionSpacePoint) -> Option<&NodeAggregateId> {
        self.coverage.get(point.hash()).and_then(|c| c.parent.as_ref())
    }

    /// Distinct parents over all covered points
    pub fn parent_node_aggregate_ids(&self) -> Vec<NodeAggregateId> {
        let mut parents: Vec<NodeAggregateId> = Vec::new();
        for parent in self.coverage.values().filter_map(|c| c.parent.as_ref()) {
            if !parents.contains(parent) {
                parents.push(parent.clone());
            }
        }
        parents
    }

    /// Covered points at which `parent` is the parent
    pub fn coverage_below_parent(&self, parent: &NodeAggregateId) -> DimensionSpacePointSet {
        self.coverage
            .values()
            .filter(|c| c.parent.as_ref() == Some(parent))
            .map(|c| c.dimension_space_point.clone())
            .collect()
    }

    pub fn coverages(&self) -> impl Iterator<Item = &Coverage> {
        self.coverage.values()
    }

    pub(crate) fn insert_node(&mut self, node: Node) {
        self.nodes
            .insert(node.origin_dimension_space_point.hash().to_string(), node);
    }

    pub(crate) fn node_mut(&mut self, origin: &OriginDimensionSpacePoint) -> Option<&mut Node> {
        self.nodes.get_mut(origin.hash())
    }

    pub(crate) fn set_coverage(
        &mut self,
        point: DimensionSpacePoint,
        occupant: OriginDimensionSpacePoint,
        parent: Option<NodeAggregateId>,
    ) {
        self.coverage.insert(
            point.hash().to_string(),
            Coverage {
                dimension_space_point: point,
                occupant,
                parent,
            },
        );
    }

    pub(crate) fn set_parent(&mut self, point: &DimensionSpacePoint, parent: NodeAggregateId) {
        if let Some(coverage) = self.coverage.get_mut(point.hash()) {
            coverage.parent = Some(parent);
        }
    }

    pub(crate) fn remove_coverage(&mut self, point: &DimensionSpacePoint) {
        self.coverage.shift_remove(point.hash());
    }

    /// Drop variants no point is covered by any more
    pub(crate) fn remove_unreachable_nodes(&mut self) {
        let occupants: Vec<String> = self
            .coverage
            .values()
            .map(|c| c.occupant.hash().to_string())
            .collect();
        self.nodes.retain(|hash, _| occupants.contains(hash));
    }

    pub(crate) fn remove_node(&mut self, origin: &OriginDimensionSpacePoint) {
        self.nodes.shift_remove(origin.hash());
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn set_node_type_name(&mut self, node_type_name: NodeTypeName) {
        for node in self.nodes.values_mut() {
            node.node_type_name = node_type_name.clone();
        }
        self.node_type_name = node_type_name;
    }

    pub(crate) fn set_node_name(&mut self, node_name: NodeName) {
        for node in self.nodes.values_mut() {
            node.node_name = Some(node_name.clone());
        }
        self.node_name = Some(node_name);
    }

    pub(crate) fn set_content_stream_id(&mut self, content_stream_id: &ContentStreamId) {
        for node in self.nodes.values_mut() {
            node.content_stream_id = content_stream_id.clone();
        }
        self.content_stream_id = content_stream_id.clone();
    }

    /// Relabel every occurrence of `source` as `target`, both as origin and as covered point
    pub(crate) fn move_dimension_space_point(&mut self, source: &DimensionSpacePoint, target: &DimensionSpacePoint) {
        let source_origin = OriginDimensionSpacePoint::from_dimension_space_point(source.clone());
        let target_origin = OriginDimensionSpacePoint::from_dimension_space_point(target.clone());

        self.nodes = std::mem::take(&mut self.nodes)
            .into_iter()
            .map(|(hash, mut node)| {
                if node.origin_dimension_space_point == source_origin {
                    node.origin_dimension_space_point = target_origin.clone();
                    (target_origin.hash().to_string(), node)
                } else {
                    (hash, node)
                }
            })
            .collect();

        self.coverage = std::mem::take(&mut self.coverage)
            .into_iter()
            .map(|(hash, mut coverage)| {
                if coverage.occupant == source_origin {
                    coverage.occupant = target_origin.clone();
                }
                if &coverage.dimension_space_point == source {
                    coverage.dimension_space_point = target.clone();
                    (target.hash().to_string(), coverage)
                } else {
                    (hash, coverage)
                }
            })
            .collect();
    }
}
