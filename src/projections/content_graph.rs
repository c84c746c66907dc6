//! Content graph projection
//!
//! One graph per content stream. Forked streams share the graph of their
//! source through an `Arc` until either side is written to.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{Projection, ProjectionError, ProjectionResult};
use crate::aggregate::{Node, NodeAggregate};
use crate::domain_events::ContentRepositoryEvent;
use crate::events::*;
use crate::infrastructure::EventEnvelope;
use crate::queries::ContentGraph;
use crate::value_objects::{
    ContentStreamId, DimensionSpacePoint, DimensionSpacePointSet, NodeAggregateId, OriginDimensionSpacePoint,
    SerializedPropertyValues,
};

/// Graph state of one content stream
#[derive(Debug, Clone, Default)]
pub struct ContentStreamGraph {
    pub(crate) node_aggregates: IndexMap<NodeAggregateId, NodeAggregate>,
    /// Children per parent in insertion order, over all dimension space points
    pub(crate) children: IndexMap<NodeAggregateId, Vec<NodeAggregateId>>,
}

impl ContentStreamGraph {
    fn aggregate_mut(
        &mut self,
        content_stream_id: &ContentStreamId,
        node_aggregate_id: &NodeAggregateId,
    ) -> ProjectionResult<&mut NodeAggregate> {
        self.node_aggregates
            .get_mut(node_aggregate_id)
            .ok_or_else(|| ProjectionError::UnknownNodeAggregate {
                content_stream_id: content_stream_id.clone(),
                node_aggregate_id: node_aggregate_id.clone(),
            })
    }

    fn attach_child(&mut self, parent: &NodeAggregateId, child: &NodeAggregateId) {
        let children = self.children.entry(parent.clone()).or_default();
        if !children.contains(child) {
            children.push(child.clone());
        }
    }

    fn detach_child_if_unparented(&mut self, parent: &NodeAggregateId, child: &NodeAggregateId) {
        let still_below = self
            .node_aggregates
            .get(child)
            .map(|aggregate| !aggregate.coverage_below_parent(parent).is_empty())
            .unwrap_or(false);
        if !still_below {
            if let Some(children) = self.children.get_mut(parent) {
                children.retain(|c| c != child);
            }
        }
    }

    fn apply_root_node_aggregate_created(&mut self, event: &RootNodeAggregateWithNodeWasCreated) {
        let origin = OriginDimensionSpacePoint::from_dimension_space_point(DimensionSpacePoint::empty());
        let mut aggregate = NodeAggregate::new(
            event.content_stream_id.clone(),
            event.node_aggregate_id.clone(),
            event.node_aggregate_classification,
            event.node_type_name.clone(),
            None,
        );
        aggregate.insert_node(Node::new(
            event.content_stream_id.clone(),
            event.node_aggregate_id.clone(),
            origin.clone(),
            event.node_type_name.clone(),
            None,
            event.node_aggregate_classification,
            SerializedPropertyValues::new(),
        ));
        for point in event.covered_dimension_space_points.iter() {
            aggregate.set_coverage(point.clone(), origin.clone(), None);
        }
        self.node_aggregates.insert(event.node_aggregate_id.clone(), aggregate);
    }

    fn apply_node_aggregate_created(&mut self, event: &NodeAggregateWithNodeWasCreated) {
        let mut aggregate = NodeAggregate::new(
            event.content_stream_id.clone(),
            event.node_aggregate_id.clone(),
            event.node_aggregate_classification,
            event.node_type_name.clone(),
            event.node_name.clone(),
        );
        aggregate.insert_node(Node::new(
            event.content_stream_id.clone(),
            event.node_aggregate_id.clone(),
            event.origin_dimension_space_point.clone(),
            event.node_type_name.clone(),
            event.node_name.clone(),
            event.node_aggregate_classification,
            event.initial_property_values.clone(),
        ));
        for point in event.covered_dimension_space_points.iter() {
            aggregate.set_coverage(
                point.clone(),
                event.origin_dimension_space_point.clone(),
                Some(event.parent_node_aggregate_id.clone()),
            );
        }
        self.node_aggregates.insert(event.node_aggregate_id.clone(), aggregate);
        self.attach_child(&event.parent_node_aggregate_id, &event.node_aggregate_id);
    }

    fn apply_node_variant_created(&mut self, event: &NodeVariantWasCreated) -> ProjectionResult<()> {
        let aggregate = self.aggregate_mut(&event.content_stream_id, &event.node_aggregate_id)?;
        let mut variant = aggregate
            .node_by_occupied_dimension_space_point(&event.source_origin)
            .cloned()
            .ok_or_else(|| ProjectionError::UnknownNode {
                node_aggregate_id: event.node_aggregate_id.clone(),
                origin: event.source_origin.clone(),
            })?;
        variant.origin_dimension_space_point = event.target_origin.clone();
        aggregate.insert_node(variant);

        let mut parents = Vec::new();
        for point in event.covered_dimension_space_points.iter() {
            let parent = aggregate
                .parent_at(point)
                .cloned()
                .unwrap_or_else(|| event.parent_node_aggregate_id.clone());
            aggregate.set_coverage(point.clone(), event.target_origin.clone(), Some(parent.clone()));
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }
        for parent in parents {
            self.attach_child(&parent, &event.node_aggregate_id);
        }
        Ok(())
    }

    fn apply_properties_set(&mut self, event: &NodePropertiesWereSet) -> ProjectionResult<()> {
        let aggregate = self.aggregate_mut(&event.content_stream_id, &event.node_aggregate_id)?;
        let node = aggregate
            .node_mut(&event.origin_dimension_space_point)
            .ok_or_else(|| ProjectionError::UnknownNode {
                node_aggregate_id: event.node_aggregate_id.clone(),
                origin: event.origin_dimension_space_point.clone(),
            })?;
        let merged = node
            .properties()
            .merge(&event.properties_to_set, &event.properties_to_unset);
        node.set_properties(merged);
        Ok(())
    }

    fn apply_node_aggregate_moved(&mut self, event: &NodeAggregateWasMoved) -> ProjectionResult<()> {
        let aggregate = self.aggregate_mut(&event.content_stream_id, &event.node_aggregate_id)?;
        let previous_parents = aggregate.parent_node_aggregate_ids();
        for point in event.affected_covered_dimension_space_points.iter() {
            aggregate.set_parent(point, event.new_parent_node_aggregate_id.clone());
        }
        self.attach_child(&event.new_parent_node_aggregate_id, &event.node_aggregate_id);
        for parent in previous_parents {
            self.detach_child_if_unparented(&parent, &event.node_aggregate_id);
        }
        Ok(())
    }

    /// Remove coverage of `points` from an aggregate and, below it, from every descendant
    fn remove_coverage_recursively(
        &mut self,
        node_aggregate_id: &NodeAggregateId,
        points: &DimensionSpacePointSet,
        touched: &mut Vec<NodeAggregateId>,
    ) {
        let children = self.children.get(node_aggregate_id).cloned().unwrap_or_default();
        for child_id in children {
            let child_points = match self.node_aggregates.get(&child_id) {
                Some(child) => child.coverage_below_parent(node_aggregate_id).intersection(points),
                None => continue,
            };
            if !child_points.is_empty() {
                self.remove_coverage_recursively(&child_id, &child_points, touched);
            }
        }
        if let Some(aggregate) = self.node_aggregates.get_mut(node_aggregate_id) {
            for point in points.iter() {
                aggregate.remove_coverage(point);
            }
        }
        if !touched.contains(node_aggregate_id) {
            touched.push(node_aggregate_id.clone());
        }
    }

    fn apply_node_aggregate_removed(&mut self, event: &NodeAggregateWasRemoved) -> ProjectionResult<()> {
        let previous_parents = self
            .aggregate_mut(&event.content_stream_id, &event.node_aggregate_id)?
            .parent_node_aggregate_ids();

        let mut touched = Vec::new();
        self.remove_coverage_recursively(
            &event.node_aggregate_id,
            &event.affected_covered_dimension_space_points,
            &mut touched,
        );
        if let Some(aggregate) = self.node_aggregates.get_mut(&event.node_aggregate_id) {
            for origin in &event.affected_occupied_dimension_space_points {
                aggregate.remove_node(origin);
            }
        }

        for parent in previous_parents {
            self.detach_child_if_unparented(&parent, &event.node_aggregate_id);
        }
        for id in touched {
            let (parents, empty) = match self.node_aggregates.get_mut(&id) {
                Some(aggregate) => {
                    aggregate.remove_unreachable_nodes();
                    (aggregate.parent_node_aggregate_ids(), aggregate.is_empty())
                }
                None => continue,
            };
            if empty {
                self.node_aggregates.shift_remove(&id);
                self.children.shift_remove(&id);
                for children in self.children.values_mut() {
                    children.retain(|c| c != &id);
                }
            } else {
                for (parent, children) in self.children.iter_mut() {
                    if !parents.contains(parent) {
                        children.retain(|c| c != &id);
                    }
                }
            }
        }
        Ok(())
    }

    fn apply_shine_through(&mut self, event: &DimensionShineThroughWasAdded) {
        for aggregate in self.node_aggregates.values_mut() {
            let coverage = aggregate
                .coverages()
                .find(|c| c.dimension_space_point == event.source)
                .map(|c| (c.occupant.clone(), c.parent.clone()));
            if let Some((occupant, parent)) = coverage {
                aggregate.set_coverage(event.target.clone(), occupant, parent);
            }
        }
    }

    fn apply_dimension_space_point_moved(&mut self, event: &DimensionSpacePointWasMoved) {
        for aggregate in self.node_aggregates.values_mut() {
            aggregate.move_dimension_space_point(&event.source, &event.target);
        }
    }

    fn apply_root_dimensions_updated(&mut self, event: &RootNodeAggregateDimensionsWereUpdated) -> ProjectionResult<()> {
        let aggregate = self.aggregate_mut(&event.content_stream_id, &event.node_aggregate_id)?;
        let origin = aggregate
            .occupied_dimension_space_points()
            .into_iter()
            .next()
            .unwrap_or_else(|| OriginDimensionSpacePoint::from_dimension_space_point(DimensionSpacePoint::empty()));
        for point in aggregate.covered_dimension_space_points().iter() {
            if !event.covered_dimension_space_points.contains(point) {
                aggregate.remove_coverage(point);
            }
        }
        for point in event.covered_dimension_space_points.iter() {
            aggregate.set_coverage(point.clone(), origin.clone(), None);
        }
        Ok(())
    }

    fn apply(&mut self, event: &ContentRepositoryEvent) -> ProjectionResult<()> {
        match event {
            ContentRepositoryEvent::RootNodeAggregateWithNodeWasCreated(e) => self.apply_root_node_aggregate_created(e),
            ContentRepositoryEvent::NodeAggregateWithNodeWasCreated(e) => self.apply_node_aggregate_created(e),
            ContentRepositoryEvent::NodeVariantWasCreated(e) => self.apply_node_variant_created(e)?,
            ContentRepositoryEvent::NodePropertiesWereSet(e) => self.apply_properties_set(e)?,
            ContentRepositoryEvent::NodeAggregateTypeWasChanged(e) => self
                .aggregate_mut(&e.content_stream_id, &e.node_aggregate_id)?
                .set_node_type_name(e.new_node_type_name.clone()),
            ContentRepositoryEvent::NodeAggregateNameWasChanged(e) => self
                .aggregate_mut(&e.content_stream_id, &e.node_aggregate_id)?
                .set_node_name(e.new_node_name.clone()),
            ContentRepositoryEvent::NodeAggregateWasMoved(e) => self.apply_node_aggregate_moved(e)?,
            ContentRepositoryEvent::NodeAggregateWasRemoved(e) => self.apply_node_aggregate_removed(e)?,
            ContentRepositoryEvent::DimensionShineThroughWasAdded(e) => self.apply_shine_through(e),
            ContentRepositoryEvent::DimensionSpacePointWasMoved(e) => self.apply_dimension_space_point_moved(e),
            ContentRepositoryEvent::RootNodeAggregateDimensionsWereUpdated(e) => self.apply_root_dimensions_updated(e)?,
            _ => {}
        }
        Ok(())
    }
}

/// Read model of the node graphs of all content streams
#[derive(Debug, Clone, Default)]
pub struct ContentGraphProjection {
    graphs: HashMap<ContentStreamId, Arc<ContentStreamGraph>>,
}

impl ContentGraphProjection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the graph of one content stream
    pub fn content_graph(&self, content_stream_id: &ContentStreamId) -> Option<ContentGraph> {
        self.graphs
            .get(content_stream_id)
            .map(|graph| ContentGraph::new(content_stream_id.clone(), Arc::clone(graph)))
    }

    pub fn has_content_stream(&self, content_stream_id: &ContentStreamId) -> bool {
        self.graphs.contains_key(content_stream_id)
    }
}

impl Projection for ContentGraphProjection {
    fn name(&self) -> &'static str {
        "content-graph"
    }

    fn apply(&mut self, envelope: &EventEnvelope) -> ProjectionResult<()> {
        match &envelope.event {
            ContentRepositoryEvent::ContentStreamWasCreated(event) => {
                self.graphs
                    .insert(event.content_stream_id.clone(), Arc::new(ContentStreamGraph::default()));
            }
            ContentRepositoryEvent::ContentStreamWasForked(event) => {
                let source = self
                    .graphs
                    .get(&event.source_content_stream_id)
                    .cloned()
                    .ok_or_else(|| ProjectionError::UnknownContentStream(event.source_content_stream_id.clone()))?;
                self.graphs.insert(event.new_content_stream_id.clone(), source);
            }
            ContentRepositoryEvent::ContentStreamWasRemoved(event) => {
                self.graphs.remove(&event.content_stream_id);
            }
            graph_event => {
                if let Some(content_stream_id) = graph_event.content_stream_id() {
                    debug!(
                        content_stream = %content_stream_id,
                        sequence_number = envelope.sequence_number,
                        event_type = graph_event.event_type(),
                        "Projecting event"
                    );
                    let graph = self
                        .graphs
                        .get_mut(content_stream_id)
                        .ok_or_else(|| ProjectionError::UnknownContentStream(content_stream_id.clone()))?;
                    Arc::make_mut(graph).apply(graph_event)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::StreamName;
    use crate::value_objects::{NodeAggregateClassification, NodeTypeName, SerializedPropertyValue};

    fn cs(id: &str) -> ContentStreamId {
        ContentStreamId::new(id).unwrap()
    }

    fn id(id: &str) -> NodeAggregateId {
        NodeAggregateId::new(id).unwrap()
    }

    fn origin(language: &str) -> OriginDimensionSpacePoint {
        OriginDimensionSpacePoint::from_array([("language", language)]).unwrap()
    }

    fn points(languages: &[&str]) -> DimensionSpacePointSet {
        languages.iter().map(|l| origin(l).to_dimension_space_point()).collect()
    }

    fn envelope(sequence_number: u64, event: ContentRepositoryEvent) -> EventEnvelope {
        EventEnvelope {
            sequence_number,
            event_id: uuid::Uuid::new_v4(),
            stream_name: StreamName::for_content_stream(&cs("live")),
            version: sequence_number,
            recorded_at: chrono::Utc::now(),
            event,
        }
    }

    fn projection_with_tree() -> ContentGraphProjection {
        let mut projection = ContentGraphProjection::new();
        let events = vec![
            ContentRepositoryEvent::ContentStreamWasCreated(ContentStreamWasCreated { content_stream_id: cs("live") }),
            ContentRepositoryEvent::RootNodeAggregateWithNodeWasCreated(RootNodeAggregateWithNodeWasCreated {
                content_stream_id: cs("live"),
                node_aggregate_id: id("root"),
                node_type_name: NodeTypeName::new("Neos.ContentRepository:Root").unwrap(),
                covered_dimension_space_points: points(&["en", "de", "de_CH"]),
                node_aggregate_classification: NodeAggregateClassification::Root,
            }),
            ContentRepositoryEvent::NodeAggregateWithNodeWasCreated(NodeAggregateWithNodeWasCreated {
                content_stream_id: cs("live"),
                node_aggregate_id: id("page"),
                node_type_name: NodeTypeName::new("Acme:Page").unwrap(),
                origin_dimension_space_point: origin("de"),
                covered_dimension_space_points: points(&["de", "de_CH"]),
                parent_node_aggregate_id: id("root"),
                node_name: None,
                initial_property_values: SerializedPropertyValues::new()
                    .with("title", SerializedPropertyValue::string("Hallo")),
                node_aggregate_classification: NodeAggregateClassification::Regular,
            }),
            ContentRepositoryEvent::NodeAggregateWithNodeWasCreated(NodeAggregateWithNodeWasCreated {
                content_stream_id: cs("live"),
                node_aggregate_id: id("text"),
                node_type_name: NodeTypeName::new("Acme:Text").unwrap(),
                origin_dimension_space_point: origin("de"),
                covered_dimension_space_points: points(&["de", "de_CH"]),
                parent_node_aggregate_id: id("page"),
                node_name: None,
                initial_property_values: SerializedPropertyValues::new(),
                node_aggregate_classification: NodeAggregateClassification::Regular,
            }),
        ];
        for (i, event) in events.into_iter().enumerate() {
            projection.apply(&envelope(i as u64 + 1, event)).unwrap();
        }
        projection
    }

    #[test]
    fn test_fork_shares_state_until_written() {
        let mut projection = projection_with_tree();
        projection
            .apply(&envelope(
                10,
                ContentRepositoryEvent::ContentStreamWasForked(ContentStreamWasForked {
                    new_content_stream_id: cs("fork"),
                    source_content_stream_id: cs("live"),
                    version_of_source_content_stream: 4,
                }),
            ))
            .unwrap();
        assert!(Arc::ptr_eq(&projection.graphs[&cs("live")], &projection.graphs[&cs("fork")]));

        projection
            .apply(&envelope(
                11,
                ContentRepositoryEvent::NodePropertiesWereSet(NodePropertiesWereSet {
                    content_stream_id: cs("fork"),
                    node_aggregate_id: id("page"),
                    origin_dimension_space_point: origin("de"),
                    properties_to_set: SerializedPropertyValues::new()
                        .with("title", SerializedPropertyValue::string("Servus")),
                    properties_to_unset: vec![],
                }),
            ))
            .unwrap();
        assert!(!Arc::ptr_eq(&projection.graphs[&cs("live")], &projection.graphs[&cs("fork")]));

        let live = projection.content_graph(&cs("live")).unwrap();
        let fork = projection.content_graph(&cs("fork")).unwrap();
        let title = |graph: &ContentGraph| {
            graph
                .find_node_aggregate_by_id(&id("page"))
                .unwrap()
                .node_by_occupied_dimension_space_point(&origin("de"))
                .unwrap()
                .property("title")
                .unwrap()
                .value
                .clone()
        };
        assert_eq!(title(&live), serde_json::json!("Hallo"));
        assert_eq!(title(&fork), serde_json::json!("Servus"));
        assert_eq!(fork.find_node_aggregate_by_id(&id("page")).unwrap().content_stream_id, cs("fork"));
    }

    #[test]
    fn test_removal_cascades_to_descendants() {
        let mut projection = projection_with_tree();
        projection
            .apply(&envelope(
                5,
                ContentRepositoryEvent::NodeAggregateWasRemoved(NodeAggregateWasRemoved {
                    content_stream_id: cs("live"),
                    node_aggregate_id: id("page"),
                    affected_occupied_dimension_space_points: vec![],
                    affected_covered_dimension_space_points: points(&["de_CH"]),
                }),
            ))
            .unwrap();
        let graph = projection.content_graph(&cs("live")).unwrap();
        let text = graph.find_node_aggregate_by_id(&id("text")).unwrap();
        assert_eq!(text.covered_dimension_space_points(), points(&["de"]));

        projection
            .apply(&envelope(
                6,
                ContentRepositoryEvent::NodeAggregateWasRemoved(NodeAggregateWasRemoved {
                    content_stream_id: cs("live"),
                    node_aggregate_id: id("page"),
                    affected_occupied_dimension_space_points: vec![origin("de")],
                    affected_covered_dimension_space_points: points(&["de"]),
                }),
            ))
            .unwrap();
        let graph = projection.content_graph(&cs("live")).unwrap();
        assert!(graph.find_node_aggregate_by_id(&id("page")).is_none());
        assert!(graph.find_node_aggregate_by_id(&id("text")).is_none());
        assert!(graph.find_child_node_aggregates(&id("root")).is_empty());
    }

    #[test]
    fn test_shine_through_reuses_occupant_and_parent() {
        let mut projection = projection_with_tree();
        let en_gb = DimensionSpacePoint::from_array([("language", "en_GB")]).unwrap();
        projection
            .apply(&envelope(
                5,
                ContentRepositoryEvent::DimensionShineThroughWasAdded(DimensionShineThroughWasAdded {
                    content_stream_id: cs("live"),
                    source: origin("de").to_dimension_space_point(),
                    target: en_gb.clone(),
                }),
            ))
            .unwrap();
        let graph = projection.content_graph(&cs("live")).unwrap();
        let text = graph.find_node_aggregate_by_id(&id("text")).unwrap();
        assert_eq!(text.occupation_by_covered(&en_gb), Some(&origin("de")));
        assert_eq!(text.parent_at(&en_gb), Some(&id("page")));
        assert!(graph.find_node_aggregate_by_id(&id("root")).unwrap().covers(&en_gb));
    }

    #[test]
    fn test_unknown_content_stream_is_an_error() {
        let mut projection = ContentGraphProjection::new();
        let result = projection.apply(&envelope(
            1,
            ContentRepositoryEvent::NodeAggregateTypeWasChanged(NodeAggregateTypeWasChanged {
                content_stream_id: cs("missing"),
                node_aggregate_id: id("n1"),
                new_node_type_name: NodeTypeName::new("Acme:Text").unwrap(),
            }),
        ));
        assert!(matches!(result, Err(ProjectionError::UnknownContentStream(_))));
    }
}
