//! Node aggregate creation, mutation and removal

use async_trait::async_trait;
use tracing::debug;

use super::constraint_checks::*;
use super::{CommandHandler, CommandHandlingDependencies, EventsToPublish};
use crate::aggregate::NodeAggregate;
use crate::commands::*;
use crate::domain_events::ContentRepositoryEvent;
use crate::events::*;
use crate::value_objects::{
    DimensionSpacePointSet, NodeAggregateClassification, NodeAggregateId,
    NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy,
    NodeVariantSelectionStrategy, OriginDimensionSpacePoint, RelationDistributionStrategy,
};

/// Handles commands addressing node aggregates
#[derive(Debug, Default)]
pub struct NodeAggregateCommandHandler;

impl NodeAggregateCommandHandler {
    pub fn new() -> Self {
        Self
    }

    fn handle_create_root_node_aggregate_with_node(
        &self,
        command: CreateRootNodeAggregateWithNode,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        require_node_aggregate_to_not_exist(&graph, &command.node_aggregate_id)?;
        let node_type = require_node_type(dependencies.node_type_manager(), &command.node_type_name)?;
        require_node_type_to_not_be_abstract(node_type)?;
        if !node_type.is_root() {
            return Err(CommandError::NodeTypeIsNotOfTypeRoot(command.node_type_name));
        }
        if graph.find_root_node_aggregate_by_type(&command.node_type_name).is_some() {
            return Err(CommandError::RootNodeAggregateTypeIsAlreadyOccupied(command.node_type_name));
        }

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::RootNodeAggregateWithNodeWasCreated(
                RootNodeAggregateWithNodeWasCreated {
                    content_stream_id: command.content_stream_id.clone(),
                    node_aggregate_id: command.node_aggregate_id,
                    node_type_name: command.node_type_name,
                    covered_dimension_space_points: dependencies
                        .variation_graph()
                        .allowed_dimension_subspace()
                        .clone(),
                    node_aggregate_classification: NodeAggregateClassification::Root,
                },
            )],
        )
    }

    fn handle_create_node_aggregate_with_node(
        &self,
        command: CreateNodeAggregateWithNode,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        require_node_aggregate_to_not_exist(&graph, &command.node_aggregate_id)?;
        let manager = dependencies.node_type_manager();
        let node_type = require_node_type(manager, &command.node_type_name)?;
        require_node_type_to_not_be_abstract(node_type)?;
        if node_type.is_root() {
            return Err(CommandError::NodeTypeIsOfTypeRoot(command.node_type_name));
        }

        let origin = command.origin_dimension_space_point.as_dimension_space_point();
        require_dimension_space_point(dependencies.variation_graph(), origin)?;
        let parent = require_node_aggregate(&graph, &command.parent_node_aggregate_id)?;
        require_node_aggregate_to_cover(&parent, origin)?;
        require_constraints_imposed_by_parent_are_met(manager, &parent, node_type)?;
        if let Some(node_name) = &command.node_name {
            require_node_name_to_be_uncovered(&graph, &parent.node_aggregate_id, node_name, None)?;
        }

        let covered = dependencies
            .variation_graph()
            .specialization_set(origin)?
            .intersection(&parent.covered_dimension_space_points());

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::NodeAggregateWithNodeWasCreated(NodeAggregateWithNodeWasCreated {
                content_stream_id: command.content_stream_id.clone(),
                node_aggregate_id: command.node_aggregate_id,
                node_type_name: command.node_type_name,
                origin_dimension_space_point: command.origin_dimension_space_point,
                covered_dimension_space_points: covered,
                parent_node_aggregate_id: command.parent_node_aggregate_id,
                node_name: command.node_name,
                initial_property_values: command.initial_property_values,
                node_aggregate_classification: NodeAggregateClassification::Regular,
            })],
        )
    }

    fn handle_create_node_variant(
        &self,
        command: CreateNodeVariant,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        let aggregate = require_node_aggregate(&graph, &command.node_aggregate_id)?;
        require_node_aggregate_to_not_be_root(&aggregate)?;
        require_node_aggregate_to_occupy(&aggregate, &command.source_origin)?;
        let variation_graph = dependencies.variation_graph();
        let target = command.target_origin.as_dimension_space_point();
        require_dimension_space_point(variation_graph, target)?;
        if aggregate.occupies(&command.target_origin) {
            return Err(CommandError::DimensionSpacePointIsAlreadyOccupied {
                node_aggregate_id: command.node_aggregate_id.clone(),
                origin: command.target_origin.clone(),
            });
        }

        let parent_id = Self::parent_of_variant(&aggregate, &command.source_origin).ok_or_else(|| {
            CommandError::NodeAggregateIsRoot(command.node_aggregate_id.clone())
        })?;
        let parent = require_node_aggregate(&graph, &parent_id)?;
        require_node_aggregate_to_cover(&parent, target)?;

        let parent_coverage = parent.covered_dimension_space_points();
        let covered: DimensionSpacePointSet = variation_graph
            .specialization_set(target)?
            .iter()
            .filter(|point| match aggregate.occupation_by_covered(point) {
                None => parent_coverage.contains(point),
                Some(occupant) => {
                    variation_graph.is_generalization_of(occupant.as_dimension_space_point(), target)
                }
            })
            .cloned()
            .collect();

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::NodeVariantWasCreated(NodeVariantWasCreated {
                content_stream_id: command.content_stream_id.clone(),
                node_aggregate_id: command.node_aggregate_id,
                source_origin: command.source_origin,
                target_origin: command.target_origin,
                covered_dimension_space_points: covered,
                parent_node_aggregate_id: parent_id,
            })],
        )
    }

    /// Parent of the variant at `origin`, preferring the one at the origin itself
    fn parent_of_variant(aggregate: &NodeAggregate, origin: &OriginDimensionSpacePoint) -> Option<NodeAggregateId> {
        aggregate
            .parent_at(origin.as_dimension_space_point())
            .or_else(|| {
                aggregate
                    .coverages()
                    .find(|coverage| &coverage.occupant == origin && coverage.parent.is_some())
                    .and_then(|coverage| coverage.parent.as_ref())
            })
            .or_else(|| aggregate.coverages().find_map(|coverage| coverage.parent.as_ref()))
            .cloned()
    }

    fn handle_set_serialized_node_properties(
        &self,
        command: SetSerializedNodeProperties,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        let aggregate = require_node_aggregate(&graph, &command.node_aggregate_id)?;
        require_node_aggregate_to_occupy(&aggregate, &command.origin_dimension_space_point)?;
        let (properties_to_set, properties_to_unset) = command.property_values.split();

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::NodePropertiesWereSet(NodePropertiesWereSet {
                content_stream_id: command.content_stream_id.clone(),
                node_aggregate_id: command.node_aggregate_id,
                origin_dimension_space_point: command.origin_dimension_space_point,
                properties_to_set,
                properties_to_unset,
            })],
        )
    }

    fn handle_change_node_aggregate_type(
        &self,
        command: ChangeNodeAggregateType,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        let aggregate = require_node_aggregate(&graph, &command.node_aggregate_id)?;
        let manager = dependencies.node_type_manager();
        let new_type = require_node_type(manager, &command.new_node_type_name)?;
        require_node_type_to_not_be_abstract(new_type)?;
        match (aggregate.is_root(), new_type.is_root()) {
            (true, false) => return Err(CommandError::NodeTypeIsNotOfTypeRoot(command.new_node_type_name)),
            (false, true) => return Err(CommandError::NodeTypeIsOfTypeRoot(command.new_node_type_name)),
            _ => {}
        }
        for parent in graph.find_parent_node_aggregates(&command.node_aggregate_id) {
            require_constraints_imposed_by_parent_are_met(manager, &parent, new_type)?;
        }

        let conflicting: Vec<NodeAggregate> = graph
            .find_child_node_aggregates(&command.node_aggregate_id)
            .into_iter()
            .filter(|child| {
                manager
                    .get_node_type(&child.node_type_name)
                    .map(|child_type| !new_type.allows_child_node_type(child_type))
                    .unwrap_or(false)
            })
            .collect();

        let mut events = vec![ContentRepositoryEvent::NodeAggregateTypeWasChanged(NodeAggregateTypeWasChanged {
            content_stream_id: command.content_stream_id.clone(),
            node_aggregate_id: command.node_aggregate_id.clone(),
            new_node_type_name: command.new_node_type_name.clone(),
        })];

        match command.strategy {
            NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy::HappyPath => {
                if let Some(child) = conflicting.first() {
                    return Err(CommandError::NodeConstraintViolation(format!(
                        "child \"{}\" of type \"{}\" is not allowed below node type \"{}\"",
                        child.node_aggregate_id, child.node_type_name, command.new_node_type_name
                    )));
                }
            }
            NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy::Delete => {
                for child in conflicting {
                    let affected_covered = child.coverage_below_parent(&command.node_aggregate_id);
                    let affected_occupied = child
                        .occupied_dimension_space_points()
                        .into_iter()
                        .filter(|origin| child.coverage_by_occupant(origin).is_subset_of(&affected_covered))
                        .collect();
                    debug!(child = %child.node_aggregate_id, "Removing child conflicting with new node type");
                    events.push(ContentRepositoryEvent::NodeAggregateWasRemoved(NodeAggregateWasRemoved {
                        content_stream_id: command.content_stream_id.clone(),
                        node_aggregate_id: child.node_aggregate_id,
                        affected_occupied_dimension_space_points: affected_occupied,
                        affected_covered_dimension_space_points: affected_covered,
                    }));
                }
            }
        }

        dependencies.publish_to_content_stream(&command.content_stream_id, events)
    }

    fn handle_change_node_aggregate_name(
        &self,
        command: ChangeNodeAggregateName,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        let aggregate = require_node_aggregate(&graph, &command.node_aggregate_id)?;
        require_node_aggregate_to_not_be_root(&aggregate)?;
        for parent in aggregate.parent_node_aggregate_ids() {
            require_node_name_to_be_uncovered(&graph, &parent, &command.new_node_name, Some(&command.node_aggregate_id))?;
        }

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::NodeAggregateNameWasChanged(NodeAggregateNameWasChanged {
                content_stream_id: command.content_stream_id.clone(),
                node_aggregate_id: command.node_aggregate_id,
                new_node_name: command.new_node_name,
            })],
        )
    }

    fn handle_move_node_aggregate(
        &self,
        command: MoveNodeAggregate,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        let aggregate = require_node_aggregate(&graph, &command.node_aggregate_id)?;
        require_node_aggregate_to_not_be_root(&aggregate)?;
        let variation_graph = dependencies.variation_graph();
        require_dimension_space_point(variation_graph, &command.dimension_space_point)?;
        require_node_aggregate_to_cover(&aggregate, &command.dimension_space_point)?;

        let new_parent = require_node_aggregate(&graph, &command.new_parent_node_aggregate_id)?;
        if command.new_parent_node_aggregate_id == command.node_aggregate_id
            || graph
                .find_descendant_node_aggregate_ids(&command.node_aggregate_id)
                .contains(&command.new_parent_node_aggregate_id)
        {
            return Err(CommandError::NodeAggregateIsDescendant {
                node_aggregate_id: command.node_aggregate_id,
                new_parent_node_aggregate_id: command.new_parent_node_aggregate_id,
            });
        }

        let covered = aggregate.covered_dimension_space_points();
        let affected = match command.relation_distribution_strategy {
            RelationDistributionStrategy::Scatter => DimensionSpacePointSet::new([command.dimension_space_point.clone()]),
            RelationDistributionStrategy::GatherSpecializations => variation_graph
                .specialization_set(&command.dimension_space_point)?
                .intersection(&covered),
            RelationDistributionStrategy::GatherAll => covered,
        };
        for point in affected.iter() {
            require_node_aggregate_to_cover(&new_parent, point)?;
        }

        let node_type = require_node_type(dependencies.node_type_manager(), &aggregate.node_type_name)?;
        require_constraints_imposed_by_parent_are_met(dependencies.node_type_manager(), &new_parent, node_type)?;
        if let Some(node_name) = &aggregate.node_name {
            require_node_name_to_be_uncovered(
                &graph,
                &command.new_parent_node_aggregate_id,
                node_name,
                Some(&command.node_aggregate_id),
            )?;
        }

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::NodeAggregateWasMoved(NodeAggregateWasMoved {
                content_stream_id: command.content_stream_id.clone(),
                node_aggregate_id: command.node_aggregate_id,
                new_parent_node_aggregate_id: command.new_parent_node_aggregate_id,
                affected_covered_dimension_space_points: affected,
            })],
        )
    }

    fn handle_remove_node_aggregate(
        &self,
        command: RemoveNodeAggregate,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        let aggregate = require_node_aggregate(&graph, &command.node_aggregate_id)?;
        let variation_graph = dependencies.variation_graph();
        require_dimension_space_point(variation_graph, &command.covered_dimension_space_point)?;
        require_node_aggregate_to_cover(&aggregate, &command.covered_dimension_space_point)?;

        let (affected_covered, affected_occupied) = match command.node_variant_selection_strategy {
            NodeVariantSelectionStrategy::AllSpecializations => {
                let specializations = variation_graph.specialization_set(&command.covered_dimension_space_point)?;
                let occupied = aggregate
                    .occupied_dimension_space_points()
                    .into_iter()
                    .filter(|origin| specializations.contains(origin.as_dimension_space_point()))
                    .collect();
                (
                    specializations.intersection(&aggregate.covered_dimension_space_points()),
                    occupied,
                )
            }
            NodeVariantSelectionStrategy::AllVariants => (
                aggregate.covered_dimension_space_points(),
                aggregate.occupied_dimension_space_points(),
            ),
        };

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::NodeAggregateWasRemoved(NodeAggregateWasRemoved {
                content_stream_id: command.content_stream_id.clone(),
                node_aggregate_id: command.node_aggregate_id,
                affected_occupied_dimension_space_points: affected_occupied,
                affected_covered_dimension_space_points: affected_covered,
            })],
        )
    }
}

#[async_trait]
impl CommandHandler for NodeAggregateCommandHandler {
    fn can_handle(&self, command: &Command) -> bool {
        matches!(
            command,
            Command::CreateRootNodeAggregateWithNode(_)
                | Command::CreateNodeAggregateWithNode(_)
                | Command::CreateNodeVariant(_)
                | Command::SetSerializedNodeProperties(_)
                | Command::ChangeNodeAggregateType(_)
                | Command::ChangeNodeAggregateName(_)
                | Command::MoveNodeAggregate(_)
                | Command::RemoveNodeAggregate(_)
        )
    }

    async fn handle(
        &self,
        command: Command,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        match command {
            Command::CreateRootNodeAggregateWithNode(c) => self.handle_create_root_node_aggregate_with_node(c, dependencies),
            Command::CreateNodeAggregateWithNode(c) => self.handle_create_node_aggregate_with_node(c, dependencies),
            Command::CreateNodeVariant(c) => self.handle_create_node_variant(c, dependencies),
            Command::SetSerializedNodeProperties(c) => self.handle_set_serialized_node_properties(c, dependencies),
            Command::ChangeNodeAggregateType(c) => self.handle_change_node_aggregate_type(c, dependencies),
            Command::ChangeNodeAggregateName(c) => self.handle_change_node_aggregate_name(c, dependencies),
            Command::MoveNodeAggregate(c) => self.handle_move_node_aggregate(c, dependencies),
            Command::RemoveNodeAggregate(c) => self.handle_remove_node_aggregate(c, dependencies),
            other => Err(CommandError::UnsupportedCommand(other.name())),
        }
    }
}
