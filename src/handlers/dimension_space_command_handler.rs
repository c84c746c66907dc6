//! Adjusting content to a changed dimension configuration

use async_trait::async_trait;

use super::constraint_checks::*;
use super::{CommandHandler, CommandHandlingDependencies, EventsToPublish};
use crate::commands::*;
use crate::domain_events::ContentRepositoryEvent;
use crate::events::{DimensionShineThroughWasAdded, DimensionSpacePointWasMoved, RootNodeAggregateDimensionsWereUpdated};
use crate::queries::ContentGraph;
use crate::value_objects::{DimensionSpacePoint, OriginDimensionSpacePoint};

/// Handles commands on the dimension space of a content stream
#[derive(Debug, Default)]
pub struct DimensionSpaceCommandHandler;

impl DimensionSpaceCommandHandler {
    pub fn new() -> Self {
        Self
    }

    /// No aggregate may cover or occupy the point yet
    fn require_dimension_space_point_to_be_unused(graph: &ContentGraph, point: &DimensionSpacePoint) -> CommandHandlerResult<()> {
        let origin = OriginDimensionSpacePoint::from_dimension_space_point(point.clone());
        let in_use = graph
            .find_node_aggregates()
            .iter()
            .any(|aggregate| aggregate.covers(point) || aggregate.occupies(&origin));
        if in_use {
            return Err(CommandError::DimensionSpacePointIsAlreadyInUse(point.clone()));
        }
        Ok(())
    }

    fn handle_add_dimension_shine_through(
        &self,
        command: AddDimensionShineThrough,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        let variation_graph = dependencies.variation_graph();
        require_dimension_space_point(variation_graph, &command.source)?;
        require_dimension_space_point(variation_graph, &command.target)?;
        if !variation_graph.is_generalization_of(&command.source, &command.target) {
            return Err(CommandError::DimensionSpacePointIsNoGeneralization {
                generalization: command.source,
                specialization: command.target,
            });
        }
        Self::require_dimension_space_point_to_be_unused(&graph, &command.target)?;

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::DimensionShineThroughWasAdded(DimensionShineThroughWasAdded {
                content_stream_id: command.content_stream_id.clone(),
                source: command.source,
                target: command.target,
            })],
        )
    }

    fn handle_move_dimension_space_point(
        &self,
        command: MoveDimensionSpacePoint,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        require_dimension_space_point(dependencies.variation_graph(), &command.target)?;
        Self::require_dimension_space_point_to_be_unused(&graph, &command.target)?;

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::DimensionSpacePointWasMoved(DimensionSpacePointWasMoved {
                content_stream_id: command.content_stream_id.clone(),
                source: command.source,
                target: command.target,
            })],
        )
    }

    fn handle_update_root_node_aggregate_dimensions(
        &self,
        command: UpdateRootNodeAggregateDimensions,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let graph = dependencies.content_graph(&command.content_stream_id)?;
        let aggregate = require_node_aggregate(&graph, &command.node_aggregate_id)?;
        if !aggregate.is_root() {
            return Err(CommandError::NodeAggregateIsNotRoot(command.node_aggregate_id));
        }

        dependencies.publish_to_content_stream(
            &command.content_stream_id,
            vec![ContentRepositoryEvent::RootNodeAggregateDimensionsWereUpdated(
                RootNodeAggregateDimensionsWereUpdated {
                    content_stream_id: command.content_stream_id.clone(),
                    node_aggregate_id: command.node_aggregate_id,
                    covered_dimension_space_points: dependencies
                        .variation_graph()
                        .allowed_dimension_subspace()
                        .clone(),
                },
            )],
        )
    }
}

#[async_trait]
impl CommandHandler for DimensionSpaceCommandHandler {
    fn can_handle(&self, command: &Command) -> bool {
        matches!(
            command,
            Command::AddDimensionShineThrough(_)
                | Command::MoveDimensionSpacePoint(_)
                | Command::UpdateRootNodeAggregateDimensions(_)
        )
    }

    async fn handle(
        &self,
        command: Command,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        match command {
            Command::AddDimensionShineThrough(c) => self.handle_add_dimension_shine_through(c, dependencies),
            Command::MoveDimensionSpacePoint(c) => self.handle_move_dimension_space_point(c, dependencies),
            Command::UpdateRootNodeAggregateDimensions(c) => {
                self.handle_update_root_node_aggregate_dimensions(c, dependencies)
            }
            other => Err(CommandError::UnsupportedCommand(other.name())),
        }
    }
}
