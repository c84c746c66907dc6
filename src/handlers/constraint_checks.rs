//! Precondition checks shared by the command handlers

use crate::aggregate::NodeAggregate;
use crate::commands::{CommandError, CommandHandlerResult};
use crate::dimension::InterDimensionalVariationGraph;
use crate::node_types::{NodeType, NodeTypeManager};
use crate::queries::ContentGraph;
use crate::value_objects::{
    DimensionSpacePoint, NodeAggregateId, NodeName, NodeTypeName, OriginDimensionSpacePoint,
};

pub(crate) fn require_node_type<'a>(
    manager: &'a NodeTypeManager,
    node_type_name: &NodeTypeName,
) -> CommandHandlerResult<&'a NodeType> {
    manager
        .get_node_type(node_type_name)
        .ok_or_else(|| CommandError::NodeTypeNotFound(node_type_name.clone()))
}

pub(crate) fn require_node_type_to_not_be_abstract(node_type: &NodeType) -> CommandHandlerResult<()> {
    if node_type.is_abstract {
        return Err(CommandError::NodeTypeIsAbstract(node_type.name.clone()));
    }
    Ok(())
}

pub(crate) fn require_node_aggregate(
    graph: &ContentGraph,
    node_aggregate_id: &NodeAggregateId,
) -> CommandHandlerResult<NodeAggregate> {
    graph
        .find_node_aggregate_by_id(node_aggregate_id)
        .ok_or_else(|| CommandError::NodeAggregateCurrentlyDoesNotExist {
            node_aggregate_id: node_aggregate_id.clone(),
            content_stream_id: graph.content_stream_id().clone(),
        })
}

pub(crate) fn require_node_aggregate_to_not_exist(
    graph: &ContentGraph,
    node_aggregate_id: &NodeAggregateId,
) -> CommandHandlerResult<()> {
    if graph.find_node_aggregate_by_id(node_aggregate_id).is_some() {
        return Err(CommandError::NodeAggregateCurrentlyExists(node_aggregate_id.clone()));
    }
    Ok(())
}

pub(crate) fn require_node_aggregate_to_not_be_root(aggregate: &NodeAggregate) -> CommandHandlerResult<()> {
    if aggregate.is_root() {
        return Err(CommandError::NodeAggregateIsRoot(aggregate.node_aggregate_id.clone()));
    }
    Ok(())
}

/// The point must name the configured dimensions and lie in the allowed subspace
pub(crate) fn require_dimension_space_point(
    variation_graph: &InterDimensionalVariationGraph,
    point: &DimensionSpacePoint,
) -> CommandHandlerResult<()> {
    variation_graph.validate_point(point)?;
    if !variation_graph.contains(point) {
        return Err(CommandError::DimensionSpacePointNotFound(point.clone()));
    }
    Ok(())
}

pub(crate) fn require_node_aggregate_to_cover(
    aggregate: &NodeAggregate,
    point: &DimensionSpacePoint,
) -> CommandHandlerResult<()> {
    if !aggregate.covers(point) {
        return Err(CommandError::NodeAggregateDoesCurrentlyNotCoverDimensionSpacePoint {
            node_aggregate_id: aggregate.node_aggregate_id.clone(),
            point: point.clone(),
        });
    }
    Ok(())
}

pub(crate) fn require_node_aggregate_to_occupy(
    aggregate: &NodeAggregate,
    origin: &OriginDimensionSpacePoint,
) -> CommandHandlerResult<()> {
    if !aggregate.occupies(origin) {
        return Err(CommandError::NodeAggregateDoesCurrentlyNotOccupyDimensionSpacePoint {
            node_aggregate_id: aggregate.node_aggregate_id.clone(),
            origin: origin.clone(),
        });
    }
    Ok(())
}

/// No child of `parent` other than `except` may carry `node_name`
pub(crate) fn require_node_name_to_be_uncovered(
    graph: &ContentGraph,
    parent: &NodeAggregateId,
    node_name: &NodeName,
    except: Option<&NodeAggregateId>,
) -> CommandHandlerResult<()> {
    let taken = graph
        .find_child_node_aggregates_by_name(parent, node_name)
        .iter()
        .any(|child| Some(&child.node_aggregate_id) != except);
    if taken {
        return Err(CommandError::NodeNameIsAlreadyCovered {
            node_name: node_name.clone(),
            parent_node_aggregate_id: parent.clone(),
        });
    }
    Ok(())
}

/// The parent's type must allow a child of the given type
pub(crate) fn require_constraints_imposed_by_parent_are_met(
    manager: &NodeTypeManager,
    parent: &NodeAggregate,
    child_type: &NodeType,
) -> CommandHandlerResult<()> {
    let parent_type = require_node_type(manager, &parent.node_type_name)?;
    if !parent_type.allows_child_node_type(child_type) {
        return Err(CommandError::NodeConstraintViolation(format!(
            "node type \"{}\" is not allowed below \"{}\" of type \"{}\"",
            child_type.name, parent.node_aggregate_id, parent_type.name
        )));
    }
    Ok(())
}
