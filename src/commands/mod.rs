//! Content repository commands
//!
//! Commands represent intent to modify the content graph. They are processed by command
//! handlers which validate them against the current read models and emit corresponding events.

use serde::{Deserialize, Serialize};

use crate::dimension::DimensionSpaceError;
use crate::value_objects::{
    ContentStreamId, DimensionSpacePoint, NodeAggregateId, NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy,
    NodeName, NodeTypeName, NodeVariantSelectionStrategy, OriginDimensionSpacePoint, PropertyValuesToWrite,
    RelationDistributionStrategy, SerializedPropertyValues, WorkspaceName,
};

/// Create a workspace without base on a fresh, empty content stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRootWorkspace {
    pub workspace_name: WorkspaceName,
    pub new_content_stream_id: ContentStreamId,
}

/// Create a workspace on a fork of its base workspace's current content stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateWorkspace {
    pub workspace_name: WorkspaceName,
    pub base_workspace_name: WorkspaceName,
    pub new_content_stream_id: ContentStreamId,
}

/// Drop all changes of a workspace by re-forking its base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscardWorkspace {
    pub workspace_name: WorkspaceName,
    pub new_content_stream_id: ContentStreamId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForkContentStream {
    pub content_stream_id: ContentStreamId,
    pub source_content_stream_id: ContentStreamId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveContentStream {
    pub content_stream_id: ContentStreamId,
}

/// Create a root node aggregate covering the whole allowed dimension subspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRootNodeAggregateWithNode {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub node_type_name: NodeTypeName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNodeAggregateWithNode {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub node_type_name: NodeTypeName,
    pub origin_dimension_space_point: OriginDimensionSpacePoint,
    pub parent_node_aggregate_id: NodeAggregateId,
    pub node_name: Option<NodeName>,
    #[serde(default)]
    pub initial_property_values: SerializedPropertyValues,
}

/// Create a variant of an aggregate at `target_origin`, copying the variant at `source_origin`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateNodeVariant {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub source_origin: OriginDimensionSpacePoint,
    pub target_origin: OriginDimensionSpacePoint,
}

/// Set or unset properties of exactly one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSerializedNodeProperties {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub origin_dimension_space_point: OriginDimensionSpacePoint,
    pub property_values: PropertyValuesToWrite,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNodeAggregateType {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub new_node_type_name: NodeTypeName,
    #[serde(default)]
    pub strategy: NodeAggregateTypeChangeChildConstraintConflictResolutionStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNodeAggregateName {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub new_node_name: NodeName,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveNodeAggregate {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub dimension_space_point: DimensionSpacePoint,
    pub new_parent_node_aggregate_id: NodeAggregateId,
    #[serde(default)]
    pub relation_distribution_strategy: RelationDistributionStrategy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveNodeAggregate {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
    pub covered_dimension_space_point: DimensionSpacePoint,
    #[serde(default)]
    pub node_variant_selection_strategy: NodeVariantSelectionStrategy,
}

/// Make everything visible at `source` visible at `target` too
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddDimensionShineThrough {
    pub content_stream_id: ContentStreamId,
    pub source: DimensionSpacePoint,
    pub target: DimensionSpacePoint,
}

/// Relabel `source` as `target` throughout a content stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveDimensionSpacePoint {
    pub content_stream_id: ContentStreamId,
    pub source: DimensionSpacePoint,
    pub target: DimensionSpacePoint,
}

/// Let a root aggregate cover the currently allowed dimension subspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateRootNodeAggregateDimensions {
    pub content_stream_id: ContentStreamId,
    pub node_aggregate_id: NodeAggregateId,
}

/// Every command the content repository accepts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    CreateRootWorkspace(CreateRootWorkspace),
    CreateWorkspace(CreateWorkspace),
    DiscardWorkspace(DiscardWorkspace),
    ForkContentStream(ForkContentStream),
    RemoveContentStream(RemoveContentStream),
    CreateRootNodeAggregateWithNode(CreateRootNodeAggregateWithNode),
    CreateNodeAggregateWithNode(CreateNodeAggregateWithNode),
    CreateNodeVariant(CreateNodeVariant),
    SetSerializedNodeProperties(SetSerializedNodeProperties),
    ChangeNodeAggregateType(ChangeNodeAggregateType),
    ChangeNodeAggregateName(ChangeNodeAggregateName),
    MoveNodeAggregate(MoveNodeAggregate),
    RemoveNodeAggregate(RemoveNodeAggregate),
    AddDimensionShineThrough(AddDimensionShineThrough),
    MoveDimensionSpacePoint(MoveDimensionSpacePoint),
    UpdateRootNodeAggregateDimensions(UpdateRootNodeAggregateDimensions),
}

impl Command {
    /// Name of the command, for logging
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRootWorkspace(_) => "CreateRootWorkspace",
            Self::CreateWorkspace(_) => "CreateWorkspace",
            Self::DiscardWorkspace(_) => "DiscardWorkspace",
            Self::ForkContentStream(_) => "ForkContentStream",
            Self::RemoveContentStream(_) => "RemoveContentStream",
            Self::CreateRootNodeAggregateWithNode(_) => "CreateRootNodeAggregateWithNode",
            Self::CreateNodeAggregateWithNode(_) => "CreateNodeAggregateWithNode",
            Self::CreateNodeVariant(_) => "CreateNodeVariant",
            Self::SetSerializedNodeProperties(_) => "SetSerializedNodeProperties",
            Self::ChangeNodeAggregateType(_) => "ChangeNodeAggregateType",
            Self::ChangeNodeAggregateName(_) => "ChangeNodeAggregateName",
            Self::MoveNodeAggregate(_) => "MoveNodeAggregate",
            Self::RemoveNodeAggregate(_) => "RemoveNodeAggregate",
            Self::AddDimensionShineThrough(_) => "AddDimensionShineThrough",
            Self::MoveDimensionSpacePoint(_) => "MoveDimensionSpacePoint",
            Self::UpdateRootNodeAggregateDimensions(_) => "UpdateRootNodeAggregateDimensions",
        }
    }
}

macro_rules! impl_from_command {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Command {
                fn from(command: $variant) -> Self {
                    Command::$variant(command)
                }
            }
        )*
    };
}

impl_from_command!(
    CreateRootWorkspace,
    CreateWorkspace,
    DiscardWorkspace,
    ForkContentStream,
    RemoveContentStream,
    CreateRootNodeAggregateWithNode,
    CreateNodeAggregateWithNode,
    CreateNodeVariant,
    SetSerializedNodeProperties,
    ChangeNodeAggregateType,
    ChangeNodeAggregateName,
    MoveNodeAggregate,
    RemoveNodeAggregate,
    AddDimensionShineThrough,
    MoveDimensionSpacePoint,
    UpdateRootNodeAggregateDimensions,
);

/// Result type for command handling
pub type CommandHandlerResult<T> = Result<T, CommandError>;

/// Precondition violations detected while handling a command
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CommandError {
    #[error("Content stream \"{0}\" does not exist yet")]
    ContentStreamDoesNotExistYet(ContentStreamId),

    #[error("Content stream \"{0}\" already exists")]
    ContentStreamAlreadyExists(ContentStreamId),

    #[error("Content stream \"{0}\" is closed")]
    ContentStreamIsClosed(ContentStreamId),

    #[error("Workspace \"{0}\" does not exist")]
    WorkspaceDoesNotExist(WorkspaceName),

    #[error("Workspace \"{0}\" already exists")]
    WorkspaceAlreadyExists(WorkspaceName),

    #[error("Workspace \"{0}\" has no base workspace")]
    WorkspaceHasNoBaseWorkspace(WorkspaceName),

    #[error("Node aggregate \"{node_aggregate_id}\" does currently not exist in content stream \"{content_stream_id}\"")]
    NodeAggregateCurrentlyDoesNotExist {
        node_aggregate_id: NodeAggregateId,
        content_stream_id: ContentStreamId,
    },

    #[error("Node aggregate \"{0}\" already exists")]
    NodeAggregateCurrentlyExists(NodeAggregateId),

    #[error("Node type \"{0}\" not found")]
    NodeTypeNotFound(NodeTypeName),

    #[error("Node type \"{0}\" is abstract")]
    NodeTypeIsAbstract(NodeTypeName),

    #[error("Node type \"{0}\" is of type root")]
    NodeTypeIsOfTypeRoot(NodeTypeName),

    #[error("Node type \"{0}\" is not of type root")]
    NodeTypeIsNotOfTypeRoot(NodeTypeName),

    #[error("A root node aggregate of type \"{0}\" already exists")]
    RootNodeAggregateTypeIsAlreadyOccupied(NodeTypeName),

    #[error("Node aggregate \"{0}\" is not a root node aggregate")]
    NodeAggregateIsNotRoot(NodeAggregateId),

    #[error("Node aggregate \"{0}\" is a root node aggregate")]
    NodeAggregateIsRoot(NodeAggregateId),

    #[error("Dimension space point {0} is not in the allowed dimension subspace")]
    DimensionSpacePointNotFound(DimensionSpacePoint),

    #[error("Node aggregate \"{node_aggregate_id}\" does currently not occupy {origin}")]
    NodeAggregateDoesCurrentlyNotOccupyDimensionSpacePoint {
        node_aggregate_id: NodeAggregateId,
        origin: OriginDimensionSpacePoint,
    },

    #[error("Node aggregate \"{node_aggregate_id}\" does currently not cover {point}")]
    NodeAggregateDoesCurrentlyNotCoverDimensionSpacePoint {
        node_aggregate_id: NodeAggregateId,
        point: DimensionSpacePoint,
    },

    #[error("Node aggregate \"{node_aggregate_id}\" already occupies {origin}")]
    DimensionSpacePointIsAlreadyOccupied {
        node_aggregate_id: NodeAggregateId,
        origin: OriginDimensionSpacePoint,
    },

    #[error("Dimension space point {0} is already in use")]
    DimensionSpacePointIsAlreadyInUse(DimensionSpacePoint),

    #[error("{generalization} is no generalization of {specialization}")]
    DimensionSpacePointIsNoGeneralization {
        generalization: DimensionSpacePoint,
        specialization: DimensionSpacePoint,
    },

    #[error("Node name \"{node_name}\" is already taken below \"{parent_node_aggregate_id}\"")]
    NodeNameIsAlreadyCovered {
        node_name: NodeName,
        parent_node_aggregate_id: NodeAggregateId,
    },

    #[error("Node constraint violation: {0}")]
    NodeConstraintViolation(String),

    #[error("Node aggregate \"{new_parent_node_aggregate_id}\" is \"{node_aggregate_id}\" or one of its descendants")]
    NodeAggregateIsDescendant {
        node_aggregate_id: NodeAggregateId,
        new_parent_node_aggregate_id: NodeAggregateId,
    },

    #[error(transparent)]
    DimensionSpace(#[from] DimensionSpaceError),

    #[error("Concurrent modification: {0}")]
    ConcurrentModification(String),

    #[error("Command {0} is not supported by this handler")]
    UnsupportedCommand(&'static str),
}
