//! Content repository command handlers
//!
//! Command handlers validate commands against the current read models and
//! decide which events to publish. They never write to the event store
//! themselves; the content repository appends what they return.

mod constraint_checks;
mod dimension_space_command_handler;
mod node_aggregate_command_handler;
mod workspace_command_handler;

pub use dimension_space_command_handler::DimensionSpaceCommandHandler;
pub use node_aggregate_command_handler::NodeAggregateCommandHandler;
pub use workspace_command_handler::WorkspaceCommandHandler;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;

use crate::commands::{Command, CommandError, CommandHandlerResult};
use crate::dimension::InterDimensionalVariationGraph;
use crate::domain_events::ContentRepositoryEvent;
use crate::infrastructure::{ExpectedVersion, StreamName};
use crate::node_types::NodeTypeManager;
use crate::projections::{ContentRepositoryProjections, ContentStream, Workspace};
use crate::queries::ContentGraph;
use crate::value_objects::{ContentStreamId, WorkspaceName};

/// Events a handler wants appended to one stream
#[derive(Debug, Clone, PartialEq)]
pub struct EventsToPublish {
    pub stream_name: StreamName,
    pub events: Vec<ContentRepositoryEvent>,
    pub expected_version: ExpectedVersion,
}

impl EventsToPublish {
    pub fn new(stream_name: StreamName, events: Vec<ContentRepositoryEvent>, expected_version: ExpectedVersion) -> Self {
        Self {
            stream_name,
            events,
            expected_version,
        }
    }
}

/// Trait for handling content repository commands
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Whether this handler is responsible for the command
    fn can_handle(&self, command: &Command) -> bool;

    /// Validate the command and decide the events to publish
    async fn handle(
        &self,
        command: Command,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>>;
}

/// Read access handlers need while deciding
#[derive(Clone)]
pub struct CommandHandlingDependencies {
    projections: Arc<RwLock<ContentRepositoryProjections>>,
    node_type_manager: Arc<NodeTypeManager>,
    variation_graph: Arc<InterDimensionalVariationGraph>,
}

impl CommandHandlingDependencies {
    pub fn new(
        projections: Arc<RwLock<ContentRepositoryProjections>>,
        node_type_manager: Arc<NodeTypeManager>,
        variation_graph: Arc<InterDimensionalVariationGraph>,
    ) -> Self {
        Self {
            projections,
            node_type_manager,
            variation_graph,
        }
    }

    pub fn node_type_manager(&self) -> &NodeTypeManager {
        &self.node_type_manager
    }

    pub fn variation_graph(&self) -> &InterDimensionalVariationGraph {
        &self.variation_graph
    }

    pub fn find_workspace(&self, workspace_name: &WorkspaceName) -> Option<Workspace> {
        self.projections.read().workspaces.find_workspace(workspace_name).cloned()
    }

    pub fn require_workspace(&self, workspace_name: &WorkspaceName) -> CommandHandlerResult<Workspace> {
        self.find_workspace(workspace_name)
            .ok_or_else(|| CommandError::WorkspaceDoesNotExist(workspace_name.clone()))
    }

    pub fn find_content_stream(&self, content_stream_id: &ContentStreamId) -> Option<ContentStream> {
        self.projections
            .read()
            .workspaces
            .find_content_stream(content_stream_id)
            .cloned()
    }

    /// The content stream, which must exist and not be removed
    pub fn require_open_content_stream(&self, content_stream_id: &ContentStreamId) -> CommandHandlerResult<ContentStream> {
        let content_stream = self
            .find_content_stream(content_stream_id)
            .ok_or_else(|| CommandError::ContentStreamDoesNotExistYet(content_stream_id.clone()))?;
        if content_stream.removed {
            return Err(CommandError::ContentStreamIsClosed(content_stream_id.clone()));
        }
        Ok(content_stream)
    }

    /// Graph of an open content stream
    pub fn content_graph(&self, content_stream_id: &ContentStreamId) -> CommandHandlerResult<ContentGraph> {
        self.require_open_content_stream(content_stream_id)?;
        self.projections
            .read()
            .content_graph
            .content_graph(content_stream_id)
            .ok_or_else(|| CommandError::ContentStreamDoesNotExistYet(content_stream_id.clone()))
    }

    /// Version a write to the content stream must expect
    pub fn expected_version(&self, content_stream_id: &ContentStreamId) -> CommandHandlerResult<ExpectedVersion> {
        let content_stream = self.require_open_content_stream(content_stream_id)?;
        Ok(ExpectedVersion::Exactly(content_stream.version))
    }

    /// Publish graph events to the content stream they concern
    pub(crate) fn publish_to_content_stream(
        &self,
        content_stream_id: &ContentStreamId,
        events: Vec<ContentRepositoryEvent>,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        Ok(vec![EventsToPublish::new(
            StreamName::for_content_stream(content_stream_id),
            events,
            self.expected_version(content_stream_id)?,
        )])
    }
}
