//! Workspace and content stream lifecycle

use async_trait::async_trait;
use tracing::info;

use super::{CommandHandler, CommandHandlingDependencies, EventsToPublish};
use crate::commands::{
    Command, CommandError, CommandHandlerResult, CreateRootWorkspace, CreateWorkspace, DiscardWorkspace,
    ForkContentStream, RemoveContentStream,
};
use crate::domain_events::ContentRepositoryEvent;
use crate::events::{
    ContentStreamWasCreated, ContentStreamWasForked, ContentStreamWasRemoved, RootWorkspaceWasCreated,
    WorkspaceWasCreated, WorkspaceWasDiscarded,
};
use crate::infrastructure::{ExpectedVersion, StreamName};
use crate::value_objects::ContentStreamId;

/// Handles workspace and content stream commands
#[derive(Debug, Default)]
pub struct WorkspaceCommandHandler;

impl WorkspaceCommandHandler {
    pub fn new() -> Self {
        Self
    }

    fn require_content_stream_to_not_exist(
        dependencies: &CommandHandlingDependencies,
        content_stream_id: &ContentStreamId,
    ) -> CommandHandlerResult<()> {
        if dependencies.find_content_stream(content_stream_id).is_some() {
            return Err(CommandError::ContentStreamAlreadyExists(content_stream_id.clone()));
        }
        Ok(())
    }

    /// Events forking `source` into `new_content_stream_id`
    fn fork(
        dependencies: &CommandHandlingDependencies,
        source: &ContentStreamId,
        new_content_stream_id: &ContentStreamId,
    ) -> CommandHandlerResult<EventsToPublish> {
        Self::require_content_stream_to_not_exist(dependencies, new_content_stream_id)?;
        let source_stream = dependencies.require_open_content_stream(source)?;
        Ok(EventsToPublish::new(
            StreamName::for_content_stream(new_content_stream_id),
            vec![ContentRepositoryEvent::ContentStreamWasForked(ContentStreamWasForked {
                new_content_stream_id: new_content_stream_id.clone(),
                source_content_stream_id: source.clone(),
                version_of_source_content_stream: source_stream.version,
            })],
            ExpectedVersion::NoStream,
        ))
    }

    fn handle_create_root_workspace(
        &self,
        command: CreateRootWorkspace,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        if dependencies.find_workspace(&command.workspace_name).is_some() {
            return Err(CommandError::WorkspaceAlreadyExists(command.workspace_name));
        }
        Self::require_content_stream_to_not_exist(dependencies, &command.new_content_stream_id)?;
        info!(workspace = %command.workspace_name, content_stream = %command.new_content_stream_id, "Creating root workspace");

        Ok(vec![
            EventsToPublish::new(
                StreamName::for_content_stream(&command.new_content_stream_id),
                vec![ContentRepositoryEvent::ContentStreamWasCreated(ContentStreamWasCreated {
                    content_stream_id: command.new_content_stream_id.clone(),
                })],
                ExpectedVersion::NoStream,
            ),
            EventsToPublish::new(
                StreamName::workspaces(),
                vec![ContentRepositoryEvent::RootWorkspaceWasCreated(RootWorkspaceWasCreated {
                    workspace_name: command.workspace_name,
                    new_content_stream_id: command.new_content_stream_id,
                })],
                ExpectedVersion::Any,
            ),
        ])
    }

    fn handle_create_workspace(
        &self,
        command: CreateWorkspace,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        if dependencies.find_workspace(&command.workspace_name).is_some() {
            return Err(CommandError::WorkspaceAlreadyExists(command.workspace_name));
        }
        let base = dependencies.require_workspace(&command.base_workspace_name)?;
        let fork = Self::fork(dependencies, &base.current_content_stream_id, &command.new_content_stream_id)?;
        info!(
            workspace = %command.workspace_name,
            base = %command.base_workspace_name,
            content_stream = %command.new_content_stream_id,
            "Creating workspace"
        );

        Ok(vec![
            fork,
            EventsToPublish::new(
                StreamName::workspaces(),
                vec![ContentRepositoryEvent::WorkspaceWasCreated(WorkspaceWasCreated {
                    workspace_name: command.workspace_name,
                    base_workspace_name: command.base_workspace_name,
                    new_content_stream_id: command.new_content_stream_id,
                })],
                ExpectedVersion::Any,
            ),
        ])
    }

    fn handle_discard_workspace(
        &self,
        command: DiscardWorkspace,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let workspace = dependencies.require_workspace(&command.workspace_name)?;
        let base_workspace_name = workspace
            .base_workspace_name
            .clone()
            .ok_or_else(|| CommandError::WorkspaceHasNoBaseWorkspace(command.workspace_name.clone()))?;
        let base = dependencies.require_workspace(&base_workspace_name)?;
        let fork = Self::fork(dependencies, &base.current_content_stream_id, &command.new_content_stream_id)?;
        let previous = workspace.current_content_stream_id;
        let previous_version = dependencies.expected_version(&previous)?;
        info!(workspace = %command.workspace_name, discarded = %previous, "Discarding workspace");

        Ok(vec![
            fork,
            EventsToPublish::new(
                StreamName::workspaces(),
                vec![ContentRepositoryEvent::WorkspaceWasDiscarded(WorkspaceWasDiscarded {
                    workspace_name: command.workspace_name,
                    new_content_stream_id: command.new_content_stream_id,
                    previous_content_stream_id: previous.clone(),
                })],
                ExpectedVersion::Any,
            ),
            EventsToPublish::new(
                StreamName::for_content_stream(&previous),
                vec![ContentRepositoryEvent::ContentStreamWasRemoved(ContentStreamWasRemoved {
                    content_stream_id: previous.clone(),
                })],
                previous_version,
            ),
        ])
    }

    fn handle_fork_content_stream(
        &self,
        command: ForkContentStream,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        Ok(vec![Self::fork(
            dependencies,
            &command.source_content_stream_id,
            &command.content_stream_id,
        )?])
    }

    fn handle_remove_content_stream(
        &self,
        command: RemoveContentStream,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        let expected_version = dependencies.expected_version(&command.content_stream_id)?;
        Ok(vec![EventsToPublish::new(
            StreamName::for_content_stream(&command.content_stream_id),
            vec![ContentRepositoryEvent::ContentStreamWasRemoved(ContentStreamWasRemoved {
                content_stream_id: command.content_stream_id.clone(),
            })],
            expected_version,
        )])
    }
}

#[async_trait]
impl CommandHandler for WorkspaceCommandHandler {
    fn can_handle(&self, command: &Command) -> bool {
        matches!(
            command,
            Command::CreateRootWorkspace(_)
                | Command::CreateWorkspace(_)
                | Command::DiscardWorkspace(_)
                | Command::ForkContentStream(_)
                | Command::RemoveContentStream(_)
        )
    }

    async fn handle(
        &self,
        command: Command,
        dependencies: &CommandHandlingDependencies,
    ) -> CommandHandlerResult<Vec<EventsToPublish>> {
        match command {
            Command::CreateRootWorkspace(command) => self.handle_create_root_workspace(command, dependencies),
            Command::CreateWorkspace(command) => self.handle_create_workspace(command, dependencies),
            Command::DiscardWorkspace(command) => self.handle_discard_workspace(command, dependencies),
            Command::ForkContentStream(command) => self.handle_fork_content_stream(command, dependencies),
            Command::RemoveContentStream(command) => self.handle_remove_content_stream(command, dependencies),
            other => Err(CommandError::UnsupportedCommand(other.name())),
        }
    }
}
