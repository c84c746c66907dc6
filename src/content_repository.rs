//! The content repository: write entry point and read access
//!
//! `handle` is the only way to change content. It dispatches a command to
//! the responsible handler, appends the decided events and returns a
//! [`CommandResult`]. Blocking on the result guarantees that every read
//! issued afterwards observes the command's effects.

use chrono::Utc;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::commands::{Command, CommandError};
use crate::config::{CatchUpMode, ContentRepositorySettings};
use crate::dimension::InterDimensionalVariationGraph;
use crate::domain_events::ContentRepositoryEvent;
use crate::handlers::{
    CommandHandler, CommandHandlingDependencies, DimensionSpaceCommandHandler, NodeAggregateCommandHandler,
    WorkspaceCommandHandler,
};
use crate::infrastructure::{EventEnvelope, EventStore, EventStoreError, ExpectedVersion, InMemoryEventStore, StreamName};
use crate::node_types::NodeTypeManager;
use crate::projections::{ContentRepositoryProjections, ContentStream, ProjectionError, Workspace};
use crate::queries::ContentGraph;
use crate::value_objects::{ContentStreamId, WorkspaceName};

/// Errors surfaced by the content repository
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContentRepositoryError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("Projection catch-up failed: {0}")]
    CatchUpFailed(String),

    #[error("Workspace \"{0}\" does not exist")]
    WorkspaceNotFound(WorkspaceName),

    #[error("Content stream \"{0}\" does not exist")]
    ContentStreamNotFound(ContentStreamId),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

pub type ContentRepositoryResult<T> = Result<T, ContentRepositoryError>;

/// Position the read models have reached
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatchUpState {
    /// Sequence number of the last applied event
    pub checkpoint: u64,
    /// Set once applying an event failed
    pub failure: Option<String>,
}

/// Outcome of a handled command
#[derive(Debug)]
pub struct CommandResult {
    events: Vec<EventEnvelope>,
    target_sequence_number: u64,
    state: watch::Receiver<CatchUpState>,
}

impl CommandResult {
    fn new(events: Vec<EventEnvelope>, target_sequence_number: u64, state: watch::Receiver<CatchUpState>) -> Self {
        Self {
            events,
            target_sequence_number,
            state,
        }
    }

    /// The events the command appended
    pub fn events(&self) -> &[EventEnvelope] {
        &self.events
    }

    /// Wait until the read models contain the command's events
    pub async fn block(mut self) -> ContentRepositoryResult<()> {
        loop {
            {
                let state = self.state.borrow_and_update();
                if let Some(failure) = &state.failure {
                    return Err(ContentRepositoryError::CatchUpFailed(failure.clone()));
                }
                if state.checkpoint >= self.target_sequence_number {
                    return Ok(());
                }
            }
            self.state
                .changed()
                .await
                .map_err(|_| ContentRepositoryError::CatchUpFailed("catch-up has stopped".to_string()))?;
        }
    }
}

/// Applies new events from the store to the read models
struct CatchUp {
    event_store: Arc<dyn EventStore>,
    projections: Arc<RwLock<ContentRepositoryProjections>>,
    state: Arc<watch::Sender<CatchUpState>>,
}

impl CatchUp {
    async fn run(&self) -> ContentRepositoryResult<u64> {
        match self.apply_new_events().await {
            Ok(checkpoint) => {
                self.state.send_modify(|state| {
                    state.checkpoint = checkpoint;
                    state.failure = None;
                });
                Ok(checkpoint)
            }
            Err(error) => {
                warn!(%error, "Projection catch-up failed");
                self.state.send_modify(|state| state.failure = Some(error.to_string()));
                Err(error)
            }
        }
    }

    async fn apply_new_events(&self) -> ContentRepositoryResult<u64> {
        let checkpoint = self.projections.read().checkpoint;
        let envelopes = self.event_store.read_all_after(checkpoint).await?;

        for envelope in &envelopes {
            debug!(
                sequence_number = envelope.sequence_number,
                stream = %envelope.stream_name,
                "Projecting event"
            );
        }
        let mut projections = self.projections.write();
        projections.apply_all(&envelopes)?;
        Ok(projections.checkpoint)
    }
}

/// A content repository over one event store
pub struct ContentRepository {
    event_store: Arc<dyn EventStore>,
    projections: Arc<RwLock<ContentRepositoryProjections>>,
    node_type_manager: Arc<NodeTypeManager>,
    variation_graph: Arc<InterDimensionalVariationGraph>,
    handlers: Vec<Box<dyn CommandHandler>>,
    catch_up: Arc<CatchUp>,
    catch_up_trigger: Option<mpsc::UnboundedSender<()>>,
    command_lock: Mutex<()>,
}

impl ContentRepository {
    /// Create a repository over a fresh in-memory event store
    pub fn new(settings: ContentRepositorySettings) -> ContentRepositoryResult<Self> {
        Self::with_event_store(settings, Arc::new(InMemoryEventStore::new()))
    }

    /// Create a repository over an existing event store
    ///
    /// Existing events are projected on the first `handle` or `catch_up`.
    pub fn with_event_store(
        settings: ContentRepositorySettings,
        event_store: Arc<dyn EventStore>,
    ) -> ContentRepositoryResult<Self> {
        let variation_graph = Arc::new(settings.variation_graph()?);
        let node_type_manager = Arc::new(settings.node_type_manager()?);
        let projections = Arc::new(RwLock::new(ContentRepositoryProjections::new()));
        let (state, _) = watch::channel(CatchUpState::default());
        let catch_up = Arc::new(CatchUp {
            event_store: Arc::clone(&event_store),
            projections: Arc::clone(&projections),
            state: Arc::new(state),
        });

        let catch_up_trigger = match settings.catch_up {
            CatchUpMode::Synchronous => None,
            CatchUpMode::Asynchronous => match tokio::runtime::Handle::try_current() {
                Ok(runtime) => Some(Self::spawn_catch_up(&runtime, Arc::clone(&catch_up))),
                Err(_) => {
                    warn!("No tokio runtime available, falling back to synchronous catch-up");
                    None
                }
            },
        };

        let handlers: Vec<Box<dyn CommandHandler>> = vec![
            Box::new(WorkspaceCommandHandler::new()),
            Box::new(NodeAggregateCommandHandler::new()),
            Box::new(DimensionSpaceCommandHandler::new()),
        ];

        info!(
            dimension_space_points = variation_graph.allowed_dimension_subspace().len(),
            node_types = node_type_manager.node_types().count(),
            asynchronous = catch_up_trigger.is_some(),
            "Content repository initialized"
        );

        Ok(Self {
            event_store,
            projections,
            node_type_manager,
            variation_graph,
            handlers,
            catch_up,
            catch_up_trigger,
            command_lock: Mutex::new(()),
        })
    }

    fn spawn_catch_up(runtime: &tokio::runtime::Handle, catch_up: Arc<CatchUp>) -> mpsc::UnboundedSender<()> {
        let (trigger, mut triggered) = mpsc::unbounded_channel::<()>();
        runtime.spawn(async move {
            while triggered.recv().await.is_some() {
                // coalesce triggers that piled up meanwhile
                while triggered.try_recv().is_ok() {}
                let _ = catch_up.run().await;
            }
        });
        trigger
    }

    /// Handle a command and append the events it decides on
    pub async fn handle(&self, command: impl Into<Command>) -> ContentRepositoryResult<CommandResult> {
        let command = command.into();
        let _guard = self.command_lock.lock().await;
        self.wait_for_current_state().await?;

        let handler = self
            .handlers
            .iter()
            .find(|handler| handler.can_handle(&command))
            .ok_or(CommandError::UnsupportedCommand(command.name()))?;
        debug!(command = command.name(), "Handling command");

        let dependencies = CommandHandlingDependencies::new(
            Arc::clone(&self.projections),
            Arc::clone(&self.node_type_manager),
            Arc::clone(&self.variation_graph),
        );
        let to_publish = handler.handle(command, &dependencies).await?;

        let mut appended = Vec::new();
        for publish in to_publish {
            let envelopes = self
                .event_store
                .append(&publish.stream_name, publish.events, publish.expected_version)
                .await
                .map_err(|error| match error {
                    EventStoreError::ConcurrencyConflict { .. } => {
                        ContentRepositoryError::Command(CommandError::ConcurrentModification(error.to_string()))
                    }
                    other => ContentRepositoryError::EventStore(other),
                })?;
            appended.extend(envelopes);
        }
        let target = match appended.last() {
            Some(envelope) => envelope.sequence_number,
            None => self.projections.read().checkpoint,
        };

        self.trigger_catch_up().await;
        Ok(CommandResult::new(appended, target, self.catch_up.state.subscribe()))
    }

    /// Append already decided graph events to a content stream, e.g. on import
    ///
    /// The events are projected onto a copy of the read models first and
    /// rejected without appending anything if any of them does not apply.
    pub async fn publish_events(
        &self,
        content_stream_id: &ContentStreamId,
        events: Vec<ContentRepositoryEvent>,
    ) -> ContentRepositoryResult<CommandResult> {
        let _guard = self.command_lock.lock().await;
        self.wait_for_current_state().await?;

        let content_stream = self
            .find_content_stream(content_stream_id)
            .ok_or_else(|| ContentRepositoryError::ContentStreamNotFound(content_stream_id.clone()))?;
        if content_stream.removed {
            return Err(CommandError::ContentStreamIsClosed(content_stream_id.clone()).into());
        }
        let events: Vec<ContentRepositoryEvent> = events
            .into_iter()
            .map(|event| event.with_content_stream_id(content_stream_id))
            .collect();
        self.try_projecting(content_stream_id, content_stream.version, &events)
            .await?;

        let appended = self
            .event_store
            .append(
                &StreamName::for_content_stream(content_stream_id),
                events,
                ExpectedVersion::Exactly(content_stream.version),
            )
            .await?;
        let target = match appended.last() {
            Some(envelope) => envelope.sequence_number,
            None => self.projections.read().checkpoint,
        };

        self.trigger_catch_up().await;
        Ok(CommandResult::new(appended, target, self.catch_up.state.subscribe()))
    }

    async fn try_projecting(
        &self,
        content_stream_id: &ContentStreamId,
        stream_version: u64,
        events: &[ContentRepositoryEvent],
    ) -> ContentRepositoryResult<()> {
        let last_sequence_number = self.event_store.last_sequence_number().await?;
        let stream_name = StreamName::for_content_stream(content_stream_id);
        let envelopes: Vec<EventEnvelope> = events
            .iter()
            .zip(1u64..)
            .map(|(event, offset)| EventEnvelope {
                sequence_number: last_sequence_number + offset,
                event_id: Uuid::new_v4(),
                stream_name: stream_name.clone(),
                version: stream_version + offset,
                recorded_at: Utc::now(),
                event: event.clone(),
            })
            .collect();

        let mut trial = self.projections.read().clone();
        trial.apply_all(&envelopes).map_err(|error| {
            warn!(content_stream = %content_stream_id, %error, "Rejecting events that do not apply");
            ContentRepositoryError::Projection(error)
        })
    }

    async fn trigger_catch_up(&self) {
        match &self.catch_up_trigger {
            Some(trigger) => {
                if trigger.send(()).is_err() {
                    warn!("Catch-up task has stopped");
                }
            }
            // failures are recorded in the catch-up state and surface in `block`
            None => {
                let _ = self.catch_up.run().await;
            }
        }
    }

    /// Make sure the read models reflect every stored event before deciding
    async fn wait_for_current_state(&self) -> ContentRepositoryResult<()> {
        if self.catch_up_trigger.is_none() {
            self.catch_up().await?;
            return Ok(());
        }
        let target = self.event_store.last_sequence_number().await?;
        self.trigger_catch_up().await;
        CommandResult::new(Vec::new(), target, self.catch_up.state.subscribe())
            .block()
            .await
    }

    /// Project all events not yet applied and return the new checkpoint
    pub async fn catch_up(&self) -> ContentRepositoryResult<u64> {
        self.catch_up.run().await
    }

    /// Graph of the content stream a workspace currently points to
    pub fn content_graph(&self, workspace_name: &WorkspaceName) -> ContentRepositoryResult<ContentGraph> {
        let workspace = self
            .find_workspace(workspace_name)
            .ok_or_else(|| ContentRepositoryError::WorkspaceNotFound(workspace_name.clone()))?;
        self.content_graph_for_content_stream(&workspace.current_content_stream_id)
    }

    pub fn content_graph_for_content_stream(
        &self,
        content_stream_id: &ContentStreamId,
    ) -> ContentRepositoryResult<ContentGraph> {
        self.projections
            .read()
            .content_graph
            .content_graph(content_stream_id)
            .ok_or_else(|| ContentRepositoryError::ContentStreamNotFound(content_stream_id.clone()))
    }

    pub fn find_workspace(&self, workspace_name: &WorkspaceName) -> Option<Workspace> {
        self.projections.read().workspaces.find_workspace(workspace_name).cloned()
    }

    pub fn find_workspaces(&self) -> Vec<Workspace> {
        self.projections.read().workspaces.workspaces().cloned().collect()
    }

    pub fn find_content_stream(&self, content_stream_id: &ContentStreamId) -> Option<ContentStream> {
        self.projections
            .read()
            .workspaces
            .find_content_stream(content_stream_id)
            .cloned()
    }

    /// Sequence number the read models have reached
    pub fn checkpoint(&self) -> u64 {
        self.projections.read().checkpoint
    }

    pub fn node_type_manager(&self) -> &NodeTypeManager {
        &self.node_type_manager
    }

    pub fn variation_graph(&self) -> &InterDimensionalVariationGraph {
        &self.variation_graph
    }

    pub fn event_store(&self) -> Arc<dyn EventStore> {
        Arc::clone(&self.event_store)
    }
}

impl fmt::Debug for ContentRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentRepository")
            .field("checkpoint", &self.checkpoint())
            .field("asynchronous", &self.catch_up_trigger.is_some())
            .finish_non_exhaustive()
    }
}
