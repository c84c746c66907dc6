//! Workspaces and content stream versions

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{Projection, ProjectionError, ProjectionResult};
use crate::domain_events::ContentRepositoryEvent;
use crate::infrastructure::EventEnvelope;
use crate::value_objects::{ContentStreamId, WorkspaceName};

/// A named, mutable view onto one content stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub workspace_name: WorkspaceName,
    pub base_workspace_name: Option<WorkspaceName>,
    pub current_content_stream_id: ContentStreamId,
}

impl Workspace {
    pub fn is_root_workspace(&self) -> bool {
        self.base_workspace_name.is_none()
    }
}

/// Lifecycle state of a content stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStream {
    pub content_stream_id: ContentStreamId,
    /// Stream and version this stream was forked from
    pub source: Option<(ContentStreamId, u64)>,
    /// Version of the stream's own event stream
    pub version: u64,
    pub removed: bool,
}

/// Read model of workspaces and content streams
#[derive(Debug, Clone, Default)]
pub struct WorkspaceProjection {
    workspaces: IndexMap<WorkspaceName, Workspace>,
    content_streams: IndexMap<ContentStreamId, ContentStream>,
}

impl WorkspaceProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_workspace(&self, workspace_name: &WorkspaceName) -> Option<&Workspace> {
        self.workspaces.get(workspace_name)
    }

    pub fn workspaces(&self) -> impl Iterator<Item = &Workspace> {
        self.workspaces.values()
    }

    pub fn find_content_stream(&self, content_stream_id: &ContentStreamId) -> Option<&ContentStream> {
        self.content_streams.get(content_stream_id)
    }

    fn content_stream_mut(&mut self, content_stream_id: &ContentStreamId) -> ProjectionResult<&mut ContentStream> {
        self.content_streams
            .get_mut(content_stream_id)
            .ok_or_else(|| ProjectionError::UnknownContentStream(content_stream_id.clone()))
    }

    fn workspace_mut(&mut self, workspace_name: &WorkspaceName) -> ProjectionResult<&mut Workspace> {
        self.workspaces
            .get_mut(workspace_name)
            .ok_or_else(|| ProjectionError::UnknownWorkspace(workspace_name.clone()))
    }
}

impl Projection for WorkspaceProjection {
    fn name(&self) -> &'static str {
        "workspaces"
    }

    fn apply(&mut self, envelope: &EventEnvelope) -> ProjectionResult<()> {
        match &envelope.event {
            ContentRepositoryEvent::ContentStreamWasCreated(event) => {
                self.content_streams.insert(
                    event.content_stream_id.clone(),
                    ContentStream {
                        content_stream_id: event.content_stream_id.clone(),
                        source: None,
                        version: 0,
                        removed: false,
                    },
                );
            }
            ContentRepositoryEvent::ContentStreamWasForked(event) => {
                self.content_streams.insert(
                    event.new_content_stream_id.clone(),
                    ContentStream {
                        content_stream_id: event.new_content_stream_id.clone(),
                        source: Some((
                            event.source_content_stream_id.clone(),
                            event.version_of_source_content_stream,
                        )),
                        version: 0,
                        removed: false,
                    },
                );
            }
            ContentRepositoryEvent::ContentStreamWasRemoved(event) => {
                self.content_stream_mut(&event.content_stream_id)?.removed = true;
            }
            ContentRepositoryEvent::RootWorkspaceWasCreated(event) => {
                self.workspaces.insert(
                    event.workspace_name.clone(),
                    Workspace {
                        workspace_name: event.workspace_name.clone(),
                        base_workspace_name: None,
                        current_content_stream_id: event.new_content_stream_id.clone(),
                    },
                );
            }
            ContentRepositoryEvent::WorkspaceWasCreated(event) => {
                self.workspaces.insert(
                    event.workspace_name.clone(),
                    Workspace {
                        workspace_name: event.workspace_name.clone(),
                        base_workspace_name: Some(event.base_workspace_name.clone()),
                        current_content_stream_id: event.new_content_stream_id.clone(),
                    },
                );
            }
            ContentRepositoryEvent::WorkspaceWasDiscarded(event) => {
                self.workspace_mut(&event.workspace_name)?.current_content_stream_id =
                    event.new_content_stream_id.clone();
            }
            _ => {}
        }

        if let Some(content_stream_id) = envelope.stream_name.content_stream_id() {
            self.content_stream_mut(&content_stream_id)?.version = envelope.version;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{ContentStreamWasCreated, ContentStreamWasForked, RootWorkspaceWasCreated};
    use crate::infrastructure::StreamName;

    fn envelope(sequence_number: u64, stream_name: StreamName, version: u64, event: ContentRepositoryEvent) -> EventEnvelope {
        EventEnvelope {
            sequence_number,
            event_id: uuid::Uuid::new_v4(),
            stream_name,
            version,
            recorded_at: chrono::Utc::now(),
            event,
        }
    }

    #[test]
    fn test_root_workspace_and_fork() {
        let live = ContentStreamId::new("live-cs").unwrap();
        let fork = ContentStreamId::new("fork-cs").unwrap();
        let mut projection = WorkspaceProjection::new();

        projection
            .apply(&envelope(
                1,
                StreamName::for_content_stream(&live),
                1,
                ContentRepositoryEvent::ContentStreamWasCreated(ContentStreamWasCreated {
                    content_stream_id: live.clone(),
                }),
            ))
            .unwrap();
        projection
            .apply(&envelope(
                2,
                StreamName::workspaces(),
                1,
                ContentRepositoryEvent::RootWorkspaceWasCreated(RootWorkspaceWasCreated {
                    workspace_name: WorkspaceName::live(),
                    new_content_stream_id: live.clone(),
                }),
            ))
            .unwrap();
        projection
            .apply(&envelope(
                3,
                StreamName::for_content_stream(&fork),
                1,
                ContentRepositoryEvent::ContentStreamWasForked(ContentStreamWasForked {
                    new_content_stream_id: fork.clone(),
                    source_content_stream_id: live.clone(),
                    version_of_source_content_stream: 1,
                }),
            ))
            .unwrap();

        let workspace = projection.find_workspace(&WorkspaceName::live()).unwrap();
        assert!(workspace.is_root_workspace());
        assert_eq!(workspace.current_content_stream_id, live);
        assert_eq!(projection.find_content_stream(&live).unwrap().version, 1);
        assert_eq!(
            projection.find_content_stream(&fork).unwrap().source,
            Some((live, 1))
        );
    }
}
