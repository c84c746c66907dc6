//! Workspace and content stream lifecycle events

use serde::{Deserialize, Serialize};

use super::DomainEvent;
use crate::value_objects::{ContentStreamId, WorkspaceName};

/// A workspace without base was created on a fresh content stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootWorkspaceWasCreated {
    pub workspace_name: WorkspaceName,
    pub new_content_stream_id: ContentStreamId,
}

/// A workspace was created on a fork of its base workspace's content stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceWasCreated {
    pub workspace_name: WorkspaceName,
    pub base_workspace_name: WorkspaceName,
    pub new_content_stream_id: ContentStreamId,
}

/// A workspace dropped its changes and now points at a fresh fork of its base
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceWasDiscarded {
    pub workspace_name: WorkspaceName,
    pub new_content_stream_id: ContentStreamId,
    pub previous_content_stream_id: ContentStreamId,
}

/// An empty content stream was created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStreamWasCreated {
    pub content_stream_id: ContentStreamId,
}

/// A content stream was forked from another one at the given version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStreamWasForked {
    pub new_content_stream_id: ContentStreamId,
    pub source_content_stream_id: ContentStreamId,
    /// Version of the source stream the fork shares events up to
    pub version_of_source_content_stream: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentStreamWasRemoved {
    pub content_stream_id: ContentStreamId,
}

impl DomainEvent for RootWorkspaceWasCreated {
    fn event_type(&self) -> &'static str {
        "RootWorkspaceWasCreated"
    }

    fn subject(&self) -> String {
        format!("workspace.{}", self.workspace_name)
    }
}

impl DomainEvent for WorkspaceWasCreated {
    fn event_type(&self) -> &'static str {
        "WorkspaceWasCreated"
    }

    fn subject(&self) -> String {
        format!("workspace.{}", self.workspace_name)
    }
}

impl DomainEvent for WorkspaceWasDiscarded {
    fn event_type(&self) -> &'static str {
        "WorkspaceWasDiscarded"
    }

    fn subject(&self) -> String {
        format!("workspace.{}", self.workspace_name)
    }
}

impl DomainEvent for ContentStreamWasCreated {
    fn event_type(&self) -> &'static str {
        "ContentStreamWasCreated"
    }

    fn subject(&self) -> String {
        format!("content-stream.{}", self.content_stream_id)
    }
}

impl DomainEvent for ContentStreamWasForked {
    fn event_type(&self) -> &'static str {
        "ContentStreamWasForked"
    }

    fn subject(&self) -> String {
        format!("content-stream.{}", self.new_content_stream_id)
    }
}

impl DomainEvent for ContentStreamWasRemoved {
    fn event_type(&self) -> &'static str {
        "ContentStreamWasRemoved"
    }

    fn subject(&self) -> String {
        format!("content-stream.{}", self.content_stream_id)
    }
}
