//! Append-only event store with optimistic concurrency

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;
use uuid::Uuid;

use crate::domain_events::ContentRepositoryEvent;
use crate::events::DomainEvent;
use crate::value_objects::ContentStreamId;

const CONTENT_STREAM_PREFIX: &str = "content-stream:";

/// Name of an event stream
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamName(String);

impl StreamName {
    /// The stream holding workspace lifecycle events
    pub fn workspaces() -> Self {
        Self("workspaces".to_string())
    }

    pub fn for_content_stream(content_stream_id: &ContentStreamId) -> Self {
        Self(format!("{CONTENT_STREAM_PREFIX}{content_stream_id}"))
    }

    /// The content stream this stream belongs to, if it is a content stream
    pub fn content_stream_id(&self) -> Option<ContentStreamId> {
        self.0
            .strip_prefix(CONTENT_STREAM_PREFIX)
            .and_then(|id| ContentStreamId::new(id).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Version a stream must be at for an append to succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpectedVersion {
    #[default]
    Any,
    NoStream,
    Exactly(u64),
}

/// A stored event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Position in the global order of all streams, starting at 1
    pub sequence_number: u64,
    pub event_id: Uuid,
    pub stream_name: StreamName,
    /// Position within the stream, starting at 1
    pub version: u64,
    pub recorded_at: DateTime<Utc>,
    pub event: ContentRepositoryEvent,
}

/// Errors from event storage
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EventStoreError {
    #[error("Expected stream \"{stream}\" at {expected:?}, but it is at version {actual:?}")]
    ConcurrencyConflict {
        stream: StreamName,
        expected: ExpectedVersion,
        actual: Option<u64>,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type EventStoreResult<T> = Result<T, EventStoreError>;

/// Storage of all content repository events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Append events to a stream, checking its version first
    async fn append(
        &self,
        stream_name: &StreamName,
        events: Vec<ContentRepositoryEvent>,
        expected_version: ExpectedVersion,
    ) -> EventStoreResult<Vec<EventEnvelope>>;

    /// All events of one stream, in order
    async fn read_stream(&self, stream_name: &StreamName) -> EventStoreResult<Vec<EventEnvelope>>;

    /// All events with a sequence number greater than `sequence_number`
    async fn read_all_after(&self, sequence_number: u64) -> EventStoreResult<Vec<EventEnvelope>>;

    /// Current version of a stream, `None` if it has no events
    async fn stream_version(&self, stream_name: &StreamName) -> EventStoreResult<Option<u64>>;

    /// Sequence number of the last stored event, 0 if empty
    async fn last_sequence_number(&self) -> EventStoreResult<u64>;
}

#[derive(Default)]
struct InMemoryEventStoreState {
    events: Vec<EventEnvelope>,
    stream_versions: HashMap<StreamName, u64>,
}

/// In-memory event store
#[derive(Default)]
pub struct InMemoryEventStore {
    state: RwLock<InMemoryEventStoreState>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn append(
        &self,
        stream_name: &StreamName,
        events: Vec<ContentRepositoryEvent>,
        expected_version: ExpectedVersion,
    ) -> EventStoreResult<Vec<EventEnvelope>> {
        let mut state = self.state.write();
        let actual = state.stream_versions.get(stream_name).copied();
        let matches = match expected_version {
            ExpectedVersion::Any => true,
            ExpectedVersion::NoStream => actual.is_none(),
            ExpectedVersion::Exactly(version) => actual == Some(version),
        };
        if !matches {
            return Err(EventStoreError::ConcurrencyConflict {
                stream: stream_name.clone(),
                expected: expected_version,
                actual,
            });
        }

        let mut version = actual.unwrap_or(0);
        let mut sequence_number = state.events.len() as u64;
        let mut appended = Vec::with_capacity(events.len());
        for event in events {
            version += 1;
            sequence_number += 1;
            debug!(
                stream = %stream_name,
                version,
                sequence_number,
                event_type = event.event_type(),
                "Appending event"
            );
            appended.push(EventEnvelope {
                sequence_number,
                event_id: Uuid::new_v4(),
                stream_name: stream_name.clone(),
                version,
                recorded_at: Utc::now(),
                event,
            });
        }
        state.events.extend(appended.iter().cloned());
        if !appended.is_empty() {
            state.stream_versions.insert(stream_name.clone(), version);
        }
        Ok(appended)
    }

    async fn read_stream(&self, stream_name: &StreamName) -> EventStoreResult<Vec<EventEnvelope>> {
        Ok(self
            .state
            .read()
            .events
            .iter()
            .filter(|envelope| &envelope.stream_name == stream_name)
            .cloned()
            .collect())
    }

    async fn read_all_after(&self, sequence_number: u64) -> EventStoreResult<Vec<EventEnvelope>> {
        let state = self.state.read();
        let start = (sequence_number as usize).min(state.events.len());
        Ok(state.events[start..].to_vec())
    }

    async fn stream_version(&self, stream_name: &StreamName) -> EventStoreResult<Option<u64>> {
        Ok(self.state.read().stream_versions.get(stream_name).copied())
    }

    async fn last_sequence_number(&self) -> EventStoreResult<u64> {
        Ok(self.state.read().events.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ContentStreamWasCreated;

    fn created(id: &str) -> ContentRepositoryEvent {
        ContentRepositoryEvent::ContentStreamWasCreated(ContentStreamWasCreated {
            content_stream_id: ContentStreamId::new(id).unwrap(),
        })
    }

    #[test]
    fn test_stream_names() {
        let id = ContentStreamId::new("abc").unwrap();
        let stream = StreamName::for_content_stream(&id);
        assert_eq!(stream.as_str(), "content-stream:abc");
        assert_eq!(stream.content_stream_id(), Some(id));
        assert_eq!(StreamName::workspaces().content_stream_id(), None);
    }

    #[tokio::test]
    async fn test_append_assigns_sequence_numbers_and_versions() {
        let store = InMemoryEventStore::new();
        let a = StreamName::for_content_stream(&ContentStreamId::new("a").unwrap());
        let b = StreamName::for_content_stream(&ContentStreamId::new("b").unwrap());

        store.append(&a, vec![created("a")], ExpectedVersion::NoStream).await.unwrap();
        let appended = store.append(&b, vec![created("b")], ExpectedVersion::NoStream).await.unwrap();
        assert_eq!(appended[0].sequence_number, 2);
        assert_eq!(appended[0].version, 1);

        let appended = store.append(&a, vec![created("a")], ExpectedVersion::Exactly(1)).await.unwrap();
        assert_eq!(appended[0].sequence_number, 3);
        assert_eq!(appended[0].version, 2);

        assert_eq!(store.stream_version(&a).await.unwrap(), Some(2));
        assert_eq!(store.read_stream(&a).await.unwrap().len(), 2);
        assert_eq!(store.read_all_after(1).await.unwrap().len(), 2);
        assert_eq!(store.last_sequence_number().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_expected_version_mismatch_is_rejected() {
        let store = InMemoryEventStore::new();
        let stream = StreamName::for_content_stream(&ContentStreamId::new("a").unwrap());
        store.append(&stream, vec![created("a")], ExpectedVersion::NoStream).await.unwrap();

        let result = store.append(&stream, vec![created("a")], ExpectedVersion::NoStream).await;
        match result {
            Err(EventStoreError::ConcurrencyConflict { actual, .. }) => assert_eq!(actual, Some(1)),
            _ => panic!("Expected ConcurrencyConflict error"),
        }

        let result = store.append(&stream, vec![created("a")], ExpectedVersion::Exactly(5)).await;
        assert!(result.is_err());
        assert_eq!(store.last_sequence_number().await.unwrap(), 1);
    }
}
