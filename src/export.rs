//! Event export and import
//!
//! Exports are JSON lines (`events.jsonl`), one graph event per line:
//! `{"identifier": "<uuid>", "type": "<EventType>", "payload": {...}}`.

use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::commands::CreateRootWorkspace;
use crate::content_repository::{ContentRepository, ContentRepositoryError};
use crate::domain_events::ContentRepositoryEvent;
use crate::events::DomainEvent;
use crate::infrastructure::{EventEnvelope, EventStore, EventStoreError, StreamName};
use crate::value_objects::{ContentStreamId, WorkspaceName};

/// Errors of event export and import
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid event on line {line}: {message}")]
    InvalidEvent { line: usize, message: String },

    #[error(transparent)]
    EventStore(#[from] EventStoreError),

    #[error(transparent)]
    ContentRepository(#[from] ContentRepositoryError),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// One line of an event export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportedEvent {
    pub identifier: Uuid,
    #[serde(rename = "type")]
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl ExportedEvent {
    fn from_envelope(envelope: &EventEnvelope) -> Result<Self, serde_json::Error> {
        let payload = match serde_json::to_value(&envelope.event)? {
            serde_json::Value::Object(mut tagged) => tagged.remove("payload").unwrap_or_default(),
            other => other,
        };
        Ok(Self {
            identifier: envelope.event_id,
            event_type: envelope.event.event_type().to_string(),
            payload,
        })
    }

    fn into_event(self) -> Result<ContentRepositoryEvent, serde_json::Error> {
        serde_json::from_value(serde_json::json!({
            "type": self.event_type,
            "payload": self.payload,
        }))
    }
}

/// Writes the graph events of a content stream as JSON lines
pub struct EventExporter {
    event_store: Arc<dyn EventStore>,
}

impl EventExporter {
    pub fn new(event_store: Arc<dyn EventStore>) -> Self {
        Self { event_store }
    }

    /// Graph events that make up a content stream, inherited ones first
    pub async fn events_of(&self, content_stream_id: &ContentStreamId) -> ExportResult<Vec<EventEnvelope>> {
        // (stream, last inherited version) from the stream itself up to its root ancestor
        let mut lineage: Vec<(Vec<EventEnvelope>, Option<u64>)> = Vec::new();
        let mut current = Some((content_stream_id.clone(), None));
        while let Some((stream, up_to)) = current.take() {
            let events = self.event_store.read_stream(&StreamName::for_content_stream(&stream)).await?;
            current = events.first().and_then(|first| match &first.event {
                ContentRepositoryEvent::ContentStreamWasForked(forked) => Some((
                    forked.source_content_stream_id.clone(),
                    Some(forked.version_of_source_content_stream),
                )),
                _ => None,
            });
            lineage.push((events, up_to));
        }

        Ok(lineage
            .into_iter()
            .rev()
            .flat_map(|(events, up_to)| {
                events
                    .into_iter()
                    .filter(move |envelope| up_to.map_or(true, |version| envelope.version <= version))
            })
            .filter(|envelope| envelope.event.is_graph_event())
            .collect())
    }

    /// Write the content stream's graph events, returning how many were written
    pub async fn export<W: Write>(&self, content_stream_id: &ContentStreamId, mut writer: W) -> ExportResult<usize> {
        let events = self.events_of(content_stream_id).await?;
        for envelope in &events {
            let line = ExportedEvent::from_envelope(envelope).map_err(|e| ExportError::InvalidEvent {
                line: envelope.sequence_number as usize,
                message: e.to_string(),
            })?;
            serde_json::to_writer(&mut writer, &line).map_err(std::io::Error::from)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        info!(content_stream = %content_stream_id, events = events.len(), "Exported events");
        Ok(events.len())
    }
}

/// Replays an event export into a new root workspace
pub struct EventImporter<'a> {
    repository: &'a ContentRepository,
}

impl<'a> EventImporter<'a> {
    pub fn new(repository: &'a ContentRepository) -> Self {
        Self { repository }
    }

    /// Parse an export; blank lines are skipped
    pub fn read_events<R: BufRead>(reader: R) -> ExportResult<Vec<ContentRepositoryEvent>> {
        let mut events = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let invalid = |e: serde_json::Error| ExportError::InvalidEvent {
                line: index + 1,
                message: e.to_string(),
            };
            let exported: ExportedEvent = serde_json::from_str(&line).map_err(invalid)?;
            let event = exported.into_event().map_err(invalid)?;
            if !event.is_graph_event() {
                return Err(ExportError::InvalidEvent {
                    line: index + 1,
                    message: format!("{} is not a content graph event", event.event_type()),
                });
            }
            events.push(event);
        }
        Ok(events)
    }

    /// Import into a new root workspace and return its content stream
    pub async fn import<R: BufRead>(&self, workspace_name: WorkspaceName, reader: R) -> ExportResult<ContentStreamId> {
        let events = Self::read_events(reader)?;
        let content_stream_id = ContentStreamId::create();

        self.repository
            .handle(CreateRootWorkspace {
                workspace_name: workspace_name.clone(),
                new_content_stream_id: content_stream_id.clone(),
            })
            .await?
            .block()
            .await?;

        let count = events.len();
        debug!(content_stream = %content_stream_id, events = count, "Replaying imported events");
        self.repository
            .publish_events(&content_stream_id, events)
            .await?
            .block()
            .await?;

        info!(workspace = %workspace_name, content_stream = %content_stream_id, events = count, "Imported events");
        Ok(content_stream_id)
    }
}
