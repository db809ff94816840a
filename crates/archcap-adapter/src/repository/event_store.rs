//! In-Memory Event Store and the event-sourced capability repository
//!
//! Streams are keyed by capability id. Every append carries the version the
//! writer loaded; a stream that moved on in the meantime rejects the write
//! with `ConcurrencyError` and nothing is appended.
//!
//! ```text
//!   save(aggregate) ──▶ append(id, committed_version, events)
//!                          │ ok
//!                          ▼
//!                  EventDispatcher::dispatch   (lock released)
//! ```

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use archcap_domain::{Capability, CapabilityEvent, CapabilityId, CapabilityRepository, RepositoryError};
use archcap_usecase::EventDispatcher;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One persisted event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    /// 1-based position in the stream
    pub version: u64,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<CapabilityId, Vec<StoredEvent>>>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `events`, returning the new stream version
    pub fn append(
        &self,
        stream_id: &CapabilityId,
        expected_version: u64,
        events: &[CapabilityEvent],
    ) -> Result<u64, RepositoryError> {
        let mut encoded = Vec::with_capacity(events.len());
        for (offset, event) in events.iter().enumerate() {
            let payload = serde_json::to_value(event)
                .map_err(|e| RepositoryError::persistence(format!("Failed to encode event: {e}")))?;
            encoded.push(StoredEvent {
                version: expected_version + offset as u64 + 1,
                event_type: event.event_type().to_string(),
                payload,
                recorded_at: Utc::now(),
            });
        }

        let mut streams = self
            .streams
            .write()
            .map_err(|_| RepositoryError::persistence("Failed to acquire write lock"))?;
        let stream = streams.entry(stream_id.clone()).or_default();
        let actual = stream.len() as u64;
        if actual != expected_version {
            return Err(RepositoryError::ConcurrencyError {
                id: stream_id.to_string(),
                expected: expected_version,
                actual,
            });
        }
        stream.extend(encoded);
        Ok(stream.len() as u64)
    }

    /// Raw records of a stream, empty when unknown
    pub fn read_stream(&self, stream_id: &CapabilityId) -> Result<Vec<StoredEvent>, RepositoryError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))?;
        Ok(streams.get(stream_id).cloned().unwrap_or_default())
    }

    /// Decoded events of a stream
    pub fn load(&self, stream_id: &CapabilityId) -> Result<Vec<CapabilityEvent>, RepositoryError> {
        self.read_stream(stream_id)?
            .into_iter()
            .map(|stored| {
                serde_json::from_value(stored.payload).map_err(|e| {
                    RepositoryError::persistence(format!(
                        "Failed to decode {} at version {}: {e}",
                        stored.event_type, stored.version
                    ))
                })
            })
            .collect()
    }

    pub fn stream_version(&self, stream_id: &CapabilityId) -> Result<u64, RepositoryError> {
        Ok(self.read_stream(stream_id)?.len() as u64)
    }

    pub fn count(&self) -> Result<usize, RepositoryError> {
        let streams = self
            .streams
            .read()
            .map_err(|_| RepositoryError::persistence("Failed to acquire read lock"))?;
        Ok(streams.values().map(Vec::len).sum())
    }
}

/// Capability repository over the event store
pub struct EventSourcedCapabilityRepository {
    store: InMemoryEventStore,
    dispatcher: Arc<EventDispatcher>,
}

impl EventSourcedCapabilityRepository {
    pub fn new(store: InMemoryEventStore, dispatcher: Arc<EventDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    pub fn store(&self) -> &InMemoryEventStore {
        &self.store
    }
}

impl CapabilityRepository for EventSourcedCapabilityRepository {
    fn get_by_id(&self, id: &CapabilityId) -> Result<Capability, RepositoryError> {
        let history = self.store.load(id)?;
        if history.is_empty() {
            return Err(RepositoryError::not_found("Capability", id.as_str()));
        }
        Capability::load_from_history(history).map_err(|e| RepositoryError::persistence(e.to_string()))
    }

    fn save(&self, capability: &mut Capability) -> Result<(), RepositoryError> {
        if capability.uncommitted_events().is_empty() {
            return Ok(());
        }
        let version = self.store.append(
            capability.id(),
            capability.committed_version(),
            capability.uncommitted_events(),
        )?;
        let events = capability.take_uncommitted_events();
        debug!(
            capability_id = %capability.id(),
            version,
            events = events.len(),
            "Capability events committed"
        );

        self.dispatcher.dispatch(&events);
        Ok(())
    }
}
