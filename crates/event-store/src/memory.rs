use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Version,
    store::{EventStore, EventStream, validate_batch},
};

type StreamHandle = Arc<RwLock<Vec<EventEnvelope>>>;

/// In-memory event store.
///
/// Each entity's stream sits behind its own lock. The outer map lock is only
/// held long enough to look a stream up (or create it), so appends to
/// different entities never wait on each other, while the version check and
/// commit for one entity happen under that stream's write lock.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    streams: Arc<RwLock<HashMap<AggregateId, StreamHandle>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored across all streams.
    pub async fn event_count(&self) -> usize {
        let streams: Vec<StreamHandle> = self.streams.read().await.values().cloned().collect();
        let mut count = 0;
        for entry in streams {
            count += entry.read().await.len();
        }
        count
    }

    async fn stream(&self, aggregate_id: AggregateId) -> Option<StreamHandle> {
        self.streams.read().await.get(&aggregate_id).cloned()
    }

    async fn stream_or_insert(&self, aggregate_id: AggregateId) -> StreamHandle {
        if let Some(entry) = self.stream(aggregate_id).await {
            return entry;
        }
        self.streams
            .write()
            .await
            .entry(aggregate_id)
            .or_default()
            .clone()
    }
}

fn head_of(events: &[EventEnvelope]) -> Version {
    events
        .last()
        .map(|e| e.version)
        .unwrap_or(Version::initial())
}

fn conflict(aggregate_id: AggregateId, expected: Version, actual: Version) -> EventStoreError {
    metrics::counter!("event_store_conflicts_total").increment(1);
    tracing::warn!(%aggregate_id, %expected, %actual, "append rejected");
    EventStoreError::ConcurrencyConflict {
        aggregate_id,
        expected,
        actual,
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[tracing::instrument(skip(self, events), fields(batch = events.len()))]
    async fn append(
        &self,
        aggregate_id: AggregateId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<Version> {
        validate_batch(aggregate_id, expected_version, &events)?;

        // Only a writer expecting an empty stream may create one.
        let entry = if expected_version.is_initial() {
            self.stream_or_insert(aggregate_id).await
        } else {
            match self.stream(aggregate_id).await {
                Some(entry) => entry,
                None => return Err(conflict(aggregate_id, expected_version, Version::initial())),
            }
        };
        let mut committed = entry.write().await;

        let actual = head_of(&committed);
        if actual != expected_version {
            return Err(conflict(aggregate_id, expected_version, actual));
        }

        let new_head = head_of(&events);
        committed.extend(events);

        metrics::counter!("event_store_appends_total").increment(1);
        tracing::debug!(%aggregate_id, head = %new_head, "events committed");
        Ok(new_head)
    }

    async fn read(&self, aggregate_id: AggregateId, from_version: Version) -> Result<EventStream> {
        let entry = self
            .stream(aggregate_id)
            .await
            .ok_or(EventStoreError::UnknownEntity(aggregate_id))?;

        let committed = entry.read().await;
        if committed.is_empty() {
            return Err(EventStoreError::UnknownEntity(aggregate_id));
        }

        // Versions are contiguous from 1, so version N sits at index N - 1.
        let skip = usize::try_from(from_version.as_i64().saturating_sub(1)).unwrap_or(0);
        let events: Vec<EventEnvelope> = committed.iter().skip(skip).cloned().collect();

        Ok(Box::pin(stream::iter(events.into_iter().map(Ok))))
    }

    async fn stream_exists(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(self.head_version(aggregate_id).await?.is_some())
    }

    async fn head_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let Some(entry) = self.stream(aggregate_id).await else {
            return Ok(None);
        };
        let committed = entry.read().await;
        Ok(committed.last().map(|e| e.version))
    }
}
