use std::pin::Pin;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::TryStreamExt;

use crate::{AggregateId, EventEnvelope, EventStoreError, Result, Version};

/// A lazily consumed, finite stream of events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventEnvelope>> + Send>>;

/// Core trait for event store implementations.
///
/// Every entity owns one append-only stream ordered by [`Version`]. There is
/// no ordering across streams. All implementations must be thread-safe
/// (Send + Sync).
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Appends a batch of events to the stream of `aggregate_id`.
    ///
    /// The batch is committed atomically: either every event becomes visible
    /// to readers or none does. Fails with `ConcurrencyConflict` when the
    /// stream head is not `expected_version`, and with `InvalidSequence`
    /// unless the batch is non-empty, belongs to this stream, and is
    /// numbered contiguously from `expected_version + 1`.
    ///
    /// Returns the new head version.
    async fn append(
        &self,
        aggregate_id: AggregateId,
        expected_version: Version,
        events: Vec<EventEnvelope>,
    ) -> Result<Version>;

    /// Reads the stream of `aggregate_id` in ascending version order,
    /// starting at `from_version`.
    ///
    /// Fails with `UnknownEntity` if nothing was ever committed to the
    /// stream. Reading past the head of an existing stream yields an empty
    /// stream. Each call is an independent iteration.
    async fn read(&self, aggregate_id: AggregateId, from_version: Version) -> Result<EventStream>;

    /// Returns true once at least one event has been committed for `aggregate_id`.
    async fn stream_exists(&self, aggregate_id: AggregateId) -> Result<bool>;

    /// Returns the version of the last committed event, or None for an
    /// unknown stream.
    async fn head_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>>;
}

/// Extension trait providing convenience methods for event stores.
#[async_trait]
pub trait EventStoreExt: EventStore {
    /// Reads and collects the whole stream of `aggregate_id`.
    async fn read_all(&self, aggregate_id: AggregateId) -> Result<Vec<EventEnvelope>> {
        self.read(aggregate_id, Version::first())
            .await?
            .try_collect()
            .await
    }

    /// Appends a single event at `expected_version + 1`.
    async fn append_one(
        &self,
        aggregate_id: AggregateId,
        expected_version: Version,
        event: EventEnvelope,
    ) -> Result<Version> {
        self.append(aggregate_id, expected_version, vec![event])
            .await
    }
}

// Blanket implementation for all EventStore implementations
impl<T: EventStore + ?Sized> EventStoreExt for T {}

/// Checks that `events` can be appended to `aggregate_id` on top of
/// `expected_version`.
///
/// Performs no I/O; store implementations call it before taking any lock.
pub fn validate_batch(
    aggregate_id: AggregateId,
    expected_version: Version,
    events: &[EventEnvelope],
) -> Result<()> {
    let Some(first) = events.first() else {
        return Err(EventStoreError::invalid_sequence(
            aggregate_id,
            "cannot append an empty batch",
        ));
    };

    let mut expected = expected_version;
    for event in events {
        if event.aggregate_id != aggregate_id {
            return Err(EventStoreError::invalid_sequence(
                aggregate_id,
                format!("event {} belongs to stream {}", event.event_id, event.aggregate_id),
            ));
        }
        if event.aggregate_type != first.aggregate_type {
            return Err(EventStoreError::invalid_sequence(
                aggregate_id,
                format!(
                    "mixed aggregate types {} and {}",
                    first.aggregate_type, event.aggregate_type
                ),
            ));
        }

        expected = expected.next();
        if event.version != expected {
            return Err(EventStoreError::invalid_sequence(
                aggregate_id,
                format!("expected version {expected}, got {}", event.version),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(aggregate_id: AggregateId, version: i64) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Portfolio")
            .event_type("PortfolioCreated")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({}))
            .build()
            .unwrap()
    }

    #[test]
    fn accepts_contiguous_batch() {
        let id = AggregateId::new();
        let batch = vec![envelope(id, 3), envelope(id, 4), envelope(id, 5)];
        assert!(validate_batch(id, Version::new(2), &batch).is_ok());
    }

    #[test]
    fn rejects_empty_batch() {
        let id = AggregateId::new();
        let result = validate_batch(id, Version::initial(), &[]);
        assert!(matches!(result, Err(EventStoreError::InvalidSequence { .. })));
    }

    #[test]
    fn rejects_gap_after_expected_version() {
        let id = AggregateId::new();
        let batch = vec![envelope(id, 3)];
        let result = validate_batch(id, Version::first(), &batch);
        assert!(matches!(result, Err(EventStoreError::InvalidSequence { .. })));
    }

    #[test]
    fn rejects_gap_inside_batch() {
        let id = AggregateId::new();
        let batch = vec![envelope(id, 1), envelope(id, 3)];
        let result = validate_batch(id, Version::initial(), &batch);
        assert!(matches!(result, Err(EventStoreError::InvalidSequence { .. })));
    }

    #[test]
    fn rejects_foreign_stream() {
        let id = AggregateId::new();
        let batch = vec![envelope(id, 1), envelope(AggregateId::new(), 2)];
        let result = validate_batch(id, Version::initial(), &batch);
        assert!(matches!(result, Err(EventStoreError::InvalidSequence { .. })));
    }

    #[test]
    fn rejects_mixed_aggregate_types() {
        let id = AggregateId::new();
        let mut second = envelope(id, 2);
        second.aggregate_type = "TradingCalendar".to_string();
        let batch = vec![envelope(id, 1), second];
        let result = validate_batch(id, Version::initial(), &batch);
        assert!(matches!(result, Err(EventStoreError::InvalidSequence { .. })));
    }
}
