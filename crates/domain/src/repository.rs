//! Loading and persisting aggregates through an event store.

use chrono::Utc;
use common::AggregateId;
use event_store::{EventEnvelope, EventStore, EventStoreError, Version};
use futures_util::TryStreamExt;

use crate::aggregate::{Aggregate, DomainEvent, VersionedEvent};
use crate::error::DomainError;

/// Rebuilds aggregates from their event streams and appends the events
/// they raise.
///
/// The repository never retries: a `ConcurrencyConflict` on save is handed
/// back to the caller, which decides whether to reload and re-run its
/// command against fresher state.
pub struct Repository<S: EventStore> {
    store: S,
}

impl<S: EventStore> Repository<S> {
    /// Creates a repository over the given store handle.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying event store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns true if `id` has a committed event stream.
    pub async fn exists(&self, id: AggregateId) -> Result<bool, DomainError> {
        Ok(self.store.stream_exists(id).await?)
    }

    /// Loads an aggregate by replaying its whole stream.
    ///
    /// Fails with `NotFound` when nothing was ever committed for `id`.
    #[tracing::instrument(skip(self), fields(aggregate_type = A::aggregate_type()))]
    pub async fn load<A: Aggregate>(&self, id: AggregateId) -> Result<A, DomainError> {
        let not_found = || DomainError::NotFound {
            aggregate_type: A::aggregate_type(),
            aggregate_id: id,
        };

        if !self.store.stream_exists(id).await? {
            return Err(not_found());
        }

        let mut events = match self.store.read(id, Version::first()).await {
            Ok(events) => events,
            Err(EventStoreError::UnknownEntity(_)) => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };

        let mut aggregate = A::new(id);
        let mut replayed: u64 = 0;
        while let Some(envelope) = events.try_next().await? {
            aggregate.apply_event(decode::<A>(envelope)?)?;
            replayed += 1;
        }

        metrics::counter!("repository_loads_total").increment(1);
        metrics::counter!("repository_events_replayed_total").increment(replayed);
        tracing::debug!(%id, version = %aggregate.version(), replayed, "aggregate loaded");
        Ok(aggregate)
    }

    /// Appends the aggregate's uncommitted events.
    ///
    /// The expected stream head is the aggregate's version minus the number
    /// of pending events. The buffer is cleared only once the append has
    /// committed; on any error it is left untouched. Returns the stream head
    /// after the save, which is the current version when nothing was pending.
    #[tracing::instrument(skip_all, fields(aggregate_type = A::aggregate_type()))]
    pub async fn save<A: Aggregate>(&self, aggregate: &mut A) -> Result<Version, DomainError> {
        let pending = aggregate.uncommitted_events();
        if pending.is_empty() {
            return Ok(aggregate.version());
        }

        let id = aggregate.id();
        let expected = aggregate.committed_version();
        let envelopes = pending
            .iter()
            .map(encode::<A>)
            .collect::<Result<Vec<_>, _>>()?;
        let count = envelopes.len();

        let head = self.store.append(id, expected, envelopes).await?;
        aggregate.clear_uncommitted_events();

        metrics::counter!("repository_saves_total").increment(1);
        tracing::debug!(%id, %expected, %head, count, "aggregate saved");
        Ok(head)
    }

    /// Loads an aggregate, runs `command` against it and saves the result.
    ///
    /// Validation errors from `command` are returned before anything is
    /// written.
    pub async fn execute<A, F>(&self, id: AggregateId, command: F) -> Result<A, DomainError>
    where
        A: Aggregate,
        F: FnOnce(&mut A) -> Result<(), A::Error>,
        DomainError: From<A::Error>,
    {
        let mut aggregate: A = self.load(id).await?;
        command(&mut aggregate)?;
        self.save(&mut aggregate).await?;
        Ok(aggregate)
    }
}

fn encode<A: Aggregate>(event: &VersionedEvent<A::Event>) -> Result<EventEnvelope, DomainError> {
    let envelope = EventEnvelope::builder()
        .aggregate_id(event.aggregate_id())
        .aggregate_type(A::aggregate_type())
        .event_type(event.payload().event_type())
        .version(event.version())
        .timestamp(Utc::now())
        .payload(event.payload())?
        .build()?;
    Ok(envelope)
}

fn decode<A: Aggregate>(envelope: EventEnvelope) -> Result<VersionedEvent<A::Event>, DomainError> {
    if envelope.aggregate_type != A::aggregate_type() {
        return Err(DomainError::AggregateTypeMismatch {
            aggregate_id: envelope.aggregate_id,
            expected: A::aggregate_type(),
            found: envelope.aggregate_type,
        });
    }

    let payload: A::Event = serde_json::from_value(envelope.payload)?;
    Ok(VersionedEvent::new(
        envelope.aggregate_id,
        envelope.version,
        payload,
    ))
}
