//! Core aggregate and domain event traits.

use std::fmt::Debug;

use common::AggregateId;
use event_store::Version;
use serde::{Serialize, de::DeserializeOwned};

use crate::error::DomainError;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + DeserializeOwned + Send + Sync + Clone + Debug {
    /// Returns the event type name.
    ///
    /// This is the type tag stored next to the payload in the event store.
    fn event_type(&self) -> &'static str;
}

/// A domain event bound to the aggregate and version it produced.
///
/// Read-only once constructed. Two versioned events are equal when they
/// share aggregate, version and event type; payloads are not compared.
#[derive(Debug, Clone)]
pub struct VersionedEvent<E> {
    aggregate_id: AggregateId,
    version: Version,
    payload: E,
}

impl<E> VersionedEvent<E> {
    pub fn new(aggregate_id: AggregateId, version: Version, payload: E) -> Self {
        Self {
            aggregate_id,
            version,
            payload,
        }
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    /// The aggregate version that results from applying this event.
    pub fn version(&self) -> Version {
        self.version
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: DomainEvent> PartialEq for VersionedEvent<E> {
    fn eq(&self, other: &Self) -> bool {
        self.aggregate_id == other.aggregate_id
            && self.version == other.version
            && self.payload.event_type() == other.payload.event_type()
    }
}

impl<E: DomainEvent> Eq for VersionedEvent<E> {}

/// Identity, version and pending events shared by every aggregate.
///
/// Concrete aggregates embed one of these and expose it through
/// [`Aggregate::root`]; only the provided methods of [`Aggregate`] move the
/// version or touch the pending buffer.
#[derive(Debug, Clone)]
pub struct AggregateRoot<E> {
    id: AggregateId,
    version: Version,
    uncommitted: Vec<VersionedEvent<E>>,
}

impl<E> AggregateRoot<E> {
    /// A root at version 0 with nothing pending.
    pub fn new(id: AggregateId) -> Self {
        Self {
            id,
            version: Version::initial(),
            uncommitted: Vec::new(),
        }
    }

    pub fn id(&self) -> AggregateId {
        self.id
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn uncommitted(&self) -> &[VersionedEvent<E>] {
        &self.uncommitted
    }
}

/// Trait for aggregates in an event-sourced system.
///
/// In event sourcing, aggregates:
/// - Are rebuilt by replaying their stream through [`apply_event`](Aggregate::apply_event)
/// - Validate commands against current state, then [`raise`](Aggregate::raise) events
/// - Mutate state only inside [`mutate`](Aggregate::mutate), which must be pure and deterministic
pub trait Aggregate: Send + Sync + Sized {
    /// The closed set of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// The validation error returned by this aggregate's commands.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the aggregate type name stored alongside every event.
    fn aggregate_type() -> &'static str;

    /// Creates the blank, version-0 instance that replay starts from.
    fn new(id: AggregateId) -> Self;

    fn root(&self) -> &AggregateRoot<Self::Event>;

    fn root_mut(&mut self) -> &mut AggregateRoot<Self::Event>;

    /// Applies the state change described by `event`.
    ///
    /// Must not fail and must not touch the version: events are facts that
    /// have already been validated.
    fn mutate(&mut self, event: &Self::Event);

    fn id(&self) -> AggregateId {
        self.root().id
    }

    /// Current version, including events that are not yet persisted.
    fn version(&self) -> Version {
        self.root().version
    }

    /// Version of the last event known to be in the store.
    fn committed_version(&self) -> Version {
        let root = self.root();
        root.version.rewind(root.uncommitted.len())
    }

    /// Applies a stored event during replay.
    ///
    /// The event must belong to this aggregate and carry exactly the next
    /// version; applying the same event twice is rejected. The version is
    /// updated after the state change.
    fn apply_event(&mut self, event: VersionedEvent<Self::Event>) -> Result<(), DomainError> {
        let aggregate_id = self.id();
        if event.aggregate_id != aggregate_id {
            return Err(DomainError::ForeignEvent {
                aggregate_id,
                event_aggregate_id: event.aggregate_id,
            });
        }

        let expected = self.version().next();
        if event.version != expected {
            return Err(DomainError::OutOfSequence {
                aggregate_id,
                expected,
                found: event.version,
            });
        }

        self.mutate(&event.payload);
        self.root_mut().version = event.version;
        Ok(())
    }

    /// Records a new event produced by a command.
    ///
    /// The event is stamped with the next version, applied to in-memory
    /// state and appended to the uncommitted buffer, in that order.
    fn raise(&mut self, payload: Self::Event) {
        let event = VersionedEvent::new(self.id(), self.version().next(), payload);
        self.mutate(&event.payload);

        let root = self.root_mut();
        root.version = event.version;
        root.uncommitted.push(event);
    }

    /// Events raised since the last successful save, in causal order.
    fn uncommitted_events(&self) -> &[VersionedEvent<Self::Event>] {
        &self.root().uncommitted
    }

    fn clear_uncommitted_events(&mut self) {
        self.root_mut().uncommitted.clear();
    }

    /// Moves the pending events out of the aggregate.
    fn take_uncommitted_events(&mut self) -> Vec<VersionedEvent<Self::Event>> {
        std::mem::take(&mut self.root_mut().uncommitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    enum CounterEvent {
        Opened { label: String },
        Incremented { by: i32 },
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            match self {
                CounterEvent::Opened { .. } => "CounterOpened",
                CounterEvent::Incremented { .. } => "CounterIncremented",
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("counter error")]
    struct CounterError;

    struct Counter {
        root: AggregateRoot<CounterEvent>,
        label: String,
        value: i32,
    }

    impl Aggregate for Counter {
        type Event = CounterEvent;
        type Error = CounterError;

        fn aggregate_type() -> &'static str {
            "Counter"
        }

        fn new(id: AggregateId) -> Self {
            Self {
                root: AggregateRoot::new(id),
                label: String::new(),
                value: 0,
            }
        }

        fn root(&self) -> &AggregateRoot<CounterEvent> {
            &self.root
        }

        fn root_mut(&mut self) -> &mut AggregateRoot<CounterEvent> {
            &mut self.root
        }

        fn mutate(&mut self, event: &CounterEvent) {
            match event {
                CounterEvent::Opened { label } => self.label = label.clone(),
                CounterEvent::Incremented { by } => self.value += by,
            }
        }
    }

    #[test]
    fn raise_applies_and_buffers() {
        let mut counter = Counter::new(AggregateId::new());
        counter.raise(CounterEvent::Opened {
            label: "hits".to_string(),
        });
        counter.raise(CounterEvent::Incremented { by: 3 });

        assert_eq!(counter.label, "hits");
        assert_eq!(counter.value, 3);
        assert_eq!(counter.version(), Version::new(2));
        assert_eq!(counter.committed_version(), Version::initial());

        let versions: Vec<_> = counter
            .uncommitted_events()
            .iter()
            .map(|e| e.version())
            .collect();
        assert_eq!(versions, vec![Version::new(1), Version::new(2)]);
    }

    #[test]
    fn take_drains_buffer_but_keeps_version() {
        let mut counter = Counter::new(AggregateId::new());
        counter.raise(CounterEvent::Incremented { by: 1 });

        let taken = counter.take_uncommitted_events();
        assert_eq!(taken.len(), 1);
        assert!(counter.uncommitted_events().is_empty());
        assert_eq!(counter.version(), Version::first());
        assert_eq!(counter.committed_version(), Version::first());
    }

    #[test]
    fn replay_matches_raised_state() {
        let id = AggregateId::new();
        let mut original = Counter::new(id);
        original.raise(CounterEvent::Opened {
            label: "hits".to_string(),
        });
        original.raise(CounterEvent::Incremented { by: 2 });
        original.raise(CounterEvent::Incremented { by: 5 });

        let mut replayed = Counter::new(id);
        for event in original.take_uncommitted_events() {
            replayed.apply_event(event).unwrap();
        }

        assert_eq!(replayed.label, original.label);
        assert_eq!(replayed.value, original.value);
        assert_eq!(replayed.version(), original.version());
        assert!(replayed.uncommitted_events().is_empty());
    }

    #[test]
    fn applying_same_event_twice_is_rejected() {
        let id = AggregateId::new();
        let event = VersionedEvent::new(id, Version::first(), CounterEvent::Incremented { by: 1 });

        let mut counter = Counter::new(id);
        counter.apply_event(event.clone()).unwrap();
        let result = counter.apply_event(event);

        assert!(matches!(result, Err(DomainError::OutOfSequence { .. })));
        assert_eq!(counter.value, 1);
        assert_eq!(counter.version(), Version::first());
    }

    #[test]
    fn skipping_a_version_is_rejected() {
        let id = AggregateId::new();
        let mut counter = Counter::new(id);
        let result = counter.apply_event(VersionedEvent::new(
            id,
            Version::new(2),
            CounterEvent::Incremented { by: 1 },
        ));

        assert!(matches!(result, Err(DomainError::OutOfSequence { .. })));
        assert_eq!(counter.version(), Version::initial());
    }

    #[test]
    fn foreign_event_is_rejected() {
        let mut counter = Counter::new(AggregateId::new());
        let result = counter.apply_event(VersionedEvent::new(
            AggregateId::new(),
            Version::first(),
            CounterEvent::Incremented { by: 1 },
        ));

        assert!(matches!(result, Err(DomainError::ForeignEvent { .. })));
    }

    #[test]
    fn versioned_event_equality_ignores_payload() {
        let id = AggregateId::new();
        let a = VersionedEvent::new(id, Version::first(), CounterEvent::Incremented { by: 1 });
        let b = VersionedEvent::new(id, Version::first(), CounterEvent::Incremented { by: 9 });
        let c = VersionedEvent::new(
            id,
            Version::first(),
            CounterEvent::Opened {
                label: "x".to_string(),
            },
        );

        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
