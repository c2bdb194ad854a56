//! Domain error types.

use common::AggregateId;
use event_store::{EventStoreError, Version};
use thiserror::Error;

use crate::calendar::CalendarError;
use crate::portfolio::PortfolioError;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// An error occurred in the event store.
    #[error("Event store error: {0}")]
    EventStore(#[from] EventStoreError),

    /// A portfolio command was rejected.
    #[error("Portfolio error: {0}")]
    Portfolio(#[from] PortfolioError),

    /// A trading calendar command was rejected.
    #[error("Trading calendar error: {0}")]
    Calendar(#[from] CalendarError),

    /// No event stream exists for the requested aggregate.
    #[error("Aggregate not found: {aggregate_type} with id {aggregate_id}")]
    NotFound {
        aggregate_type: &'static str,
        aggregate_id: AggregateId,
    },

    /// An event was applied out of order or applied twice.
    #[error("Event out of sequence for {aggregate_id}: expected version {expected}, got {found}")]
    OutOfSequence {
        aggregate_id: AggregateId,
        expected: Version,
        found: Version,
    },

    /// An event recorded for one aggregate was applied to another.
    #[error("Event for {event_aggregate_id} applied to aggregate {aggregate_id}")]
    ForeignEvent {
        aggregate_id: AggregateId,
        event_aggregate_id: AggregateId,
    },

    /// A stream was loaded as the wrong kind of aggregate.
    #[error("Stream {aggregate_id} holds {found} events, not {expected}")]
    AggregateTypeMismatch {
        aggregate_id: AggregateId,
        expected: &'static str,
        found: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    /// Returns true when the caller should reload and retry its command.
    pub fn is_conflict(&self) -> bool {
        matches!(self, DomainError::EventStore(e) if e.is_conflict())
    }

    /// Returns true when a command was rejected by business validation.
    pub fn is_validation(&self) -> bool {
        matches!(self, DomainError::Portfolio(_) | DomainError::Calendar(_))
    }

    /// Returns true when the requested aggregate has no event stream.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::NotFound { .. } | DomainError::EventStore(EventStoreError::UnknownEntity(_))
        )
    }
}
