use thiserror::Error;

use crate::{AggregateId, Version};

/// Errors that can occur when interacting with the event store.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Another writer committed to the stream first.
    /// The caller should reload the aggregate and retry its command.
    #[error(
        "Concurrency conflict for aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        aggregate_id: AggregateId,
        expected: Version,
        actual: Version,
    },

    /// The batch handed to `append` is not a contiguous run of versions
    /// for a single stream.
    #[error("Invalid event sequence for aggregate {aggregate_id}: {reason}")]
    InvalidSequence {
        aggregate_id: AggregateId,
        reason: String,
    },

    /// No event has ever been committed for this aggregate.
    #[error("Unknown entity: {0}")]
    UnknownEntity(AggregateId),

    /// An envelope was built without one of its required fields.
    #[error("Incomplete event envelope: missing {0}")]
    IncompleteEnvelope(&'static str),

    /// A serialization/deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EventStoreError {
    pub(crate) fn invalid_sequence(aggregate_id: AggregateId, reason: impl Into<String>) -> Self {
        EventStoreError::InvalidSequence {
            aggregate_id,
            reason: reason.into(),
        }
    }

    /// Returns true if the error is a lost optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, EventStoreError::ConcurrencyConflict { .. })
    }
}

/// Result type for event store operations.
pub type Result<T> = std::result::Result<T, EventStoreError>;
