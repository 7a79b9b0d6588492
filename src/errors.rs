// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for event store and saga operations

use thiserror::Error;

/// Errors that can occur in event store and saga operations
///
/// A [`EventStoreError::Conflict`] is the only expected business failure:
/// the caller reloads and retries. Everything classified by
/// [`EventStoreError::is_infrastructure`] is surfaced unchanged and is never
/// retried inside the store, since an ambiguous failure could otherwise
/// double-append.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// The originating version did not match the stored version
    #[error(
        "Version conflict on {aggregate_type}/{aggregate_id}: expected version {expected}, found {}",
        .actual.map_or_else(|| "unknown".to_string(), |v| v.to_string())
    )]
    Conflict {
        aggregate_type: String,
        aggregate_id: String,
        expected: u64,
        actual: Option<u64>,
    },

    /// Event payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Caller supplied an argument the store cannot accept
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Aggregate has history but no saga-saved marker
    #[error("Aggregate {name}/{id} has events but no saga marker")]
    MissingSagaMarker { name: String, id: String },

    /// NATS connection error
    #[error("NATS connection error: {0}")]
    NatsConnection(String),

    /// NATS publish error
    #[error("NATS publish error: {0}")]
    NatsPublish(String),

    /// Underlying storage failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl EventStoreError {
    /// True for optimistic-concurrency failures
    pub fn is_conflict(&self) -> bool {
        matches!(self, EventStoreError::Conflict { .. })
    }

    /// True for connectivity and storage faults
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            EventStoreError::NatsConnection(_)
                | EventStoreError::NatsPublish(_)
                | EventStoreError::Storage(_)
        )
    }
}

/// Result type for event store operations
pub type StoreResult<T> = Result<T, EventStoreError>;

impl From<async_nats::Error> for EventStoreError {
    fn from(err: async_nats::Error) -> Self {
        EventStoreError::NatsConnection(err.to_string())
    }
}

impl From<serde_json::Error> for EventStoreError {
    fn from(err: serde_json::Error) -> Self {
        EventStoreError::Serialization(err.to_string())
    }
}
