// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event-sourced aggregate store and saga layer for the Composable Information Machine
//!
//! This crate provides:
//! - an append-only, per-aggregate event log with optimistic concurrency
//!   ([`event_store::EventRepository`]), backed by memory or NATS JetStream
//! - cursor pagination over aggregate listings ([`pagination::PaginatedIterator`])
//! - sagas: workflow state rebuilt purely by replaying events
//!   ([`saga::Saga`], [`saga::SagaRepository`])

pub mod config;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod jetstream;
pub mod pagination;
pub mod saga;

// Re-export commonly used types
pub use config::{Backend, NatsConfig, SagaStoreConfig};
pub use errors::{EventStoreError, StoreResult};
pub use event_store::{EventRepository, InMemoryEventRepository, NatsEventRepository};
pub use events::{
    Aggregate, ListAggregatesCriteria, ListAggregatesResult, NewEvent, StoredEvent, Version,
};
pub use pagination::PaginatedIterator;
pub use saga::{ListCriteria, Saga, SagaEvent, SagaRepository};
