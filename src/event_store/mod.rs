// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Repository Abstraction
//!
//! This module defines the append-only persistence interface and its
//! implementations.
//!
//! # Architecture
//!
//! ```text
//! Unit of work → NewEvents → EventRepository.save(originating_version) → Storage
//!                                      ↓
//!                          list / list_aggregates (replay, paging)
//! ```
//!
//! # Repository Requirements
//!
//! 1. **Append-Only**: Events are never updated or deleted
//! 2. **Ordered**: `list` returns events by increasing sequence
//! 3. **Optimistic Concurrency**: `save` is a single conditional append
//! 4. **Atomic Batches**: A batch is written entirely or not at all
//! 5. **Stable Paging**: Aggregates are listed in `(type, id)` order
//!
//! # Example
//!
//! ```rust,no_run
//! use cim_saga::event_store::{EventRepository, InMemoryEventRepository};
//! use cim_saga::events::NewEvent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repository = InMemoryEventRepository::default();
//!
//!     let event = NewEvent::from_value("clusterRequested", serde_json::json!({"size": 3}));
//!     let version = repository.save("deployCluster", "c-1", 0, vec![event]).await?;
//!     assert_eq!(version, 1);
//!
//!     let events = repository.list("deployCluster", "c-1").await?;
//!     assert_eq!(events[0].sequence, 1);
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};

use crate::errors::{EventStoreError, StoreResult};
use crate::events::{
    Aggregate, ListAggregatesCriteria, ListAggregatesResult, NewEvent, StoredEvent, Version,
};
use crate::pagination::PaginatedIterator;

pub mod memory;
pub mod nats;

pub use memory::InMemoryEventRepository;
pub use nats::NatsEventRepository;

/// Event Repository trait for appending and replaying aggregate logs
///
/// Implementations must make `save` a single conditional append with
/// respect to the underlying store, not a read-then-write from the caller's
/// point of view.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Append events to an aggregate's log
    ///
    /// # Arguments
    ///
    /// * `aggregate_type`, `aggregate_id` - Aggregate every event is addressed to
    /// * `originating_version` - Version the caller believed current
    /// * `new_events` - Non-empty batch, appended in order
    ///
    /// # Returns
    ///
    /// The aggregate version after the append
    ///
    /// # Errors
    ///
    /// - `Conflict` if `originating_version` doesn't match; nothing is written
    /// - `InvalidArgument` if `new_events` is empty
    async fn save(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        originating_version: Version,
        new_events: Vec<NewEvent>,
    ) -> StoreResult<Version>;

    /// Read all events for an aggregate, oldest first
    ///
    /// An aggregate without events yields an empty vector.
    async fn list(&self, aggregate_type: &str, aggregate_id: &str)
        -> StoreResult<Vec<StoredEvent>>;

    /// Read one page of aggregates
    async fn list_aggregates(
        &self,
        criteria: ListAggregatesCriteria,
    ) -> StoreResult<ListAggregatesResult>;
}

/// Reject empty batches before touching storage
pub(crate) fn ensure_not_empty(
    aggregate_type: &str,
    aggregate_id: &str,
    new_events: &[NewEvent],
) -> StoreResult<()> {
    if new_events.is_empty() {
        return Err(EventStoreError::InvalidArgument(format!(
            "no events to save for {aggregate_type}/{aggregate_id}"
        )));
    }
    Ok(())
}

/// Fetch function type used by [`aggregates`]
pub type AggregatePageFetch<'a> =
    Box<dyn FnMut(usize, Option<String>) -> BoxFuture<'a, StoreResult<Vec<Aggregate>>> + Send + 'a>;

/// Iterator over every aggregate, driven by `list_aggregates` page tokens
pub type AggregateIterator<'a> =
    PaginatedIterator<Aggregate, String, AggregatePageFetch<'a>, fn(&Aggregate) -> String>;

/// Build a [`PaginatedIterator`] over `repository.list_aggregates`
///
/// The cursor is the last aggregate's page token, which is the same value
/// the repository hands out as `next_page_token`.
pub fn aggregates<'a>(
    repository: &'a dyn EventRepository,
    aggregate_type: Option<&str>,
    per_page: usize,
) -> AggregateIterator<'a> {
    let aggregate_type = aggregate_type.map(str::to_string);

    let fetch: AggregatePageFetch<'a> = Box::new(move |per_page: usize, token: Option<String>| {
        let criteria = ListAggregatesCriteria {
            aggregate_type: aggregate_type.clone(),
            token,
            per_page,
        };
        async move { Ok(repository.list_aggregates(criteria).await?.aggregates) }.boxed()
    });

    PaginatedIterator::new(per_page, Aggregate::page_token as fn(&Aggregate) -> String, fetch)
}
