// Copyright (c) 2025 - Cowboy AI, Inc.
//! In-Memory Event Repository
//!
//! Reference implementation of [`EventRepository`] for tests and
//! single-process deployments.
//!
//! - Logs live in a `BTreeMap` keyed by [`Aggregate`], which gives listings
//!   their stable `(type, id)` order
//! - The write lock is held across the version check and the append
//! - Nothing is ever removed; a log lives as long as the repository
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cim_saga::event_store::{EventRepository, InMemoryEventRepository};
//!
//! #[tokio::main]
//! async fn main() {
//!     let repository: Arc<dyn EventRepository> = Arc::new(InMemoryEventRepository::new());
//! }
//! ```

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::{EventStoreError, StoreResult};
use crate::event_store::{ensure_not_empty, EventRepository};
use crate::events::{
    Aggregate, ListAggregatesCriteria, ListAggregatesResult, NewEvent, StoredEvent, Version,
};

/// Event log of a single aggregate
#[derive(Debug, Default)]
struct AggregateLog {
    events: Vec<StoredEvent>,
}

impl AggregateLog {
    fn version(&self) -> Version {
        self.events.len() as Version
    }
}

/// In-memory, lock-protected event repository
#[derive(Debug, Default)]
pub struct InMemoryEventRepository {
    logs: RwLock<BTreeMap<Aggregate, AggregateLog>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of aggregates currently held
    pub async fn aggregate_count(&self) -> usize {
        self.logs.read().await.len()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn save(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        originating_version: Version,
        new_events: Vec<NewEvent>,
    ) -> StoreResult<Version> {
        ensure_not_empty(aggregate_type, aggregate_id, &new_events)?;

        let key = Aggregate::new(aggregate_type, aggregate_id);
        let mut logs = self.logs.write().await;

        let current_version = logs.get(&key).map_or(0, AggregateLog::version);
        if current_version != originating_version {
            debug!(
                aggregate = %key,
                expected = originating_version,
                actual = current_version,
                "Rejected save with stale version"
            );
            return Err(EventStoreError::Conflict {
                aggregate_type: key.aggregate_type,
                aggregate_id: key.aggregate_id,
                expected: originating_version,
                actual: Some(current_version),
            });
        }

        let log = logs.entry(key).or_default();
        let count = new_events.len();
        for (offset, event) in new_events.into_iter().enumerate() {
            let sequence = originating_version + offset as u64 + 1;
            log.events.push(event.into_stored(
                aggregate_type,
                aggregate_id,
                sequence,
                originating_version,
            ));
        }

        let version = log.version();
        debug!(
            aggregate_type,
            aggregate_id,
            count,
            version,
            "Appended events"
        );
        Ok(version)
    }

    async fn list(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> StoreResult<Vec<StoredEvent>> {
        let key = Aggregate::new(aggregate_type, aggregate_id);
        let logs = self.logs.read().await;

        Ok(logs.get(&key).map(|log| log.events.clone()).unwrap_or_default())
    }

    async fn list_aggregates(
        &self,
        criteria: ListAggregatesCriteria,
    ) -> StoreResult<ListAggregatesResult> {
        let after = criteria.validate()?;
        let logs = self.logs.read().await;

        let lower = match (&after, &criteria.aggregate_type) {
            (Some(after), _) => Bound::Excluded(after.clone()),
            (None, Some(aggregate_type)) => {
                Bound::Included(Aggregate::new(aggregate_type.clone(), String::new()))
            }
            (None, None) => Bound::Unbounded,
        };

        let candidates = logs
            .range((lower, Bound::Unbounded))
            .map(|(aggregate, _)| aggregate)
            .skip_while(|aggregate| !criteria.matches(aggregate))
            .take_while(|aggregate| criteria.matches(aggregate))
            .cloned();

        Ok(ListAggregatesResult::paginate(candidates, criteria.per_page))
    }
}
