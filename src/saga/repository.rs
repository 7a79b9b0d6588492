// Copyright (c) 2025 - Cowboy AI, Inc.
//! Saga Repository
//!
//! Loads sagas by replaying their logs and saves them through a single
//! conditional append. Every save carries one [`SagaSaved`] marker after the
//! saga's own events, which is what distinguishes a saga log from any other
//! aggregate log.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::events::{SagaEvent, SagaRecord, SagaSaved};
use super::Saga;
use crate::errors::{EventStoreError, StoreResult};
use crate::event_store::{self, EventRepository};
use crate::events::{Aggregate, NewEvent, Version, MAX_PER_PAGE};

/// Filter for [`SagaRepository::list`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListCriteria {
    /// Only sagas with one of these names
    pub names: Option<Vec<String>>,
    /// `Some(true)` for incomplete sagas, `Some(false)` for complete ones
    pub running: Option<bool>,
}

impl ListCriteria {
    pub fn named<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: Some(names.into_iter().map(Into::into).collect()),
            running: None,
        }
    }

    pub fn running(mut self, running: bool) -> Self {
        self.running = Some(running);
        self
    }

    fn accepts(&self, saga: &Saga) -> bool {
        self.running.map_or(true, |running| running != saga.is_complete())
    }
}

/// Saga persistence over any [`EventRepository`]
#[derive(Clone)]
pub struct SagaRepository {
    events: Arc<dyn EventRepository>,
    page_size: usize,
}

impl SagaRepository {
    pub fn new(events: Arc<dyn EventRepository>) -> Self {
        Self {
            events,
            page_size: MAX_PER_PAGE,
        }
    }

    /// Page size used when scanning aggregates in [`SagaRepository::list`]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PER_PAGE);
        self
    }

    /// Underlying event repository
    pub fn event_repository(&self) -> &Arc<dyn EventRepository> {
        &self.events
    }

    /// Load and hydrate a saga
    ///
    /// Returns `Ok(None)` when the aggregate has no events.
    ///
    /// # Errors
    ///
    /// - `MissingSagaMarker` if the log holds events but no saga-saved marker
    /// - `Serialization` if a saga event payload doesn't decode
    pub async fn get(&self, name: &str, id: &str) -> StoreResult<Option<Saga>> {
        let stored = self.events.list(name, id).await?;
        let Some(last) = stored.last() else {
            return Ok(None);
        };
        let version = last.sequence;

        let mut marker: Option<SagaSaved> = None;
        let mut events = Vec::with_capacity(stored.len());
        for event in &stored {
            match SagaRecord::decode(event)? {
                SagaRecord::Saved(saved) => marker = Some(saved),
                SagaRecord::Event(saga_event) => events.push(saga_event),
                SagaRecord::Foreign => {}
            }
        }

        let marker = marker.ok_or_else(|| EventStoreError::MissingSagaMarker {
            name: name.to_string(),
            id: id.to_string(),
        })?;

        debug!(
            saga_name = %name,
            saga_id = %id,
            version,
            sequence = marker.sequence,
            events = events.len(),
            "Hydrated saga"
        );

        Ok(Some(Saga::hydrate(name, id, marker.sequence, version, events)))
    }

    /// Save pending events, `additional_events` and a saga-saved marker as one batch
    ///
    /// Returns the new version. On conflict the saga is left as it was; reload
    /// it with [`SagaRepository::get`] and re-apply the change.
    pub async fn save(&self, saga: &mut Saga, additional_events: Vec<NewEvent>) -> StoreResult<Version> {
        let mut saved_domain_events = Vec::new();
        for event in &additional_events {
            if let Some(saga_event) = SagaEvent::decode(&event.event_type, &event.data)? {
                saved_domain_events.push(saga_event);
            }
        }

        let mut batch = saga
            .pending_events()
            .iter()
            .map(SagaEvent::to_new_event)
            .collect::<StoreResult<Vec<_>>>()?;
        batch.extend(additional_events);

        let committed_version = saga.version() + batch.len() as Version + 1;
        batch.push(NewEvent::new(
            SagaSaved::TYPE,
            &SagaSaved {
                sequence: committed_version,
            },
        )?);

        let batch_len = batch.len();
        let version = self
            .events
            .save(saga.name(), saga.id(), saga.version(), batch)
            .await?;

        saga.mark_saved(saved_domain_events, version);

        info!(
            saga_name = %saga.name(),
            saga_id = %saga.id(),
            version,
            events = batch_len,
            "Saved saga"
        );

        Ok(version)
    }

    /// Load every saga matching `criteria`
    ///
    /// Aggregate pages are drained before any saga is filtered, so the
    /// result never depends on where page boundaries fall.
    pub async fn list(&self, criteria: &ListCriteria) -> StoreResult<Vec<Saga>> {
        let aggregates = self.scan(criteria.names.as_deref()).await?;
        debug!(aggregates = aggregates.len(), "Scanned saga candidates");

        let mut sagas = Vec::new();
        for aggregate in aggregates {
            match self.get(&aggregate.aggregate_type, &aggregate.aggregate_id).await {
                Ok(Some(saga)) if criteria.accepts(&saga) => sagas.push(saga),
                Ok(_) => {}
                Err(EventStoreError::MissingSagaMarker { name, id }) => {
                    debug!(aggregate_type = %name, aggregate_id = %id, "Skipping non-saga aggregate");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(sagas)
    }

    async fn scan(&self, names: Option<&[String]>) -> StoreResult<BTreeSet<Aggregate>> {
        let repository = self.events.as_ref();
        let mut found = BTreeSet::new();

        match names {
            Some(names) => {
                for name in names {
                    let page = event_store::aggregates(repository, Some(name.as_str()), self.page_size);
                    found.extend(page.try_collect().await?);
                }
            }
            None => {
                let page = event_store::aggregates(repository, None, self.page_size);
                found.extend(page.try_collect().await?);
            }
        }

        Ok(found)
    }
}

impl std::fmt::Debug for SagaRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SagaRepository")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}
