// Copyright (c) 2025 - Cowboy AI, Inc.
//! Saga Events
//!
//! A saga's log holds two kinds of records, told apart by the stored
//! `event_type`:
//!
//! - [`SagaSaved`] markers, one per save, carrying the version the aggregate
//!   reached with that save
//! - [`SagaEvent`] domain events, replayed in order to hydrate the saga
//!
//! Anything else appended alongside a saga decodes as [`SagaRecord::Foreign`]
//! and is skipped during hydration.

use serde::{Deserialize, Serialize};

use crate::errors::StoreResult;
use crate::events::{NewEvent, StoredEvent};

/// Marker written with every save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaSaved {
    /// Aggregate version once the batch carrying this marker committed
    ///
    /// This is the post-commit version, counting the marker itself, and not
    /// the version the saga was loaded at. A save of two events onto a saga
    /// at version 4 writes a marker with `sequence: 7`.
    pub sequence: u64,
}

impl SagaSaved {
    pub const TYPE: &'static str = "sagaSaved";
}

/// A step the saga asked to be performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SagaCommand {
    pub name: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// A previously requested step finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaCommandCompleted {
    pub command: String,
}

/// Free-form progress message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaLogAppended {
    pub message: String,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SagaRollbackStarted {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SagaRollbackCompleted {}

/// Terminal outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaCompleted {
    pub success: bool,
}

/// Saga domain events
#[derive(Debug, Clone, PartialEq)]
pub enum SagaEvent {
    Command(SagaCommand),
    CommandCompleted(SagaCommandCompleted),
    LogAppended(SagaLogAppended),
    RollbackStarted(SagaRollbackStarted),
    RollbackCompleted(SagaRollbackCompleted),
    Completed(SagaCompleted),
}

impl SagaEvent {
    pub const COMMAND: &'static str = "sagaCommand";
    pub const COMMAND_COMPLETED: &'static str = "sagaCommandCompleted";
    pub const LOG_APPENDED: &'static str = "sagaLogAppended";
    pub const ROLLBACK_STARTED: &'static str = "sagaRollbackStarted";
    pub const ROLLBACK_COMPLETED: &'static str = "sagaRollbackCompleted";
    pub const COMPLETED: &'static str = "sagaCompleted";

    /// Stored `event_type` of this event
    pub fn event_type(&self) -> &'static str {
        match self {
            SagaEvent::Command(_) => Self::COMMAND,
            SagaEvent::CommandCompleted(_) => Self::COMMAND_COMPLETED,
            SagaEvent::LogAppended(_) => Self::LOG_APPENDED,
            SagaEvent::RollbackStarted(_) => Self::ROLLBACK_STARTED,
            SagaEvent::RollbackCompleted(_) => Self::ROLLBACK_COMPLETED,
            SagaEvent::Completed(_) => Self::COMPLETED,
        }
    }

    /// Encode as an unsaved log event
    pub fn to_new_event(&self) -> StoreResult<NewEvent> {
        let event_type = self.event_type();
        match self {
            SagaEvent::Command(e) => NewEvent::new(event_type, e),
            SagaEvent::CommandCompleted(e) => NewEvent::new(event_type, e),
            SagaEvent::LogAppended(e) => NewEvent::new(event_type, e),
            SagaEvent::RollbackStarted(e) => NewEvent::new(event_type, e),
            SagaEvent::RollbackCompleted(e) => NewEvent::new(event_type, e),
            SagaEvent::Completed(e) => NewEvent::new(event_type, e),
        }
    }

    /// Decode a payload by its `event_type`; `None` for non-saga types
    pub fn decode(event_type: &str, data: &serde_json::Value) -> StoreResult<Option<Self>> {
        let event = match event_type {
            Self::COMMAND => SagaEvent::Command(payload(data)?),
            Self::COMMAND_COMPLETED => SagaEvent::CommandCompleted(payload(data)?),
            Self::LOG_APPENDED => SagaEvent::LogAppended(payload(data)?),
            Self::ROLLBACK_STARTED => SagaEvent::RollbackStarted(payload(data)?),
            Self::ROLLBACK_COMPLETED => SagaEvent::RollbackCompleted(payload(data)?),
            Self::COMPLETED => SagaEvent::Completed(payload(data)?),
            _ => return Ok(None),
        };
        Ok(Some(event))
    }
}

fn payload<T: serde::de::DeserializeOwned>(data: &serde_json::Value) -> serde_json::Result<T> {
    T::deserialize(data)
}

/// Closed view of one stored event from a saga's log
#[derive(Debug, Clone, PartialEq)]
pub enum SagaRecord {
    Saved(SagaSaved),
    Event(SagaEvent),
    Foreign,
}

impl SagaRecord {
    pub fn decode(event: &StoredEvent) -> StoreResult<Self> {
        if event.event_type == SagaSaved::TYPE {
            return Ok(SagaRecord::Saved(event.decode()?));
        }

        Ok(SagaEvent::decode(&event.event_type, &event.data)?
            .map_or(SagaRecord::Foreign, SagaRecord::Event))
    }
}
