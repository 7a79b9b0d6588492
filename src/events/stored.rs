// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event envelopes
//!
//! A [`NewEvent`] is what a unit of work produces; the repository turns it
//! into a [`StoredEvent`] by assigning the aggregate address and sequence.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StoreResult;

/// An event that has not been saved yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Unique event ID (UUID v7 for time-ordering)
    pub event_id: Uuid,

    /// Event type discriminator
    pub event_type: String,

    /// When the event occurred
    pub timestamp: DateTime<Utc>,

    /// Serialized payload
    pub data: serde_json::Value,

    /// Optional metadata (e.g., user context, source system)
    pub metadata: Option<serde_json::Value>,
}

impl NewEvent {
    /// Create an event by serializing `data`
    pub fn new(event_type: impl Into<String>, data: &impl Serialize) -> StoreResult<Self> {
        Ok(Self::from_value(event_type, serde_json::to_value(data)?))
    }

    /// Create an event from an already-serialized payload
    pub fn from_value(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            data,
            metadata: None,
        }
    }

    /// Override the event timestamp
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Add metadata to the event
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Address and sequence this event
    pub(crate) fn into_stored(
        self,
        aggregate_type: &str,
        aggregate_id: &str,
        sequence: u64,
        originating_version: u64,
    ) -> StoredEvent {
        StoredEvent {
            event_id: self.event_id,
            aggregate_type: aggregate_type.to_string(),
            aggregate_id: aggregate_id.to_string(),
            sequence,
            originating_version,
            event_type: self.event_type,
            timestamp: self.timestamp,
            data: self.data,
            metadata: self.metadata,
        }
    }
}

/// Durable event record
///
/// `sequence` is the 1-based position in the aggregate's log and
/// `originating_version` the version the saving unit of work presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub sequence: u64,
    pub originating_version: u64,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub data: serde_json::Value,
    pub metadata: Option<serde_json::Value>,
}

impl StoredEvent {
    /// Deserialize the payload
    pub fn decode<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(self.data.clone())?)
    }
}
