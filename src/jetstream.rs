// Copyright (c) 2025 - Cowboy AI, Inc.

//! JetStream configuration and setup for saga event storage
//!
//! One stream holds every aggregate log. Each aggregate owns a single
//! subject, `<prefix>.<aggregate_type>.<aggregate_id>`, and every successful
//! save publishes exactly one [`Commit`] message on it.
//!
//! # Example
//!
//! ```rust,no_run
//! use cim_saga::jetstream::{JetStreamConfig, create_event_stream};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = async_nats::connect("nats://localhost:4222").await?;
//!     let jetstream = async_nats::jetstream::new(client);
//!
//!     let config = JetStreamConfig::default();
//!     let stream = create_event_stream(jetstream, &config).await?;
//!
//!     Ok(())
//! }
//! ```

use async_nats::jetstream::{self, stream::Stream};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{EventStoreError, StoreResult};
use crate::events::StoredEvent;

/// Configuration for the saga event stream
#[derive(Debug, Clone)]
pub struct JetStreamConfig {
    /// Stream name
    pub stream_name: String,

    /// First subject token of every aggregate subject
    pub subject_prefix: String,

    /// Subjects this stream will capture (defaults to "sagas.>")
    pub subjects: Vec<String>,

    /// Maximum age of messages; zero keeps them forever
    pub max_age: Duration,

    /// Maximum bytes stored in stream (-1 for unlimited)
    pub max_bytes: i64,

    /// Storage type (File or Memory)
    pub storage: StorageType,

    /// Number of replicas (for clustered NATS)
    pub replicas: usize,
}

impl Default for JetStreamConfig {
    fn default() -> Self {
        Self {
            stream_name: "SAGA_EVENTS".to_string(),
            subject_prefix: "sagas".to_string(),
            subjects: vec!["sagas.>".to_string()],
            max_age: Duration::ZERO,
            max_bytes: -1,
            storage: StorageType::File,
            replicas: 1,
        }
    }
}

impl JetStreamConfig {
    /// Use a different subject prefix, capturing everything below it
    pub fn with_subject_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.subject_prefix = prefix.into();
        self.subjects = vec![format!("{}.>", self.subject_prefix)];
        self
    }
}

/// Storage type for JetStream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// File-based storage (persistent across restarts)
    File,
    /// Memory-based storage (faster, but lost on restart)
    Memory,
}

/// One atomically published batch of sequenced events
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Commit {
    pub events: Vec<StoredEvent>,
}

impl Commit {
    /// Aggregate version after this commit
    pub fn version(&self) -> u64 {
        self.events.last().map_or(0, |e| e.sequence)
    }
}

/// Create or update the saga events stream
///
/// Idempotent: creates the stream if it doesn't exist, otherwise returns it.
pub async fn create_event_stream(
    jetstream: jetstream::Context,
    config: &JetStreamConfig,
) -> StoreResult<Stream> {
    let storage = match config.storage {
        StorageType::File => jetstream::stream::StorageType::File,
        StorageType::Memory => jetstream::stream::StorageType::Memory,
    };

    let stream_config = jetstream::stream::Config {
        name: config.stream_name.clone(),
        subjects: config.subjects.clone(),
        max_age: config.max_age,
        max_bytes: config.max_bytes,
        storage,
        num_replicas: config.replicas,
        retention: jetstream::stream::RetentionPolicy::Limits,
        ..Default::default()
    };

    jetstream
        .get_or_create_stream(stream_config)
        .await
        .map_err(|e| EventStoreError::NatsConnection(e.to_string()))
}
