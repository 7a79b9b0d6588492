// Copyright (c) 2025 - Cowboy AI, Inc.
//! Configuration for the saga store
//!
//! Every section has a `Default`; [`SagaStoreConfig::from_env`] overlays
//! environment variables on top of the defaults.
//!
//! | Variable | Default |
//! |---|---|
//! | `SAGA_STORE_BACKEND` | `memory` (`memory` or `nats`) |
//! | `NATS_URL` | `nats://localhost:4222` |
//! | `NATS_STREAM` | `SAGA_EVENTS` |
//! | `SAGA_SUBJECT_PREFIX` | `sagas` |

use std::str::FromStr;
use std::time::Duration;

use crate::errors::{EventStoreError, StoreResult};
use crate::jetstream::JetStreamConfig;

/// Configuration for NATS connection
#[derive(Debug, Clone)]
pub struct NatsConfig {
    /// NATS server URLs
    pub servers: Vec<String>,
    /// Client name
    pub name: String,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Request timeout
    pub request_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            servers: vec!["nats://localhost:4222".to_string()],
            name: "cim-saga".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Which event repository backs the saga store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Memory,
    Nats,
}

impl FromStr for Backend {
    type Err = EventStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Backend::Memory),
            "nats" => Ok(Backend::Nats),
            other => Err(EventStoreError::Configuration(format!(
                "unknown backend '{other}', expected 'memory' or 'nats'"
            ))),
        }
    }
}

/// Top-level saga store configuration
#[derive(Debug, Clone, Default)]
pub struct SagaStoreConfig {
    pub backend: Backend,
    pub nats: NatsConfig,
    pub jetstream: JetStreamConfig,
}

impl SagaStoreConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> StoreResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        let mut config = Self::default();

        if let Some(backend) = lookup("SAGA_STORE_BACKEND") {
            config.backend = backend.parse()?;
        }

        if let Some(url) = lookup("NATS_URL") {
            config.nats.servers = url
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if config.nats.servers.is_empty() {
                return Err(EventStoreError::Configuration(
                    "NATS_URL contains no servers".to_string(),
                ));
            }
        }

        if let Some(stream) = lookup("NATS_STREAM") {
            config.jetstream.stream_name = stream;
        }

        if let Some(prefix) = lookup("SAGA_SUBJECT_PREFIX") {
            config.jetstream = config.jetstream.with_subject_prefix(prefix);
        }

        Ok(config)
    }
}
