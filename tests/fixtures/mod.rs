// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-saga
//!
//! Provides deterministic events and repositories for integration tests.
//! All UUIDs and timestamps are fixed constants so stored events compare
//! equal across runs.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use cim_saga::{InMemoryEventRepository, NewEvent, SagaRepository};

// Fixed test UUIDs (UUID v7 layout, deterministic)
pub const EVENT_ID_1: &str = "01934f4a-0001-7000-8000-000000000001";
pub const EVENT_ID_2: &str = "01934f4a-0002-7000-8000-000000000002";
pub const EVENT_ID_3: &str = "01934f4a-0003-7000-8000-000000000003";

pub const CLUSTER_SAGA: &str = "deployCluster";
pub const RESOURCE_SAGA: &str = "upsertResource";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

/// Parse a fixed UUID from a constant string
pub fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid UUID in test fixture")
}

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

/// Deterministic event `n` seconds after the fixed timestamp
pub fn event_at(event_type: &str, id: &str, n: i64) -> NewEvent {
    let mut event = NewEvent::from_value(event_type, json!({ "n": n }))
        .at(fixed_timestamp() + Duration::seconds(n));
    event.event_id = parse_uuid(id);
    event
}

/// Three deterministic resource events, in order
pub fn resource_history() -> Vec<NewEvent> {
    vec![
        event_at("resourceRequested", EVENT_ID_1, 0),
        event_at("resourceProvisioned", EVENT_ID_2, 1),
        event_at("resourceTagged", EVENT_ID_3, 2),
    ]
}

/// Fresh in-memory store with no retention limits
pub fn memory_repository() -> Arc<InMemoryEventRepository> {
    Arc::new(InMemoryEventRepository::default())
}

/// Saga repository over `events`
pub fn saga_repository(events: Arc<InMemoryEventRepository>) -> SagaRepository {
    SagaRepository::new(events)
}

/// Zero-padded aggregate id, so lexical and numeric order agree
pub fn padded_id(i: usize) -> String {
    format!("agg-{i:05}")
}
