// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Log Model
//!
//! Defines the immutable unit of record (an event) and the unit of identity
//! it belongs to (an aggregate).
//!
//! # Event Log Principles
//!
//! 1. **Events are immutable**: Once saved, events never change
//! 2. **Events are ordered**: `sequence` is strictly increasing within an aggregate, starting at 1
//! 3. **Aggregates are derived**: An aggregate exists only as the replay of its log
//! 4. **Version is the log length**: The sequence of the last saved event, or 0
//!
//! # Event Flow
//!
//! ```text
//! NewEvent ──save(type, id, originating_version)──▶ StoredEvent
//!  (unsequenced)                                     (sequence, originating_version)
//! ```
//!
//! # Module Organization
//!
//! - [`stored`] - [`NewEvent`] submitted by callers and the durable [`StoredEvent`]
//! - [`aggregate`] - [`Aggregate`] identity and the paginated listing request/response

pub mod aggregate;
pub mod stored;

pub use aggregate::{
    Aggregate, ListAggregatesCriteria, ListAggregatesResult, DEFAULT_PER_PAGE, MAX_PER_PAGE,
};
pub use stored::{NewEvent, StoredEvent};

/// Optimistic-concurrency token: the number of events saved for an aggregate
pub type Version = u64;
