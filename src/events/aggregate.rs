// Copyright (c) 2025 - Cowboy AI, Inc.
//! Aggregate identity and listing
//!
//! Aggregates are listed in `(aggregate_type, aggregate_id)` order. A page
//! token is the opaque encoding of the last aggregate of a page, so a scan
//! resumes strictly after it whether or not that key holds a log.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::{EventStoreError, StoreResult};

/// Default page size for aggregate listings
pub const DEFAULT_PER_PAGE: usize = 100;

/// Largest accepted page size
pub const MAX_PER_PAGE: usize = 1000;

/// Identity of one logical entity whose state is the replay of its log
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Aggregate {
    pub aggregate_type: String,
    pub aggregate_id: String,
}

impl Aggregate {
    pub fn new(aggregate_type: impl Into<String>, aggregate_id: impl Into<String>) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
        }
    }

    /// Resumption token positioned just after this aggregate
    pub fn page_token(&self) -> String {
        let key = (&self.aggregate_type, &self.aggregate_id);
        // Serializing a pair of strings cannot fail
        let json = serde_json::to_vec(&key).unwrap_or_default();
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decode a token produced by [`Aggregate::page_token`]
    pub fn from_page_token(token: &str) -> StoreResult<Self> {
        let invalid = || EventStoreError::InvalidArgument(format!("malformed page token: {token}"));

        let bytes = URL_SAFE_NO_PAD.decode(token).map_err(|_| invalid())?;
        let (aggregate_type, aggregate_id): (String, String) =
            serde_json::from_slice(&bytes).map_err(|_| invalid())?;

        Ok(Self {
            aggregate_type,
            aggregate_id,
        })
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.aggregate_type, self.aggregate_id)
    }
}

/// Request for one page of aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAggregatesCriteria {
    /// Only list aggregates of this type
    pub aggregate_type: Option<String>,

    /// Continuation token from a previous page
    pub token: Option<String>,

    /// Page size, `1..=MAX_PER_PAGE`
    pub per_page: usize,
}

impl Default for ListAggregatesCriteria {
    fn default() -> Self {
        Self {
            aggregate_type: None,
            token: None,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl ListAggregatesCriteria {
    pub fn of_type(aggregate_type: impl Into<String>) -> Self {
        Self {
            aggregate_type: Some(aggregate_type.into()),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_per_page(mut self, per_page: usize) -> Self {
        self.per_page = per_page;
        self
    }

    /// Check bounds and decode the continuation token
    pub fn validate(&self) -> StoreResult<Option<Aggregate>> {
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            return Err(EventStoreError::InvalidArgument(format!(
                "per_page must be between 1 and {MAX_PER_PAGE}, got {}",
                self.per_page
            )));
        }

        self.token
            .as_deref()
            .map(Aggregate::from_page_token)
            .transpose()
    }

    /// Whether `aggregate` passes the type filter
    pub fn matches(&self, aggregate: &Aggregate) -> bool {
        self.aggregate_type
            .as_deref()
            .map_or(true, |t| t == aggregate.aggregate_type)
    }
}

/// One page of aggregates
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListAggregatesResult {
    pub aggregates: Vec<Aggregate>,

    /// Absent on the last page
    pub next_page_token: Option<String>,
}

impl ListAggregatesResult {
    /// Build a page from an ordered, already-filtered candidate iterator
    ///
    /// Takes `per_page` items and peeks once more to decide whether a
    /// continuation token is needed.
    pub fn paginate(mut candidates: impl Iterator<Item = Aggregate>, per_page: usize) -> Self {
        let aggregates: Vec<Aggregate> = candidates.by_ref().take(per_page).collect();
        let has_more = candidates.next().is_some();

        let next_page_token = match aggregates.last() {
            Some(last) if has_more => Some(last.page_token()),
            _ => None,
        };

        Self {
            aggregates,
            next_page_token,
        }
    }
}
