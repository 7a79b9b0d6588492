// Copyright (c) 2025 - Cowboy AI, Inc.
//! NATS JetStream Event Repository
//!
//! Implements [`EventRepository`] on NATS JetStream:
//! - One subject per aggregate: `<prefix>.<aggregate_type>.<aggregate_id>`
//! - One [`Commit`] message per successful save, so a batch is atomic
//! - Optimistic concurrency through `Nats-Expected-Last-Subject-Sequence`:
//!   the server rejects the publish if another commit landed on the subject
//!   after the version was read
//!
//! # Example
//!
//! ```rust,no_run
//! use cim_saga::event_store::NatsEventRepository;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repository = NatsEventRepository::connect("nats://localhost:4222").await?;
//!     // Use repository...
//!     Ok(())
//! }
//! ```

use async_nats::jetstream::{
    self,
    consumer::{pull, AckPolicy, DeliverPolicy},
    context::Publish,
};
use async_nats::ConnectOptions;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use crate::config::NatsConfig;
use crate::errors::{EventStoreError, StoreResult};
use crate::event_store::{ensure_not_empty, EventRepository};
use crate::events::{
    Aggregate, ListAggregatesCriteria, ListAggregatesResult, NewEvent, StoredEvent, Version,
};
use crate::jetstream::{create_event_stream, Commit, JetStreamConfig};

/// Messages pulled per fetch while replaying a subject
const BATCH_SIZE: usize = 1000;

/// Last commit on an aggregate subject
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct SubjectHead {
    version: Version,
    stream_sequence: u64,
}

/// NATS JetStream-backed event repository
pub struct NatsEventRepository {
    /// NATS JetStream context
    jetstream: jetstream::Context,

    /// Stream and subject layout
    config: JetStreamConfig,
}

impl NatsEventRepository {
    /// Connect to NATS and create or get the saga events stream
    pub async fn connect(nats_url: &str) -> StoreResult<Self> {
        let client = async_nats::connect(nats_url)
            .await
            .map_err(|e| EventStoreError::NatsConnection(e.to_string()))?;

        Self::from_client(client, JetStreamConfig::default()).await
    }

    /// Connect with custom configuration
    pub async fn connect_with_config(
        nats: &NatsConfig,
        config: JetStreamConfig,
    ) -> StoreResult<Self> {
        let connect_options = ConnectOptions::new()
            .name(&nats.name)
            .connection_timeout(nats.connect_timeout)
            .request_timeout(Some(nats.request_timeout));

        let client = async_nats::connect_with_options(nats.servers.join(","), connect_options)
            .await
            .map_err(|e| EventStoreError::NatsConnection(e.to_string()))?;

        info!("Connected to NATS at {:?}", nats.servers);

        Self::from_client(client, config).await
    }

    /// Build on an existing client
    pub async fn from_client(client: async_nats::Client, config: JetStreamConfig) -> StoreResult<Self> {
        let jetstream = jetstream::new(client);
        create_event_stream(jetstream.clone(), &config).await?;

        Ok(Self { jetstream, config })
    }

    /// Build subject for an aggregate
    ///
    /// Format: <prefix>.<aggregate_type>.<aggregate_id>
    fn build_subject(&self, aggregate_type: &str, aggregate_id: &str) -> StoreResult<String> {
        validate_token("aggregate type", aggregate_type)?;
        validate_token("aggregate id", aggregate_id)?;

        Ok(format!(
            "{}.{}.{}",
            self.config.subject_prefix, aggregate_type, aggregate_id
        ))
    }

    /// Drain an ephemeral consumer filtered on `filter_subject`
    async fn fetch_all(
        &self,
        filter_subject: String,
        deliver_policy: DeliverPolicy,
    ) -> StoreResult<Vec<jetstream::Message>> {
        let stream = self
            .jetstream
            .get_stream(&self.config.stream_name)
            .await
            .map_err(|e| EventStoreError::NatsConnection(e.to_string()))?;

        let consumer = stream
            .create_consumer(pull::Config {
                filter_subject,
                deliver_policy,
                ack_policy: AckPolicy::None,
                ..Default::default()
            })
            .await
            .map_err(|e| EventStoreError::NatsConnection(e.to_string()))?;

        let mut fetched = Vec::new();

        loop {
            let messages_result = consumer.fetch().max_messages(BATCH_SIZE).messages().await;

            let mut messages = match messages_result {
                Ok(msgs) => msgs,
                Err(e) if is_end_of_messages(&e.to_string()) => break,
                Err(e) => return Err(EventStoreError::NatsConnection(e.to_string())),
            };

            let mut batch_count = 0;

            while let Some(message) = messages.next().await {
                let msg = message.map_err(|e| EventStoreError::NatsConnection(e.to_string()))?;
                fetched.push(msg);
                batch_count += 1;
            }

            if batch_count < BATCH_SIZE {
                break;
            }
        }

        Ok(fetched)
    }

    /// Read commits on a subject in stream order, with their stream sequences
    async fn read_commits(
        &self,
        subject: &str,
        deliver_policy: DeliverPolicy,
    ) -> StoreResult<Vec<(u64, Commit)>> {
        let messages = self.fetch_all(subject.to_string(), deliver_policy).await?;

        let mut commits = Vec::with_capacity(messages.len());
        for msg in messages {
            let stream_sequence = msg
                .info()
                .map_err(|e| EventStoreError::NatsConnection(e.to_string()))?
                .stream_sequence;

            let commit: Commit = serde_json::from_slice(&msg.payload)?;
            commits.push((stream_sequence, commit));
        }

        commits.sort_by_key(|(stream_sequence, _)| *stream_sequence);
        Ok(commits)
    }

    /// Current version and last stream sequence of a subject
    async fn read_head(&self, subject: &str) -> StoreResult<SubjectHead> {
        let commits = self
            .read_commits(subject, DeliverPolicy::LastPerSubject)
            .await?;

        Ok(commits
            .last()
            .map(|(stream_sequence, commit)| SubjectHead {
                version: commit.version(),
                stream_sequence: *stream_sequence,
            })
            .unwrap_or_default())
    }

    /// Every aggregate in the stream, in `(type, id)` order
    ///
    /// Reads the last commit of each subject under the prefix, one message
    /// per aggregate.
    async fn read_aggregates(&self) -> StoreResult<BTreeSet<Aggregate>> {
        let filter = format!("{}.>", self.config.subject_prefix);
        let messages = self
            .fetch_all(filter, DeliverPolicy::LastPerSubject)
            .await?;

        let mut aggregates = BTreeSet::new();
        for msg in messages {
            let subject = msg.subject.to_string();
            match parse_subject(&self.config.subject_prefix, &subject) {
                Some(aggregate) => {
                    aggregates.insert(aggregate);
                }
                None => warn!(subject = %subject, "Ignoring subject outside the aggregate layout"),
            }
        }
        Ok(aggregates)
    }
}

#[async_trait]
impl EventRepository for NatsEventRepository {
    async fn save(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
        originating_version: Version,
        new_events: Vec<NewEvent>,
    ) -> StoreResult<Version> {
        ensure_not_empty(aggregate_type, aggregate_id, &new_events)?;
        let subject = self.build_subject(aggregate_type, aggregate_id)?;

        let conflict = |actual: Option<Version>| EventStoreError::Conflict {
            aggregate_type: aggregate_type.to_string(),
            aggregate_id: aggregate_id.to_string(),
            expected: originating_version,
            actual,
        };

        let head = self.read_head(&subject).await?;
        if head.version != originating_version {
            debug!(
                subject = %subject,
                expected = originating_version,
                actual = head.version,
                "Rejected save with stale version"
            );
            return Err(conflict(Some(head.version)));
        }

        let events: Vec<StoredEvent> = new_events
            .into_iter()
            .enumerate()
            .map(|(offset, event)| {
                event.into_stored(
                    aggregate_type,
                    aggregate_id,
                    originating_version + offset as u64 + 1,
                    originating_version,
                )
            })
            .collect();
        let commit = Commit { events };
        let version = commit.version();

        let payload = serde_json::to_vec(&commit)?;
        let publish = Publish::build()
            .payload(payload.into())
            .expected_last_subject_sequence(head.stream_sequence);

        // The server compares the subject's last sequence atomically with the append
        let ack = match self.jetstream.send_publish(subject.clone(), publish).await {
            Ok(ack_future) => ack_future.await,
            Err(e) => Err(e),
        };

        match ack {
            Ok(ack) => {
                debug!(
                    subject = %subject,
                    count = commit.events.len(),
                    version,
                    stream_sequence = ack.sequence,
                    "Appended commit"
                );
                Ok(version)
            }
            Err(e) if is_wrong_sequence(&e.to_string()) => {
                debug!(subject = %subject, "Concurrent commit won the subject sequence check");
                Err(conflict(None))
            }
            Err(e) => Err(EventStoreError::NatsPublish(e.to_string())),
        }
    }

    async fn list(
        &self,
        aggregate_type: &str,
        aggregate_id: &str,
    ) -> StoreResult<Vec<StoredEvent>> {
        let subject = self.build_subject(aggregate_type, aggregate_id)?;
        let commits = self.read_commits(&subject, DeliverPolicy::All).await?;

        let mut events: Vec<StoredEvent> = commits
            .into_iter()
            .flat_map(|(_, commit)| commit.events)
            .collect();

        // Sort by sequence to ensure ordering
        events.sort_by_key(|e| e.sequence);

        Ok(events)
    }

    async fn list_aggregates(
        &self,
        criteria: ListAggregatesCriteria,
    ) -> StoreResult<ListAggregatesResult> {
        let after = criteria.validate()?;
        let aggregates = self.read_aggregates().await?;

        let candidates = aggregates
            .into_iter()
            .filter(|aggregate| after.as_ref().map_or(true, |after| aggregate > after))
            .filter(|aggregate| criteria.matches(aggregate));

        Ok(ListAggregatesResult::paginate(candidates, criteria.per_page))
    }
}

/// Check a value can be used as a single NATS subject token
fn validate_token(what: &str, token: &str) -> StoreResult<()> {
    let invalid = token.is_empty()
        || token
            .chars()
            .any(|c| matches!(c, '.' | '*' | '>') || c.is_whitespace());

    if invalid {
        return Err(EventStoreError::InvalidArgument(format!(
            "{what} '{token}' is not a valid subject token"
        )));
    }
    Ok(())
}

/// Split `<prefix>.<type>.<id>` back into an aggregate
fn parse_subject(prefix: &str, subject: &str) -> Option<Aggregate> {
    let rest = subject.strip_prefix(prefix)?.strip_prefix('.')?;
    let (aggregate_type, aggregate_id) = rest.split_once('.')?;

    if aggregate_type.is_empty() || aggregate_id.is_empty() || aggregate_id.contains('.') {
        return None;
    }
    Some(Aggregate::new(aggregate_type, aggregate_id))
}

fn is_wrong_sequence(message: &str) -> bool {
    message.to_lowercase().contains("wrong last sequence")
}

/// A fetch without `expires` answers an exhausted consumer with a
/// "no messages" status; anything else, timeouts included, is a fault.
fn is_end_of_messages(message: &str) -> bool {
    message.to_lowercase().contains("no messages")
}
