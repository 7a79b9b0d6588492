// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Repository Integration Tests
//!
//! Exercises the in-memory repository through the `EventRepository` trait:
//! replay ordering, optimistic concurrency under real concurrent tasks, and
//! aggregate pagination across many pages.

mod fixtures;

use std::collections::HashSet;
use std::sync::Arc;

use cim_saga::event_store::aggregates;
use cim_saga::{
    EventRepository, EventStoreError, InMemoryEventRepository, ListAggregatesCriteria, NewEvent,
};
use fixtures::*;
use pretty_assertions::assert_eq;
use serde_json::json;

#[tokio::test]
async fn test_round_trip_preserves_order_and_payload() {
    let repository = memory_repository();
    let history = resource_history();

    let version = repository
        .save("resource", "r-1", 0, history.clone())
        .await
        .unwrap();
    assert_eq!(version, 3);

    let stored = repository.list("resource", "r-1").await.unwrap();
    assert_eq!(stored.len(), history.len());

    for (i, (stored, original)) in stored.iter().zip(&history).enumerate() {
        assert_eq!(stored.sequence, i as u64 + 1);
        assert_eq!(stored.originating_version, 0);
        assert_eq!(stored.event_id, original.event_id);
        assert_eq!(stored.event_type, original.event_type);
        assert_eq!(stored.timestamp, original.timestamp);
        assert_eq!(stored.data, original.data);
        assert_eq!(stored.aggregate_type, "resource");
        assert_eq!(stored.aggregate_id, "r-1");
    }
}

#[tokio::test]
async fn test_successive_saves_continue_sequence() {
    let repository = memory_repository();

    let v1 = repository
        .save("resource", "r-1", 0, resource_history())
        .await
        .unwrap();
    let v2 = repository
        .save("resource", "r-1", v1, vec![event_at("resourceDeleted", EVENT_ID_1, 9)])
        .await
        .unwrap();

    assert_eq!(v2, 4);
    let stored = repository.list("resource", "r-1").await.unwrap();
    let sequences: Vec<u64> = stored.iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![1, 2, 3, 4]);
    assert_eq!(stored[3].originating_version, 3);
}

#[tokio::test]
async fn test_conflict_writes_nothing() {
    let repository = memory_repository();
    repository
        .save("resource", "r-1", 0, resource_history())
        .await
        .unwrap();

    let err = repository
        .save("resource", "r-1", 1, resource_history())
        .await
        .unwrap_err();

    match err {
        EventStoreError::Conflict {
            expected, actual, ..
        } => {
            assert_eq!(expected, 1);
            assert_eq!(actual, Some(3));
        }
        other => panic!("expected conflict, got {other:?}"),
    }
    assert_eq!(repository.list("resource", "r-1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_concurrent_saves_exactly_one_wins() {
    let repository = memory_repository();
    repository
        .save("resource", "r-1", 0, resource_history())
        .await
        .unwrap();

    let writers: Vec<_> = (0..16)
        .map(|writer| {
            let repository = Arc::clone(&repository);
            tokio::spawn(async move {
                let event = NewEvent::from_value("resourceTagged", json!({ "writer": writer }));
                repository.save("resource", "r-1", 3, vec![event]).await
            })
        })
        .collect();

    let mut wins = 0;
    let mut conflicts = 0;
    for writer in writers {
        match writer.await.unwrap() {
            Ok(version) => {
                assert_eq!(version, 4);
                wins += 1;
            }
            Err(e) if e.is_conflict() => conflicts += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    assert_eq!((wins, conflicts), (1, 15));
    assert_eq!(repository.list("resource", "r-1").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_pagination_over_2500_aggregates() {
    let repository = memory_repository();
    for i in 0..2500 {
        repository
            .save("resource", &padded_id(i), 0, vec![event_at("created", EVENT_ID_1, 0)])
            .await
            .unwrap();
    }

    let mut page_sizes = Vec::new();
    let mut seen = HashSet::new();
    let mut token = None;
    loop {
        let page = repository
            .list_aggregates(
                ListAggregatesCriteria::default()
                    .with_per_page(1000)
                    .with_token(token.take()),
            )
            .await
            .unwrap();

        page_sizes.push(page.aggregates.len());
        for aggregate in page.aggregates {
            assert!(seen.insert(aggregate), "aggregate listed twice");
        }

        match page.next_page_token {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    assert_eq!(page_sizes, vec![1000, 1000, 500]);
    assert_eq!(seen.len(), 2500);
}

#[tokio::test]
async fn test_exact_multiple_has_no_trailing_token() {
    let repository = memory_repository();
    for i in 0..4 {
        repository
            .save("resource", &padded_id(i), 0, vec![event_at("created", EVENT_ID_1, 0)])
            .await
            .unwrap();
    }

    let first = repository
        .list_aggregates(ListAggregatesCriteria::default().with_per_page(2))
        .await
        .unwrap();
    assert!(first.next_page_token.is_some());

    let second = repository
        .list_aggregates(
            ListAggregatesCriteria::default()
                .with_per_page(2)
                .with_token(first.next_page_token),
        )
        .await
        .unwrap();
    assert_eq!(second.aggregates.len(), 2);
    assert_eq!(second.next_page_token, None);
}

#[tokio::test]
async fn test_aggregates_iterator_filters_by_type() {
    let repository = memory_repository();
    for i in 0..5 {
        let id = padded_id(i);
        repository
            .save("resource", &id, 0, vec![event_at("created", EVENT_ID_1, 0)])
            .await
            .unwrap();
        repository
            .save("network", &id, 0, vec![event_at("created", EVENT_ID_2, 0)])
            .await
            .unwrap();
    }

    let networks = aggregates(repository.as_ref(), Some("network"), 2)
        .try_collect()
        .await
        .unwrap();

    assert_eq!(networks.len(), 5);
    assert!(networks.iter().all(|a| a.aggregate_type == "network"));
}

#[tokio::test]
async fn test_invalid_page_requests() {
    let repository = InMemoryEventRepository::default();

    for criteria in [
        ListAggregatesCriteria::default().with_per_page(0),
        ListAggregatesCriteria::default().with_per_page(1001),
        ListAggregatesCriteria::default().with_token(Some("not a token".to_string())),
    ] {
        assert!(matches!(
            repository.list_aggregates(criteria).await,
            Err(EventStoreError::InvalidArgument(_))
        ));
    }
}
