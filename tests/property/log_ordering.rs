// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Log Ordering
//!
//! However a history is split into batches, replay returns it in submission
//! order with sequences `1..=n`, and each save returns the running count.

use cim_saga::{EventRepository, InMemoryEventRepository, NewEvent};
use proptest::prelude::*;
use serde_json::json;

/// Split `total` events into batches of the given (non-zero) sizes
fn batch_sizes() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(1usize..8, 1..12)
}

proptest! {
    #[test]
    fn prop_replay_matches_submission_order(sizes in batch_sizes()) {
        tokio_test::block_on(async {
            let repository = InMemoryEventRepository::default();
            let mut version = 0;
            let mut next = 0u64;

            for size in &sizes {
                let batch: Vec<NewEvent> = (0..*size)
                    .map(|_| {
                        next += 1;
                        NewEvent::from_value("counted", json!({ "n": next }))
                    })
                    .collect();

                let saved = repository.save("counter", "c", version, batch).await.unwrap();
                prop_assert_eq!(saved, version + *size as u64);
                version = saved;
            }

            let events = repository.list("counter", "c").await.unwrap();
            prop_assert_eq!(events.len() as u64, version);

            for (i, event) in events.iter().enumerate() {
                let expected = i as u64 + 1;
                prop_assert_eq!(event.sequence, expected);
                prop_assert_eq!(&event.data, &json!({ "n": expected }));
                prop_assert!(event.originating_version < event.sequence);
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_any_stale_version_conflicts(sizes in batch_sizes(), stale_offset in 1u64..20) {
        tokio_test::block_on(async {
            let repository = InMemoryEventRepository::default();
            let mut version = 0;
            for size in &sizes {
                let batch = (0..*size)
                    .map(|_| NewEvent::from_value("counted", json!(null)))
                    .collect();
                version = repository.save("counter", "c", version, batch).await.unwrap();
            }

            // Anything other than the current version is rejected, ahead or behind
            let stale = if stale_offset <= version { version - stale_offset } else { version + stale_offset };
            let err = repository
                .save("counter", "c", stale, vec![NewEvent::from_value("counted", json!(null))])
                .await
                .unwrap_err();

            prop_assert!(err.is_conflict());
            prop_assert_eq!(repository.list("counter", "c").await.unwrap().len() as u64, version);
            Ok(())
        })?;
    }
}
