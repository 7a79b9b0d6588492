// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Aggregate Pagination
//!
//! For any population and page size, walking the pages visits every
//! aggregate exactly once, in key order, and only the final page lacks a
//! continuation token.

use std::collections::BTreeSet;

use cim_saga::event_store::aggregates;
use cim_saga::{Aggregate, EventRepository, InMemoryEventRepository, ListAggregatesCriteria, NewEvent};
use proptest::prelude::*;

const TYPES: [&str; 3] = ["alpha", "beta", "gamma"];

fn population() -> impl Strategy<Value = BTreeSet<(usize, u16)>> {
    prop::collection::btree_set((0usize..TYPES.len(), 0u16..500), 0..120)
}

async fn seeded(population: &BTreeSet<(usize, u16)>) -> InMemoryEventRepository {
    let repository = InMemoryEventRepository::default();
    for (t, id) in population {
        let event = NewEvent::from_value("created", serde_json::Value::Null);
        repository
            .save(TYPES[*t], &id.to_string(), 0, vec![event])
            .await
            .unwrap();
    }
    repository
}

proptest! {
    #[test]
    fn prop_pages_cover_everything_once(population in population(), per_page in 1usize..40) {
        tokio_test::block_on(async {
            let repository = seeded(&population).await;
            let expected: Vec<Aggregate> = population
                .iter()
                .map(|(t, id)| Aggregate::new(TYPES[*t], id.to_string()))
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            let mut listed = Vec::new();
            let mut token = None;
            loop {
                let page = repository
                    .list_aggregates(
                        ListAggregatesCriteria::default()
                            .with_per_page(per_page)
                            .with_token(token.take()),
                    )
                    .await
                    .unwrap();

                prop_assert!(page.aggregates.len() <= per_page);
                let done = page.next_page_token.is_none();
                if !done {
                    prop_assert_eq!(page.aggregates.len(), per_page);
                }
                listed.extend(page.aggregates);

                match page.next_page_token {
                    Some(next) => token = Some(next),
                    None => break,
                }
            }

            prop_assert_eq!(listed, expected);
            Ok(())
        })?;
    }

    #[test]
    fn prop_type_filtered_iterator_matches_population(
        population in population(),
        per_page in 1usize..40,
        filter in 0usize..3,
    ) {
        tokio_test::block_on(async {
            let repository = seeded(&population).await;
            let expected: BTreeSet<String> = population
                .iter()
                .filter(|(t, _)| *t == filter)
                .map(|(_, id)| id.to_string())
                .collect();

            let listed = aggregates(&repository, Some(TYPES[filter]), per_page)
                .try_collect()
                .await
                .unwrap();

            prop_assert!(listed.iter().all(|a| a.aggregate_type == TYPES[filter]));
            let ids: Vec<String> = listed.into_iter().map(|a| a.aggregate_id).collect();
            prop_assert_eq!(ids, expected.into_iter().collect::<Vec<_>>());
            Ok(())
        })?;
    }
}
