// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests for Saga Hydration
//!
//! Whatever steps a saga records and however they are split across saves,
//! a fresh load equals the in-memory saga after its last save.

use std::sync::Arc;

use cim_saga::{InMemoryEventRepository, Saga, SagaRepository};
use proptest::prelude::*;
use serde_json::json;

#[derive(Debug, Clone)]
enum Step {
    Command(u8),
    CompleteCommand(u8),
    Log(u8),
    LogError(u8),
    StartRollback,
    CompleteRollback,
    Complete(bool),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0u8..4).prop_map(Step::Command),
        (0u8..4).prop_map(Step::CompleteCommand),
        any::<u8>().prop_map(Step::Log),
        any::<u8>().prop_map(Step::LogError),
        Just(Step::StartRollback),
        Just(Step::CompleteRollback),
        any::<bool>().prop_map(Step::Complete),
    ]
}

fn apply(saga: &mut Saga, step: &Step) {
    match step {
        Step::Command(n) => saga.add_command(format!("step-{n}"), json!({ "n": n })),
        Step::CompleteCommand(n) => saga.complete_command(format!("step-{n}")),
        Step::Log(n) => saga.log(format!("log {n}")),
        Step::LogError(n) => saga.log_error(format!("log {n}"), "failed"),
        Step::StartRollback => saga.start_rollback(),
        Step::CompleteRollback => saga.complete_rollback(),
        Step::Complete(success) => saga.complete(*success),
    }
}

proptest! {
    #[test]
    fn prop_saved_saga_equals_fresh_load(
        saves in prop::collection::vec(prop::collection::vec(step(), 0..6), 1..5)
    ) {
        tokio_test::block_on(async {
            let sagas = SagaRepository::new(Arc::new(InMemoryEventRepository::default()));
            let mut saga = Saga::new("workflow", "w-1");
            let mut expected_version = 0;

            for steps in &saves {
                for step in steps {
                    apply(&mut saga, step);
                }
                expected_version += steps.len() as u64 + 1;
                let version = sagas.save(&mut saga, vec![]).await.unwrap();
                prop_assert_eq!(version, expected_version);

                let loaded = sagas.get("workflow", "w-1").await.unwrap().unwrap();
                prop_assert_eq!(&loaded, &saga);
                prop_assert_eq!(loaded.is_complete(), loaded.is_success().is_some());
            }
            Ok(())
        })?;
    }
}
