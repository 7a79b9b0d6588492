// Copyright (c) 2025 - Cowboy AI, Inc.
//! Sagas
//!
//! A saga is a workflow-shaped aggregate layered on the event log. Its state
//! is never stored directly: it is rebuilt by replaying the saga events of
//! its log, plus whatever the current unit of work has added in memory.
//!
//! # Lifecycle
//!
//! ```text
//! NEW ──add events──▶ IN_PROGRESS ──save──▶ SAVED ──▶ IN_PROGRESS | COMPLETE
//!                      (pending)          (hydrated, marker advances)
//! ```
//!
//! `COMPLETE` only means [`Saga::is_complete`] returns true. The log never
//! refuses further events; a workflow engine that needs a hard stop checks
//! completion itself before mutating.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use cim_saga::event_store::InMemoryEventRepository;
//! use cim_saga::saga::{Saga, SagaRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sagas = SagaRepository::new(Arc::new(InMemoryEventRepository::default()));
//!
//!     let mut saga = Saga::new("deployCluster", "c-1");
//!     saga.add_command("createServerGroup", serde_json::json!({"size": 3}));
//!     sagas.save(&mut saga, vec![]).await?;
//!
//!     let mut saga = sagas.get("deployCluster", "c-1").await?.expect("saved above");
//!     saga.complete_command("createServerGroup");
//!     saga.complete(true);
//!     sagas.save(&mut saga, vec![]).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod events;
pub mod repository;

pub use events::{
    SagaCommand, SagaCommandCompleted, SagaCompleted, SagaEvent, SagaLogAppended, SagaRecord,
    SagaRollbackCompleted, SagaRollbackStarted, SagaSaved,
};
pub use repository::{ListCriteria, SagaRepository};

use std::collections::HashMap;

use crate::events::Version;

/// In-memory view of one saga
#[derive(Debug, Clone, PartialEq)]
pub struct Saga {
    name: String,
    id: String,
    sequence: u64,
    version: Version,
    events: Vec<SagaEvent>,
    pending_events: Vec<SagaEvent>,
}

impl Saga {
    /// Start a brand-new saga with no history
    pub fn new(name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            sequence: 0,
            version: 0,
            events: Vec::new(),
            pending_events: Vec::new(),
        }
    }

    /// Rebuild a saga from its durable state
    pub(crate) fn hydrate(
        name: impl Into<String>,
        id: impl Into<String>,
        sequence: u64,
        version: Version,
        events: Vec<SagaEvent>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            sequence,
            version,
            events,
            pending_events: Vec::new(),
        }
    }

    /// Saga name, the aggregate type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Saga id, the aggregate id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Version recorded by the latest saga-saved marker
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Log version this saga was hydrated at; the next save's originating version
    pub fn version(&self) -> Version {
        self.version
    }

    /// Durable events, in log order
    pub fn events(&self) -> &[SagaEvent] {
        &self.events
    }

    /// Events added since the last load or save
    pub fn pending_events(&self) -> &[SagaEvent] {
        &self.pending_events
    }

    pub fn add_event(&mut self, event: SagaEvent) {
        self.pending_events.push(event);
    }

    pub fn add_command(&mut self, name: impl Into<String>, payload: serde_json::Value) {
        self.add_event(SagaEvent::Command(SagaCommand {
            name: name.into(),
            payload,
        }));
    }

    pub fn complete_command(&mut self, command: impl Into<String>) {
        self.add_event(SagaEvent::CommandCompleted(SagaCommandCompleted {
            command: command.into(),
        }));
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.add_event(SagaEvent::LogAppended(SagaLogAppended {
            message: message.into(),
            error: None,
        }));
    }

    pub fn log_error(&mut self, message: impl Into<String>, error: impl Into<String>) {
        self.add_event(SagaEvent::LogAppended(SagaLogAppended {
            message: message.into(),
            error: Some(error.into()),
        }));
    }

    pub fn start_rollback(&mut self) {
        self.add_event(SagaEvent::RollbackStarted(SagaRollbackStarted {}));
    }

    pub fn complete_rollback(&mut self) {
        self.add_event(SagaEvent::RollbackCompleted(SagaRollbackCompleted {}));
    }

    pub fn complete(&mut self, success: bool) {
        self.add_event(SagaEvent::Completed(SagaCompleted { success }));
    }

    /// Hydrated then pending events
    pub fn all_events(&self) -> impl Iterator<Item = &SagaEvent> {
        self.events.iter().chain(self.pending_events.iter())
    }

    /// Whether a terminal event has been recorded
    pub fn is_complete(&self) -> bool {
        self.all_events()
            .any(|event| matches!(event, SagaEvent::Completed(_)))
    }

    /// Outcome of the latest terminal event, if any
    pub fn is_success(&self) -> Option<bool> {
        self.all_events()
            .filter_map(|event| match event {
                SagaEvent::Completed(c) => Some(c.success),
                _ => None,
            })
            .last()
    }

    /// A rollback has started and not yet finished
    pub fn is_compensating(&self) -> bool {
        let mut compensating = false;
        for event in self.all_events() {
            match event {
                SagaEvent::RollbackStarted(_) => compensating = true,
                SagaEvent::RollbackCompleted(_) => compensating = false,
                _ => {}
            }
        }
        compensating
    }

    pub fn has_completed_command(&self, command: &str) -> bool {
        self.all_events().any(|event| {
            matches!(event, SagaEvent::CommandCompleted(c) if c.command == command)
        })
    }

    /// Requested commands not yet completed, in request order
    ///
    /// Each completion settles the earliest unsettled request of that name,
    /// so a command requested twice and completed once stays outstanding.
    pub fn outstanding_commands(&self) -> Vec<&SagaCommand> {
        let mut completions: HashMap<&str, usize> = HashMap::new();
        for event in self.all_events() {
            if let SagaEvent::CommandCompleted(c) = event {
                *completions.entry(c.command.as_str()).or_default() += 1;
            }
        }

        self.all_events()
            .filter_map(|event| match event {
                SagaEvent::Command(c) => match completions.get_mut(c.name.as_str()) {
                    Some(settled) if *settled > 0 => {
                        *settled -= 1;
                        None
                    }
                    _ => Some(c),
                },
                _ => None,
            })
            .collect()
    }

    /// Log messages, in order
    pub fn logs(&self) -> Vec<&str> {
        self.all_events()
            .filter_map(|event| match event {
                SagaEvent::LogAppended(log) => Some(log.message.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Record a successful save of everything pending plus `saved`
    pub(crate) fn mark_saved(&mut self, saved: Vec<SagaEvent>, version: Version) {
        self.events.extend(self.pending_events.drain(..));
        self.events.extend(saved);
        self.version = version;
        self.sequence = version;
    }
}
