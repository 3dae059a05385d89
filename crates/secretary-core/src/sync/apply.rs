//! Applying a diff to the caller's collections.
//!
//! Nothing here mutates its inputs. Each call either returns the complete
//! next state or the reason it could not be produced; rolling back or
//! retrying is the caller's decision.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::record::TaskRecord;
use crate::sync::diff::diff;
use crate::sync::types::{EventDiff, EventRecord, Provider, SyncStats};

/// Next state after a provider sync.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Every stored event, all providers included.
    pub events: Vec<EventRecord>,
    /// Every task, with calendar-linked records refreshed.
    pub tasks: Vec<TaskRecord>,
    pub stats: SyncStats,
}

/// Apply `diff` to the full event collection and the task list.
///
/// Deletions drop the event and every task linked to it. Creates and updates
/// are projected into tasks; an existing linked task keeps its `completed`
/// flag and `goal_id`, which the provider knows nothing about.
///
/// # Errors
///
/// Returns [`SyncError::UnknownLocalEvent`] when an update targets an event
/// that is no longer in `events`, which means the diff was computed against a
/// stale snapshot.
pub fn apply_diff(
    events: &[EventRecord],
    tasks: &[TaskRecord],
    diff: &EventDiff,
) -> Result<SyncOutcome, SyncError> {
    let deleted: HashSet<&str> = diff.to_delete.iter().map(|e| e.id.as_str()).collect();
    let updates: HashMap<&str, &EventRecord> =
        diff.to_update.iter().map(|e| (e.id.as_str(), e)).collect();

    for id in updates.keys() {
        if !events.iter().any(|e| e.id == *id) {
            return Err(SyncError::UnknownLocalEvent { id: id.to_string() });
        }
    }

    let mut next_events: Vec<EventRecord> = events
        .iter()
        .filter(|e| !deleted.contains(e.id.as_str()))
        .map(|e| match updates.get(e.id.as_str()) {
            Some(updated) => (*updated).clone(),
            None => e.clone(),
        })
        .collect();
    next_events.extend(diff.to_create.iter().cloned());

    let mut next_tasks: Vec<TaskRecord> = tasks
        .iter()
        .filter(|t| {
            t.calendar_event_id
                .as_deref()
                .map_or(true, |id| !deleted.contains(id))
        })
        .cloned()
        .collect();

    for event in diff.to_create.iter().chain(diff.to_update.iter()) {
        let projected = event.to_task();
        let existing = next_tasks
            .iter_mut()
            .find(|t| t.calendar_event_id.as_deref() == Some(event.id.as_str()));
        match existing {
            Some(task) => {
                let completed = task.completed;
                let goal_id = task.goal_id.take();
                *task = TaskRecord {
                    id: task.id.clone(),
                    completed,
                    goal_id,
                    ..projected
                };
            }
            None => next_tasks.push(projected),
        }
    }

    Ok(SyncOutcome {
        events: next_events,
        tasks: next_tasks,
        stats: diff.stats(),
    })
}

/// Pure orchestration of a single provider sync.
///
/// Fetching is the caller's job; the engine only diffs and applies.
#[derive(Debug, Clone, Copy)]
pub struct SyncEngine {
    provider: Provider,
}

impl SyncEngine {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// Diff the stored events of this provider against `fetched`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::ProviderMismatch`] if a fetched event claims a
    /// different provider.
    pub fn detect_changes(
        &self,
        events: &[EventRecord],
        fetched: &[EventRecord],
    ) -> Result<EventDiff, SyncError> {
        if let Some(foreign) = fetched.iter().find(|e| e.provider != self.provider) {
            return Err(SyncError::ProviderMismatch {
                id: foreign.id.clone(),
                expected: self.provider.to_string(),
                found: foreign.provider.to_string(),
            });
        }

        let local: Vec<EventRecord> = events
            .iter()
            .filter(|e| e.provider == self.provider)
            .cloned()
            .collect();

        Ok(diff(&local, fetched))
    }

    /// Diff and apply in one step.
    ///
    /// # Errors
    ///
    /// Propagates [`SyncEngine::detect_changes`] and [`apply_diff`] failures.
    pub fn sync_provider(
        &self,
        events: &[EventRecord],
        tasks: &[TaskRecord],
        fetched: &[EventRecord],
    ) -> Result<SyncOutcome, SyncError> {
        tracing::debug!(provider = %self.provider, fetched = fetched.len(), "starting sync");

        let changes = self.detect_changes(events, fetched)?;
        let outcome = apply_diff(events, tasks, &changes)?;

        tracing::info!(
            provider = %self.provider,
            created = outcome.stats.created,
            updated = outcome.stats.updated,
            deleted = outcome.stats.deleted,
            "sync applied"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, 0, 0).unwrap()
    }

    fn gevent(id: &str, key: &str, modified: u32) -> EventRecord {
        let mut e = EventRecord::new(Provider::Google, format!("Event {key}"), ts(10))
            .with_end(ts(11))
            .with_provider_event_id(key)
            .with_last_modified(ts(modified));
        e.id = id.to_string();
        e
    }

    #[test]
    fn deleted_event_removes_linked_task() {
        let events = vec![gevent("ev-1", "g1", 1)];
        let tasks = vec![events[0].to_task(), TaskRecord::task("Unrelated")];

        let changes = diff(&events, &[]);
        let outcome = apply_diff(&events, &tasks, &changes).unwrap();

        assert!(outcome.events.is_empty());
        assert_eq!(outcome.tasks.len(), 1);
        assert_eq!(outcome.tasks[0].title, "Unrelated");
        assert_eq!(outcome.stats.deleted, 1);
    }

    #[test]
    fn created_event_is_projected_into_task() {
        let fetched = vec![gevent("ev-new", "g1", 1)];
        let changes = diff(&[], &fetched);
        let outcome = apply_diff(&[], &[], &changes).unwrap();

        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.tasks.len(), 1);
        let task = &outcome.tasks[0];
        assert!(task.is_fixed());
        assert_eq!(task.calendar_event_id.as_deref(), Some("ev-new"));
        assert_eq!(task.duration(), 60);
    }

    #[test]
    fn update_refreshes_task_but_keeps_completion_and_goal() {
        let events = vec![gevent("ev-1", "g1", 1)];
        let mut linked = events[0].to_task().with_goal("goal-7");
        linked.completed = true;

        let mut upstream = gevent("remote", "g1", 2);
        upstream.title = "Moved meeting".to_string();
        upstream.start_time = ts(13);
        upstream.end_time = Some(ts(14));

        let changes = diff(&events, &[upstream]);
        let outcome = apply_diff(&events, &[linked.clone()], &changes).unwrap();

        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].id, "ev-1");
        assert_eq!(outcome.events[0].title, "Moved meeting");

        let task = &outcome.tasks[0];
        assert_eq!(task.id, linked.id);
        assert_eq!(task.title, "Moved meeting");
        assert_eq!(task.date, Some(ts(13)));
        assert!(task.completed);
        assert_eq!(task.goal_id.as_deref(), Some("goal-7"));
    }

    #[test]
    fn stale_update_is_rejected() {
        let events = vec![gevent("ev-1", "g1", 1)];
        let changes = diff(&events, &[gevent("remote", "g1", 2)]);

        let result = apply_diff(&[], &[], &changes);
        assert_eq!(
            result,
            Err(SyncError::UnknownLocalEvent { id: "ev-1".to_string() })
        );
    }

    #[test]
    fn inputs_are_not_mutated() {
        let events = vec![gevent("ev-1", "g1", 1)];
        let tasks = vec![events[0].to_task()];
        let before = (events.clone(), tasks.clone());

        let changes = diff(&events, &[]);
        let _ = apply_diff(&events, &tasks, &changes).unwrap();

        assert_eq!((events, tasks), before);
    }

    #[test]
    fn engine_only_diffs_its_own_provider() {
        let mut outlook = gevent("ol-1", "o1", 1);
        outlook.provider = Provider::Outlook;
        let events = vec![gevent("ev-1", "g1", 1), outlook];

        let engine = SyncEngine::new(Provider::Google);
        let outcome = engine.sync_provider(&events, &[], &[]).unwrap();

        assert_eq!(outcome.stats.deleted, 1);
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].provider, Provider::Outlook);
    }

    #[test]
    fn engine_rejects_foreign_fetched_events() {
        let mut foreign = gevent("x", "o1", 1);
        foreign.provider = Provider::Apple;

        let engine = SyncEngine::new(Provider::Google);
        let err = engine.detect_changes(&[], &[foreign]).unwrap_err();
        assert!(matches!(err, SyncError::ProviderMismatch { .. }));
    }
}
