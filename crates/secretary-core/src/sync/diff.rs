//! Snapshot diffing for one provider's events.
//!
//! Matching is by `provider_event_id` only. A matched pair counts as changed
//! when its `last_modified` values differ, and the external side wins
//! (last-write-wins). Clock skew between the local cache and the provider is
//! not accounted for, and two snapshots with equal timestamps but different
//! content are reported as unchanged.

use std::collections::{HashMap, HashSet};

use crate::sync::types::{EventDiff, EventRecord};

/// Stateless reconciler between a local snapshot and a fetched one.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScheduleDiffEngine;

impl ScheduleDiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute the operations that converge `local` to `external`.
    pub fn diff(&self, local: &[EventRecord], external: &[EventRecord]) -> EventDiff {
        diff(local, external)
    }
}

/// Compute the create/update/delete triple for one provider.
///
/// Inputs are left untouched; every output entry is an owned copy.
pub fn diff(local: &[EventRecord], external: &[EventRecord]) -> EventDiff {
    // First local copy of each key is the one that gets matched.
    let mut local_by_key: HashMap<&str, &EventRecord> = HashMap::new();
    for event in local {
        if let Some(key) = event.provider_event_id.as_deref() {
            local_by_key.entry(key).or_insert(event);
        }
    }

    // Last external occurrence of a key wins.
    let mut last_index: HashMap<&str, usize> = HashMap::new();
    for (index, event) in external.iter().enumerate() {
        if let Some(key) = event.provider_event_id.as_deref() {
            if let Some(previous) = last_index.insert(key, index) {
                tracing::warn!(
                    provider_event_id = key,
                    dropped_index = previous,
                    "duplicate provider_event_id in fetched snapshot"
                );
            }
        }
    }

    let mut result = EventDiff::default();
    let mut matched: HashSet<&str> = HashSet::new();

    for (index, ext) in external.iter().enumerate() {
        let Some(key) = ext.provider_event_id.as_deref() else {
            tracing::warn!(
                title = %ext.title,
                "fetched event has no provider_event_id, treating as create"
            );
            result.to_create.push(ext.clone());
            continue;
        };

        if last_index.get(key) != Some(&index) {
            continue;
        }

        match local_by_key.get(key) {
            None => result.to_create.push(ext.clone()),
            Some(loc) => {
                matched.insert(key);
                if loc.last_modified != ext.last_modified {
                    result.to_update.push(merge_external(loc, ext));
                }
            }
        }
    }

    for loc in local {
        let keep = match loc.provider_event_id.as_deref() {
            Some(key) => {
                matched.contains(key)
                    && local_by_key
                        .get(key)
                        .is_some_and(|first| std::ptr::eq(*first, loc))
            }
            None => false,
        };
        if !keep {
            result.to_delete.push(loc.clone());
        }
    }

    result
}

/// External fields win; the local identity is preserved.
///
/// Providers never know the local task link, so the local one is kept when
/// the external copy carries none.
pub fn merge_external(local: &EventRecord, external: &EventRecord) -> EventRecord {
    EventRecord {
        id: local.id.clone(),
        linked_task_id: external
            .linked_task_id
            .clone()
            .or_else(|| local.linked_task_id.clone()),
        ..external.clone()
    }
}
