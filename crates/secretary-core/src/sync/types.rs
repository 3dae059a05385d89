//! Core types for calendar synchronization.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::record::{Priority, RecordKind, TaskRecord, DEFAULT_DURATION_MINUTES};

/// External calendar source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Outlook,
    Apple,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Outlook => "outlook",
            Provider::Apple => "apple",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "outlook" => Ok(Provider::Outlook),
            "apple" | "ics" => Ok(Provider::Apple),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// Per-event sync state as last recorded locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    #[default]
    Synced,
    Pending,
    Conflict,
}

/// A calendar event normalized from any provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Local identity, preserved across updates.
    pub id: String,
    pub provider: Provider,
    /// Provider-assigned identity; the only key used for matching.
    #[serde(default)]
    pub provider_event_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub location: String,
    /// Change detection heuristic; compared for equality only.
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default)]
    pub linked_task_id: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl EventRecord {
    /// Create an event with a fresh local id.
    pub fn new(provider: Provider, title: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            provider,
            provider_event_id: None,
            title: title.into(),
            description: String::new(),
            start_time,
            end_time: None,
            timezone: None,
            is_all_day: false,
            location: String::new(),
            last_modified: None,
            sync_status: SyncStatus::Synced,
            linked_task_id: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_provider_event_id(mut self, id: impl Into<String>) -> Self {
        self.provider_event_id = Some(id.into());
        self
    }

    pub fn with_end(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn with_last_modified(mut self, at: DateTime<Utc>) -> Self {
        self.last_modified = Some(at);
        self
    }

    /// Length in whole minutes.
    ///
    /// All-day events without an end span a full day; other events without a
    /// usable end fall back to the default record duration.
    pub fn duration_minutes(&self) -> u32 {
        match self.end_time {
            Some(end) if end > self.start_time => {
                u32::try_from((end - self.start_time).num_minutes()).unwrap_or(u32::MAX)
            }
            _ if self.is_all_day => Duration::days(1).num_minutes() as u32,
            _ => DEFAULT_DURATION_MINUTES,
        }
    }

    /// Project this event into a fixed task record.
    pub fn to_task(&self) -> TaskRecord {
        TaskRecord {
            id: self.linked_task_id.clone().unwrap_or_else(|| self.id.clone()),
            title: self.title.clone(),
            date: Some(self.start_time),
            duration_minutes: Some(self.duration_minutes()),
            kind: RecordKind::Event,
            priority: Priority::Medium,
            completed: false,
            provider_event_id: self.provider_event_id.clone(),
            last_modified: self.last_modified,
            goal_id: None,
            location: (!self.location.is_empty()).then(|| self.location.clone()),
            provider: Some(self.provider),
            calendar_event_id: Some(self.id.clone()),
            is_scheduled: false,
        }
    }
}

/// Create/update/delete triple produced by comparing two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventDiff {
    /// External events with no local counterpart.
    pub to_create: Vec<EventRecord>,
    /// External fields merged over the local id.
    pub to_update: Vec<EventRecord>,
    /// Local events absent from the external snapshot.
    pub to_delete: Vec<EventRecord>,
}

impl EventDiff {
    pub fn is_empty(&self) -> bool {
        self.to_create.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }

    pub fn stats(&self) -> SyncStats {
        SyncStats {
            created: self.to_create.len(),
            updated: self.to_update.len(),
            deleted: self.to_delete.len(),
        }
    }
}

/// Counts reported after a provider sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}
