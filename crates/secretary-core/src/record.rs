//! Task/event records: the unit the planner schedules and the sync layer
//! projects calendar events into.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

use crate::sync::types::Provider;

/// Duration used when a record carries none.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Whether a record may be moved by the planner.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Schedulable item; the planner chooses its time.
    Task,
    /// Calendar event with an immovable time.
    Event,
}

impl Default for RecordKind {
    fn default() -> Self {
        RecordKind::Task
    }
}

/// Priority bucket used to order flexible placement.
///
/// `Objective` ranks below `Low`. This mirrors the ordering the product has
/// always shipped with and is kept for compatibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[serde(alias = "obj")]
    Objective,
}

impl Priority {
    /// Numeric rank, higher is placed first.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::High => 3,
            Priority::Medium => 2,
            Priority::Low => 1,
            Priority::Objective => 0,
        }
    }

    /// Placement order: higher rank sorts first.
    pub fn placement_order(a: &Priority, b: &Priority) -> Ordering {
        b.rank().cmp(&a.rank())
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
            Priority::Objective => "objective",
        };
        f.write_str(s)
    }
}

/// A task or event for one user.
///
/// `date` + duration define the half-open interval `[date, date + duration)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Opaque identifier assigned by the owning store
    pub id: String,
    pub title: String,
    /// Scheduled start; required for planning
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub kind: RecordKind,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    /// External identity for records sourced from a calendar provider
    #[serde(default)]
    pub provider_event_id: Option<String>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    /// Lookup-only back-reference to a goal
    #[serde(default)]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub provider: Option<Provider>,
    /// Local id of the calendar event this record was projected from
    #[serde(default)]
    pub calendar_event_id: Option<String>,
    /// Set when the planner chose this record's time
    #[serde(default)]
    pub is_scheduled: bool,
}

impl TaskRecord {
    /// Create a flexible task with a fresh id.
    pub fn task(title: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            date: None,
            duration_minutes: None,
            kind: RecordKind::Task,
            priority: Priority::default(),
            completed: false,
            provider_event_id: None,
            last_modified: None,
            goal_id: None,
            location: None,
            provider: None,
            calendar_event_id: None,
            is_scheduled: false,
        }
    }

    /// Create a fixed event with a fresh id.
    pub fn event(title: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            kind: RecordKind::Event,
            date: Some(date),
            ..Self::task(title)
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }

    pub fn with_goal(mut self, goal_id: impl Into<String>) -> Self {
        self.goal_id = Some(goal_id.into());
        self
    }

    /// Duration in minutes, falling back to [`DEFAULT_DURATION_MINUTES`].
    pub fn duration(&self) -> u32 {
        self.duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES)
    }

    /// Fixed events are never moved by the planner.
    pub fn is_fixed(&self) -> bool {
        self.kind == RecordKind::Event
    }

    pub fn is_flexible(&self) -> bool {
        self.kind == RecordKind::Task
    }

    /// End of the record's interval, if it has a start.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.date
            .map(|start| start + Duration::minutes(i64::from(self.duration())))
    }

    /// The half-open interval `[date, date + duration)`.
    pub fn interval(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.date?, self.end_time()?))
    }

    /// Check if this record overlaps with a time range.
    ///
    /// Touching endpoints do not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        match self.interval() {
            Some((own_start, own_end)) => intervals_overlap(own_start, own_end, start, end),
            None => false,
        }
    }
}

/// Half-open overlap test: `startA < endB && startB < endA`.
pub fn intervals_overlap(
    start_a: DateTime<Utc>,
    end_a: DateTime<Utc>,
    start_b: DateTime<Utc>,
    end_b: DateTime<Utc>,
) -> bool {
    start_a < end_b && start_b < end_a
}

/// Display ordering: by date ascending, undated records last.
pub fn by_date(a: &TaskRecord, b: &TaskRecord) -> Ordering {
    match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
    }

    #[test]
    fn duration_defaults_to_thirty_minutes() {
        let task = TaskRecord::task("Inbox zero");
        assert_eq!(task.duration(), 30);
        assert_eq!(task.with_duration(45).duration(), 45);
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let event = TaskRecord::event("Standup", at(10, 0)).with_duration(60);
        assert!(!event.overlaps(at(9, 0), at(10, 0)));
        assert!(!event.overlaps(at(11, 0), at(12, 0)));
        assert!(event.overlaps(at(10, 59), at(11, 30)));
    }

    #[test]
    fn undated_record_never_overlaps() {
        let task = TaskRecord::task("Someday");
        assert!(task.interval().is_none());
        assert!(!task.overlaps(at(0, 0), at(23, 0)));
    }

    #[test]
    fn priority_deserializes_obj_alias() {
        let p: Priority = serde_json::from_str("\"obj\"").unwrap();
        assert_eq!(p, Priority::Objective);
        let p: Priority = serde_json::from_str("\"objective\"").unwrap();
        assert_eq!(p, Priority::Objective);
    }

    #[test]
    fn objective_ranks_below_low() {
        assert!(Priority::Low.rank() > Priority::Objective.rank());
        assert_eq!(
            Priority::placement_order(&Priority::High, &Priority::Low),
            Ordering::Less
        );
    }

    #[test]
    fn record_deserializes_with_defaults() {
        let json = r#"{"id": "t1", "title": "Write report"}"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, RecordKind::Task);
        assert_eq!(record.priority, Priority::Medium);
        assert!(record.date.is_none());
        assert!(!record.completed);
    }

    #[test]
    fn by_date_puts_undated_last() {
        let mut records = vec![
            TaskRecord::task("undated"),
            TaskRecord::task("late").with_date(at(15, 0)),
            TaskRecord::task("early").with_date(at(9, 0)),
        ];
        records.sort_by(by_date);
        let titles: Vec<_> = records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, ["early", "late", "undated"]);
    }
}
