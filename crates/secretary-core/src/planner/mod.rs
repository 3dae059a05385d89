//! Greedy daily planner.
//!
//! Fixed events stay where they are. Flexible tasks are placed one by one,
//! highest priority first, at a cursor that moves past each collision plus a
//! buffer:
//! - Fixed events (`kind = event`, not completed) are anchors, sorted by date
//! - Flexible tasks (`kind = task`, not completed) are stable-sorted by priority
//! - The cursor starts at working-hours start, or at "now" rounded up when
//!   the planned day is already under way
//! - A task that cannot fit before working-hours end within the retry bound
//!   keeps its original date

mod window;

pub use window::{ClockTime, PlanOptions};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{by_date, intervals_overlap, Priority, TaskRecord};

/// Planner tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Gap left after a collision and after each placed task (minutes)
    #[serde(default = "default_buffer_minutes")]
    pub buffer_minutes: u32,
    /// Placement attempts per task before giving up
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Boundary "now" is rounded up to (minutes, 0 disables rounding)
    #[serde(default = "default_cursor_granularity")]
    pub cursor_granularity_minutes: u32,
    /// Duration for records that carry none (minutes)
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,
}

fn default_buffer_minutes() -> u32 {
    15
}
fn default_max_attempts() -> u32 {
    50
}
fn default_cursor_granularity() -> u32 {
    15
}
fn default_duration_minutes() -> u32 {
    crate::record::DEFAULT_DURATION_MINUTES
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            buffer_minutes: default_buffer_minutes(),
            max_attempts: default_max_attempts(),
            cursor_granularity_minutes: default_cursor_granularity(),
            default_duration_minutes: default_duration_minutes(),
        }
    }
}

/// Where the planner put a flexible task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedTask {
    pub id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Attempts used, including the successful one
    pub attempts: u32,
}

/// Full result of a planning pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    /// Every input record, re-dated where placed, sorted by date
    pub records: Vec<TaskRecord>,
    /// Placements in the order they were made
    pub placed: Vec<PlacedTask>,
    /// Ids of flexible tasks that could not be fit today
    pub unscheduled: Vec<String>,
}

/// Daily planner
pub struct DailyPlanner {
    config: PlannerConfig,
}

impl DailyPlanner {
    /// Create a new planner with default config
    pub fn new() -> Self {
        Self {
            config: PlannerConfig::default(),
        }
    }

    /// Create with custom config
    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Re-sequence today's flexible tasks around fixed events.
    ///
    /// Returns a new collection containing every input record; inputs are
    /// never modified.
    pub fn plan(&self, records: &[TaskRecord], options: &PlanOptions) -> Vec<TaskRecord> {
        self.plan_detailed(records, options).records
    }

    /// Like [`DailyPlanner::plan`], also reporting placements and failures.
    pub fn plan_detailed(&self, records: &[TaskRecord], options: &PlanOptions) -> PlanOutcome {
        let now = options.now.unwrap_or_else(Utc::now);
        let day = options.planned_day(now);
        let (window_start, window_end) = options.window(day);

        // 1. Partition
        let mut busy: Vec<(DateTime<Utc>, DateTime<Utc>)> = records
            .iter()
            .filter(|r| r.is_fixed() && !r.completed)
            .filter_map(|r| self.interval_of(r))
            .collect();
        busy.sort_by_key(|(start, _)| *start);

        let mut flexible: Vec<(usize, &TaskRecord)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_flexible() && !r.completed)
            .collect();
        flexible.sort_by(|(_, a), (_, b)| Priority::placement_order(&a.priority, &b.priority));

        // 2. Cursor
        let mut cursor = self.initial_cursor(options, now, day, window_start);
        tracing::debug!(
            %day,
            %window_start,
            %window_end,
            %cursor,
            fixed = busy.len(),
            flexible = flexible.len(),
            "planning day"
        );

        // 3. Greedy placement
        let buffer = Duration::minutes(i64::from(self.config.buffer_minutes));
        let mut placements: Vec<(usize, PlacedTask)> = Vec::new();
        let mut unscheduled = Vec::new();

        for (index, task) in flexible {
            let duration = Duration::minutes(i64::from(self.duration_of(task)));
            match self.find_slot(cursor, duration, window_end, &busy, buffer) {
                Some((start, attempts)) => {
                    let end = start + duration;
                    tracing::debug!(id = %task.id, %start, %end, attempts, "placed task");
                    busy.push((start, end));
                    cursor = end + buffer;
                    placements.push((
                        index,
                        PlacedTask {
                            id: task.id.clone(),
                            start,
                            end,
                            attempts,
                        },
                    ));
                }
                None => {
                    tracing::debug!(id = %task.id, "no slot left today");
                    unscheduled.push(task.id.clone());
                }
            }
        }

        // 4. Reassembly
        let mut out: Vec<TaskRecord> = records.to_vec();
        for (index, placed) in &placements {
            out[*index].date = Some(placed.start);
            out[*index].is_scheduled = true;
        }
        out.sort_by(by_date);

        PlanOutcome {
            records: out,
            placed: placements.into_iter().map(|(_, p)| p).collect(),
            unscheduled,
        }
    }

    /// Working-hours start, or "now" rounded up once the planned day has
    /// passed it.
    fn initial_cursor(
        &self,
        options: &PlanOptions,
        now: DateTime<Utc>,
        day: chrono::NaiveDate,
        window_start: DateTime<Utc>,
    ) -> DateTime<Utc> {
        let today = now.with_timezone(&options.utc_offset).date_naive();
        if today == day && now > window_start {
            options
                .round_up(now, self.config.cursor_granularity_minutes)
                .max(window_start)
        } else {
            window_start
        }
    }

    /// Try `cursor`, skipping past collisions, until the task fits or a bound
    /// is hit. Returns the start and the number of attempts used.
    fn find_slot(
        &self,
        cursor: DateTime<Utc>,
        duration: Duration,
        window_end: DateTime<Utc>,
        busy: &[(DateTime<Utc>, DateTime<Utc>)],
        buffer: Duration,
    ) -> Option<(DateTime<Utc>, u32)> {
        let mut attempt = cursor;
        let mut attempts = 0;

        while attempts < self.config.max_attempts && attempt < window_end {
            attempts += 1;
            let end = attempt + duration;
            if end > window_end {
                return None;
            }

            let collision = busy
                .iter()
                .filter(|(start, stop)| intervals_overlap(attempt, end, *start, *stop))
                .min_by_key(|(start, _)| *start);

            match collision {
                None => return Some((attempt, attempts)),
                Some((_, stop)) => attempt = *stop + buffer,
            }
        }

        None
    }

    fn duration_of(&self, record: &TaskRecord) -> u32 {
        record
            .duration_minutes
            .unwrap_or(self.config.default_duration_minutes)
    }

    fn interval_of(&self, record: &TaskRecord) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let start = record.date?;
        Some((start, start + Duration::minutes(i64::from(self.duration_of(record)))))
    }
}

impl Default for DailyPlanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Plan with the default planner configuration.
pub fn plan(records: &[TaskRecord], options: &PlanOptions) -> Vec<TaskRecord> {
    DailyPlanner::new().plan(records, options)
}

/// Plan with the default configuration and report placements.
pub fn plan_detailed(records: &[TaskRecord], options: &PlanOptions) -> PlanOutcome {
    DailyPlanner::new().plan_detailed(records, options)
}
