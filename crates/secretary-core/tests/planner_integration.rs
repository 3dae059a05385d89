//! Integration tests for the daily planner.
//!
//! Scenario tests pin the documented placements; property tests check that
//! placements never collide and that fixed events never move.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use proptest::prelude::*;
use secretary_core::record::intervals_overlap;
use secretary_core::{DailyPlanner, PlanOptions, Priority, TaskRecord};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, h, m, 0).unwrap()
}

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
}

/// Options for 2024-03-04 with "now" before the working day starts.
fn morning_options() -> PlanOptions {
    PlanOptions::default().with_now(at(7, 0)).with_day(day())
}

fn meeting(id: &str, h: u32, minutes: u32) -> TaskRecord {
    TaskRecord::event(format!("Meeting {id}"), at(h, 0))
        .with_id(id)
        .with_duration(minutes)
}

fn task(id: &str, minutes: u32, priority: Priority) -> TaskRecord {
    TaskRecord::task(format!("Task {id}"))
        .with_id(id)
        .with_duration(minutes)
        .with_priority(priority)
}

fn find<'a>(records: &'a [TaskRecord], id: &str) -> &'a TaskRecord {
    records.iter().find(|r| r.id == id).unwrap()
}

#[test]
fn test_report_fits_before_first_meeting() {
    let records = vec![
        meeting("m1", 10, 60),
        meeting("m2", 14, 60),
        task("report", 60, Priority::High),
    ];

    let planned = DailyPlanner::new().plan(&records, &morning_options());

    let report = find(&planned, "report");
    assert_eq!(report.date, Some(at(9, 0)));
    assert!(report.is_scheduled);
    assert_eq!(report.end_time(), Some(at(10, 0)));
}

#[test]
fn test_long_tasks_skip_past_meetings_with_buffer() {
    let records = vec![
        meeting("m1", 10, 60),
        meeting("m2", 14, 60),
        task("a", 90, Priority::Medium),
        task("b", 90, Priority::Medium),
    ];

    let outcome = DailyPlanner::new().plan_detailed(&records, &morning_options());

    assert_eq!(find(&outcome.records, "a").date, Some(at(11, 15)));
    assert_eq!(find(&outcome.records, "b").date, Some(at(15, 15)));
    assert_eq!(outcome.placed[0].end, at(12, 45));
    assert_eq!(outcome.placed[1].end, at(16, 45));
    assert!(outcome.unscheduled.is_empty());
}

#[test]
fn test_output_is_sorted_by_start() {
    let records = vec![
        task("late", 30, Priority::Low),
        meeting("m1", 10, 60),
        task("early", 30, Priority::High),
    ];

    let planned = DailyPlanner::new().plan(&records, &morning_options());
    let ids: Vec<&str> = planned.iter().map(|r| r.id.as_str()).collect();

    // "late" would run into the meeting from 09:45, so it moves past it.
    assert_eq!(ids, vec!["early", "m1", "late"]);
    assert_eq!(find(&planned, "late").date, Some(at(11, 15)));
}

#[test]
fn test_planning_with_wider_working_hours() {
    let start = "07:30".parse().unwrap();
    let end = "19:00".parse().unwrap();
    let options = PlanOptions::new(start, end)
        .unwrap()
        .with_now(at(6, 0))
        .with_day(day());

    let records = vec![task("early-bird", 45, Priority::High)];
    let planned = DailyPlanner::new().plan(&records, &options);

    assert_eq!(find(&planned, "early-bird").date, Some(at(7, 30)));
}

fn fixed_strategy() -> impl Strategy<Value = Vec<(u32, u32, u32)>> {
    // (hour, quarter, duration)
    prop::collection::vec((8u32..17, 0u32..4, 15u32..120), 0..5)
}

fn flexible_strategy() -> impl Strategy<Value = Vec<(u32, u8)>> {
    prop::collection::vec((10u32..150, 0u8..4), 0..8)
}

fn priority_of(n: u8) -> Priority {
    match n {
        0 => Priority::High,
        1 => Priority::Medium,
        2 => Priority::Low,
        _ => Priority::Objective,
    }
}

fn build(fixed: &[(u32, u32, u32)], flexible: &[(u32, u8)]) -> Vec<TaskRecord> {
    let mut records: Vec<TaskRecord> = fixed
        .iter()
        .enumerate()
        .map(|(i, (h, q, d))| {
            TaskRecord::event(format!("Fixed {i}"), at(*h, q * 15))
                .with_id(format!("fixed-{i}"))
                .with_duration(*d)
        })
        .collect();
    records.extend(
        flexible
            .iter()
            .enumerate()
            .map(|(i, (d, p))| task(&format!("flex-{i}"), *d, priority_of(*p))),
    );
    records
}

proptest! {
    #[test]
    fn property_placements_never_overlap(
        fixed in fixed_strategy(),
        flexible in flexible_strategy(),
    ) {
        let records = build(&fixed, &flexible);
        let outcome = DailyPlanner::new().plan_detailed(&records, &morning_options());

        let (window_start, window_end) = morning_options().window(day());
        let fixed_intervals: Vec<_> = records
            .iter()
            .filter(|r| r.is_fixed())
            .filter_map(TaskRecord::interval)
            .collect();

        for (i, placed) in outcome.placed.iter().enumerate() {
            prop_assert!(placed.start >= window_start);
            prop_assert!(placed.end <= window_end);
            for (start, end) in &fixed_intervals {
                prop_assert!(!intervals_overlap(placed.start, placed.end, *start, *end));
            }
            for other in &outcome.placed[i + 1..] {
                prop_assert!(!intervals_overlap(placed.start, placed.end, other.start, other.end));
            }
        }
        prop_assert_eq!(
            outcome.placed.len() + outcome.unscheduled.len(),
            flexible.len()
        );
    }

    #[test]
    fn property_fixed_events_never_move(
        fixed in fixed_strategy(),
        flexible in flexible_strategy(),
    ) {
        let records = build(&fixed, &flexible);
        let planned = DailyPlanner::new().plan(&records, &morning_options());

        prop_assert_eq!(planned.len(), records.len());
        for original in records.iter().filter(|r| r.is_fixed()) {
            let after = find(&planned, &original.id);
            prop_assert_eq!(after.date, original.date);
            prop_assert!(!after.is_scheduled);
        }
    }

    #[test]
    fn property_placement_follows_priority(
        flexible in prop::collection::vec((10u32..60, 0u8..4), 0..6),
    ) {
        // Six tasks of at most an hour plus buffer always fit in 09-17.
        let records = build(&[], &flexible);
        let outcome = DailyPlanner::new().plan_detailed(&records, &morning_options());
        prop_assert!(outcome.unscheduled.is_empty());

        let ranks: Vec<u8> = outcome
            .placed
            .iter()
            .map(|p| find(&records, &p.id).priority.rank())
            .collect();
        prop_assert!(ranks.windows(2).all(|w| w[0] >= w[1]));
        prop_assert!(outcome
            .placed
            .windows(2)
            .all(|w| w[1].start >= w[0].end + Duration::minutes(15)));
    }
}
