use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::Args;
use secretary_core::error::Result;
use secretary_core::{ClockTime, Config, DailyPlanner, PlanOptions, TaskRecord};

use super::{print_json, read_json};

#[derive(Args)]
pub struct PlanArgs {
    /// JSON array of task records ("-" for stdin)
    #[arg(long)]
    input: PathBuf,
    /// Working hours start (HH:MM), overrides config
    #[arg(long)]
    work_start: Option<ClockTime>,
    /// Working hours end (HH:MM), overrides config
    #[arg(long)]
    work_end: Option<ClockTime>,
    /// Reference time (RFC 3339); defaults to the wall clock
    #[arg(long)]
    now: Option<DateTime<Utc>>,
    /// Day to plan (YYYY-MM-DD); defaults to the day of --now
    #[arg(long)]
    day: Option<NaiveDate>,
    /// Print placements and unscheduled ids along with the records
    #[arg(long)]
    detailed: bool,
}

pub fn run(args: PlanArgs) -> Result<()> {
    let config = Config::load()?;
    let defaults = config.plan_options()?;

    let mut options = PlanOptions::new(
        args.work_start.unwrap_or(defaults.work_start),
        args.work_end.unwrap_or(defaults.work_end),
    )?
    .with_offset(defaults.utc_offset);
    if let Some(now) = args.now {
        options = options.with_now(now);
    }
    if let Some(day) = args.day {
        options = options.with_day(day);
    }

    let records: Vec<TaskRecord> = read_json(&args.input)?;
    let planner = DailyPlanner::with_config(config.planner_config());
    let outcome = planner.plan_detailed(&records, &options);

    if !outcome.unscheduled.is_empty() {
        tracing::warn!(count = outcome.unscheduled.len(), "tasks left unscheduled");
    }

    if args.detailed {
        print_json(&outcome)
    } else {
        print_json(&outcome.records)
    }
}
