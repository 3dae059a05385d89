use chrono::{Local, NaiveDate};
use clap::Args;
use secretary_core::error::{Result, ValidationError};
use secretary_core::{quick_add, Config};
use serde::Serialize;

use super::print_json;

#[derive(Args)]
pub struct ParseArgs {
    /// Free text, e.g. "Coffee tomorrow 5pm at Starbucks"
    text: Vec<String>,
    /// Reference day for "today"/"tomorrow" (YYYY-MM-DD)
    #[arg(long)]
    today: Option<NaiveDate>,
    /// Print the draft task record instead of the parsed fields
    #[arg(long)]
    record: bool,
}

#[derive(Serialize)]
struct ParseOutput {
    #[serde(flatten)]
    entry: quick_add::ParsedEntry,
    has_time: bool,
}

pub fn run(args: ParseArgs) -> Result<()> {
    let text = args.text.join(" ");
    if text.trim().is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "text".to_string(),
            message: "nothing to parse".to_string(),
        }
        .into());
    }
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());

    let entry = quick_add::parse(&text, today);
    if args.record {
        // Times are read on the configured local clock.
        let offset = Config::load()?.plan_options()?.utc_offset;
        return print_json(&entry.to_record(today, offset));
    }

    print_json(&ParseOutput {
        has_time: entry.has_time(),
        entry,
    })
}
