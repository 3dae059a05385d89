use std::path::PathBuf;

use clap::Args;
use secretary_core::error::Result;
use secretary_core::{EventRecord, ScheduleDiffEngine};

use super::{print_json, read_json};

#[derive(Args)]
pub struct DiffArgs {
    /// JSON array of locally stored events
    #[arg(long)]
    local: PathBuf,
    /// JSON array of freshly fetched events
    #[arg(long)]
    external: PathBuf,
}

pub fn run(args: DiffArgs) -> Result<()> {
    let local: Vec<EventRecord> = read_json(&args.local)?;
    let external: Vec<EventRecord> = read_json(&args.external)?;

    let changes = ScheduleDiffEngine::new().diff(&local, &external);
    print_json(&changes)
}
