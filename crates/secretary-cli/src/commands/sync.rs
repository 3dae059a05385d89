use std::path::PathBuf;

use clap::Args;
use secretary_core::error::{ConfigError, Result};
use secretary_core::sync::normalize_payload;
use secretary_core::{Config, EventRecord, PayloadFormat, Provider, SyncEngine, TaskRecord};

use super::{print_json, read_input, read_json};

#[derive(Args)]
pub struct SyncArgs {
    /// Provider being synced (google, outlook, apple)
    #[arg(long)]
    provider: Provider,
    /// JSON array of all stored events
    #[arg(long)]
    events: PathBuf,
    /// JSON array of stored task records
    #[arg(long)]
    tasks: PathBuf,
    /// Fetched provider payload ("-" for stdin)
    #[arg(long)]
    fetched: PathBuf,
    /// Payload format (normalized, google, outlook, ics); defaults to config
    #[arg(long)]
    format: Option<PayloadFormat>,
}

pub fn run(args: SyncArgs) -> Result<()> {
    let config = Config::load()?;
    if !config.is_enabled(args.provider) {
        return Err(ConfigError::InvalidValue {
            key: "sync.enabled_providers".to_string(),
            message: format!("provider {} is disabled", args.provider),
        }
        .into());
    }
    let format = args.format.unwrap_or(config.sync.default_format);

    let events: Vec<EventRecord> = read_json(&args.events)?;
    let tasks: Vec<TaskRecord> = read_json(&args.tasks)?;
    let fetched = normalize_payload(format, &read_input(&args.fetched)?)?;

    let outcome = SyncEngine::new(args.provider).sync_provider(&events, &tasks, &fetched)?;
    print_json(&outcome)
}
