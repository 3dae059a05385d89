use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "secretary-cli", version, about = "Secretary scheduling CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-sequence today's flexible tasks around fixed events
    Plan(commands::plan::PlanArgs),
    /// Compare a local and an external event snapshot
    Diff(commands::diff::DiffArgs),
    /// Apply a fetched provider payload to stored events and tasks
    Sync(commands::sync::SyncArgs),
    /// Parse a quick-add line into a draft task
    Parse(commands::parse::ParseArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    // Logs go to stderr so stdout stays JSON.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Diff(args) => commands::diff::run(args),
        Commands::Sync(args) => commands::sync::run(args),
        Commands::Parse(args) => commands::parse::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
