//! `bujo` command-line front end.
//!
//! # Responsibility
//! - Serve the item aggregation and update-signal reads against a JSON
//!   fixture or a SQLite database.
//! - Print results as pretty JSON on stdout and failures on stderr.

use bujo_core::source::memory::{Fixture, InMemoryStore};
use bujo_core::source::{LedgerStore, TaskStore};
use bujo_core::{
    init_logging, load_config, Aggregator, CollectionProvider, CoreConfig, ProjectDirectory,
    ProjectItemsService, SqliteStore, SystemUpdatesService, TypeRouter, UpdateSignalCoordinator,
};
use clap::{Args, Parser, Subcommand};
use log::error;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(
    name = "bujo",
    version = bujo_core::core_version(),
    about = "Bullet-journal item aggregation and change signals"
)]
struct Cli {
    /// JSON config file (aggregation and logging sections)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Items of every accessible project, bucketed per day
    Items(ItemsArgs),
    /// Change signals of the tracked collections
    Updates(UpdatesArgs),
}

#[derive(Args)]
struct StoreArgs {
    /// JSON fixture to read from
    #[arg(long, value_name = "PATH", conflicts_with = "db", required_unless_present = "db")]
    fixture: Option<PathBuf>,

    /// SQLite database to read from
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Requesting user
    #[arg(long)]
    user: String,
}

#[derive(Args)]
struct ItemsArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Item kinds, e.g. `task-list,ledger`
    #[arg(long, value_delimiter = ',', required = true)]
    kinds: Vec<String>,

    /// Inclusive start date (YYYY-MM-DD)
    #[arg(long)]
    start: String,

    /// Inclusive end date (YYYY-MM-DD)
    #[arg(long)]
    end: String,

    /// IANA timezone the buckets are computed in
    #[arg(long, default_value = "UTC")]
    timezone: String,
}

#[derive(Args)]
struct UpdatesArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Comma-separated targets, e.g. `ownedProjectsEtag,groupsEtag`; all when omitted
    #[arg(long)]
    targets: Option<String>,
}

struct Services {
    items: ProjectItemsService,
    updates: SystemUpdatesService,
}

fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(cli) {
        error!("event=cli_run module=cli status=error");
        eprintln!("error: {message}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => load_config(path).map_err(|err| err.to_string())?,
        None => CoreConfig::default(),
    };
    init_logging(&config.logging)?;

    let output = match cli.command {
        Commands::Items(args) => {
            let services = open_services(&args.store, &config)?;
            let buckets = services
                .items
                .project_items(
                    &args.store.user,
                    args.kinds.as_slice(),
                    &args.start,
                    &args.end,
                    &args.timezone,
                )
                .map_err(|err| format!("[{}] {err}", err.code()))?;
            serde_json::to_string_pretty(&buckets)
        }
        Commands::Updates(args) => {
            let services = open_services(&args.store, &config)?;
            let signals = services
                .updates
                .system_updates(&args.store.user, args.targets.as_deref())
                .map_err(|err| format!("[{}] {err}", err.code()))?;
            serde_json::to_string_pretty(&signals)
        }
    }
    .map_err(|err| format!("cannot render output: {err}"))?;

    println!("{output}");
    Ok(())
}

fn open_services(args: &StoreArgs, config: &CoreConfig) -> Result<Services, String> {
    match (&args.fixture, &args.db) {
        (Some(path), _) => {
            let fixture = Fixture::load(path).map_err(|err| err.to_string())?;
            build_services(Arc::new(InMemoryStore::new(fixture)), config)
        }
        (None, Some(path)) => {
            let store = SqliteStore::open(path).map_err(|err| err.to_string())?;
            build_services(Arc::new(store), config)
        }
        (None, None) => Err("either --fixture or --db is required".to_string()),
    }
}

fn build_services<S>(store: Arc<S>, config: &CoreConfig) -> Result<Services, String>
where
    S: TaskStore + LedgerStore + ProjectDirectory + CollectionProvider + 'static,
{
    let aggregator = Aggregator::new(TypeRouter::standard(store.clone()), config.aggregation.clone())
        .map_err(|err| err.to_string())?;
    Ok(Services {
        items: ProjectItemsService::new(store.clone(), aggregator),
        updates: SystemUpdatesService::new(UpdateSignalCoordinator::new(store)),
    })
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_flag_reports_core_version() {
        let command = Cli::command();
        assert_eq!(command.get_version(), Some(bujo_core::core_version()));
    }
}
