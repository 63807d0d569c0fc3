use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use farmbook_lib::application::ports::RemoteStore;
use farmbook_lib::application::services::EntityStore;
use farmbook_lib::domain::entities::{DrainOutcome, FarmRecord};
use farmbook_lib::domain::value_objects::{EntityKind, RecordId, RecordPatch, RecordPayload};
use farmbook_lib::infrastructure::connectivity::probe_reached_remote;
use farmbook_lib::infrastructure::remote::{HttpRemoteStore, OfflineRemoteStore};
use farmbook_lib::{AppConfig, AppState};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "farmbook")]
#[command(about = "Local-first farm records with offline sync", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database url (overrides FARMBOOK_DATABASE_URL)
    #[arg(long)]
    database_url: Option<String>,

    /// Remote record service base url (overrides FARMBOOK_REMOTE_URL)
    #[arg(long)]
    remote_url: Option<String>,

    /// Treat the device as offline; changes stay queued
    #[arg(long)]
    offline: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List every record in a store
    List { store: EntityKind },
    /// Show one record
    Get { store: EntityKind, id: String },
    /// Add a record from a JSON object; a temporary id is minted when none is given
    Add {
        store: EntityKind,
        #[arg(long)]
        json: String,
    },
    /// Apply a partial JSON update to a record
    Update {
        store: EntityKind,
        id: String,
        #[arg(long)]
        json: String,
    },
    /// Delete a record locally and queue the remote delete
    Delete { store: EntityKind, id: String },
    /// Show connectivity, pending change count and last sync time
    Status,
    /// Replay queued changes against the remote store
    Sync,
    /// Replay queued changes, then refresh clean records from the remote store
    Pull,
    /// Keep syncing in the background until Ctrl+C
    Watch,
    /// Delete all local records, queued changes and sync metadata
    Reset {
        /// Confirm the reset
        #[arg(long)]
        yes: bool,
    },
}

enum RecordCommand {
    List,
    Get(RecordId),
    Add(Value),
    Update(RecordId, RecordPatch),
    Delete(RecordId),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log_level, cli.json_logs)?;

    let mut config = AppConfig::from_env();
    if let Some(url) = &cli.database_url {
        config.database.url = url.clone();
    }
    if let Some(url) = &cli.remote_url {
        let url = url.trim().trim_end_matches('/');
        config.remote.base_url = (!url.is_empty()).then(|| url.to_string());
    }

    let (remote, online): (Arc<dyn RemoteStore>, bool) =
        match HttpRemoteStore::from_config(&config.remote)? {
            Some(http) if !cli.offline => {
                let reachable = probe_reached_remote(&http.health_check().await);
                if !reachable {
                    warn!("remote store unreachable; starting offline");
                }
                (Arc::new(http), reachable)
            }
            Some(http) => (Arc::new(http), false),
            None => (Arc::new(OfflineRemoteStore), false),
        };

    let state = AppState::initialize(&config, remote, online).await?;
    let result = run(&cli.command, &state, &config).await;
    state.shutdown().await?;
    result
}

async fn run(command: &Commands, state: &AppState, config: &AppConfig) -> Result<()> {
    match command {
        Commands::List { store } => run_for_store(state, *store, RecordCommand::List).await,
        Commands::Get { store, id } => {
            run_for_store(state, *store, RecordCommand::Get(parse_id(id)?)).await
        }
        Commands::Add { store, json } => {
            let value: Value = serde_json::from_str(json).context("--json is not valid JSON")?;
            run_for_store(state, *store, RecordCommand::Add(value)).await
        }
        Commands::Update { store, id, json } => {
            let patch = RecordPatch::from_json_str(json).map_err(anyhow::Error::msg)?;
            run_for_store(state, *store, RecordCommand::Update(parse_id(id)?, patch)).await
        }
        Commands::Delete { store, id } => {
            run_for_store(state, *store, RecordCommand::Delete(parse_id(id)?)).await
        }
        Commands::Status => print_json(&state.orchestrator.status().await?),
        Commands::Sync => match state.orchestrator.drain().await? {
            DrainOutcome::Completed(report) => print_json(&report),
            DrainOutcome::Offline => bail!("device is offline; changes remain queued"),
            DrainOutcome::AlreadyRunning => bail!("a sync is already running"),
        },
        Commands::Pull => print_json(&state.orchestrator.full_sync().await?),
        Commands::Watch => {
            let background = state.spawn_background_sync(&config.sync);
            info!("syncing in the background; press Ctrl+C to stop");
            tokio::signal::ctrl_c().await?;
            info!("shutting down");
            background.shutdown().await;
            Ok(())
        }
        Commands::Reset { yes } => {
            if !yes {
                bail!("reset deletes every local record and queued change; pass --yes to confirm");
            }
            state.orchestrator.reset_local_state().await?;
            println!("local state cleared");
            Ok(())
        }
    }
}

async fn run_for_store(state: &AppState, kind: EntityKind, command: RecordCommand) -> Result<()> {
    match kind {
        EntityKind::Fields => run_record_command(&state.fields, command).await,
        EntityKind::Expenses => run_record_command(&state.expenses, command).await,
        EntityKind::Income => run_record_command(&state.income, command).await,
        EntityKind::Tasks => run_record_command(&state.tasks, command).await,
    }
}

async fn run_record_command<T: FarmRecord>(
    store: &EntityStore<T>,
    command: RecordCommand,
) -> Result<()> {
    match command {
        RecordCommand::List => print_json(&store.get_all().await?),
        RecordCommand::Get(id) => match store.get(&id).await? {
            Some(record) => print_json(&record),
            None => bail!("{} record {id} not found", T::KIND),
        },
        RecordCommand::Add(value) => {
            let mut payload = RecordPayload::new(value).map_err(anyhow::Error::msg)?;
            if payload.record_id().is_err() {
                payload = payload.with_id(&RecordId::temporary());
            }
            let record: T = payload
                .decode()
                .with_context(|| format!("not a valid {} record", T::KIND))?;
            print_json(&store.add(record).await?)
        }
        RecordCommand::Update(id, patch) => print_json(&store.update(&id, patch).await?),
        RecordCommand::Delete(id) => {
            store.delete(&id).await?;
            println!("deleted {} record {id}", T::KIND);
            Ok(())
        }
    }
}

fn parse_id(raw: &str) -> Result<RecordId> {
    RecordId::new(raw.to_string()).map_err(anyhow::Error::msg)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_logging(level: &str, json: bool) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = if json {
        fmt::layer()
            .json()
            .with_current_span(false)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
