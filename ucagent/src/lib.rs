//! Command line agent for Unity Catalog metadata syncs.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use ucfetcher::{ConnectorConfig, MetadataSynchronizer, SyncReport, UnityCatalogClient};
use ucstore::records::declared_tables;
use ucstore::{Destination, JsonlLake, MemoryDestination, StoreConfig};

/// Runs the command line interface for the sync agent.
pub async fn run_cli() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Sync(args) => run_sync(args).await?,
        Command::Schema => print_schema()?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Runs a metadata sync against a Unity Catalog workspace
    Sync(SyncArgs),
    /// Prints the declared destination schema as JSON
    Schema,
}

#[derive(Args)]
struct SyncArgs {
    /// Workspace URL (e.g. https://your-workspace.cloud.databricks.com)
    #[arg(long, env = "DATABRICKS_WORKSPACE_URL")]
    workspace_url: String,
    /// Personal access token used as the bearer credential
    #[arg(long, env = "DATABRICKS_ACCESS_TOKEN", hide_env_values = true)]
    access_token: String,
    /// Comma-separated catalog allow-list; syncs all catalogs when omitted
    #[arg(long, env = "UC_CATALOG_FILTER")]
    catalog_filter: Option<String>,
    /// Base directory for the local JSONL lake destination
    #[arg(long, default_value = "./uc-lake")]
    base_path: PathBuf,
    /// Run against an in-memory destination and print a summary only
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn init_tracing() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

async fn run_sync(args: SyncArgs) -> anyhow::Result<()> {
    let mut config = ConnectorConfig::new(args.workspace_url, args.access_token);
    if let Some(filter) = args.catalog_filter {
        config = config.with_catalog_filter(filter);
    }
    config
        .validate()
        .context("invalid connector configuration")?;

    let client =
        UnityCatalogClient::new(&config).context("failed to build Unity Catalog client")?;
    let synchronizer = MetadataSynchronizer::new(Arc::new(client), &config);

    if args.dry_run {
        let destination = MemoryDestination::new();
        let report = run_with(&synchronizer, &destination).await?;
        log_report(&report);
        for decl in declared_tables() {
            info!(
                "Dry run: table {} holds {} record(s)",
                decl.table,
                destination.record_count(decl.table)
            );
        }
    } else {
        let lake = JsonlLake::open(StoreConfig::new(&args.base_path))
            .await
            .context("failed to open destination lake")?;
        let state = lake.load_state().await.context("failed to load sync state")?;
        let report = synchronizer
            .sync(&lake, state)
            .await
            .context("sync failed")?;
        log_report(&report);
    }

    Ok(())
}

async fn run_with(
    synchronizer: &MetadataSynchronizer,
    destination: &dyn Destination,
) -> anyhow::Result<SyncReport> {
    synchronizer
        .sync(destination, ucstore::SyncState::default())
        .await
        .context("sync failed")
}

fn log_report(report: &SyncReport) {
    info!(
        "Sync finished: {} catalogs, {} schemas, {} tables, {} columns, {} volumes ({} tables skipped)",
        report.catalogs,
        report.schemas,
        report.tables,
        report.columns,
        report.volumes,
        report.tables_skipped
    );
}

fn print_schema() -> anyhow::Result<()> {
    let schema = declared_tables();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
