//! Prospect Ingest - profile pagination and import tool

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prospect_common::logging::{init_logging, LogConfig, LogLevel};
use prospect_ingest::checkpoint::{CheckpointState, CheckpointStore, FileCheckpointStore};
use prospect_ingest::config::{ImportConfig, PaginationConfig};
use prospect_ingest::driver::{DriverConfig, PaginationDriver, RunOutcome};
use prospect_ingest::fetcher::HttpSearchClient;
use prospect_ingest::importer::Importer;
use prospect_ingest::store::{PgProfileStore, ProfileStore};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "prospect-ingest")]
#[command(author, version, about = "Resumable profile ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch search pages into the checkpoint, resuming after the last saved page
    Paginate {
        /// Checkpoint file (overrides PROSPECT_CHECKPOINT_PATH)
        #[arg(short, long)]
        checkpoint: Option<PathBuf>,

        /// Highest page number to fetch (overrides PROSPECT_MAX_PAGE)
        #[arg(long)]
        max_page: Option<u32>,

        /// Profiles per page (overrides PROSPECT_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Import every checkpointed page into PostgreSQL
    Import {
        /// Checkpoint file (overrides PROSPECT_CHECKPOINT_PATH)
        #[arg(short, long)]
        checkpoint: Option<PathBuf>,

        /// Records per batch (overrides PROSPECT_IMPORT_BATCH_SIZE)
        #[arg(long)]
        batch_size: Option<usize>,
    },

    /// Show checkpoint progress
    Status {
        /// Checkpoint file (overrides PROSPECT_CHECKPOINT_PATH)
        #[arg(short, long)]
        checkpoint: Option<PathBuf>,
    },

    /// Discard checkpoint progress and start over from page 1
    Reset {
        /// Checkpoint file (overrides PROSPECT_CHECKPOINT_PATH)
        #[arg(short, long)]
        checkpoint: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    // Environment variables take precedence
    let log_config = LogConfig::default()
        .with_level(log_level)
        .with_file_prefix("prospect-ingest")
        .merge_env()?;
    let _guard = init_logging(&log_config)?;

    match cli.command {
        Command::Paginate {
            checkpoint,
            max_page,
            page_size,
        } => paginate(checkpoint, max_page, page_size).await,
        Command::Import {
            checkpoint,
            batch_size,
        } => import(checkpoint, batch_size).await,
        Command::Status { checkpoint } => status(checkpoint).await,
        Command::Reset { checkpoint } => reset(checkpoint).await,
    }
}

fn checkpoint_store(path: Option<PathBuf>) -> FileCheckpointStore {
    FileCheckpointStore::new(path.unwrap_or_else(prospect_ingest::config::checkpoint_path_from_env))
}

async fn paginate(
    checkpoint: Option<PathBuf>,
    max_page: Option<u32>,
    page_size: Option<u32>,
) -> Result<ExitCode> {
    let mut config = PaginationConfig::from_env().context("Invalid pagination configuration")?;
    if let Some(path) = checkpoint {
        config.checkpoint_path = path;
    }
    if let Some(max_page) = max_page {
        config.max_page = max_page;
    }
    if let Some(page_size) = page_size {
        config.page_size = page_size;
    }
    config.validate()?;

    let client = HttpSearchClient::new(&config.api_host, &config.api_key, config.request_timeout)?;
    let store = FileCheckpointStore::new(&config.checkpoint_path);
    let mut driver = PaginationDriver::new(
        client,
        store,
        DriverConfig {
            filters: config.filters.clone(),
            page_size: config.page_size,
            max_page: config.max_page,
            request_interval: config.request_interval,
        },
    );

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current page");
            on_signal.cancel();
        }
    });

    let report = driver.run(&cancel).await?;
    match report.outcome {
        RunOutcome::Done(reason) => {
            info!(
                ?reason,
                pages = report.pages_fetched,
                records = report.records_fetched,
                "Pagination complete"
            );
            Ok(ExitCode::SUCCESS)
        },
        RunOutcome::Aborted { page, error } => {
            eprintln!(
                "Pagination aborted at page {}: {}. Re-run to resume from page {}.",
                page, error, page
            );
            Ok(ExitCode::FAILURE)
        },
    }
}

async fn import(checkpoint: Option<PathBuf>, batch_size: Option<usize>) -> Result<ExitCode> {
    let mut config = ImportConfig::from_env().context("Invalid import configuration")?;
    if let Some(path) = checkpoint {
        config.checkpoint_path = path;
    }
    if let Some(batch_size) = batch_size {
        config.batch_size = batch_size;
    }
    config.validate()?;

    let state = FileCheckpointStore::new(&config.checkpoint_path).load().await?;
    info!(
        latest_page = state.latest_page,
        pages = state.pages.len(),
        records = state.record_count(),
        "Loaded checkpoint"
    );

    let store = PgProfileStore::connect(&config.database).await?;
    store.migrate().await?;

    let importer = Importer::new(store).with_batch_size(config.batch_size);
    let summary = importer.import_all(&state.pages).await;
    let stored = importer.store().count().await?;

    println!(
        "Imported {} records ({} updated), skipped {}; {} profiles stored",
        summary.imported, summary.updated, summary.skipped, stored
    );
    Ok(ExitCode::SUCCESS)
}

async fn status(checkpoint: Option<PathBuf>) -> Result<ExitCode> {
    let store = checkpoint_store(checkpoint);
    let state = store.load().await?;

    println!("Checkpoint: {}", store.path().display());
    println!("Latest page: {}", state.latest_page);
    println!("Next page:   {}", state.next_page());
    for (page, records) in &state.pages {
        println!("  page{:<4} {} records", page, records.len());
    }
    println!("Total records: {}", state.record_count());
    Ok(ExitCode::SUCCESS)
}

async fn reset(checkpoint: Option<PathBuf>) -> Result<ExitCode> {
    let store = checkpoint_store(checkpoint);
    store.save(&CheckpointState::default()).await?;

    info!(checkpoint = %store.path().display(), "Checkpoint reset");
    Ok(ExitCode::SUCCESS)
}
