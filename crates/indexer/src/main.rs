//! Raft/Badge Indexer - Raft and Badges event ingestion
//!
//! This binary provides:
//! - Event listening from Ethereum (Raft + Badges contracts)
//! - Raft, badge spec and badge storage with IPFS metadata

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use raftbadge_indexer::config::{Config, LoggingConfig};
use raftbadge_indexer::ipfs::IpfsGateway;
use raftbadge_indexer::listener::{BlockApplier, RpcProvider, SyncEngine};
use raftbadge_indexer::reporter::TracingReporter;
use raftbadge_indexer::storage::Storage;

const DEFAULT_DATABASE_URL: &str = "sqlite://raftbadge.db";

#[derive(Parser)]
#[command(name = "raftbadge-indexer")]
#[command(version, about = "Indexer for Raft and Badges contract events", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "indexer.toml")]
    config: String,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the indexer service
    Run,

    /// Show indexer status and sync progress
    Status,

    /// Initialize the database
    InitDb {
        /// Database URL
        #[arg(long, default_value = DEFAULT_DATABASE_URL)]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging settings live in the config file; fall back to defaults when it is unreadable
    let logging = Config::from_file(&cli.config)
        .map(|config| config.logging)
        .unwrap_or_default();
    init_logging(&logging, cli.debug)?;

    info!("Raft/Badge Indexer starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_indexer(&cli.config).await?,
        Commands::Status => show_status(&cli.config).await?,
        Commands::InitDb { database_url } => init_database(&database_url).await?,
    }

    Ok(())
}

/// Initialize tracing subscriber for logging
fn init_logging(logging: &LoggingConfig, debug: bool) -> Result<()> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = if debug {
        EnvFilter::new("raftbadge_indexer=debug,sqlx=debug")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("raftbadge_indexer={}", logging.level)))
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let initialized = if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_line_number(true))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .try_init()
    };
    initialized.context("Failed to initialize logging")?;

    Ok(())
}

/// Connect to the configured database and bring its schema up to date.
async fn open_storage(config: &Config) -> Result<Storage> {
    let storage = Storage::new(
        &config.database.url,
        Some(config.database.max_connections),
        Some(config.database.min_connections),
    )
    .await
    .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    Ok(storage)
}

/// Main indexer service - runs event sync until Ctrl+C
async fn run_indexer(config_path: &str) -> Result<()> {
    info!("Starting indexer service with config: {}", config_path);

    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("  Chain ID: {}", config.network.chain_id);
    info!("  RPC URL: {}", config.network.rpc_url);
    info!("  Raft contract: {}", config.contracts.raft);
    info!("  Badges contract: {}", config.contracts.badges);
    info!("  Database: {}", config.database.url);
    info!("  IPFS gateway: {}", config.ipfs.gateway);
    info!("  Start block: {}", config.sync.start_block);

    let storage = open_storage(&config).await?;

    info!("Database initialized");

    // Initialize sync state if this is a fresh database
    let sync_state = storage.get_sync_state().await?;
    if sync_state.last_block_number == 0 && sync_state.chain_id == 0 {
        // The sync engine starts at last_synced + 1
        let initial_block = config.sync.start_block.saturating_sub(1);
        info!(
            "Fresh database detected, initializing sync state with chain_id={} initial_block={} (will start syncing from block {})",
            config.network.chain_id, initial_block, config.sync.start_block
        );
        storage
            .initialize_sync_state(config.network.chain_id, initial_block)
            .await?;
    } else {
        if sync_state.chain_id != config.network.chain_id {
            anyhow::bail!(
                "Database was indexed for chain {} but config targets chain {}",
                sync_state.chain_id,
                config.network.chain_id
            );
        }
        info!(
            "Existing sync state found: chain_id={} last_block={}",
            sync_state.chain_id, sync_state.last_block_number
        );
    }

    let provider = RpcProvider::new(&config.network.rpc_url, config.contracts)
        .await
        .context("Failed to create RPC provider")?;

    info!("RPC provider initialized");

    let gateway = IpfsGateway::from_config(&config.ipfs).context("Failed to create IPFS client")?;
    let applier = BlockApplier::new(storage.clone(), gateway, provider.clone(), TracingReporter);

    let sync_engine = SyncEngine::new(provider, storage.clone(), applier, config.sync.clone());

    let mut sync_handle = tokio::spawn(async move { sync_engine.run().await });

    info!("Indexer is running. Press Ctrl+C to stop.");

    tokio::select! {
        result = &mut sync_handle => {
            storage.close().await;
            match result {
                Ok(Ok(())) => {
                    warn!("Sync engine exited unexpectedly");
                    Ok(())
                }
                Ok(Err(e)) => {
                    Err(e).context("Sync engine failed")
                }
                Err(e) => {
                    Err(anyhow::anyhow!("Sync task panicked: {}", e))
                }
            }
        }
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl+C")?;
            info!("Received shutdown signal, gracefully shutting down...");
            // An in-flight block is rolled back and replayed on the next start
            sync_handle.abort();
            let _ = sync_handle.await;
            storage.close().await;
            Ok(())
        }
    }
}

/// Print sync progress and entity counts
async fn show_status(config_path: &str) -> Result<()> {
    info!("Checking indexer status");

    // Fall back to the default database only when the config file does not exist
    let (database_url, max_conn, min_conn) = match Config::from_file(config_path) {
        Ok(config) => {
            info!("Using database from config: {}", config.database.url);
            (
                config.database.url,
                Some(config.database.max_connections),
                Some(config.database.min_connections),
            )
        }
        Err(e) => {
            let is_not_found = e.chain().any(|cause| {
                cause
                    .downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
            });

            if is_not_found {
                info!(
                    "Config file not found, using default database: {}",
                    DEFAULT_DATABASE_URL
                );
                (DEFAULT_DATABASE_URL.to_string(), None, None)
            } else {
                return Err(e).context("Failed to load config file");
            }
        }
    };

    let storage = Storage::new(&database_url, max_conn, min_conn)
        .await
        .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    let sync_state = storage.get_sync_state().await?;
    let stats = storage.stats().await?;

    println!("\n=== Raft/Badge Indexer Status ===\n");
    println!("Sync Progress:");
    println!("  Chain ID: {}", sync_state.chain_id);
    println!("  Last Block: {}", sync_state.last_block_number);
    println!(
        "  Last Updated: {}",
        chrono::DateTime::from_timestamp(sync_state.updated_at, 0)
            .map(|dt| dt.to_rfc3339())
            .unwrap_or_else(|| "unknown".to_string())
    );

    println!("\nDatabase Statistics:");
    println!("  Rafts: {}", stats.raft_count);
    println!("  Badge Specs: {}", stats.spec_count);
    println!("  Minted Badges: {}", stats.minted_badge_count);
    println!("  Burned Badges: {}", stats.burned_badge_count);
    println!();

    storage.close().await;

    Ok(())
}

/// Initialize the database
async fn init_database(database_url: &str) -> Result<()> {
    info!("Initializing database: {}", database_url);

    let storage = Storage::new(database_url, None, None)
        .await
        .context("Failed to connect to database")?;

    storage
        .run_migrations()
        .await
        .context("Failed to run migrations")?;

    storage
        .health_check()
        .await
        .context("Database health check failed")?;

    let stats = storage.stats().await?;
    info!("Database initialized successfully!");
    info!("  Rafts: {}", stats.raft_count);
    info!("  Badge Specs: {}", stats.spec_count);
    info!("  Badges: {}", stats.minted_badge_count + stats.burned_badge_count);
    info!("  Last block: {}", stats.last_block_number);

    storage.close().await;

    Ok(())
}
