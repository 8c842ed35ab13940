//! Storage layer for the Raft/Badge indexer.
//!
//! This module provides:
//! - [`EntityStore`], the load/save interface the mapping handlers use
//! - [`Storage`], the SQLite implementation (rafts, badge specs, badges, sync state)
//! - [`MemoryStore`], an in-memory implementation

use alloy::primitives::{Address, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use raftbadge_core::{Badge, BadgeSpec, Raft};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::info;

pub mod badge;
pub mod memory;
pub mod raft;
pub mod spec;
pub mod sync;
pub mod transaction;
pub mod types;

pub use memory::MemoryStore;
pub use transaction::StorageTransaction;
pub use types::*;

/// Entity persistence used by the mapping handlers.
///
/// Loads return `Ok(None)` for unknown ids; errors are infrastructure failures.
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Load a raft by id.
    async fn load_raft(&self, id: &str) -> Result<Option<Raft>>;

    /// Insert or replace a raft.
    async fn save_raft(&self, raft: &Raft) -> Result<()>;

    /// Load a badge spec by id (content identifier).
    async fn load_spec(&self, id: &str) -> Result<Option<BadgeSpec>>;

    /// Insert or replace a badge spec.
    async fn save_spec(&self, spec: &BadgeSpec) -> Result<()>;

    /// Load a badge by id.
    async fn load_badge(&self, id: &str) -> Result<Option<Badge>>;

    /// Insert or replace a badge.
    async fn save_badge(&self, badge: &Badge) -> Result<()>;
}

/// Database storage for the indexer.
///
/// Provides async access to SQLite database with connection pooling.
#[derive(Debug, Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    /// Create a new storage instance with the given database URL.
    ///
    /// The database file is created if it doesn't exist. Pool sizes default
    /// to 5 max / 1 min connections.
    ///
    /// # Example
    /// ```no_run
    /// # use raftbadge_indexer::storage::Storage;
    /// # async fn example() -> anyhow::Result<()> {
    /// let storage = Storage::new("sqlite://raftbadge.db", None, None).await?;
    /// storage.run_migrations().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn new(
        database_url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self> {
        info!("Connecting to database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {}", database_url))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.unwrap_or(5))
            .min_connections(min_connections.unwrap_or(1))
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        info!("Database connection established");

        Ok(Self { pool })
    }

    /// Create a new storage instance with a specific file path.
    pub async fn new_with_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let database_url = format!("sqlite://{}", path.as_ref().display());
        Self::new(&database_url, None, None).await
    }

    /// Run database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run migrations")?;

        info!("Migrations completed successfully");

        Ok(())
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        info!("Closing database connection");
        self.pool.close().await;
    }

    /// Get database statistics.
    pub async fn stats(&self) -> Result<DatabaseStats> {
        let raft_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rafts")
            .fetch_one(&self.pool)
            .await?;

        let spec_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM badge_specs")
            .fetch_one(&self.pool)
            .await?;

        let minted_badge_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM badges WHERE status = 'minted'")
                .fetch_one(&self.pool)
                .await?;

        let burned_badge_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM badges WHERE status = 'burned'")
                .fetch_one(&self.pool)
                .await?;

        let sync_state = self.get_sync_state().await?;

        Ok(DatabaseStats {
            raft_count: raft_count as u64,
            spec_count: spec_count as u64,
            minted_badge_count: minted_badge_count as u64,
            burned_badge_count: burned_badge_count as u64,
            last_block_number: sync_state.last_block_number,
        })
    }

    /// Check database health.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;

        Ok(())
    }
}

#[async_trait]
impl EntityStore for Storage {
    async fn load_raft(&self, id: &str) -> Result<Option<Raft>> {
        self.get_raft(id).await
    }

    async fn save_raft(&self, raft: &Raft) -> Result<()> {
        self.upsert_raft(raft).await
    }

    async fn load_spec(&self, id: &str) -> Result<Option<BadgeSpec>> {
        self.get_spec(id).await
    }

    async fn save_spec(&self, spec: &BadgeSpec) -> Result<()> {
        self.upsert_spec(spec).await
    }

    async fn load_badge(&self, id: &str) -> Result<Option<Badge>> {
        self.get_badge(id).await
    }

    async fn save_badge(&self, badge: &Badge) -> Result<()> {
        self.upsert_badge(badge).await
    }
}

#[async_trait]
impl<'a, S: EntityStore + ?Sized> EntityStore for &'a S {
    async fn load_raft(&self, id: &str) -> Result<Option<Raft>> {
        (**self).load_raft(id).await
    }

    async fn save_raft(&self, raft: &Raft) -> Result<()> {
        (**self).save_raft(raft).await
    }

    async fn load_spec(&self, id: &str) -> Result<Option<BadgeSpec>> {
        (**self).load_spec(id).await
    }

    async fn save_spec(&self, spec: &BadgeSpec) -> Result<()> {
        (**self).save_spec(spec).await
    }

    async fn load_badge(&self, id: &str) -> Result<Option<Badge>> {
        (**self).load_badge(id).await
    }

    async fn save_badge(&self, badge: &Badge) -> Result<()> {
        (**self).save_badge(badge).await
    }
}

#[async_trait]
impl<S: EntityStore + ?Sized> EntityStore for std::sync::Arc<S> {
    async fn load_raft(&self, id: &str) -> Result<Option<Raft>> {
        (**self).load_raft(id).await
    }

    async fn save_raft(&self, raft: &Raft) -> Result<()> {
        (**self).save_raft(raft).await
    }

    async fn load_spec(&self, id: &str) -> Result<Option<BadgeSpec>> {
        (**self).load_spec(id).await
    }

    async fn save_spec(&self, spec: &BadgeSpec) -> Result<()> {
        (**self).save_spec(spec).await
    }

    async fn load_badge(&self, id: &str) -> Result<Option<Badge>> {
        (**self).load_badge(id).await
    }

    async fn save_badge(&self, badge: &Badge) -> Result<()> {
        (**self).save_badge(badge).await
    }
}

/// Decode a 20-byte address column.
pub(crate) fn address_from_blob(bytes: &[u8], column: &str) -> Result<Address> {
    if bytes.len() != 20 {
        anyhow::bail!(
            "Column {} holds {} bytes, expected a 20-byte address",
            column,
            bytes.len()
        );
    }
    Ok(Address::from_slice(bytes))
}

/// Decode a decimal uint256 column.
pub(crate) fn u256_from_text(text: &str, column: &str) -> Result<U256> {
    U256::from_str_radix(text, 10)
        .map_err(|e| anyhow::anyhow!("Column {} holds invalid uint256 '{}': {}", column, text, e))
}
