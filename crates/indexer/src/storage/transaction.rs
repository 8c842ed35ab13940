//! Transaction-scoped entity store.

use anyhow::{Context, Result};
use async_trait::async_trait;
use raftbadge_core::{Badge, BadgeSpec, Raft};
use sqlx::{Sqlite, Transaction};
use tokio::sync::Mutex;

use super::{badge, raft, spec, sync, EntityStore, Storage};

/// Entity reads and writes inside one SQLite transaction.
///
/// Nothing is visible to other connections until [`commit`](Self::commit).
/// Dropping the value without committing rolls every write back.
pub struct StorageTransaction {
    tx: Mutex<Transaction<'static, Sqlite>>,
}

impl Storage {
    /// Open a transaction.
    pub async fn begin(&self) -> Result<StorageTransaction> {
        let tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        Ok(StorageTransaction { tx: Mutex::new(tx) })
    }
}

impl StorageTransaction {
    /// Record `block_number` as the last processed block, as part of this transaction.
    pub async fn mark_block_synced(&self, block_number: u64) -> Result<()> {
        let mut tx = self.tx.lock().await;
        sync::write_last_block(&mut **tx, block_number).await
    }

    /// Commit every write made through this transaction.
    pub async fn commit(self) -> Result<()> {
        self.tx
            .into_inner()
            .commit()
            .await
            .context("Failed to commit transaction")
    }
}

#[async_trait]
impl EntityStore for StorageTransaction {
    async fn load_raft(&self, id: &str) -> Result<Option<Raft>> {
        let mut tx = self.tx.lock().await;
        raft::fetch_raft(&mut **tx, id).await
    }

    async fn save_raft(&self, raft: &Raft) -> Result<()> {
        let mut tx = self.tx.lock().await;
        raft::write_raft(&mut **tx, raft).await
    }

    async fn load_spec(&self, id: &str) -> Result<Option<BadgeSpec>> {
        let mut tx = self.tx.lock().await;
        spec::fetch_spec(&mut **tx, id).await
    }

    async fn save_spec(&self, spec: &BadgeSpec) -> Result<()> {
        let mut tx = self.tx.lock().await;
        spec::write_spec(&mut **tx, spec).await
    }

    async fn load_badge(&self, id: &str) -> Result<Option<Badge>> {
        let mut tx = self.tx.lock().await;
        badge::fetch_badge(&mut **tx, id).await
    }

    async fn save_badge(&self, badge: &Badge) -> Result<()> {
        let mut tx = self.tx.lock().await;
        badge::write_badge(&mut **tx, badge).await
    }
}
