//! Sync state storage operations.

use super::{Storage, SyncState};
use anyhow::{Context, Result};
use sqlx::sqlite::SqliteExecutor;
use sqlx::Row;

impl Storage {
    /// Get the current sync state.
    pub async fn get_sync_state(&self) -> Result<SyncState> {
        let row = sqlx::query(
            r#"
            SELECT last_block_number, updated_at, chain_id
            FROM sync_state
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch sync state")?;

        Ok(SyncState {
            last_block_number: row.get::<i64, _>("last_block_number") as u64,
            updated_at: row.get("updated_at"),
            chain_id: row.get::<i64, _>("chain_id") as u64,
        })
    }

    /// Update the sync state.
    pub async fn update_sync_state(&self, state: &SyncState) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sync_state
            SET last_block_number = ?,
                updated_at = ?,
                chain_id = ?
            WHERE id = 1
            "#,
        )
        .bind(state.last_block_number as i64)
        .bind(state.updated_at)
        .bind(state.chain_id as i64)
        .execute(&self.pool)
        .await
        .context("Failed to update sync state")?;

        Ok(())
    }

    /// Record that every block up to and including `block_number` is processed.
    pub async fn mark_block_synced(&self, block_number: u64) -> Result<()> {
        write_last_block(&self.pool, block_number).await
    }

    /// Initialize sync state for a new chain.
    pub async fn initialize_sync_state(&self, chain_id: u64, start_block: u64) -> Result<()> {
        let state = SyncState {
            last_block_number: start_block,
            updated_at: chrono::Utc::now().timestamp(),
            chain_id,
        };
        self.update_sync_state(&state)
            .await
            .context("Failed to initialize sync state")
    }
}

pub(super) async fn write_last_block<'e, E>(executor: E, block_number: u64) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE sync_state
        SET last_block_number = ?,
            updated_at = ?
        WHERE id = 1
        "#,
    )
    .bind(block_number as i64)
    .bind(chrono::Utc::now().timestamp())
    .execute(executor)
    .await
    .with_context(|| format!("Failed to mark block {} synced", block_number))?;

    Ok(())
}
