//! Raft storage operations.

use super::{address_from_blob, u256_from_text, Storage};
use anyhow::{Context, Result};
use raftbadge_core::Raft;
use sqlx::sqlite::SqliteExecutor;
use sqlx::Row;

impl Storage {
    /// Get a raft by id.
    pub async fn get_raft(&self, id: &str) -> Result<Option<Raft>> {
        fetch_raft(&self.pool, id).await
    }

    /// Insert or replace a raft.
    pub async fn upsert_raft(&self, raft: &Raft) -> Result<()> {
        write_raft(&self.pool, raft).await
    }
}

pub(super) async fn fetch_raft<'e, E>(executor: E, id: &str) -> Result<Option<Raft>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        SELECT id, owner, token_id, created_at, created_by, uri,
               name, description, image,
               total_badges_count, total_specs_count
        FROM rafts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("Failed to fetch raft {}", id))?;

    row.map(row_to_raft).transpose()
}

pub(super) async fn write_raft<'e, E>(executor: E, raft: &Raft) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO rafts (
            id, owner, token_id, created_at, created_by, uri,
            name, description, image,
            total_badges_count, total_specs_count
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            owner = excluded.owner,
            token_id = excluded.token_id,
            created_at = excluded.created_at,
            created_by = excluded.created_by,
            uri = excluded.uri,
            name = excluded.name,
            description = excluded.description,
            image = excluded.image,
            total_badges_count = excluded.total_badges_count,
            total_specs_count = excluded.total_specs_count
        "#,
    )
    .bind(&raft.id)
    .bind(raft.owner.as_slice())
    .bind(raft.token_id.to_string())
    .bind(raft.created_at as i64)
    .bind(raft.created_by.as_slice())
    .bind(&raft.uri)
    .bind(&raft.name)
    .bind(&raft.description)
    .bind(&raft.image)
    .bind(raft.total_badges_count as i64)
    .bind(raft.total_specs_count as i64)
    .execute(executor)
    .await
    .with_context(|| format!("Failed to upsert raft {}", raft.id))?;

    Ok(())
}

fn row_to_raft(row: sqlx::sqlite::SqliteRow) -> Result<Raft> {
    let owner: Vec<u8> = row.get("owner");
    let created_by: Vec<u8> = row.get("created_by");
    let token_id: String = row.get("token_id");

    Ok(Raft {
        id: row.get("id"),
        owner: address_from_blob(&owner, "rafts.owner")?,
        token_id: u256_from_text(&token_id, "rafts.token_id")?,
        created_at: row.get::<i64, _>("created_at") as u64,
        created_by: address_from_blob(&created_by, "rafts.created_by")?,
        uri: row.get("uri"),
        name: row.get("name"),
        description: row.get("description"),
        image: row.get("image"),
        total_badges_count: row.get::<i64, _>("total_badges_count") as u64,
        total_specs_count: row.get::<i64, _>("total_specs_count") as u64,
    })
}
