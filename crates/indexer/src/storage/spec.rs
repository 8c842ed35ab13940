//! Badge spec storage operations.

use super::{address_from_blob, Storage};
use anyhow::{Context, Result};
use raftbadge_core::BadgeSpec;
use sqlx::sqlite::SqliteExecutor;
use sqlx::Row;

impl Storage {
    /// Get a badge spec by id.
    pub async fn get_spec(&self, id: &str) -> Result<Option<BadgeSpec>> {
        fetch_spec(&self.pool, id).await
    }

    /// Insert or replace a badge spec.
    pub async fn upsert_spec(&self, spec: &BadgeSpec) -> Result<()> {
        write_spec(&self.pool, spec).await
    }
}

pub(super) async fn fetch_spec<'e, E>(executor: E, id: &str) -> Result<Option<BadgeSpec>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        SELECT id, uri, raft, created_at, created_by,
               name, description, image, expires_at, total_badges_count
        FROM badge_specs
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("Failed to fetch badge spec {}", id))?;

    row.map(row_to_spec).transpose()
}

pub(super) async fn write_spec<'e, E>(executor: E, spec: &BadgeSpec) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO badge_specs (
            id, uri, raft, created_at, created_by,
            name, description, image, expires_at, total_badges_count
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            uri = excluded.uri,
            raft = excluded.raft,
            created_at = excluded.created_at,
            created_by = excluded.created_by,
            name = excluded.name,
            description = excluded.description,
            image = excluded.image,
            expires_at = excluded.expires_at,
            total_badges_count = excluded.total_badges_count
        "#,
    )
    .bind(&spec.id)
    .bind(&spec.uri)
    .bind(&spec.raft)
    .bind(spec.created_at as i64)
    .bind(spec.created_by.as_slice())
    .bind(&spec.name)
    .bind(&spec.description)
    .bind(&spec.image)
    .bind(spec.expires_at.as_deref())
    .bind(spec.total_badges_count as i64)
    .execute(executor)
    .await
    .with_context(|| format!("Failed to upsert badge spec {}", spec.id))?;

    Ok(())
}

fn row_to_spec(row: sqlx::sqlite::SqliteRow) -> Result<BadgeSpec> {
    let created_by: Vec<u8> = row.get("created_by");

    Ok(BadgeSpec {
        id: row.get("id"),
        uri: row.get("uri"),
        raft: row.get("raft"),
        created_at: row.get::<i64, _>("created_at") as u64,
        created_by: address_from_blob(&created_by, "badge_specs.created_by")?,
        name: row.get("name"),
        description: row.get("description"),
        image: row.get("image"),
        expires_at: row.get("expires_at"),
        total_badges_count: row.get::<i64, _>("total_badges_count") as u64,
    })
}
