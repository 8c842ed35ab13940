//! Badge storage operations.

use super::{address_from_blob, u256_from_text, Storage};
use anyhow::{Context, Result};
use raftbadge_core::{Badge, BadgeStatus};
use sqlx::sqlite::SqliteExecutor;
use sqlx::Row;

impl Storage {
    /// Get a badge by id.
    pub async fn get_badge(&self, id: &str) -> Result<Option<Badge>> {
        fetch_badge(&self.pool, id).await
    }

    /// Insert or replace a badge.
    pub async fn upsert_badge(&self, badge: &Badge) -> Result<()> {
        write_badge(&self.pool, badge).await
    }
}

pub(super) async fn fetch_badge<'e, E>(executor: E, id: &str) -> Result<Option<Badge>>
where
    E: SqliteExecutor<'e>,
{
    let row = sqlx::query(
        r#"
        SELECT id, token_id, owner, spec, created_at, status, burned_at
        FROM badges
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
    .with_context(|| format!("Failed to fetch badge {}", id))?;

    row.map(row_to_badge).transpose()
}

pub(super) async fn write_badge<'e, E>(executor: E, badge: &Badge) -> Result<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO badges (id, token_id, owner, spec, created_at, status, burned_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            token_id = excluded.token_id,
            owner = excluded.owner,
            spec = excluded.spec,
            created_at = excluded.created_at,
            status = excluded.status,
            burned_at = excluded.burned_at
        "#,
    )
    .bind(&badge.id)
    .bind(badge.token_id.to_string())
    .bind(badge.owner.as_slice())
    .bind(&badge.spec)
    .bind(badge.created_at as i64)
    .bind(badge.status.as_str())
    .bind(badge.burned_at.map(|v| v as i64))
    .execute(executor)
    .await
    .with_context(|| format!("Failed to upsert badge {}", badge.id))?;

    Ok(())
}

fn row_to_badge(row: sqlx::sqlite::SqliteRow) -> Result<Badge> {
    let owner: Vec<u8> = row.get("owner");
    let token_id: String = row.get("token_id");
    let status: String = row.get("status");

    Ok(Badge {
        id: row.get("id"),
        token_id: u256_from_text(&token_id, "badges.token_id")?,
        owner: address_from_blob(&owner, "badges.owner")?,
        spec: row.get("spec"),
        created_at: row.get::<i64, _>("created_at") as u64,
        status: status.parse::<BadgeStatus>()?,
        burned_at: row.get::<Option<i64>, _>("burned_at").map(|v| v as u64),
    })
}

#[cfg(test)]
mod tests {
    use crate::storage::test_support::temp_storage;
    use alloy::primitives::{Address, U256};
    use raftbadge_core::{Badge, BadgeStatus};

    #[tokio::test]
    async fn test_badge_roundtrip_and_burn() {
        let (storage, _temp_db) = temp_storage().await;

        let mut badge = Badge {
            id: "badges:5".to_string(),
            token_id: U256::from(5u64),
            owner: Address::repeat_byte(0x05),
            spec: "bafyspec".to_string(),
            created_at: 1_700_000_000,
            status: BadgeStatus::Minted,
            burned_at: None,
        };
        storage.upsert_badge(&badge).await.unwrap();
        assert_eq!(storage.get_badge("badges:5").await.unwrap(), Some(badge.clone()));
        assert_eq!(storage.stats().await.unwrap().minted_badge_count, 1);

        badge.status = BadgeStatus::Burned;
        badge.burned_at = Some(1_700_000_500);
        storage.upsert_badge(&badge).await.unwrap();

        let stored = storage.get_badge("badges:5").await.unwrap().unwrap();
        assert_eq!(stored.status, BadgeStatus::Burned);
        assert_eq!(stored.burned_at, Some(1_700_000_500));

        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.minted_badge_count, 0);
        assert_eq!(stats.burned_badge_count, 1);
    }
}
