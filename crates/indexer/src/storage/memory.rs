//! In-memory entity store.

use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use raftbadge_core::{Badge, BadgeSpec, Raft};
use tokio::sync::RwLock;

use super::EntityStore;

/// Entity store backed by hash maps.
///
/// Useful for dry runs and for exercising the mapping handlers without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rafts: RwLock<HashMap<String, Raft>>,
    specs: RwLock<HashMap<String, BadgeSpec>>,
    badges: RwLock<HashMap<String, Badge>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rafts.
    pub async fn raft_count(&self) -> usize {
        self.rafts.read().await.len()
    }

    /// Number of stored specs.
    pub async fn spec_count(&self) -> usize {
        self.specs.read().await.len()
    }

    /// Number of stored badges.
    pub async fn badge_count(&self) -> usize {
        self.badges.read().await.len()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn load_raft(&self, id: &str) -> Result<Option<Raft>> {
        Ok(self.rafts.read().await.get(id).cloned())
    }

    async fn save_raft(&self, raft: &Raft) -> Result<()> {
        self.rafts
            .write()
            .await
            .insert(raft.id.clone(), raft.clone());
        Ok(())
    }

    async fn load_spec(&self, id: &str) -> Result<Option<BadgeSpec>> {
        Ok(self.specs.read().await.get(id).cloned())
    }

    async fn save_spec(&self, spec: &BadgeSpec) -> Result<()> {
        self.specs
            .write()
            .await
            .insert(spec.id.clone(), spec.clone());
        Ok(())
    }

    async fn load_badge(&self, id: &str) -> Result<Option<Badge>> {
        Ok(self.badges.read().await.get(id).cloned())
    }

    async fn save_badge(&self, badge: &Badge) -> Result<()> {
        self.badges
            .write()
            .await
            .insert(badge.id.clone(), badge.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, U256};

    #[tokio::test]
    async fn test_save_replaces_by_id() {
        let store = MemoryStore::new();
        let mut raft = Raft::new(
            "rafts:1".to_string(),
            Address::repeat_byte(0x01),
            U256::from(1u64),
            0,
            Address::ZERO,
        );
        store.save_raft(&raft).await.unwrap();

        raft.owner = Address::repeat_byte(0x02);
        store.save_raft(&raft).await.unwrap();

        assert_eq!(store.raft_count().await, 1);
        let loaded = store.load_raft("rafts:1").await.unwrap().unwrap();
        assert_eq!(loaded.owner, Address::repeat_byte(0x02));
        assert!(store.load_spec("rafts:1").await.unwrap().is_none());
    }
}
