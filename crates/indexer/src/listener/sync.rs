//! Sync engine for historical and live block processing.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{debug, info};

use super::{IndexedEvent, RpcProvider};
use crate::config::SyncConfig;
use crate::ipfs::{ContentFetcher, IpfsGateway};
use crate::mapping::{Synchronizer, TokenUriSource};
use crate::reporter::{Reporter, TracingReporter};
use crate::storage::Storage;

/// Applies decoded events to storage one block at a time.
///
/// Every block's entity writes and its sync-state update share one SQLite
/// transaction, so an interrupted block leaves no trace and is replayed whole.
pub struct BlockApplier<F, T, R> {
    storage: Storage,
    fetcher: F,
    token_uris: T,
    reporter: R,
}

impl<F, T, R> BlockApplier<F, T, R>
where
    F: ContentFetcher,
    T: TokenUriSource,
    R: Reporter,
{
    /// Create an applier over its collaborators.
    pub fn new(storage: Storage, fetcher: F, token_uris: T, reporter: R) -> Self {
        Self {
            storage,
            fetcher,
            token_uris,
            reporter,
        }
    }

    /// Apply chronologically sorted events, then record `through_block` as synced.
    ///
    /// Blocks are committed one by one; on error, blocks before the failing
    /// one stay committed and the sync state points at the last of them.
    pub async fn apply_range(&self, events: &[IndexedEvent], through_block: u64) -> Result<usize> {
        for block in events.chunk_by(|a, b| a.context.block_number == b.context.block_number) {
            self.apply_block(block[0].context.block_number, block)
                .await?;
        }

        self.storage.mark_block_synced(through_block).await?;

        Ok(events.len())
    }

    /// Apply the events of one block atomically.
    pub async fn apply_block(&self, block_number: u64, events: &[IndexedEvent]) -> Result<()> {
        let tx = self.storage.begin().await?;
        let synchronizer = Synchronizer::new(&tx, &self.fetcher, &self.token_uris, &self.reporter);

        for event in events {
            debug!(
                event = event.kind.name(),
                block = event.context.block_number,
                tx = %event.context.tx_hash,
                "Applying event"
            );
            synchronizer.handle(event).await.with_context(|| {
                format!(
                    "Failed to apply {} at block {} log {}",
                    event.kind.name(),
                    event.context.block_number,
                    event.context.log_index
                )
            })?;
        }

        drop(synchronizer);
        tx.mark_block_synced(block_number).await?;
        tx.commit()
            .await
            .with_context(|| format!("Failed to commit block {}", block_number))
    }
}

/// Sync engine manages historical catch-up and live block synchronization.
pub struct SyncEngine {
    provider: RpcProvider,
    storage: Storage,
    applier: BlockApplier<IpfsGateway, RpcProvider, TracingReporter>,
    config: SyncConfig,
}

impl SyncEngine {
    /// Create a new sync engine.
    pub fn new(
        provider: RpcProvider,
        storage: Storage,
        applier: BlockApplier<IpfsGateway, RpcProvider, TracingReporter>,
        config: SyncConfig,
    ) -> Self {
        Self {
            provider,
            storage,
            applier,
            config,
        }
    }

    /// Run the sync loop (historical + live).
    ///
    /// This method runs indefinitely, processing historical blocks in batches
    /// until caught up, then switching to live polling mode.
    pub async fn run(&self) -> Result<()> {
        info!("Sync engine starting...");

        loop {
            let sync_state = self.storage.get_sync_state().await?;
            let current_block = self.provider.get_block_number().await?;
            let safe_block = current_block.saturating_sub(self.config.confirmations);

            let last_synced = sync_state.last_block_number;

            debug!(
                "Sync status: last={}, current={}, safe={}, confirmations={}",
                last_synced, current_block, safe_block, self.config.confirmations
            );

            let blocks_behind = safe_block.saturating_sub(last_synced);

            if blocks_behind == 0 {
                debug!(
                    "Caught up, waiting {} seconds for new blocks...",
                    self.config.poll_interval_secs
                );
                tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
                continue;
            }

            if blocks_behind > self.config.batch_size {
                self.sync_historical_batch(last_synced, safe_block).await?;
            } else {
                self.sync_live(last_synced, safe_block).await?;

                tokio::time::sleep(Duration::from_secs(self.config.poll_interval_secs)).await;
            }
        }
    }

    /// Sync a batch of historical blocks.
    async fn sync_historical_batch(&self, from: u64, to: u64) -> Result<()> {
        let batch_end = (from + self.config.batch_size).min(to);

        info!(
            "Historical sync: processing blocks {} to {} ({} blocks)",
            from + 1,
            batch_end,
            batch_end - from
        );

        let events = self
            .provider
            .get_events(from + 1, batch_end)
            .await
            .with_context(|| {
                format!(
                    "Failed to fetch events for blocks {} to {}",
                    from + 1,
                    batch_end
                )
            })?;

        let processed = self.applier.apply_range(&events, batch_end).await?;
        info!("Batch complete: {} events applied", processed);

        Ok(())
    }

    /// Sync live blocks (block by block for precise progress).
    async fn sync_live(&self, from: u64, to: u64) -> Result<()> {
        if from >= to {
            return Ok(());
        }

        debug!("Live sync: processing blocks {} to {}", from + 1, to);

        for block_num in (from + 1)..=to {
            let events = self
                .provider
                .get_events(block_num, block_num)
                .await
                .with_context(|| format!("Failed to fetch events for block {}", block_num))?;

            if !events.is_empty() {
                info!("Block {}: found {} events", block_num, events.len());
            }

            self.applier.apply_range(&events, block_num).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipfs::InMemoryFetcher;
    use crate::listener::events::EventKind;
    use crate::mapping::test_support::{ctx_at, FakeTokenUris, BADGES, RAFT};
    use crate::reporter::RecordingReporter;
    use crate::storage::test_support::{execute_sql, temp_storage};
    use alloy::primitives::{Address, U256};
    use std::sync::Arc;

    const OWNER: Address = Address::new([0x01; 20]);
    const HOLDER: Address = Address::new([0x02; 20]);

    fn event(block: u64, log_index: u64, kind: EventKind) -> IndexedEvent {
        let contract = match kind {
            EventKind::RaftTransfer { .. } | EventKind::MetadataUpdate { .. } => RAFT,
            _ => BADGES,
        };
        let mut context = ctx_at(contract, block, 1_000 + block);
        context.log_index = log_index;
        IndexedEvent { context, kind }
    }

    fn mint(block: u64, log_index: u64, token_id: u64) -> IndexedEvent {
        event(
            block,
            log_index,
            EventKind::BadgeTransfer {
                from: Address::ZERO,
                to: HOLDER,
                token_id: U256::from(token_id),
            },
        )
    }

    /// Raft at block 1, spec at block 2, two mints in block 3.
    fn history() -> Vec<IndexedEvent> {
        vec![
            event(
                1,
                0,
                EventKind::RaftTransfer {
                    from: Address::ZERO,
                    to: OWNER,
                    token_id: U256::from(1),
                },
            ),
            event(
                2,
                0,
                EventKind::SpecCreated {
                    spec_uri: "ipfs://bafyspec/metadata.json".to_string(),
                    raft_address: RAFT,
                    raft_token_id: U256::from(1),
                    to: OWNER,
                },
            ),
            mint(3, 0, 10),
            mint(3, 1, 11),
        ]
    }

    fn token_uris() -> FakeTokenUris {
        FakeTokenUris::default()
            .with(RAFT, 1, "ipfs://bafyraft")
            .with(BADGES, 10, "ipfs://bafyspec/metadata.json")
            .with(BADGES, 11, "ipfs://bafyspec/metadata.json")
    }

    fn applier(
        storage: &Storage,
        token_uris: FakeTokenUris,
    ) -> BlockApplier<InMemoryFetcher, FakeTokenUris, Arc<RecordingReporter>> {
        BlockApplier::new(
            storage.clone(),
            InMemoryFetcher::new(),
            token_uris,
            Arc::new(RecordingReporter::new()),
        )
    }

    /// Events the engine would refetch after a restart.
    fn unsynced(events: &[IndexedEvent], last_synced: u64) -> Vec<IndexedEvent> {
        events
            .iter()
            .filter(|e| e.context.block_number > last_synced)
            .cloned()
            .collect()
    }

    async fn assert_single_application(storage: &Storage) {
        let raft = storage.get_raft("rafts:1").await.unwrap().unwrap();
        let spec = storage.get_spec("bafyspec").await.unwrap().unwrap();
        assert_eq!(raft.total_specs_count, 1);
        assert_eq!(spec.total_badges_count, 2);
        assert_eq!(raft.total_badges_count, spec.total_badges_count);
        assert_eq!(storage.stats().await.unwrap().minted_badge_count, 2);
    }

    #[tokio::test]
    async fn test_range_advances_sync_state() {
        let (storage, _temp_db) = temp_storage().await;

        let applied = applier(&storage, token_uris())
            .apply_range(&history(), 8)
            .await
            .unwrap();

        assert_eq!(applied, 4);
        assert_eq!(storage.get_sync_state().await.unwrap().last_block_number, 8);
        assert_single_application(&storage).await;
    }

    #[tokio::test]
    async fn test_store_failure_rolls_back_block_and_replay_counts_once() {
        let (storage, _temp_db) = temp_storage().await;
        let events = history();

        // The second mint of block 3 fails after the first one was written
        execute_sql(
            &storage,
            "CREATE TRIGGER reject_badge BEFORE INSERT ON badges \
             WHEN NEW.id = 'badges:11' BEGIN SELECT RAISE(ABORT, 'disk I/O error'); END",
        )
        .await;

        let result = applier(&storage, token_uris()).apply_range(&events, 3).await;
        assert!(result.is_err());

        let last_synced = storage.get_sync_state().await.unwrap().last_block_number;
        assert_eq!(last_synced, 2);
        assert!(storage.get_badge("badges:10").await.unwrap().is_none());
        let spec = storage.get_spec("bafyspec").await.unwrap().unwrap();
        assert_eq!(spec.total_badges_count, 0);

        execute_sql(&storage, "DROP TRIGGER reject_badge").await;
        applier(&storage, token_uris())
            .apply_range(&unsynced(&events, last_synced), 3)
            .await
            .unwrap();

        assert_single_application(&storage).await;
        assert_eq!(storage.get_sync_state().await.unwrap().last_block_number, 3);
    }

    #[tokio::test]
    async fn test_interrupted_block_rolls_back_and_replay_counts_once() {
        let (storage, _temp_db) = temp_storage().await;
        let events = history();

        // Shutdown while the second mint waits on the node
        let stuck = applier(&storage, token_uris().stalled(BADGES, 11));
        let interrupted =
            tokio::time::timeout(Duration::from_millis(200), stuck.apply_range(&events, 3)).await;
        assert!(interrupted.is_err());

        let last_synced = storage.get_sync_state().await.unwrap().last_block_number;
        assert_eq!(last_synced, 2);
        assert!(storage.get_badge("badges:10").await.unwrap().is_none());

        applier(&storage, token_uris())
            .apply_range(&unsynced(&events, last_synced), 3)
            .await
            .unwrap();

        assert_single_application(&storage).await;
    }
}
