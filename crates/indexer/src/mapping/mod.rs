//! Entity synchronization: maps contract events onto Raft, BadgeSpec and Badge entities.
//!
//! Every handler is a load-mutate-save sequence against an [`EntityStore`].
//! Missing off-chain data, unparsable metadata and missing parent entities
//! are reported through the [`Reporter`] and replaced by defaults; only
//! store failures are returned as errors.
//!
//! ```text
//! IndexedEvent ─► Synchronizer::handle
//!                   ├─ RaftTransfer    ─► rafts::handle_raft_transfer
//!                   ├─ MetadataUpdate  ─► rafts::handle_metadata_update
//!                   ├─ SpecCreated     ─► specs::handle_spec_created ─► refresh
//!                   ├─ RefreshMetadata ─► specs::handle_refresh_metadata
//!                   └─ BadgeTransfer   ─► badges::{badge_minted | badge_burned}
//! ```

use alloy::primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use raftbadge_core::{DescriptiveFields, MetadataDocument};

use crate::ipfs::ContentFetcher;
use crate::listener::events::{EventContext, EventKind, IndexedEvent};
use crate::reporter::Reporter;
use crate::storage::EntityStore;

pub mod badges;
pub mod rafts;
pub mod specs;

/// Read access to ERC-721 `tokenURI`.
#[async_trait]
pub trait TokenUriSource: Send + Sync {
    /// `tokenURI(token_id)` on `contract`, evaluated against the state at `block_number`.
    ///
    /// Handlers pass the block of the event being applied, so a token burned
    /// later still resolves while its mint is replayed.
    async fn token_uri(
        &self,
        contract: Address,
        token_id: U256,
        block_number: u64,
    ) -> Result<String>;
}

#[async_trait]
impl<'a, T: TokenUriSource + ?Sized> TokenUriSource for &'a T {
    async fn token_uri(
        &self,
        contract: Address,
        token_id: U256,
        block_number: u64,
    ) -> Result<String> {
        (**self).token_uri(contract, token_id, block_number).await
    }
}

#[async_trait]
impl<T: TokenUriSource + ?Sized> TokenUriSource for std::sync::Arc<T> {
    async fn token_uri(
        &self,
        contract: Address,
        token_id: U256,
        block_number: u64,
    ) -> Result<String> {
        (**self).token_uri(contract, token_id, block_number).await
    }
}

/// Applies decoded events to the entity store.
pub struct Synchronizer<S, F, T, R> {
    store: S,
    fetcher: F,
    token_uris: T,
    reporter: R,
}

impl<S, F, T, R> Synchronizer<S, F, T, R>
where
    S: EntityStore,
    F: ContentFetcher,
    T: TokenUriSource,
    R: Reporter,
{
    /// Create a synchronizer over its collaborators.
    pub fn new(store: S, fetcher: F, token_uris: T, reporter: R) -> Self {
        Self {
            store,
            fetcher,
            token_uris,
            reporter,
        }
    }

    /// The entity store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The diagnostic reporter.
    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    /// Dispatch one event to its handler.
    pub async fn handle(&self, event: &IndexedEvent) -> Result<()> {
        let ctx = &event.context;
        match &event.kind {
            EventKind::RaftTransfer { from, to, token_id } => {
                self.handle_raft_transfer(ctx, *from, *to, *token_id).await
            }
            EventKind::MetadataUpdate { token_id } => {
                self.handle_metadata_update(ctx, *token_id).await
            }
            EventKind::SpecCreated {
                spec_uri,
                raft_address,
                raft_token_id,
                to,
            } => {
                self.handle_spec_created(ctx, spec_uri, *raft_address, *raft_token_id, *to)
                    .await
            }
            EventKind::RefreshMetadata { spec_uri } => self.handle_refresh_metadata(spec_uri).await,
            EventKind::BadgeTransfer { from, to, token_id } => {
                self.handle_badge_transfer(ctx, *from, *to, *token_id).await
            }
        }
    }

    /// Resolve `tokenURI` at the event's block, reporting failures and yielding an empty URI.
    async fn resolve_token_uri(
        &self,
        operation: &'static str,
        ctx: &EventContext,
        token_id: U256,
    ) -> String {
        match self
            .token_uris
            .token_uri(ctx.contract, token_id, ctx.block_number)
            .await
        {
            Ok(uri) => uri,
            Err(e) => {
                self.reporter.error(
                    operation,
                    &format!("tokenURI lookup failed for token {}: {:#}", token_id, e),
                );
                String::new()
            }
        }
    }

    /// Turn fetched bytes into a document, reporting why when that is impossible.
    fn parse_document(
        &self,
        operation: &'static str,
        cid: &str,
        entity_id: &str,
        bytes: Option<Vec<u8>>,
    ) -> Option<MetadataDocument> {
        let Some(bytes) = bytes else {
            self.reporter.error(
                operation,
                &format!("Invalid IPFS for cid {} for {}", cid, entity_id),
            );
            return None;
        };

        match MetadataDocument::parse(&bytes) {
            Ok(document) => Some(document),
            Err(e) => {
                self.reporter.error(
                    operation,
                    &format!("error parsing metadata for {}: {}", cid, e),
                );
                None
            }
        }
    }

    /// Read name, description and image; non-string values become empty.
    fn descriptive_fields(
        &self,
        operation: &'static str,
        cid: &str,
        document: &MetadataDocument,
    ) -> DescriptiveFields {
        let read = |field: &str| {
            document.text_field(field).unwrap_or_else(|e| {
                self.reporter
                    .warn(operation, &format!("field {} of {}: {}", field, cid, e));
                String::new()
            })
        };

        DescriptiveFields {
            name: read("name"),
            description: read("description"),
            image: read("image"),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;

    use alloy::primitives::{Address, B256, U256};
    use anyhow::Result;
    use async_trait::async_trait;

    use super::{Synchronizer, TokenUriSource};
    use crate::ipfs::InMemoryFetcher;
    use crate::listener::events::EventContext;
    use crate::reporter::RecordingReporter;
    use crate::storage::MemoryStore;

    pub const RAFT: Address = Address::new([0x0a; 20]);
    pub const BADGES: Address = Address::new([0x0b; 20]);

    /// `tokenURI` answers keyed by (contract, token id); unknown tokens revert.
    #[derive(Debug, Default)]
    pub struct FakeTokenUris {
        uris: HashMap<(Address, U256), String>,
        burned_at: HashMap<(Address, U256), u64>,
        stalled: HashSet<(Address, U256)>,
    }

    impl FakeTokenUris {
        pub fn with(mut self, contract: Address, token_id: u64, uri: &str) -> Self {
            self.uris
                .insert((contract, U256::from(token_id)), uri.to_string());
            self
        }

        /// Calls evaluated at `block` or later revert, as for a burned token.
        pub fn burned_at(mut self, contract: Address, token_id: u64, block: u64) -> Self {
            self.burned_at.insert((contract, U256::from(token_id)), block);
            self
        }

        /// Calls for this token never complete.
        pub fn stalled(mut self, contract: Address, token_id: u64) -> Self {
            self.stalled.insert((contract, U256::from(token_id)));
            self
        }
    }

    #[async_trait]
    impl TokenUriSource for FakeTokenUris {
        async fn token_uri(
            &self,
            contract: Address,
            token_id: U256,
            block_number: u64,
        ) -> Result<String> {
            let key = (contract, token_id);
            if self.stalled.contains(&key) {
                std::future::pending::<()>().await;
            }
            if self
                .burned_at
                .get(&key)
                .is_some_and(|burned| block_number >= *burned)
            {
                anyhow::bail!("execution reverted: nonexistent token");
            }
            self.uris
                .get(&key)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("execution reverted: nonexistent token"))
        }
    }

    pub type TestSynchronizer =
        Synchronizer<Arc<MemoryStore>, InMemoryFetcher, FakeTokenUris, Arc<RecordingReporter>>;

    pub fn synchronizer(fetcher: InMemoryFetcher, token_uris: FakeTokenUris) -> TestSynchronizer {
        Synchronizer::new(
            Arc::new(MemoryStore::new()),
            fetcher,
            token_uris,
            Arc::new(RecordingReporter::new()),
        )
    }

    pub fn ctx(contract: Address, block_timestamp: u64) -> EventContext {
        ctx_at(contract, 1, block_timestamp)
    }

    pub fn ctx_at(contract: Address, block_number: u64, block_timestamp: u64) -> EventContext {
        EventContext {
            contract,
            block_number,
            block_timestamp,
            tx_index: 0,
            log_index: 0,
            tx_hash: B256::ZERO,
        }
    }

    pub fn metadata_json(name: &str, description: &str, image: &str) -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "name": name,
            "description": description,
            "image": image,
        }))
        .unwrap()
    }
}
