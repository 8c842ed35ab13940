//! Raft contract handlers.

use alloy::primitives::{Address, U256};
use anyhow::Result;
use raftbadge_core::{raft_id, resolve_content_id, Raft};

use super::{Synchronizer, TokenUriSource};
use crate::ipfs::{fetch_metadata_bytes, ContentFetcher};
use crate::listener::events::EventContext;
use crate::reporter::Reporter;
use crate::storage::EntityStore;

const HANDLE_RAFT_TRANSFER: &str = "handle_raft_transfer";
const HANDLE_METADATA_UPDATE: &str = "handle_metadata_update";

impl<S, F, T, R> Synchronizer<S, F, T, R>
where
    S: EntityStore,
    F: ContentFetcher,
    T: TokenUriSource,
    R: Reporter,
{
    /// Raft `Transfer`: create the raft on first sight, otherwise move ownership.
    pub async fn handle_raft_transfer(
        &self,
        ctx: &EventContext,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<()> {
        let id = raft_id(token_id, ctx.contract);

        if let Some(mut raft) = self.store.load_raft(&id).await? {
            raft.owner = to;
            return self.store.save_raft(&raft).await;
        }

        let mut raft = Raft::new(id, to, token_id, ctx.block_timestamp, from);
        raft.uri = self
            .resolve_token_uri(HANDLE_RAFT_TRANSFER, ctx, token_id)
            .await;

        let cid = resolve_content_id(&raft.uri);
        let bytes = fetch_metadata_bytes(&self.fetcher, &cid).await;
        if let Some(document) = self.parse_document(HANDLE_RAFT_TRANSFER, &cid, &raft.id, bytes) {
            let fields = self.descriptive_fields(HANDLE_RAFT_TRANSFER, &cid, &document);
            self.reporter.debug(
                HANDLE_RAFT_TRANSFER,
                &format!(
                    "{}: name={:?} description={:?} image={:?}",
                    raft.id, fields.name, fields.description, fields.image
                ),
            );
            raft.set_descriptive_fields(fields);
        }

        self.store.save_raft(&raft).await
    }

    /// EIP-4906 `MetadataUpdate`: re-read the raft's token URI and metadata.
    ///
    /// When the metadata cannot be fetched or parsed the raft keeps its
    /// previous descriptive fields; the refreshed URI is stored regardless.
    pub async fn handle_metadata_update(&self, ctx: &EventContext, token_id: U256) -> Result<()> {
        let id = raft_id(token_id, ctx.contract);

        let Some(mut raft) = self.store.load_raft(&id).await? else {
            self.reporter
                .error(HANDLE_METADATA_UPDATE, &format!("Raft {} not found", id));
            return Ok(());
        };

        raft.uri = self
            .resolve_token_uri(HANDLE_METADATA_UPDATE, ctx, token_id)
            .await;

        let cid = resolve_content_id(&raft.uri);
        let bytes = fetch_metadata_bytes(&self.fetcher, &cid).await;
        if let Some(document) = self.parse_document(HANDLE_METADATA_UPDATE, &cid, &raft.id, bytes)
        {
            let fields = self.descriptive_fields(HANDLE_METADATA_UPDATE, &cid, &document);
            raft.set_descriptive_fields(fields);
        }

        self.store.save_raft(&raft).await
    }
}
