//! Badge spec handlers.

use alloy::primitives::{Address, U256};
use anyhow::Result;
use raftbadge_core::{
    append_metadata_path, full_metadata_path, raft_id, resolve_content_id, BadgeSpec,
    DescriptiveFields,
};

use super::{Synchronizer, TokenUriSource};
use crate::ipfs::ContentFetcher;
use crate::listener::events::EventContext;
use crate::reporter::Reporter;
use crate::storage::EntityStore;

const HANDLE_SPEC_CREATED: &str = "handle_spec_created";
const UPDATE_BADGE_SPEC_METADATA: &str = "update_badge_spec_metadata";

impl<S, F, T, R> Synchronizer<S, F, T, R>
where
    S: EntityStore,
    F: ContentFetcher,
    T: TokenUriSource,
    R: Reporter,
{
    /// `SpecCreated`: store a fresh spec, pull its metadata and bump the raft's spec count.
    ///
    /// An existing spec with the same content id is replaced.
    pub async fn handle_spec_created(
        &self,
        ctx: &EventContext,
        spec_uri: &str,
        raft_address: Address,
        raft_token_id: U256,
        to: Address,
    ) -> Result<()> {
        let cid = resolve_content_id(spec_uri);
        let raft_key = raft_id(raft_token_id, raft_address);

        let spec = BadgeSpec::new(
            cid.clone(),
            full_metadata_path(&cid),
            raft_key.clone(),
            ctx.block_timestamp,
            to,
        );
        self.store.save_spec(&spec).await?;

        self.update_badge_spec_metadata(&cid).await?;

        match self.store.load_raft(&raft_key).await? {
            Some(mut raft) => {
                raft.total_specs_count += 1;
                self.store.save_raft(&raft).await?;
            }
            None => self.reporter.error(
                HANDLE_SPEC_CREATED,
                &format!("Raft {} not found for spec {}", raft_key, cid),
            ),
        }

        Ok(())
    }

    /// `RefreshMetadata`: re-read the spec's metadata.
    pub async fn handle_refresh_metadata(&self, spec_uri: &str) -> Result<()> {
        let cid = resolve_content_id(spec_uri);
        self.update_badge_spec_metadata(&cid).await
    }

    /// Reload name, description, image and expiration of spec `cid`.
    ///
    /// Only `<cid>/metadata.json` is fetched. When it is missing or invalid
    /// the descriptive fields are cleared.
    pub async fn update_badge_spec_metadata(&self, cid: &str) -> Result<()> {
        let Some(mut spec) = self.store.load_spec(cid).await? else {
            self.reporter.error(
                UPDATE_BADGE_SPEC_METADATA,
                &format!("BadgeSpec {} not found", cid),
            );
            return Ok(());
        };

        let bytes = self.fetcher.cat(&append_metadata_path(cid)).await;
        match self.parse_document(UPDATE_BADGE_SPEC_METADATA, cid, &spec.id, bytes) {
            Some(document) => {
                let fields = self.descriptive_fields(UPDATE_BADGE_SPEC_METADATA, cid, &document);
                let expires_at = document.expires_at().unwrap_or_else(|e| {
                    self.reporter.error(
                        UPDATE_BADGE_SPEC_METADATA,
                        &format!("properties of {}: {}", cid, e),
                    );
                    None
                });
                self.reporter.debug(
                    UPDATE_BADGE_SPEC_METADATA,
                    &format!(
                        "{}: name={:?} description={:?} image={:?} expiresAt={:?}",
                        spec.id, fields.name, fields.description, fields.image, expires_at
                    ),
                );
                spec.set_metadata(fields, expires_at);
            }
            None => spec.set_metadata(DescriptiveFields::default(), None),
        }

        self.store.save_spec(&spec).await
    }
}
