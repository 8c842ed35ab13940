//! Badge token handlers.

use alloy::primitives::{Address, U256};
use anyhow::Result;
use raftbadge_core::{badge_id, resolve_content_id, Badge, BadgeStatus, ZERO_ADDRESS};

use super::{Synchronizer, TokenUriSource};
use crate::ipfs::ContentFetcher;
use crate::listener::events::EventContext;
use crate::reporter::Reporter;
use crate::storage::EntityStore;

const HANDLE_BADGE_MINTED: &str = "handle_badge_minted";
const HANDLE_BADGE_BURNED: &str = "handle_badge_burned";

impl<S, F, T, R> Synchronizer<S, F, T, R>
where
    S: EntityStore,
    F: ContentFetcher,
    T: TokenUriSource,
    R: Reporter,
{
    /// Badges `Transfer`: a transfer from the zero address is a mint, anything else goes
    /// through [`Self::badge_burned`].
    pub async fn handle_badge_transfer(
        &self,
        ctx: &EventContext,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<()> {
        let id = badge_id(token_id, ctx.contract);

        if from == ZERO_ADDRESS {
            self.badge_minted(ctx, &id, to, token_id).await
        } else {
            self.badge_burned(ctx, &id, to).await
        }
    }

    /// Create a minted badge and bump the spec and raft badge counters.
    pub async fn badge_minted(
        &self,
        ctx: &EventContext,
        id: &str,
        to: Address,
        token_id: U256,
    ) -> Result<()> {
        let uri = self
            .resolve_token_uri(HANDLE_BADGE_MINTED, ctx, token_id)
            .await;
        let spec_id = resolve_content_id(&uri);

        let badge = Badge {
            id: id.to_string(),
            token_id,
            owner: to,
            spec: spec_id.clone(),
            created_at: ctx.block_timestamp,
            status: BadgeStatus::Minted,
            burned_at: None,
        };
        self.store.save_badge(&badge).await?;

        let Some(mut spec) = self.store.load_spec(&spec_id).await? else {
            self.reporter.error(
                HANDLE_BADGE_MINTED,
                &format!("BadgeSpec {} not found for badge {}", spec_id, id),
            );
            return Ok(());
        };
        spec.total_badges_count += 1;
        self.store.save_spec(&spec).await?;

        match self.store.load_raft(&spec.raft).await? {
            Some(mut raft) => {
                raft.total_badges_count += 1;
                self.store.save_raft(&raft).await?;
            }
            None => self.reporter.error(
                HANDLE_BADGE_MINTED,
                &format!("Raft {} not found for spec {}", spec.raft, spec.id),
            ),
        }

        Ok(())
    }

    /// Burn the badge when `to` is the zero address, otherwise move it to `to`.
    ///
    /// Burned badges stay in the store and stop counting towards their spec and raft.
    pub async fn badge_burned(&self, ctx: &EventContext, id: &str, to: Address) -> Result<()> {
        let Some(mut badge) = self.store.load_badge(id).await? else {
            self.reporter
                .error(HANDLE_BADGE_BURNED, &format!("Badge {} not found", id));
            return Ok(());
        };

        if to != ZERO_ADDRESS {
            badge.owner = to;
            return self.store.save_badge(&badge).await;
        }

        if badge.status == BadgeStatus::Burned {
            self.reporter
                .warn(HANDLE_BADGE_BURNED, &format!("Badge {} already burned", id));
            return Ok(());
        }

        badge.status = BadgeStatus::Burned;
        badge.burned_at = Some(ctx.block_timestamp);
        self.store.save_badge(&badge).await?;

        let Some(mut spec) = self.store.load_spec(&badge.spec).await? else {
            self.reporter.error(
                HANDLE_BADGE_BURNED,
                &format!("BadgeSpec {} not found for badge {}", badge.spec, id),
            );
            return Ok(());
        };
        spec.total_badges_count = spec.total_badges_count.saturating_sub(1);
        self.store.save_spec(&spec).await?;

        match self.store.load_raft(&spec.raft).await? {
            Some(mut raft) => {
                raft.total_badges_count = raft.total_badges_count.saturating_sub(1);
                self.store.save_raft(&raft).await?;
            }
            None => self.reporter.error(
                HANDLE_BADGE_BURNED,
                &format!("Raft {} not found for spec {}", spec.raft, spec.id),
            ),
        }

        Ok(())
    }
}
