//! RPC provider wrapper for Ethereum communication.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use alloy::providers::{Provider, ProviderBuilder, RootProvider};
use alloy::rpc::types::{BlockId, BlockNumberOrTag, BlockTransactionsKind, Filter, Log};
use alloy::sol;
use alloy::transports::http::{Client, Http};
use anyhow::{Context, Result};
use async_trait::async_trait;

use super::events::{event_signatures, IndexedEvent};
use crate::config::ContractsConfig;
use crate::mapping::TokenUriSource;
use crate::ordering::sort_chronologically;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IERC721Metadata {
        function tokenURI(uint256 tokenId) external view returns (string);
    }
}

/// HTTP RPC provider for querying Ethereum.
#[derive(Clone)]
pub struct RpcProvider {
    provider: RootProvider<Http<Client>>,
    contracts: ContractsConfig,
}

impl RpcProvider {
    /// Create a new RPC provider.
    pub async fn new(rpc_url: &str, contracts: ContractsConfig) -> Result<Self> {
        let url = rpc_url
            .parse()
            .with_context(|| format!("Invalid RPC URL: {}", rpc_url))?;

        let provider = ProviderBuilder::new().on_http(url);

        Ok(Self {
            provider,
            contracts,
        })
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> Result<u64> {
        self.provider
            .get_block_number()
            .await
            .context("Failed to get block number")
    }

    /// Get the timestamp of a block.
    pub async fn get_block_timestamp(&self, block_number: u64) -> Result<u64> {
        let block = self
            .provider
            .get_block_by_number(
                BlockNumberOrTag::Number(block_number),
                BlockTransactionsKind::Hashes,
            )
            .await
            .with_context(|| format!("Failed to fetch block {}", block_number))?
            .with_context(|| format!("Block {} not found", block_number))?;

        Ok(block.header.timestamp)
    }

    /// Get decoded Raft and Badges events for a block range, in emission order.
    pub async fn get_events(&self, from_block: u64, to_block: u64) -> Result<Vec<IndexedEvent>> {
        let filter = Filter::new()
            .address(vec![self.contracts.raft, self.contracts.badges])
            .event_signature(event_signatures())
            .from_block(from_block)
            .to_block(to_block);

        let logs: Vec<Log> = self
            .provider
            .get_logs(&filter)
            .await
            .context("Failed to fetch logs from RPC")?;

        let mut timestamps: HashMap<u64, u64> = HashMap::new();
        let mut events = Vec::with_capacity(logs.len());

        for log in &logs {
            if log.removed {
                continue;
            }

            let timestamp = match (log.block_timestamp, log.block_number) {
                (Some(ts), _) => ts,
                (None, Some(number)) => match timestamps.get(&number) {
                    Some(ts) => *ts,
                    None => {
                        let ts = self.get_block_timestamp(number).await?;
                        timestamps.insert(number, ts);
                        ts
                    }
                },
                (None, None) => 0,
            };

            match IndexedEvent::from_log(log, &self.contracts, timestamp) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    // Log parsing error but continue processing other events
                    tracing::warn!("Failed to parse contract event: {:#}", e);
                }
            }
        }

        sort_chronologically(&mut events);

        Ok(events)
    }

    /// Call `tokenURI(tokenId)` on an ERC-721 contract against the state at `block_number`.
    pub async fn token_uri(
        &self,
        contract: Address,
        token_id: U256,
        block_number: u64,
    ) -> Result<String> {
        let instance = IERC721Metadata::new(contract, self.provider.clone());
        let result = instance
            .tokenURI(token_id)
            .call()
            .block(BlockId::number(block_number))
            .await
            .with_context(|| {
                format!(
                    "tokenURI({}) call failed on {} at block {}",
                    token_id, contract, block_number
                )
            })?;

        Ok(result._0)
    }
}

#[async_trait]
impl TokenUriSource for RpcProvider {
    async fn token_uri(
        &self,
        contract: Address,
        token_id: U256,
        block_number: u64,
    ) -> Result<String> {
        RpcProvider::token_uri(self, contract, token_id, block_number).await
    }
}
