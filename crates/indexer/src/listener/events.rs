//! Event type definitions for Raft and Badges contract events.

use alloy::primitives::{Address, B256, U256};
use alloy::rpc::types::Log;
use alloy::sol;
use alloy::sol_types::SolEvent;
use anyhow::{Context, Result};

use crate::config::ContractsConfig;
use crate::ordering::BlockCoordinates;

// Event signatures emitted by the Raft and Badges contracts.
sol! {
    /// ERC-721 Transfer (both contracts)
    #[derive(Debug, PartialEq, Eq)]
    event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);

    /// EIP-4906 MetadataUpdate (Raft, emitted by `setTokenURI`)
    #[derive(Debug, PartialEq, Eq)]
    event MetadataUpdate(uint256 _tokenId);

    /// Badge spec registered under a raft (Badges)
    #[derive(Debug, PartialEq, Eq)]
    event SpecCreated(
        address indexed to,
        string specUri,
        uint256 indexed raftTokenId,
        address indexed raftAddress
    );

    /// Spec metadata should be re-read (Badges)
    #[derive(Debug, PartialEq, Eq)]
    event RefreshMetadata(string specUri);
}

/// Topic-0 hashes of every event the indexer consumes.
pub fn event_signatures() -> Vec<B256> {
    vec![
        Transfer::SIGNATURE_HASH,
        MetadataUpdate::SIGNATURE_HASH,
        SpecCreated::SIGNATURE_HASH,
        RefreshMetadata::SIGNATURE_HASH,
    ]
}

/// Where and when an event was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext {
    /// Emitting contract
    pub contract: Address,

    /// Block number where the event occurred
    pub block_number: u64,

    /// Block timestamp (unix seconds)
    pub block_timestamp: u64,

    /// Transaction index within the block
    pub tx_index: u64,

    /// Log index within the block
    pub log_index: u64,

    /// Transaction hash
    pub tx_hash: B256,
}

impl EventContext {
    /// Extract block coordinates from a log.
    pub fn from_log(log: &Log, block_timestamp: u64) -> Result<Self> {
        let block_number = log.block_number.context("Log missing block_number")?;
        let tx_index = log
            .transaction_index
            .context("Log missing transaction_index")?;
        let log_index = log.log_index.context("Log missing log_index")?;
        let tx_hash = log
            .transaction_hash
            .context("Log missing transaction_hash")?;

        Ok(Self {
            contract: log.inner.address,
            block_number,
            block_timestamp,
            tx_index,
            log_index,
            tx_hash,
        })
    }

    /// Ordering key of this event.
    pub fn coordinates(&self) -> BlockCoordinates {
        BlockCoordinates::new(self.block_number, self.tx_index, self.log_index)
    }
}

/// Payload of a decoded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Raft token transfer (mint or ownership change)
    RaftTransfer {
        /// Sender
        from: Address,
        /// Recipient
        to: Address,
        /// Raft token id
        token_id: U256,
    },

    /// Raft token URI changed
    MetadataUpdate {
        /// Raft token id
        token_id: U256,
    },

    /// Badge spec created
    SpecCreated {
        /// Spec metadata URI
        spec_uri: String,
        /// Raft contract address
        raft_address: Address,
        /// Raft token id owning the spec
        raft_token_id: U256,
        /// Address the spec was created for
        to: Address,
    },

    /// Badge spec metadata refresh requested
    RefreshMetadata {
        /// Spec metadata URI
        spec_uri: String,
    },

    /// Badge token transfer (mint, burn or ownership change)
    BadgeTransfer {
        /// Sender
        from: Address,
        /// Recipient
        to: Address,
        /// Badge token id
        token_id: U256,
    },
}

impl EventKind {
    /// Short label for logging.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::RaftTransfer { .. } => "RaftTransfer",
            EventKind::MetadataUpdate { .. } => "MetadataUpdate",
            EventKind::SpecCreated { .. } => "SpecCreated",
            EventKind::RefreshMetadata { .. } => "RefreshMetadata",
            EventKind::BadgeTransfer { .. } => "BadgeTransfer",
        }
    }
}

/// A decoded event with its block coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedEvent {
    /// Emission context
    pub context: EventContext,

    /// Decoded payload
    pub kind: EventKind,
}

impl IndexedEvent {
    /// Decode a log emitted by the Raft or Badges contract.
    ///
    /// Returns `Ok(None)` for logs that are not consumed (other contracts,
    /// other signatures, or an event on the wrong contract).
    pub fn from_log(log: &Log, contracts: &ContractsConfig, block_timestamp: u64) -> Result<Option<Self>> {
        let Some(topic0) = log.inner.data.topics().first().copied() else {
            return Ok(None);
        };

        let contract = log.inner.address;
        let from_raft = contract == contracts.raft;
        let from_badges = contract == contracts.badges;
        if !from_raft && !from_badges {
            return Ok(None);
        }

        let kind = if topic0 == Transfer::SIGNATURE_HASH {
            let decoded = Transfer::decode_log(&log.inner, true)
                .context("Failed to decode Transfer event")?;
            let (from, to, token_id) = (decoded.data.from, decoded.data.to, decoded.data.tokenId);
            if from_raft {
                EventKind::RaftTransfer { from, to, token_id }
            } else {
                EventKind::BadgeTransfer { from, to, token_id }
            }
        } else if topic0 == MetadataUpdate::SIGNATURE_HASH && from_raft {
            let decoded = MetadataUpdate::decode_log(&log.inner, true)
                .context("Failed to decode MetadataUpdate event")?;
            EventKind::MetadataUpdate {
                token_id: decoded.data._tokenId,
            }
        } else if topic0 == SpecCreated::SIGNATURE_HASH && from_badges {
            let decoded = SpecCreated::decode_log(&log.inner, true)
                .context("Failed to decode SpecCreated event")?;
            let spec = decoded.data;
            EventKind::SpecCreated {
                spec_uri: spec.specUri,
                raft_address: spec.raftAddress,
                raft_token_id: spec.raftTokenId,
                to: spec.to,
            }
        } else if topic0 == RefreshMetadata::SIGNATURE_HASH && from_badges {
            let decoded = RefreshMetadata::decode_log(&log.inner, true)
                .context("Failed to decode RefreshMetadata event")?;
            EventKind::RefreshMetadata {
                spec_uri: decoded.data.specUri,
            }
        } else {
            return Ok(None);
        };

        Ok(Some(Self {
            context: EventContext::from_log(log, block_timestamp)?,
            kind,
        }))
    }
}
