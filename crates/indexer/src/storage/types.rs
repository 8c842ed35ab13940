//! Database types for the indexer storage layer.

/// Sync state record (singleton).
///
/// Tracks the indexer's progress through the blockchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncState {
    /// Last fully processed block number
    pub last_block_number: u64,

    /// Unix timestamp of last update
    pub updated_at: i64,

    /// Chain ID (0 until initialized)
    pub chain_id: u64,
}

/// Database statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    /// Total number of rafts
    pub raft_count: u64,

    /// Total number of badge specs
    pub spec_count: u64,

    /// Badges currently minted
    pub minted_badge_count: u64,

    /// Badges burned
    pub burned_badge_count: u64,

    /// Last processed block number
    pub last_block_number: u64,
}
