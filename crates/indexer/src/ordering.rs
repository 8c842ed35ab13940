//! Chain ordering of decoded events.

use crate::listener::events::IndexedEvent;

/// Position of a log on chain.
///
/// Orders lexicographically by block, then transaction, then log index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockCoordinates {
    /// Block number
    pub block_number: u64,

    /// Transaction index within block
    pub tx_index: u64,

    /// Log index within block
    pub log_index: u64,
}

impl BlockCoordinates {
    /// Create new block coordinates.
    pub fn new(block_number: u64, tx_index: u64, log_index: u64) -> Self {
        Self {
            block_number,
            tx_index,
            log_index,
        }
    }
}

/// Sort events into the order they were emitted.
///
/// Logs from two contracts come back from a single `eth_getLogs` call, but
/// nodes are not required to interleave them; handlers depend on the
/// emission order (a raft's first transfer precedes its specs).
pub fn sort_chronologically(events: &mut [IndexedEvent]) {
    events.sort_by_key(|event| event.context.coordinates());
}
