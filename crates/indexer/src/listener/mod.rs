//! Event listener for Raft and Badges contract events.
//!
//! This module provides:
//! - Event type definitions and log decoding
//! - RPC provider wrapper for Ethereum communication (logs, `tokenURI`, block timestamps)
//! - Sync engine for historical and live block processing

pub mod events;
pub mod provider;
pub mod sync;

pub use events::{EventContext, EventKind, IndexedEvent};
pub use provider::RpcProvider;
pub use sync::{BlockApplier, SyncEngine};
