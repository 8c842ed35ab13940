//! Raft and Badges event ingestion.
//!
//! This crate provides:
//! - Event listeners for the Raft and Badges contracts
//! - Entity synchronization (rafts, badge specs, badges) with denormalized counters
//! - IPFS metadata retrieval for descriptive fields
//! - SQLite storage with sync progress tracking
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │  raftbadge-indexer               │
//! │                                  │
//! │  ┌─────────────────┐             │
//! │  │  Event Listener │ ← Ethereum RPC
//! │  │   (tokio task)  │   Transfer, SpecCreated,
//! │  └────────┬────────┘   MetadataUpdate, RefreshMetadata
//! │           │                      │
//! │     ┌─────▼────────┐             │
//! │     │ Synchronizer │ ← IPFS gateway
//! │     │  (handlers)  │ ← tokenURI  │
//! │     └─────┬────────┘             │
//! │           │                      │
//! │      ┌────▼──────┐               │
//! │      │  Storage  │ ← SQLite      │
//! │      └───────────┘               │
//! └──────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ipfs;
pub mod listener;
pub mod mapping;
pub mod ordering;
pub mod reporter;
pub mod storage;
