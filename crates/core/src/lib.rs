//! # Raft/Badge Core
//!
//! Entity types, identifiers and metadata helpers shared by the Raft/Badge indexer.
//!
//! ## Features
//!
//! - **Identifiers**: namespaced entity keys (`rafts:<id>`, `badges:<id>`)
//! - **URI Resolution**: content identifier extraction from IPFS, gateway and bare URIs
//! - **Metadata**: typed JSON field lookup that fails explicitly instead of panicking
//! - **Entities**: Raft, BadgeSpec and Badge records with denormalized counters

#![warn(missing_docs)]

pub mod constants;
pub mod error;
pub mod ids;
pub mod metadata;
pub mod types;
pub mod uri;

// Re-export commonly used items
pub use constants::*;
pub use error::{ConversionError, CoreError, MetadataError};
pub use ids::{badge_id, raft_id};
pub use metadata::{DescriptiveFields, MetadataDocument};
pub use types::*;
pub use uri::{append_metadata_path, full_metadata_path, resolve_content_id, MetadataUri};

pub use alloy_primitives::{Address, U256};
