//! Constants shared by identifier building and metadata resolution.

use alloy_primitives::Address;

/// Namespace tag for Raft identifiers.
pub const RAFTS_NAMESPACE: &str = "rafts";

/// Namespace tag for Badge identifiers.
pub const BADGES_NAMESPACE: &str = "badges";

/// Separator between a namespace tag and the token id.
pub const ID_SEPARATOR: char = ':';

/// Path suffix of the metadata document inside a content-addressed directory.
pub const METADATA_PATH: &str = "/metadata.json";

/// URI scheme prefix for native IPFS URIs.
pub const IPFS_SCHEME: &str = "ipfs://";

/// Public IPFS gateway host that is treated like a native IPFS URI.
pub const IPFS_IO_GATEWAY: &str = "https://ipfs.io";

/// Marker for nft.storage subdomain gateway URIs (`<cid>.ipfs.nftstorage.link`).
pub const NFT_STORAGE_MARKER: &str = "nftstorage";

/// Mint/burn counterparty address.
pub const ZERO_ADDRESS: Address = Address::ZERO;
