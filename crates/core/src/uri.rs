//! Metadata URI classification and content identifier extraction.
//!
//! Token and spec URIs arrive in a handful of shapes:
//!
//! ```text
//! ipfs://<cid>/metadata.json                     → Ipfs
//! https://ipfs.io/ipfs/<cid>/metadata.json       → Ipfs
//! https://<cid>.ipfs.nftstorage.link/metadata.json → Gateway
//! <cid>                                          → Opaque
//! ```
//!
//! Supporting a new gateway means adding a variant and its extraction rule
//! to [`MetadataUri::classify`].

use crate::constants::{IPFS_IO_GATEWAY, IPFS_SCHEME, METADATA_PATH, NFT_STORAGE_MARKER};

/// A metadata URI classified by shape, carrying its content identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataUri {
    /// `ipfs://` URI or an `https://ipfs.io` path gateway URI.
    Ipfs {
        /// Extracted content identifier.
        cid: String,
    },

    /// nft.storage subdomain gateway URI (`https://<cid>.ipfs.nftstorage.link/...`).
    Gateway {
        /// Extracted content identifier.
        cid: String,
    },

    /// Anything else; the URI is taken to already be the content identifier.
    Opaque(String),
}

impl MetadataUri {
    /// Classify a URI and extract its content identifier.
    pub fn classify(uri: &str) -> Self {
        if uri.contains(IPFS_SCHEME) || uri.contains(IPFS_IO_GATEWAY) {
            let stripped = uri.replace(METADATA_PATH, "");
            return MetadataUri::Ipfs {
                cid: after_last_slash(&stripped).to_string(),
            };
        }

        // The marker must not lead the string: a bare "nftstorage..." value is opaque.
        if matches!(uri.find(NFT_STORAGE_MARKER), Some(pos) if pos > 0) {
            let host_part = uri.split('.').next().unwrap_or(uri);
            return MetadataUri::Gateway {
                cid: after_last_slash(host_part).to_string(),
            };
        }

        MetadataUri::Opaque(uri.to_string())
    }

    /// The content identifier carried by this URI.
    pub fn content_id(&self) -> &str {
        match self {
            MetadataUri::Ipfs { cid } | MetadataUri::Gateway { cid } => cid,
            MetadataUri::Opaque(cid) => cid,
        }
    }

    /// Consume the URI and return its content identifier.
    pub fn into_content_id(self) -> String {
        match self {
            MetadataUri::Ipfs { cid } | MetadataUri::Gateway { cid } => cid,
            MetadataUri::Opaque(cid) => cid,
        }
    }
}

fn after_last_slash(s: &str) -> &str {
    match s.rfind('/') {
        Some(idx) => &s[idx + 1..],
        None => s,
    }
}

/// Resolve the content identifier of a metadata URI.
pub fn resolve_content_id(uri: &str) -> String {
    MetadataUri::classify(uri).into_content_id()
}

/// Canonical metadata location for a content identifier: `ipfs://{cid}/metadata.json`.
pub fn full_metadata_path(cid: &str) -> String {
    format!("{IPFS_SCHEME}{cid}{METADATA_PATH}")
}

/// Append the metadata document path to a URI or content identifier.
pub fn append_metadata_path(uri: &str) -> String {
    format!("{uri}{METADATA_PATH}")
}
