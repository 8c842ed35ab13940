//! Indexed entity types.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::metadata::DescriptiveFields;

/// A collection-level token that owns zero or more badge specs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Raft {
    /// `rafts:<tokenId>`
    pub id: String,

    /// Current token owner
    pub owner: Address,

    /// Raft token id
    pub token_id: U256,

    /// Block timestamp of the creating transfer (unix seconds)
    pub created_at: u64,

    /// Sender of the creating transfer
    pub created_by: Address,

    /// On-chain token URI
    pub uri: String,

    /// Metadata name
    pub name: String,

    /// Metadata description
    pub description: String,

    /// Metadata image
    pub image: String,

    /// Number of live badges issued under this raft's specs
    pub total_badges_count: u64,

    /// Number of specs created under this raft
    pub total_specs_count: u64,
}

impl Raft {
    /// A freshly created raft with zeroed counters and empty descriptive fields.
    pub fn new(
        id: String,
        owner: Address,
        token_id: U256,
        created_at: u64,
        created_by: Address,
    ) -> Self {
        Self {
            id,
            owner,
            token_id,
            created_at,
            created_by,
            uri: String::new(),
            name: String::new(),
            description: String::new(),
            image: String::new(),
            total_badges_count: 0,
            total_specs_count: 0,
        }
    }

    /// Overwrite name, description and image.
    pub fn set_descriptive_fields(&mut self, fields: DescriptiveFields) {
        self.name = fields.name;
        self.description = fields.description;
        self.image = fields.image;
    }
}

/// A badge template scoped to one raft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeSpec {
    /// Content identifier of the spec metadata
    pub id: String,

    /// `ipfs://<cid>/metadata.json`
    pub uri: String,

    /// Owning raft id
    pub raft: String,

    /// Block timestamp of creation (unix seconds)
    pub created_at: u64,

    /// Address the spec was created for
    pub created_by: Address,

    /// Metadata name
    pub name: String,

    /// Metadata description
    pub description: String,

    /// Metadata image
    pub image: String,

    /// `properties.expiresAt` from the metadata, when it is a string
    pub expires_at: Option<String>,

    /// Number of live badges of this spec
    pub total_badges_count: u64,
}

impl BadgeSpec {
    /// A freshly created spec with a zeroed counter and empty descriptive fields.
    pub fn new(id: String, uri: String, raft: String, created_at: u64, created_by: Address) -> Self {
        Self {
            id,
            uri,
            raft,
            created_at,
            created_by,
            name: String::new(),
            description: String::new(),
            image: String::new(),
            expires_at: None,
            total_badges_count: 0,
        }
    }

    /// Overwrite name, description, image and expiration.
    pub fn set_metadata(&mut self, fields: DescriptiveFields, expires_at: Option<String>) {
        self.name = fields.name;
        self.description = fields.description;
        self.image = fields.image;
        self.expires_at = expires_at;
    }
}

/// Lifecycle state of a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BadgeStatus {
    /// Minted and held by `owner`
    Minted,

    /// Burned; kept for history
    Burned,
}

impl BadgeStatus {
    /// Convert to database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            BadgeStatus::Minted => "minted",
            BadgeStatus::Burned => "burned",
        }
    }
}

impl std::str::FromStr for BadgeStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minted" => Ok(BadgeStatus::Minted),
            "burned" => Ok(BadgeStatus::Burned),
            _ => Err(CoreError::UnknownBadgeStatus(s.to_string())),
        }
    }
}

/// An issued instance of a badge spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    /// `badges:<tokenId>`
    pub id: String,

    /// Badge token id
    pub token_id: U256,

    /// Current holder
    pub owner: Address,

    /// Spec id (content identifier)
    pub spec: String,

    /// Block timestamp of the mint (unix seconds)
    pub created_at: u64,

    /// Lifecycle state
    pub status: BadgeStatus,

    /// Block timestamp of the burn, if burned
    pub burned_at: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_badge_status_str_conversion() {
        assert_eq!(BadgeStatus::Minted.as_str(), "minted");
        assert_eq!(BadgeStatus::Burned.as_str(), "burned");
        assert_eq!(
            "minted".parse::<BadgeStatus>().unwrap(),
            BadgeStatus::Minted
        );
        assert_eq!(
            "burned".parse::<BadgeStatus>().unwrap(),
            BadgeStatus::Burned
        );
        assert!("revoked".parse::<BadgeStatus>().is_err());
    }

    #[test]
    fn test_new_raft_has_zero_counters() {
        let raft = Raft::new(
            "rafts:1".to_string(),
            Address::repeat_byte(0x01),
            U256::from(1u64),
            1_700_000_000,
            Address::ZERO,
        );
        assert_eq!(raft.total_badges_count, 0);
        assert_eq!(raft.total_specs_count, 0);
        assert!(raft.name.is_empty());
        assert!(raft.uri.is_empty());
    }

    #[test]
    fn test_spec_set_metadata() {
        let mut spec = BadgeSpec::new(
            "bafyspec".to_string(),
            "ipfs://bafyspec/metadata.json".to_string(),
            "rafts:1".to_string(),
            10,
            Address::ZERO,
        );
        spec.set_metadata(
            DescriptiveFields {
                name: "Contributor".to_string(),
                description: "Shipped code".to_string(),
                image: "ipfs://img".to_string(),
            },
            Some("2030-01-01".to_string()),
        );
        assert_eq!(spec.name, "Contributor");
        assert_eq!(spec.expires_at.as_deref(), Some("2030-01-01"));
        assert_eq!(spec.total_badges_count, 0);
    }
}
