//! Entity identifier builders.
//!
//! Identifiers have the shape `<namespace>:<decimal token id>`. The contract
//! address is accepted so call sites stay explicit about where a token came
//! from, but it is not part of the key: two contracts sharing a token id map
//! to the same entity.

use alloy_primitives::{Address, U256};

use crate::constants::{BADGES_NAMESPACE, ID_SEPARATOR, RAFTS_NAMESPACE};

fn build_id(namespace: &str, token_id: U256) -> String {
    format!("{namespace}{ID_SEPARATOR}{token_id}")
}

/// Identifier of the Raft with the given token id (`rafts:<tokenId>`).
pub fn raft_id(token_id: U256, _raft_address: Address) -> String {
    build_id(RAFTS_NAMESPACE, token_id)
}

/// Identifier of the Badge with the given token id (`badges:<tokenId>`).
pub fn badge_id(token_id: U256, _badge_address: Address) -> String {
    build_id(BADGES_NAMESPACE, token_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raft_id_format() {
        let id = raft_id(U256::from(42u64), Address::repeat_byte(0x01));
        assert_eq!(id, "rafts:42");
    }

    #[test]
    fn test_badge_id_format() {
        let id = badge_id(U256::from(7u64), Address::repeat_byte(0x02));
        assert_eq!(id, "badges:7");
    }

    #[test]
    fn test_large_token_id_is_decimal() {
        let id = raft_id(U256::MAX, Address::ZERO);
        assert_eq!(
            id,
            "rafts:115792089237316195423570985008687907853269984665640564039457584007913129639935"
        );
    }

    #[test]
    fn test_ids_are_injective_over_token_id() {
        let address = Address::repeat_byte(0xaa);
        let ids: std::collections::HashSet<String> =
            (0u64..500).map(|n| raft_id(U256::from(n), address)).collect();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_address_is_not_part_of_key() {
        let token_id = U256::from(1u64);
        assert_eq!(
            raft_id(token_id, Address::repeat_byte(0x01)),
            raft_id(token_id, Address::repeat_byte(0x02))
        );
        assert_ne!(
            raft_id(token_id, Address::ZERO),
            badge_id(token_id, Address::ZERO)
        );
    }
}
