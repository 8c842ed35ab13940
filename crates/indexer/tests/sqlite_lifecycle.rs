use std::collections::HashMap;
use std::sync::Arc;

use alloy::primitives::{Address, B256, U256};
use async_trait::async_trait;
use raftbadge_core::BadgeStatus;
use raftbadge_indexer::{
    ipfs::InMemoryFetcher,
    listener::{EventContext, EventKind, IndexedEvent},
    mapping::{Synchronizer, TokenUriSource},
    ordering::sort_chronologically,
    reporter::RecordingReporter,
    storage::{EntityStore, Storage},
};
use tempfile::TempDir;

const RAFT: Address = Address::new([0x0a; 20]);
const BADGES: Address = Address::new([0x0b; 20]);
const OWNER: Address = Address::new([0x01; 20]);
const HOLDER: Address = Address::new([0x02; 20]);

#[derive(Default)]
struct StaticTokenUris(HashMap<(Address, U256), String>);

#[async_trait]
impl TokenUriSource for StaticTokenUris {
    async fn token_uri(
        &self,
        contract: Address,
        token_id: U256,
        _block_number: u64,
    ) -> anyhow::Result<String> {
        self.0
            .get(&(contract, token_id))
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("execution reverted"))
    }
}

fn event(contract: Address, block_number: u64, log_index: u64, kind: EventKind) -> IndexedEvent {
    IndexedEvent {
        context: EventContext {
            contract,
            block_number,
            block_timestamp: 1_700_000_000 + block_number * 12,
            tx_index: 0,
            log_index,
            tx_hash: B256::repeat_byte(block_number as u8),
        },
        kind,
    }
}

fn json(value: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

async fn storage(dir: &TempDir) -> Storage {
    let storage = Storage::new_with_path(dir.path().join("indexer.db"))
        .await
        .unwrap();
    storage.run_migrations().await.unwrap();
    storage
}

#[tokio::test]
async fn raft_spec_badge_lifecycle_over_sqlite() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir).await;

    let fetcher = InMemoryFetcher::new()
        .with_object(
            "bafyraft/metadata.json",
            json(serde_json::json!({ "name": "Community", "image": "ipfs://raft.png" })),
        )
        .with_object(
            "bafyspec/metadata.json",
            json(serde_json::json!({
                "name": "Early Member",
                "description": "Joined before launch",
                "image": "ipfs://spec.png",
                "properties": { "expiresAt": "2030-01-01T00:00:00Z" },
            })),
        );

    let mut uris = StaticTokenUris::default();
    uris.0.insert(
        (RAFT, U256::from(1)),
        "ipfs://bafyraft/metadata.json".to_string(),
    );
    for token in [10u64, 11] {
        uris.0.insert(
            (BADGES, U256::from(token)),
            "https://bafyspec.ipfs.nftstorage.link/metadata.json".to_string(),
        );
    }

    let reporter = Arc::new(RecordingReporter::new());
    let synchronizer = Synchronizer::new(storage.clone(), fetcher, uris, reporter.clone());

    // Deliberately out of order; the feed sorts by block coordinates
    let mut events = vec![
        event(
            BADGES,
            3,
            0,
            EventKind::BadgeTransfer {
                from: Address::ZERO,
                to: HOLDER,
                token_id: U256::from(10),
            },
        ),
        event(
            RAFT,
            1,
            0,
            EventKind::RaftTransfer {
                from: Address::ZERO,
                to: OWNER,
                token_id: U256::from(1),
            },
        ),
        event(
            BADGES,
            2,
            0,
            EventKind::SpecCreated {
                spec_uri: "ipfs://bafyspec/metadata.json".to_string(),
                raft_address: RAFT,
                raft_token_id: U256::from(1),
                to: OWNER,
            },
        ),
        event(
            BADGES,
            3,
            1,
            EventKind::BadgeTransfer {
                from: Address::ZERO,
                to: HOLDER,
                token_id: U256::from(11),
            },
        ),
        event(
            BADGES,
            4,
            0,
            EventKind::BadgeTransfer {
                from: HOLDER,
                to: Address::ZERO,
                token_id: U256::from(10),
            },
        ),
    ];
    sort_chronologically(&mut events);

    for event in &events {
        synchronizer.handle(event).await.unwrap();
    }

    assert!(reporter.errors().is_empty(), "{:?}", reporter.errors());

    let raft = storage.load_raft("rafts:1").await.unwrap().unwrap();
    assert_eq!(raft.owner, OWNER);
    assert_eq!(raft.name, "Community");
    assert_eq!(raft.description, "");
    assert_eq!(raft.total_specs_count, 1);
    assert_eq!(raft.total_badges_count, 1);

    let spec = storage.load_spec("bafyspec").await.unwrap().unwrap();
    assert_eq!(spec.raft, "rafts:1");
    assert_eq!(spec.name, "Early Member");
    assert_eq!(spec.expires_at.as_deref(), Some("2030-01-01T00:00:00Z"));
    assert_eq!(spec.total_badges_count, 1);

    let burned = storage.load_badge("badges:10").await.unwrap().unwrap();
    assert_eq!(burned.status, BadgeStatus::Burned);
    assert_eq!(burned.burned_at, Some(1_700_000_000 + 4 * 12));

    let live = storage.load_badge("badges:11").await.unwrap().unwrap();
    assert_eq!(live.status, BadgeStatus::Minted);
    assert_eq!(live.owner, HOLDER);

    let stats = storage.stats().await.unwrap();
    assert_eq!(stats.raft_count, 1);
    assert_eq!(stats.spec_count, 1);
    assert_eq!(stats.minted_badge_count, 1);
    assert_eq!(stats.burned_badge_count, 1);

    storage.close().await;
}

#[tokio::test]
async fn refresh_of_unknown_spec_leaves_database_empty() {
    let dir = TempDir::new().unwrap();
    let storage = storage(&dir).await;
    let reporter = Arc::new(RecordingReporter::new());
    let synchronizer = Synchronizer::new(
        storage.clone(),
        InMemoryFetcher::new(),
        StaticTokenUris::default(),
        reporter.clone(),
    );

    synchronizer
        .handle(&event(
            BADGES,
            1,
            0,
            EventKind::RefreshMetadata {
                spec_uri: "ipfs://bafynothing".to_string(),
            },
        ))
        .await
        .unwrap();

    let stats = storage.stats().await.unwrap();
    assert_eq!(stats.raft_count, 0);
    assert_eq!(stats.spec_count, 0);
    assert!(reporter.has_error("update_badge_spec_metadata"));
}
