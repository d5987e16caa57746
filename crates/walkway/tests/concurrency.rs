//! Concurrent grants and key operations must not lose updates.

use std::sync::Arc;

use walkway::core::Archetype;
use walkway::store::MemoryStore;
use walkway::{AccessLevel, AclScope, ArchetypeId, Gateway, GatewayConfig, RootId};

fn gateway() -> (Gateway<Arc<MemoryStore>, Arc<MemoryStore>>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let gateway = Gateway::new(
        GatewayConfig::with_token_secret("concurrency"),
        store.clone(),
        store.clone(),
        [],
    )
    .unwrap();
    (gateway, store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_grants_to_distinct_roots() {
    let (gateway, store) = gateway();
    let owner = RootId::generate();
    let node = ArchetypeId::generate();
    store
        .register_archetype(Archetype::new(node, "Room", owner))
        .unwrap();

    let roots: Vec<RootId> = (0..32).map(|_| RootId::generate()).collect();
    let handles: Vec<_> = roots
        .iter()
        .map(|root| {
            let gateway = gateway.clone();
            let root = *root;
            tokio::spawn(async move {
                gateway
                    .allow_root(&owner, &node, root, AccessLevel::Write)
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let entries = gateway.acl_entries(&owner, &node).unwrap();
    assert_eq!(entries.len(), roots.len());
    for root in roots {
        assert_eq!(gateway.effective_level(&root, &node), AccessLevel::Write);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_upserts_on_one_scope_leave_one_entry() {
    let (gateway, store) = gateway();
    let owner = RootId::generate();
    let node = ArchetypeId::generate();
    store
        .register_archetype(Archetype::new(node, "Room", owner))
        .unwrap();

    let handles: Vec<_> = (0..64)
        .map(|i| {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                let level = if i % 2 == 0 {
                    AccessLevel::Read
                } else {
                    AccessLevel::Connect
                };
                gateway.set_public(&owner, &node, level).unwrap();
                if i % 3 == 0 {
                    gateway.unset_public(&owner, &node).unwrap();
                    gateway.set_public(&owner, &node, level).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    let entries = gateway.acl_entries(&owner, &node).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].scope, AclScope::Public);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_key_creation() {
    let (gateway, _) = gateway();
    let owner = RootId::generate();

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let gateway = gateway.clone();
            tokio::spawn(async move { gateway.create_api_key(owner, &format!("k{i}"), None).unwrap() })
        })
        .collect();
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().api_key_id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(gateway.list_api_keys(&owner).unwrap().len(), 16);
}
