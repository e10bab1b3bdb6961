//! Cache operation tests against a simulated cluster.

mod common;

use std::sync::Arc;

use common::{connect, unique_name, SimulatedCluster};
use gridcache_client::{CacheClient, PeekMode};
use gridcache_core::protocol::OpCode;

async fn ready_cache(cluster: &Arc<SimulatedCluster>, prefix: &str) -> CacheClient {
    let cache = connect(cluster).cache(&unique_name(prefix));
    cache
        .refresh_affinity_mapping()
        .await
        .expect("failed to load affinity mapping");
    cache
}

#[tokio::test]
async fn test_put_get_round_trip() {
    let cluster = SimulatedCluster::new(3, 16);
    let cache = ready_cache(&cluster, "round-trip").await;

    cache.put("user-1", "alice").await.unwrap();
    cache.put(&42i64, &3.5f64).await.unwrap();

    assert_eq!(
        cache.get_value::<_, String>("user-1").await.unwrap().as_deref(),
        Some("alice")
    );
    assert_eq!(cache.get_value::<_, f64>(&42i64).await.unwrap(), Some(3.5));
}

#[tokio::test]
async fn test_put_overwrites() {
    let cluster = SimulatedCluster::new(2, 8);
    let cache = ready_cache(&cluster, "overwrite").await;

    cache.put("k", &1i32).await.unwrap();
    cache.put("k", &2i32).await.unwrap();

    assert_eq!(cache.get_value::<_, i32>("k").await.unwrap(), Some(2));
    assert_eq!(cluster.entry_count(cache.id()), 1);
}

#[tokio::test]
async fn test_get_missing_key_leaves_sink() {
    let cluster = SimulatedCluster::new(2, 8);
    let cache = ready_cache(&cluster, "missing").await;

    let mut sink: Option<String> = None;
    cache.get("absent", &mut sink).await.unwrap();
    assert!(sink.is_none());
}

#[tokio::test]
async fn test_containment_follows_put_and_remove() {
    let cluster = SimulatedCluster::new(3, 16);
    let cache = ready_cache(&cluster, "contains").await;

    assert!(!cache.contains_key("k").await.unwrap());
    cache.put("k", "v").await.unwrap();
    assert!(cache.contains_key("k").await.unwrap());

    assert!(cache.remove("k").await.unwrap());
    assert!(!cache.remove("k").await.unwrap());
    assert!(!cache.contains_key("k").await.unwrap());
}

#[tokio::test]
async fn test_clear_is_idempotent() {
    let cluster = SimulatedCluster::new(3, 16);
    let cache = ready_cache(&cluster, "clear").await;

    for i in 0..10i32 {
        cache.put(&i, &(i * 10)).await.unwrap();
    }
    assert_eq!(cache.get_size(PeekMode::ALL).await.unwrap(), 10);

    cache.clear().await.unwrap();
    cache.clear().await.unwrap();
    assert_eq!(cache.get_size(PeekMode::ALL).await.unwrap(), 0);
}

#[tokio::test]
async fn test_clear_key_is_selective() {
    let cluster = SimulatedCluster::new(2, 8);
    let cache = ready_cache(&cluster, "clear-key").await;

    cache.put("a", "1").await.unwrap();
    cache.put("b", "2").await.unwrap();
    cache.clear_key("a").await.unwrap();

    assert!(!cache.contains_key("a").await.unwrap());
    assert_eq!(
        cache.get_value::<_, String>("b").await.unwrap().as_deref(),
        Some("2")
    );
}

#[tokio::test]
async fn test_remove_all_empties_cache() {
    let cluster = SimulatedCluster::new(2, 8);
    let cache = ready_cache(&cluster, "remove-all").await;

    cache.put("a", "1").await.unwrap();
    cache.put("b", "2").await.unwrap();
    cache.remove_all().await.unwrap();

    assert_eq!(cache.get_size(PeekMode::ALL).await.unwrap(), 0);
    let remove_all = cluster.received_with(OpCode::RemoveAll);
    assert_eq!(remove_all.len(), 1);
    assert!(remove_all[0].target.is_none());
}

#[tokio::test]
async fn test_local_peek_reads_resident_value() {
    let cluster = SimulatedCluster::new(2, 8);
    let cache = ready_cache(&cluster, "peek").await;

    cache.put("k", &7u16).await.unwrap();

    let mut sink: Option<u16> = None;
    cache.local_peek("k", &mut sink).await.unwrap();
    assert_eq!(sink, Some(7));
}

#[tokio::test]
async fn test_caches_are_isolated() {
    let cluster = SimulatedCluster::new(2, 8);
    let client = common::connect(&cluster);
    let first = client.cache(&unique_name("first"));
    let second = client.cache(&unique_name("second"));

    first.put("k", "v").await.unwrap();
    assert!(!second.contains_key("k").await.unwrap());
}

#[tokio::test]
async fn test_works_without_affinity_mapping() {
    let cluster = SimulatedCluster::new(3, 16);
    let cache = connect(&cluster).cache(&unique_name("unmapped"));

    cache.put("k", "v").await.unwrap();
    assert!(cache.contains_key("k").await.unwrap());

    let puts = cluster.received_with(OpCode::Put);
    assert!(puts[0].target.is_none());
    assert!(puts[0].affinity_key.is_some());
}

#[tokio::test]
async fn test_binary_cache_sets_flag() {
    let cluster = SimulatedCluster::new(1, 4);
    let client = connect(&cluster);
    let cache = client.binary_cache(&unique_name("binary"));

    assert!(cache.is_binary());
    cache.put("k", &[1u8, 2, 3][..]).await.unwrap();
    assert_eq!(
        cache.get_value::<_, Vec<u8>>("k").await.unwrap(),
        Some(vec![1, 2, 3])
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_puts_are_independent() {
    let cluster = SimulatedCluster::new(3, 32);
    let cache = Arc::new(ready_cache(&cluster, "concurrent").await);

    let handles: Vec<_> = (0..64)
        .map(|i| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let key = format!("key-{i}");
                cache.put(&key, &(i as i64)).await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    for i in 0..64i64 {
        let key = format!("key-{i}");
        assert_eq!(cache.get_value::<_, i64>(&key).await.unwrap(), Some(i));
    }
    assert_eq!(cache.get_size(PeekMode::ALL).await.unwrap(), 64);
    assert_eq!(cache.stats().failures(), 0);
}
