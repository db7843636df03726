use super::*;
use crate::record::{encode, Message};

// The cache is process-wide, so every test uses its own namespace.

#[tokio::test]
async fn test_cache_shared_between_instances() {
    let writer = CacheDriver::with_options("test-shared", None);
    let reader = CacheDriver::with_options("test-shared", None);
    let identity = Identity::new("chatHistory", "helper");

    let raw = encode(&[Message::user("cached")]).unwrap();
    assert!(writer.write(&identity, &raw).await);
    assert_eq!(reader.read(&identity).await, Some(raw));

    assert!(reader.remove(&identity).await);
    assert!(writer.read(&identity).await.is_none());
}

#[tokio::test]
async fn test_cache_namespaces_are_isolated() {
    let a = CacheDriver::with_options("test-ns-a", None);
    let b = CacheDriver::with_options("test-ns-b", None);
    let identity = Identity::new("usage", "helper");

    a.write(&identity, &[]).await;
    assert_eq!(a.read(&identity).await, Some(Vec::new()));
    assert!(b.read(&identity).await.is_none());
}

#[tokio::test]
async fn test_cache_entry_expires() {
    let driver = CacheDriver::with_options("test-ttl", Some(0));
    let identity = Identity::new("usage", "helper");

    assert!(driver.write(&identity, &[]).await);
    assert!(driver.read(&identity).await.is_none());
}

#[tokio::test]
async fn test_clear_namespace() {
    let driver = CacheDriver::with_options("test-clear", None);
    let other = CacheDriver::with_options("test-clear-other", None);

    driver.write(&Identity::new("a", "x"), &[]).await;
    driver.write(&Identity::new("b", "x"), &[]).await;
    other.write(&Identity::new("a", "x"), &[]).await;

    assert_eq!(driver.clear_namespace(), 2);
    assert!(driver.read(&Identity::new("a", "x")).await.is_none());
    assert!(other.read(&Identity::new("a", "x")).await.is_some());
}

#[tokio::test]
async fn test_purge_expired_reclaims_unread_entries() {
    let expiring = CacheDriver::with_options("test-purge", Some(0));
    let lasting = CacheDriver::with_options("test-purge-keep", None);
    let identity = Identity::new("usage", "helper");

    assert!(expiring.write(&identity, &[]).await);
    assert!(lasting.write(&identity, &[]).await);

    CacheDriver::purge_expired();
    assert!(!PROCESS_CACHE.contains_key(&expiring.build_key(&identity)));
    assert!(PROCESS_CACHE.contains_key(&lasting.build_key(&identity)));
}

#[tokio::test]
async fn test_writes_sweep_expired_entries() {
    let expiring = CacheDriver::with_options("test-sweep", Some(0));
    let writer = CacheDriver::with_options("test-sweep-writer", None);
    let identity = Identity::new("usage", "helper");

    assert!(expiring.write(&identity, &[]).await);
    // Never read again; reclaimed by later writes alone
    for i in 0..SWEEP_INTERVAL {
        writer.write(&Identity::new("usage", format!("agent{}", i)), &[]).await;
    }
    assert!(!PROCESS_CACHE.contains_key(&expiring.build_key(&identity)));
}
