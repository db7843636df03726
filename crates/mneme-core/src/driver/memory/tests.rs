use super::*;
use crate::record::{encode, Message};

#[tokio::test]
async fn test_memory_driver_basic_operations() {
    let driver = MemoryDriver::new();
    let identity = Identity::new("chatHistory", "helper");

    // Initially empty
    assert!(driver.is_empty().await);
    assert!(driver.read(&identity).await.is_none());

    let raw = encode(&[Message::user("Hello")]).unwrap();
    assert!(driver.write(&identity, &raw).await);
    assert!(driver.contains(&identity).await);
    assert_eq!(driver.read(&identity).await, Some(raw));

    assert!(driver.remove(&identity).await);
    assert!(driver.read(&identity).await.is_none());
}

#[tokio::test]
async fn test_memory_driver_distinguishes_cleared_from_missing() {
    let driver = MemoryDriver::new();
    let identity = Identity::new("chatHistory", "helper");

    assert!(driver.write(&identity, &[]).await);
    assert_eq!(driver.read(&identity).await, Some(Vec::new()));
}

#[tokio::test]
async fn test_memory_driver_remove_missing_key_succeeds() {
    let driver = MemoryDriver::new();
    assert!(driver.remove(&Identity::new("usage", "nobody")).await);
}

#[tokio::test]
async fn test_memory_drivers_are_isolated() {
    let a = MemoryDriver::new();
    let b = MemoryDriver::new();
    let identity = Identity::new("usage", "helper");

    a.write(&identity, &[]).await;
    assert!(b.read(&identity).await.is_none());
    assert_eq!(a.len().await, 1);
    assert_eq!(b.len().await, 0);
}
