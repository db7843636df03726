use super::*;
use crate::driver::MemoryDriver;

fn manager() -> Arc<StorageManager> {
    Arc::new(StorageManager::new(vec![Arc::new(MemoryDriver::new())]).unwrap())
}

fn owner() -> Identity {
    Identity::new("session", "helper").with_user_id("u1")
}

#[tokio::test]
async fn test_scope_is_context() {
    let tracking = IdentityStorage::for_context(&owner(), manager());
    assert_eq!(tracking.identity().scope, "context");
    assert_eq!(tracking.identity().key(), "context_helper_u1");
}

#[tokio::test]
async fn test_duplicates_are_ignored() {
    let mut tracking = IdentityStorage::for_context(&owner(), manager());
    let history = owner().with_scope("chatHistory");

    assert!(tracking.add_identity(history.clone()).await.unwrap());
    assert!(!tracking.add_identity(history.clone()).await.unwrap());
    assert_eq!(tracking.identities().await.unwrap(), vec![history]);
}

#[tokio::test]
async fn test_temporary_identities_are_skipped() {
    let mut tracking = IdentityStorage::for_context(&owner(), manager());
    let scratch = Identity::new("chatHistory", "helper").with_chat_name("temp_scratch");

    assert!(!tracking.add_identity(scratch.clone()).await.unwrap());
    assert!(!tracking.contains(&scratch).await.unwrap());
    assert!(!tracking.is_dirty());
}

#[tokio::test]
async fn test_filter_by_scope() {
    let mut tracking = IdentityStorage::for_context(&owner(), manager());
    tracking
        .add_identity(owner().with_scope("chatHistory"))
        .await
        .unwrap();
    tracking
        .add_identity(owner().with_scope("usage"))
        .await
        .unwrap();

    let usage = tracking.identities_by_scope("usage").await.unwrap();
    assert_eq!(usage.len(), 1);
    assert_eq!(usage[0].key(), "usage_helper_u1");
}

#[tokio::test]
async fn test_tracking_survives_reload() {
    let manager = manager();
    let mut tracking = IdentityStorage::for_context(&owner(), manager.clone());
    tracking
        .add_identity(owner().with_scope("chatHistory"))
        .await
        .unwrap();
    assert!(tracking.save().await.unwrap());

    let mut reopened = IdentityStorage::for_context(&owner(), manager);
    assert!(reopened
        .contains(&owner().with_scope("chatHistory"))
        .await
        .unwrap());
}
