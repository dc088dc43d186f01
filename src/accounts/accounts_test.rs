use std::sync::Arc;
use std::time::Duration;

use super::testing::{MemoryAccountStore, StaticProvisioner};
use super::*;
use crate::error::ErrorCode;

fn gateway(store: Arc<MemoryAccountStore>, provisioner: Arc<StaticProvisioner>) -> Gateway {
    Gateway::new(store, provisioner)
}

// =========================================================================
// create_account
// =========================================================================

#[tokio::test]
async fn create_account_stores_pending_and_returns_redirect() {
    let store = Arc::new(MemoryAccountStore::default());
    let gw = gateway(store.clone(), Arc::new(StaticProvisioner::new()));

    let url = gw.create_account("u1").await.unwrap();

    assert_eq!(url, "https://connect.example/ca_1");
    assert_eq!(store.pending_of("u1").as_deref(), Some("ca_1"));
    assert_eq!(store.confirmed_of("u1"), None);
}

#[tokio::test]
async fn repeated_create_account_keeps_latest_pending() {
    let store = Arc::new(MemoryAccountStore::default());
    let gw = gateway(store.clone(), Arc::new(StaticProvisioner::new()));

    gw.create_account("u1").await.unwrap();
    gw.create_account("u1").await.unwrap();

    assert_eq!(store.pending_of("u1").as_deref(), Some("ca_2"));
}

#[tokio::test]
async fn create_account_refuses_when_confirmed() {
    let store = Arc::new(MemoryAccountStore::with_confirmed("u1", "ca_9"));
    let provisioner = Arc::new(StaticProvisioner::new());
    let gw = gateway(store.clone(), provisioner.clone());

    let err = gw.create_account("u1").await.unwrap_err();

    assert!(matches!(err, AccountError::AlreadyLinked));
    assert_eq!(provisioner.issued(), 0);
    assert_eq!(store.pending_of("u1"), None);
}

#[tokio::test]
async fn provisioning_failure_leaves_store_untouched() {
    let store = Arc::new(MemoryAccountStore::default());
    let gw = gateway(store.clone(), Arc::new(StaticProvisioner::failing()));

    let err = gw.create_account("u1").await.unwrap_err();

    assert!(matches!(err, AccountError::Provision(_)));
    assert_eq!(err.error_code(), "E_ACCOUNT_PROVISION");
    assert!(err.retryable());
    assert_eq!(store.pending_of("u1"), None);
}

// =========================================================================
// reauthenticate
// =========================================================================

#[tokio::test]
async fn reauthenticate_replaces_connection() {
    let store = Arc::new(MemoryAccountStore::with_confirmed("u1", "ca_old"));
    let gw = gateway(store.clone(), Arc::new(StaticProvisioner::new()));

    let url = gw.reauthenticate("u1").await.unwrap();

    assert_eq!(url, "https://connect.example/ca_1");
    assert_eq!(store.confirmed_of("u1").as_deref(), Some("ca_1"));
}

#[tokio::test]
async fn reauthenticate_without_confirmed_link_fails() {
    let store = Arc::new(MemoryAccountStore::default());
    let provisioner = Arc::new(StaticProvisioner::new());
    let gw = gateway(store.clone(), provisioner.clone());
    gw.create_account("u1").await.unwrap();

    let err = gw.reauthenticate("u1").await.unwrap_err();

    assert!(matches!(err, AccountError::NoAccount));
    assert_eq!(provisioner.issued(), 1);
}

// =========================================================================
// resolve
// =========================================================================

#[tokio::test]
async fn resolve_prefers_confirmed_link() {
    let store = Arc::new(MemoryAccountStore::with_confirmed("u1", "ca_c"));
    store.pending.lock().unwrap().insert("u1".into(), "ca_p".into());
    let gw = gateway(store.clone(), Arc::new(StaticProvisioner::new()));

    assert_eq!(gw.resolve("u1", Service::Calendar).await.unwrap(), "ca_c");
    assert_eq!(store.pending_of("u1").as_deref(), Some("ca_p"));
}

#[tokio::test]
async fn calendar_promotes_pending_link() {
    let store = Arc::new(MemoryAccountStore::default());
    let gw = gateway(store.clone(), Arc::new(StaticProvisioner::new()));
    gw.create_account("u1").await.unwrap();

    assert_eq!(gw.resolve("u1", Service::Calendar).await.unwrap(), "ca_1");
    assert_eq!(store.confirmed_of("u1").as_deref(), Some("ca_1"));
    assert_eq!(store.pending_of("u1"), None);

    // Later commands in any domain see the confirmed link.
    assert_eq!(gw.resolve("u1", Service::Mail).await.unwrap(), "ca_1");
}

#[tokio::test]
async fn other_domains_do_not_promote() {
    let store = Arc::new(MemoryAccountStore::default());
    let gw = gateway(store.clone(), Arc::new(StaticProvisioner::new()));
    gw.create_account("u1").await.unwrap();

    for service in [Service::Mail, Service::CodeHosting, Service::Messaging, Service::All] {
        let err = gw.resolve("u1", service).await.unwrap_err();
        assert!(matches!(err, AccountError::NoAccount), "{service} should not promote");
    }
    assert_eq!(store.pending_of("u1").as_deref(), Some("ca_1"));
    assert!(!gw.is_linked("u1").await.unwrap());
}

#[tokio::test]
async fn unknown_owner_has_no_account() {
    let gw = gateway(Arc::new(MemoryAccountStore::default()), Arc::new(StaticProvisioner::new()));
    let err = gw.resolve("ghost", Service::Calendar).await.unwrap_err();
    assert!(matches!(err, AccountError::NoAccount));
    assert_eq!(err.error_code(), "E_ACCOUNT_MISSING");
    assert!(!err.retryable());
}

// =========================================================================
// OwnerLocks
// =========================================================================

#[tokio::test]
async fn same_owner_is_serialized() {
    let locks = Arc::new(OwnerLocks::default());
    let guard = locks.lock("u1").await;

    let waiter = {
        let locks = locks.clone();
        tokio::spawn(async move {
            let _g = locks.lock("u1").await;
        })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!waiter.is_finished());

    drop(guard);
    tokio::time::timeout(Duration::from_secs(1), waiter)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn different_owners_do_not_block() {
    let locks = OwnerLocks::default();
    let _a = locks.lock("u1").await;
    tokio::time::timeout(Duration::from_millis(100), locks.lock("u2"))
        .await
        .unwrap();
}

#[tokio::test]
async fn idle_slots_are_pruned() {
    let locks = OwnerLocks::default();
    drop(locks.lock("u1").await);
    drop(locks.lock("u2").await);
    let _held = locks.lock("u3").await;
    assert_eq!(locks.tracked(), 1);
}
