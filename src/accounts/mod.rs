//! Account gateway - links chat users to backend connections.
//!
//! DESIGN
//! ======
//! Each owner has at most one confirmed link and at most one pending link.
//! `create_account` provisions a connection and stores it as pending;
//! `reauthenticate` swaps the connection id on the confirmed link; the
//! first calendar command promotes a pending link to confirmed. Other
//! domains never promote, they only see confirmed links.
//!
//! CONCURRENCY
//! ===========
//! Every read-modify-write for an owner runs under that owner's async lock
//! from [`OwnerLocks`]. Different owners never wait on each other.

pub mod store;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OwnedMutexGuard;
use tracing::info;

use crate::dispatch::Service;
use crate::remote::{AccountProvisioner, RemoteError};
pub use store::PgAccountStore;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountLink {
    pub owner_id: String,
    pub connection_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("account already linked")]
    AlreadyLinked,
    #[error("no linked account")]
    NoAccount,
    #[error("provisioning failed: {0}")]
    Provision(#[from] RemoteError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl crate::error::ErrorCode for AccountError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyLinked => "E_ACCOUNT_ALREADY_LINKED",
            Self::NoAccount => "E_ACCOUNT_MISSING",
            Self::Provision(_) => "E_ACCOUNT_PROVISION",
            Self::Database(_) => "E_DATABASE",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Provision(e) => e.retryable(),
            Self::Database(_) => true,
            Self::AlreadyLinked | Self::NoAccount => false,
        }
    }
}

// =============================================================================
// STORE
// =============================================================================

/// Persistence for confirmed and pending links, keyed by owner.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync {
    async fn confirmed(&self, owner_id: &str) -> Result<Option<AccountLink>, sqlx::Error>;

    async fn pending(&self, owner_id: &str) -> Result<Option<AccountLink>, sqlx::Error>;

    /// Insert or replace the owner's pending link.
    async fn upsert_pending(&self, link: &AccountLink) -> Result<(), sqlx::Error>;

    /// Swap the connection id on a confirmed link. Returns `false` when the
    /// owner has no confirmed link.
    async fn replace_connection(&self, owner_id: &str, connection_id: &str) -> Result<bool, sqlx::Error>;

    /// Move the pending link to confirmed and delete it from pending, as one
    /// unit. Returns the confirmed link, or `None` when nothing was pending.
    async fn promote_pending(&self, owner_id: &str) -> Result<Option<AccountLink>, sqlx::Error>;
}

// =============================================================================
// OWNER LOCKS
// =============================================================================

/// One async mutex per owner, created on demand and dropped once unused.
#[derive(Default)]
pub struct OwnerLocks {
    slots: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl OwnerLocks {
    pub async fn lock(&self, owner_id: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(owner_id.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

// =============================================================================
// GATEWAY
// =============================================================================

pub struct Gateway {
    store: Arc<dyn AccountStore>,
    provisioner: Arc<dyn AccountProvisioner>,
    locks: OwnerLocks,
}

impl Gateway {
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>, provisioner: Arc<dyn AccountProvisioner>) -> Self {
        Self { store, provisioner, locks: OwnerLocks::default() }
    }

    /// Provision a connection and park it as the owner's pending link.
    /// Returns the URL the user must visit to authorize it.
    ///
    /// # Errors
    ///
    /// [`AccountError::AlreadyLinked`] when a confirmed link exists; otherwise
    /// provisioning or store failures.
    pub async fn create_account(&self, owner_id: &str) -> Result<String, AccountError> {
        let _guard = self.locks.lock(owner_id).await;
        if self.store.confirmed(owner_id).await?.is_some() {
            return Err(AccountError::AlreadyLinked);
        }

        if self.store.pending(owner_id).await?.is_some() {
            info!(%owner_id, "accounts: replacing earlier pending link");
        }
        let request = self.provisioner.initiate().await?;
        self.store
            .upsert_pending(&AccountLink { owner_id: owner_id.to_string(), connection_id: request.connection_id })
            .await?;

        info!(%owner_id, "accounts: pending link stored");
        Ok(request.redirect_url)
    }

    /// Provision a fresh connection for an owner whose credentials expired.
    ///
    /// # Errors
    ///
    /// [`AccountError::NoAccount`] when there is no confirmed link; otherwise
    /// provisioning or store failures.
    pub async fn reauthenticate(&self, owner_id: &str) -> Result<String, AccountError> {
        let _guard = self.locks.lock(owner_id).await;
        if self.store.confirmed(owner_id).await?.is_none() {
            return Err(AccountError::NoAccount);
        }

        let request = self.provisioner.initiate().await?;
        if !self.store.replace_connection(owner_id, &request.connection_id).await? {
            return Err(AccountError::NoAccount);
        }

        info!(%owner_id, "accounts: connection replaced");
        Ok(request.redirect_url)
    }

    /// Connection id to act with for `service`.
    ///
    /// # Errors
    ///
    /// [`AccountError::NoAccount`] when nothing usable is linked.
    pub async fn resolve(&self, owner_id: &str, service: Service) -> Result<String, AccountError> {
        let _guard = self.locks.lock(owner_id).await;
        if let Some(link) = self.store.confirmed(owner_id).await? {
            return Ok(link.connection_id);
        }

        if service == Service::Calendar {
            if let Some(link) = self.store.promote_pending(owner_id).await? {
                info!(%owner_id, "accounts: pending link promoted");
                return Ok(link.connection_id);
            }
        }

        Err(AccountError::NoAccount)
    }

    /// Whether the owner has a confirmed link. Never promotes.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn is_linked(&self, owner_id: &str) -> Result<bool, AccountError> {
        Ok(self.store.confirmed(owner_id).await?.is_some())
    }
}


#[cfg(test)]
#[path = "accounts_test.rs"]
mod tests;
