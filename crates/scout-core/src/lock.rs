//! Per-organization advisory locking over the key/value substrate.
//!
//! One key per organization (`manifest_lock:{org_id}`), written with an
//! atomic set-if-absent carrying a random fencing token and a short TTL.
//! Release is a token-checked delete, so a holder whose lock expired and was
//! reacquired by someone else can never delete the new holder's key. The
//! lock is advisory: it coordinates this engine's own operations, nothing at
//! the storage layer enforces it.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::store::LockStore;
use crate::{Error, Result};

/// Prefix of every advisory lock key.
pub const LOCK_KEY_PREFIX: &str = "manifest_lock";

/// Key guarding one organization's discovery and queue operations.
#[must_use]
pub fn lock_key(organization_id: Uuid) -> String {
    format!("{LOCK_KEY_PREFIX}:{organization_id}")
}

/// Evidence of a held lock; pass back to [`LockManager::release`].
#[derive(Debug, Clone)]
pub struct LockGuard {
    organization_id: Uuid,
    key: String,
    token: String,
}

impl LockGuard {
    /// Organization this guard covers.
    #[must_use]
    pub const fn organization_id(&self) -> Uuid {
        self.organization_id
    }

    /// The fencing token stored in the lock key.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Acquires and releases per-organization advisory locks.
pub struct LockManager {
    store: Arc<dyn LockStore>,
    ttl: Duration,
}

impl LockManager {
    #[must_use]
    pub fn new(store: Arc<dyn LockStore>, ttl: Duration) -> Self {
        Self { store, ttl }
    }

    /// Try to take the organization's lock.
    ///
    /// # Errors
    ///
    /// [`Error::Busy`] when another operation holds the key; the caller
    /// should retry later. Substrate failures surface as-is.
    pub async fn acquire(&self, organization_id: Uuid) -> Result<LockGuard> {
        let key = lock_key(organization_id);
        let token = Uuid::new_v4().to_string();

        if self.store.put_if_absent(&key, &token, self.ttl).await? {
            debug!(%organization_id, "advisory lock acquired");
            Ok(LockGuard {
                organization_id,
                key,
                token,
            })
        } else {
            Err(Error::Busy(organization_id))
        }
    }

    /// Release a held lock. Best-effort: an expired or already-stolen key is
    /// logged, never an error, because the TTL is the real backstop and the
    /// protected operation has already finished.
    pub async fn release(&self, guard: &LockGuard) {
        match self
            .store
            .delete_if_matches(&guard.key, &guard.token)
            .await
        {
            Ok(true) => debug!(organization_id = %guard.organization_id, "advisory lock released"),
            Ok(false) => warn!(
                organization_id = %guard.organization_id,
                "advisory lock expired before release"
            ),
            Err(err) => warn!(
                organization_id = %guard.organization_id,
                error = %err,
                "advisory lock release failed"
            ),
        }
    }
}
