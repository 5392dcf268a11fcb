//! Per-account serialization of relay requests.
//!
//! Router user nonces are read fresh for every request, so two requests of
//! the same account built concurrently read the same nonce and one of them
//! reverts on-chain. Holding the account's lock from assembly through
//! submission orders them.

use std::sync::Arc;

use alloy::primitives::{Address, ChainId};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async locks keyed by `(chain_id, account)`.
#[derive(Clone, Debug, Default)]
pub struct AccountLocks {
    #[allow(clippy::type_complexity)]
    locks: Arc<DashMap<(ChainId, Address), Arc<Mutex<()>>>>,
}

/// Held lock of one account, released on drop.
#[derive(Debug)]
pub struct AccountGuard {
    _guard: OwnedMutexGuard<()>,
}

impl AccountLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other holder of the account's lock remains.
    pub async fn lock(&self, chain_id: ChainId, account: Address) -> AccountGuard {
        let lock = self.account_lock(chain_id, account);
        AccountGuard {
            _guard: lock.lock_owned().await,
        }
    }

    /// Takes the account's lock if it is free.
    pub fn try_lock(&self, chain_id: ChainId, account: Address) -> Option<AccountGuard> {
        let lock = self.account_lock(chain_id, account);
        lock.try_lock_owned()
            .ok()
            .map(|guard| AccountGuard { _guard: guard })
    }

    fn account_lock(&self, chain_id: ChainId, account: Address) -> Arc<Mutex<()>> {
        // Clone the `Arc` out so the map shard is not held across an await
        let entry = self
            .locks
            .entry((chain_id, account))
            .or_insert_with(|| Arc::new(Mutex::new(())));
        Arc::clone(entry.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[tokio::test]
    async fn test_lock_is_per_chain_and_account() {
        let locks = AccountLocks::new();
        let guard = locks.lock(1, testing::ACCOUNT).await;

        assert!(locks.try_lock(1, testing::ACCOUNT).is_none());
        assert!(locks.try_lock(2, testing::ACCOUNT).is_some());
        assert!(locks.try_lock(1, testing::SUBACCOUNT).is_some());

        drop(guard);
        assert!(locks.try_lock(1, testing::ACCOUNT).is_some());
    }

    #[tokio::test]
    async fn test_clones_share_locks() {
        let locks = AccountLocks::new();
        let other = locks.clone();
        let _guard = locks.lock(1, testing::ACCOUNT).await;
        assert!(other.try_lock(1, testing::ACCOUNT).is_none());
    }
}
