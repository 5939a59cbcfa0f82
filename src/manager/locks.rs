use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

/// One async mutex per repository ID, created on first use.
///
/// Mutations of the same repository are serialised, so two concurrent
/// read-modify-write cycles of its htpasswd file cannot lose an update.
/// An entry lives only while a task holds or waits for it.
#[derive(Default)]
pub struct RepoLocks {
    locks: Mutex<LockMap>,
}

/// Releases the repository lock on drop, and forgets the repository when
/// nobody else is waiting for it.
pub struct RepoLockGuard<'a> {
    locks: &'a RepoLocks,
    repo_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RepoLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, repo_id: &str) -> RepoLockGuard<'_> {
        let lock = Arc::clone(self.map().entry(repo_id.to_string()).or_default());
        RepoLockGuard {
            locks: self,
            repo_id: repo_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    fn map(&self) -> MutexGuard<'_, LockMap> {
        self.locks.lock().unwrap_or_else(|e| e.into_inner())
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.map().len()
    }
}

impl Drop for RepoLockGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Clones are only handed out under the map lock, so a count of one
        // means the map holds the last reference.
        let mut locks = self.locks.map();
        if locks
            .get(&self.repo_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.repo_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_same_id_is_exclusive() {
        let locks = Arc::new(RepoLocks::new());
        let guard = locks.lock("1234").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("1234").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_different_ids_do_not_block() {
        let locks = RepoLocks::new();
        let _first = locks.lock("1234").await;
        let _second = tokio::time::timeout(Duration::from_secs(1), locks.lock("5678"))
            .await
            .expect("locking another repository should not block");
    }

    #[tokio::test]
    async fn test_released_locks_are_forgotten() {
        let locks = RepoLocks::new();
        for i in 0..5000 {
            let _guard = locks.lock(&format!("repo-{i}")).await;
        }
        assert_eq!(locks.len(), 0);
    }

    #[tokio::test]
    async fn test_entry_kept_while_someone_waits() {
        let locks = Arc::new(RepoLocks::new());
        let first = locks.lock("1234").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.lock("1234").await;
                tokio::time::sleep(Duration::from_millis(20)).await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(locks.len(), 1, "the waiting task still needs the entry");

        waiter.await.unwrap();
        assert_eq!(locks.len(), 0);
    }
}
