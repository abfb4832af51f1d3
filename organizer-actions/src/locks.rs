use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-record mutual exclusion.
///
/// Operations touching disjoint records run concurrently; operations sharing
/// a record are serialized. Locks are always taken in sorted id order so two
/// multi-record operations cannot deadlock.
#[derive(Clone, Default)]
pub struct RecordLocks {
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

/// Held locks; released on drop.
pub struct RecordGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
    ids: Vec<String>,
}

impl RecordGuard {
    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl RecordLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire<I, S>(&self, ids: I) -> RecordGuard
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();

        let handles: Vec<Arc<Mutex<()>>> = {
            let mut locks = self.locks.lock().await;
            // Nobody else holds or waits on a lock whose only owner is the map.
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            ids.iter()
                .map(|id| locks.entry(id.clone()).or_default().clone())
                .collect()
        };

        let mut guards = Vec::with_capacity(handles.len());
        for handle in handles {
            guards.push(handle.lock_owned().await);
        }

        RecordGuard {
            _guards: guards,
            ids,
        }
    }

    #[cfg(test)]
    async fn tracked(&self) -> usize {
        self.locks.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_ids_sorted_and_deduplicated() {
        let locks = RecordLocks::new();
        let guard = locks.acquire(["b", "a", "b"]).await;
        assert_eq!(guard.ids(), ["a", "b"]);
    }

    #[tokio::test]
    async fn test_shared_record_is_serialized() {
        let locks = RecordLocks::new();
        let guard = locks.acquire(["a"]).await;

        let contender = locks.clone();
        let waiting = tokio::spawn(async move {
            let _guard = contender.acquire(["b", "a"]).await;
        });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiting.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiting)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_disjoint_records_do_not_block() {
        let locks = RecordLocks::new();
        let _a = locks.acquire(["a"]).await;
        let b = tokio::time::timeout(Duration::from_secs(1), locks.acquire(["b"])).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn test_released_locks_are_pruned() {
        let locks = RecordLocks::new();
        drop(locks.acquire(["a", "b"]).await);
        drop(locks.acquire(["c"]).await);
        assert_eq!(locks.tracked().await, 1);
    }
}
