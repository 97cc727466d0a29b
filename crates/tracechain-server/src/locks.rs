use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracechain_core::ShipmentId;

/// Per-shipment async mutexes.
///
/// Requests for the same [`ShipmentId::key`] run one at a time; requests for
/// different shipments do not wait on each other. An entry lives only while
/// some request holds or waits for it.
#[derive(Debug, Default)]
pub struct ShipmentLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
}

/// Held lock for one shipment. Releases on drop.
#[derive(Debug)]
pub struct ShipmentGuard<'a> {
    locks: &'a ShipmentLocks,
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ShipmentLocks {
    /// Creates an empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until the shipment's lock is free and takes it.
    pub async fn lock(&self, shipment_id: &ShipmentId) -> ShipmentGuard<'_> {
        let key = shipment_id.key();
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        // Built before waiting so a cancelled wait still cleans up the entry.
        // `acquire` is declared later and therefore dropped first, releasing
        // its reference before the guard's drop checks the count.
        let mut held = ShipmentGuard {
            locks: self,
            key,
            guard: None,
        };
        let acquire = mutex.lock_owned();
        held.guard = Some(acquire.await);
        held
    }

    /// Number of shipments with a live lock entry.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    /// Returns `true` if no lock entry is live.
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl Drop for ShipmentGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table's own reference left: nobody holds or waits.
        self.locks
            .locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn entries_are_removed_after_release() {
        let locks = ShipmentLocks::new();
        {
            let _a = locks.lock(&ShipmentId::Number(1)).await;
            let _b = locks.lock(&ShipmentId::Number(2)).await;
            assert_eq!(locks.len(), 2);
        }
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn same_key_is_serialized() {
        let locks = Arc::new(ShipmentLocks::new());
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let locks = Arc::clone(&locks);
            let active = Arc::clone(&active);
            let max_seen = Arc::clone(&max_seen);
            // 7 and "7" share a key.
            let id = if i % 2 == 0 {
                ShipmentId::Number(7)
            } else {
                ShipmentId::Text("7".into())
            };
            tasks.push(tokio::spawn(async move {
                let _guard = locks.lock(&id).await;
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(2)).await;
                active.fetch_sub(1, Ordering::SeqCst);
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
        assert!(locks.is_empty());
    }

    #[tokio::test]
    async fn cancelled_wait_removes_entry() {
        let locks = ShipmentLocks::new();
        let id = ShipmentId::Number(3);

        let holder = locks.lock(&id).await;
        let mut waiter = Box::pin(locks.lock(&id));
        assert!(tokio::time::timeout(Duration::from_millis(10), &mut waiter)
            .await
            .is_err());

        // The waiter still references the entry.
        drop(holder);
        assert_eq!(locks.len(), 1);

        drop(waiter);
        assert!(locks.is_empty());
    }
}
