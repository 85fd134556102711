use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::HouseId;

type LockMap = DashMap<HouseId, Arc<Mutex<()>>>;

/// One async mutex per house. Operations that read-then-write a house's
/// cultivation state hold the guard for the whole sequence.
///
/// Entries only live while someone holds or waits for them, so ids that were
/// never stored do not accumulate.
#[derive(Clone, Default)]
pub struct HouseLocks {
    inner: Arc<LockMap>,
}

/// Held lock on one house. Releasing it removes the map entry when no other
/// task holds or waits for the same house.
pub struct HouseGuard {
    guard: Option<OwnedMutexGuard<()>>,
    house_id: HouseId,
    map: Arc<LockMap>,
}

impl Drop for HouseGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        // The map's own reference is the last one left when nobody else is queued.
        self.map
            .remove_if(&self.house_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}

impl HouseLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, house_id: HouseId) -> HouseGuard {
        // Clone out of the map first so the shard lock is not held across the await.
        let lock = Arc::clone(self.inner.entry(house_id).or_default().value());
        let guard = lock.lock_owned().await;

        HouseGuard {
            guard: Some(guard),
            house_id,
            map: Arc::clone(&self.inner),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
