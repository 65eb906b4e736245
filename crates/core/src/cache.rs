//! Time-bounded memoization for library operations.
//!
//! Entries live for a fixed TTL measured from the moment their value was
//! computed. There is no capacity bound; an expired entry is replaced the
//! next time its key is requested. Callers racing on a missing key share a
//! single computation.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OnceCell};
use tokio::time::Instant;
use tracing::debug;

use crate::metrics::CACHE_LOOKUPS;

type Slot<V> = Arc<OnceCell<(Instant, V)>>;

pub struct TtlCache<K, V> {
    name: &'static str,
    ttl: Duration,
    entries: Mutex<HashMap<K, Slot<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    /// `name` labels log lines and metrics.
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the live value for `key`, or run `compute` and store its result.
    ///
    /// On a hit `compute` is not called at all. Errors are handed back to
    /// the caller and never stored, so the next request for `key` computes
    /// again.
    pub async fn get_or_try_compute<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(&key).await;
        let result = slot
            .get_or_try_init(|| async { compute().await.map(|value| (Instant::now(), value)) })
            .await;

        match result {
            Ok((_, value)) => Ok(value.clone()),
            Err(e) => {
                self.discard(&key, &slot).await;
                Err(e)
            }
        }
    }

    /// Drop the slot for `key` if it is still `slot` and holds no value.
    async fn discard(&self, key: &K, slot: &Slot<V>) {
        let mut entries = self.entries.lock().await;
        let failed = entries
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, slot) && !current.initialized());
        if failed {
            debug!("{} computation failed for {:?}, not cached", self.name, key);
            entries.remove(key);
        }
    }

    /// Find the slot for `key`, replacing it when its value has expired.
    async fn slot(&self, key: &K) -> Slot<V> {
        let mut entries = self.entries.lock().await;

        if let Some(slot) = entries.get(key) {
            let live = match slot.get() {
                Some((computed_at, _)) => computed_at.elapsed() < self.ttl,
                // still being computed by another caller
                None => true,
            };
            if live {
                debug!("{} cache hit for {:?}", self.name, key);
                CACHE_LOOKUPS.with_label_values(&[self.name, "hit"]).inc();
                return slot.clone();
            }
        }

        debug!("{} cache miss for {:?}", self.name, key);
        CACHE_LOOKUPS.with_label_values(&[self.name, "miss"]).inc();
        let slot: Slot<V> = Arc::new(OnceCell::new());
        entries.insert(key.clone(), slot.clone());
        slot
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}
