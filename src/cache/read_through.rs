//! Generic read-through cache.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::observability::metrics;

/// A thread-safe read-through cache for one key space.
///
/// Each key maps to a slot that is filled at most once. Callers missing on
/// the same key while a computation is running wait for that computation
/// instead of starting their own, so concurrent misses cost one store read.
/// A failed computation leaves the slot empty and the error is returned to
/// every waiter that ran it; the next caller tries again.
///
/// `invalidate` detaches the slot from the map. A computation already in
/// flight still completes into the detached slot and is seen only by the
/// callers already waiting on it; later callers start from a fresh slot.
pub struct ReadThroughCache<K, V> {
    region: &'static str,
    slots: DashMap<K, Arc<OnceCell<V>>>,
}

impl<K, V> ReadThroughCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create an empty cache. `region` labels its metrics and logs.
    pub fn new(region: &'static str) -> Self {
        Self {
            region,
            slots: DashMap::new(),
        }
    }

    pub fn region(&self) -> &'static str {
        self.region
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    pub async fn get_or_try_insert_with<F, Fut, E>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let slot = self.slot(&key);
        if let Some(value) = slot.get() {
            metrics::record_cache_lookup(self.region, true);
            return Ok(value.clone());
        }

        let mut computed = false;
        let result = slot
            .get_or_try_init(|| {
                computed = true;
                compute()
            })
            .await
            .cloned();
        // Waiters that joined an in-flight computation count as hits
        metrics::record_cache_lookup(self.region, !computed);

        if result.is_err() {
            // Drop the empty slot unless someone already replaced it
            self.slots
                .remove_if(&key, |_, current| Arc::ptr_eq(current, &slot) && current.get().is_none());
        }
        result
    }

    /// Cached value for `key`, without computing.
    pub fn get(&self, key: &K) -> Option<V> {
        self.slots.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Store `value` for `key`, replacing any previous slot.
    pub fn put(&self, key: K, value: V) {
        self.slots.insert(key, Arc::new(OnceCell::new_with(Some(value))));
    }

    /// Remove `key`. Returns whether a slot existed.
    pub fn invalidate(&self, key: &K) -> bool {
        let removed = self.slots.remove(key).is_some();
        if removed {
            tracing::debug!(region = self.region, "Cache entry invalidated");
        }
        removed
    }

    /// Number of populated entries.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, key: &K) -> Arc<OnceCell<V>> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(slot.value());
        }
        Arc::clone(self.slots.entry(key.clone()).or_default().value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache: ReadThroughCache<u64, String> = ReadThroughCache::new("test");
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        for _ in 0..3 {
            let value = cache
                .get_or_try_insert_with(1, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>("one".to_string())
                })
                .await
                .unwrap();
            assert_eq!(value, "one");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get(&1).as_deref(), Some("one"));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_recompute() {
        let cache: ReadThroughCache<u64, u32> = ReadThroughCache::new("test");
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let load = || async move {
            Ok::<_, ()>(calls.fetch_add(1, Ordering::SeqCst) as u32)
        };

        assert_eq!(cache.get_or_try_insert_with(1, load).await, Ok(0));
        assert!(cache.invalidate(&1));
        assert!(!cache.invalidate(&1));
        assert_eq!(cache.get_or_try_insert_with(1, load).await, Ok(1));
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache: ReadThroughCache<u64, u32> = ReadThroughCache::new("test");

        let err = cache
            .get_or_try_insert_with(1, || async { Err::<u32, _>("store down") })
            .await;
        assert_eq!(err, Err("store down"));
        assert!(cache.is_empty());
        assert!(cache.get(&1).is_none());

        let ok = cache.get_or_try_insert_with(1, || async { Ok::<_, &str>(5) }).await;
        assert_eq!(ok, Ok(5));
    }

    #[tokio::test]
    async fn test_put_overrides() {
        let cache: ReadThroughCache<&'static str, u32> = ReadThroughCache::new("test");
        cache.put("k", 3);
        let value = cache
            .get_or_try_insert_with("k", || async { Ok::<_, ()>(99) })
            .await
            .unwrap();
        assert_eq!(value, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_compute_once() {
        let cache = Arc::new(ReadThroughCache::<u64, u64>::new("test"));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    cache
                        .get_or_try_insert_with(7, || async move {
                            calls.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(Duration::from_millis(50)).await;
                            Ok::<_, ()>(49)
                        })
                        .await
                })
            })
            .collect();

        for result in futures_util::future::join_all(tasks).await {
            assert_eq!(result.unwrap(), Ok(49));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_are_independent() {
        let cache: ReadThroughCache<u64, u64> = ReadThroughCache::new("test");
        for key in 0..10 {
            let value = cache
                .get_or_try_insert_with(key, || async move { Ok::<_, ()>(key * 2) })
                .await
                .unwrap();
            assert_eq!(value, key * 2);
        }
        assert_eq!(cache.len(), 10);
        cache.invalidate(&3);
        assert_eq!(cache.len(), 9);
        assert_eq!(cache.get(&4), Some(8));
    }
}
