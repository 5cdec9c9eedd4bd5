use std::any::Any;
use std::collections::{HashMap, VecDeque};
use std::convert::Infallible;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
#[cfg(feature = "stats")]
use std::sync::Arc;

use crate::{Cache, Key};
#[cfg(feature = "stats")]
use crate::CacheStats;

type Slot = Box<dyn Any + Send + Sync>;

/// Entries plus the order they were inserted in.
///
/// `order` holds exactly the keys of `entries`; every mutation below keeps
/// the two in step.
#[derive(Default)]
struct Store {
    entries: HashMap<Key, Slot>,
    order: VecDeque<Key>,
}

/// The default [`Cache`]: bounded by entry count, optionally pruned by age.
///
/// # Eviction
///
/// Eviction is FIFO by insertion. When an insertion pushes the store above
/// `max_size`, the oldest inserted entry is dropped. Reading an entry never
/// moves it, so a hot entry is evicted just as early as a cold one.
///
/// # Expiry
///
/// With a TTL configured, every `get`/`get_async` first sweeps the whole
/// store and drops each entry whose key is more than `ttl` older than the
/// current instant. The age of an entry is taken from [`Key::time`], i.e.
/// the creation instant of the request that produced it. The sweep is O(n)
/// in the number of entries, which `max_size` bounds.
///
/// # Thread Safety
///
/// One `parking_lot::Mutex` guards the whole store, and it stays held while
/// the fetch function of a miss runs. Two callers for the same key can
/// therefore never both fetch: the second one waits and then finds the
/// entry. The price is that a slow fetch for one key stalls lookups for all
/// other keys.
///
/// The fetch function must not call back into the same cache; the mutex is
/// not reentrant and doing so deadlocks.
///
/// # Examples
///
/// ```
/// use reqcache_core::{BoundedCache, Cache, Key};
/// use std::convert::Infallible;
/// use std::time::Instant;
///
/// let cache = BoundedCache::new(2, 0);
/// let now = Instant::now();
///
/// let first: Result<String, Infallible> = cache.get(Key::new(1, now), || Ok("one".to_string()));
/// assert_eq!(first.unwrap(), "one");
///
/// // Cached: the fetch function is not called again
/// let again: Result<String, Infallible> = cache.get(Key::new(1, now), || unreachable!());
/// assert_eq!(again.unwrap(), "one");
///
/// cache.get::<u32, Infallible, _>(Key::new(2, now), || Ok(2)).unwrap();
/// cache.get::<u32, Infallible, _>(Key::new(3, now), || Ok(3)).unwrap();
///
/// // Capacity 2: the first key was inserted earliest and is gone
/// assert!(!cache.contains(&Key::new(1, now)));
/// assert_eq!(cache.len(), 2);
/// ```
pub struct BoundedCache {
    store: Mutex<Store>,
    max_size: usize,
    ttl: Option<Duration>,
    #[cfg(feature = "stats")]
    stats: Arc<CacheStats>,
}

impl BoundedCache {
    /// Creates a cache holding at most `max_size` entries.
    ///
    /// `ttl_millis` is the maximum entry age in milliseconds; `0` disables
    /// expiry.
    pub fn new(max_size: usize, ttl_millis: u64) -> Self {
        let ttl = (ttl_millis > 0).then(|| Duration::from_millis(ttl_millis));
        Self::with_ttl(max_size, ttl)
    }

    /// Creates a cache holding at most `max_size` entries, expiring entries
    /// older than `ttl` when set.
    pub fn with_ttl(max_size: usize, ttl: Option<Duration>) -> Self {
        Self {
            store: Mutex::new(Store::default()),
            max_size,
            ttl: ttl.filter(|ttl| !ttl.is_zero()),
            #[cfg(feature = "stats")]
            stats: Arc::new(CacheStats::new()),
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// Returns `true` if an entry is stored under `key`.
    ///
    /// This is a plain lookup: it does not prune expired entries and is not
    /// counted as a hit or miss.
    pub fn contains(&self, key: &Key) -> bool {
        self.store.lock().entries.contains_key(key)
    }

    /// Returns the stored keys, oldest insertion first.
    pub fn keys(&self) -> Vec<Key> {
        self.store.lock().order.iter().copied().collect()
    }

    /// Returns the counters for this cache.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &Arc<CacheStats> {
        &self.stats
    }

    /// Check-then-populate under the store lock.
    fn compute_if_absent<T, E, F>(&self, key: Key, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        let mut store = self.store.lock();
        self.clear_old(&mut store);

        if let Some(slot) = store.entries.get(&key) {
            if let Some(value) = slot.downcast_ref::<T>() {
                tracing::trace!(%key, "cache hit");
                #[cfg(feature = "stats")]
                self.stats.record_hit();
                return Ok(value.clone());
            }
            tracing::warn!(
                %key,
                expected = std::any::type_name::<T>(),
                "cached value has a different type, refetching"
            );
        }

        tracing::debug!(%key, "cache miss");
        #[cfg(feature = "stats")]
        self.stats.record_miss();

        let value = fetch()?;
        self.insert(&mut store, key, Box::new(value.clone()));
        Ok(value)
    }

    fn insert(&self, store: &mut Store, key: Key, slot: Slot) {
        // Replacing a mistyped slot keeps its insertion position but takes the
        // new key, so the entry ages from the request that produced it.
        if store.entries.remove(&key).is_some() {
            store.entries.insert(key, slot);
            if let Some(position) = store.order.iter_mut().find(|k| **k == key) {
                *position = key;
            }
            return;
        }

        store.entries.insert(key, slot);
        store.order.push_back(key);

        let mut evicted = 0u64;
        while store.entries.len() > self.max_size {
            let Some(oldest) = store.order.pop_front() else {
                break;
            };
            if store.entries.remove(&oldest).is_some() {
                tracing::debug!(key = %oldest, "evicted oldest entry");
                evicted += 1;
            }
        }

        #[cfg(feature = "stats")]
        if evicted > 0 {
            self.stats.record_evictions(evicted);
        }
        #[cfg(not(feature = "stats"))]
        let _ = evicted;
    }

    fn detach(store: &mut Store, key: &Key) -> bool {
        if store.entries.remove(key).is_none() {
            return false;
        }
        store.order.retain(|k| k != key);
        true
    }

    /// Drops every entry older than the TTL. No-op without a TTL.
    fn clear_old(&self, store: &mut Store) {
        let Some(ttl) = self.ttl else {
            return;
        };

        let now = Instant::now();
        let before = store.entries.len();
        store.entries.retain(|key, _| !key.is_expired(now, ttl));

        let expired = before - store.entries.len();
        if expired == 0 {
            return;
        }

        let Store { entries, order } = store;
        order.retain(|key| entries.contains_key(key));

        tracing::debug!(expired, ttl_ms = ttl.as_millis() as u64, "pruned expired entries");
        #[cfg(feature = "stats")]
        self.stats.record_expirations(expired as u64);
    }
}

impl Cache for BoundedCache {
    fn get<T, E, F>(&self, key: Key, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        self.compute_if_absent(key, fetch)
    }

    fn get_async<T, F>(&self, key: Key, fetch: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        match self.compute_if_absent(key, || Ok::<T, Infallible>(fetch())) {
            Ok(handle) => handle,
            Err(never) => match never {},
        }
    }

    fn remove(&self, key: &Key) -> bool {
        let mut store = self.store.lock();
        Self::detach(&mut store, key)
    }

    fn remove_if<T, P>(&self, key: &Key, predicate: P) -> bool
    where
        T: 'static,
        P: FnOnce(&T) -> bool,
    {
        let mut store = self.store.lock();
        let matches = store
            .entries
            .get(key)
            .and_then(|slot| slot.downcast_ref::<T>())
            .map_or(false, predicate);

        matches && Self::detach(&mut store, key)
    }

    fn clear(&self) {
        let mut store = self.store.lock();
        store.entries.clear();
        store.order.clear();
    }

    fn len(&self) -> usize {
        self.store.lock().entries.len()
    }
}

impl fmt::Debug for BoundedCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundedCache")
            .field("len", &self.len())
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn fetch_ok<T>(value: T) -> impl FnOnce() -> Result<T, Infallible> {
        move || Ok(value)
    }

    fn past(millis: u64) -> Instant {
        let now = Instant::now();
        now.checked_sub(Duration::from_millis(millis)).unwrap_or(now)
    }

    #[test]
    fn test_miss_then_hit() {
        let cache = BoundedCache::new(10, 0);
        let calls = AtomicUsize::new(0);
        let key = Key::new(1, Instant::now());

        for _ in 0..3 {
            let value: Result<u32, Infallible> = cache.get(key, || {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(42)
            });
            assert_eq!(value.unwrap(), 42);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_error_is_not_stored() {
        let cache = BoundedCache::new(10, 0);
        let key = Key::new(1, Instant::now());

        let failed: Result<u32, &str> = cache.get(key, || Err("boom"));
        assert_eq!(failed, Err("boom"));
        assert!(cache.is_empty());

        let recovered: Result<u32, &str> = cache.get(key, || Ok(7));
        assert_eq!(recovered, Ok(7));
        assert!(cache.contains(&key));
    }

    #[test]
    fn test_capacity_evicts_oldest_inserted() {
        let cache = BoundedCache::new(3, 0);
        let now = Instant::now();

        for i in 0..5u64 {
            cache.get(Key::new(i, now), fetch_ok(i)).unwrap();
        }

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains(&Key::new(0, now)));
        assert!(!cache.contains(&Key::new(1, now)));
        let hashes: Vec<u64> = cache.keys().iter().map(Key::hash).collect();
        assert_eq!(hashes, vec![2, 3, 4]);
    }

    #[test]
    fn test_reads_do_not_protect_from_eviction() {
        let cache = BoundedCache::new(2, 0);
        let now = Instant::now();

        cache.get(Key::new(1, now), fetch_ok(1u8)).unwrap();
        cache.get(Key::new(2, now), fetch_ok(2u8)).unwrap();

        // Hammer the oldest entry; FIFO ignores it
        for _ in 0..10 {
            cache.get(Key::new(1, now), fetch_ok(0u8)).unwrap();
        }

        cache.get(Key::new(3, now), fetch_ok(3u8)).unwrap();

        assert!(!cache.contains(&Key::new(1, now)));
        assert!(cache.contains(&Key::new(2, now)));
        assert!(cache.contains(&Key::new(3, now)));
    }

    #[test]
    fn test_zero_capacity_stores_nothing() {
        let cache = BoundedCache::new(0, 0);
        let value = cache.get(Key::new(1, Instant::now()), fetch_ok("x")).unwrap();
        assert_eq!(value, "x");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_ttl_prunes_on_next_access() {
        let cache = BoundedCache::new(10, 50);

        let stale = Key::new(1, past(100));
        cache.get(stale, fetch_ok(1u32)).unwrap();
        // The insert happened after the sweep, so the stale entry is present
        assert!(cache.contains(&stale));

        cache.get(Key::new(2, Instant::now()), fetch_ok(2u32)).unwrap();

        assert!(!cache.contains(&stale));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.keys().len(), 1);
    }

    #[test]
    fn test_ttl_keeps_fresh_entries() {
        let cache = BoundedCache::new(10, 60_000);
        let key = Key::new(1, Instant::now());

        cache.get(key, fetch_ok(1u32)).unwrap();
        cache.get(Key::new(2, Instant::now()), fetch_ok(2u32)).unwrap();

        assert!(cache.contains(&key));
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let cache = BoundedCache::new(10, 0);
        assert_eq!(cache.ttl(), None);

        let ancient = Key::new(1, past(10_000));
        cache.get(ancient, fetch_ok(1u32)).unwrap();
        cache.get(Key::new(2, Instant::now()), fetch_ok(2u32)).unwrap();

        assert!(cache.contains(&ancient));
    }

    #[test]
    fn test_get_async_stores_handle() {
        let cache = BoundedCache::new(10, 0);
        let key = Key::new(1, Instant::now());

        let first = cache.get_async(key, || Arc::new(5u32));
        let second = cache.get_async(key, || Arc::new(6u32));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*second, 5);
    }

    #[test]
    fn test_type_mismatch_refetches_in_place() {
        let cache = BoundedCache::new(10, 0);
        let now = Instant::now();

        cache.get(Key::new(1, now), fetch_ok(1u32)).unwrap();
        cache.get(Key::new(2, now), fetch_ok(2u32)).unwrap();

        let text = cache.get(Key::new(1, now), fetch_ok("one")).unwrap();
        assert_eq!(text, "one");

        // Slot 1 still comes first in insertion order
        let hashes: Vec<u64> = cache.keys().iter().map(Key::hash).collect();
        assert_eq!(hashes, vec![1, 2]);
        assert_eq!(cache.get(Key::new(1, now), fetch_ok("other")).unwrap(), "one");
    }

    #[test]
    fn test_type_mismatch_takes_the_new_key_time() {
        let cache = BoundedCache::new(10, 0);
        let older = past(5_000);
        let newer = Instant::now();

        cache.get(Key::new(1, older), fetch_ok(1u32)).unwrap();
        cache.get(Key::new(1, newer), fetch_ok("one")).unwrap();

        let keys = cache.keys();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0].time(), newer);
    }

    #[test]
    fn test_remove_if_checks_the_stored_value() {
        let cache = BoundedCache::new(10, 0);
        let now = Instant::now();
        let stored = Arc::new(1u32);

        cache.get_async(Key::new(1, now), || Arc::clone(&stored));
        cache.get(Key::new(2, now), fetch_ok(2u8)).unwrap();

        // Another handle, or another type, leaves the entry alone
        let other = Arc::new(1u32);
        assert!(!cache.remove_if(&Key::new(1, now), |v: &Arc<u32>| Arc::ptr_eq(v, &other)));
        assert!(!cache.remove_if(&Key::new(1, now), |_: &String| true));
        assert!(!cache.remove_if(&Key::new(3, now), |_: &Arc<u32>| true));
        assert_eq!(cache.len(), 2);

        assert!(cache.remove_if(&Key::new(1, now), |v: &Arc<u32>| Arc::ptr_eq(v, &stored)));
        let hashes: Vec<u64> = cache.keys().iter().map(Key::hash).collect();
        assert_eq!(hashes, vec![2]);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = BoundedCache::new(10, 0);
        let now = Instant::now();

        cache.get(Key::new(1, now), fetch_ok(1u8)).unwrap();
        cache.get(Key::new(2, now), fetch_ok(2u8)).unwrap();

        assert!(cache.remove(&Key::new(1, now)));
        assert!(!cache.remove(&Key::new(1, now)));
        assert_eq!(cache.keys().len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.keys().is_empty());
    }

    #[test]
    fn test_concurrent_callers_fetch_once() {
        let cache = Arc::new(BoundedCache::new(10, 0));
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));
        let key = Key::new(99, Instant::now());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                let calls = Arc::clone(&calls);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get(key, || {
                            calls.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok::<_, Infallible>(String::from("shared"))
                        })
                        .unwrap()
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), "shared");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[cfg(feature = "stats")]
    #[test]
    fn test_stats_are_recorded() {
        let cache = BoundedCache::new(1, 50);
        let now = Instant::now();

        cache.get(Key::new(1, now), fetch_ok(1u8)).unwrap();
        cache.get(Key::new(1, now), fetch_ok(1u8)).unwrap();
        cache.get(Key::new(2, now), fetch_ok(2u8)).unwrap();
        cache.get(Key::new(3, past(200)), fetch_ok(3u8)).unwrap();
        cache.get(Key::new(4, now), fetch_ok(4u8)).unwrap();

        let stats = cache.stats();
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 4);
        assert_eq!(stats.evictions(), 2);
        assert_eq!(stats.expirations(), 1);
    }
}
