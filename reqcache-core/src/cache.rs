use crate::Key;

/// Storage contract behind the caching decorators.
///
/// A `Cache` maps [`Key`]s to previously computed values and guarantees that,
/// while a valid entry exists for a key, the fetch function for that key runs
/// at most once, even when several threads ask for it at the same time.
///
/// Values are stored type-erased and handed back by clone, so the same cache
/// can hold responses with different body types side by side.
///
/// # Implementing
///
/// [`BoundedCache`](crate::BoundedCache) is the default implementation. A
/// custom implementation must keep the check-then-populate step atomic per
/// key; anything else (eviction, expiry, sharding) is up to it.
pub trait Cache: Send + Sync + 'static {
    /// Returns the value cached under `key`, or runs `fetch` and caches its
    /// `Ok` value.
    ///
    /// An `Err` from `fetch` is returned to the caller and nothing is stored,
    /// so the next call for the same key fetches again.
    fn get<T, E, F>(&self, key: Key, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<T, E>;

    /// Returns the handle cached under `key`, or obtains one from `fetch` and
    /// caches it.
    ///
    /// The handle is stored as-is: for a shared future this means the pending
    /// computation is cached, not its eventual output, and every caller for
    /// the key receives a clone of the same future.
    fn get_async<T, F>(&self, key: Key, fetch: F) -> T
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T;

    /// Drops the entry stored under `key`. Returns `true` if one was present.
    fn remove(&self, key: &Key) -> bool;

    /// Drops the entry stored under `key` only if it holds a `T` accepted by
    /// `predicate`. Returns `true` if the entry was dropped.
    ///
    /// The check and the removal happen atomically, so a value stored under
    /// the same key after the caller looked is never dropped by mistake.
    fn remove_if<T, P>(&self, key: &Key, predicate: P) -> bool
    where
        T: 'static,
        P: FnOnce(&T) -> bool;

    /// Drops every entry.
    fn clear(&self);

    /// Number of entries currently stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
