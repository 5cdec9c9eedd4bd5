use dashmap::DashMap;
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::CacheStats;

/// Global registry for cache statistics, indexed by cache name.
///
/// Named caches register their counters here so they can be queried without
/// holding a reference to the cache itself.
///
/// # Examples
///
/// ```
/// use reqcache_core::{stats_registry, CacheStats};
/// use std::sync::Arc;
///
/// let stats = Arc::new(CacheStats::new());
/// stats_registry::register("users-api", Arc::clone(&stats));
///
/// stats.record_hit();
/// assert_eq!(stats_registry::get("users-api").map(|s| s.hits()), Some(1));
/// # stats_registry::unregister("users-api");
/// ```
static STATS_REGISTRY: Lazy<DashMap<String, Arc<CacheStats>>> = Lazy::new(DashMap::new);

/// Registers `stats` under `name`, replacing any previous registration.
///
/// Returns the counters that were registered under `name` before, if any.
pub fn register(name: &str, stats: Arc<CacheStats>) -> Option<Arc<CacheStats>> {
    tracing::debug!(cache = name, "registering cache statistics");
    let previous = STATS_REGISTRY.insert(name.to_string(), stats);
    if previous.is_some() {
        tracing::warn!(cache = name, "cache name already registered, replacing its statistics");
    }
    previous
}

/// Returns a snapshot of the statistics registered under `name`.
pub fn get(name: &str) -> Option<CacheStats> {
    STATS_REGISTRY.get(name).map(|entry| (**entry.value()).clone())
}

/// Returns the live counters registered under `name`.
pub fn get_shared(name: &str) -> Option<Arc<CacheStats>> {
    STATS_REGISTRY.get(name).map(|entry| Arc::clone(entry.value()))
}

/// Lists all registered cache names.
pub fn list() -> Vec<String> {
    STATS_REGISTRY.iter().map(|entry| entry.key().clone()).collect()
}

/// Removes the registration for `name`. Returns `true` if it existed.
pub fn unregister(name: &str) -> bool {
    STATS_REGISTRY.remove(name).is_some()
}

/// Removes every registration. The counters themselves are left untouched.
pub fn clear() {
    STATS_REGISTRY.clear();
}
