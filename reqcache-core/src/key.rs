use std::fmt;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

/// Identifier of a cached entry.
///
/// A `Key` pairs a precomputed hash with the instant the originating request
/// was created. Equality and hashing look at the hash **only**: two keys with
/// the same hash address the same cache slot, whatever their timestamps.
///
/// The timestamp is what TTL pruning compares against, so an entry ages from
/// the moment its request was built, not from the moment it was stored.
///
/// # Examples
///
/// ```
/// use reqcache_core::Key;
/// use std::time::Instant;
///
/// let now = Instant::now();
/// let a = Key::new(42, now);
/// let b = Key::new(42, now + std::time::Duration::from_secs(5));
///
/// // Same hash, same slot
/// assert_eq!(a, b);
/// assert_ne!(a, Key::new(43, now));
/// ```
#[derive(Clone, Copy)]
pub struct Key {
    hash: u64,
    time: Instant,
}

impl Key {
    /// Creates a key from a precomputed hash and the request creation instant.
    pub fn new(hash: u64, time: Instant) -> Self {
        Self { hash, time }
    }

    /// Returns the hash that identifies the slot.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Returns the creation instant of the originating request.
    pub fn time(&self) -> Instant {
        self.time
    }

    /// Returns `true` if the key is more than `ttl` behind `now`.
    ///
    /// Age is measured in whole milliseconds, so a key exactly `ttl` old is
    /// still alive. A key stamped after `now` has an age of zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use reqcache_core::Key;
    /// use std::time::{Duration, Instant};
    ///
    /// let created = Instant::now();
    /// let key = Key::new(1, created);
    ///
    /// let later = created + Duration::from_millis(100);
    /// assert!(key.is_expired(later, Duration::from_millis(50)));
    /// assert!(!key.is_expired(later, Duration::from_millis(100)));
    /// ```
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.time).as_millis() > ttl.as_millis()
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("age", &self.time.elapsed())
            .finish()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.hash)
    }
}
