use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Settings for a [`CacheManager`](crate::CacheManager) and its default
/// [`BoundedCache`](crate::BoundedCache).
///
/// # Examples
///
/// ```
/// use reqcache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig::new()
///     .with_max_size(500)
///     .with_ttl(Duration::from_secs(30))
///     .with_cache_failures(false)
///     .with_name("catalog-api");
///
/// assert_eq!(config.max_size, 500);
/// assert_eq!(config.ttl, Some(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CacheConfig {
    /// Maximum number of stored entries.
    pub max_size: usize,
    /// Maximum entry age, counted from request creation. `None` disables expiry.
    #[cfg_attr(feature = "serde", serde(rename = "ttl_millis", with = "ttl_millis"))]
    pub ttl: Option<Duration>,
    /// Keep async responses that resolve to an error cached like successful ones.
    pub cache_failures: bool,
    /// Name under which the cache statistics are registered.
    pub name: Option<String>,
}

impl CacheConfig {
    pub const DEFAULT_MAX_SIZE: usize = 100;

    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a config from a depth and a TTL in milliseconds, `0` meaning
    /// no expiry.
    pub fn from_millis(max_size: usize, ttl_millis: u64) -> Self {
        Self {
            max_size,
            ttl: (ttl_millis > 0).then(|| Duration::from_millis(ttl_millis)),
            ..Self::default()
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = (!ttl.is_zero()).then_some(ttl);
        self
    }

    pub fn without_ttl(mut self) -> Self {
        self.ttl = None;
        self
    }

    pub fn with_cache_failures(mut self, cache_failures: bool) -> Self {
        self.cache_failures = cache_failures;
        self
    }

    /// Registers the cache statistics under `name`. A later manager built
    /// with the same name takes over the registration.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: Self::DEFAULT_MAX_SIZE,
            ttl: None,
            cache_failures: true,
            name: None,
        }
    }
}

#[cfg(feature = "serde")]
mod ttl_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(ttl: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = ttl.map(|ttl| ttl.as_millis() as u64).unwrap_or(0);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok((millis > 0).then(|| Duration::from_millis(millis)))
    }
}
