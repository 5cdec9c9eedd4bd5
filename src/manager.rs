use std::fmt;
use std::sync::Arc;

use crate::client::{AsyncClient, Client};
use crate::config::CacheConfig;
use crate::decorator::{CachingAsyncClient, CachingClient};
use crate::key_generator::{default_key_generator, KeyGenerator};
use crate::{BoundedCache, Cache};

/// Owns a cache and a key generator, and puts caching decorators in front
/// of transport clients.
///
/// Every decorator produced by one manager shares its cache, so a response
/// stored through one wrapped client is served to any other client wrapped
/// by the same manager when the keys match.
///
/// # Examples
///
/// ```
/// use reqcache::{CacheManager, Client};
/// # use reqcache::{HttpRequest, HttpResponse, ResponseBody, ResponseType, Transformer, TransportError, RawResponse};
/// # struct Transport;
/// # impl Client for Transport {
/// #     type Native = ();
/// #     fn native_client(&self) -> &() { &() }
/// #     fn request_as<T: ResponseBody>(&self, _: &dyn HttpRequest, t: &Transformer<T>, _: ResponseType)
/// #         -> Result<HttpResponse<T>, TransportError> { Ok(t(RawResponse::new(200, "ok"))) }
/// #     fn close(&self) -> Vec<TransportError> { Vec::new() }
/// #     fn register_shutdown_hook(&self) {}
/// # }
///
/// // 2 entries at most, entries older than 30s are pruned
/// let manager = CacheManager::with_depth(2, 30_000, None);
/// let client = manager.wrap(Transport);
/// # let _ = client;
/// ```
pub struct CacheManager<S = BoundedCache> {
    cache: Arc<S>,
    key_generator: Arc<dyn KeyGenerator>,
    cache_failures: bool,
}

impl CacheManager<BoundedCache> {
    /// A manager over a 100-entry [`BoundedCache`] without expiry.
    pub fn new() -> Self {
        Self::from_config(CacheConfig::default())
    }

    /// A manager over a [`BoundedCache`] of `depth` entries whose entries
    /// expire after `ttl_millis` (`0` disables expiry).
    ///
    /// `None` selects the default [`HashKeyGenerator`](crate::HashKeyGenerator).
    pub fn with_depth(
        depth: usize,
        ttl_millis: u64,
        key_generator: Option<Arc<dyn KeyGenerator>>,
    ) -> Self {
        Self::from_config_and_generator(CacheConfig::from_millis(depth, ttl_millis), key_generator)
    }

    pub fn from_config(config: CacheConfig) -> Self {
        Self::from_config_and_generator(config, None)
    }

    /// Builds the [`BoundedCache`] described by `config`. A named config
    /// registers the cache statistics in the global registry.
    pub fn from_config_and_generator(
        config: CacheConfig,
        key_generator: Option<Arc<dyn KeyGenerator>>,
    ) -> Self {
        let cache = BoundedCache::with_ttl(config.max_size, config.ttl);

        #[cfg(feature = "stats")]
        if let Some(name) = &config.name {
            crate::stats_registry::register(name, Arc::clone(cache.stats()));
        }

        tracing::debug!(
            max_size = config.max_size,
            ttl = ?config.ttl,
            cache_failures = config.cache_failures,
            "creating request cache"
        );

        Self::with_cache(cache, key_generator).cache_failures(config.cache_failures)
    }
}

impl<S: Cache> CacheManager<S> {
    /// A manager over a caller-supplied cache.
    ///
    /// `None` selects the default [`HashKeyGenerator`](crate::HashKeyGenerator).
    pub fn with_cache(cache: S, key_generator: Option<Arc<dyn KeyGenerator>>) -> Self {
        Self::with_shared_cache(Arc::new(cache), key_generator)
    }

    /// Like [`with_cache`](Self::with_cache), for a cache already shared elsewhere.
    pub fn with_shared_cache(cache: Arc<S>, key_generator: Option<Arc<dyn KeyGenerator>>) -> Self {
        Self {
            cache,
            key_generator: key_generator.unwrap_or_else(default_key_generator),
            cache_failures: true,
        }
    }

    /// Whether async responses that resolve to an error stay cached.
    /// Defaults to `true`.
    pub fn cache_failures(mut self, cache_failures: bool) -> Self {
        self.cache_failures = cache_failures;
        self
    }

    /// Puts a caching decorator in front of `client`.
    ///
    /// The decorator owns `client`. Wrapping another client later returns a
    /// second decorator over the same entries; requests made through this one
    /// keep going to `client`.
    pub fn wrap<C: Client>(&self, client: C) -> CachingClient<C, S> {
        tracing::debug!(client = std::any::type_name::<C>(), "wrapping client");
        CachingClient::new(client, Arc::clone(&self.cache), Arc::clone(&self.key_generator))
    }

    /// Puts a caching decorator in front of the async `client`.
    ///
    /// As with [`wrap`](Self::wrap), earlier decorators are not redirected.
    pub fn wrap_async<A: AsyncClient>(&self, client: A) -> CachingAsyncClient<A, S> {
        tracing::debug!(client = std::any::type_name::<A>(), "wrapping async client");
        CachingAsyncClient::new(
            client,
            Arc::clone(&self.cache),
            Arc::clone(&self.key_generator),
            self.cache_failures,
        )
    }

    pub fn cache(&self) -> &Arc<S> {
        &self.cache
    }

    pub fn key_generator(&self) -> &Arc<dyn KeyGenerator> {
        &self.key_generator
    }
}

impl Default for CacheManager<BoundedCache> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: fmt::Debug> fmt::Debug for CacheManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheManager")
            .field("cache", &self.cache)
            .field("cache_failures", &self.cache_failures)
            .finish_non_exhaustive()
    }
}
