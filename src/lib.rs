//! # Reqcache
//!
//! A transparent caching layer for HTTP clients.
//!
//! Reqcache wraps a blocking or future-returning transport in a decorator
//! that implements the same trait. Identical requests issued repeatedly, or
//! at the same time, reach the network once; later callers get the stored
//! response (blocking path) or the very same shared future (async path).
//!
//! ## Features
//!
//! - **Drop-in**: [`CachingClient`] and [`CachingAsyncClient`] implement [`Client`] and [`AsyncClient`]
//! - **Single fetch per key**: concurrent callers for one key never trigger two requests
//! - **In-flight sharing**: the async path caches the pending future, not just its output
//! - **Bounded**: FIFO eviction by insertion order once the entry limit is exceeded
//! - **TTL**: entries older than the TTL (counted from request creation) are pruned on access
//! - **Pluggable keys**: any closure can replace the default [`HashKeyGenerator`]
//! - **Pluggable storage**: any [`Cache`] implementation can replace [`BoundedCache`]
//! - **Statistics**: hit/miss/eviction counters and a named registry (`stats` feature)
//!
//! ## Quick Start
//!
//! ```rust
//! use reqcache::{transformer, CacheManager, Client, HttpRequest, HttpResponse, RawResponse,
//!                Request, ResponseBody, ResponseType, Transformer, TransportError};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct CountingTransport(AtomicUsize);
//!
//! impl Client for CountingTransport {
//!     type Native = ();
//!
//!     fn native_client(&self) -> &() {
//!         &()
//!     }
//!
//!     fn request_as<T: ResponseBody>(
//!         &self,
//!         _request: &dyn HttpRequest,
//!         transformer: &Transformer<T>,
//!         _response_type: ResponseType,
//!     ) -> Result<HttpResponse<T>, TransportError> {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         Ok(transformer(RawResponse::new(200, "pong")))
//!     }
//!
//!     fn close(&self) -> Vec<TransportError> {
//!         Vec::new()
//!     }
//!
//!     fn register_shutdown_hook(&self) {}
//! }
//!
//! let manager = CacheManager::with_depth(100, 0, None);
//! let client = manager.wrap(CountingTransport(AtomicUsize::new(0)));
//! let as_text = transformer(|raw| HttpResponse::from_raw(raw, |b| String::from_utf8_lossy(&b).into_owned()));
//!
//! let request = Request::get("https://example.com/ping");
//! let first = client.request(&request, &as_text).unwrap();
//! let second = client.request(&request, &as_text).unwrap();
//!
//! assert_eq!(first, second);
//! assert_eq!(client.delegate().0.load(Ordering::SeqCst), 1);
//! ```
//!
//! ## Error Handling
//!
//! The cache adds no error type of its own. A failed blocking request is
//! returned unchanged and not stored. A failed async request is a future that
//! resolves to an error; it stays cached like any other future unless the
//! manager is configured with `cache_failures(false)`.

mod client;
mod config;
mod decorator;
mod error;
mod key_generator;
mod manager;
mod request;

pub use reqcache_core::*;

pub use client::{
    response_future, transformer, AsyncClient, Client, ResponseBody, ResponseCallback,
    ResponseFuture, ResponseType, Transformer,
};
pub use config::CacheConfig;
pub use decorator::{CachingAsyncClient, CachingClient};
pub use error::{Result, TransportError};
pub use key_generator::{default_key_generator, HashKeyGenerator, KeyGenerator};
pub use manager::CacheManager;
pub use request::{hash_of, HttpRequest, HttpResponse, Method, RawResponse, Request};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        AsyncClient, Cache, CacheConfig, CacheManager, Client, HttpRequest, HttpResponse,
        KeyGenerator, Request,
    };
}
