//! # Reqcache Core
//!
//! Transport-agnostic building blocks of the request cache.
//!
//! ## Module Organization
//!
//! - [`Key`] - Slot identifier carrying the originating request's creation instant
//! - [`Cache`] - Storage contract with at-most-one-fetch-per-key semantics
//! - [`BoundedCache`] - Default store: FIFO by insertion, capped by entry count, optional TTL
//! - [`CacheStats`] / [`stats_registry`] - Hit/miss counters and a global registry of named caches
//!
//! The HTTP-facing decorators that feed requests into these types live in the
//! `reqcache` crate.
mod bounded_cache;
mod cache;
mod key;

#[cfg(feature = "stats")]
mod stats;

#[cfg(feature = "stats")]
pub mod stats_registry;

pub use bounded_cache::BoundedCache;
pub use cache::Cache;
pub use key::Key;

#[cfg(feature = "stats")]
pub use stats::CacheStats;
