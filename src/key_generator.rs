use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::client::ResponseType;
use crate::request::{hash_of, HttpRequest};
use crate::Key;

/// Derives the cache [`Key`] of a request.
///
/// Any `Fn(&dyn HttpRequest, bool, ResponseType) -> Key` closure is a
/// generator, so a stricter or coarser keying scheme can be plugged in
/// without a new type.
///
/// # Examples
///
/// ```
/// use reqcache::{HttpRequest, Key, KeyGenerator, Request, ResponseType};
///
/// // Ignore the async flag: sync and async calls share entries
/// let by_request_only = |request: &dyn HttpRequest, _is_async: bool, _ty: ResponseType| {
///     Key::new(request.identity_hash(), request.creation_time())
/// };
///
/// let request = Request::get("https://example.com");
/// let ty = ResponseType::of::<String>();
/// assert_eq!(
///     by_request_only.generate(&request, true, ty),
///     by_request_only.generate(&request, false, ty),
/// );
/// ```
pub trait KeyGenerator: Send + Sync {
    fn generate(&self, request: &dyn HttpRequest, is_async: bool, response_type: ResponseType)
        -> Key;
}

impl<F> KeyGenerator for F
where
    F: Fn(&dyn HttpRequest, bool, ResponseType) -> Key + Send + Sync,
{
    fn generate(&self, request: &dyn HttpRequest, is_async: bool, response_type: ResponseType) -> Key {
        self(request, is_async, response_type)
    }
}

/// Default generator: hashes the request identity, the async flag and the
/// response type together, and stamps the key with the request's creation
/// instant.
///
/// Only the combined hash decides equality. Two different requests whose
/// hashes collide share a slot; supply a stricter generator if that matters.
#[derive(Debug, Clone, Copy, Default)]
pub struct HashKeyGenerator;

impl KeyGenerator for HashKeyGenerator {
    fn generate(&self, request: &dyn HttpRequest, is_async: bool, response_type: ResponseType) -> Key {
        let hash = hash_of(&(request.identity_hash(), is_async, response_type));
        Key::new(hash, request.creation_time())
    }
}

static DEFAULT_KEY_GENERATOR: Lazy<Arc<dyn KeyGenerator>> =
    Lazy::new(|| Arc::new(HashKeyGenerator) as Arc<dyn KeyGenerator>);

/// Returns the process-wide [`HashKeyGenerator`] instance.
pub fn default_key_generator() -> Arc<dyn KeyGenerator> {
    Arc::clone(&DEFAULT_KEY_GENERATOR)
}
