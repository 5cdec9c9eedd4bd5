//! The slice of the HTTP object model the cache needs to see.
//!
//! Building and sending requests belongs to the transport; the cache only
//! asks a request for two things, a stable identity hash and the instant it
//! was created. [`Request`] is a plain implementation for transports that do
//! not bring their own request type.

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use std::time::Instant;

/// A request as seen by the cache.
pub trait HttpRequest: Send + Sync {
    /// Hash identifying the request. Two requests that should share a cached
    /// response must return the same value.
    fn identity_hash(&self) -> u64;

    /// Instant fixed when the request was built. Cache entries age from here.
    fn creation_time(&self) -> Instant;
}

impl<R: HttpRequest + ?Sized> HttpRequest for &R {
    fn identity_hash(&self) -> u64 {
        (**self).identity_hash()
    }

    fn creation_time(&self) -> Instant {
        (**self).creation_time()
    }
}

impl<R: HttpRequest + ?Sized> HttpRequest for Arc<R> {
    fn identity_hash(&self) -> u64 {
        (**self).identity_hash()
    }

    fn creation_time(&self) -> Instant {
        (**self).creation_time()
    }
}

/// Hashes any `Hash` value with the standard library hasher.
///
/// Handy for implementing [`HttpRequest::identity_hash`] on a transport's own
/// request type.
pub fn hash_of<H: Hash + ?Sized>(value: &H) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A minimal HTTP request: method, url, headers and optional body.
///
/// The creation instant is captured by the constructor. It takes no part in
/// the identity hash, so rebuilding an identical request later yields the
/// same hash but a younger timestamp.
///
/// # Examples
///
/// ```
/// use reqcache::{HttpRequest, Request};
///
/// let a = Request::get("https://example.com/users").header("Accept", "application/json");
/// let b = Request::get("https://example.com/users").header("Accept", "application/json");
///
/// assert_eq!(a.identity_hash(), b.identity_hash());
/// assert_ne!(
///     a.identity_hash(),
///     Request::get("https://example.com/orders").identity_hash()
/// );
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    created_at: Instant,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            created_at: Instant::now(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Overrides the creation instant, e.g. when replaying a recorded request.
    pub fn created_at(mut self, instant: Instant) -> Self {
        self.created_at = instant;
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body_bytes(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

impl HttpRequest for Request {
    fn identity_hash(&self) -> u64 {
        hash_of(&(self.method, &self.url, &self.headers, &self.body))
    }

    fn creation_time(&self) -> Instant {
        self.created_at
    }
}

/// Undecoded response as produced by the transport.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }
}

/// Response whose body has been decoded into `T` by a transformer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse<T> {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: T,
}

impl<T> HttpResponse<T> {
    pub fn new(status: u16, body: T) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decodes a raw response with `decode`, keeping status and headers.
    pub fn from_raw(raw: RawResponse, decode: impl FnOnce(Vec<u8>) -> T) -> Self {
        Self {
            status: raw.status,
            headers: raw.headers,
            body: decode(raw.body),
        }
    }
}
